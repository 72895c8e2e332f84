//! Core device abstraction trait
//!
//! The factory only orchestrates resource creation, so the trait covers
//! exactly that surface: textures, texture views, samplers, and pixel
//! shaders built from precompiled bytecode. Command submission and device
//! creation live with the caller.

use crate::backend::types::*;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Device error type
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Failed to create texture: {0}")]
    TextureCreationFailed(String),
    #[error("Failed to create texture view: {0}")]
    ViewCreationFailed(String),
    #[error("Failed to create sampler: {0}")]
    SamplerCreationFailed(String),
    #[error("Invalid shader bytecode: {0}")]
    InvalidShaderBytecode(String),
    #[error("Failed to create pixel shader: {0}")]
    ShaderCreationFailed(String),
    #[error("Unknown resource handle")]
    UnknownHandle,
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Device lost")]
    DeviceLost,
}

pub type DeviceResult<T> = Result<T, DeviceError>;

/// Identity of a device instance.
///
/// Factories constructed on the same device share one cache, so the id keys
/// the global factory pool. Each device implementation allocates one at
/// construction via [`DeviceId::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(u64);

impl DeviceId {
    /// Allocate a fresh, process-unique device id.
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to a GPU texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) u64);

/// Handle to a texture view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureViewHandle(pub(crate) u64);

/// Handle to a sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerHandle(pub(crate) u64);

/// Handle to a compiled pixel shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelShaderHandle(pub(crate) u64);

/// Resource-creation surface of a render device.
///
/// Methods take `&self` so a device can be shared as `Arc<dyn RenderDevice>`
/// between the factory and the renderer; implementations use interior
/// mutability for their handle bookkeeping.
pub trait RenderDevice: Send + Sync {
    /// Identity of this device instance.
    fn device_id(&self) -> DeviceId;

    /// Capability tier of this device.
    fn feature_level(&self) -> FeatureLevel;

    /// Create a texture
    fn create_texture(&self, desc: &TextureDescriptor) -> DeviceResult<TextureHandle>;

    /// Create a view over a texture
    fn create_texture_view(&self, texture: TextureHandle) -> DeviceResult<TextureViewHandle>;

    /// Upload pixel data to a texture
    fn write_texture(&self, texture: TextureHandle, data: &[u8], width: u32, height: u32);

    /// Create a sampler
    fn create_sampler(&self, desc: &SamplerDescriptor) -> DeviceResult<SamplerHandle>;

    /// Create a pixel shader from precompiled bytecode
    fn create_pixel_shader(
        &self,
        label: Option<&str>,
        bytecode: &[u8],
    ) -> DeviceResult<PixelShaderHandle>;

    /// Destroy a texture
    fn destroy_texture(&self, texture: TextureHandle);

    /// Destroy a texture view
    fn destroy_texture_view(&self, view: TextureViewHandle);

    /// Destroy a sampler
    fn destroy_sampler(&self, sampler: SamplerHandle);

    /// Destroy a pixel shader
    fn destroy_pixel_shader(&self, shader: PixelShaderHandle);
}
