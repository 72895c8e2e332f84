//! Dummy device for testing and development.
//!
//! This device doesn't perform actual GPU operations but provides a valid
//! implementation for exercising the factory without GPU hardware. It keeps
//! creation and live-resource counts so tests can assert on cache behavior.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::backend::traits::*;
use crate::backend::types::*;

/// Dummy implementation of [`RenderDevice`]
#[derive(Debug)]
pub struct DummyDevice {
    id: DeviceId,
    feature_level: FeatureLevel,
    next_handle: AtomicU64,
    textures_created: AtomicU64,
    live_textures: AtomicU64,
    views_created: AtomicU64,
    samplers_created: AtomicU64,
    shaders_created: AtomicU64,
    live_shaders: AtomicU64,
    fail_shader_creation: AtomicBool,
}

impl DummyDevice {
    /// Create a full-capability dummy device.
    pub fn new() -> Self {
        Self::with_feature_level(FeatureLevel::Full)
    }

    /// Create a dummy device reporting `Downlevel` capability.
    pub fn downlevel() -> Self {
        Self::with_feature_level(FeatureLevel::Downlevel)
    }

    fn with_feature_level(feature_level: FeatureLevel) -> Self {
        Self {
            id: DeviceId::next(),
            feature_level,
            next_handle: AtomicU64::new(1),
            textures_created: AtomicU64::new(0),
            live_textures: AtomicU64::new(0),
            views_created: AtomicU64::new(0),
            samplers_created: AtomicU64::new(0),
            shaders_created: AtomicU64::new(0),
            live_shaders: AtomicU64::new(0),
            fail_shader_creation: AtomicBool::new(false),
        }
    }

    /// Make subsequent `create_pixel_shader` calls fail.
    pub fn set_fail_shader_creation(&self, fail: bool) {
        self.fail_shader_creation.store(fail, Ordering::Relaxed);
    }

    /// Number of textures ever created.
    pub fn textures_created(&self) -> u64 {
        self.textures_created.load(Ordering::Relaxed)
    }

    /// Number of textures currently alive.
    pub fn live_textures(&self) -> u64 {
        self.live_textures.load(Ordering::Relaxed)
    }

    /// Number of texture views ever created.
    pub fn views_created(&self) -> u64 {
        self.views_created.load(Ordering::Relaxed)
    }

    /// Number of samplers ever created.
    pub fn samplers_created(&self) -> u64 {
        self.samplers_created.load(Ordering::Relaxed)
    }

    /// Number of pixel shaders ever created.
    pub fn shaders_created(&self) -> u64 {
        self.shaders_created.load(Ordering::Relaxed)
    }

    /// Number of pixel shaders currently alive.
    pub fn live_shaders(&self) -> u64 {
        self.live_shaders.load(Ordering::Relaxed)
    }

    fn alloc_handle(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for DummyDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderDevice for DummyDevice {
    fn device_id(&self) -> DeviceId {
        self.id
    }

    fn feature_level(&self) -> FeatureLevel {
        self.feature_level
    }

    fn create_texture(&self, desc: &TextureDescriptor) -> DeviceResult<TextureHandle> {
        log::trace!(
            "DummyDevice: creating texture {:?} ({}x{})",
            desc.label,
            desc.width,
            desc.height
        );
        self.textures_created.fetch_add(1, Ordering::Relaxed);
        self.live_textures.fetch_add(1, Ordering::Relaxed);
        Ok(TextureHandle(self.alloc_handle()))
    }

    fn create_texture_view(&self, _texture: TextureHandle) -> DeviceResult<TextureViewHandle> {
        self.views_created.fetch_add(1, Ordering::Relaxed);
        Ok(TextureViewHandle(self.alloc_handle()))
    }

    fn write_texture(&self, texture: TextureHandle, data: &[u8], width: u32, height: u32) {
        log::trace!(
            "DummyDevice: writing {} bytes to texture {:?} ({}x{})",
            data.len(),
            texture,
            width,
            height
        );
    }

    fn create_sampler(&self, desc: &SamplerDescriptor) -> DeviceResult<SamplerHandle> {
        log::trace!("DummyDevice: creating sampler {:?}", desc.label);
        self.samplers_created.fetch_add(1, Ordering::Relaxed);
        Ok(SamplerHandle(self.alloc_handle()))
    }

    fn create_pixel_shader(
        &self,
        label: Option<&str>,
        bytecode: &[u8],
    ) -> DeviceResult<PixelShaderHandle> {
        if self.fail_shader_creation.load(Ordering::Relaxed) {
            return Err(DeviceError::ShaderCreationFailed(
                "injected failure".into(),
            ));
        }
        log::trace!(
            "DummyDevice: creating pixel shader {:?} ({} bytes)",
            label,
            bytecode.len()
        );
        self.shaders_created.fetch_add(1, Ordering::Relaxed);
        self.live_shaders.fetch_add(1, Ordering::Relaxed);
        Ok(PixelShaderHandle(self.alloc_handle()))
    }

    fn destroy_texture(&self, _texture: TextureHandle) {
        self.live_textures.fetch_sub(1, Ordering::Relaxed);
    }

    fn destroy_texture_view(&self, _view: TextureViewHandle) {}

    fn destroy_sampler(&self, _sampler: SamplerHandle) {}

    fn destroy_pixel_shader(&self, _shader: PixelShaderHandle) {
        self.live_shaders.fetch_sub(1, Ordering::Relaxed);
    }
}
