//! render-effects - A caching factory for rendering resources
//!
//! Given declarative material descriptions, the factory produces
//! ready-to-bind effect objects (shader + material bundles), GPU textures,
//! and compiled pixel shaders, de-duplicating identical requests by name.
//!
//! # Features
//! - Per-device shared caches: factories on the same device share instances
//! - Shader-name variant table (lambert / phong / unlit / custom blobs)
//! - Downlevel-device fallback for custom shader blobs
//! - Pluggable devices: wgpu implementation plus a dummy device for tests
//!
//! Device creation, image codec internals, and GPU command submission stay
//! with the caller; the factory only resolves descriptions to cached
//! resources.

pub mod backend;
pub mod factory;
pub mod resources;

pub use backend::{
    DeviceError, DeviceId, DummyDevice, FeatureLevel, RenderDevice, WgpuDevice,
};
pub use factory::{EffectFactory, FactoryError};
pub use resources::{
    Effect, EffectInfo, GpuTexture, PixelShader, ResourceError, ShaderEffectInfo, ShaderVariant,
    TextureData, TEXTURE_SLOTS,
};

use std::path::PathBuf;

/// Configuration applied when constructing a factory
#[derive(Debug, Clone)]
pub struct FactoryOptions {
    /// Share cached instances between requests with the same name
    pub sharing: bool,
    /// Directory relative resource names resolve against
    pub search_directory: Option<PathBuf>,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self {
            sharing: true,
            search_directory: None,
        }
    }
}
