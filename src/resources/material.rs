//! Material descriptions and the built effect bundle

use crate::resources::{GpuTexture, PixelShader};
use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use std::path::PathBuf;
use std::sync::Arc;

/// Total texture slots on an effect: slot 0 is the diffuse texture,
/// slots 1..=7 come from [`ShaderEffectInfo::extra_textures`].
pub const TEXTURE_SLOTS: usize = 8;

/// Declarative description of a basic material
#[derive(Debug, Clone)]
pub struct EffectInfo {
    /// Cache key; effects with an empty name are never shared
    pub name: String,
    pub ambient_color: Vec3,
    pub diffuse_color: Vec3,
    pub specular_color: Vec3,
    pub specular_power: f32,
    pub emissive_color: Vec3,
    pub alpha: f32,
    /// Diffuse texture file, bound to slot 0
    pub diffuse_texture: Option<PathBuf>,
}

impl Default for EffectInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            ambient_color: Vec3::ZERO,
            diffuse_color: Vec3::ONE,
            specular_color: Vec3::ZERO,
            specular_power: 16.0,
            emissive_color: Vec3::ZERO,
            alpha: 1.0,
            diffuse_texture: None,
        }
    }
}

impl EffectInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_diffuse(mut self, color: Vec3) -> Self {
        self.diffuse_color = color;
        self
    }

    pub fn with_specular(mut self, color: Vec3, power: f32) -> Self {
        self.specular_color = color;
        self.specular_power = power;
        self
    }

    pub fn with_emissive(mut self, color: Vec3) -> Self {
        self.emissive_color = color;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_diffuse_texture<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.diffuse_texture = Some(path.into());
        self
    }
}

/// Description of a material driven by a named pixel shader
#[derive(Debug, Clone, Default)]
pub struct ShaderEffectInfo {
    pub base: EffectInfo,
    /// Pixel shader file name; `None` builds the default lit effect
    pub pixel_shader: Option<PathBuf>,
    /// Additional texture files, bound to slots 1..=7
    pub extra_textures: [Option<PathBuf>; TEXTURE_SLOTS - 1],
}

impl ShaderEffectInfo {
    pub fn new(name: &str) -> Self {
        Self {
            base: EffectInfo::new(name),
            ..Default::default()
        }
    }

    pub fn with_pixel_shader<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.pixel_shader = Some(path.into());
        self
    }

    pub fn with_texture<P: Into<PathBuf>>(mut self, slot: usize, path: P) -> Self {
        assert!((1..TEXTURE_SLOTS).contains(&slot), "slot out of range");
        self.extra_textures[slot - 1] = Some(path.into());
        self
    }
}

/// A built shader + material bundle, ready to bind when rendering geometry.
///
/// Produced by the factory; shared as `Arc<Effect>` between every mesh that
/// requested the same named material.
pub struct Effect {
    name: String,
    lighting_enabled: bool,
    textured: bool,
    ambient_color: Vec3,
    diffuse_color: Vec3,
    specular_color: Vec3,
    specular_power: f32,
    emissive_color: Vec3,
    alpha: f32,
    textures: [Option<Arc<GpuTexture>>; TEXTURE_SLOTS],
    pixel_shader: Option<Arc<PixelShader>>,
}

impl Effect {
    /// Apply the material description under the rules of the shader variant:
    /// specular only when allowed and non-zero, lighting per the variant.
    pub(crate) fn new(info: &EffectInfo, lighting: bool, allow_specular: bool) -> Self {
        let specular_enabled = allow_specular && info.specular_color != Vec3::ZERO;

        Self {
            name: info.name.clone(),
            lighting_enabled: lighting,
            textured: false,
            ambient_color: info.ambient_color,
            diffuse_color: info.diffuse_color,
            specular_color: if specular_enabled {
                info.specular_color
            } else {
                Vec3::ZERO
            },
            specular_power: if specular_enabled {
                info.specular_power
            } else {
                1.0
            },
            emissive_color: info.emissive_color,
            alpha: info.alpha,
            textures: Default::default(),
            pixel_shader: None,
        }
    }

    pub(crate) fn set_texture(&mut self, slot: usize, texture: Arc<GpuTexture>) {
        self.textures[slot] = Some(texture);
        self.textured = true;
    }

    pub(crate) fn set_pixel_shader(&mut self, shader: Arc<PixelShader>) {
        self.pixel_shader = Some(shader);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lighting_enabled(&self) -> bool {
        self.lighting_enabled
    }

    /// Whether any texture slot is bound
    pub fn textured(&self) -> bool {
        self.textured
    }

    pub fn specular_enabled(&self) -> bool {
        self.specular_color != Vec3::ZERO
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn texture(&self, slot: usize) -> Option<&Arc<GpuTexture>> {
        self.textures.get(slot).and_then(|t| t.as_ref())
    }

    pub fn pixel_shader(&self) -> Option<&Arc<PixelShader>> {
        self.pixel_shader.as_ref()
    }

    /// Pack the material constants for GPU upload
    pub fn uniform_data(&self) -> EffectUniformData {
        EffectUniformData {
            ambient: self.ambient_color.extend(0.0),
            diffuse: self.diffuse_color.extend(self.alpha),
            specular: self.specular_color.extend(self.specular_power),
            emissive: self.emissive_color.extend(0.0),
            flags: [
                if self.lighting_enabled { 1.0 } else { 0.0 },
                if self.textured { 1.0 } else { 0.0 },
                0.0,
                0.0,
            ],
        }
    }
}

/// Effect uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct EffectUniformData {
    pub ambient: Vec4,  // xyz=ambient, w unused
    pub diffuse: Vec4,  // xyz=diffuse, w=alpha
    pub specular: Vec4, // xyz=specular, w=power
    pub emissive: Vec4, // xyz=emissive, w unused
    pub flags: [f32; 4], // x=lighting, y=textured, zw=padding
}
