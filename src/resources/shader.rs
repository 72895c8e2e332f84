//! Compiled pixel shaders and shader name resolution
//!
//! Material pipelines name their pixel shader as `<material>_<variant>.<ext>`.
//! The variant segment selects one of the built-in lighting models or, for
//! anything unrecognized, a custom precompiled blob loaded from disk.

use crate::backend::*;
use crate::resources::ResourceError;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// A compiled pixel shader registered with a device.
///
/// Destroys its device handle when the last `Arc` drops.
pub struct PixelShader {
    device: Arc<dyn RenderDevice>,
    handle: PixelShaderHandle,
    pub name: String,
}

impl PixelShader {
    /// Compile a pixel shader from precompiled bytecode
    pub fn create(
        device: &Arc<dyn RenderDevice>,
        name: &str,
        bytecode: &[u8],
    ) -> Result<Arc<Self>, ResourceError> {
        let handle = device.create_pixel_shader(Some(name), bytecode)?;
        Ok(Arc::new(Self {
            device: device.clone(),
            handle,
            name: name.to_string(),
        }))
    }

    pub fn handle(&self) -> PixelShaderHandle {
        self.handle
    }
}

impl Drop for PixelShader {
    fn drop(&mut self) {
        self.device.destroy_pixel_shader(self.handle);
    }
}

/// Read an entire precompiled shader blob from disk
pub fn read_shader_blob<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ResourceError> {
    let path = path.as_ref();
    fs::read(path).map_err(|source| ResourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Lighting model selected by a pixel shader name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderVariant {
    /// Diffuse-only lighting, specular is not applied
    Lambert,
    /// Full lighting with specular
    Phong,
    /// No lighting at all
    Unlit,
    /// Custom shader blob; `fallback` names the substitute blob used on
    /// downlevel devices that cannot run the custom one
    Custom { fallback: String },
}

impl ShaderVariant {
    /// Resolve a pixel shader file name to its variant.
    ///
    /// Takes the segment after the last `_` (or the whole name), strips the
    /// extension, and matches case-insensitively.
    pub fn from_shader_name(name: &str) -> Self {
        let segment = name.rsplit('_').next().unwrap_or(name);
        let root = segment.split('.').next().unwrap_or(segment);

        if root.eq_ignore_ascii_case("lambert") {
            ShaderVariant::Lambert
        } else if root.eq_ignore_ascii_case("phong") {
            ShaderVariant::Phong
        } else if root.eq_ignore_ascii_case("unlit") {
            ShaderVariant::Unlit
        } else {
            ShaderVariant::Custom {
                fallback: format!("{root}.spv"),
            }
        }
    }

    /// Whether effects built with this variant light their geometry
    pub fn lighting_enabled(&self) -> bool {
        !matches!(self, ShaderVariant::Unlit)
    }

    /// Whether effects built with this variant may apply specular
    pub fn allows_specular(&self) -> bool {
        !matches!(self, ShaderVariant::Lambert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_from_suffix() {
        assert_eq!(
            ShaderVariant::from_shader_name("brick_lambert.spv"),
            ShaderVariant::Lambert
        );
        assert_eq!(
            ShaderVariant::from_shader_name("metal_phong.spv"),
            ShaderVariant::Phong
        );
        assert_eq!(
            ShaderVariant::from_shader_name("sky_unlit.spv"),
            ShaderVariant::Unlit
        );
    }

    #[test]
    fn test_variant_case_insensitive() {
        assert_eq!(
            ShaderVariant::from_shader_name("wall_Lambert.spv"),
            ShaderVariant::Lambert
        );
        assert_eq!(
            ShaderVariant::from_shader_name("wall_PHONG.SPV"),
            ShaderVariant::Phong
        );
    }

    #[test]
    fn test_variant_without_underscore() {
        // No underscore: the whole name is the variant segment.
        assert_eq!(
            ShaderVariant::from_shader_name("phong.spv"),
            ShaderVariant::Phong
        );
        assert_eq!(ShaderVariant::from_shader_name("unlit"), ShaderVariant::Unlit);
    }

    #[test]
    fn test_custom_variant_fallback_name() {
        assert_eq!(
            ShaderVariant::from_shader_name("rock_toon.spv"),
            ShaderVariant::Custom {
                fallback: "toon.spv".to_string()
            }
        );
        // Only the segment after the last underscore names the fallback.
        assert_eq!(
            ShaderVariant::from_shader_name("rock_cel_toon.spv"),
            ShaderVariant::Custom {
                fallback: "toon.spv".to_string()
            }
        );
    }

    #[test]
    fn test_variant_lighting_flags() {
        assert!(ShaderVariant::Lambert.lighting_enabled());
        assert!(!ShaderVariant::Lambert.allows_specular());
        assert!(ShaderVariant::Phong.lighting_enabled());
        assert!(ShaderVariant::Phong.allows_specular());
        assert!(!ShaderVariant::Unlit.lighting_enabled());
    }
}
