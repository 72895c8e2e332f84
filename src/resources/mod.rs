//! Resource types
//!
//! CPU-side texture data, uploaded GPU textures, compiled pixel shaders,
//! and the effect (shader + material) bundle the factory hands out.

mod material;
mod shader;
mod texture;

pub use material::*;
pub use shader::*;
pub use texture::*;

use crate::backend::DeviceError;
use std::path::PathBuf;
use thiserror::Error;

/// Resource loading error type
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode image {name}: {source}")]
    ImageDecode {
        name: String,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Device(#[from] DeviceError),
}
