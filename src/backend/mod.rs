//! Device abstraction layer
//!
//! Provides the resource-creation trait and common types the factory drives,
//! plus the wgpu implementation and a dummy device for tests.

pub mod dummy;
pub mod traits;
pub mod types;
pub mod wgpu_backend;

pub use dummy::DummyDevice;
pub use traits::*;
pub use types::*;
pub use wgpu_backend::WgpuDevice;
