//! GPU Backends
//!
//! - [`WgpuBackend`]: Executes pass graphs with `wgpu`
//! - [`TransientTexturePool`]: Per-frame texture recycling for that backend

pub mod transient_pool;
pub mod wgpu_backend;

pub use transient_pool::TransientTexturePool;
pub use wgpu_backend::{ImportedTexture, ResolvedResources, WgpuBackend, WgpuProgram, WgpuResource};
