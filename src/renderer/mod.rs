//! Rendering Layer
//!
//! - [`graph`]: Backend-agnostic frame graph and the post-processing stack
//! - [`backend`]: `wgpu` implementation of the backend interfaces

pub mod backend;
pub mod graph;

pub use backend::{WgpuBackend, WgpuProgram};
pub use graph::{FrameInputs, PostProcessStack};
