//! Post-Processing Frame Graph
//!
//! Provides:
//! - [`PassGraphBuilder`]: Per-frame recorder of typed pass descriptors
//! - [`PassGraph`]: The ordered pass list handed to the backend
//! - [`GraphExecutor`] / [`ResourceAllocator`] / [`GpuBackend`]: Backend seams
//! - [`ResourcePool`]: Named persistent resources of one effect instance
//! - [`PostEffect`]: Effect trait with explicit per-view state
//! - [`PostProcessStack`]: Per-view orchestration of all effects

pub mod builder;
pub mod composer;
pub mod context;
pub mod graph;
pub mod node;
pub mod pass;
pub mod passes;
pub mod pool;
pub mod resource;

pub use builder::PassGraphBuilder;
pub use composer::{FrameReport, PostProcessStack};
pub use context::{CameraData, CameraKind, EffectContext, FrameInputs};
pub use graph::{GpuBackend, GraphExecutor, PassGraph};
pub use node::PostEffect;
pub use pass::{AccessFlags, KernelRef, MaterialRef, ParamBlock, PassNode, PassOp, ResourceAccess};
pub use pool::{Acquired, ResourceAllocator, ResourcePool};
pub use resource::{
    BufferDesc, ColorTarget, GraphResource, ImportedId, ResourceDesc, ResourceHandle, TextureDesc,
    TransientId,
};
