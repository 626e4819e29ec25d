#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! # Pulse FX
//!
//! Frame-graph orchestration for temporal GPU post-processing.
//!
//! The crate owns the CPU-side decisions of a post-processing chain
//! (which passes run, in which order, on which persistent resources, with
//! which parameters) and leaves per-pixel work to externally supplied GPU
//! programs.
//!
//! - [`resources`]: Effect settings, metering and AO math (no GPU access)
//! - [`renderer::graph`]: Pass graph recording and the per-view stack
//! - [`renderer::backend`]: `wgpu` executor

pub mod errors;
pub mod renderer;
pub mod resources;

pub use errors::{PostFxError, Result};
pub use renderer::backend::{WgpuBackend, WgpuProgram};
pub use renderer::graph::{
    CameraData, CameraKind, ColorTarget, FrameInputs, FrameReport, GpuBackend, GraphExecutor,
    GraphResource, PassGraph, PassGraphBuilder, PostEffect, PostProcessStack, ResourceAllocator,
    ResourcePool, TextureDesc,
};
pub use resources::{EffectSettings, PostProcessVolume};
