//! Effect Recording Context
//!
//! [`FrameInputs`] is what the host hands to the stack each frame.
//! [`EffectContext`] is the per-effect view of the frame during recording:
//! the shared builder, the backend, the effect's own resource pool and the
//! color target it reads from.
//!
//! Field-level borrow splitting lets an effect hold `ctx.builder` and
//! `ctx.resources` at the same time.

use glam::Mat4;

use crate::errors::Result;

use super::builder::PassGraphBuilder;
use super::graph::GpuBackend;
use super::pool::{Acquired, ResourcePool};
use super::resource::{ColorTarget, GraphResource, ResourceDesc};

// ─── Camera ──────────────────────────────────────────────────────────────────

/// Which kind of camera renders the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraKind {
    #[default]
    Game,
    /// Editor scene view.
    SceneView,
}

/// Camera state for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraData {
    /// World → camera.
    pub view: Mat4,
    pub projection: Mat4,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub kind: CameraKind,
}

impl Default for CameraData {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 1000.0),
            fov_y: 60f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            kind: CameraKind::Game,
        }
    }
}

impl CameraData {
    #[inline]
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

// ─── Frame Inputs ────────────────────────────────────────────────────────────

/// Host-provided inputs of one frame on one view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInputs {
    /// Active color target. The first effect reads it; the final result is
    /// written back into it.
    pub color: ColorTarget,
    pub depth: Option<GraphResource>,
    pub normals: Option<GraphResource>,
    pub camera: CameraData,
    /// Seconds since the previous frame.
    pub delta_time: f32,
}

impl FrameInputs {
    #[must_use]
    pub fn new(color: ColorTarget, camera: CameraData, delta_time: f32) -> Self {
        Self {
            color,
            depth: None,
            normals: None,
            camera,
            delta_time,
        }
    }

    #[must_use]
    pub fn with_depth(mut self, depth: GraphResource) -> Self {
        self.depth = Some(depth);
        self
    }

    #[must_use]
    pub fn with_normals(mut self, normals: GraphResource) -> Self {
        self.normals = Some(normals);
        self
    }
}

// ─── Effect Context ──────────────────────────────────────────────────────────

/// Everything an effect may touch while recording one frame.
pub struct EffectContext<'a> {
    pub builder: &'a mut PassGraphBuilder,
    pub backend: &'a mut dyn GpuBackend,
    /// The effect's own persistent resources.
    pub resources: &'a mut ResourcePool,
    pub frame: &'a FrameInputs,
    /// Frames rendered by the owning stack before this one.
    pub frame_index: u64,
    /// Output of the previous effect.
    pub source: ColorTarget,
}

impl EffectContext<'_> {
    /// Acquires a persistent resource from the effect's pool.
    pub fn acquire(
        &mut self,
        name: &'static str,
        desc: impl Into<ResourceDesc>,
    ) -> Result<Acquired> {
        self.resources.acquire(&mut *self.backend, name, desc.into())
    }

    /// A transient color target matching the source description.
    pub fn create_destination(&mut self) -> ColorTarget {
        let resource = self.builder.create_transient(self.source.desc);
        ColorTarget::new(resource, self.source.desc)
    }
}
