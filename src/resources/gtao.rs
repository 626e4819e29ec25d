//! GTAO (Ground Truth Ambient Occlusion) Configuration
//!
//! Pure data and CPU-side math for the jittered spatiotemporal AO
//! accumulator. The render pass
//! ([`GtaoPass`](crate::renderer::graph::passes::GtaoPass)) records the GPU
//! passes; everything the external kernels need as parameters is computed
//! here.
//!
//! # Pipeline
//!
//! ```text
//! depth ─┐
//!        ├─► Resolve ─► AO ─► Blur X ─► Blur Y ─► Temporal ─► Current ─► Combine
//! color ─┘      │                                    ▲           │
//!               └─► Bent Normal                      └─ History ◄┘
//! ```
//!
//! # Jitter
//!
//! Each frame uses one `(rotation, offset)` pair from [`JitterSequence`]:
//! rotation cycles through 6 angles, offset through 4 values, giving a
//! period of exactly 24 frames.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use serde::{Deserialize, Serialize};

use crate::resources::EffectSettings;
use crate::resources::param::{ClampedParam, Param};

/// Sample rotations, in degrees.
pub const JITTER_ROTATIONS: [f32; 6] = [60.0, 300.0, 180.0, 240.0, 120.0, 0.0];
/// Sample offsets.
pub const JITTER_OFFSETS: [f32; 4] = [0.0, 0.5, 0.25, 0.75];

// ============================================================================
// Settings
// ============================================================================

/// Which intermediate the final combine pass presents.
///
/// Presentation only: the recorded pass sequence is identical for every
/// variant; only the combine pass index changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AoDebugView {
    /// Scene color modulated by the temporally filtered AO.
    #[default]
    Combined,
    /// Raw occlusion term.
    RawAo,
    /// Spatially filtered occlusion term.
    Spatial,
    /// Bent normal term.
    BentNormal,
}

impl AoDebugView {
    /// Combine-material pass index presenting this view.
    #[must_use]
    pub const fn pass_index(self) -> u32 {
        match self {
            Self::Combined => 4,
            Self::RawAo => 5,
            Self::Spatial => 6,
            Self::BentNormal => 7,
        }
    }
}

/// GTAO configuration.
///
/// # Usage
///
/// ```rust,ignore
/// let mut gtao = GtaoSettings::default();
/// gtao.enabled.set(true);
/// gtao.set_radius(2.0);
/// gtao.set_temporal(1.0, 0.9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GtaoSettings {
    pub enabled: Param<bool>,

    /// Horizon search directions per pixel.
    pub dir_sampler: ClampedParam<u32>,
    /// Samples per direction slice.
    pub slice_sampler: ClampedParam<u32>,
    /// World-space sampling radius.
    pub radius: ClampedParam<f32>,
    pub intensity: ClampedParam<f32>,
    pub power: ClampedParam<f32>,
    /// Approximates interreflection on bright albedo.
    pub multi_bounce: Param<bool>,

    /// Edge preservation of the spatial denoiser.
    pub sharpness: ClampedParam<f32>,
    /// Neighborhood clip width used against the history.
    pub temporal_scale: ClampedParam<f32>,
    /// Weight of the history in the temporal blend.
    pub temporal_response: ClampedParam<f32>,

    pub debug_view: Param<AoDebugView>,
    /// Skip the effect for editor scene-view cameras.
    pub hide_in_scene_view: Param<bool>,
}

impl Default for GtaoSettings {
    fn default() -> Self {
        Self {
            enabled: Param::new(false),
            dir_sampler: ClampedParam::new(2, 1, 4),
            slice_sampler: ClampedParam::new(2, 1, 8),
            radius: ClampedParam::new(1.0, 1.0, 5.0),
            intensity: ClampedParam::new(1.0, 0.0, 1.0),
            power: ClampedParam::new(1.0, 1.0, 8.0),
            multi_bounce: Param::new(true),
            sharpness: ClampedParam::new(0.25, 0.0, 1.0),
            temporal_scale: ClampedParam::new(1.0, 1.0, 5.0),
            temporal_response: ClampedParam::new(1.0, 0.0, 1.0),
            debug_view: Param::new(AoDebugView::Combined),
            hide_in_scene_view: Param::new(false),
        }
    }
}

impl EffectSettings for GtaoSettings {
    fn is_active(&self) -> bool {
        self.enabled.override_state && self.enabled.value
    }
}

impl GtaoSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_samplers(&mut self, directions: u32, slices: u32) {
        self.dir_sampler.set(directions);
        self.slice_sampler.set(slices);
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius.set(radius);
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity.set(intensity);
    }

    pub fn set_power(&mut self, power: f32) {
        self.power.set(power);
    }

    pub fn set_sharpness(&mut self, sharpness: f32) {
        self.sharpness.set(sharpness);
    }

    pub fn set_temporal(&mut self, scale: f32, response: f32) {
        self.temporal_scale.set(scale);
        self.temporal_response.set(response);
    }

    pub fn set_debug_view(&mut self, view: AoDebugView) {
        self.debug_view.set(view);
    }

    /// The temporal filter for this frame. A fresh history contributes nothing.
    #[must_use]
    pub fn temporal_filter(&self, history_valid: bool) -> TemporalFilter {
        TemporalFilter {
            response: if history_valid {
                self.temporal_response.value()
            } else {
                0.0
            },
            scale: self.temporal_scale.value(),
        }
    }
}

// ============================================================================
// Jitter
// ============================================================================

/// One jitter sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitterSample {
    pub rotation_degrees: f32,
    pub offset: f32,
}

impl JitterSample {
    /// Rotation as a fraction of a full turn, the form the kernel expects.
    #[inline]
    #[must_use]
    pub fn direction(&self) -> f32 {
        self.rotation_degrees / 360.0
    }
}

/// Deterministic per-frame rotation/offset sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JitterSequence {
    step: u32,
}

impl JitterSequence {
    /// Number of distinct samples before the sequence repeats.
    pub const PERIOD: u32 = 24;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn step(&self) -> u32 {
        self.step
    }

    /// Sample at an arbitrary step count.
    #[must_use]
    pub fn sample_at(step: u64) -> JitterSample {
        let rotation = JITTER_ROTATIONS[(step % 6) as usize];
        let offset = JITTER_OFFSETS[((step / 6) % 4) as usize];
        JitterSample {
            rotation_degrees: rotation,
            offset,
        }
    }

    /// The sample for the current step.
    #[inline]
    #[must_use]
    pub fn current(&self) -> JitterSample {
        Self::sample_at(u64::from(self.step))
    }

    /// Returns the current sample and moves to the next step.
    pub fn advance(&mut self) -> JitterSample {
        let sample = self.current();
        self.step = (self.step + 1) % Self::PERIOD;
        sample
    }
}

// ============================================================================
// Projection terms
// ============================================================================

/// View-space reconstruction terms derived from the camera projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AoProjection {
    /// `(2/fx, 2/fy, -1/fx, -1/fy)`: maps UV to view-space XY at unit depth.
    pub uv_to_view: Vec4,
    /// Pixels per world unit at unit depth, halved.
    pub half_proj_scale: f32,
    /// `(1/w, 1/h, w, h)`
    pub texel_size: Vec4,
}

impl AoProjection {
    /// `fov_y` is the vertical field of view in radians.
    #[must_use]
    pub fn from_camera(fov_y: f32, width: u32, height: u32) -> Self {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        let tan_half = (fov_y * 0.5).tan();

        let fy = 1.0 / tan_half;
        let fx = fy * h / w;

        Self {
            uv_to_view: Vec4::new(2.0 / fx, 2.0 / fy, -1.0 / fx, -1.0 / fy),
            half_proj_scale: h / (2.0 * tan_half) * 0.5,
            texel_size: Vec4::new(1.0 / w, 1.0 / h, w, h),
        }
    }
}

// ============================================================================
// Temporal filter
// ============================================================================

/// CPU reference of the temporal blend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalFilter {
    /// Weight of the clipped history, `[0, 1]`.
    pub response: f32,
    /// Clip box half-width in standard deviations.
    pub scale: f32,
}

impl TemporalFilter {
    /// Blends `current` toward `history` clipped to
    /// `mean ± scale * std_dev` of the current neighborhood. The box always
    /// contains `current`, so an unchanged pixel resolves to itself.
    #[must_use]
    pub fn resolve(&self, current: f32, history: f32, mean: f32, std_dev: f32) -> f32 {
        let extent = self.scale * std_dev.abs();
        let lo = (mean - extent).min(current);
        let hi = (mean + extent).max(current);
        let clipped = history.max(lo).min(hi);
        current + (clipped - current) * self.response.clamp(0.0, 1.0)
    }
}

// ============================================================================
// GPU Parameter Block
// ============================================================================

/// Parameter block shared by the GTAO materials.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GtaoUniforms {
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub inverse_view_projection: Mat4,
    pub prev_view_projection: Mat4,
    pub world_to_camera: Mat4,
    pub camera_to_world: Mat4,

    pub uv_to_view: Vec4,
    pub texel_size: Vec4,

    pub direction: f32,
    pub offset: f32,
    pub half_proj_scale: f32,
    pub radius: f32,

    pub intensity: f32,
    pub power: f32,
    pub sharpness: f32,
    pub temporal_scale: f32,

    pub temporal_response: f32,
    pub dir_samples: u32,
    pub slice_samples: u32,
    pub multi_bounce: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_view_pass_indices_are_distinct() {
        let idx = [
            AoDebugView::Combined,
            AoDebugView::RawAo,
            AoDebugView::Spatial,
            AoDebugView::BentNormal,
        ]
        .map(AoDebugView::pass_index);
        assert_eq!(idx, [4, 5, 6, 7]);
    }

    #[test]
    fn fresh_history_disables_response() {
        let mut s = GtaoSettings::default();
        s.set_temporal(2.0, 0.8);
        assert_eq!(s.temporal_filter(false).response, 0.0);
        assert!((s.temporal_filter(true).response - 0.8).abs() < 1e-6);
    }

    #[test]
    fn projection_at_square_90_degrees() {
        let p = AoProjection::from_camera(std::f32::consts::FRAC_PI_2, 100, 100);
        // tan(45°) = 1 → fx = fy = 1
        assert!((p.uv_to_view.x - 2.0).abs() < 1e-5);
        assert!((p.uv_to_view.w + 1.0).abs() < 1e-5);
        assert!((p.half_proj_scale - 25.0).abs() < 1e-3);
        assert_eq!(p.texel_size.z, 100.0);
    }

    #[test]
    fn uniforms_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<GtaoUniforms>(), 464);
    }

    #[test]
    fn first_sample_is_sixty_degrees() {
        let mut j = JitterSequence::new();
        let s = j.advance();
        assert_eq!(s.rotation_degrees, 60.0);
        assert_eq!(s.offset, 0.0);
        assert_eq!(j.step(), 1);
    }
}
