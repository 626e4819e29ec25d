//! Ground Truth Ambient Occlusion Pass
//!
//! Jittered horizon-based AO with a separable spatial denoiser and a
//! temporal accumulator.
//!
//! # Data Flow
//!
//! ```text
//!  source ──copy──► SceneColor ─┐
//!  depth ───────────────────────┼─► [0] Resolve ─► AO ──┬─► [1] Blur X ─► SpatialX
//!                               │               └─► BentNormal
//!                                                        │
//!  SpatialX ─► [2] Blur Y ─► Spatial ─► [3] Temporal ─► Current ──copy──► History
//!                                           ▲                              │
//!                                           └──────────────────────────────┘
//!  source + AO terms ─► [debug] Combine ─► destination
//! ```
//!
//! All intermediates are persistent and sized like the source. A resize
//! reallocates them, which invalidates the history for one frame.

use glam::Mat4;
use smallvec::{SmallVec, smallvec};

use crate::errors::{PostFxError, Result};
use crate::renderer::graph::context::{CameraKind, EffectContext, FrameInputs};
use crate::renderer::graph::node::PostEffect;
use crate::renderer::graph::pass::{MaterialRef, PassNode};
use crate::renderer::graph::resource::{ColorTarget, GraphResource};
use crate::resources::gtao::{AoProjection, GtaoSettings, GtaoUniforms, JitterSequence};

/// Material implementing every GTAO sub-pass.
pub const GTAO_MATERIAL: &str = "GTAO";

const MATERIAL: MaterialRef = MaterialRef::new(GTAO_MATERIAL);

/// Format of the AO intermediates.
const AO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

pub const SCENE_COLOR_TEXTURE: &str = "GTAO_SceneColor";
pub const AO_TEXTURE: &str = "GTAO_AO";
pub const BENT_NORMAL_TEXTURE: &str = "GTAO_BentNormal";
pub const SPATIAL_X_TEXTURE: &str = "GTAO_SpatialX";
pub const SPATIAL_TEXTURE: &str = "GTAO_Spatial";
pub const CURRENT_TEXTURE: &str = "GTAO_Current";
pub const HISTORY_TEXTURE: &str = "GTAO_History";

const RESOLVE_PASS: u32 = 0;
const BLUR_X_PASS: u32 = 1;
const BLUR_Y_PASS: u32 = 2;
const TEMPORAL_PASS: u32 = 3;

/// Per-view runtime state of the GTAO effect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GtaoState {
    pub jitter: JitterSequence,
    /// View-projection of the last recorded frame, for reprojection.
    pub prev_view_projection: Option<Mat4>,
}

/// Ground truth ambient occlusion.
#[derive(Debug, Clone, Copy, Default)]
pub struct GtaoPass;

impl GtaoPass {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Builds the parameter block for this frame. Does not touch `state`.
    #[must_use]
    pub fn uniforms(
        settings: &GtaoSettings,
        state: &GtaoState,
        ctx: &EffectContext<'_>,
        history_valid: bool,
    ) -> GtaoUniforms {
        let camera = &ctx.frame.camera;
        let desc = &ctx.source.desc;

        let projection = AoProjection::from_camera(camera.fov_y, desc.width, desc.height);
        let view_projection = camera.view_projection();
        let jitter = state.jitter.current();
        let temporal = settings.temporal_filter(history_valid);

        GtaoUniforms {
            projection: camera.projection,
            view_projection,
            inverse_view_projection: view_projection.inverse(),
            prev_view_projection: state.prev_view_projection.unwrap_or(view_projection),
            world_to_camera: camera.view,
            camera_to_world: camera.view.inverse(),

            uv_to_view: projection.uv_to_view,
            texel_size: projection.texel_size,

            direction: jitter.direction(),
            offset: jitter.offset,
            half_proj_scale: projection.half_proj_scale,
            radius: settings.radius.value(),

            intensity: settings.intensity.value(),
            power: settings.power.value(),
            sharpness: settings.sharpness.value(),
            temporal_scale: temporal.scale,

            temporal_response: temporal.response,
            dir_samples: settings.dir_sampler.value(),
            slice_samples: settings.slice_sampler.value(),
            multi_bounce: u32::from(settings.multi_bounce.value),
        }
    }
}

impl PostEffect for GtaoPass {
    type Settings = GtaoSettings;
    type State = GtaoState;

    fn name(&self) -> &'static str {
        "GTAO"
    }

    fn programs(&self, _settings: &GtaoSettings) -> SmallVec<[&'static str; 4]> {
        smallvec![GTAO_MATERIAL]
    }

    fn skips_frame(&self, settings: &GtaoSettings, frame: &FrameInputs) -> bool {
        settings.hide_in_scene_view.value && frame.camera.kind == CameraKind::SceneView
    }

    fn record(
        &self,
        settings: &GtaoSettings,
        state: &mut GtaoState,
        ctx: &mut EffectContext<'_>,
    ) -> Result<ColorTarget> {
        let Some(depth) = ctx.frame.depth else {
            return Err(PostFxError::MissingInput {
                effect: self.name(),
                input: "depth",
            });
        };

        let source = ctx.source;
        let ao_desc = source.desc.with_format(AO_FORMAT);

        let scene_color = ctx.acquire(SCENE_COLOR_TEXTURE, source.desc)?;
        let ao = ctx.acquire(AO_TEXTURE, ao_desc)?;
        let bent_normal = ctx.acquire(BENT_NORMAL_TEXTURE, ao_desc)?;
        let spatial_x = ctx.acquire(SPATIAL_X_TEXTURE, ao_desc)?;
        let spatial = ctx.acquire(SPATIAL_TEXTURE, ao_desc)?;
        let current = ctx.acquire(CURRENT_TEXTURE, ao_desc)?;
        let history = ctx.acquire(HISTORY_TEXTURE, ao_desc)?;

        if history.fresh {
            log::debug!("GTAO: history reallocated, temporal response disabled this frame");
        }

        let uniforms = Self::uniforms(settings, state, ctx, !history.fresh);

        let scene_color = GraphResource::Persistent(scene_color.handle);
        let ao = GraphResource::Persistent(ao.handle);
        let bent_normal = GraphResource::Persistent(bent_normal.handle);
        let spatial_x = GraphResource::Persistent(spatial_x.handle);
        let spatial = GraphResource::Persistent(spatial.handle);
        let current = GraphResource::Persistent(current.handle);
        let history = GraphResource::Persistent(history.handle);

        ctx.builder.add_pass(PassNode::copy(
            "GTAO Copy Scene Color",
            source.resource,
            scene_color,
        ));

        let mut resolve = PassNode::blit("Resolve GTAO", MATERIAL, RESOLVE_PASS, scene_color, ao)
            .write(bent_normal, "bent_normal")
            .read(depth, "depth")
            .with_params(&uniforms);
        if let Some(normals) = ctx.frame.normals {
            resolve = resolve.read(normals, "normals");
        }

        ctx.builder
            .add_pass(resolve)
            .add_pass(
                PassNode::blit("Spatial Filter - XBlur", MATERIAL, BLUR_X_PASS, ao, spatial_x)
                    .read(depth, "depth")
                    .with_params(&uniforms),
            )
            .add_pass(
                PassNode::blit("Spatial Filter - YBlur", MATERIAL, BLUR_Y_PASS, spatial_x, spatial)
                    .read(depth, "depth")
                    .with_params(&uniforms),
            )
            .add_pass(
                PassNode::blit("Temporal Filter", MATERIAL, TEMPORAL_PASS, spatial, current)
                    .read(history, "history")
                    .with_params(&uniforms),
            );

        let destination = ctx.create_destination();
        ctx.builder
            .add_pass(
                PassNode::blit(
                    "Combine Scene Color",
                    MATERIAL,
                    settings.debug_view.value.pass_index(),
                    source.resource,
                    destination.resource,
                )
                .read(current, "ao")
                .read(ao, "raw_ao")
                .read(spatial, "spatial")
                .read(bent_normal, "bent_normal")
                .with_params(&uniforms),
            )
            .add_pass(PassNode::copy("Copy Current To History", current, history));

        state.jitter.advance();
        state.prev_view_projection = Some(uniforms.view_projection);

        Ok(destination)
    }
}
