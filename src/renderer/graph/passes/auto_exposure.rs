//! Auto Exposure Pass
//!
//! Histogram-based eye adaptation. Per frame:
//!
//! ```text
//!  (seed frame only)
//!  Clear Auto Exposure ─────────────────────────────┐
//!                                                   ▼
//!  source ─► Histogram Clear ─► Histogram Build ─► Adapt ─► exposure (1×1)
//!     │                                                        │
//!     └──────────────────────► Apply ◄─────────────────────────┘
//!                                │
//!                           destination
//! ```
//!
//! The histogram buffer is rebuilt every frame; only the 1×1 exposure
//! texture carries state across frames.
//!
//! # Seeding
//!
//! A frame is a *seed* frame when the exposure texture was (re)allocated
//! this frame, or when the effect did not run on the previous frame of this
//! view. Seed frames clear the exposure to `key_value * 0.05` and adapt with
//! the fixed kernel, so re-enabling the effect snaps to the scene instead of
//! easing from a stale value.
//!
//! Seed frames are the one place a persistent resource is written twice in
//! a frame: the clear, then the adaptation dispatch. The clear only defines
//! the contents for a kernel that reads its destination.

use smallvec::{SmallVec, smallvec};

use crate::errors::Result;
use crate::renderer::graph::context::EffectContext;
use crate::renderer::graph::node::PostEffect;
use crate::renderer::graph::pass::{KernelRef, MaterialRef, PassNode};
use crate::renderer::graph::resource::{BufferDesc, ColorTarget, GraphResource, TextureDesc};
use crate::resources::auto_exposure::{
    AdaptationMode, AutoExposureSettings, ExposureApplyParams, ExposureMeteringEngine,
    ExposureParams,
};
use crate::resources::log_histogram::{
    EvRange, HISTOGRAM_BINS, HISTOGRAM_THREADS_X, HISTOGRAM_THREADS_Y,
};

/// Compute program building the luminance histogram.
pub const LOG_HISTOGRAM_PROGRAM: &str = "LogHistogram";
/// Compute program adapting the exposure from the histogram.
pub const ADAPTATION_PROGRAM: &str = "AutoExposure";
/// Material applying the exposure to the color.
pub const APPLY_MATERIAL: &str = "AutoExposureApply";

/// Persistent 1×1 exposure texture.
pub const EXPOSURE_TEXTURE: &str = "AutoExposure_Current";
/// Per-frame histogram buffer, kept allocated across frames.
pub const HISTOGRAM_BUFFER: &str = "AutoExposure_Histogram";

const EXPOSURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

const HISTOGRAM_CLEAR: KernelRef = KernelRef::new(LOG_HISTOGRAM_PROGRAM, "clear");
const HISTOGRAM_BUILD: KernelRef = KernelRef::new(LOG_HISTOGRAM_PROGRAM, "build");

/// Per-view runtime state of the auto exposure effect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutoExposureState {
    /// Frame index of the last successful recording.
    pub last_metered_frame: Option<u64>,
    /// Adaptation mode used on that frame.
    pub last_mode: Option<AdaptationMode>,
    /// CPU mirror, fed by histogram read-back when the host has one.
    pub metering: ExposureMeteringEngine,
}

impl AutoExposureState {
    /// Whether the frame `frame_index` directly follows a metered frame.
    #[must_use]
    pub fn is_continuous(&self, frame_index: u64) -> bool {
        self.last_metered_frame
            .is_some_and(|last| last.checked_add(1) == Some(frame_index))
    }
}

/// Histogram-based auto exposure.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoExposurePass {
    range: EvRange,
}

impl AutoExposurePass {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Auto exposure metering over a custom EV range.
    #[must_use]
    pub fn with_range(range: EvRange) -> Self {
        Self { range }
    }

    #[inline]
    #[must_use]
    pub fn range(&self) -> EvRange {
        self.range
    }

    /// Work groups of the histogram build kernel (each thread covers 2×2 pixels).
    #[must_use]
    pub fn histogram_groups(width: u32, height: u32) -> [u32; 3] {
        [
            width.div_ceil(2).div_ceil(HISTOGRAM_THREADS_X).max(1),
            height.div_ceil(2).div_ceil(HISTOGRAM_THREADS_Y).max(1),
            1,
        ]
    }
}

impl PostEffect for AutoExposurePass {
    type Settings = AutoExposureSettings;
    type State = AutoExposureState;

    fn name(&self) -> &'static str {
        "Auto Exposure"
    }

    fn programs(&self, _settings: &AutoExposureSettings) -> SmallVec<[&'static str; 4]> {
        smallvec![LOG_HISTOGRAM_PROGRAM, ADAPTATION_PROGRAM, APPLY_MATERIAL]
    }

    fn record(
        &self,
        settings: &AutoExposureSettings,
        state: &mut AutoExposureState,
        ctx: &mut EffectContext<'_>,
    ) -> Result<ColorTarget> {
        let source = ctx.source;
        let (width, height) = (source.desc.width, source.desc.height);

        let exposure = ctx.acquire(
            EXPOSURE_TEXTURE,
            TextureDesc::new(
                1,
                1,
                EXPOSURE_FORMAT,
                wgpu::TextureUsages::STORAGE_BINDING
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::COPY_SRC,
            ),
        )?;
        let histogram = ctx.acquire(
            HISTOGRAM_BUFFER,
            BufferDesc {
                size: (HISTOGRAM_BINS * std::mem::size_of::<u32>()) as u64,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            },
        )?;

        let seed = exposure.fresh || !state.is_continuous(ctx.frame_index);
        let mode = AdaptationMode::select(settings.eye_adaptation.value, seed);

        let exposure_res = GraphResource::Persistent(exposure.handle);
        let histogram_res = GraphResource::Persistent(histogram.handle);
        let params = ExposureParams::new(
            settings,
            ctx.frame.delta_time,
            self.range.scale_offset_res(width, height),
        );

        if seed {
            log::debug!("Auto Exposure: seeding exposure ({mode:?})");
            ctx.builder.add_pass(PassNode::clear(
                "Clear Auto Exposure",
                exposure_res,
                settings.key_value.value() * 0.05,
            ));
        }

        let clear_groups = (HISTOGRAM_BINS as u32).div_ceil(HISTOGRAM_THREADS_X);
        ctx.builder
            .add_pass(
                PassNode::dispatch("LogHistogram Clear", HISTOGRAM_CLEAR, [clear_groups, 1, 1])
                    .write(histogram_res, "histogram"),
            )
            .add_pass(
                PassNode::dispatch(
                    "LogHistogram Build",
                    HISTOGRAM_BUILD,
                    Self::histogram_groups(width, height),
                )
                .read(source.resource, "source")
                .read_write(histogram_res, "histogram")
                .with_params(&params.scale_offset_res),
            );

        let adapt = PassNode::dispatch(
            "Auto Exposure Adapt",
            KernelRef::new(ADAPTATION_PROGRAM, mode.kernel_entry()),
            [1, 1, 1],
        )
        .read(histogram_res, "histogram")
        .with_params(&params);
        let adapt = match mode {
            AdaptationMode::Fixed => adapt.write(exposure_res, "destination"),
            AdaptationMode::Progressive => adapt.read_write(exposure_res, "destination"),
        };
        ctx.builder.add_pass(adapt);

        let destination = ctx.create_destination();
        ctx.builder.add_pass(
            PassNode::blit(
                "Auto Exposure",
                MaterialRef::new(APPLY_MATERIAL),
                0,
                source.resource,
                destination.resource,
            )
            .read(exposure_res, "exposure")
            .with_params(&ExposureApplyParams::new(settings)),
        );

        if seed {
            state.metering.reset();
        }
        state.last_metered_frame = Some(ctx.frame_index);
        state.last_mode = Some(mode);

        Ok(destination)
    }
}
