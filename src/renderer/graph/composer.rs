//! Post-Process Stack
//!
//! `PostProcessStack` drives every effect of one view through a frame:
//!
//! 1. **Gate**: inactive effects are skipped without touching anything
//! 2. **Record**: each active effect records its passes into the shared
//!    [`PassGraphBuilder`], reading the previous effect's output
//! 3. **Resolve**: the final output is copied back into the view's color
//!    target
//! 4. **Execute**: the backend runs the frame's [`PassGraph`] exactly once
//!
//! ```text
//! color ─► GTAO ─► Edge Detection ─► DoG ─► Extended DoG ─► Auto Exposure ─► Tone Mapping ─► color
//! ```
//!
//! # Failure isolation
//!
//! A failing effect (backbuffer target, missing program or input, failed
//! allocation) is logged and skipped: its recorded passes are truncated, its
//! runtime state is left as it was, and the next effect reads the failing
//! effect's input instead. Only backend execution errors reach the caller.
//!
//! Recorded state is staged and committed once the graph has executed. When
//! execution fails, staged state is dropped and the persistent resources of
//! every recorded effect are invalidated, so the next frame re-seeds exposure
//! and discards AO history instead of reading textures that were never
//! written.
//!
//! # Ownership
//!
//! One stack per view. Each effect owns its runtime state and its own
//! [`ResourcePool`], so nothing is shared between views.

use smallvec::SmallVec;

use crate::errors::{PostFxError, Result};
use crate::resources::auto_exposure::AutoExposureSettings;
use crate::resources::log_histogram::LogHistogram;
use crate::resources::{EffectSettings, PostProcessVolume};

use super::builder::PassGraphBuilder;
use super::context::{EffectContext, FrameInputs};
use super::graph::{GpuBackend, PassGraph};
use super::node::PostEffect;
use super::pass::PassNode;
use super::pool::{ResourceAllocator, ResourcePool};
use super::passes::{
    AutoExposurePass, AutoExposureState, DifferenceOfGaussiansPass, EdgeDetectionPass,
    ExtendedDogPass, GtaoPass, GtaoState, ToneMappingPass,
};
use super::resource::{ColorTarget, ResourceHandle};

/// What happened to each effect during one frame.
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Effects whose passes are part of the executed graph.
    pub executed: SmallVec<[&'static str; 6]>,
    /// Effects skipped by their activation gate or for this frame's camera.
    pub inactive: SmallVec<[&'static str; 6]>,
    /// Effects skipped because of an error.
    pub failed: Vec<(&'static str, PostFxError)>,
    /// Number of passes handed to the backend.
    pub pass_count: usize,
}

impl FrameReport {
    #[must_use]
    pub fn was_executed(&self, effect: &str) -> bool {
        self.executed.contains(&effect)
    }

    #[must_use]
    pub fn failure(&self, effect: &str) -> Option<&PostFxError> {
        self.failed
            .iter()
            .find(|(name, _)| *name == effect)
            .map(|(_, e)| e)
    }
}

/// One effect with its per-view state and resources.
struct EffectSlot<E: PostEffect> {
    effect: E,
    state: E::State,
    /// State recorded this frame, waiting for the graph to execute.
    pending: Option<E::State>,
    resources: ResourcePool,
}

impl<E: PostEffect> EffectSlot<E> {
    fn new(effect: E) -> Self {
        let resources = ResourcePool::new(effect.name());
        Self {
            effect,
            state: E::State::default(),
            pending: None,
            resources,
        }
    }

    /// Runs the effect for one frame and returns the color the next effect
    /// should read.
    #[allow(clippy::too_many_arguments)]
    fn run(
        &mut self,
        settings: &E::Settings,
        builder: &mut PassGraphBuilder,
        backend: &mut dyn GpuBackend,
        frame: &FrameInputs,
        frame_index: u64,
        source: ColorTarget,
        report: &mut FrameReport,
    ) -> ColorTarget {
        let name = self.effect.name();

        if !settings.is_active() || self.effect.skips_frame(settings, frame) {
            report.inactive.push(name);
            return source;
        }

        if let Err(e) = builder.begin_effect(name, &source) {
            log::error!("Skipping render pass. {e}");
            report.failed.push((name, e));
            return source;
        }

        let missing = self
            .effect
            .programs(settings)
            .into_iter()
            .find(|program| !backend.has_program(program));
        if let Some(program) = missing {
            builder.abort_effect();
            let e = PostFxError::MissingProgram {
                effect: name,
                program,
            };
            log::error!("Skipping render pass. {e}");
            report.failed.push((name, e));
            return source;
        }

        let mut state = self.state.clone();
        let mut ctx = EffectContext {
            builder: &mut *builder,
            backend,
            resources: &mut self.resources,
            frame,
            frame_index,
            source,
        };

        match self.effect.record(settings, &mut state, &mut ctx) {
            Ok(output) => {
                builder.end_effect();
                self.pending = Some(state);
                report.executed.push(name);
                output
            }
            Err(e) => {
                builder.abort_effect();
                log::error!("Skipping render pass. {e}");
                report.failed.push((name, e));
                source
            }
        }
    }

    /// Commits the staged state, or drops it and invalidates the resources
    /// it was recorded against.
    fn settle(&mut self, executed: bool) {
        let Some(state) = self.pending.take() else {
            return;
        };
        if executed {
            self.state = state;
        } else {
            self.resources.invalidate();
        }
    }

    fn dispose(&mut self, allocator: &mut dyn ResourceAllocator) {
        self.resources.release_all(allocator);
        self.state = E::State::default();
        self.pending = None;
    }
}

/// The post-processing effects of one view.
///
/// # Usage
///
/// ```ignore
/// let mut stack = PostProcessStack::new();
/// let mut volume = PostProcessVolume::default();
/// volume.auto_exposure.enabled.set(true);
///
/// let inputs = FrameInputs::new(scene_color, camera, dt).with_depth(depth);
/// let report = stack.render_frame(&mut backend, &volume, &inputs)?;
/// ```
pub struct PostProcessStack {
    builder: PassGraphBuilder,
    frame_index: u64,

    gtao: EffectSlot<GtaoPass>,
    edge_detection: EffectSlot<EdgeDetectionPass>,
    dog: EffectSlot<DifferenceOfGaussiansPass>,
    extended_dog: EffectSlot<ExtendedDogPass>,
    auto_exposure: EffectSlot<AutoExposurePass>,
    tone_mapping: EffectSlot<ToneMappingPass>,

    last_graph: Option<PassGraph>,
    keep_last_graph: bool,
}

impl Default for PostProcessStack {
    fn default() -> Self {
        Self::new()
    }
}

impl PostProcessStack {
    #[must_use]
    pub fn new() -> Self {
        Self::with_auto_exposure(AutoExposurePass::new())
    }

    /// A stack with a custom-configured auto exposure effect.
    #[must_use]
    pub fn with_auto_exposure(auto_exposure: AutoExposurePass) -> Self {
        Self {
            builder: PassGraphBuilder::new(),
            frame_index: 0,
            gtao: EffectSlot::new(GtaoPass::new()),
            edge_detection: EffectSlot::new(EdgeDetectionPass::new()),
            dog: EffectSlot::new(DifferenceOfGaussiansPass::new()),
            extended_dog: EffectSlot::new(ExtendedDogPass::new()),
            auto_exposure: EffectSlot::new(auto_exposure),
            tone_mapping: EffectSlot::new(ToneMappingPass::new()),
            last_graph: None,
            keep_last_graph: false,
        }
    }

    /// Keeps a copy of each executed graph, for inspection.
    pub fn set_keep_last_graph(&mut self, keep: bool) {
        self.keep_last_graph = keep;
        if !keep {
            self.last_graph = None;
        }
    }

    #[inline]
    #[must_use]
    pub fn last_graph(&self) -> Option<&PassGraph> {
        self.last_graph.as_ref()
    }

    /// Frames rendered so far.
    #[inline]
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Records and executes one frame.
    ///
    /// Per-effect failures are reported in the returned [`FrameReport`];
    /// only graph execution failure is an error.
    pub fn render_frame<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        volume: &PostProcessVolume,
        inputs: &FrameInputs,
    ) -> Result<FrameReport> {
        let backend: &mut dyn GpuBackend = backend;
        let frame_index = self.frame_index;
        let builder = &mut self.builder;
        let mut report = FrameReport::default();

        let mut color = inputs.color;
        color = self.gtao.run(
            &volume.gtao,
            builder,
            backend,
            inputs,
            frame_index,
            color,
            &mut report,
        );
        color = self.edge_detection.run(
            &volume.edge_detection,
            builder,
            backend,
            inputs,
            frame_index,
            color,
            &mut report,
        );
        color = self.dog.run(
            &volume.dog,
            builder,
            backend,
            inputs,
            frame_index,
            color,
            &mut report,
        );
        color = self.extended_dog.run(
            &volume.extended_dog,
            builder,
            backend,
            inputs,
            frame_index,
            color,
            &mut report,
        );
        color = self.auto_exposure.run(
            &volume.auto_exposure,
            builder,
            backend,
            inputs,
            frame_index,
            color,
            &mut report,
        );
        color = self.tone_mapping.run(
            &volume.tone_mapping,
            builder,
            backend,
            inputs,
            frame_index,
            color,
            &mut report,
        );

        if color != inputs.color {
            builder.add_pass(PassNode::copy(
                "Post Process Resolve",
                color.resource,
                inputs.color.resource,
            ));
        }

        let graph = builder.build();
        report.pass_count = graph.len();

        let result = backend.execute(&graph);
        self.frame_index += 1;
        if self.keep_last_graph {
            self.last_graph = Some(graph);
        }

        if let Err(e) = &result {
            log::error!("Post-process graph failed, dropping frame state. {e}");
        }
        self.settle(result.is_ok());
        result?;

        Ok(report)
    }

    fn settle(&mut self, executed: bool) {
        self.gtao.settle(executed);
        self.edge_detection.settle(executed);
        self.dog.settle(executed);
        self.extended_dog.settle(executed);
        self.auto_exposure.settle(executed);
        self.tone_mapping.settle(executed);
    }

    /// Feeds a read-back histogram to the CPU exposure mirror and returns
    /// the adapted exposure.
    pub fn meter_exposure(
        &mut self,
        histogram: &LogHistogram,
        settings: &AutoExposureSettings,
        dt: f32,
    ) -> f32 {
        self.auto_exposure
            .state
            .metering
            .adapt(histogram, settings, dt)
    }

    #[inline]
    #[must_use]
    pub fn auto_exposure_state(&self) -> &AutoExposureState {
        &self.auto_exposure.state
    }

    #[inline]
    #[must_use]
    pub fn gtao_state(&self) -> &GtaoState {
        &self.gtao.state
    }

    /// Looks up a persistent resource by name across every effect.
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<ResourceHandle> {
        self.pools().find_map(|pool| pool.get(name))
    }

    /// Number of live persistent resources.
    #[must_use]
    pub fn resident_resources(&self) -> usize {
        self.pools().map(ResourcePool::len).sum()
    }

    fn pools(&self) -> impl Iterator<Item = &ResourcePool> {
        [
            &self.gtao.resources,
            &self.edge_detection.resources,
            &self.dog.resources,
            &self.extended_dog.resources,
            &self.auto_exposure.resources,
            &self.tone_mapping.resources,
        ]
        .into_iter()
    }

    /// Destroys every persistent resource and resets all runtime state.
    pub fn dispose<A: ResourceAllocator>(&mut self, allocator: &mut A) {
        let allocator: &mut dyn ResourceAllocator = allocator;
        self.gtao.dispose(allocator);
        self.edge_detection.dispose(allocator);
        self.dog.dispose(allocator);
        self.extended_dog.dispose(allocator);
        self.auto_exposure.dispose(allocator);
        self.tone_mapping.dispose(allocator);
        self.last_graph = None;
        log::debug!("Post-process stack disposed after {} frames", self.frame_index);
    }
}
