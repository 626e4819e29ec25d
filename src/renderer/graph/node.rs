//! Post Effect Trait
//!
//! Defines the interface every post-processing effect implements.
//!
//! Effects are stateless descriptions of work. Everything that must survive
//! between frames lives in an explicit [`PostEffect::State`] value owned by
//! the [`PostProcessStack`](super::PostProcessStack) of one view, so two
//! views (or two stacks) never share jitter counters or history flags.

use smallvec::SmallVec;

use crate::errors::Result;
use crate::resources::EffectSettings;

use super::context::{EffectContext, FrameInputs};
use super::resource::ColorTarget;

pub trait PostEffect {
    type Settings: EffectSettings;
    /// Per-view runtime state carried across frames.
    type State: Default + Clone;

    /// Name used for pass groups, pool labels and diagnostics.
    fn name(&self) -> &'static str;

    /// GPU programs the effect needs with `settings`.
    ///
    /// Checked against the backend before recording; a missing program
    /// skips the effect for the frame.
    fn programs(&self, settings: &Self::Settings) -> SmallVec<[&'static str; 4]>;

    /// Whether an active effect sits this frame out, e.g. for the camera it
    /// renders. Skipped effects are reported as inactive.
    fn skips_frame(&self, _settings: &Self::Settings, _frame: &FrameInputs) -> bool {
        false
    }

    /// Records the effect's passes and returns its output.
    ///
    /// `state` is a scratch copy: it is committed only when this returns
    /// `Ok` and the frame's graph executes, so a failing frame leaves the
    /// previous state intact.
    fn record(
        &self,
        settings: &Self::Settings,
        state: &mut Self::State,
        ctx: &mut EffectContext<'_>,
    ) -> Result<ColorTarget>;
}
