//! Effect Configuration
//!
//! Pure data describing what each effect should do this frame. Nothing in
//! this module touches the GPU; the render passes read these snapshots and
//! turn them into parameter blocks.
//!
//! - [`param`]: Parameter wrappers with override flags and clamping
//! - [`log_histogram`]: Log-luminance histogram mapping and CPU reference
//! - [`auto_exposure`]: Metering, adaptation curve
//! - [`gtao`]: AO jitter, projection terms, temporal filter
//! - [`tone_mapping`], [`edge_detection`], [`dog`]: Single-purpose filters
//! - [`extended_dog`]: Flow-based XDoG stylization with hatching

pub mod auto_exposure;
pub mod dog;
pub mod edge_detection;
pub mod extended_dog;
pub mod gtao;
pub mod log_histogram;
pub mod param;
pub mod tone_mapping;

pub use auto_exposure::{
    AdaptationMode, AutoExposureSettings, ExposureApplyParams, ExposureMeteringEngine,
    ExposureParams, EyeAdaptation, LuminanceBounds, PercentileFilter, adapt_exposure,
};
pub use dog::{DifferenceOfGaussiansSettings, DifferenceOfGaussiansUniforms};
pub use edge_detection::{EdgeDetectionSettings, EdgeDetectionUniforms};
pub use extended_dog::{
    DogBlendMode, ExtendedDogSettings, ExtendedDogUniforms, HatchLayer, ThresholdMode,
};
pub use gtao::{
    AoDebugView, AoProjection, GtaoSettings, GtaoUniforms, JitterSample, JitterSequence,
    TemporalFilter,
};
pub use log_histogram::{EvRange, HISTOGRAM_BINS, LogHistogram};
pub use param::{ClampedParam, MinParam, Param, RangeParam};
pub use tone_mapping::{LutTexture, ToneMapper, ToneMappingSettings, ToneMappingUniforms};

use serde::{Deserialize, Serialize};

/// Activation gate shared by every effect configuration.
pub trait EffectSettings {
    /// Whether the effect records any work this frame.
    fn is_active(&self) -> bool;
}

/// Resolved configuration of every effect for one view and frame.
///
/// Produced by the host's layered override resolution and treated as an
/// immutable snapshot while the frame is recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessVolume {
    pub auto_exposure: AutoExposureSettings,
    pub gtao: GtaoSettings,
    pub tone_mapping: ToneMappingSettings,
    pub edge_detection: EdgeDetectionSettings,
    pub dog: DifferenceOfGaussiansSettings,
    pub extended_dog: ExtendedDogSettings,
}

impl PostProcessVolume {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
