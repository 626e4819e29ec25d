//! Auto Exposure Configuration and Metering
//!
//! Pure data and CPU-side math for histogram-based eye adaptation. The GPU
//! pass ([`AutoExposurePass`](crate::renderer::graph::passes::AutoExposurePass))
//! feeds the same parameters to the external adaptation kernel; the
//! [`ExposureMeteringEngine`] runs the identical curve on the CPU for
//! read-back metering and tests.
//!
//! # Metering
//!
//! 1. The percentile window `[low, high]` is clamped to
//!    `1 <= low <= high - ε`, `1 + ε <= high <= 99` (ε = 0.01).
//! 2. The filtered average luminance of the histogram is clamped to the
//!    symmetrized luminance bounds `[2^min', 2^max']`.
//! 3. Target exposure = `key_value / average_luminance`.
//!
//! # Adaptation
//!
//! - **Fixed**: exposure snaps to the target.
//! - **Progressive**: `e += (target - e) * (1 - 2^(-dt * speed))`. A scene
//!   getting brighter lowers the target exposure and adapts at `speed_up`;
//!   a darker scene raises it and adapts at `speed_down`.

use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::resources::EffectSettings;
use crate::resources::log_histogram::{EV_RANGE_MAX, EV_RANGE_MIN, LogHistogram};
use crate::resources::param::{ClampedParam, MinParam, Param, RangeParam};

/// Minimum width of the percentile window, in percent.
pub const PERCENTILE_MIN_DELTA: f32 = 1e-2;

/// Eye adaptation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EyeAdaptation {
    /// Smooth, frame-rate independent adaptation.
    #[default]
    Progressive,
    /// Instant adaptation.
    Fixed,
}

/// Auto exposure configuration.
///
/// # Usage
///
/// ```rust,ignore
/// let mut settings = AutoExposureSettings::default();
/// settings.enabled.set(true);
/// settings.set_filtering(10.0, 90.0);
/// settings.set_eye_adaptation(EyeAdaptation::Fixed);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoExposureSettings {
    pub enabled: Param<bool>,

    /// Percentile window of the histogram used for the average, in percent.
    pub filtering: RangeParam,
    /// Minimum average luminance considered, in EV.
    pub min_luminance: ClampedParam<f32>,
    /// Maximum average luminance considered, in EV.
    pub max_luminance: ClampedParam<f32>,
    /// Exposure compensation (key value).
    pub key_value: MinParam,

    pub eye_adaptation: Param<EyeAdaptation>,
    /// Adaptation speed from a dark to a light environment.
    pub speed_up: MinParam,
    /// Adaptation speed from a light to a dark environment.
    pub speed_down: MinParam,
}

impl Default for AutoExposureSettings {
    fn default() -> Self {
        Self {
            enabled: Param::new(true),
            filtering: RangeParam::new(30.0, 95.0, 1.0, 99.0),
            min_luminance: ClampedParam::new(5.0, EV_RANGE_MIN, EV_RANGE_MAX),
            max_luminance: ClampedParam::new(-5.0, EV_RANGE_MIN, EV_RANGE_MAX),
            key_value: MinParam::new(0.4, 0.0),
            eye_adaptation: Param::new(EyeAdaptation::Progressive),
            speed_up: MinParam::new(2.0, 0.0),
            speed_down: MinParam::new(1.0, 0.0),
        }
    }
}

impl EffectSettings for AutoExposureSettings {
    fn is_active(&self) -> bool {
        self.enabled.override_state && self.enabled.value
    }
}

impl AutoExposureSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_filtering(&mut self, low: f32, high: f32) {
        self.filtering.set(low, high);
    }

    pub fn set_luminance_range(&mut self, min_ev: f32, max_ev: f32) {
        self.min_luminance.set(min_ev);
        self.max_luminance.set(max_ev);
    }

    pub fn set_key_value(&mut self, key: f32) {
        self.key_value.set(key);
    }

    pub fn set_eye_adaptation(&mut self, mode: EyeAdaptation) {
        self.eye_adaptation.set(mode);
    }

    pub fn set_speeds(&mut self, speed_up: f32, speed_down: f32) {
        self.speed_up.set(speed_up);
        self.speed_down.set(speed_down);
    }

    /// The percentile window after validity clamping.
    #[must_use]
    pub fn percentile_filter(&self) -> PercentileFilter {
        let (low, high) = self.filtering.value();
        PercentileFilter::new(low, high)
    }

    /// The luminance bounds after symmetrization.
    #[must_use]
    pub fn luminance_bounds(&self) -> LuminanceBounds {
        LuminanceBounds::new(self.min_luminance.value(), self.max_luminance.value())
    }
}

/// A validated percentile window, in percent.
///
/// Always satisfies `1 <= low < high <= 99` and `high - low >= 0.01`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileFilter {
    low: f32,
    high: f32,
}

impl PercentileFilter {
    /// Clamps an arbitrary window into a non-degenerate one.
    #[must_use]
    pub fn new(low: f32, high: f32) -> Self {
        let high = if high.is_nan() { 99.0 } else { high };
        let low = if low.is_nan() { 1.0 } else { low };
        let high = high.clamp(1.0 + PERCENTILE_MIN_DELTA, 99.0);
        let low = low.max(1.0).min(high - PERCENTILE_MIN_DELTA);
        Self { low, high }
    }

    #[inline]
    #[must_use]
    pub fn low(&self) -> f32 {
        self.low
    }

    #[inline]
    #[must_use]
    pub fn high(&self) -> f32 {
        self.high
    }

    /// The window as fractions of the sample count.
    #[inline]
    #[must_use]
    pub fn fractions(&self) -> (f32, f32) {
        (self.low * 0.01, self.high * 0.01)
    }
}

/// Symmetrized luminance bounds, in EV. `min_ev <= max_ev` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LuminanceBounds {
    min_ev: f32,
    max_ev: f32,
}

impl LuminanceBounds {
    /// Orders the bounds. A NaN bound falls back to the edge of the EV range.
    #[must_use]
    pub fn new(a: f32, b: f32) -> Self {
        let a = if a.is_nan() { EV_RANGE_MIN } else { a };
        let b = if b.is_nan() { EV_RANGE_MAX } else { b };
        Self {
            min_ev: a.min(b),
            max_ev: a.max(b),
        }
    }

    #[inline]
    #[must_use]
    pub fn min_ev(&self) -> f32 {
        self.min_ev
    }

    #[inline]
    #[must_use]
    pub fn max_ev(&self) -> f32 {
        self.max_ev
    }

    /// Bounds as linear luminance.
    #[inline]
    #[must_use]
    pub fn linear(&self) -> (f32, f32) {
        (self.min_ev.exp2(), self.max_ev.exp2())
    }

    #[inline]
    #[must_use]
    pub fn clamp(&self, luminance: f32) -> f32 {
        let (lo, hi) = self.linear();
        luminance.clamp(lo, hi)
    }
}

/// Adaptation strategy for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdaptationMode {
    Fixed,
    Progressive,
}

impl AdaptationMode {
    /// Fixed when configured so, or when no valid history exists yet.
    #[must_use]
    pub fn select(configured: EyeAdaptation, seed_frame: bool) -> Self {
        if seed_frame || configured == EyeAdaptation::Fixed {
            Self::Fixed
        } else {
            Self::Progressive
        }
    }

    /// Entry point of the adaptation kernel implementing this mode.
    #[must_use]
    pub const fn kernel_entry(self) -> &'static str {
        match self {
            Self::Fixed => "adapt_fixed",
            Self::Progressive => "adapt_progressive",
        }
    }
}

/// One progressive adaptation step.
///
/// A falling exposure means the scene got brighter and uses `speed_up`.
/// Negative speeds and `dt` are treated as zero, so the result always lies
/// between `current` and `target`.
#[must_use]
pub fn adapt_exposure(current: f32, target: f32, speed_up: f32, speed_down: f32, dt: f32) -> f32 {
    let delta = target - current;
    let speed = if delta < 0.0 { speed_up } else { speed_down }.max(0.0);
    let dt = dt.max(0.0);
    current + delta * (1.0 - (-dt * speed).exp2())
}

/// CPU-side exposure metering with persistent adapted exposure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExposureMeteringEngine {
    exposure: Option<f32>,
}

impl ExposureMeteringEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The adapted exposure, or `None` before the first metered frame.
    #[inline]
    #[must_use]
    pub fn exposure(&self) -> Option<f32> {
        self.exposure
    }

    /// Drops the adapted exposure; the next frame snaps to its target.
    pub fn reset(&mut self) {
        self.exposure = None;
    }

    /// Average luminance used for the target, after percentile filtering
    /// and bound clamping.
    #[must_use]
    pub fn average_luminance(histogram: &LogHistogram, settings: &AutoExposureSettings) -> f32 {
        let (low, high) = settings.percentile_filter().fractions();
        let avg = histogram.filtered_average_luminance(low, high);
        settings.luminance_bounds().clamp(avg)
    }

    #[must_use]
    pub fn target_exposure(histogram: &LogHistogram, settings: &AutoExposureSettings) -> f32 {
        let avg = Self::average_luminance(histogram, settings);
        settings.key_value.value() / avg.max(1e-4)
    }

    /// Meters one frame and updates the adapted exposure.
    pub fn adapt(
        &mut self,
        histogram: &LogHistogram,
        settings: &AutoExposureSettings,
        dt: f32,
    ) -> f32 {
        let target = Self::target_exposure(histogram, settings);
        let mode = AdaptationMode::select(settings.eye_adaptation.value, self.exposure.is_none());

        let next = match (mode, self.exposure) {
            (AdaptationMode::Progressive, Some(current)) => adapt_exposure(
                current,
                target,
                settings.speed_up.value(),
                settings.speed_down.value(),
                dt,
            ),
            _ => target,
        };

        self.exposure = Some(next);
        next
    }
}

/// Parameter block of the adaptation kernel.
///
/// - `params1`: `(low fraction, high fraction, 2^min', 2^max')`
/// - `params2`: `(speed_down, speed_up, key_value, dt)`
/// - `scale_offset_res`: histogram scale/offset and target resolution
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ExposureParams {
    pub params1: Vec4,
    pub params2: Vec4,
    pub scale_offset_res: Vec4,
}

impl ExposureParams {
    #[must_use]
    pub fn new(settings: &AutoExposureSettings, dt: f32, scale_offset_res: Vec4) -> Self {
        let (low, high) = settings.percentile_filter().fractions();
        let (min_lum, max_lum) = settings.luminance_bounds().linear();
        Self {
            params1: Vec4::new(low, high, min_lum, max_lum),
            params2: Vec4::new(
                settings.speed_down.value(),
                settings.speed_up.value(),
                settings.key_value.value(),
                dt.max(0.0),
            ),
            scale_offset_res,
        }
    }
}

/// Parameter block of the exposure apply blit.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ExposureApplyParams {
    pub exposure_compensation: f32,
    pub(crate) __pad: [f32; 3],
}

impl ExposureApplyParams {
    #[must_use]
    pub fn new(settings: &AutoExposureSettings) -> Self {
        Self {
            exposure_compensation: settings.key_value.value(),
            __pad: [0.0; 3],
        }
    }
}
