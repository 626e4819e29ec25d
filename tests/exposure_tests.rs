//! Exposure Metering Tests
//!
//! Tests for:
//! - PercentileFilter: clamping of arbitrary windows
//! - LuminanceBounds: symmetrization
//! - LogHistogram: bin mapping, percentile-filtered average
//! - ExposureMeteringEngine: fixed and progressive adaptation

use pulse_fx::resources::auto_exposure::{
    AutoExposureSettings, ExposureMeteringEngine, EyeAdaptation, LuminanceBounds,
    PercentileFilter, adapt_exposure,
};
use pulse_fx::resources::log_histogram::{EvRange, HISTOGRAM_BINS, LogHistogram};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn uniform_histogram(luminance: f32, count: usize) -> LogHistogram {
    let mut h = LogHistogram::default();
    h.accumulate_all(std::iter::repeat_n(luminance, count));
    h
}

/// Half the samples at `dark`, half at `bright`.
fn split_histogram(dark: f32, bright: f32) -> LogHistogram {
    let mut h = LogHistogram::default();
    h.accumulate_all(std::iter::repeat_n(dark, 500));
    h.accumulate_all(std::iter::repeat_n(bright, 500));
    h
}

// ============================================================================
// Percentile Window
// ============================================================================

#[test]
fn percentile_window_is_always_valid() {
    let inputs = [
        (30.0, 95.0),
        (95.0, 30.0),
        (0.0, 0.0),
        (-50.0, 500.0),
        (99.0, 99.0),
        (1.0, 1.0),
        (50.0, 50.0),
        (100.0, 100.0),
        (f32::NAN, 40.0),
        (20.0, f32::NAN),
    ];

    for (low, high) in inputs {
        let f = PercentileFilter::new(low, high);
        assert!(f.low() >= 1.0, "low {} for {low},{high}", f.low());
        assert!(f.high() <= 99.0, "high {} for {low},{high}", f.high());
        assert!(f.low() < f.high(), "{low},{high}");
        assert!(
            f.high() - f.low() >= 0.01 - EPSILON,
            "width {} for {low},{high}",
            f.high() - f.low()
        );
    }
}

#[test]
fn percentile_window_keeps_valid_input() {
    let f = PercentileFilter::new(30.0, 95.0);
    assert!(approx(f.low(), 30.0));
    assert!(approx(f.high(), 95.0));
    let (lo, hi) = f.fractions();
    assert!(approx(lo, 0.3));
    assert!(approx(hi, 0.95));
}

#[test]
fn settings_window_goes_through_clamping() {
    let mut s = AutoExposureSettings::default();
    s.set_filtering(60.0, 40.0);
    let f = s.percentile_filter();
    assert!(f.low() < f.high());
    assert!(f.high() - f.low() >= 0.01 - EPSILON);
}

// ============================================================================
// Luminance Bounds
// ============================================================================

#[test]
fn luminance_bounds_are_ordered() {
    for (a, b) in [(5.0, -5.0), (-5.0, 5.0), (3.0, 3.0), (-9.0, 9.0), (2.0, -8.0)] {
        let bounds = LuminanceBounds::new(a, b);
        assert!(bounds.min_ev() <= bounds.max_ev());
        let (lo, hi) = bounds.linear();
        assert!(lo <= hi);
    }
}

#[test]
fn nan_luminance_range_still_meters() {
    let mut settings = AutoExposureSettings::default();
    settings.set_luminance_range(f32::NAN, f32::NAN);

    let bounds = settings.luminance_bounds();
    assert!(bounds.min_ev() <= bounds.max_ev());

    let target = ExposureMeteringEngine::target_exposure(&uniform_histogram(1.0, 100), &settings);
    assert!(target.is_finite() && target > 0.0, "target = {target}");

    let direct = LuminanceBounds::new(f32::NAN, f32::NAN);
    assert!(direct.min_ev() <= direct.max_ev());
    assert!(direct.clamp(1.0).is_finite());
}

#[test]
fn luminance_bounds_clamp_average() {
    let bounds = LuminanceBounds::new(1.0, -1.0);
    assert!(approx(bounds.clamp(100.0), 2.0));
    assert!(approx(bounds.clamp(0.01), 0.5));
    assert!(approx(bounds.clamp(1.0), 1.0));
}

// ============================================================================
// Histogram
// ============================================================================

#[test]
fn histogram_bins_cover_ev_range() {
    let range = EvRange::default();
    assert_eq!(range.bin_for_luminance(0.0), 0);
    assert_eq!(range.bin_for_luminance(-1.0), 0);
    assert_eq!(range.bin_for_luminance(f32::NAN), 0);
    assert_eq!(range.bin_for_luminance(1e9), HISTOGRAM_BINS - 1);
    assert_eq!(range.bin_for_luminance(1.0), 63);
}

#[test]
fn empty_histogram_averages_to_zero() {
    assert_eq!(LogHistogram::default().filtered_average_luminance(0.3, 0.95), 0.0);
}

#[test]
fn uniform_ev0_image_meters_luminance_one() {
    let h = uniform_histogram(1.0, 4096);
    let avg = h.filtered_average_luminance(0.30, 0.95);
    assert!(approx(avg, 1.0), "avg = {avg}");

    let mut settings = AutoExposureSettings::default();
    settings.set_filtering(30.0, 95.0);
    settings.set_key_value(1.0);
    let target = ExposureMeteringEngine::target_exposure(&h, &settings);
    assert!(approx(target, 1.0), "target = {target}");
}

#[test]
fn percentile_clipping_discards_extremes() {
    // 10% very dark, 80% mid, 10% very bright.
    let mut h = LogHistogram::default();
    h.accumulate_all(std::iter::repeat_n(1.0 / 256.0, 100));
    h.accumulate_all(std::iter::repeat_n(1.0, 800));
    h.accumulate_all(std::iter::repeat_n(256.0, 100));

    let clipped = h.filtered_average_luminance(0.10, 0.90);
    let unclipped = h.filtered_average_luminance(0.0, 1.0);

    assert!(approx(clipped, 1.0), "clipped = {clipped}");
    assert!(unclipped > 10.0);
}

#[test]
fn target_exposure_respects_luminance_bounds() {
    let settings = AutoExposureSettings::default(); // bounds [-5, 5] EV
    let bright = uniform_histogram(4096.0, 100);
    let target = ExposureMeteringEngine::target_exposure(&bright, &settings);
    assert!(approx(target, 0.4 / 32.0), "target = {target}");
}

// ============================================================================
// Adaptation
// ============================================================================

#[test]
fn fixed_mode_tracks_target_every_frame() {
    let mut settings = AutoExposureSettings::default();
    settings.set_eye_adaptation(EyeAdaptation::Fixed);
    let mut engine = ExposureMeteringEngine::new();

    for h in [
        uniform_histogram(1.0, 100),
        uniform_histogram(8.0, 100),
        split_histogram(0.25, 4.0),
        uniform_histogram(0.125, 100),
    ] {
        let target = ExposureMeteringEngine::target_exposure(&h, &settings);
        let exposure = engine.adapt(&h, &settings, 1.0 / 60.0);
        assert!(approx(exposure, target));
    }
}

#[test]
fn progressive_mode_snaps_on_first_frame() {
    let settings = AutoExposureSettings::default();
    let mut engine = ExposureMeteringEngine::new();
    let h = uniform_histogram(2.0, 100);

    let exposure = engine.adapt(&h, &settings, 1.0 / 60.0);
    assert!(approx(
        exposure,
        ExposureMeteringEngine::target_exposure(&h, &settings)
    ));
}

#[test]
fn progressive_mode_converges_monotonically() {
    let mut settings = AutoExposureSettings::default();
    settings.set_speeds(2.0, 1.0);
    let dt = 1.0 / 60.0;

    for (start, goal) in [(0.1_f32, 2.0_f32), (2.0, 0.1)] {
        let speed: f32 = if goal < start { 2.0 } else { 1.0 };
        // 2^-12 of the initial gap remains after 12 / (dt * speed) frames.
        let bound = (12.0 / (dt * speed)).ceil() as usize;

        let mut exposure = start;
        let mut frames = 0;
        while (exposure - goal).abs() > 1e-3 * (start - goal).abs() {
            let next = adapt_exposure(exposure, goal, 2.0, 1.0, dt);
            assert!((goal - next).abs() <= (goal - exposure).abs());
            if goal > start {
                assert!(next >= exposure && next <= goal);
            } else {
                assert!(next <= exposure && next >= goal);
            }
            exposure = next;
            frames += 1;
            assert!(frames <= bound, "no convergence within {bound} frames");
        }
    }
}

#[test]
fn progressive_mode_never_overshoots_large_steps() {
    for dt in [0.001, 0.1, 1.0, 10.0, 1000.0] {
        let next = adapt_exposure(1.0, 3.0, 50.0, 50.0, dt);
        assert!((1.0..=3.0).contains(&next), "dt {dt} -> {next}");
    }
}

#[test]
fn engine_progressive_adaptation_follows_curve() {
    let mut settings = AutoExposureSettings::default();
    settings.set_speeds(3.0, 1.0);
    let mut engine = ExposureMeteringEngine::new();
    let dt = 0.05;

    let dark = uniform_histogram(0.5, 100);
    let bright = uniform_histogram(2.0, 100);

    let first = engine.adapt(&dark, &settings, dt);
    let target = ExposureMeteringEngine::target_exposure(&bright, &settings);
    let second = engine.adapt(&bright, &settings, dt);

    // Brighter scene: lower target, so speed_up applies.
    let expected = adapt_exposure(first, target, 3.0, 1.0, dt);
    assert!(target < first);
    assert!(approx(second, expected));
}

#[test]
fn brightening_scene_adapts_at_speed_up() {
    let mut settings = AutoExposureSettings::default();
    settings.set_speeds(5.0, 0.0);
    let mut engine = ExposureMeteringEngine::new();
    let dt = 0.1;

    let dark = uniform_histogram(0.25, 100);
    let bright = uniform_histogram(4.0, 100);

    let first = engine.adapt(&dark, &settings, dt);
    let second = engine.adapt(&bright, &settings, dt);
    assert!(second < first, "{first} -> {second}");

    // Back to dark with speed_down = 0: exposure holds.
    let third = engine.adapt(&dark, &settings, dt);
    assert!(approx(third, second), "{second} -> {third}");
}

#[test]
fn reset_forces_snap() {
    let settings = AutoExposureSettings::default();
    let mut engine = ExposureMeteringEngine::new();
    engine.adapt(&uniform_histogram(0.5, 100), &settings, 0.016);

    engine.reset();
    assert_eq!(engine.exposure(), None);

    let h = uniform_histogram(4.0, 100);
    let exposure = engine.adapt(&h, &settings, 0.016);
    assert!(approx(
        exposure,
        ExposureMeteringEngine::target_exposure(&h, &settings)
    ));
}
