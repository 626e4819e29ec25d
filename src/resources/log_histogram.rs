//! Log-Luminance Histogram
//!
//! The auto-exposure histogram has [`HISTOGRAM_BINS`] bins spread over a
//! fixed EV range (default `[-9, +9]`). The GPU kernels build it every frame
//! from the current color buffer; [`LogHistogram`] is the CPU counterpart
//! used for read-back metering and tests. Both use the same bin mapping:
//!
//! ```text
//! bin = clamp((log2(L) - ev_min) / (ev_max - ev_min), 0, 1) * (BINS - 1)
//! ```
//!
//! The histogram itself is never carried across frames.

use glam::{Vec2, Vec4};

/// Number of histogram bins.
pub const HISTOGRAM_BINS: usize = 128;
/// Lower end of the default metering range, in EV.
pub const EV_RANGE_MIN: f32 = -9.0;
/// Upper end of the default metering range, in EV.
pub const EV_RANGE_MAX: f32 = 9.0;
/// Histogram kernel thread-group width.
pub const HISTOGRAM_THREADS_X: u32 = 16;
/// Histogram kernel thread-group height.
pub const HISTOGRAM_THREADS_Y: u32 = 16;

/// The EV interval mapped onto the histogram bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvRange {
    pub min: f32,
    pub max: f32,
}

impl Default for EvRange {
    fn default() -> Self {
        Self {
            min: EV_RANGE_MIN,
            max: EV_RANGE_MAX,
        }
    }
}

impl EvRange {
    #[must_use]
    pub fn new(min: f32, max: f32) -> Self {
        debug_assert!(max > min, "EvRange must be non-empty");
        Self { min, max }
    }

    /// `(scale, offset)` such that `log2(L) * scale + offset` is the
    /// normalized bin position.
    #[inline]
    #[must_use]
    pub fn scale_offset(&self) -> Vec2 {
        let scale = 1.0 / (self.max - self.min);
        Vec2::new(scale, -self.min * scale)
    }

    /// Scale/offset plus target resolution, the layout the histogram and
    /// adaptation kernels expect.
    #[inline]
    #[must_use]
    pub fn scale_offset_res(&self, width: u32, height: u32) -> Vec4 {
        let so = self.scale_offset();
        Vec4::new(so.x, so.y, width as f32, height as f32)
    }

    /// Bin index for a linear luminance value.
    ///
    /// Non-positive and NaN luminance land in bin 0.
    #[must_use]
    pub fn bin_for_luminance(&self, luminance: f32) -> usize {
        if luminance.is_nan() || luminance <= 0.0 {
            return 0;
        }
        let so = self.scale_offset();
        let t = (luminance.log2() * so.x + so.y).clamp(0.0, 1.0);
        (t * (HISTOGRAM_BINS - 1) as f32) as usize
    }

    /// EV at the center of a bin's interval, capped at `max`.
    #[inline]
    #[must_use]
    pub fn bin_ev(&self, bin: usize) -> f32 {
        let t = (bin as f32 + 0.5) / (HISTOGRAM_BINS - 1) as f32;
        (self.min + t * (self.max - self.min)).min(self.max)
    }

    /// Width of one bin, in EV.
    #[inline]
    #[must_use]
    pub fn bin_width(&self) -> f32 {
        (self.max - self.min) / (HISTOGRAM_BINS - 1) as f32
    }
}

/// CPU-side log-luminance histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct LogHistogram {
    range: EvRange,
    bins: [u32; HISTOGRAM_BINS],
}

impl Default for LogHistogram {
    fn default() -> Self {
        Self::new(EvRange::default())
    }
}

impl LogHistogram {
    #[must_use]
    pub fn new(range: EvRange) -> Self {
        Self {
            range,
            bins: [0; HISTOGRAM_BINS],
        }
    }

    /// Builds a histogram from raw bin counts (e.g. a GPU read-back).
    #[must_use]
    pub fn from_bins(range: EvRange, bins: [u32; HISTOGRAM_BINS]) -> Self {
        Self { range, bins }
    }

    #[inline]
    #[must_use]
    pub fn range(&self) -> EvRange {
        self.range
    }

    #[inline]
    #[must_use]
    pub fn bins(&self) -> &[u32; HISTOGRAM_BINS] {
        &self.bins
    }

    pub fn clear(&mut self) {
        self.bins = [0; HISTOGRAM_BINS];
    }

    pub fn accumulate(&mut self, luminance: f32) {
        let bin = self.range.bin_for_luminance(luminance);
        self.bins[bin] = self.bins[bin].saturating_add(1);
    }

    pub fn accumulate_all<I: IntoIterator<Item = f32>>(&mut self, luminances: I) {
        for l in luminances {
            self.accumulate(l);
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|&c| u64::from(c)).sum()
    }

    /// Average linear luminance of the histogram with the darkest `low`
    /// fraction and the brightest `1 - high` fraction of the samples removed.
    ///
    /// Bins straddling a cut are split proportionally. Returns `0.0` for an
    /// empty histogram.
    #[must_use]
    pub fn filtered_average_luminance(&self, low: f32, high: f32) -> f32 {
        let sum = self.total() as f64;
        if sum == 0.0 {
            return 0.0;
        }

        // Remaining samples to discard from the dark end / keep before the bright cut.
        let mut dark_budget = sum * f64::from(low);
        let mut bright_budget = sum * f64::from(high);
        let mut weighted = 0.0_f64;
        let mut weight = 0.0_f64;

        for (i, &count) in self.bins.iter().enumerate() {
            let mut value = f64::from(count);

            let offset = dark_budget.min(value);
            value -= offset;
            dark_budget -= offset;
            bright_budget -= offset;

            value = bright_budget.min(value).max(0.0);
            bright_budget -= value;

            let luminance = f64::from(self.range.bin_ev(i).exp2());
            weighted += luminance * value;
            weight += value;
        }

        (weighted / weight.max(1e-4)) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bin_mapping_covers_range() {
        let r = EvRange::default();
        assert_eq!(r.bin_for_luminance(2f32.powf(-9.0)), 0);
        assert_eq!(r.bin_for_luminance(2f32.powf(9.0)), HISTOGRAM_BINS - 1);
        assert_eq!(r.bin_for_luminance(2f32.powf(20.0)), HISTOGRAM_BINS - 1);
        assert_eq!(r.bin_for_luminance(0.0), 0);
        assert_eq!(r.bin_for_luminance(f32::NAN), 0);
    }

    #[test]
    fn mid_range_luminance_lands_in_middle_bin() {
        let r = EvRange::default();
        // EV 0 → t = 0.5 → 63.5 → bin 63
        assert_eq!(r.bin_for_luminance(1.0), 63);
        assert!(r.bin_ev(63).abs() < 1e-5);
    }

    #[test]
    fn scale_offset_matches_range() {
        let so = EvRange::default().scale_offset();
        assert!((so.x - 1.0 / 18.0).abs() < 1e-6);
        assert!((so.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn empty_histogram_averages_to_zero() {
        let h = LogHistogram::default();
        assert_eq!(h.filtered_average_luminance(0.3, 0.95), 0.0);
    }

    #[test]
    fn percentile_filter_drops_outliers() {
        let r = EvRange::default();
        let mut h = LogHistogram::new(r);
        // 10% very dark, 80% mid, 10% very bright
        h.accumulate_all(std::iter::repeat_n(2f32.powf(-8.0), 10));
        h.accumulate_all(std::iter::repeat_n(1.0, 80));
        h.accumulate_all(std::iter::repeat_n(2f32.powf(8.0), 10));

        let avg = h.filtered_average_luminance(0.1, 0.9);
        let mid = r.bin_ev(r.bin_for_luminance(1.0)).exp2();
        assert!((avg - mid).abs() < 1e-4, "avg = {avg}, mid = {mid}");
    }
}
