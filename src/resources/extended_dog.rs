//! Extended Difference-of-Gaussians Configuration
//!
//! Flow-based XDoG stylization. The image is converted to Lab, optionally
//! aligned to its edge tangent flow (a smoothed structure tensor), filtered
//! with two gaussians whose difference is thresholded, optionally
//! anti-aliased along the flow, and finally blended over the scene color
//! (plain, interpolated, cross-hatched or colored pencil).
//!
//! All intermediates run at `super_sample` times the source resolution.
//!
//! | Switch | Passes it adds |
//! |--------|----------------|
//! | `use_flow` or `smooth_edges` | structure tensor, two TFM blurs |
//! | `use_flow` | flow-aligned blurs instead of the isotropic ones |
//! | `smooth_edges` | anti-aliasing instead of a plain copy |

use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::resources::EffectSettings;
use crate::resources::param::{ClampedParam, Param};

/// How the difference of gaussians is turned into a line term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ThresholdMode {
    #[default]
    NoThreshold,
    Tanh,
    Quantization,
    SmoothQuantization,
}

/// How the line term is combined with the scene color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DogBlendMode {
    #[default]
    NoBlend,
    Interpolate,
    TwoPointInterpolate,
}

/// One cross-hatching layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HatchLayer {
    pub enabled: Param<bool>,
    /// Threshold below which this layer is drawn.
    pub white_point: ClampedParam<f32>,
    pub resolution: ClampedParam<f32>,
    /// Degrees.
    pub rotation: ClampedParam<f32>,
}

impl HatchLayer {
    fn new(white_point: f32, rotation: f32) -> Self {
        Self {
            enabled: Param::new(true),
            white_point: ClampedParam::new(white_point, 0.0, 100.0),
            resolution: ClampedParam::new(1.0, 0.0, 8.0),
            rotation: ClampedParam::new(rotation, -180.0, 180.0),
        }
    }
}

/// Extended Difference-of-Gaussians configuration.
///
/// # Usage
///
/// ```rust,ignore
/// let mut xdog = ExtendedDogSettings::default();
/// xdog.enabled.set(true);
/// xdog.set_threshold_mode(ThresholdMode::Tanh);
/// xdog.set_hatching(Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendedDogSettings {
    pub enabled: Param<bool>,
    /// Resolution multiplier of every intermediate.
    pub super_sample: ClampedParam<u32>,

    // Edge tangent flow
    pub use_flow: Param<bool>,
    pub structure_tensor_deviation: ClampedParam<f32>,
    pub line_integral_deviation: ClampedParam<f32>,
    pub line_convolution_step_sizes: Param<[f32; 2]>,
    pub calc_diff_before_convolution: Param<bool>,

    // Difference of gaussians
    pub dog_deviation: ClampedParam<f32>,
    pub stdev_scale: ClampedParam<f32>,
    pub sharpness: ClampedParam<f32>,

    // Threshold
    pub threshold_mode: Param<ThresholdMode>,
    pub quantizer_step: ClampedParam<u32>,
    pub white_point: ClampedParam<f32>,
    pub soft_threshold: ClampedParam<f32>,
    pub invert: Param<bool>,

    // Anti-aliasing
    pub smooth_edges: Param<bool>,
    pub edge_smooth_deviation: ClampedParam<f32>,
    pub edge_smooth_step_sizes: Param<[f32; 2]>,

    // Cross hatching
    pub enable_hatching: Param<bool>,
    /// Imported hatch texture slot.
    pub hatch_texture: Param<Option<u32>>,
    /// The first layer is always drawn; its `enabled` flag is ignored.
    pub hatch_layers: [HatchLayer; 4],
    pub enable_colored_pencil: Param<bool>,
    pub brightness_offset: ClampedParam<f32>,
    pub saturation: ClampedParam<f32>,

    // Blend
    pub term_strength: ClampedParam<f32>,
    pub blend_mode: Param<DogBlendMode>,
    pub min_color: Param<[f32; 4]>,
    pub max_color: Param<[f32; 4]>,
    pub blend_strength: ClampedParam<f32>,
}

impl Default for ExtendedDogSettings {
    fn default() -> Self {
        Self {
            enabled: Param::new(true),
            super_sample: ClampedParam::new(1, 1, 4),

            use_flow: Param::new(true),
            structure_tensor_deviation: ClampedParam::new(2.0, 0.0, 5.0),
            line_integral_deviation: ClampedParam::new(2.0, 0.0, 20.0),
            line_convolution_step_sizes: Param::new([1.0, 1.0]),
            calc_diff_before_convolution: Param::new(true),

            dog_deviation: ClampedParam::new(2.0, 0.0, 10.0),
            stdev_scale: ClampedParam::new(1.6, 0.1, 5.0),
            sharpness: ClampedParam::new(1.0, 0.0, 100.0),

            threshold_mode: Param::new(ThresholdMode::NoThreshold),
            quantizer_step: ClampedParam::new(2, 1, 16),
            white_point: ClampedParam::new(50.0, 0.0, 100.0),
            soft_threshold: ClampedParam::new(1.0, 0.0, 10.0),
            invert: Param::new(false),

            smooth_edges: Param::new(true),
            edge_smooth_deviation: ClampedParam::new(1.0, 0.0, 10.0),
            edge_smooth_step_sizes: Param::new([1.0, 1.0]),

            enable_hatching: Param::new(false),
            hatch_texture: Param::new(None),
            hatch_layers: [
                HatchLayer::new(50.0, 90.0),
                HatchLayer::new(20.0, 60.0),
                HatchLayer::new(30.0, 120.0),
                HatchLayer::new(30.0, 120.0),
            ],
            enable_colored_pencil: Param::new(false),
            brightness_offset: ClampedParam::new(0.0, -1.0, 1.0),
            saturation: ClampedParam::new(1.0, 0.0, 5.0),

            term_strength: ClampedParam::new(1.0, 0.0, 5.0),
            blend_mode: Param::new(DogBlendMode::NoBlend),
            min_color: Param::new([0.0, 0.0, 0.0, 1.0]),
            max_color: Param::new([1.0, 1.0, 1.0, 1.0]),
            blend_strength: ClampedParam::new(1.0, 0.0, 2.0),
        }
    }
}

impl EffectSettings for ExtendedDogSettings {
    fn is_active(&self) -> bool {
        self.enabled.override_state && self.enabled.value
    }
}

impl ExtendedDogSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_super_sample(&mut self, factor: u32) {
        self.super_sample.set(factor);
    }

    pub fn set_flow(&mut self, use_flow: bool, smooth_edges: bool) {
        self.use_flow.set(use_flow);
        self.smooth_edges.set(smooth_edges);
    }

    pub fn set_threshold_mode(&mut self, mode: ThresholdMode) {
        self.threshold_mode.set(mode);
    }

    /// Enables cross hatching with the given imported texture slot, or
    /// disables it with `None`.
    pub fn set_hatching(&mut self, texture: Option<u32>) {
        self.enable_hatching.set(texture.is_some());
        self.hatch_texture.set(texture);
    }

    /// Whether the structure tensor and its blurred eigenvectors are needed.
    #[inline]
    #[must_use]
    pub fn needs_flow_field(&self) -> bool {
        self.use_flow.value || self.smooth_edges.value
    }

    /// Size of the intermediates for a `width` × `height` source.
    #[must_use]
    pub fn super_sampled_size(&self, width: u32, height: u32) -> (u32, u32) {
        let factor = self.super_sample.value();
        (width * factor, height * factor)
    }
}

/// Parameter block of the extended DoG material.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ExtendedDogUniforms {
    /// `(1/w, 1/h, w, h)` of the source.
    pub texel_size: Vec4,
    /// Structure tensor, DoG, line integral and anti-aliasing deviations.
    pub sigmas: Vec4,
    /// `(stdev_scale, sharpness, soft_threshold, white_point)`
    pub dog: Vec4,
    /// White points of hatch layers 2-4, then the quantizer step count.
    pub thresholds: Vec4,
    pub hatch_rotations: Vec4,
    pub hatch_resolutions: Vec4,
    /// Line convolution steps in `xy`, edge smoothing steps in `zw`.
    pub step_sizes: Vec4,
    pub min_color: Vec4,
    pub max_color: Vec4,
    /// `(blend_strength, term_strength, brightness_offset, saturation)`
    pub strengths: Vec4,

    pub thresholding: u32,
    pub blend_mode: u32,
    pub invert: u32,
    pub calc_diff_before_convolution: u32,

    pub hatching: u32,
    pub second_layer: u32,
    pub third_layer: u32,
    pub fourth_layer: u32,

    pub colored_pencil: u32,
    pub(crate) __pad: [u32; 3],
}

impl ExtendedDogUniforms {
    #[must_use]
    pub fn new(settings: &ExtendedDogSettings, texel_size: Vec4) -> Self {
        let layers = &settings.hatch_layers;
        let line = settings.line_convolution_step_sizes.value;
        let smooth = settings.edge_smooth_step_sizes.value;

        Self {
            texel_size,
            sigmas: Vec4::new(
                settings.structure_tensor_deviation.value(),
                settings.dog_deviation.value(),
                settings.line_integral_deviation.value(),
                settings.edge_smooth_deviation.value(),
            ),
            dog: Vec4::new(
                settings.stdev_scale.value(),
                settings.sharpness.value(),
                settings.soft_threshold.value(),
                settings.white_point.value(),
            ),
            thresholds: Vec4::new(
                layers[1].white_point.value(),
                layers[2].white_point.value(),
                layers[3].white_point.value(),
                settings.quantizer_step.value() as f32,
            ),
            hatch_rotations: Vec4::from_array(layers.map(|l| l.rotation.value())),
            hatch_resolutions: Vec4::from_array(layers.map(|l| l.resolution.value())),
            step_sizes: Vec4::new(line[0], line[1], smooth[0], smooth[1]),
            min_color: Vec4::from_array(settings.min_color.value),
            max_color: Vec4::from_array(settings.max_color.value),
            strengths: Vec4::new(
                settings.blend_strength.value(),
                settings.term_strength.value(),
                settings.brightness_offset.value(),
                settings.saturation.value(),
            ),

            thresholding: settings.threshold_mode.value as u32,
            blend_mode: settings.blend_mode.value as u32,
            invert: u32::from(settings.invert.value),
            calc_diff_before_convolution: u32::from(settings.calc_diff_before_convolution.value),

            hatching: u32::from(settings.enable_hatching.value),
            second_layer: u32::from(layers[1].enabled.value),
            third_layer: u32::from(layers[2].enabled.value),
            fourth_layer: u32::from(layers[3].enabled.value),

            colored_pencil: u32::from(settings.enable_colored_pencil.value),
            __pad: [0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_until_enabled_is_overridden() {
        let mut s = ExtendedDogSettings::default();
        assert!(!s.is_active());
        s.set_flow(false, false);
        assert!(!s.is_active());
        s.enabled.set(true);
        assert!(s.is_active());
    }

    #[test]
    fn flow_field_follows_either_switch() {
        let mut s = ExtendedDogSettings::default();
        for (flow, smooth, needed) in [
            (true, true, true),
            (true, false, true),
            (false, true, true),
            (false, false, false),
        ] {
            s.set_flow(flow, smooth);
            assert_eq!(s.needs_flow_field(), needed, "{flow} {smooth}");
        }
    }

    #[test]
    fn super_sample_is_clamped() {
        let mut s = ExtendedDogSettings::default();
        s.set_super_sample(9);
        assert_eq!(s.super_sampled_size(100, 50), (400, 200));
        s.set_super_sample(0);
        assert_eq!(s.super_sampled_size(100, 50), (100, 50));
    }

    #[test]
    fn uniforms_pack_layers_and_modes() {
        let mut s = ExtendedDogSettings::default();
        s.set_threshold_mode(ThresholdMode::SmoothQuantization);
        s.blend_mode.set(DogBlendMode::TwoPointInterpolate);
        s.hatch_layers[2].enabled.set(false);
        s.quantizer_step.set(40);

        let u = ExtendedDogUniforms::new(&s, Vec4::ONE);
        assert_eq!(u.thresholding, 3);
        assert_eq!(u.blend_mode, 2);
        assert_eq!(u.third_layer, 0);
        assert_eq!(u.second_layer, 1);
        assert_eq!(u.thresholds.w, 16.0);
        assert_eq!(u.hatch_rotations, Vec4::new(90.0, 60.0, 120.0, 120.0));
    }
}
