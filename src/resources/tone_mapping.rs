//! Tone Mapping Configuration
//!
//! Operator selection and curve parameters for the tone mapping blit. The
//! operator's discriminant is the material pass index; every curve
//! parameter is uploaded every frame so switching operators never needs a
//! rebuild.
//!
//! The [`Custom`](ToneMapper::Custom) operator grades through an imported 3D
//! LUT. Selecting it without a LUT skips the effect for the frame.

use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::resources::EffectSettings;
use crate::resources::param::{ClampedParam, Param};

/// Tone mapping operator selection.
///
/// - [`RgbClamp`](ToneMapper::RgbClamp): Plain saturate, for debugging
/// - [`TumblinRushmeier`](ToneMapper::TumblinRushmeier): Perceptual brightness matching
/// - [`Reinhard`](ToneMapper::Reinhard) / [`ReinhardExtended`](ToneMapper::ReinhardExtended): Classic soft rolloff
/// - [`Hable`](ToneMapper::Hable): Filmic curve with toe and shoulder
/// - [`Uchimura`](ToneMapper::Uchimura): Linear mid section with shaped toe
/// - [`NarkowiczAces`](ToneMapper::NarkowiczAces) / [`HillAces`](ToneMapper::HillAces): ACES fits
/// - [`Custom`](ToneMapper::Custom): 3D LUT grading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToneMapper {
    #[default]
    RgbClamp,
    TumblinRushmeier,
    Schlick,
    Ward,
    Reinhard,
    ReinhardExtended,
    Hable,
    Uchimura,
    NarkowiczAces,
    HillAces,
    Custom,
}

impl ToneMapper {
    /// Material pass index implementing this operator.
    #[inline]
    #[must_use]
    pub const fn pass_index(self) -> u32 {
        self as u32
    }

    /// Returns a human-readable name for the operator.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RgbClamp => "RGB Clamp",
            Self::TumblinRushmeier => "Tumblin Rushmeier",
            Self::Schlick => "Schlick",
            Self::Ward => "Ward",
            Self::Reinhard => "Reinhard",
            Self::ReinhardExtended => "Reinhard Extended",
            Self::Hable => "Hable",
            Self::Uchimura => "Uchimura",
            Self::NarkowiczAces => "Narkowicz ACES",
            Self::HillAces => "Hill ACES",
            Self::Custom => "Custom LUT",
        }
    }

    /// Returns all available operators.
    #[must_use]
    pub fn all() -> &'static [ToneMapper] {
        &[
            Self::RgbClamp,
            Self::TumblinRushmeier,
            Self::Schlick,
            Self::Ward,
            Self::Reinhard,
            Self::ReinhardExtended,
            Self::Hable,
            Self::Uchimura,
            Self::NarkowiczAces,
            Self::HillAces,
            Self::Custom,
        ]
    }
}

/// A 3D LUT imported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LutTexture {
    /// Imported texture slot.
    pub texture: u32,
    /// Edge length of the cube.
    pub size: u32,
}

/// Tone mapping configuration.
///
/// # Usage
///
/// ```rust,ignore
/// let mut tm = ToneMappingSettings::default();
/// tm.enabled.set(true);
/// tm.set_tone_mapper(ToneMapper::Hable);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneMappingSettings {
    pub enabled: Param<bool>,
    pub tone_mapper: Param<ToneMapper>,

    // === Tumblin Rushmeier ===
    /// Maximum display luminance.
    pub ld_max: ClampedParam<f32>,
    /// Maximum contrast.
    pub c_max: ClampedParam<f32>,

    // === Schlick ===
    pub p: ClampedParam<f32>,
    pub hi_val: ClampedParam<f32>,

    // === Reinhard Extended ===
    pub white_point: ClampedParam<f32>,

    // === Hable ===
    pub shoulder_strength: ClampedParam<f32>,
    pub linear_strength: ClampedParam<f32>,
    pub linear_angle: ClampedParam<f32>,
    pub toe_strength: ClampedParam<f32>,
    pub toe_numerator: ClampedParam<f32>,
    pub toe_denominator: ClampedParam<f32>,
    pub linear_white_point: ClampedParam<f32>,

    // === Uchimura ===
    pub max_brightness: ClampedParam<f32>,
    pub contrast: ClampedParam<f32>,
    pub linear_start: ClampedParam<f32>,
    pub linear_length: ClampedParam<f32>,
    pub black_tightness_shape: ClampedParam<f32>,
    pub black_tightness_offset: ClampedParam<f32>,

    // === Custom ===
    pub lut: Param<Option<LutTexture>>,
    pub post_exposure: Param<f32>,
}

impl Default for ToneMappingSettings {
    fn default() -> Self {
        Self {
            enabled: Param::new(true),
            tone_mapper: Param::new(ToneMapper::RgbClamp),
            ld_max: ClampedParam::new(100.0, 0.01, 200.0),
            c_max: ClampedParam::new(50.0, 0.01, 100.0),
            p: ClampedParam::new(1.0, 1.0, 100.0),
            hi_val: ClampedParam::new(1.0, 1.0, 150.0),
            white_point: ClampedParam::new(2.0, 1.0, 50.0),
            shoulder_strength: ClampedParam::new(0.15, 0.0, 1.0),
            linear_strength: ClampedParam::new(0.5, 0.0, 1.0),
            linear_angle: ClampedParam::new(0.1, 0.0, 1.0),
            toe_strength: ClampedParam::new(0.2, 0.0, 1.0),
            toe_numerator: ClampedParam::new(0.02, 0.0, 1.0),
            toe_denominator: ClampedParam::new(0.3, 0.0, 1.0),
            linear_white_point: ClampedParam::new(12.0, 0.0, 50.0),
            max_brightness: ClampedParam::new(1.0, 1.0, 100.0),
            contrast: ClampedParam::new(1.0, 0.0, 5.0),
            linear_start: ClampedParam::new(0.22, 0.0, 1.0),
            linear_length: ClampedParam::new(0.4, 0.01, 0.99),
            black_tightness_shape: ClampedParam::new(1.33, 1.0, 3.0),
            black_tightness_offset: ClampedParam::new(0.0, 0.0, 1.0),
            lut: Param::new(None),
            post_exposure: Param::new(1.0),
        }
    }
}

impl EffectSettings for ToneMappingSettings {
    fn is_active(&self) -> bool {
        self.enabled.override_state && self.enabled.value
    }
}

impl ToneMappingSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tone_mapper(&mut self, mapper: ToneMapper) {
        self.tone_mapper.set(mapper);
    }

    /// Selects the custom operator grading through `lut`.
    pub fn set_lut(&mut self, lut: LutTexture, post_exposure: f32) {
        self.tone_mapper.set(ToneMapper::Custom);
        self.lut.set(Some(lut));
        self.post_exposure.set(post_exposure);
    }

    /// The LUT the current operator reads, if it reads one.
    #[must_use]
    pub fn active_lut(&self) -> Option<LutTexture> {
        match self.tone_mapper.value {
            ToneMapper::Custom => self.lut.value,
            _ => None,
        }
    }
}

/// Parameter block of the tone mapping material.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ToneMappingUniforms {
    /// `(1/size, size - 1, post_exposure, 1)`; zero without a LUT.
    pub lut_params: Vec4,

    pub ld_max: f32,
    pub c_max: f32,
    pub p: f32,
    pub hi_val: f32,

    pub white_point: f32,
    pub shoulder_strength: f32,
    pub linear_strength: f32,
    pub linear_angle: f32,

    pub toe_strength: f32,
    pub toe_numerator: f32,
    pub toe_denominator: f32,
    pub linear_white_point: f32,

    pub max_brightness: f32,
    pub contrast: f32,
    pub linear_start: f32,
    pub linear_length: f32,

    pub black_tightness_shape: f32,
    pub black_tightness_offset: f32,
    pub(crate) __pad: [f32; 2],
}

impl ToneMappingUniforms {
    #[must_use]
    pub fn new(settings: &ToneMappingSettings) -> Self {
        let lut_params = settings.active_lut().map_or(Vec4::ZERO, |lut| {
            let size = lut.size.max(1) as f32;
            Vec4::new(1.0 / size, size - 1.0, settings.post_exposure.value, 1.0)
        });

        Self {
            lut_params,
            ld_max: settings.ld_max.value(),
            c_max: settings.c_max.value(),
            p: settings.p.value(),
            hi_val: settings.hi_val.value(),
            white_point: settings.white_point.value(),
            shoulder_strength: settings.shoulder_strength.value(),
            linear_strength: settings.linear_strength.value(),
            linear_angle: settings.linear_angle.value(),
            toe_strength: settings.toe_strength.value(),
            toe_numerator: settings.toe_numerator.value(),
            toe_denominator: settings.toe_denominator.value(),
            linear_white_point: settings.linear_white_point.value(),
            max_brightness: settings.max_brightness.value(),
            contrast: settings.contrast.value(),
            linear_start: settings.linear_start.value(),
            linear_length: settings.linear_length.value(),
            black_tightness_shape: settings.black_tightness_shape.value(),
            black_tightness_offset: settings.black_tightness_offset.value(),
            __pad: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_index_follows_declaration_order() {
        assert_eq!(ToneMapper::RgbClamp.pass_index(), 0);
        assert_eq!(ToneMapper::Hable.pass_index(), 6);
        assert_eq!(ToneMapper::Custom.pass_index(), 10);
        assert_eq!(ToneMapper::all().len(), 11);
    }

    #[test]
    fn lut_params_only_for_custom() {
        let mut s = ToneMappingSettings::default();
        s.lut.set(Some(LutTexture {
            texture: 0,
            size: 32,
        }));
        assert_eq!(ToneMappingUniforms::new(&s).lut_params, Vec4::ZERO);

        s.set_tone_mapper(ToneMapper::Custom);
        let u = ToneMappingUniforms::new(&s);
        assert!((u.lut_params.x - 1.0 / 32.0).abs() < 1e-7);
        assert_eq!(u.lut_params.y, 31.0);
    }

    #[test]
    fn curve_parameters_are_clamped() {
        let mut s = ToneMappingSettings::default();
        s.linear_length.set(5.0);
        s.ld_max.set(-1.0);
        let u = ToneMappingUniforms::new(&s);
        assert_eq!(u.linear_length, 0.99);
        assert_eq!(u.ld_max, 0.01);
    }
}
