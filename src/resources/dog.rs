//! Difference-of-Gaussians Configuration
//!
//! Stylization filter built from two separable gaussians of different
//! widths. This effect has no `enabled` flag: it is active whenever the
//! kernel size is overridden.
//!
//! | Pass | Source | Target |
//! |------|--------|--------|
//! | 0 | scene color | gaussian 1 (transient) |
//! | 1 | gaussian 1 | gaussian 2 (persistent) |
//! | 2 | scene color + gaussian 2 | destination |

use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::resources::EffectSettings;
use crate::resources::param::{ClampedParam, Param};

/// Difference-of-Gaussians configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifferenceOfGaussiansSettings {
    pub gaussian_kernel_size: ClampedParam<u32>,
    /// Standard deviation of the narrow gaussian.
    pub stdev: ClampedParam<f32>,
    /// Ratio between the wide and the narrow standard deviation.
    pub stdev_scale: ClampedParam<f32>,
    /// Weight of the wide gaussian.
    pub tau: ClampedParam<f32>,

    pub thresholding: Param<bool>,
    pub tanh: Param<bool>,
    /// Soft threshold steepness.
    pub phi: ClampedParam<f32>,
    pub threshold: ClampedParam<f32>,
    pub invert: Param<bool>,
}

impl Default for DifferenceOfGaussiansSettings {
    fn default() -> Self {
        Self {
            gaussian_kernel_size: ClampedParam::new(5, 1, 10),
            stdev: ClampedParam::new(2.0, 0.1, 5.0),
            stdev_scale: ClampedParam::new(1.6, 0.1, 5.0),
            tau: ClampedParam::new(1.0, 0.01, 5.0),
            thresholding: Param::new(true),
            tanh: Param::new(false),
            phi: ClampedParam::new(1.0, 0.01, 100.0),
            threshold: ClampedParam::new(0.005, -1.0, 1.0),
            invert: Param::new(false),
        }
    }
}

impl EffectSettings for DifferenceOfGaussiansSettings {
    fn is_active(&self) -> bool {
        self.gaussian_kernel_size.override_state
    }
}

impl DifferenceOfGaussiansSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the kernel size, which also activates the effect.
    pub fn set_kernel_size(&mut self, size: u32) {
        self.gaussian_kernel_size.set(size);
    }

    pub fn set_deviation(&mut self, stdev: f32, scale: f32) {
        self.stdev.set(stdev);
        self.stdev_scale.set(scale);
    }
}

/// Parameter block of the DoG material.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DifferenceOfGaussiansUniforms {
    pub texel_size: Vec4,
    pub kernel_size: u32,
    pub sigma: f32,
    pub k: f32,
    pub tau: f32,
    pub phi: f32,
    pub threshold: f32,
    pub thresholding: u32,
    pub invert: u32,
    pub tanh: u32,
    pub(crate) __pad: [u32; 3],
}

impl DifferenceOfGaussiansUniforms {
    #[must_use]
    pub fn new(settings: &DifferenceOfGaussiansSettings, texel_size: Vec4) -> Self {
        Self {
            texel_size,
            kernel_size: settings.gaussian_kernel_size.value(),
            sigma: settings.stdev.value(),
            k: settings.stdev_scale.value(),
            tau: settings.tau.value(),
            phi: settings.phi.value(),
            threshold: settings.threshold.value(),
            thresholding: u32::from(settings.thresholding.value),
            invert: u32::from(settings.invert.value),
            tanh: u32::from(settings.tanh.value),
            __pad: [0; 3],
        }
    }
}
