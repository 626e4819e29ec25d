//! Edge Detection Configuration
//!
//! Depth/normal discontinuity outlines. One blit from the scene color into
//! the destination, reading the depth (and normals, when supplied).

use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::resources::EffectSettings;
use crate::resources::param::{ClampedParam, Param};

/// Edge detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeDetectionSettings {
    pub enabled: Param<bool>,
    /// Depth difference treated as an edge.
    pub depth_epsilon: Param<f32>,
    /// Normal difference treated as an edge.
    pub normal_epsilon: Param<f32>,
    /// Kernel variant selector, forwarded as is.
    pub version: Param<f32>,
    /// Normalized distance over which edges fade out.
    pub depth_fade_distance: ClampedParam<f32>,
}

impl Default for EdgeDetectionSettings {
    fn default() -> Self {
        Self {
            enabled: Param::new(true),
            depth_epsilon: Param::new(0.1),
            normal_epsilon: Param::new(0.1),
            version: Param::new(0.0),
            depth_fade_distance: ClampedParam::new(0.3, 0.0, 1.0),
        }
    }
}

impl EffectSettings for EdgeDetectionSettings {
    fn is_active(&self) -> bool {
        self.enabled.override_state && self.enabled.value
    }
}

impl EdgeDetectionSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_epsilons(&mut self, depth: f32, normal: f32) {
        self.depth_epsilon.set(depth);
        self.normal_epsilon.set(normal);
    }

    pub fn set_depth_fade_distance(&mut self, distance: f32) {
        self.depth_fade_distance.set(distance);
    }
}

/// Parameter block of the edge detection material.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct EdgeDetectionUniforms {
    /// `(1/w, 1/h, w, h)`
    pub texel_size: Vec4,
    /// `(near, far, 0, 0)`
    pub clip_planes: Vec4,
    pub depth_epsilon: f32,
    pub normal_epsilon: f32,
    pub version: f32,
    pub depth_fade_distance: f32,
}

impl EdgeDetectionUniforms {
    #[must_use]
    pub fn new(settings: &EdgeDetectionSettings, texel_size: Vec4, near: f32, far: f32) -> Self {
        Self {
            texel_size,
            clip_planes: Vec4::new(near, far, 0.0, 0.0),
            depth_epsilon: settings.depth_epsilon.value,
            normal_epsilon: settings.normal_epsilon.value,
            version: settings.version.value,
            depth_fade_distance: settings.depth_fade_distance.value(),
        }
    }
}
