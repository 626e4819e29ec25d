//! Effect Parameters
//!
//! Every user-tunable value of an effect is wrapped in a parameter type that
//! carries an `override_state` flag next to its value. The external
//! configuration system resolves layered defaults into one snapshot per view
//! and frame; a parameter whose `override_state` is `false` is still at the
//! layered default.
//!
//! Bounded parameters keep their declared range and clamp on every read, so a
//! value supplied out of range is never observed by an effect.
//!
//! | Type | Bound | Read |
//! |------|-------|------|
//! | [`Param<T>`] | none | `value` |
//! | [`ClampedParam<T>`] | `[min, max]` | [`value()`](ClampedParam::value) |
//! | [`MinParam`] | `[min, ∞)` | [`value()`](MinParam::value) |
//! | [`RangeParam`] | `min <= x, y <= max` | [`value()`](RangeParam::value) |

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// An unbounded parameter (flags, enums, free floats).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Param<T> {
    pub value: T,
    #[serde(default)]
    pub override_state: bool,
}

impl<T: Copy> Param<T> {
    /// Creates a parameter at its layered default (not overridden).
    #[inline]
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self {
            value,
            override_state: false,
        }
    }

    /// Creates an overridden parameter.
    #[inline]
    #[must_use]
    pub const fn overridden(value: T) -> Self {
        Self {
            value,
            override_state: true,
        }
    }

    /// Sets the value and marks the parameter as overridden.
    #[inline]
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.override_state = true;
    }
}

/// A parameter clamped to an inclusive range on read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClampedParam<T> {
    value: T,
    #[serde(default)]
    pub override_state: bool,
    min: T,
    max: T,
}

impl<T: Copy + PartialOrd> ClampedParam<T> {
    #[must_use]
    pub fn new(value: T, min: T, max: T) -> Self {
        debug_assert!(min <= max, "ClampedParam range is inverted");
        Self {
            value,
            override_state: false,
            min,
            max,
        }
    }

    /// The value clamped to `[min, max]`. Unordered values (NaN) read as
    /// `min`.
    #[inline]
    #[must_use]
    pub fn value(&self) -> T {
        match (
            self.value.partial_cmp(&self.min),
            self.value.partial_cmp(&self.max),
        ) {
            (None | Some(Ordering::Less), _) | (_, None) => self.min,
            (_, Some(Ordering::Greater)) => self.max,
            _ => self.value,
        }
    }

    /// The stored value, possibly outside the declared range.
    #[inline]
    #[must_use]
    pub fn raw(&self) -> T {
        self.value
    }

    #[inline]
    #[must_use]
    pub fn range(&self) -> (T, T) {
        (self.min, self.max)
    }

    /// Sets the value and marks the parameter as overridden.
    ///
    /// The value is stored as given; clamping happens on read.
    #[inline]
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.override_state = true;
    }
}

/// A float parameter bounded from below only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinParam {
    value: f32,
    #[serde(default)]
    pub override_state: bool,
    min: f32,
}

impl MinParam {
    #[must_use]
    pub const fn new(value: f32, min: f32) -> Self {
        Self {
            value,
            override_state: false,
            min,
        }
    }

    /// The value, raised to `min` if below it. NaN reads as `min`.
    #[inline]
    #[must_use]
    pub fn value(&self) -> f32 {
        self.value.max(self.min)
    }

    #[inline]
    #[must_use]
    pub fn min(&self) -> f32 {
        self.min
    }

    #[inline]
    pub fn set(&mut self, value: f32) {
        self.value = value;
        self.override_state = true;
    }
}

/// A two-component float range whose components are clamped into bounds.
///
/// The components are clamped independently; ordering between `x` and `y`
/// is the consumer's concern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeParam {
    value: [f32; 2],
    #[serde(default)]
    pub override_state: bool,
    min: f32,
    max: f32,
}

impl RangeParam {
    #[must_use]
    pub fn new(x: f32, y: f32, min: f32, max: f32) -> Self {
        debug_assert!(min <= max, "RangeParam bounds are inverted");
        Self {
            value: [x, y],
            override_state: false,
            min,
            max,
        }
    }

    /// Both components clamped into bounds. NaN reads as `min`.
    #[inline]
    #[must_use]
    pub fn value(&self) -> (f32, f32) {
        let clamp = |v: f32| {
            if v.is_nan() {
                self.min
            } else {
                v.clamp(self.min, self.max)
            }
        };
        (clamp(self.value[0]), clamp(self.value[1]))
    }

    #[inline]
    #[must_use]
    pub fn bounds(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    #[inline]
    pub fn set(&mut self, x: f32, y: f32) {
        self.value = [x, y];
        self.override_state = true;
    }
}
