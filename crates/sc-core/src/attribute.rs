//! Time-sampled attribute values

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::time::TimeCode;

/// Values that can be linearly interpolated between time samples
pub trait Interpolate: Copy {
    fn lerp(a: Self, b: Self, t: f64) -> Self;
}

impl Interpolate for f64 {
    fn lerp(a: Self, b: Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Interpolate for DVec3 {
    fn lerp(a: Self, b: Self, t: f64) -> Self {
        a.lerp(b, t)
    }
}

/// An attribute with an optional default value and sorted time samples.
///
/// Reads at [`TimeCode::Default`] return the default value. Reads at a frame
/// interpolate linearly between the bracketing samples and hold the first or
/// last sample outside the sampled range. An attribute without samples
/// returns its default value at every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute<T> {
    default: Option<T>,
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    samples: Vec<(f64, T)>,
}

impl<T> Default for Attribute<T> {
    fn default() -> Self {
        Self {
            default: None,
            samples: Vec::new(),
        }
    }
}

impl<T: Interpolate> Attribute<T> {
    /// Create an attribute with an authored default value
    pub fn with_default(value: T) -> Self {
        Self {
            default: Some(value),
            samples: Vec::new(),
        }
    }

    pub fn has_time_samples(&self) -> bool {
        !self.samples.is_empty()
    }

    pub fn time_samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|(t, _)| *t)
    }

    pub fn is_authored(&self) -> bool {
        self.default.is_some() || !self.samples.is_empty()
    }

    /// Resolve the value at `time`. Non-finite frames read the default.
    pub fn get(&self, time: TimeCode) -> Option<T> {
        let frame = match time.finite() {
            TimeCode::Default => return self.default,
            TimeCode::Frame(frame) => frame,
        };
        let (first, last) = match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return self.default,
        };
        if frame <= first.0 {
            return Some(first.1);
        }
        if frame >= last.0 {
            return Some(last.1);
        }
        let upper = self.samples.partition_point(|(t, _)| *t <= frame);
        let (t0, v0) = self.samples[upper - 1];
        let (t1, v1) = self.samples[upper];
        if t1 == t0 {
            return Some(v0);
        }
        Some(T::lerp(v0, v1, (frame - t0) / (t1 - t0)))
    }

    /// Value authored exactly at `time`, without interpolation
    pub fn authored_at(&self, time: TimeCode) -> Option<T> {
        match time.finite() {
            TimeCode::Default => self.default,
            TimeCode::Frame(frame) => self
                .samples
                .iter()
                .find(|(t, _)| *t == frame)
                .map(|(_, v)| *v),
        }
    }

    /// Author `value` at `time`, inserting a sample if needed.
    /// Non-finite frames write the default.
    pub fn set(&mut self, value: T, time: TimeCode) {
        match time.finite() {
            TimeCode::Default => self.default = Some(value),
            TimeCode::Frame(frame) => {
                let idx = self.samples.partition_point(|(t, _)| *t < frame);
                match self.samples.get_mut(idx) {
                    Some(sample) if sample.0 == frame => sample.1 = value,
                    _ => self.samples.insert(idx, (frame, value)),
                }
            }
        }
    }

    /// Remove the opinion authored exactly at `time`
    pub fn clear(&mut self, time: TimeCode) {
        match time.finite() {
            TimeCode::Default => self.default = None,
            TimeCode::Frame(frame) => self.samples.retain(|(t, _)| *t != frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_only() {
        let attr = Attribute::with_default(2.0_f64);
        assert_eq!(attr.get(TimeCode::Default), Some(2.0));
        assert_eq!(attr.get(TimeCode::Frame(10.0)), Some(2.0));
        assert!(!attr.has_time_samples());
    }

    #[test]
    fn test_interpolates_and_holds() {
        let mut attr = Attribute::<f64>::default();
        attr.set(0.0, TimeCode::Frame(0.0));
        attr.set(10.0, TimeCode::Frame(10.0));
        attr.set(5.0, TimeCode::Frame(5.0));

        assert_eq!(attr.time_samples().collect::<Vec<_>>(), vec![0.0, 5.0, 10.0]);
        assert_eq!(attr.get(TimeCode::Frame(2.5)), Some(2.5));
        assert_eq!(attr.get(TimeCode::Frame(-4.0)), Some(0.0));
        assert_eq!(attr.get(TimeCode::Frame(40.0)), Some(10.0));
        // No default authored
        assert_eq!(attr.get(TimeCode::Default), None);
    }

    #[test]
    fn test_set_overwrites_existing_sample() {
        let mut attr = Attribute::<f64>::default();
        attr.set(1.0, TimeCode::Frame(3.0));
        attr.set(7.0, TimeCode::Frame(3.0));
        assert_eq!(attr.time_samples().count(), 1);
        assert_eq!(attr.authored_at(TimeCode::Frame(3.0)), Some(7.0));

        attr.clear(TimeCode::Frame(3.0));
        assert!(!attr.is_authored());
    }

    #[test]
    fn test_non_finite_frames_use_default() {
        let mut attr = Attribute::with_default(1.0_f64);
        attr.set(0.0, TimeCode::Frame(0.0));
        attr.set(10.0, TimeCode::Frame(10.0));

        assert_eq!(attr.get(TimeCode::Frame(f64::NAN)), Some(1.0));
        assert_eq!(attr.get(TimeCode::Frame(f64::INFINITY)), Some(1.0));

        attr.set(4.0, TimeCode::Frame(f64::NAN));
        assert_eq!(attr.time_samples().collect::<Vec<_>>(), vec![0.0, 10.0]);
        assert_eq!(attr.get(TimeCode::Default), Some(4.0));
        assert_eq!(attr.get(TimeCode::Frame(5.0)), Some(5.0));
    }
}
