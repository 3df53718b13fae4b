//! Analog deadzone with rescaling.
//!
//! Values inside the band read as zero; values outside are stretched back over
//! the full `0..=1` range so the stick does not jump from 0 to `d` when it
//! leaves the band.

use serde::{Deserialize, Serialize};

/// Largest accepted deadzone
pub const MAX_DEADZONE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Deadzone(f32);

impl Deadzone {
    /// Clamps `value` into `0.0..=0.5`; non-finite input becomes `0.0`
    pub fn new(value: f32) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, MAX_DEADZONE))
        } else {
            Self(0.0)
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn apply(self, value: f32) -> f32 {
        apply_deadzone(value, self.0)
    }
}

impl Default for Deadzone {
    fn default() -> Self {
        Self(0.15)
    }
}

/// `0` inside the band, `sign(v) * (|v| - d) / (1 - d)` outside it
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    // Some drivers overshoot slightly past full deflection
    let value = value.clamp(-1.0, 1.0);
    if value.abs() < deadzone {
        0.0
    } else {
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn values_inside_band_are_exactly_zero() {
        let dz = Deadzone::new(0.15);
        for i in 0..150 {
            let v = i as f32 / 1000.0;
            assert_eq!(dz.apply(v), 0.0, "v = {v}");
            assert_eq!(dz.apply(-v), 0.0, "v = -{v}");
        }
    }

    #[test]
    fn reference_points_at_point_fifteen() {
        let dz = Deadzone::new(0.15);
        assert_eq!(dz.apply(0.10), 0.0);
        assert!((dz.apply(0.50) - 0.4118).abs() < EPS);
        assert!((dz.apply(-0.50) + 0.4118).abs() < EPS);
    }

    #[test]
    fn full_deflection_maps_to_exactly_one() {
        for d in [0.0, 0.05, 0.15, 0.3, 0.5] {
            assert_eq!(apply_deadzone(1.0, d), 1.0);
            assert_eq!(apply_deadzone(-1.0, d), -1.0);
        }
    }

    #[test]
    fn output_is_monotonic_and_continuous_outside_band() {
        let d = 0.2;
        let mut previous = apply_deadzone(d, d);
        assert!(previous.abs() < EPS, "output starts at zero at the band edge");

        let steps = 1000;
        for i in 1..=steps {
            let v = d + (1.0 - d) * i as f32 / steps as f32;
            let out = apply_deadzone(v, d);
            assert!(out >= previous, "not monotonic at {v}");
            assert!(out - previous < 0.01, "jump at {v}");
            previous = out;
        }
    }

    #[test]
    fn rescaling_differs_from_plain_clamp() {
        // A clamp that only zeroes the band would pass 0.5 through unchanged
        let hard_clamp = |v: f32, d: f32| if v.abs() < d { 0.0 } else { v };
        let d = 0.15;
        let v = 0.5;
        assert!((apply_deadzone(v, d) - hard_clamp(v, d)).abs() > 0.05);
        // and just outside the band the curve starts near zero, not near d
        assert!(apply_deadzone(0.16, d) < 0.02);
        assert!(hard_clamp(0.16, d) > 0.15);
    }

    #[test]
    fn deadzone_is_clamped_to_half() {
        assert_eq!(Deadzone::new(0.8).value(), MAX_DEADZONE);
        assert_eq!(Deadzone::new(-0.2).value(), 0.0);
        assert_eq!(Deadzone::new(f32::NAN).value(), 0.0);
    }

    #[test]
    fn overshoot_is_capped_at_one() {
        assert_eq!(apply_deadzone(1.2, 0.1), 1.0);
    }
}
