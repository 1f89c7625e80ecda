//! Procedural road shape
//!
//! Lateral offset of the road center as a function of distance traveled.
//! Two superimposed sinusoids; stateless so every consumer (road mesh,
//! NPC placement, camera look-ahead) samples the same curve.

use std::f32::consts::TAU;

const A1: f32 = 2.2;
const A2: f32 = 1.2;
const F1: f32 = TAU / 520.0;
const F2: f32 = TAU / 810.0;
const PH2: f32 = 2.1;

/// Largest slope of the curve (|d offset / d distance|)
pub const MAX_SLOPE: f32 = A1 * F1 + A2 * F2;

/// Road center lateral offset at `distance`
#[inline]
pub fn curve_offset(distance: f32) -> f32 {
    A1 * (F1 * distance).sin() + A2 * (F2 * distance + PH2).sin()
}

/// Road center offset with an amplitude scale (road-shape effects)
#[inline]
pub fn curve_offset_scaled(distance: f32, scale: f32) -> f32 {
    curve_offset(distance) * scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_curve_at_origin() {
        let expected = A2 * PH2.sin();
        assert!((curve_offset(0.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_curve_bounded() {
        for i in 0..10_000 {
            let d = i as f32 * 3.7;
            assert!(curve_offset(d).abs() <= A1 + A2 + 1e-4);
        }
    }

    #[test]
    fn test_curve_continuity_sample() {
        let a = curve_offset(1000.0);
        let b = curve_offset(1001.0);
        assert!((a - b).abs() < 10.0);
    }

    proptest! {
        #[test]
        fn prop_curve_reproducible(d in -1.0e5f32..1.0e5) {
            prop_assert_eq!(curve_offset(d), curve_offset(d));
        }

        #[test]
        fn prop_curve_continuous(d in 0.0f32..5.0e4, eps in 0.0f32..0.5) {
            let delta = (curve_offset(d + eps) - curve_offset(d)).abs();
            // Lipschitz bound plus float slack
            prop_assert!(delta <= MAX_SLOPE * eps + 1e-3);
        }

        #[test]
        fn prop_scaled_matches_unscaled(d in 0.0f32..5.0e4, s in 0.0f32..3.0) {
            prop_assert!((curve_offset_scaled(d, s) - s * curve_offset(d)).abs() < 1e-5);
        }
    }
}
