// Interpolation utilities
// Easing curves shape linear progress fractions; every curve is pinned so that
// f(0) == 0.0 and f(1) == 1.0 exactly, overshooting curves included.

use super::types::MIN_DURATION;
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

// Back easing (overshooting)
const C1: f32 = 1.70158;
const C3: f32 = C1 + 1.0;
// Elastic easing
const C4: f32 = TAU / 3.0;

/// Clamp into [0, 1] and force exact endpoints
#[inline]
fn pinned(t: f32, curve: impl Fn(f32) -> f32) -> f32 {
    if t.is_nan() || t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else {
        curve(t)
    }
}

#[inline]
pub fn linear(t: f32) -> f32 {
    pinned(t, |t| t)
}

#[inline]
pub fn in_quad(t: f32) -> f32 {
    pinned(t, |t| t * t)
}

#[inline]
pub fn out_quad(t: f32) -> f32 {
    pinned(t, |t| 1.0 - (1.0 - t) * (1.0 - t))
}

#[inline]
pub fn in_out_quad(t: f32) -> f32 {
    pinned(t, |t| {
        if t < 0.5 {
            2.0 * t * t
        } else {
            1.0 - (-2.0 * t + 2.0).powi(2) * 0.5
        }
    })
}

#[inline]
pub fn in_cubic(t: f32) -> f32 {
    pinned(t, |t| t * t * t)
}

#[inline]
pub fn out_cubic(t: f32) -> f32 {
    pinned(t, |t| 1.0 - (1.0 - t).powi(3))
}

#[inline]
pub fn in_out_cubic(t: f32) -> f32 {
    pinned(t, |t| {
        if t < 0.5 {
            4.0 * t * t * t
        } else {
            1.0 - (-2.0 * t + 2.0).powi(3) * 0.5
        }
    })
}

#[inline]
pub fn in_back(t: f32) -> f32 {
    pinned(t, |t| C3 * t * t * t - C1 * t * t)
}

#[inline]
pub fn out_back(t: f32) -> f32 {
    pinned(t, |t| 1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2))
}

#[inline]
pub fn out_elastic(t: f32) -> f32 {
    pinned(t, |t| 2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * C4).sin() + 1.0)
}

/// Easing curve selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    BackIn,
    BackOut,
    ElasticOut,
}

impl Easing {
    pub const ALL: [Easing; 10] = [
        Easing::Linear,
        Easing::QuadIn,
        Easing::QuadOut,
        Easing::QuadInOut,
        Easing::CubicIn,
        Easing::CubicOut,
        Easing::CubicInOut,
        Easing::BackIn,
        Easing::BackOut,
        Easing::ElasticOut,
    ];

    pub fn apply(self, t: f32) -> f32 {
        match self {
            Easing::Linear => linear(t),
            Easing::QuadIn => in_quad(t),
            Easing::QuadOut => out_quad(t),
            Easing::QuadInOut => in_out_quad(t),
            Easing::CubicIn => in_cubic(t),
            Easing::CubicOut => out_cubic(t),
            Easing::CubicInOut => in_out_cubic(t),
            Easing::BackIn => in_back(t),
            Easing::BackOut => out_back(t),
            Easing::ElasticOut => out_elastic(t),
        }
    }

    /// Curves allowed to leave [0, 1] between the endpoints
    pub fn overshoots(self) -> bool {
        matches!(self, Easing::BackIn | Easing::BackOut | Easing::ElasticOut)
    }
}

/// Linear interpolation for scalars
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Linear interpolation for vectors
pub fn lerp_vec3(v1: &glm::Vec3, v2: &glm::Vec3, t: f32) -> glm::Vec3 {
    glm::lerp(v1, v2, t)
}

/// Wrap an angle difference into (-PI, PI]
pub fn wrap_angle(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a > PI {
        a -= TAU;
    } else if a <= -PI {
        a += TAU;
    }
    a
}

/// Interpolate between two angles along the shorter arc
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    from + wrap_angle(to - from) * t
}

/// Progress fraction of `time` within `duration`, clamped to [0, 1]
pub fn safe_fraction(time: f32, duration: f32) -> f32 {
    let duration = if duration.is_finite() {
        duration.max(MIN_DURATION)
    } else {
        MIN_DURATION
    };
    let t = time / duration;
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}

/// Local progress of `t` inside the sub-range [start, end] of a state
pub fn subphase(t: f32, start: f32, end: f32) -> f32 {
    if end - start <= f32::EPSILON {
        return if t >= end { 1.0 } else { 0.0 };
    }
    ((t - start) / (end - start)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_endpoints_are_exact() {
        for easing in Easing::ALL {
            assert_eq!(easing.apply(0.0), 0.0, "{easing:?} at 0");
            assert_eq!(easing.apply(1.0), 1.0, "{easing:?} at 1");
        }
    }

    #[test]
    fn test_input_is_clamped() {
        for easing in Easing::ALL {
            assert_eq!(easing.apply(-3.0), 0.0);
            assert_eq!(easing.apply(7.5), 1.0);
            assert_eq!(easing.apply(f32::NAN), 0.0);
        }
    }

    #[test]
    fn test_non_overshooting_curves_stay_in_range() {
        for easing in Easing::ALL.into_iter().filter(|e| !e.overshoots()) {
            for i in 1..100 {
                let v = easing.apply(i as f32 / 100.0);
                assert!((0.0..=1.0).contains(&v), "{easing:?} left range: {v}");
            }
        }
    }

    #[test]
    fn test_back_out_overshoots() {
        let peak = (1..100)
            .map(|i| out_back(i as f32 / 100.0))
            .fold(f32::MIN, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn test_in_out_symmetry() {
        assert_relative_eq!(in_out_cubic(0.5), 0.5, epsilon = 1e-6);
        assert_relative_eq!(in_out_quad(0.25) + in_out_quad(0.75), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_lerp_angle_takes_short_way() {
        let a = 170.0_f32.to_radians();
        let b = -170.0_f32.to_radians();
        let mid = lerp_angle(a, b, 0.5);
        assert_relative_eq!(wrap_angle(mid).abs(), PI, epsilon = 1e-5);
        assert_relative_eq!(lerp_angle(0.0, 1.0, 0.25), 0.25);
    }

    #[test]
    fn test_safe_fraction_guards_zero_duration() {
        assert_eq!(safe_fraction(0.5, 0.0), 1.0);
        assert_eq!(safe_fraction(0.0, 0.0), 0.0);
        assert_eq!(safe_fraction(1.0, 4.0), 0.25);
        assert_eq!(safe_fraction(1.0, f32::NAN), 1.0);
    }

    #[test]
    fn test_subphase_ranges() {
        assert_eq!(subphase(0.1, 0.3, 0.8), 0.0);
        assert_relative_eq!(subphase(0.55, 0.3, 0.8), 0.5);
        assert_eq!(subphase(0.9, 0.3, 0.8), 1.0);
        assert_eq!(subphase(0.5, 0.5, 0.5), 1.0);
    }
}
