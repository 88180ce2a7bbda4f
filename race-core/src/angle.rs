//! Angle algebra.
//!
//! Radians are canonical in `(-PI, PI]`, degrees in `(-180, 180]`. Every
//! difference goes through [`angle_difference`] so that turning always takes
//! the short way round.

use core::f64::consts::PI;

use crate::constants::MAX_TURN_DEG;

const TAU: f64 = 2.0 * PI;

/// Degrees to canonical radians. Uses `deg * PI / 180` rather than
/// `f64::to_radians` so the rounding matches the judge.
#[inline]
pub fn to_radians(deg: f64) -> f64 {
    normalize(deg * PI / 180.0)
}

#[inline]
pub fn to_degrees(rad: f64) -> f64 {
    rad * 180.0 / PI
}

/// Map an angle in radians into `(-PI, PI]`.
///
/// In-range values come back bit-identical. Values within one extra turn are
/// shifted once; anything further out goes through a Euclidean remainder.
pub fn normalize(a: f64) -> f64 {
    wrap(a, PI, TAU)
}

/// Map an angle in degrees into `(-180, 180]`.
pub fn normalize_degrees(a: f64) -> f64 {
    wrap(a, 180.0, 360.0)
}

fn wrap(a: f64, half: f64, full: f64) -> f64 {
    let mut a = a;
    if a > half {
        a -= full;
    } else if a <= -half {
        a += full;
    }
    if a > half || a <= -half {
        a = (a + half).rem_euclid(full) - half;
        if a <= -half {
            a += full;
        }
    }
    a
}

/// Signed shortest rotation taking `from` onto `to`.
#[inline]
pub fn angle_difference(from: f64, to: f64) -> f64 {
    normalize(to - from)
}

/// Clamp `angle` into the arc running counter-clockwise from `min` to `max`.
///
/// Outside the arc, the nearer bound wins; ties go to `min`.
pub fn clamp_to_range(angle: f64, min: f64, max: f64) -> f64 {
    if angle_difference(min, angle) >= 0.0 && angle_difference(angle, max) >= 0.0 {
        return angle;
    }
    if angle_difference(angle, min).abs() <= angle_difference(angle, max).abs() {
        min
    } else {
        max
    }
}

/// Per-tick yaw limit in radians.
#[inline]
pub fn max_turn() -> f64 {
    to_radians(MAX_TURN_DEG)
}

/// Heading actually reached this tick when `requested` is asked for while
/// facing `current` (both radians).
pub fn restrict_turn(current: f64, requested: f64) -> f64 {
    let limit = max_turn();
    clamp_to_range(requested, current - limit, current + limit)
}

/// Bearing from `(x0, y0)` to `(x1, y1)` in radians.
#[inline]
pub fn bearing(x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    (y1 - y0).atan2(x1 - x0)
}
