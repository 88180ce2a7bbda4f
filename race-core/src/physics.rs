//! One-tick vehicle physics.
//!
//! The order of operations in [`advance`] is fixed: turn, thrust, move, drag,
//! truncate, then round the heading. Reordering any of it changes where the
//! vehicle ends up.

use serde::{Deserialize, Serialize};

use crate::angle;
use crate::constants::DRAG;
use crate::geometry::{Coord, Vector};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub position: Coord,
    pub velocity: Vector,
    /// Facing in degrees, canonical `(-180, 180]`.
    pub heading_deg: f64,
}

/// Absolute steering request for one tick. The physics may not be able to
/// honour the heading in full; see [`angle::restrict_turn`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub heading_deg: f64,
    pub thrust: i32,
}

/// One discrete planner decision, relative to the current heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub thrust: i32,
    pub angle_offset_deg: i32,
}

impl Vehicle {
    /// Build a vehicle from observed values; the heading is normalized here.
    pub fn new(position: Coord, velocity: Vector, heading_deg: f64) -> Self {
        Self {
            position,
            velocity,
            heading_deg: angle::normalize_degrees(heading_deg),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.heading_deg.is_finite()
    }
}

impl Control {
    /// Keep the current heading and coast.
    pub fn hold(heading_deg: f64) -> Self {
        Self {
            heading_deg,
            thrust: 0,
        }
    }
}

impl Action {
    pub const fn new(thrust: i32, angle_offset_deg: i32) -> Self {
        Self {
            thrust,
            angle_offset_deg,
        }
    }

    /// Resolve against the heading the vehicle currently has.
    pub fn control_from(&self, heading_deg: f64) -> Control {
        Control {
            heading_deg: heading_deg + self.angle_offset_deg as f64,
            thrust: self.thrust,
        }
    }
}

/// Truncate toward zero. Spelled out so nobody swaps it for `round` or `floor`.
#[inline]
pub fn truncate_toward_zero(value: f64) -> f64 {
    value.trunc()
}

/// Advance `vehicle` by one tick under `control`.
pub fn advance(vehicle: &Vehicle, control: Control) -> Vehicle {
    let current = angle::to_radians(vehicle.heading_deg);
    let requested = angle::to_radians(control.heading_deg);
    let actual = angle::restrict_turn(current, requested);

    // A zero thrust must stay an exact zero vector, not cos/sin noise times 0.
    let impulse = if control.thrust == 0 {
        Vector::ZERO
    } else {
        Vector::from_angle(actual).scale(control.thrust as f64)
    };

    let velocity = vehicle.velocity.add(impulse);
    let position = vehicle.position.displaced(velocity);
    let velocity = velocity.scale(DRAG);

    Vehicle {
        position: Coord::new(
            truncate_toward_zero(position.x),
            truncate_toward_zero(position.y),
        ),
        velocity: Vector::new(
            truncate_toward_zero(velocity.x),
            truncate_toward_zero(velocity.y),
        ),
        heading_deg: angle::normalize_degrees(angle::to_degrees(actual).round()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parked(x: f64, y: f64, heading_deg: f64) -> Vehicle {
        Vehicle::new(Coord::new(x, y), Vector::ZERO, heading_deg)
    }

    #[test]
    fn full_thrust_from_rest() {
        let v = parked(3000.0, 4399.0, 90.0);
        let next = advance(&v, Control { heading_deg: 90.0, thrust: 200 });
        assert_eq!(next.velocity, Vector::new(0.0, 170.0));
        assert_eq!(next.position, Coord::new(3000.0, 4599.0));
        assert_eq!(next.heading_deg, 90.0);
    }

    #[test]
    fn truncation_goes_toward_zero() {
        assert_eq!(truncate_toward_zero(2.9), 2.0);
        assert_eq!(truncate_toward_zero(-2.9), -2.0);
        assert_eq!(truncate_toward_zero(-0.4), 0.0);

        let v = Vehicle::new(Coord::new(0.0, 0.0), Vector::new(-7.0, 7.0), 0.0);
        let next = advance(&v, Control::hold(0.0));
        // -7 * 0.85 = -5.95 -> -5, never -6.
        assert_eq!(next.velocity, Vector::new(-5.0, 5.0));
        assert_eq!(next.position, Coord::new(-7.0, 7.0));
    }

    #[test]
    fn turn_is_limited_and_heading_rounded() {
        let v = parked(0.0, 0.0, 0.0);
        let next = advance(&v, Control { heading_deg: 90.0, thrust: 0 });
        assert_eq!(next.heading_deg, 18.0);

        let next = advance(&next, Control { heading_deg: -90.0, thrust: 0 });
        assert_eq!(next.heading_deg, 0.0);

        // Across the +/-180 seam: 15 degrees is reachable, 20 is not.
        let v = parked(0.0, 0.0, 170.0);
        let next = advance(&v, Control { heading_deg: -175.0, thrust: 0 });
        assert_eq!(next.heading_deg, -175.0);
        let next = advance(&v, Control { heading_deg: -170.0, thrust: 0 });
        assert_eq!(next.heading_deg, -172.0);
    }

    #[test]
    fn advance_is_deterministic() {
        let v = Vehicle::new(Coord::new(1234.0, 987.0), Vector::new(311.0, -54.0), 37.0);
        let control = Control { heading_deg: 61.0, thrust: 173 };
        let a = advance(&v, control);
        let b = advance(&v, control);
        assert_eq!(a.position.x.to_bits(), b.position.x.to_bits());
        assert_eq!(a.position.y.to_bits(), b.position.y.to_bits());
        assert_eq!(a.velocity.x.to_bits(), b.velocity.x.to_bits());
        assert_eq!(a.velocity.y.to_bits(), b.velocity.y.to_bits());
        assert_eq!(a.heading_deg.to_bits(), b.heading_deg.to_bits());
    }

    #[test]
    fn coasting_decays_to_a_full_stop() {
        let mut v = Vehicle::new(Coord::new(0.0, 0.0), Vector::new(900.0, -431.0), 45.0);
        let mut last = v.velocity.norm();
        let mut steps = 0;
        while v.velocity != Vector::ZERO {
            v = advance(&v, Control::hold(v.heading_deg));
            let speed = v.velocity.norm();
            assert!(speed <= last, "speed grew from {last} to {speed}");
            last = speed;
            steps += 1;
            assert!(steps < 100, "never came to rest");
        }
        assert_eq!(v.heading_deg, 45.0);
    }

    #[test]
    fn zero_thrust_adds_no_impulse() {
        let v = Vehicle::new(Coord::new(10.0, 10.0), Vector::new(100.0, 0.0), 33.0);
        let next = advance(&v, Control { heading_deg: 50.0, thrust: 0 });
        assert_eq!(next.position, Coord::new(110.0, 10.0));
        assert_eq!(next.velocity, Vector::new(85.0, 0.0));
    }

    #[test]
    fn action_resolves_relative_to_heading() {
        let control = Action::new(200, -18).control_from(10.0);
        assert_eq!(control.heading_deg, -8.0);
        assert_eq!(control.thrust, 200);
    }
}
