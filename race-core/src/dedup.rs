//! Canonical fingerprint of a race state for per-generation pruning.
//!
//! Two states that agree on every truncated physical quantity and every
//! progress counter hash the same. Distinct states may also collide; the
//! planner treats that as approximate pruning and keeps whichever arrived
//! first.

use crate::constants::{STATE_HASH_MULTIPLIER, STATE_HASH_SEED};
use crate::physics::truncate_toward_zero;
use crate::race::RaceState;

#[inline]
fn mix(hash: u64, value: i64) -> u64 {
    hash.wrapping_mul(STATE_HASH_MULTIPLIER)
        .wrapping_add(value as u64)
}

#[inline]
fn quantize(value: f64) -> i64 {
    truncate_toward_zero(value) as i64
}

pub fn state_hash(state: &RaceState) -> u64 {
    let v = &state.vehicle;
    let mut hash = STATE_HASH_SEED;
    hash = mix(hash, quantize(v.heading_deg));
    hash = mix(hash, quantize(v.position.x));
    hash = mix(hash, quantize(v.position.y));
    hash = mix(hash, quantize(v.velocity.x));
    hash = mix(hash, quantize(v.velocity.y));
    hash = mix(hash, state.next_checkpoint as i64);
    hash = mix(hash, i64::from(state.laps_completed));
    mix(hash, i64::from(state.checkpoints_passed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Coord, Vector};
    use crate::physics::Vehicle;

    fn state(x: f64, y: f64, vx: f64, heading: f64) -> RaceState {
        RaceState {
            vehicle: Vehicle {
                position: Coord::new(x, y),
                velocity: Vector::new(vx, 0.0),
                heading_deg: heading,
            },
            next_checkpoint: 1,
            laps_completed: 0,
            checkpoints_passed: 0,
        }
    }

    #[test]
    fn sub_unit_differences_are_invisible() {
        let a = state(100.0, 200.0, 30.0, 45.0);
        let b = state(100.4, 200.9, 30.2, 45.3);
        assert_eq!(state_hash(&a), state_hash(&b));
    }

    #[test]
    fn progress_counters_separate_states() {
        let a = state(100.0, 200.0, 30.0, 45.0);
        let mut b = a;
        b.checkpoints_passed = 1;
        let mut c = a;
        c.next_checkpoint = 2;
        let mut d = a;
        d.laps_completed = 1;
        let hashes = [state_hash(&a), state_hash(&b), state_hash(&c), state_hash(&d)];
        for i in 0..hashes.len() {
            for j in (i + 1)..hashes.len() {
                assert_ne!(hashes[i], hashes[j], "states {i} and {j} collided");
            }
        }
    }

    #[test]
    fn negative_components_hash_stably() {
        let a = state(-5.0, -7.0, -30.0, -90.0);
        let b = a;
        assert_eq!(state_hash(&a), state_hash(&b));
        assert_ne!(state_hash(&a), state_hash(&state(5.0, 7.0, 30.0, 90.0)));
    }
}
