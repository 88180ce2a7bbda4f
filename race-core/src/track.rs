//! Seeded track generation for offline races.

use crate::angle;
use crate::constants::{
    MAP_HEIGHT, MAP_WIDTH, MAX_CHECKPOINTS_EXCLUSIVE, MIN_CHECKPOINTS, MIN_CHECKPOINT_SPACING,
    PLACEMENT_ATTEMPTS, TRACK_PADDING,
};
use crate::geometry::{Coord, Vector};
use crate::physics::Vehicle;
use crate::race::{CheckpointLoop, RaceState};
use crate::rng::SeededRng;

/// Deterministic checkpoint loop for `seed`.
///
/// Each checkpoint is rejection-sampled until it clears every earlier one by
/// [`MIN_CHECKPOINT_SPACING`]. If a spot cannot be found within
/// [`PLACEMENT_ATTEMPTS`] draws, the draw with the most clearance is used.
pub fn generate_track(seed: u32) -> CheckpointLoop {
    let mut rng = SeededRng::new(seed);
    let count = rng.next_range(MIN_CHECKPOINTS, MAX_CHECKPOINTS_EXCLUSIVE) as usize;
    let mut checkpoints: Vec<Coord> = Vec::with_capacity(count);

    while checkpoints.len() < count {
        let mut best = random_spot(&mut rng);
        let mut best_clearance = clearance(&best, &checkpoints);

        for _ in 1..PLACEMENT_ATTEMPTS {
            if best_clearance >= MIN_CHECKPOINT_SPACING {
                break;
            }
            let spot = random_spot(&mut rng);
            let spot_clearance = clearance(&spot, &checkpoints);
            if spot_clearance > best_clearance {
                best = spot;
                best_clearance = spot_clearance;
            }
        }

        checkpoints.push(best);
    }

    CheckpointLoop::from_trusted(checkpoints)
}

fn random_spot(rng: &mut SeededRng) -> Coord {
    let x = rng.next_range(TRACK_PADDING, MAP_WIDTH - TRACK_PADDING);
    let y = rng.next_range(TRACK_PADDING, MAP_HEIGHT - TRACK_PADDING);
    Coord::new(x as f64, y as f64)
}

fn clearance(spot: &Coord, placed: &[Coord]) -> f64 {
    placed
        .iter()
        .map(|c| c.distance(spot))
        .fold(f64::INFINITY, f64::min)
}

/// Starting state: parked on checkpoint 0, nose pointed at the next one.
pub fn spawn_state(track: &CheckpointLoop) -> RaceState {
    let start = track.as_slice()[0];
    let next_checkpoint = track.following(0);
    let target = track.as_slice()[next_checkpoint];

    let heading_deg = if start == target {
        0.0
    } else {
        angle::to_degrees(angle::bearing(start.x, start.y, target.x, target.y)).round()
    };

    RaceState {
        vehicle: Vehicle::new(start, Vector::ZERO, heading_deg),
        next_checkpoint,
        laps_completed: 0,
        checkpoints_passed: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        for seed in [0, 1, 17, 0xBEEF] {
            assert_eq!(generate_track(seed), generate_track(seed));
        }
        assert_ne!(generate_track(1), generate_track(2));
    }

    #[test]
    fn tracks_respect_bounds_and_spacing() {
        for seed in 1..40 {
            let track = generate_track(seed);
            let n = track.len() as i32;
            assert!((MIN_CHECKPOINTS..MAX_CHECKPOINTS_EXCLUSIVE).contains(&n));

            let points = track.as_slice();
            for (i, p) in points.iter().enumerate() {
                assert!(p.x >= TRACK_PADDING as f64 && p.x < (MAP_WIDTH - TRACK_PADDING) as f64);
                assert!(p.y >= TRACK_PADDING as f64 && p.y < (MAP_HEIGHT - TRACK_PADDING) as f64);
                for q in &points[i + 1..] {
                    assert!(
                        p.distance(q) >= MIN_CHECKPOINT_SPACING,
                        "seed {seed}: {p:?} and {q:?} too close"
                    );
                }
            }
        }
    }

    #[test]
    fn spawn_faces_the_second_checkpoint() {
        let track = CheckpointLoop::new(vec![
            Coord::new(1000.0, 1000.0),
            Coord::new(1000.0, 5000.0),
            Coord::new(8000.0, 5000.0),
        ])
        .expect("valid track");
        let state = spawn_state(&track);
        assert_eq!(state.vehicle.position, Coord::new(1000.0, 1000.0));
        assert_eq!(state.vehicle.velocity, Vector::ZERO);
        assert_eq!(state.vehicle.heading_deg, 90.0);
        assert_eq!(state.next_checkpoint, 1);
        assert_eq!(state.laps_completed, 0);
    }
}
