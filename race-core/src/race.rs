//! Checkpoint loop and race progress.

use serde::{Deserialize, Serialize};

use crate::constants::CHECKPOINT_RADIUS;
use crate::error::CoreError;
use crate::geometry::Coord;
use crate::physics::{advance, Control, Vehicle};

/// Ordered, cyclic list of checkpoints. Immutable for the length of a race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coord>", into = "Vec<Coord>")]
pub struct CheckpointLoop {
    checkpoints: Vec<Coord>,
}

/// Where a vehicle is in the race.
///
/// `checkpoints_passed` only counts captures along the trajectory currently
/// being simulated; it is zeroed whenever a state is built from an
/// observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaceState {
    pub vehicle: Vehicle,
    pub next_checkpoint: usize,
    pub laps_completed: u32,
    pub checkpoints_passed: u32,
}

impl CheckpointLoop {
    pub fn new(checkpoints: Vec<Coord>) -> Result<Self, CoreError> {
        if checkpoints.is_empty() {
            return Err(CoreError::EmptyCheckpointLoop);
        }
        if checkpoints.iter().any(|c| !c.is_finite()) {
            return Err(CoreError::NonFiniteCoordinate { what: "checkpoint" });
        }
        Ok(Self { checkpoints })
    }

    /// Skips validation; for generators that only ever produce finite,
    /// non-empty loops.
    pub(crate) fn from_trusted(checkpoints: Vec<Coord>) -> Self {
        debug_assert!(!checkpoints.is_empty());
        Self { checkpoints }
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Coord> {
        self.checkpoints.get(index).copied()
    }

    pub fn as_slice(&self) -> &[Coord] {
        &self.checkpoints
    }

    pub fn following(&self, index: usize) -> usize {
        (index + 1) % self.checkpoints.len()
    }

    pub fn check_index(&self, index: usize) -> Result<(), CoreError> {
        if index < self.checkpoints.len() {
            Ok(())
        } else {
            Err(CoreError::CheckpointIndexOutOfRange {
                index,
                len: self.checkpoints.len(),
            })
        }
    }
}

impl TryFrom<Vec<Coord>> for CheckpointLoop {
    type Error = CoreError;

    fn try_from(value: Vec<Coord>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CheckpointLoop> for Vec<Coord> {
    fn from(value: CheckpointLoop) -> Self {
        value.checkpoints
    }
}

impl RaceState {
    /// Fresh planning root from an externally observed vehicle.
    pub fn observed(
        track: &CheckpointLoop,
        vehicle: Vehicle,
        next_checkpoint: usize,
        laps_completed: u32,
    ) -> Result<Self, CoreError> {
        track.check_index(next_checkpoint)?;
        if !vehicle.is_finite() {
            return Err(CoreError::NonFiniteVehicle);
        }
        Ok(Self {
            vehicle: Vehicle::new(vehicle.position, vehicle.velocity, vehicle.heading_deg),
            next_checkpoint,
            laps_completed,
            checkpoints_passed: 0,
        })
    }

    pub fn target(&self, track: &CheckpointLoop) -> Coord {
        track.checkpoints[self.next_checkpoint]
    }

    pub fn distance_to_next(&self, track: &CheckpointLoop) -> f64 {
        self.vehicle.position.distance(&self.target(track))
    }

    pub fn is_finished(&self, lap_target: u32) -> bool {
        self.laps_completed >= lap_target
    }

    /// Same race position with the hypothetical-capture counter cleared.
    pub fn rebased(&self) -> Self {
        Self {
            checkpoints_passed: 0,
            ..*self
        }
    }

    /// Advance one tick. This is the only way progress moves forward.
    pub fn apply(&self, track: &CheckpointLoop, control: Control) -> RaceState {
        let vehicle = advance(&self.vehicle, control);
        let mut next = RaceState { vehicle, ..*self };

        if vehicle.position.distance(&self.target(track)) <= CHECKPOINT_RADIUS {
            if self.next_checkpoint == 0 {
                next.laps_completed += 1;
            }
            next.next_checkpoint = track.following(self.next_checkpoint);
            next.checkpoints_passed += 1;
        }

        next
    }
}

/// Free-function form of [`RaceState::apply`].
#[inline]
pub fn apply_action(track: &CheckpointLoop, state: &RaceState, control: Control) -> RaceState {
    state.apply(track, control)
}
