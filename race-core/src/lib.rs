//! Deterministic race physics shared by the planner, the offline runner and
//! the tuning harness.
//!
//! Everything here is pure: no clocks, no I/O, no global state. The same
//! inputs always produce bit-identical vehicles, which is what lets the
//! planner's simulated futures line up with what the judge reports.

pub mod angle;
pub mod constants;
pub mod dedup;
pub mod error;
pub mod geometry;
pub mod physics;
pub mod race;
pub mod rng;
pub mod track;

pub use error::CoreError;
pub use geometry::{Coord, Vector};
pub use physics::{advance, Action, Control, Vehicle};
pub use race::{apply_action, CheckpointLoop, RaceState};
