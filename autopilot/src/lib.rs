//! Pod racing autopilot: the beam search planner, the pilots built on it, and
//! the offline tooling (races, benchmarks, tuning) around them.

pub mod benchmark;
pub mod config;
pub mod driver;
pub mod error;
pub mod pilots;
pub mod planner;
pub mod runner;
pub mod tuner;
pub mod util;

pub use config::{PlannerConfig, RaceRules};
pub use error::PlanError;
pub use planner::{BeamPlanner, Decision};
