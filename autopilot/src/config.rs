//! Planner and race configuration.
//!
//! Defaults live here; `POD_*` environment variables override them, and the
//! CLI overrides the environment.

use anyhow::{Context, Result};
use pod_race_core::constants::{DEFAULT_LAP_TARGET, DEFAULT_TURN_CAP};
use pod_race_core::Action;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BEAM_WIDTH: usize = 200;
pub const DEFAULT_FIRST_TURN_BUDGET_MS: u64 = 900;
pub const DEFAULT_TURN_BUDGET_MS: u64 = 40;
/// Larger than any distance on the map, so one extra checkpoint always
/// outranks getting closer.
pub const DEFAULT_PROGRESS_WEIGHT: f64 = 100_000.0;

pub const ENV_BEAM_WIDTH: &str = "POD_BEAM_WIDTH";
pub const ENV_FIRST_TURN_BUDGET_MS: &str = "POD_FIRST_TURN_BUDGET_MS";
pub const ENV_TURN_BUDGET_MS: &str = "POD_TURN_BUDGET_MS";
pub const ENV_MAX_DEPTH: &str = "POD_MAX_DEPTH";
pub const ENV_LAPS: &str = "POD_LAPS";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub beam_width: usize,
    pub thrusts: Vec<i32>,
    pub angle_offsets_deg: Vec<i32>,
    pub first_turn_budget_ms: u64,
    pub turn_budget_ms: u64,
    pub max_depth: Option<u32>,
    pub progress_weight: f64,
    pub wall_clock: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            beam_width: DEFAULT_BEAM_WIDTH,
            thrusts: vec![0, 100, 200],
            angle_offsets_deg: vec![-18, 0, 18],
            first_turn_budget_ms: DEFAULT_FIRST_TURN_BUDGET_MS,
            turn_budget_ms: DEFAULT_TURN_BUDGET_MS,
            max_depth: None,
            progress_weight: DEFAULT_PROGRESS_WEIGHT,
            wall_clock: true,
        }
    }
}

impl PlannerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            beam_width: read_env_usize(ENV_BEAM_WIDTH, defaults.beam_width),
            first_turn_budget_ms: read_env_u64(
                ENV_FIRST_TURN_BUDGET_MS,
                defaults.first_turn_budget_ms,
            ),
            turn_budget_ms: read_env_u64(ENV_TURN_BUDGET_MS, defaults.turn_budget_ms),
            max_depth: read_env_opt_u32(ENV_MAX_DEPTH).or(defaults.max_depth),
            ..defaults
        }
    }

    /// Full config from a JSON file; missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .with_context(|| format!("failed reading planner config {}", path.display()))?;
        serde_json::from_slice(&data)
            .with_context(|| format!("invalid planner config {}", path.display()))
    }

    /// Every `(thrust, offset)` pair, offsets outermost.
    pub fn action_set(&self) -> Vec<Action> {
        self.angle_offsets_deg
            .iter()
            .flat_map(|offset| {
                self.thrusts
                    .iter()
                    .map(move |thrust| Action::new(*thrust, *offset))
            })
            .collect()
    }

    /// Wall-clock allowance for `turn`; the first turn gets the warm-up budget.
    pub fn budget_for_turn(&self, turn: u32) -> Duration {
        if turn == 0 {
            Duration::from_millis(self.first_turn_budget_ms)
        } else {
            Duration::from_millis(self.turn_budget_ms)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceRules {
    pub lap_target: u32,
    pub turn_cap: u32,
}

impl Default for RaceRules {
    fn default() -> Self {
        Self {
            lap_target: DEFAULT_LAP_TARGET,
            turn_cap: DEFAULT_TURN_CAP,
        }
    }
}

impl RaceRules {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            lap_target: read_env_u32(ENV_LAPS, defaults.lap_target),
            ..defaults
        }
    }
}

fn read_env_positive<T>(name: &str, default: T) -> T
where
    T: FromStr + PartialOrd + Default + Copy,
{
    let Ok(raw) = env::var(name) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => value,
        _ => {
            tracing::warn!("{name}={raw:?} is not a positive integer. Falling back to default.");
            default
        }
    }
}

fn read_env_usize(name: &str, default: usize) -> usize {
    read_env_positive(name, default)
}

fn read_env_u64(name: &str, default: u64) -> u64 {
    read_env_positive(name, default)
}

fn read_env_u32(name: &str, default: u32) -> u32 {
    read_env_positive(name, default)
}

fn read_env_opt_u32(name: &str) -> Option<u32> {
    env::var(name).ok()?;
    let value = read_env_positive(name, 0u32);
    (value > 0).then_some(value)
}
