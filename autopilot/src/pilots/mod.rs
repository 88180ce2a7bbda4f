use crate::config::PlannerConfig;
use crate::error::PlanError;
use crate::planner::{BeamPlanner, Decision};
use crate::util::crc32;
use pod_race_core::angle::{angle_difference, bearing, to_degrees};
use pod_race_core::{CheckpointLoop, Control, RaceState, Vehicle};
use serde::{Deserialize, Serialize};

mod roster;

pub use roster::{
    create_pilot, describe_pilots, pilot_fingerprint, pilot_ids, pilot_manifest_entries,
    DEFAULT_PILOT,
};

/// Anything that can pick a control for the vehicle each turn.
pub trait Pilot {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// Forget per-race state before a new race starts.
    fn reset(&mut self);
    fn next_control(
        &mut self,
        turn: u32,
        track: &CheckpointLoop,
        observed: &RaceState,
    ) -> Result<PilotMove, PlanError>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PilotMove {
    pub control: Control,
    /// Present for search pilots.
    pub decision: Option<Decision>,
}

impl PilotMove {
    pub fn predicted(&self) -> Option<Vehicle> {
        self.decision.map(|d| d.predicted)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PilotManifestEntry {
    pub id: String,
    pub family: String,
    pub description: String,
    pub config_hash: String,
    pub config: serde_json::Value,
}

pub struct BeamPilot {
    id: &'static str,
    description: &'static str,
    planner: BeamPlanner,
}

impl BeamPilot {
    pub fn new(
        id: &'static str,
        description: &'static str,
        config: PlannerConfig,
    ) -> Result<Self, PlanError> {
        Ok(Self {
            id,
            description,
            planner: BeamPlanner::new(config)?,
        })
    }
}

impl Pilot for BeamPilot {
    fn id(&self) -> &'static str {
        self.id
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn reset(&mut self) {}

    fn next_control(
        &mut self,
        turn: u32,
        track: &CheckpointLoop,
        observed: &RaceState,
    ) -> Result<PilotMove, PlanError> {
        let decision = self.planner.plan(turn, track, observed)?;
        Ok(PilotMove {
            control: decision.control,
            decision: Some(decision),
        })
    }
}

/// Steer straight at the next checkpoint; ease off the throttle while the
/// velocity still points somewhere else.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeuristicConfig {
    pub full_thrust: i32,
    pub slow_thrust: i32,
    pub slow_angle_deg: f64,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            full_thrust: 200,
            slow_thrust: 80,
            slow_angle_deg: 10.0,
        }
    }
}

pub const MAX_THRUST: i32 = 200;

pub fn heuristic_control(
    cfg: &HeuristicConfig,
    track: &CheckpointLoop,
    observed: &RaceState,
) -> Control {
    let pos = observed.vehicle.position;
    let target = observed.target(track);
    let to_target = bearing(pos.x, pos.y, target.x, target.y);
    let drift = angle_difference(observed.vehicle.velocity.angle(), to_target).abs();

    let thrust = if to_degrees(drift) > cfg.slow_angle_deg {
        cfg.slow_thrust
    } else {
        cfg.full_thrust
    };

    Control {
        heading_deg: to_degrees(to_target),
        thrust: thrust.clamp(0, MAX_THRUST),
    }
}

pub struct HeuristicPilot {
    id: &'static str,
    description: &'static str,
    cfg: HeuristicConfig,
}

impl HeuristicPilot {
    pub fn new(id: &'static str, description: &'static str, cfg: HeuristicConfig) -> Self {
        Self {
            id,
            description,
            cfg,
        }
    }
}

impl Pilot for HeuristicPilot {
    fn id(&self) -> &'static str {
        self.id
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn reset(&mut self) {}

    fn next_control(
        &mut self,
        _turn: u32,
        track: &CheckpointLoop,
        observed: &RaceState,
    ) -> Result<PilotMove, PlanError> {
        track.check_index(observed.next_checkpoint)?;
        Ok(PilotMove {
            control: heuristic_control(&self.cfg, track, observed),
            decision: None,
        })
    }
}

fn hash_json(value: &serde_json::Value) -> String {
    let encoded = value.to_string();
    let digest = crc32(encoded.as_bytes());
    format!("crc32:{digest:08x}:len:{}", encoded.len())
}
