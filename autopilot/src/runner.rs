//! Offline races: a pilot against the real physics on a generated track.

use crate::config::RaceRules;
use crate::pilots::{create_pilot, pilot_fingerprint, Pilot};
use anyhow::{anyhow, Context, Result};
use pod_race_core::track::{generate_track, spawn_state};
use pod_race_core::{CheckpointLoop, Control, Vehicle};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Clone, Debug, Serialize)]
pub struct RaceMetrics {
    pub pilot_id: String,
    pub pilot_fingerprint: String,
    pub seed: Option<u32>,
    pub checkpoint_count: usize,
    pub lap_target: u32,
    pub turn_cap: u32,
    pub turns: u32,
    pub laps: u32,
    pub checkpoints_passed: u32,
    pub finished: bool,
    pub avg_plan_ms: f64,
    pub max_plan_ms: f64,
    /// Turns where the pilot's predicted vehicle differed from the real one.
    pub prediction_mismatches: u32,
    /// Turns whose search hit the deadline before reaching its depth limit.
    pub timed_out_turns: u32,
    pub avg_search_depth: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct RaceArtifact {
    pub metrics: RaceMetrics,
    pub track: CheckpointLoop,
    pub controls: Vec<Control>,
}

/// Race the roster pilot `pilot_id` on the track generated from `seed`.
pub fn run_pilot(pilot_id: &str, seed: u32, rules: &RaceRules) -> Result<RaceArtifact> {
    let mut pilot = create_pilot(pilot_id).ok_or_else(|| anyhow!("unknown pilot '{pilot_id}'"))?;
    let track = generate_track(seed);
    let mut artifact = run_race(pilot.as_mut(), &track, rules)?;
    artifact.metrics.seed = Some(seed);
    Ok(artifact)
}

pub fn run_race(
    pilot: &mut dyn Pilot,
    track: &CheckpointLoop,
    rules: &RaceRules,
) -> Result<RaceArtifact> {
    if rules.turn_cap == 0 {
        return Err(anyhow!("turn_cap must be > 0"));
    }
    if rules.lap_target == 0 {
        return Err(anyhow!("lap_target must be > 0"));
    }

    pilot.reset();
    let mut state = spawn_state(track);
    let mut controls = Vec::new();
    let mut plan_total = Duration::ZERO;
    let mut plan_max = Duration::ZERO;
    let mut mismatches = 0u32;
    let mut timed_out_turns = 0u32;
    let mut depth_total = 0u64;
    let mut turn = 0u32;

    while turn < rules.turn_cap && !state.is_finished(rules.lap_target) {
        let observed = state.rebased();
        let started = Instant::now();
        let chosen = pilot
            .next_control(turn, track, &observed)
            .with_context(|| format!("pilot {} failed on turn {turn}", pilot.id()))?;
        let elapsed = started.elapsed();
        plan_total += elapsed;
        plan_max = plan_max.max(elapsed);

        state = state.apply(track, chosen.control);
        controls.push(chosen.control);

        if let Some(decision) = chosen.decision {
            depth_total += u64::from(decision.depth);
            if decision.timed_out {
                timed_out_turns += 1;
            }
        }
        if let Some(predicted) = chosen.predicted() {
            if !same_bits(&predicted, &state.vehicle) {
                mismatches += 1;
                tracing::warn!(
                    "prediction mismatch: pilot={} turn={} predicted={:?} actual={:?}",
                    pilot.id(),
                    turn,
                    predicted,
                    state.vehicle
                );
            }
        }
        turn += 1;
    }

    let finished = state.is_finished(rules.lap_target);
    let turns_f = f64::from(turn.max(1));
    tracing::debug!(
        "race done: pilot={} turns={} laps={} finished={}",
        pilot.id(),
        turn,
        state.laps_completed,
        finished
    );

    Ok(RaceArtifact {
        metrics: RaceMetrics {
            pilot_id: pilot.id().to_string(),
            pilot_fingerprint: pilot_fingerprint(pilot.id())
                .context("failed to fingerprint pilot config")?
                .unwrap_or_else(|| "custom".to_string()),
            seed: None,
            checkpoint_count: track.len(),
            lap_target: rules.lap_target,
            turn_cap: rules.turn_cap,
            turns: turn,
            laps: state.laps_completed,
            checkpoints_passed: state.checkpoints_passed,
            finished,
            avg_plan_ms: plan_total.as_secs_f64() * 1000.0 / turns_f,
            max_plan_ms: plan_max.as_secs_f64() * 1000.0,
            prediction_mismatches: mismatches,
            timed_out_turns,
            avg_search_depth: depth_total as f64 / turns_f,
        },
        track: track.clone(),
        controls,
    })
}

fn same_bits(a: &Vehicle, b: &Vehicle) -> bool {
    let bits = |v: &Vehicle| {
        [
            v.position.x.to_bits(),
            v.position.y.to_bits(),
            v.velocity.x.to_bits(),
            v.velocity.y.to_bits(),
            v.heading_deg.to_bits(),
        ]
    };
    bits(a) == bits(b)
}

pub fn write_trace(path: &Path, artifact: &RaceArtifact) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    let encoded = serde_json::to_vec_pretty(artifact).context("failed to serialize race trace")?;
    fs::write(path, encoded).with_context(|| format!("failed writing {}", path.display()))
}
