//! Offline random search over the heuristic pilot's parameters.
//!
//! Each round samples candidates inside a box, races every candidate on the
//! whole seed panel, then shrinks the box around the best configuration seen
//! so far. Never used during a live race.

use crate::config::RaceRules;
use crate::pilots::{HeuristicConfig, HeuristicPilot, MAX_THRUST};
use crate::runner::run_race;
use anyhow::{anyhow, Context, Result};
use pod_race_core::rng::SeededRng;
use pod_race_core::track::generate_track;
use pod_race_core::CheckpointLoop;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Cost of each checkpoint an unfinished race still owed, in turns.
const MISSING_CHECKPOINT_COST: f64 = 100.0;

#[derive(Clone, Debug)]
pub struct TuneConfig {
    pub seeds: Vec<u32>,
    pub rounds: u32,
    pub samples_per_round: u32,
    /// Box half-widths are multiplied by this after every round.
    pub shrink: f64,
    pub rng_seed: u32,
    pub rules: RaceRules,
    pub start: HeuristicConfig,
    pub jobs: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    fn around(center: f64, half_width: f64, limits: Interval) -> Self {
        Self {
            lo: (center - half_width).max(limits.lo),
            hi: (center + half_width).min(limits.hi),
        }
    }

    fn half_width(&self) -> f64 {
        (self.hi - self.lo) / 2.0
    }

    fn sample(&self, rng: &mut SeededRng) -> f64 {
        rng.next_between(self.lo, self.hi)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchBox {
    pub full_thrust: Interval,
    pub slow_thrust: Interval,
    pub slow_angle_deg: Interval,
}

impl SearchBox {
    pub fn full() -> Self {
        let thrust = Interval {
            lo: 0.0,
            hi: MAX_THRUST as f64,
        };
        Self {
            full_thrust: thrust,
            slow_thrust: thrust,
            slow_angle_deg: Interval { lo: 0.0, hi: 180.0 },
        }
    }

    fn sample(&self, rng: &mut SeededRng) -> HeuristicConfig {
        HeuristicConfig {
            full_thrust: self.full_thrust.sample(rng).round() as i32,
            slow_thrust: self.slow_thrust.sample(rng).round() as i32,
            slow_angle_deg: self.slow_angle_deg.sample(rng).round(),
        }
    }

    fn shrink_around(&self, best: &HeuristicConfig, factor: f64) -> Self {
        let limits = Self::full();
        Self {
            full_thrust: Interval::around(
                best.full_thrust as f64,
                self.full_thrust.half_width() * factor,
                limits.full_thrust,
            ),
            slow_thrust: Interval::around(
                best.slow_thrust as f64,
                self.slow_thrust.half_width() * factor,
                limits.slow_thrust,
            ),
            slow_angle_deg: Interval::around(
                best.slow_angle_deg,
                self.slow_angle_deg.half_width() * factor,
                limits.slow_angle_deg,
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Evaluation {
    pub config: HeuristicConfig,
    /// Mean turns per race, plus a penalty for unfinished ones. Lower is better.
    pub cost: f64,
    pub finished_rate: f64,
    pub avg_turns: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub search_box: SearchBox,
    pub round_best: Evaluation,
    pub improved: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TuneReport {
    pub generated_unix_s: u64,
    pub seeds: Vec<u32>,
    pub rules: RaceRules,
    pub baseline: Evaluation,
    pub best: Evaluation,
    pub history: Vec<RoundRecord>,
}

/// Race `config` on every track and fold the results into one cost.
pub fn evaluate(
    config: HeuristicConfig,
    tracks: &[CheckpointLoop],
    rules: &RaceRules,
) -> Result<Evaluation> {
    if tracks.is_empty() {
        return Err(anyhow!("evaluation needs at least one track"));
    }
    let mut cost = 0.0;
    let mut turns = 0.0;
    let mut finished = 0usize;
    for track in tracks {
        let mut pilot = HeuristicPilot::new("heuristic-candidate", "tuner candidate", config);
        let metrics = run_race(&mut pilot, track, rules)?.metrics;
        let owed = (rules.lap_target as usize * track.len())
            .saturating_sub(metrics.checkpoints_passed as usize);
        turns += f64::from(metrics.turns);
        cost += f64::from(metrics.turns);
        if metrics.finished {
            finished += 1;
        } else {
            cost += owed as f64 * MISSING_CHECKPOINT_COST;
        }
    }
    let n = tracks.len() as f64;
    Ok(Evaluation {
        config,
        cost: cost / n,
        finished_rate: finished as f64 / n,
        avg_turns: turns / n,
    })
}

pub fn run_tuner(config: TuneConfig) -> Result<TuneReport> {
    if config.seeds.is_empty() {
        return Err(anyhow!("tuner requires at least one seed"));
    }
    if config.samples_per_round == 0 {
        return Err(anyhow!("tuner --samples must be >= 1"));
    }
    if !(config.shrink > 0.0 && config.shrink <= 1.0) {
        return Err(anyhow!("tuner --shrink must be in (0, 1], got {}", config.shrink));
    }
    if config.jobs == Some(0) {
        return Err(anyhow!("tuner --jobs must be >= 1 when provided"));
    }

    let pool = match config.jobs {
        Some(jobs) => Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .context("failed to build rayon threadpool")?,
        ),
        None => None,
    };

    let tracks: Vec<CheckpointLoop> = config.seeds.iter().map(|s| generate_track(*s)).collect();
    let rules = config.rules;
    let baseline = evaluate(config.start, &tracks, &rules)?;
    let mut best = baseline;
    let mut search_box = SearchBox::full();
    let mut rng = SeededRng::new(config.rng_seed);
    let mut history = Vec::with_capacity(config.rounds as usize);

    tracing::info!(
        "tuner: seeds={} rounds={} samples={} baseline_cost={:.1}",
        config.seeds.len(),
        config.rounds,
        config.samples_per_round,
        baseline.cost
    );

    for round in 0..config.rounds {
        let candidates: Vec<HeuristicConfig> = (0..config.samples_per_round)
            .map(|_| search_box.sample(&mut rng))
            .collect();

        let score_all = || {
            candidates
                .par_iter()
                .map(|cfg| evaluate(*cfg, &tracks, &rules))
                .collect::<Result<Vec<_>>>()
        };
        let evaluations = match &pool {
            Some(pool) => pool.install(score_all)?,
            None => score_all()?,
        };

        let round_best = evaluations
            .into_iter()
            .min_by(|a, b| a.cost.total_cmp(&b.cost))
            .ok_or_else(|| anyhow!("round {round} produced no evaluations"))?;
        let improved = round_best.cost < best.cost;
        if improved {
            best = round_best;
        }
        tracing::info!(
            "round={} round_cost={:.1} best_cost={:.1} improved={}",
            round,
            round_best.cost,
            best.cost,
            improved
        );

        history.push(RoundRecord {
            round,
            search_box,
            round_best,
            improved,
        });
        search_box = search_box.shrink_around(&best.config, config.shrink);
    }

    Ok(TuneReport {
        generated_unix_s: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        seeds: config.seeds,
        rules,
        baseline,
        best,
        history,
    })
}

pub fn write_report(path: &Path, report: &TuneReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    let encoded = serde_json::to_vec_pretty(report).context("failed to serialize tune report")?;
    fs::write(path, encoded).with_context(|| format!("failed writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_shrinks_and_stays_inside_limits() {
        let best = HeuristicConfig {
            full_thrust: 195,
            slow_thrust: 10,
            slow_angle_deg: 90.0,
        };
        let shrunk = SearchBox::full().shrink_around(&best, 0.5);
        assert_eq!(shrunk.full_thrust, Interval { lo: 145.0, hi: 200.0 });
        assert_eq!(shrunk.slow_thrust, Interval { lo: 0.0, hi: 60.0 });
        assert_eq!(shrunk.slow_angle_deg, Interval { lo: 45.0, hi: 135.0 });
    }

    #[test]
    fn samples_land_inside_the_box() {
        let search_box = SearchBox::full().shrink_around(&HeuristicConfig::default(), 0.25);
        let mut rng = SeededRng::new(99);
        for _ in 0..200 {
            let cfg = search_box.sample(&mut rng);
            assert!(cfg.full_thrust as f64 >= search_box.full_thrust.lo.floor());
            assert!(cfg.full_thrust as f64 <= search_box.full_thrust.hi.ceil());
            assert!(cfg.slow_angle_deg >= search_box.slow_angle_deg.lo.floor());
            assert!(cfg.slow_angle_deg <= search_box.slow_angle_deg.hi.ceil());
        }
    }

    #[test]
    fn bad_settings_are_rejected() {
        let base = TuneConfig {
            seeds: vec![1],
            rounds: 1,
            samples_per_round: 1,
            shrink: 0.5,
            rng_seed: 1,
            rules: RaceRules::default(),
            start: HeuristicConfig::default(),
            jobs: None,
        };
        assert!(run_tuner(TuneConfig {
            seeds: Vec::new(),
            ..base.clone()
        })
        .is_err());
        assert!(run_tuner(TuneConfig {
            shrink: 0.0,
            ..base.clone()
        })
        .is_err());
        assert!(run_tuner(TuneConfig {
            samples_per_round: 0,
            ..base
        })
        .is_err());
    }
}
