//! Pilots × track seeds, raced in parallel and ranked.

use crate::config::RaceRules;
use crate::pilots::pilot_ids;
use crate::runner::{run_pilot, RaceMetrics};
use crate::util::seed_to_hex;
use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub pilots: Vec<String>,
    pub seeds: Vec<u32>,
    pub rules: RaceRules,
    pub out_dir: PathBuf,
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    pub pilot_id: String,
    pub pilot_fingerprint: String,
    pub seed: u32,
    pub seed_hex: String,
    pub checkpoint_count: usize,
    pub turns: u32,
    pub laps: u32,
    pub checkpoints_passed: u32,
    pub finished: bool,
    pub avg_plan_ms: f64,
    pub max_plan_ms: f64,
    pub prediction_mismatches: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PilotAggregate {
    pub pilot_id: String,
    pub pilot_fingerprint: String,
    pub runs: usize,
    pub finished_rate: f64,
    pub avg_turns: f64,
    /// Fastest finished race, if any finished.
    pub best_turns: Option<u32>,
    pub avg_checkpoints: f64,
    pub avg_plan_ms: f64,
    pub max_plan_ms: f64,
    pub prediction_mismatches: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub generated_unix_s: u64,
    pub rules: RaceRules,
    pub jobs: Option<usize>,
    pub pilots: Vec<String>,
    pub seeds: Vec<u32>,
    pub run_count: usize,
    pub pilot_rankings: Vec<PilotAggregate>,
    pub runs: Vec<RunRecord>,
}

pub fn resolve_pilots(input: Option<&str>) -> Result<Vec<String>> {
    let Some(raw) = input else {
        return Ok(pilot_ids().iter().map(|id| (*id).to_string()).collect());
    };
    let pilots: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect();
    if pilots.is_empty() {
        return Err(anyhow!("--pilots resolved to empty list"));
    }
    Ok(pilots)
}

pub fn run_benchmark(config: BenchmarkConfig) -> Result<BenchmarkReport> {
    if config.seeds.is_empty() {
        return Err(anyhow!("benchmark requires at least one seed"));
    }
    if config.pilots.is_empty() {
        return Err(anyhow!("benchmark requires at least one pilot"));
    }
    if config.jobs == Some(0) {
        return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
    }
    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("failed creating {}", config.out_dir.display()))?;

    let run_jobs: Vec<(String, u32)> = config
        .pilots
        .iter()
        .flat_map(|pilot| config.seeds.iter().map(move |seed| (pilot.clone(), *seed)))
        .collect();
    tracing::info!(
        "benchmark: pilots={} seeds={} runs={}",
        config.pilots.len(),
        config.seeds.len(),
        run_jobs.len()
    );

    let rules = config.rules;
    let run_one = |(pilot_id, seed): &(String, u32)| -> Result<RaceMetrics> {
        let artifact = run_pilot(pilot_id, *seed, &rules)
            .with_context(|| format!("benchmark run failed for pilot={pilot_id} seed={seed:#x}"))?;
        Ok(artifact.metrics)
    };

    let results: Vec<Result<RaceMetrics>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| run_jobs.par_iter().map(run_one).collect())
    } else {
        run_jobs.par_iter().map(run_one).collect()
    };
    let runs = results.into_iter().collect::<Result<Vec<_>>>()?;

    let mut rankings = aggregate(&runs);
    rankings.sort_by(|a, b| {
        b.finished_rate
            .total_cmp(&a.finished_rate)
            .then_with(|| a.avg_turns.total_cmp(&b.avg_turns))
            .then_with(|| a.pilot_id.cmp(&b.pilot_id))
    });

    let mut run_records: Vec<RunRecord> = runs
        .iter()
        .map(|m| {
            let seed = m.seed.unwrap_or_default();
            RunRecord {
                pilot_id: m.pilot_id.clone(),
                pilot_fingerprint: m.pilot_fingerprint.clone(),
                seed,
                seed_hex: seed_to_hex(seed),
                checkpoint_count: m.checkpoint_count,
                turns: m.turns,
                laps: m.laps,
                checkpoints_passed: m.checkpoints_passed,
                finished: m.finished,
                avg_plan_ms: m.avg_plan_ms,
                max_plan_ms: m.max_plan_ms,
                prediction_mismatches: m.prediction_mismatches,
            }
        })
        .collect();
    run_records.sort_by(|a, b| {
        b.finished
            .cmp(&a.finished)
            .then_with(|| a.turns.cmp(&b.turns))
            .then_with(|| a.pilot_id.cmp(&b.pilot_id))
            .then_with(|| a.seed.cmp(&b.seed))
    });

    write_runs_csv(&config.out_dir.join("runs.csv"), &run_records)?;
    write_rankings_csv(&config.out_dir.join("rankings.csv"), &rankings)?;

    let report = BenchmarkReport {
        generated_unix_s: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        rules: config.rules,
        jobs: config.jobs,
        pilots: config.pilots,
        seeds: config.seeds,
        run_count: run_records.len(),
        pilot_rankings: rankings,
        runs: run_records,
    };

    let report_path = config.out_dir.join("summary.json");
    fs::write(
        &report_path,
        serde_json::to_vec_pretty(&report).context("failed to serialize summary json")?,
    )
    .with_context(|| format!("failed writing {}", report_path.display()))?;

    Ok(report)
}

fn aggregate(runs: &[RaceMetrics]) -> Vec<PilotAggregate> {
    let mut grouped: BTreeMap<&str, Vec<&RaceMetrics>> = BTreeMap::new();
    for run in runs {
        grouped.entry(run.pilot_id.as_str()).or_default().push(run);
    }

    grouped
        .into_iter()
        .map(|(pilot_id, pilot_runs)| {
            let n = pilot_runs.len() as f64;
            let finished = pilot_runs.iter().filter(|r| r.finished).count();
            PilotAggregate {
                pilot_id: pilot_id.to_string(),
                pilot_fingerprint: pilot_runs
                    .first()
                    .map(|r| r.pilot_fingerprint.clone())
                    .unwrap_or_else(|| "unknown".to_string()),
                runs: pilot_runs.len(),
                finished_rate: finished as f64 / n,
                avg_turns: pilot_runs.iter().map(|r| f64::from(r.turns)).sum::<f64>() / n,
                best_turns: pilot_runs
                    .iter()
                    .filter(|r| r.finished)
                    .map(|r| r.turns)
                    .min(),
                avg_checkpoints: pilot_runs
                    .iter()
                    .map(|r| f64::from(r.checkpoints_passed))
                    .sum::<f64>()
                    / n,
                avg_plan_ms: pilot_runs.iter().map(|r| r.avg_plan_ms).sum::<f64>() / n,
                max_plan_ms: pilot_runs
                    .iter()
                    .map(|r| r.max_plan_ms)
                    .fold(0.0, f64::max),
                prediction_mismatches: pilot_runs.iter().map(|r| r.prediction_mismatches).sum(),
            }
        })
        .collect()
}

fn write_runs_csv(path: &Path, rows: &[RunRecord]) -> Result<()> {
    let mut csv = String::from(
        "pilot_id,pilot_fingerprint,seed_hex,seed,checkpoint_count,turns,laps,checkpoints_passed,finished,avg_plan_ms,max_plan_ms,prediction_mismatches\n",
    );
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{:.3},{:.3},{}\n",
            row.pilot_id,
            row.pilot_fingerprint,
            row.seed_hex,
            row.seed,
            row.checkpoint_count,
            row.turns,
            row.laps,
            row.checkpoints_passed,
            row.finished,
            row.avg_plan_ms,
            row.max_plan_ms,
            row.prediction_mismatches
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}

fn write_rankings_csv(path: &Path, rows: &[PilotAggregate]) -> Result<()> {
    let mut csv = String::from(
        "rank,pilot_id,pilot_fingerprint,runs,finished_rate,avg_turns,best_turns,avg_checkpoints,avg_plan_ms,max_plan_ms,prediction_mismatches\n",
    );
    for (idx, row) in rows.iter().enumerate() {
        let best = row
            .best_turns
            .map(|t| t.to_string())
            .unwrap_or_default();
        csv.push_str(&format!(
            "{},{},{},{},{:.4},{:.2},{},{:.2},{:.3},{:.3},{}\n",
            idx + 1,
            row.pilot_id,
            row.pilot_fingerprint,
            row.runs,
            row.finished_rate,
            row.avg_turns,
            best,
            row.avg_checkpoints,
            row.avg_plan_ms,
            row.max_plan_ms,
            row.prediction_mismatches
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}
