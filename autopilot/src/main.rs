use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use pod_autopilot::benchmark::{resolve_pilots, run_benchmark, BenchmarkConfig};
use pod_autopilot::config::{PlannerConfig, RaceRules};
use pod_autopilot::driver::drive;
use pod_autopilot::pilots::{
    create_pilot, describe_pilots, pilot_ids, pilot_manifest_entries, BeamPilot, HeuristicConfig,
    Pilot, DEFAULT_PILOT,
};
use pod_autopilot::runner::{run_pilot, write_trace};
use pod_autopilot::tuner::{run_tuner, write_report, TuneConfig};
use pod_autopilot::util::{parse_seed, resolve_seeds, seed_to_hex};
use pod_race_core::track::generate_track;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(name = "pod-autopilot")]
#[command(about = "Beam-search pod racing autopilot with offline race, benchmark and tuning tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play against the judge over stdin/stdout
    Drive {
        #[arg(long, default_value = DEFAULT_PILOT)]
        pilot: String,
        /// Planner config JSON; replaces the roster profile and POD_* variables
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        beam_width: Option<usize>,
        #[arg(long)]
        max_depth: Option<u32>,
        /// Laps the judge runs; only used to report when the race is done
        #[arg(long)]
        laps: Option<u32>,
    },
    /// List available pilots
    ListPilots,
    /// Export the pilot manifest (including config fingerprints)
    Manifest {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run one offline race on a generated track
    Race {
        #[arg(long, default_value = DEFAULT_PILOT)]
        pilot: String,
        #[arg(long)]
        seed: String,
        #[arg(long)]
        laps: Option<u32>,
        #[arg(long)]
        turn_cap: Option<u32>,
        /// Write the track, controls and metrics as JSON
        #[arg(long)]
        trace: Option<PathBuf>,
    },
    /// Race pilots across many seeds and rank them
    Benchmark {
        #[arg(long)]
        pilots: Option<String>,
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long)]
        seed_file: Option<PathBuf>,
        #[arg(long)]
        seed_start: Option<String>,
        #[arg(long, default_value_t = 12)]
        seed_count: u32,
        #[arg(long)]
        laps: Option<u32>,
        #[arg(long)]
        turn_cap: Option<u32>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Random-search the heuristic pilot's thrust and angle parameters
    Tune {
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long)]
        seed_file: Option<PathBuf>,
        #[arg(long)]
        seed_start: Option<String>,
        #[arg(long, default_value_t = 16)]
        seed_count: u32,
        #[arg(long, default_value_t = 12)]
        rounds: u32,
        #[arg(long, default_value_t = 24)]
        samples: u32,
        #[arg(long, default_value_t = 0.7)]
        shrink: f64,
        #[arg(long, default_value = "0x7e57")]
        rng_seed: String,
        #[arg(long)]
        laps: Option<u32>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Print the track generated from a seed as JSON
    Track {
        #[arg(long)]
        seed: String,
    },
}

fn main() -> Result<()> {
    // stdout belongs to the judge protocol and reports; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    match Cli::parse().command {
        Commands::Drive {
            pilot,
            config,
            beam_width,
            max_depth,
            laps,
        } => {
            let pilot = build_drive_pilot(&pilot, config, beam_width, max_depth)?;
            let stdin = io::stdin();
            let stdout = io::stdout();
            drive(pilot, &race_rules(laps, None), stdin.lock(), stdout.lock())?;
        }
        Commands::ListPilots => {
            for (id, description) in describe_pilots() {
                println!("{id:12} {description}");
            }
        }
        Commands::Manifest { output } => {
            let manifest = pilot_manifest_entries()?;
            let encoded = serde_json::to_vec_pretty(&manifest)?;
            if let Some(path) = output {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, encoded)?;
                println!("wrote={}", path.display());
                println!("pilots={}", manifest.len());
            } else {
                println!("{}", String::from_utf8_lossy(&encoded));
            }
        }
        Commands::Race {
            pilot,
            seed,
            laps,
            turn_cap,
            trace,
        } => {
            ensure_known_pilot(&pilot)?;
            let seed = parse_seed(&seed)?;
            let rules = race_rules(laps, turn_cap);
            let artifact = run_pilot(&pilot, seed, &rules)?;
            let m = &artifact.metrics;

            println!("pilot={}", m.pilot_id);
            println!("pilot_fingerprint={}", m.pilot_fingerprint);
            println!("seed={}", seed_to_hex(seed));
            println!("checkpoints={}", m.checkpoint_count);
            println!("turns={}", m.turns);
            println!("laps={}/{}", m.laps, m.lap_target);
            println!("checkpoints_passed={}", m.checkpoints_passed);
            println!("finished={}", m.finished);
            println!("avg_plan_ms={:.3}", m.avg_plan_ms);
            println!("max_plan_ms={:.3}", m.max_plan_ms);
            println!("avg_search_depth={:.2}", m.avg_search_depth);
            println!("timed_out_turns={}", m.timed_out_turns);
            println!("prediction_mismatches={}", m.prediction_mismatches);
            if let Some(path) = trace {
                write_trace(&path, &artifact)?;
                println!("trace={}", path.display());
            }
        }
        Commands::Benchmark {
            pilots,
            seeds,
            seed_file,
            seed_start,
            seed_count,
            laps,
            turn_cap,
            out_dir,
            jobs,
        } => {
            let pilots = resolve_pilots(pilots.as_deref())?;
            for pilot in &pilots {
                ensure_known_pilot(pilot)?;
            }
            let seeds = resolve_seeds(
                seeds.as_deref(),
                seed_file.as_deref(),
                seed_start.as_deref(),
                seed_count,
            )?;
            let out_dir = out_dir
                .unwrap_or_else(|| PathBuf::from(format!("benchmarks/{}", timestamp_suffix())));

            let report = run_benchmark(BenchmarkConfig {
                pilots,
                seeds,
                rules: race_rules(laps, turn_cap),
                out_dir: out_dir.clone(),
                jobs,
            })?;

            println!("runs={}", report.run_count);
            println!(
                "jobs={}",
                report
                    .jobs
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "auto".to_string())
            );
            println!("out_dir={}", out_dir.display());
            println!("rankings:");
            for (idx, pilot) in report.pilot_rankings.iter().enumerate() {
                println!(
                    "  {}. {}  finished={:.0}% avg_turns={:.1} best_turns={} avg_checkpoints={:.1} avg_plan_ms={:.2} mismatches={}",
                    idx + 1,
                    pilot.pilot_id,
                    pilot.finished_rate * 100.0,
                    pilot.avg_turns,
                    pilot
                        .best_turns
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    pilot.avg_checkpoints,
                    pilot.avg_plan_ms,
                    pilot.prediction_mismatches,
                );
            }
        }
        Commands::Tune {
            seeds,
            seed_file,
            seed_start,
            seed_count,
            rounds,
            samples,
            shrink,
            rng_seed,
            laps,
            output,
            jobs,
        } => {
            let seeds = resolve_seeds(
                seeds.as_deref(),
                seed_file.as_deref(),
                seed_start.as_deref(),
                seed_count,
            )?;
            let report = run_tuner(TuneConfig {
                seeds,
                rounds,
                samples_per_round: samples,
                shrink,
                rng_seed: parse_seed(&rng_seed)?,
                rules: race_rules(laps, None),
                start: HeuristicConfig::default(),
                jobs,
            })?;
            let output = output
                .unwrap_or_else(|| PathBuf::from(format!("tuning/{}.json", timestamp_suffix())));
            write_report(&output, &report)?;

            println!(
                "baseline cost={:.1} finished={:.0}%",
                report.baseline.cost,
                report.baseline.finished_rate * 100.0
            );
            println!(
                "best cost={:.1} finished={:.0}% full_thrust={} slow_thrust={} slow_angle_deg={}",
                report.best.cost,
                report.best.finished_rate * 100.0,
                report.best.config.full_thrust,
                report.best.config.slow_thrust,
                report.best.config.slow_angle_deg
            );
            println!("output={}", output.display());
        }
        Commands::Track { seed } => {
            let seed = parse_seed(&seed)?;
            let track = generate_track(seed);
            println!("{}", serde_json::to_string_pretty(&track)?);
        }
    }

    Ok(())
}

fn ensure_known_pilot(id: &str) -> Result<()> {
    if pilot_ids().iter().any(|known| *known == id) {
        Ok(())
    } else {
        let available = pilot_ids().join(", ");
        Err(anyhow!("unknown pilot '{id}'. available: {available}"))
    }
}

/// Roster pilot, unless the planner is being configured from the outside.
fn build_drive_pilot(
    id: &str,
    config: Option<PathBuf>,
    beam_width: Option<usize>,
    max_depth: Option<u32>,
) -> Result<Box<dyn Pilot>> {
    let customised = config.is_some() || beam_width.is_some() || max_depth.is_some();
    if id != DEFAULT_PILOT && customised {
        tracing::warn!("planner overrides only apply to the {DEFAULT_PILOT} pilot; ignoring them");
    }
    if id != DEFAULT_PILOT || (!customised && !planner_env_set()) {
        return create_pilot(id).ok_or_else(|| {
            anyhow!("unknown pilot '{id}'. available: {}", pilot_ids().join(", "))
        });
    }

    let mut planner = match config {
        Some(path) => PlannerConfig::load(&path)?,
        None => PlannerConfig::from_env(),
    };
    if let Some(width) = beam_width {
        planner.beam_width = width;
    }
    if max_depth.is_some() {
        planner.max_depth = max_depth;
    }
    tracing::info!(
        "custom planner: beam_width={} max_depth={:?} budgets={}ms/{}ms",
        planner.beam_width,
        planner.max_depth,
        planner.first_turn_budget_ms,
        planner.turn_budget_ms
    );
    Ok(Box::new(BeamPilot::new(
        "beam-custom",
        "Beam search with a caller-supplied planner config.",
        planner,
    )?))
}

fn planner_env_set() -> bool {
    use pod_autopilot::config::{
        ENV_BEAM_WIDTH, ENV_FIRST_TURN_BUDGET_MS, ENV_MAX_DEPTH, ENV_TURN_BUDGET_MS,
    };
    [
        ENV_BEAM_WIDTH,
        ENV_FIRST_TURN_BUDGET_MS,
        ENV_TURN_BUDGET_MS,
        ENV_MAX_DEPTH,
    ]
    .iter()
    .any(|name| std::env::var_os(name).is_some())
}

fn race_rules(laps: Option<u32>, turn_cap: Option<u32>) -> RaceRules {
    let mut rules = RaceRules::from_env();
    if let Some(laps) = laps {
        rules.lap_target = laps;
    }
    if let Some(cap) = turn_cap {
        rules.turn_cap = cap;
    }
    rules
}

fn timestamp_suffix() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{now}")
}
