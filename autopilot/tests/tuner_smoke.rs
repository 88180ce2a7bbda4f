use anyhow::Result;
use pod_autopilot::config::RaceRules;
use pod_autopilot::pilots::HeuristicConfig;
use pod_autopilot::tuner::{run_tuner, write_report, TuneConfig, TuneReport};

#[test]
fn tuner_never_reports_worse_than_baseline() -> Result<()> {
    let report = run_tuner(TuneConfig {
        seeds: vec![3, 4],
        rounds: 2,
        samples_per_round: 3,
        shrink: 0.5,
        rng_seed: 11,
        rules: RaceRules {
            lap_target: 1,
            turn_cap: 400,
        },
        start: HeuristicConfig::default(),
        jobs: Some(2),
    })?;

    assert_eq!(report.history.len(), 2);
    assert!(report.best.cost <= report.baseline.cost);
    let first = report.history[0].search_box;
    let second = report.history[1].search_box;
    let span = |i: pod_autopilot::tuner::Interval| i.hi - i.lo;
    assert!(span(second.slow_angle_deg) <= span(first.slow_angle_deg));

    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("tune.json");
    write_report(&path, &report)?;
    let back: TuneReport = serde_json::from_slice(&std::fs::read(&path)?)?;
    assert_eq!(back.history.len(), 2);
    assert_eq!(back.best.config, report.best.config);
    Ok(())
}
