use anyhow::Result;
use pod_autopilot::benchmark::{resolve_pilots, run_benchmark, BenchmarkConfig};
use pod_autopilot::config::RaceRules;

#[test]
fn benchmark_smoke_outputs_expected_files() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let report = run_benchmark(BenchmarkConfig {
        pilots: vec!["beam-fixed".to_string(), "heuristic".to_string()],
        seeds: vec![0xDEAD_BEEF, 0xC0FF_EE11],
        rules: RaceRules {
            lap_target: 1,
            turn_cap: 300,
        },
        out_dir: tmp.path().to_path_buf(),
        jobs: Some(2),
    })?;

    assert_eq!(report.run_count, 4);
    assert_eq!(report.pilot_rankings.len(), 2);
    for ranking in &report.pilot_rankings {
        assert_eq!(ranking.runs, 2);
        assert!(ranking.pilot_fingerprint.starts_with("crc32:"));
        assert_eq!(ranking.prediction_mismatches, 0);
    }
    assert!(tmp.path().join("summary.json").exists());

    let runs_csv = std::fs::read_to_string(tmp.path().join("runs.csv"))?;
    assert_eq!(runs_csv.lines().count(), 5);
    let rankings_csv = std::fs::read_to_string(tmp.path().join("rankings.csv"))?;
    assert_eq!(rankings_csv.lines().count(), 3);
    assert!(rankings_csv.lines().nth(1).is_some_and(|l| l.starts_with("1,")));
    Ok(())
}

#[test]
fn benchmark_rejects_empty_inputs() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let base = BenchmarkConfig {
        pilots: vec!["heuristic".to_string()],
        seeds: vec![1],
        rules: RaceRules::default(),
        out_dir: tmp.path().to_path_buf(),
        jobs: None,
    };
    assert!(run_benchmark(BenchmarkConfig {
        seeds: Vec::new(),
        ..base.clone()
    })
    .is_err());
    assert!(run_benchmark(BenchmarkConfig {
        jobs: Some(0),
        ..base
    })
    .is_err());
}

#[test]
fn pilot_list_parsing() -> Result<()> {
    assert_eq!(resolve_pilots(Some(" beam, heuristic ,"))?, vec!["beam", "heuristic"]);
    assert!(resolve_pilots(Some(" , ")).is_err());
    assert!(resolve_pilots(None)?.len() >= 4);
    Ok(())
}
