use super::*;

pub const DEFAULT_PILOT: &str = "beam";

#[derive(Clone, Copy, Debug)]
struct BeamProfile {
    id: &'static str,
    description: &'static str,
    beam_width: usize,
    max_depth: Option<u32>,
    wall_clock: bool,
}

impl BeamProfile {
    fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            beam_width: self.beam_width,
            max_depth: self.max_depth,
            wall_clock: self.wall_clock,
            ..PlannerConfig::default()
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct HeuristicProfile {
    id: &'static str,
    description: &'static str,
    cfg: HeuristicConfig,
}

fn beam_profiles() -> &'static [BeamProfile] {
    &[
        BeamProfile {
            id: "beam",
            description: "Wall-clock beam search with the judge's turn budgets.",
            beam_width: crate::config::DEFAULT_BEAM_WIDTH,
            max_depth: None,
            wall_clock: true,
        },
        BeamProfile {
            id: "beam-wide",
            description: "Wider, shallower beam under the same budgets.",
            beam_width: 600,
            max_depth: None,
            wall_clock: true,
        },
        BeamProfile {
            id: "beam-fixed",
            description: "Depth-limited beam with no clock; reproducible across machines.",
            beam_width: 60,
            max_depth: Some(8),
            wall_clock: false,
        },
    ]
}

fn heuristic_profiles() -> &'static [HeuristicProfile] {
    &[HeuristicProfile {
        id: "heuristic",
        description: "Aim at the next checkpoint, back off thrust while drifting.",
        cfg: HeuristicConfig {
            full_thrust: 200,
            slow_thrust: 80,
            slow_angle_deg: 10.0,
        },
    }]
}

pub fn pilot_ids() -> Vec<&'static str> {
    let mut ids: Vec<&'static str> = beam_profiles().iter().map(|p| p.id).collect();
    ids.extend(heuristic_profiles().iter().map(|p| p.id));
    ids
}

pub fn describe_pilots() -> Vec<(&'static str, &'static str)> {
    let mut out: Vec<(&'static str, &'static str)> = beam_profiles()
        .iter()
        .map(|p| (p.id, p.description))
        .collect();
    out.extend(heuristic_profiles().iter().map(|p| (p.id, p.description)));
    out
}

pub fn create_pilot(id: &str) -> Option<Box<dyn Pilot>> {
    if let Some(profile) = beam_profiles().iter().find(|p| p.id == id) {
        return match BeamPilot::new(profile.id, profile.description, profile.planner_config()) {
            Ok(pilot) => Some(Box::new(pilot)),
            Err(err) => {
                tracing::error!("roster profile {} is invalid: {err}", profile.id);
                None
            }
        };
    }
    if let Some(profile) = heuristic_profiles().iter().find(|p| p.id == id) {
        return Some(Box::new(HeuristicPilot::new(
            profile.id,
            profile.description,
            profile.cfg,
        )));
    }
    None
}

pub fn pilot_manifest_entries() -> serde_json::Result<Vec<PilotManifestEntry>> {
    let mut out = Vec::new();

    for profile in beam_profiles() {
        let config = serde_json::to_value(profile.planner_config())?;
        out.push(PilotManifestEntry {
            id: profile.id.to_string(),
            family: "beam".to_string(),
            description: profile.description.to_string(),
            config_hash: hash_json(&config),
            config,
        });
    }

    for profile in heuristic_profiles() {
        let config = serde_json::to_value(profile.cfg)?;
        out.push(PilotManifestEntry {
            id: profile.id.to_string(),
            family: "heuristic".to_string(),
            description: profile.description.to_string(),
            config_hash: hash_json(&config),
            config,
        });
    }

    Ok(out)
}

/// Config hash of a roster pilot; `None` for ids outside the roster.
pub fn pilot_fingerprint(id: &str) -> serde_json::Result<Option<String>> {
    Ok(pilot_manifest_entries()?
        .into_iter()
        .find(|entry| entry.id == id)
        .map(|entry| entry.config_hash))
}
