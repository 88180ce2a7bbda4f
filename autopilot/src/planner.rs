//! Time-bounded beam search over the discrete action grid.
//!
//! Each generation expands every surviving trajectory by every action,
//! drops children whose canonical hash already appeared in that generation,
//! scores the rest and keeps the best `beam_width`. Only the first move of
//! the winning trajectory is returned.

use crate::config::PlannerConfig;
use crate::error::PlanError;
use pod_race_core::dedup::state_hash;
use pod_race_core::{Action, CheckpointLoop, Control, RaceState, Vehicle};
use std::collections::HashSet;
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decision {
    pub action: Action,
    /// `action` resolved against the observed heading.
    pub control: Control,
    /// Where the vehicle should be after `control`, for cross-checking.
    pub predicted: Vehicle,
    pub score: f64,
    /// Generations fully committed to the population.
    pub depth: u32,
    /// Children simulated, including the ones pruned as duplicates.
    pub evaluated: u64,
    pub timed_out: bool,
}

#[derive(Clone, Copy, Debug)]
struct Trajectory {
    /// `None` only for the unexpanded root copies.
    first: Option<(Action, Vehicle)>,
    state: RaceState,
    score: f64,
}

impl Trajectory {
    fn root(state: RaceState) -> Self {
        Self {
            first: None,
            state,
            score: f64::NAN,
        }
    }
}

/// `passed * weight - distance`. With `weight` above any reachable distance,
/// more checkpoints always wins.
#[inline]
pub fn score_state(state: &RaceState, track: &CheckpointLoop, progress_weight: f64) -> f64 {
    state.checkpoints_passed as f64 * progress_weight - state.distance_to_next(track)
}

pub struct BeamPlanner {
    config: PlannerConfig,
    actions: Vec<Action>,
    population: Vec<Trajectory>,
    candidates: Vec<Trajectory>,
    seen: HashSet<u64>,
}

impl BeamPlanner {
    pub fn new(config: PlannerConfig) -> Result<Self, PlanError> {
        if config.beam_width == 0 {
            return Err(PlanError::ZeroBeamWidth);
        }
        let actions = config.action_set();
        if actions.is_empty() {
            return Err(PlanError::EmptyActionSet);
        }
        if !config.wall_clock && config.max_depth.is_none() {
            return Err(PlanError::Unbounded);
        }

        let width = config.beam_width;
        let fanout = width.saturating_mul(actions.len());
        Ok(Self {
            population: Vec::with_capacity(width),
            candidates: Vec::with_capacity(fanout),
            seen: HashSet::with_capacity(fanout),
            actions,
            config,
        })
    }

    /// Plan for `turn`, bounded by that turn's budget.
    pub fn plan(
        &mut self,
        turn: u32,
        track: &CheckpointLoop,
        observed: &RaceState,
    ) -> Result<Decision, PlanError> {
        let deadline = self
            .config
            .wall_clock
            .then(|| Instant::now() + self.config.budget_for_turn(turn));
        self.plan_until(track, observed, deadline)
    }

    /// Plan with an explicit deadline. `None` runs to `max_depth`.
    ///
    /// Generation 0 always completes, so a decision exists even when the
    /// deadline has already passed.
    pub fn plan_until(
        &mut self,
        track: &CheckpointLoop,
        observed: &RaceState,
        deadline: Option<Instant>,
    ) -> Result<Decision, PlanError> {
        let root = RaceState::observed(
            track,
            observed.vehicle,
            observed.next_checkpoint,
            observed.laps_completed,
        )?;

        let width = self.config.beam_width;
        let weight = self.config.progress_weight;
        let max_depth = self.config.max_depth;
        let expired = || deadline.is_some_and(|d| Instant::now() >= d);

        self.population.clear();
        self.population
            .extend(std::iter::repeat_n(Trajectory::root(root), width));

        let mut depth = 0u32;
        let mut evaluated = 0u64;
        let mut timed_out = false;

        loop {
            if depth > 0 && max_depth.is_some_and(|max| depth >= max) {
                break;
            }

            self.candidates.clear();
            self.seen.clear();
            let mut interrupted = false;
            let last = self.population.len().saturating_sub(1);

            for (idx, parent) in self.population.iter().enumerate() {
                for action in &self.actions {
                    let control = action.control_from(parent.state.vehicle.heading_deg);
                    let state = parent.state.apply(track, control);
                    evaluated += 1;

                    if !state.vehicle.is_finite() || !self.seen.insert(state_hash(&state)) {
                        continue;
                    }
                    let first = parent.first.unwrap_or((*action, state.vehicle));
                    self.candidates.push(Trajectory {
                        first: Some(first),
                        state,
                        score: score_state(&state, track, weight),
                    });
                }

                // Never leave a generation half-built: either the whole
                // population was expanded, or this generation is dropped.
                if depth > 0 && idx < last && expired() {
                    interrupted = true;
                    break;
                }
            }

            if interrupted {
                timed_out = true;
                break;
            }
            if self.candidates.is_empty() {
                if depth == 0 {
                    return Err(PlanError::NoCandidate);
                }
                break;
            }

            // Stable: equal scores keep expansion order.
            self.candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
            self.candidates.truncate(width);
            std::mem::swap(&mut self.population, &mut self.candidates);
            depth += 1;

            if expired() {
                timed_out = true;
                break;
            }
        }

        let best = self.population.first().ok_or(PlanError::NoCandidate)?;
        let (action, predicted) = best.first.ok_or(PlanError::NoCandidate)?;
        Ok(Decision {
            action,
            control: action.control_from(root.vehicle.heading_deg),
            predicted,
            score: best.score,
            depth,
            evaluated,
            timed_out,
        })
    }
}
