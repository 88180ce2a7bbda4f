//! Line protocol spoken with the match judge.
//!
//! Input: the checkpoint count, one `x y` line per checkpoint, then one
//! `checkpointIndex x y vx vy angle` line per turn. Output: one
//! `X Y THRUST message` line per turn.

use crate::config::RaceRules;
use crate::pilots::Pilot;
use anyhow::{anyhow, bail, Context, Result};
use pod_race_core::angle::to_radians;
use pod_race_core::constants::CHECKPOINT_RADIUS;
use pod_race_core::{CheckpointLoop, Control, Coord, RaceState, Vector, Vehicle};
use std::io::{BufRead, Write};

/// How far along the planned heading the emitted target point sits. Far
/// enough that rounding it to integers does not move the heading.
pub const AIM_DISTANCE: f64 = 100_000.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurnInput {
    pub next_checkpoint: usize,
    pub vehicle: Vehicle,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriveSummary {
    pub turns: u32,
    pub fallbacks: u32,
    pub laps: u32,
    /// The inferred lap count reached the lap target.
    pub finished: bool,
}

fn parse_fields<const N: usize>(line: &str, what: &str) -> Result<[i64; N]> {
    let mut out = [0i64; N];
    let mut tokens = line.split_whitespace();
    for (idx, slot) in out.iter_mut().enumerate() {
        let token = tokens
            .next()
            .ok_or_else(|| anyhow!("{what}: expected {N} fields, got {idx} in {line:?}"))?;
        *slot = token
            .parse::<i64>()
            .with_context(|| format!("{what}: bad integer {token:?}"))?;
    }
    if tokens.next().is_some() {
        bail!("{what}: expected {N} fields in {line:?}");
    }
    Ok(out)
}

fn next_line<R: BufRead>(input: &mut R, what: &str) -> Result<Option<String>> {
    let mut line = String::new();
    loop {
        line.clear();
        let read = input
            .read_line(&mut line)
            .with_context(|| format!("failed reading {what}"))?;
        if read == 0 {
            return Ok(None);
        }
        if !line.trim().is_empty() {
            return Ok(Some(line));
        }
    }
}

pub fn read_track<R: BufRead>(input: &mut R) -> Result<CheckpointLoop> {
    let header = next_line(input, "checkpoint count")?
        .ok_or_else(|| anyhow!("input ended before the checkpoint count"))?;
    let [count] = parse_fields::<1>(&header, "checkpoint count")?;
    if count <= 0 {
        bail!("checkpoint count must be positive, got {count}");
    }

    let mut checkpoints = Vec::with_capacity(count as usize);
    for idx in 0..count {
        let line = next_line(input, "checkpoint")?
            .ok_or_else(|| anyhow!("input ended after {idx} of {count} checkpoints"))?;
        let [x, y] = parse_fields::<2>(&line, "checkpoint")?;
        checkpoints.push(Coord::new(x as f64, y as f64));
    }
    Ok(CheckpointLoop::new(checkpoints)?)
}

pub fn parse_turn(line: &str) -> Result<TurnInput> {
    let [index, x, y, vx, vy, angle] = parse_fields::<6>(line, "turn")?;
    let next_checkpoint =
        usize::try_from(index).map_err(|_| anyhow!("negative checkpoint index {index}"))?;
    Ok(TurnInput {
        next_checkpoint,
        vehicle: Vehicle::new(
            Coord::new(x as f64, y as f64),
            Vector::new(vx as f64, vy as f64),
            angle as f64,
        ),
    })
}

/// `X Y THRUST message`, aiming far out along the requested heading.
pub fn format_command(position: Coord, control: Control, message: &str) -> String {
    let direction = Vector::from_angle(to_radians(control.heading_deg));
    let aim = position.displaced(direction.scale(AIM_DISTANCE));
    format!(
        "{} {} {} {}",
        aim.x.round() as i64,
        aim.y.round() as i64,
        control.thrust,
        message
    )
}

pub struct TurnDriver {
    pilot: Box<dyn Pilot>,
    track: CheckpointLoop,
    lap_target: u32,
    turn: u32,
    laps: u32,
    previous_index: Option<usize>,
    last_good: Option<Control>,
    fallbacks: u32,
}

impl TurnDriver {
    pub fn new(mut pilot: Box<dyn Pilot>, track: CheckpointLoop, rules: &RaceRules) -> Self {
        pilot.reset();
        Self {
            pilot,
            track,
            lap_target: rules.lap_target,
            turn: 0,
            laps: 0,
            previous_index: None,
            last_good: None,
            fallbacks: 0,
        }
    }

    /// Whether checkpoint 0 was captured on the tick that led to `input`.
    ///
    /// The judge only reports the next index. Leaving index 0 means
    /// checkpoint 0 was just crossed. On a one-checkpoint loop the index
    /// never moves, so a capture shows up as ending the tick inside the
    /// capture radius.
    fn crossed_start(&self, input: &TurnInput) -> bool {
        if self.track.len() == 1 {
            let inside = self.track.get(0).is_some_and(|start| {
                input.vehicle.position.distance(&start) <= CHECKPOINT_RADIUS
            });
            return self.turn > 0 && inside;
        }
        self.previous_index == Some(0) && input.next_checkpoint != 0
    }

    pub fn is_finished(&self) -> bool {
        self.laps >= self.lap_target
    }

    /// One protocol turn. Malformed observations are fatal; pilot failures
    /// degrade to the last good control, or to coasting on the current
    /// heading.
    pub fn step(&mut self, input: TurnInput) -> Result<String> {
        if self.crossed_start(&input) {
            self.laps += 1;
            if self.laps == self.lap_target {
                tracing::info!("turn={} lap target reached: laps={}", self.turn, self.laps);
            }
        }
        self.previous_index = Some(input.next_checkpoint);

        let observed =
            RaceState::observed(&self.track, input.vehicle, input.next_checkpoint, self.laps)
                .with_context(|| format!("invalid observation on turn {}", self.turn))?;

        let (control, message) = match self.pilot.next_control(self.turn, &self.track, &observed) {
            Ok(chosen) => {
                if let Some(d) = chosen.decision {
                    tracing::debug!(
                        "turn={} depth={} evaluated={} score={:.1} timed_out={}",
                        self.turn,
                        d.depth,
                        d.evaluated,
                        d.score,
                        d.timed_out
                    );
                }
                self.last_good = Some(chosen.control);
                (chosen.control, format!("d{}", chosen.decision.map_or(0, |d| d.depth)))
            }
            Err(err) => {
                self.fallbacks += 1;
                let control = self
                    .last_good
                    .unwrap_or_else(|| Control::hold(observed.vehicle.heading_deg));
                tracing::warn!("turn={} pilot failed, falling back: {err}", self.turn);
                (control, "fallback".to_string())
            }
        };

        self.turn += 1;
        Ok(format_command(observed.vehicle.position, control, &message))
    }

    pub fn summary(&self) -> DriveSummary {
        DriveSummary {
            turns: self.turn,
            fallbacks: self.fallbacks,
            laps: self.laps,
            finished: self.is_finished(),
        }
    }
}

/// Drive until the judge closes the input.
pub fn drive<R: BufRead, W: Write>(
    pilot: Box<dyn Pilot>,
    rules: &RaceRules,
    mut input: R,
    mut output: W,
) -> Result<DriveSummary> {
    let track = read_track(&mut input)?;
    tracing::info!(
        "track loaded: checkpoints={} pilot={}",
        track.len(),
        pilot.id()
    );

    let mut driver = TurnDriver::new(pilot, track, rules);
    while let Some(line) = next_line(&mut input, "turn")? {
        let turn = parse_turn(&line)?;
        let command = driver.step(turn)?;
        writeln!(output, "{command}").context("failed writing command")?;
        output.flush().context("failed flushing command")?;
    }

    let summary = driver.summary();
    tracing::info!(
        "input closed: turns={} fallbacks={} laps={} finished={}",
        summary.turns,
        summary.fallbacks,
        summary.laps,
        summary.finished
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanError;
    use crate::pilots::PilotMove;
    use std::io::Cursor;

    struct Failing;

    impl Pilot for Failing {
        fn id(&self) -> &'static str {
            "failing"
        }
        fn description(&self) -> &'static str {
            "always errors"
        }
        fn reset(&mut self) {}
        fn next_control(
            &mut self,
            _turn: u32,
            _track: &CheckpointLoop,
            _observed: &RaceState,
        ) -> Result<PilotMove, PlanError> {
            Err(PlanError::NoCandidate)
        }
    }

    #[test]
    fn reads_a_track() {
        let mut input = Cursor::new("3\n1000 1000\n\n9000 1000\n9000 7000\n");
        let track = read_track(&mut input).expect("track");
        assert_eq!(track.len(), 3);
        assert_eq!(track.get(2), Some(Coord::new(9000.0, 7000.0)));
    }

    #[test]
    fn malformed_input_is_fatal() {
        assert!(read_track(&mut Cursor::new("")).is_err());
        assert!(read_track(&mut Cursor::new("0\n")).is_err());
        assert!(read_track(&mut Cursor::new("2\n1 2\n")).is_err());
        assert!(read_track(&mut Cursor::new("1\n1 two\n")).is_err());
        assert!(parse_turn("1 2 3 4 5").is_err());
        assert!(parse_turn("1 2 3 4 5 6 7").is_err());
        assert!(parse_turn("-1 2 3 4 5 6").is_err());
    }

    #[test]
    fn turn_heading_is_normalized() {
        let turn = parse_turn("1 100 200 -3 4 270").expect("turn");
        assert_eq!(turn.next_checkpoint, 1);
        assert_eq!(turn.vehicle.heading_deg, -90.0);
        assert_eq!(turn.vehicle.velocity, Vector::new(-3.0, 4.0));
    }

    #[test]
    fn command_aims_along_the_heading() {
        let down = Control {
            heading_deg: 90.0,
            thrust: 150,
        };
        assert_eq!(format_command(Coord::new(100.0, 200.0), down, "hi"), "100 100200 150 hi");
        let cmd = format_command(Coord::new(0.0, 0.0), Control::hold(0.0), "x");
        assert_eq!(cmd, "100000 0 0 x");
    }

    #[test]
    fn pilot_failure_falls_back_to_hold() {
        let track = CheckpointLoop::new(vec![Coord::new(0.0, 0.0), Coord::new(5000.0, 0.0)])
            .expect("track");
        let mut driver = TurnDriver::new(Box::new(Failing), track, &RaceRules::default());
        let cmd = driver
            .step(parse_turn("1 1000 0 0 0 0").expect("turn"))
            .expect("fallback command");
        assert_eq!(cmd, "101000 0 0 fallback");
        assert_eq!(driver.summary().fallbacks, 1);
    }

    #[test]
    fn out_of_range_index_is_fatal() {
        let track = CheckpointLoop::new(vec![Coord::new(0.0, 0.0), Coord::new(5000.0, 0.0)])
            .expect("track");
        let mut driver = TurnDriver::new(Box::new(Failing), track, &RaceRules::default());
        assert!(driver.step(parse_turn("2 0 0 0 0 0").expect("turn")).is_err());
    }

    #[test]
    fn laps_count_when_leaving_checkpoint_zero() {
        let track = CheckpointLoop::new(vec![Coord::new(0.0, 0.0), Coord::new(5000.0, 0.0)])
            .expect("track");
        let mut driver = TurnDriver::new(Box::new(Failing), track, &RaceRules::default());
        let lines = [
            "0 1000 0 0 0 0",
            "0 900 0 0 0 0",
            "1 0 0 0 0 0",
            "0 4000 0 0 0 0",
            "1 0 0 0 0 0",
        ];
        for line in lines {
            driver.step(parse_turn(line).expect("turn")).expect("step");
        }
        assert_eq!(driver.summary().laps, 2);
        assert_eq!(driver.summary().turns, 5);
        assert!(!driver.summary().finished);
    }

    #[test]
    fn single_checkpoint_laps_count_on_capture() {
        let track = CheckpointLoop::new(vec![Coord::new(3000.0, 3000.0)]).expect("track");
        let rules = RaceRules {
            lap_target: 2,
            ..RaceRules::default()
        };
        let mut driver = TurnDriver::new(Box::new(Failing), track, &rules);
        let lines = [
            // Spawning inside the radius is not a capture.
            "0 3100 3000 0 0 0",
            "0 5000 3000 0 0 0",
            "0 3500 3000 0 0 0",
        ];
        for line in lines {
            driver.step(parse_turn(line).expect("turn")).expect("step");
        }
        assert_eq!(driver.summary().laps, 1);
        assert!(!driver.is_finished());

        driver.step(parse_turn("0 2500 3000 0 0 0").expect("turn")).expect("step");
        let summary = driver.summary();
        assert_eq!(summary.laps, 2);
        assert!(summary.finished);
    }
}
