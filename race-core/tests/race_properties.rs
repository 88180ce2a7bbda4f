use pod_race_core::angle::{angle_difference, normalize, restrict_turn, to_radians};
use pod_race_core::dedup::state_hash;
use pod_race_core::track::{generate_track, spawn_state};
use pod_race_core::{apply_action, CheckpointLoop, Control, Coord, RaceState, Vector, Vehicle};

fn steer_at_target(state: &RaceState, track: &CheckpointLoop) -> Control {
    let target = state.target(track);
    let bearing = state.vehicle.position.vector_to(&target).angle();
    Control {
        heading_deg: bearing.to_degrees(),
        thrust: 100,
    }
}

#[test]
fn shuttling_between_two_checkpoints_completes_laps() {
    let track = CheckpointLoop::new(vec![Coord::new(2000.0, 4500.0), Coord::new(8000.0, 4500.0)])
        .expect("valid track");
    let mut state = spawn_state(&track);
    assert_eq!(state.vehicle.heading_deg, 0.0);

    let mut turns = 0;
    while !state.is_finished(2) {
        state = apply_action(&track, &state, steer_at_target(&state, &track));
        turns += 1;
        assert!(turns < 2_000, "no progress after {turns} turns: {state:?}");
    }

    assert_eq!(state.laps_completed, 2);
    assert_eq!(state.next_checkpoint, 1);
    // Spawn sits on checkpoint 0 but targets 1, so each lap is two captures.
    assert_eq!(state.checkpoints_passed, 4);
}

#[test]
fn replaying_a_race_is_bit_identical() {
    let track = generate_track(2024);
    let run = || {
        let mut state = spawn_state(&track);
        let mut hashes = Vec::new();
        for _ in 0..300 {
            state = apply_action(&track, &state, steer_at_target(&state, &track));
            hashes.push(state_hash(&state));
        }
        (state, hashes)
    };
    let (a, ha) = run();
    let (b, hb) = run();
    assert_eq!(ha, hb);
    assert_eq!(a.vehicle.position.x.to_bits(), b.vehicle.position.x.to_bits());
    assert_eq!(a.vehicle.velocity.y.to_bits(), b.vehicle.velocity.y.to_bits());
}

#[test]
fn every_tick_leaves_integer_components() {
    let track = generate_track(9);
    let mut state = spawn_state(&track);
    for _ in 0..200 {
        state = apply_action(&track, &state, steer_at_target(&state, &track));
        let v = state.vehicle;
        for component in [v.position.x, v.position.y, v.velocity.x, v.velocity.y, v.heading_deg] {
            assert_eq!(component.fract(), 0.0, "{v:?}");
        }
        assert!(v.heading_deg > -180.0 && v.heading_deg <= 180.0);
    }
}

#[test]
fn angle_properties_hold_over_a_sweep() {
    let mut a = -12.0;
    while a < 12.0 {
        let n = normalize(a);
        assert_eq!(normalize(n), n);
        assert!(n > -std::f64::consts::PI && n <= std::f64::consts::PI);
        assert_eq!(angle_difference(a, a), 0.0);
        assert_eq!(restrict_turn(n, n), n);
        a += 0.173;
    }

    let h = to_radians(40.0);
    let far_left = to_radians(100.0);
    let far_right = to_radians(-20.0);
    assert!((restrict_turn(h, far_left) - to_radians(58.0)).abs() < 1e-12);
    assert!((restrict_turn(h, far_right) - to_radians(22.0)).abs() < 1e-12);
}

#[test]
fn observation_resets_plan_counter() {
    let track = generate_track(3);
    let vehicle = Vehicle::new(Coord::new(5000.0, 5000.0), Vector::new(12.0, -4.0), 190.0);
    let state = RaceState::observed(&track, vehicle, 0, 1).expect("valid observation");
    assert_eq!(state.vehicle.heading_deg, -170.0);
    assert_eq!(state.checkpoints_passed, 0);
    assert_eq!(state.laps_completed, 1);
}
