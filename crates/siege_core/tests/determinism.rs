//! Determinism and invariant properties over random action streams.

use proptest::prelude::*;
use siege_core::prelude::*;
use siege_test_utils::determinism::{run_parallel_simulations, verify_simulation_determinism};
use siege_test_utils::fixtures::{ai_vs_ai, full_field, run_until_decided};
use siege_test_utils::strategies::{arb_placements, arb_timed_actions};

fn surge_match(seed: u64) -> MatchConfig {
    MatchConfig {
        seed,
        surge: true,
        ai_sides: vec![Side::Enemy],
        ..MatchConfig::default()
    }
}

fn run_script(seed: u64, script: &[(u64, Action)], ticks: u64) -> (u64, Vec<Snapshot>) {
    let mut sim = Simulation::new(GameConfig::default(), &surge_match(seed), 0);
    let mut history = Vec::new();
    let mut cursor = 0;
    for tick in 1..=ticks {
        while cursor < script.len() && script[cursor].0 == tick {
            sim.submit(script[cursor].1);
            cursor += 1;
        }
        sim.tick(tick * TICK_INTERVAL_MS);
        history.push(sim.snapshot().clone());
    }
    (sim.state_hash(), history)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn identical_inputs_give_identical_runs(
        seed in any::<u64>(),
        script in arb_timed_actions(300, 80),
    ) {
        let (a, _) = run_script(seed, &script, 300);
        let (b, _) = run_script(seed, &script, 300);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn capacity_is_never_exceeded(
        seed in any::<u64>(),
        script in arb_timed_actions(200, 120),
    ) {
        let (_, history) = run_script(seed, &script, 200);
        for snapshot in &history {
            for side in Side::ALL {
                prop_assert!(snapshot.live_count(side) <= 30);
            }
        }
    }

    #[test]
    fn positions_stay_on_the_field(placements in arb_placements(40)) {
        let mut sim = siege_test_utils::fixtures::sandbox();
        for (unit_type, side, x) in placements {
            if sim.snapshot().live_count(side) < 30 {
                sim.place_unit(unit_type, side, x);
            }
        }
        sim.snapshot_mut().commands = PerSide::splat(Command::Attack);
        for n in 1..=150 {
            sim.tick(n * TICK_INTERVAL_MS);
            for unit in &sim.snapshot().units {
                prop_assert!((0.0..=100.0).contains(&unit.x));
            }
            for projectile in &sim.snapshot().projectiles {
                prop_assert!((0.0..=100.0).contains(&projectile.x));
            }
        }
    }

    #[test]
    fn death_time_is_set_once(script in arb_timed_actions(100, 40)) {
        let (_, history) = run_script(11, &script, 400);
        let mut first_seen = std::collections::HashMap::new();
        for snapshot in &history {
            for unit in snapshot.units.iter().filter(|u| u.is_dying()) {
                let t = *first_seen.entry(unit.id).or_insert(unit.death_time);
                prop_assert_eq!(t, unit.death_time);
            }
        }
    }
}

#[test]
fn test_ai_matches_are_reproducible() {
    assert!(verify_simulation_determinism(|| ai_vs_ai(42), 2_000));
}

#[test]
fn test_parallel_full_fields_match() {
    run_parallel_simulations(full_field, 4, 300).assert_deterministic();
}

#[test]
fn test_full_field_battle_keeps_invariants() {
    let mut sim = full_field();
    run_until_decided(&mut sim, 30_000);
    for side in Side::ALL {
        assert!(sim.snapshot().live_count(side) <= 30);
    }
}

#[test]
fn test_recorded_match_replays() {
    let mut recorder = Recorder::new(GameConfig::default(), surge_match(5), 0, TICK_INTERVAL_MS);
    for n in 0..1_500u64 {
        if n % 100 == 0 {
            recorder.submit(Action::recruit(UnitType::Paladin, Side::Player));
        }
        if n == 700 {
            recorder.submit(Action::command(Side::Player, Command::Attack));
        }
        recorder.tick();
    }
    let replay = recorder.finish();
    let replayed = replay.verify().expect("replay matches");
    assert_eq!(replayed.state_hash(), replay.final_hash);
}
