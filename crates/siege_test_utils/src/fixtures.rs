//! Scenario fixtures.
//!
//! Ready-made simulations for tests and benchmarks. Fixtures that place
//! units do so for free at match time 0.

use siege_core::components::{Command, EntityId, Millis, Side, UnitType};
use siege_core::data::GameConfig;
use siege_core::simulation::{MatchConfig, Simulation, TICK_INTERVAL_MS};

/// Match settings with no opponent policy.
#[must_use]
pub fn quiet_match() -> MatchConfig {
    MatchConfig {
        ai_sides: Vec::new(),
        ..MatchConfig::default()
    }
}

/// Empty battlefield, no AI, default tables.
#[must_use]
pub fn sandbox() -> Simulation {
    Simulation::new(GameConfig::default(), &quiet_match(), 0)
}

/// Two units facing each other in an otherwise empty sandbox.
#[must_use]
pub fn duel(
    player: UnitType,
    player_x: f64,
    enemy: UnitType,
    enemy_x: f64,
) -> (Simulation, EntityId, EntityId) {
    let mut sim = sandbox();
    let a = sim.place_unit(player, Side::Player, player_x);
    let b = sim.place_unit(enemy, Side::Enemy, enemy_x);
    (sim, a, b)
}

/// Both sides at capacity with a mixed army, attacking each other.
#[must_use]
pub fn full_field() -> Simulation {
    const ROSTER: [UnitType; 6] = [
        UnitType::Small,
        UnitType::Toxic,
        UnitType::Paladin,
        UnitType::Archer,
        UnitType::Mage,
        UnitType::Small,
    ];

    let mut sim = sandbox();
    let max_units = sim.config().rules.max_units;
    for i in 0..max_units {
        let unit_type = if i == 0 { UnitType::Boss } else { ROSTER[i % ROSTER.len()] };
        let offset = (i % 10) as f64;
        sim.place_unit(unit_type, Side::Player, 40.0 - offset);
        sim.place_unit(unit_type, Side::Enemy, 60.0 + offset);
    }
    sim.snapshot_mut().commands = siege_core::components::PerSide::splat(Command::Attack);
    sim
}

/// Both sides driven by the opponent policy from surge gold.
#[must_use]
pub fn ai_vs_ai(seed: u64) -> Simulation {
    let match_config = MatchConfig {
        seed,
        surge: true,
        ai_sides: vec![Side::Player, Side::Enemy],
        ..MatchConfig::default()
    };
    Simulation::new(GameConfig::default(), &match_config, 0)
}

/// Tick at the nominal period until `duration_ms` has passed.
pub fn run_for(sim: &mut Simulation, duration_ms: Millis) {
    let end = sim.snapshot().last_tick + duration_ms;
    while sim.snapshot().last_tick < end {
        let now = sim.snapshot().last_tick + TICK_INTERVAL_MS;
        sim.tick(now);
    }
}

/// Tick until the match ends or `limit_ms` passes. Returns whether it ended.
pub fn run_until_decided(sim: &mut Simulation, limit_ms: Millis) -> bool {
    let end = sim.snapshot().last_tick + limit_ms;
    while sim.snapshot().last_tick < end {
        if sim.snapshot().game_status.is_over() {
            return true;
        }
        let now = sim.snapshot().last_tick + TICK_INTERVAL_MS;
        sim.tick(now);
    }
    sim.snapshot().game_status.is_over()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_field_is_at_capacity() {
        let sim = full_field();
        assert_eq!(sim.snapshot().live_count(Side::Player), 30);
        assert_eq!(sim.snapshot().live_count(Side::Enemy), 30);
    }

    #[test]
    fn test_run_for_advances_clock() {
        let mut sim = sandbox();
        run_for(&mut sim, 1_000);
        assert_eq!(sim.snapshot().last_tick, 1_000);
        assert_eq!(sim.tick_count(), 50);
    }
}
