//! End-to-end battle rules through the public `Simulation` API.

use siege_core::prelude::*;
use siege_core::abilities::AbilityId;
use siege_test_utils::fixtures::{duel, quiet_match, run_for, sandbox};

fn unit(sim: &Simulation, id: EntityId) -> &Unit {
    sim.snapshot().unit(id).expect("unit present")
}

#[test]
fn test_recruit_rejection_leaves_state_untouched() {
    let mut sim = sandbox();
    sim.snapshot_mut().gold.player = 10;

    sim.submit(Action::recruit(UnitType::Archer, Side::Player));
    let events = sim.tick(20);

    assert!(sim.pending().is_empty());
    assert_eq!(sim.snapshot().gold.player, 10);
    assert!(sim.snapshot().units.is_empty());
    assert_eq!(events.rejected.len(), 1);
}

#[test]
fn test_projectile_resolves_on_aimed_target() {
    let (mut sim, archer, paladin) = duel(UnitType::Archer, 40.0, UnitType::Paladin, 55.0);
    sim.snapshot_mut()
        .unit_mut(paladin)
        .unwrap()
        .effects
        .stun(0, 60_000);

    let events = sim.tick(20);
    assert_eq!(events.projectiles_fired.len(), 1);
    assert_eq!(unit(&sim, archer).state, UnitState::Attacking);

    for n in 2..=29 {
        sim.tick(n * 20);
    }
    assert_eq!(sim.snapshot().projectiles.len(), 1);
    assert!((unit(&sim, paladin).hp - 600.0).abs() < 1e-9);

    let events = sim.tick(600);
    assert!(sim.snapshot().projectiles.is_empty());
    assert!((unit(&sim, paladin).hp - 551.0).abs() < 1e-9);
    assert_eq!(events.damage[0].kind, DamageKind::Projectile);
}

#[test]
fn test_siege_to_zero_is_victory_and_sticks() {
    let mut sim = sandbox();
    sim.place_unit(UnitType::Small, Side::Player, 93.0);
    sim.snapshot_mut().commands.player = Command::Attack;
    sim.snapshot_mut().statue_hp.enemy = 15.0;

    let events = sim.tick(20);
    assert!(sim.snapshot().statue_hp.enemy <= 0.0);
    assert_eq!(events.status_change, Some(GameStatus::Victory));

    run_for(&mut sim, 3_000);
    assert_eq!(sim.snapshot().game_status, GameStatus::Victory);
}

#[test]
fn test_retreat_ignores_targets_in_range() {
    let (mut sim, paladin, small) = duel(UnitType::Paladin, 50.0, UnitType::Small, 51.0);
    sim.snapshot_mut().commands.player = Command::Retreat;
    sim.snapshot_mut().unit_mut(small).unwrap().effects.stun(0, 60_000);

    let mut last_x = unit(&sim, paladin).x;
    for n in 1..=100 {
        let events = sim.tick(n * 20);
        assert!(events
            .damage
            .iter()
            .all(|d| d.source != Some(paladin)));
        let x = unit(&sim, paladin).x;
        assert!(x <= last_x);
        last_x = x;
    }
    assert!((unit(&sim, small).hp - 180.0).abs() < 1e-9);
    assert!(last_x < 50.0);
}

#[test]
fn test_boss_splatter_third_swing() {
    let (mut sim, boss, small) = duel(UnitType::Boss, 50.0, UnitType::Paladin, 53.0);
    {
        let snapshot = sim.snapshot_mut();
        let b = snapshot.unit_mut(boss).unwrap();
        b.attack_count = 2;
        b.last_ability1_time = Some(0);
        b.last_ability2_time = Some(0);
        snapshot.unit_mut(small).unwrap().effects.stun(0, 60_000);
    }

    sim.tick(20);

    assert_eq!(unit(&sim, boss).attack_count, 3);
    // (80 + 15) * 0.7
    assert!((unit(&sim, small).hp - (600.0 - 66.5)).abs() < 1e-9);
    assert!((unit(&sim, small).x - 55.0).abs() < 1e-9);
}

#[test]
fn test_fireburst_then_shadow_grasp() {
    let (mut sim, mage, paladin) = duel(UnitType::Mage, 40.0, UnitType::Paladin, 48.0);
    sim.snapshot_mut().unit_mut(paladin).unwrap().effects.stun(0, 100);

    let events = sim.tick(20);
    assert_eq!(events.abilities[0].ability, AbilityId::Fireburst);
    assert!((unit(&sim, paladin).hp - 558.0).abs() < 1e-9);
    assert!(unit(&sim, paladin).effects.is_slowed(3_019));

    let events = sim.tick(40);
    assert_eq!(events.abilities[0].ability, AbilityId::ShadowGrasp);
    assert!(unit(&sim, paladin).effects.is_rooted(2_539));
    assert_eq!(unit(&sim, mage).last_attack_time, None);

    let events = sim.tick(60);
    assert!(events.abilities.is_empty());
    assert_eq!(unit(&sim, mage).last_attack_time, Some(60));
}

#[test]
fn test_slime_wave_only_hits_ahead() {
    let mut sim = sandbox();
    let boss = sim.place_unit(UnitType::Boss, Side::Enemy, 60.0);
    let ahead = sim.place_unit(UnitType::Small, Side::Player, 57.0);
    let behind = sim.place_unit(UnitType::Small, Side::Player, 62.0);
    sim.snapshot_mut().unit_mut(boss).unwrap().last_ability2_time = Some(0);

    let events = sim.tick(20);
    assert_eq!(events.abilities[0].ability, AbilityId::SlimeWave);
    assert!((unit(&sim, ahead).hp - 150.0).abs() < 1e-9);
    assert!((unit(&sim, behind).hp - 180.0).abs() < 1e-9);
}

#[test]
fn test_slime_wave_is_mitigated_by_armor() {
    let mut sim = sandbox();
    let boss = sim.place_unit(UnitType::Boss, Side::Enemy, 60.0);
    let paladin = sim.place_unit(UnitType::Paladin, Side::Player, 57.0);
    sim.snapshot_mut().unit_mut(boss).unwrap().last_ability2_time = Some(0);

    let events = sim.tick(20);
    assert_eq!(events.abilities[0].ability, AbilityId::SlimeWave);
    // 30 * 0.7
    assert!((unit(&sim, paladin).hp - 579.0).abs() < 1e-9);
    assert!(unit(&sim, paladin).effects.is_slowed(2_019));
}

#[test]
fn test_poison_ticks_once_per_second_and_waits_out_stun() {
    let (mut sim, toxic, victim) = duel(UnitType::Toxic, 50.0, UnitType::Paladin, 51.5);

    // fresh poison ticks on the victim's own turn in the same tick
    let events = sim.tick(20);
    let poison = events.damage.iter().filter(|d| d.kind == DamageKind::Poison).count();
    assert_eq!(poison, 1);
    assert_eq!(unit(&sim, victim).effects.poison_stacks(), 2);
    assert!((unit(&sim, victim).hp - (600.0 - 8.4 - 15.0)).abs() < 1e-9);

    sim.snapshot_mut().unit_mut(toxic).unwrap().effects.stun(20, 60_000);
    let events = sim.tick(40);
    assert!(events.damage.iter().all(|d| d.kind != DamageKind::Poison));

    sim.snapshot_mut().unit_mut(victim).unwrap().effects.stun(40, 2_000);
    run_for(&mut sim, 1_500);
    assert_eq!(unit(&sim, victim).effects.poison_stacks(), 2);

    run_for(&mut sim, 600);
    assert_eq!(unit(&sim, victim).effects.poison_stacks(), 1);
}

#[test]
fn test_worker_earns_gold() {
    let mut sim = sandbox();
    sim.submit(Action::recruit(UnitType::Worker, Side::Player));
    sim.tick(20);
    assert_eq!(sim.snapshot().gold.player, 0);

    run_for(&mut sim, 15_000);
    assert!(sim.snapshot().gold.player >= 20);
}

#[test]
fn test_mage_summons_after_ten_seconds() {
    let match_config = MatchConfig {
        surge: true,
        ..quiet_match()
    };
    let mut sim = Simulation::new(GameConfig::default(), &match_config, 0);
    sim.submit(Action::recruit(UnitType::Mage, Side::Player));
    sim.tick(20);

    run_for(&mut sim, 9_960);
    assert_eq!(sim.snapshot().live_count(Side::Player), 1);

    let events = sim.tick(10_020);
    assert_eq!(events.summoned.len(), 1);
    let minion = unit(&sim, events.summoned[0]);
    assert_eq!(minion.unit_type, UnitType::Small);
}

#[test]
fn test_summons_are_discarded_at_capacity() {
    let mut sim = sandbox();
    let mage = sim.place_unit(UnitType::Mage, Side::Player, 18.0);
    for _ in 1..sim.config().rules.max_units {
        sim.place_unit(UnitType::Worker, Side::Player, 5.0);
    }
    sim.snapshot_mut().unit_mut(mage).unwrap().last_summon_time = None;

    let events = sim.tick(20);
    assert!(events.summoned.is_empty());
    assert_eq!(sim.snapshot().live_count(Side::Player), 30);
}

#[test]
fn test_dying_units_are_not_targeted() {
    let (mut sim, small, enemy) = duel(UnitType::Small, 50.0, UnitType::Small, 51.0);
    sim.snapshot_mut().unit_mut(enemy).unwrap().hp = 0.0;
    sim.tick(20);
    assert_eq!(unit(&sim, enemy).state, UnitState::Dying);

    let events = sim.tick(40);
    assert!(events.damage.is_empty());
    assert_eq!(unit(&sim, small).target_id, None);
}
