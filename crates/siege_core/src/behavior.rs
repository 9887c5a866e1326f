//! Per-unit state machine.
//!
//! Each tick a unit goes through: status pass (stun short-circuits, root
//! chip damage, poison), passives, Mage summons, then the command branch
//! (retreat, worker cycle or combat) which yields a target velocity. Root
//! and slow adjust that velocity before it is smoothed and integrated.
//!
//! The acting unit is taken out of the list by value for the duration of
//! its turn and written back afterwards; hits on other units mutate the
//! list in place, so later units observe earlier units' effects.

use crate::abilities::{self, apply_passives};
use crate::combat::{apply_flat_damage, apply_mitigated_damage, DamageEvent, DamageKind, DamageTarget};
use crate::components::{Command, Projectile, Unit, UnitState, UnitType};
use crate::economy;
use crate::math::{approach, clamp_to_field, direction_to, walk_velocity};
use crate::simulation::{Snapshot, TickContext};
use crate::status::ROOT_DAMAGE_PER_SECOND;
use crate::targeting::{enemies_near, Sighting};

/// Archer projectile speed, units per second.
pub const ARROW_SPEED: f64 = 25.0;

/// Poison stacks set by a Toxic hit.
pub const TOXIC_POISON_STACKS: u32 = 3;

/// Extra damage on every third Boss swing.
pub const SPLATTER_BONUS: f64 = 15.0;

/// Boss swings per Splatter Impact.
pub const SPLATTER_EVERY: u32 = 3;

/// Distance a Boss swing pushes each target.
pub const KNOCKBACK_DISTANCE: f64 = 2.0;

/// Extra reach over a unit's range when hitting a statue.
pub const SIEGE_REACH: f64 = 1.0;

/// Time between Mage summons.
pub const SUMMON_INTERVAL_MS: u64 = 10_000;

/// Live minions a Mage may keep.
pub const MAX_MINIONS: usize = 3;

/// How far behind the Mage a minion appears.
pub const SUMMON_OFFSET: f64 = 2.0;

/// Resolve the unit at `index` for this tick. Dying units are skipped.
pub(crate) fn resolve_unit(state: &mut Snapshot, index: usize, ctx: &mut TickContext<'_>) {
    if state.units[index].is_dying() {
        return;
    }
    let mut unit = state.units[index].clone();
    act(&mut unit, state, ctx);
    state.units[index] = unit;
}

fn act(unit: &mut Unit, state: &mut Snapshot, ctx: &mut TickContext<'_>) {
    let now = ctx.now;
    let pass = unit.effects.resolve(now);

    if pass.stunned {
        unit.state = UnitState::Idle;
        unit.current_speed = 0.0;
        return;
    }

    if pass.rooted {
        unit.state = UnitState::Idle;
        unit.hp -= ROOT_DAMAGE_PER_SECOND * ctx.dt;
    }

    if let Some(poison) = pass.poison_damage {
        let amount = apply_flat_damage(unit, poison, now);
        ctx.events.damage.push(DamageEvent::new(
            None,
            DamageTarget::Unit(unit.id),
            amount,
            DamageKind::Poison,
        ));
    }

    apply_passives(unit);

    if unit.unit_type == UnitType::Mage {
        try_summon(unit, state, ctx);
    }

    let command = *state.commands.get(unit.side);
    let mut target_velocity = if command == Command::Retreat {
        retreat(unit, ctx)
    } else if unit.unit_type == UnitType::Worker {
        economy::worker_cycle(unit, state, ctx)
    } else {
        combat(unit, state, ctx, command)
    };

    if pass.rooted {
        target_velocity = 0.0;
        if unit.state == UnitState::Walking {
            unit.state = UnitState::Idle;
        }
    }
    target_velocity *= pass.speed_factor;

    unit.current_speed = approach(
        unit.current_speed,
        target_velocity,
        unit.unit_type.agility(),
        ctx.dt,
    );
    unit.x = clamp_to_field(unit.x + unit.current_speed * ctx.dt);
}

fn retreat(unit: &mut Unit, ctx: &TickContext<'_>) -> f64 {
    let layout = &ctx.config.layout;
    let home = layout.statue_x(unit.side);
    unit.target_id = None;
    if unit.distance_to(home) <= layout.retreat_radius {
        unit.state = UnitState::Idle;
        0.0
    } else {
        unit.state = UnitState::Walking;
        walk_velocity(unit.x, home, ctx.config.units.stats(unit.unit_type).speed)
    }
}

/// Every 10s a Mage tries to add a Small minion behind itself.
///
/// The timer restarts on every check, so a blocked summon waits for the
/// next window.
fn try_summon(unit: &mut Unit, state: &mut Snapshot, ctx: &mut TickContext<'_>) {
    let now = ctx.now;
    let due = unit
        .last_summon_time
        .map_or(true, |t| now.saturating_sub(t) >= SUMMON_INTERVAL_MS);
    if !due {
        return;
    }
    unit.last_summon_time = Some(now);

    let owned = |u: &Unit| u.owner_id == Some(unit.id) && u.occupies_slot();
    let minions = state.units.iter().filter(|u| owned(u)).count()
        + ctx.summons.iter().filter(|u| owned(u)).count();
    let fielded = state.live_count(unit.side)
        + ctx.summons.iter().filter(|u| u.side == unit.side).count();
    if minions >= MAX_MINIONS || fielded >= ctx.config.rules.max_units {
        return;
    }

    let x = clamp_to_field(unit.x - unit.side.facing() * SUMMON_OFFSET);
    let stats = ctx.config.units.stats(UnitType::Small);
    let mut minion = Unit::new(state.allocate_id(), UnitType::Small, unit.side, x, stats.hp);
    minion.owner_id = Some(unit.id);
    tracing::debug!(mage = unit.id, minion = minion.id, x, "Summon queued");
    ctx.summons.push(minion);
}

fn combat(unit: &mut Unit, state: &mut Snapshot, ctx: &mut TickContext<'_>, command: Command) -> f64 {
    let config = ctx.config;
    let stats = config.units.stats(unit.unit_type);

    let visible = enemies_near(&state.units, unit.side, unit.x, config.rules.aggro_range);
    let aggro = visible.first().copied();
    unit.target_id = aggro.map(|s| state.units[s.index].id);

    let in_range: Vec<Sighting> = visible
        .iter()
        .copied()
        .filter(|s| s.distance <= stats.range)
        .collect();
    let primary = in_range.first().map(|s| s.index);

    let enemy_statue = config.layout.statue_x(unit.side.opponent());
    let can_siege =
        command == Command::Attack && unit.distance_to(enemy_statue) <= stats.range + SIEGE_REACH;

    if primary.is_some() || can_siege {
        unit.state = UnitState::Attacking;
        if !abilities::try_cast(unit, state, ctx, primary) {
            basic_attack(unit, state, ctx, &in_range);
        }
        return 0.0;
    }

    if let Some(target) = aggro {
        let charge = match command {
            Command::Attack => true,
            Command::Defend => target.distance <= config.rules.defend_aggro_range,
            Command::Retreat => false,
        };
        if charge {
            unit.state = UnitState::Walking;
            return walk_velocity(unit.x, state.units[target.index].x, stats.speed);
        }
    }

    match command {
        Command::Defend => {
            let slot = config.layout.formation_slot(unit.side, unit.unit_type);
            if unit.distance_to(slot) <= config.layout.formation_radius {
                unit.state = UnitState::Idle;
                0.0
            } else {
                unit.state = UnitState::Walking;
                walk_velocity(unit.x, slot, stats.speed)
            }
        }
        Command::Attack => {
            unit.state = UnitState::Walking;
            walk_velocity(unit.x, enemy_statue, stats.speed)
        }
        Command::Retreat => {
            unit.state = UnitState::Idle;
            0.0
        }
    }
}

fn basic_attack(unit: &mut Unit, state: &mut Snapshot, ctx: &mut TickContext<'_>, in_range: &[Sighting]) {
    let now = ctx.now;
    let stats = ctx.config.units.stats(unit.unit_type);
    let interval = stats.attack_interval_ms as f64 * abilities::interval_multiplier(unit);
    let ready = unit
        .last_attack_time
        .map_or(true, |t| now.saturating_sub(t) as f64 > interval);
    if !ready {
        return;
    }
    unit.last_attack_time = Some(now);

    let damage = stats.damage * abilities::damage_multiplier(unit);
    let primary = in_range.first().map(|s| s.index);

    match (unit.unit_type, primary) {
        (UnitType::Boss, Some(_)) => boss_swing(unit, state, ctx, in_range, damage),
        (UnitType::Archer, _) => {
            let (target_x, target_id) = match primary {
                Some(index) => (state.units[index].x, Some(state.units[index].id)),
                None => (ctx.config.layout.statue_x(unit.side.opponent()), None),
            };
            let projectile = Projectile {
                id: state.allocate_id(),
                x: unit.x,
                target_x,
                target_id,
                damage,
                speed: ARROW_SPEED,
                side: unit.side,
                created_at: now,
            };
            ctx.events.projectiles_fired.push(projectile.id);
            state.projectiles.push(projectile);
        }
        (_, Some(index)) => {
            let target = &mut state.units[index];
            let amount = apply_mitigated_damage(target, damage, now);
            if unit.unit_type == UnitType::Toxic {
                target.effects.poison(TOXIC_POISON_STACKS);
            }
            if unit.unit_type == UnitType::Paladin {
                ctx.events.screen_shake = true;
            }
            ctx.events.damage.push(DamageEvent::new(
                Some(unit.id),
                DamageTarget::Unit(target.id),
                amount,
                DamageKind::Melee,
            ));
        }
        (_, None) => {
            let side = unit.side.opponent();
            *state.statue_hp.get_mut(side) -= damage;
            if unit.unit_type == UnitType::Paladin {
                ctx.events.screen_shake = true;
            }
            ctx.events.damage.push(DamageEvent::new(
                Some(unit.id),
                DamageTarget::Statue(side),
                damage,
                DamageKind::Siege,
            ));
        }
    }
}

/// Boss area melee: hits every enemy in range, Splatter Impact on every
/// third swing, knockback on each target.
fn boss_swing(
    unit: &mut Unit,
    state: &mut Snapshot,
    ctx: &mut TickContext<'_>,
    in_range: &[Sighting],
    damage: f64,
) {
    unit.attack_count += 1;
    let raw = if unit.attack_count % SPLATTER_EVERY == 0 {
        damage + SPLATTER_BONUS
    } else {
        damage
    };

    for sighting in in_range {
        let target = &mut state.units[sighting.index];
        let amount = apply_mitigated_damage(target, raw, ctx.now);

        let away = match direction_to(unit.x, target.x) {
            d if d == 0.0 => unit.side.facing(),
            d => d,
        };
        target.x = clamp_to_field(target.x + away * KNOCKBACK_DISTANCE);

        ctx.events.damage.push(DamageEvent::new(
            Some(unit.id),
            DamageTarget::Unit(target.id),
            amount,
            DamageKind::Melee,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::AbilityId;
    use crate::components::Side;
    use crate::data::GameConfig;
    use crate::simulation::{MatchConfig, TickEvents};

    fn field() -> (GameConfig, Snapshot) {
        let config = GameConfig::default();
        let snapshot = Snapshot::new(&config, &MatchConfig::default(), 0);
        (config, snapshot)
    }

    fn place(state: &mut Snapshot, config: &GameConfig, unit_type: UnitType, side: Side, x: f64) -> usize {
        let id = state.allocate_id();
        let hp = config.units.stats(unit_type).hp;
        state.units.push(Unit::new(id, unit_type, side, x, hp));
        state.units.len() - 1
    }

    fn run(config: &GameConfig, state: &mut Snapshot, index: usize, now: u64) -> TickEvents {
        let mut ctx = TickContext {
            config,
            now,
            dt: 0.02,
            events: TickEvents::default(),
            summons: Vec::new(),
        };
        resolve_unit(state, index, &mut ctx);
        state.units.extend(ctx.summons);
        ctx.events
    }

    #[test]
    fn test_stunned_unit_does_nothing() {
        let (config, mut state) = field();
        let small = place(&mut state, &config, UnitType::Small, Side::Player, 50.0);
        place(&mut state, &config, UnitType::Small, Side::Enemy, 51.0);
        state.units[small].effects.stun(0, 1_000);
        state.units[small].current_speed = 5.0;

        let events = run(&config, &mut state, small, 500);
        assert!(events.damage.is_empty());
        assert_eq!(state.units[small].state, UnitState::Idle);
        assert_eq!(state.units[small].current_speed, 0.0);
        assert!((state.units[small].x - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_rooted_unit_attacks_but_does_not_move() {
        let (config, mut state) = field();
        let small = place(&mut state, &config, UnitType::Small, Side::Player, 50.0);
        let enemy = place(&mut state, &config, UnitType::Small, Side::Enemy, 51.5);
        state.units[small].effects.root(0, 2_500);

        let events = run(&config, &mut state, small, 100);
        assert_eq!(events.damage.len(), 1);
        assert!((state.units[enemy].hp - 160.0).abs() < 1e-9);
        assert!((state.units[small].x - 50.0).abs() < 1e-12);
        assert!((state.units[small].hp - (180.0 - 0.2)).abs() < 1e-9);
        assert_eq!(state.units[small].last_damage_time, None);
    }

    #[test]
    fn test_retreat_never_attacks() {
        let (config, mut state) = field();
        state.commands.player = Command::Retreat;
        let paladin = place(&mut state, &config, UnitType::Paladin, Side::Player, 50.0);
        let enemy = place(&mut state, &config, UnitType::Small, Side::Enemy, 51.0);

        let events = run(&config, &mut state, paladin, 100);
        assert!(events.damage.is_empty());
        assert!((state.units[enemy].hp - 180.0).abs() < 1e-9);
        assert_eq!(state.units[paladin].state, UnitState::Walking);
        assert!(state.units[paladin].current_speed < 0.0, "moves toward own statue");
    }

    #[test]
    fn test_boss_splatter_on_third_swing() {
        let (config, mut state) = field();
        let boss = place(&mut state, &config, UnitType::Boss, Side::Player, 50.0);
        let a = place(&mut state, &config, UnitType::Small, Side::Enemy, 52.0);
        let b = place(&mut state, &config, UnitType::Small, Side::Enemy, 53.0);
        state.units[boss].attack_count = 2;
        state.units[boss].last_ability1_time = Some(0);
        state.units[boss].last_ability2_time = Some(0);

        run(&config, &mut state, boss, 100);

        assert_eq!(state.units[boss].attack_count, 3);
        assert!((state.units[a].hp - (180.0 - 95.0)).abs() < 1e-9);
        assert!((state.units[b].hp - (180.0 - 95.0)).abs() < 1e-9);
        assert!((state.units[a].x - 54.0).abs() < 1e-9, "knocked back");
        assert!((state.units[b].x - 55.0).abs() < 1e-9);
    }

    #[test]
    fn test_boss_mega_crash_preempts_basic_attack() {
        let (config, mut state) = field();
        let boss = place(&mut state, &config, UnitType::Boss, Side::Player, 50.0);
        let near = place(&mut state, &config, UnitType::Small, Side::Enemy, 53.0);
        let far = place(&mut state, &config, UnitType::Paladin, Side::Enemy, 66.0);

        let events = run(&config, &mut state, boss, 100);

        assert!(events.screen_shake);
        assert_eq!(state.units[boss].last_ability2_time, Some(100));
        assert_eq!(state.units[boss].last_attack_time, None);
        assert!((state.units[far].hp - 510.0).abs() < 1e-9, "flat 90");
        assert!(state.units[far].effects.is_stunned(1_599));
        assert!((state.units[near].hp - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_toxic_hit_poisons() {
        let (config, mut state) = field();
        let toxic = place(&mut state, &config, UnitType::Toxic, Side::Enemy, 50.0);
        let victim = place(&mut state, &config, UnitType::Archer, Side::Player, 48.5);

        run(&config, &mut state, toxic, 100);
        assert_eq!(state.units[victim].effects.poison_stacks(), 3);
        assert!((state.units[victim].hp - 108.0).abs() < 1e-9);
    }

    #[test]
    fn test_archer_fires_projectile_at_target_position() {
        let (config, mut state) = field();
        let archer = place(&mut state, &config, UnitType::Archer, Side::Player, 40.0);
        let target = place(&mut state, &config, UnitType::Small, Side::Enemy, 55.0);

        let events = run(&config, &mut state, archer, 100);
        assert_eq!(events.projectiles_fired.len(), 1);
        let shot = &state.projectiles[0];
        assert!((shot.target_x - 55.0).abs() < 1e-12);
        assert_eq!(shot.target_id, Some(state.units[target].id));
        assert!((shot.damage - 70.0).abs() < 1e-12);
    }

    #[test]
    fn test_siege_hits_statue_under_attack_only() {
        let (config, mut state) = field();
        let small = place(&mut state, &config, UnitType::Small, Side::Player, 92.5);

        run(&config, &mut state, small, 100);
        assert!((state.statue_hp.enemy - 2_000.0).abs() < 1e-9);

        state.commands.player = Command::Attack;
        let events = run(&config, &mut state, small, 5_000);
        assert!((state.statue_hp.enemy - 1_980.0).abs() < 1e-9);
        assert_eq!(events.damage[0].target, DamageTarget::Statue(Side::Enemy));
    }

    #[test]
    fn test_defend_charges_only_close_enemies() {
        let (config, mut state) = field();
        let small = place(&mut state, &config, UnitType::Small, Side::Player, 28.0);
        let enemy = place(&mut state, &config, UnitType::Small, Side::Enemy, 45.0);

        run(&config, &mut state, small, 100);
        assert_eq!(state.units[small].target_id, Some(state.units[enemy].id));
        assert_eq!(state.units[small].state, UnitState::Idle, "holding formation slot");

        state.units[enemy].x = 35.0;
        run(&config, &mut state, small, 120);
        assert_eq!(state.units[small].state, UnitState::Walking);
        assert!(state.units[small].current_speed > 0.0);
    }

    #[test]
    fn test_mage_summons_behind_itself() {
        let (config, mut state) = field();
        let mage = place(&mut state, &config, UnitType::Mage, Side::Player, 18.0);
        state.units[mage].last_summon_time = Some(0);

        let events = run(&config, &mut state, mage, 9_999);
        assert!(events.damage.is_empty());
        assert_eq!(state.units.len(), 1);

        run(&config, &mut state, mage, 10_000);
        assert_eq!(state.units.len(), 2);
        let minion = &state.units[1];
        assert_eq!(minion.unit_type, UnitType::Small);
        assert_eq!(minion.owner_id, Some(state.units[mage].id));
        assert!((minion.x - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_mage_minion_cap() {
        let (config, mut state) = field();
        let mage = place(&mut state, &config, UnitType::Mage, Side::Player, 30.0);
        let mage_id = state.units[mage].id;
        for _ in 0..MAX_MINIONS {
            let i = place(&mut state, &config, UnitType::Small, Side::Player, 25.0);
            state.units[i].owner_id = Some(mage_id);
        }
        run(&config, &mut state, mage, 10_000);
        assert_eq!(state.units.len(), 1 + MAX_MINIONS);
    }

    #[test]
    fn test_slow_scales_target_velocity() {
        let (config, mut state) = field();
        state.commands.player = Command::Attack;
        let plain = place(&mut state, &config, UnitType::Small, Side::Player, 10.0);
        let slowed = place(&mut state, &config, UnitType::Small, Side::Player, 20.0);
        state.units[slowed].effects.slow(0, 2_000);

        run(&config, &mut state, plain, 100);
        run(&config, &mut state, slowed, 100);

        let plain_speed = state.units[plain].current_speed;
        let slowed_speed = state.units[slowed].current_speed;
        assert!(plain_speed > 0.0);
        assert!((slowed_speed - plain_speed * 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_enraged_boss_swings_harder_and_faster() {
        let (config, mut state) = field();
        let boss = place(&mut state, &config, UnitType::Boss, Side::Player, 50.0);
        let small = place(&mut state, &config, UnitType::Small, Side::Enemy, 52.0);
        state.units[boss].is_enraged = true;
        state.units[boss].last_ability1_time = Some(0);
        state.units[boss].last_ability2_time = Some(0);

        run(&config, &mut state, boss, 100);
        assert!((state.units[small].hp - 92.0).abs() < 1e-9);
        assert_eq!(state.units[boss].last_attack_time, Some(100));

        let events = run(&config, &mut state, boss, 1_860);
        assert!(events.damage.is_empty(), "1760ms is not past the interval");
        assert_eq!(state.units[boss].last_attack_time, Some(100));

        let events = run(&config, &mut state, boss, 1_861);
        assert_eq!(events.damage.len(), 1);
        assert!((state.units[small].hp - 4.0).abs() < 1e-9);
        assert_eq!(state.units[boss].attack_count, 2);
    }

    #[test]
    fn test_mega_crash_needs_enemies_at_landing() {
        let (config, mut state) = field();
        let boss = place(&mut state, &config, UnitType::Boss, Side::Player, 50.0);
        let small = place(&mut state, &config, UnitType::Small, Side::Enemy, 53.0);

        let events = run(&config, &mut state, boss, 100);

        assert_eq!(events.abilities.len(), 1);
        assert_eq!(events.abilities[0].ability, AbilityId::SlimeWave);
        assert!(!events.screen_shake);
        assert_eq!(state.units[boss].last_ability2_time, None);
        assert_eq!(state.units[boss].last_ability1_time, Some(100));
        assert!((state.units[boss].x - 50.0).abs() < 1e-9);
        assert!((state.units[small].hp - 150.0).abs() < 1e-9);
        assert!(state.units[small].effects.is_slowed(2_099));
    }
}
