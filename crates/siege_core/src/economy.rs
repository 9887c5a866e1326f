//! Gold: recruiting and the worker mining cycle.

use crate::actions::Action;
use crate::components::{EntityId, Millis, Side, Unit, UnitState, UnitType};
use crate::data::GameConfig;
use crate::math::walk_velocity;
use crate::simulation::{GoldDeposit, RejectReason, RejectedRecruit, Snapshot, TickContext};

/// Apply one drained action to the snapshot.
pub(crate) fn apply_action(state: &mut Snapshot, action: Action, ctx: &mut TickContext<'_>) {
    match action {
        Action::Recruit { unit_type, side } => {
            match recruit(state, ctx.config, unit_type, side, ctx.now) {
                Ok(id) => ctx.events.recruited.push(id),
                Err(reason) => {
                    tracing::debug!(%unit_type, %side, ?reason, "Recruit dropped");
                    ctx.events.rejected.push(RejectedRecruit {
                        unit_type,
                        side,
                        reason,
                    });
                }
            }
        }
        Action::ChangeCommand { side, command } => {
            *state.commands.get_mut(side) = command;
            tracing::debug!(%side, ?command, "Command changed");
            ctx.events.command_changes.push((side, command));
        }
        Action::Unknown => {
            tracing::debug!("Ignoring unknown action");
        }
    }
}

/// Buy a unit at its side's spawn point.
///
/// Capacity and gold are checked before anything changes, so a rejected
/// recruit leaves the snapshot untouched.
pub fn recruit(
    state: &mut Snapshot,
    config: &GameConfig,
    unit_type: UnitType,
    side: Side,
    now: Millis,
) -> Result<EntityId, RejectReason> {
    if state.live_count(side) >= config.rules.max_units {
        return Err(RejectReason::AtCapacity);
    }
    let cost = config.units.cost(unit_type);
    let gold = state.gold.get_mut(side);
    if *gold < cost {
        return Err(RejectReason::InsufficientGold);
    }
    *gold -= cost;

    let x = config.layout.spawn_x(side);
    Ok(spawn_unit(state, config, unit_type, side, x, now))
}

/// Create a unit at full health without charging for it.
pub fn spawn_unit(
    state: &mut Snapshot,
    config: &GameConfig,
    unit_type: UnitType,
    side: Side,
    x: f64,
    now: Millis,
) -> EntityId {
    let id = state.allocate_id();
    let mut unit = Unit::new(id, unit_type, side, x, config.units.stats(unit_type).hp);
    if unit_type == UnitType::Mage {
        unit.last_summon_time = Some(now);
    }
    state.units.push(unit);
    id
}

/// One step of the worker cycle: walk to the mine, harvest, walk home,
/// deposit. Returns the target velocity.
///
/// `last_attack_time` holds the start of the current harvest or deposit.
pub(crate) fn worker_cycle(unit: &mut Unit, state: &mut Snapshot, ctx: &mut TickContext<'_>) -> f64 {
    let now = ctx.now;
    let config = ctx.config;
    let layout = &config.layout;
    let stats = config.units.stats(unit.unit_type);
    let elapsed = |unit: &Unit| unit.last_attack_time.map_or(0, |t| now.saturating_sub(t));
    unit.target_id = None;

    if unit.has_gold {
        if unit.state == UnitState::Depositing {
            if elapsed(unit) >= config.rules.deposit_duration_ms {
                let amount = config.rules.deposit_amount;
                *state.gold.get_mut(unit.side) += amount;
                unit.has_gold = false;
                unit.state = UnitState::Walking;
                ctx.events.deposits.push(GoldDeposit {
                    worker: unit.id,
                    side: unit.side,
                    amount,
                });
            }
            return 0.0;
        }
        let home = layout.statue_x(unit.side);
        if unit.distance_to(home) <= layout.deposit_radius {
            unit.state = UnitState::Depositing;
            unit.last_attack_time = Some(now);
            return 0.0;
        }
        unit.state = UnitState::Walking;
        return walk_velocity(unit.x, home, stats.speed);
    }

    if unit.state == UnitState::Mining {
        if elapsed(unit) >= stats.attack_interval_ms {
            unit.has_gold = true;
            unit.state = UnitState::Walking;
        }
        return 0.0;
    }
    let mine = layout.mine_x(unit.side);
    if unit.distance_to(mine) <= layout.mine_radius {
        unit.state = UnitState::Mining;
        unit.last_attack_time = Some(now);
        return 0.0;
    }
    unit.state = UnitState::Walking;
    walk_velocity(unit.x, mine, stats.speed)
}
