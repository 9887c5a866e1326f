//! Per-type ability kits.
//!
//! A kit lists a unit type's active abilities in priority order plus its
//! passives. When a unit is attacking, the first ready ability whose effect
//! actually fires consumes the turn and the basic attack is skipped. Types
//! with an empty kit go straight to the basic attack.
//!
//! | Type | Abilities (priority order)            | Passive        |
//! |------|---------------------------------------|----------------|
//! | Boss | Mega Crash (25s), Slime Wave (10s)    | Last Goo Stand |
//! | Mage | Fireburst (15s), Shadow Grasp (25s)   | -              |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combat::{apply_flat_damage, apply_mitigated_damage, DamageEvent, DamageKind, DamageTarget};
use crate::components::{Millis, Unit, UnitType};
use crate::math::clamp_to_field;
use crate::simulation::{AbilityCast, Snapshot, TickContext};
use crate::targeting::enemies_where;

/// Mega Crash forward leap distance.
pub const MEGA_CRASH_LEAP: f64 = 15.0;
/// Mega Crash impact radius around the landing point.
pub const MEGA_CRASH_RADIUS: f64 = 6.0;
/// Mega Crash flat damage.
pub const MEGA_CRASH_DAMAGE: f64 = 90.0;
/// Mega Crash stun duration.
pub const MEGA_CRASH_STUN_MS: Millis = 1_500;

/// Slime Wave reach ahead of the Boss.
pub const SLIME_WAVE_RANGE: f64 = 12.0;
/// Slime Wave raw damage.
pub const SLIME_WAVE_DAMAGE: f64 = 30.0;
/// Slime Wave slow duration.
pub const SLIME_WAVE_SLOW_MS: Millis = 2_000;

/// Fireburst radius around the Mage.
pub const FIREBURST_RADIUS: f64 = 10.0;
/// Fireburst raw damage.
pub const FIREBURST_DAMAGE: f64 = 60.0;
/// Fireburst slow duration.
pub const FIREBURST_SLOW_MS: Millis = 3_000;

/// Shadow Grasp root duration.
pub const SHADOW_GRASP_ROOT_MS: Millis = 2_500;

/// Health fraction below which Last Goo Stand latches.
pub const ENRAGE_THRESHOLD: f64 = 0.25;
/// Attack interval multiplier while enraged.
pub const ENRAGE_INTERVAL_MULTIPLIER: f64 = 0.8;
/// Damage multiplier while enraged.
pub const ENRAGE_DAMAGE_MULTIPLIER: f64 = 1.1;

/// Identifies an active ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityId {
    /// Boss leap with area stun.
    MegaCrash,
    /// Boss forward cone with slow.
    SlimeWave,
    /// Mage nova with slow.
    Fireburst,
    /// Mage single-target root.
    ShadowGrasp,
}

/// Which cooldown timer an ability uses on the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilitySlot {
    /// `last_ability1_time`.
    First,
    /// `last_ability2_time`.
    Second,
}

impl AbilitySlot {
    /// When the ability in this slot last fired.
    #[must_use]
    pub const fn last_used(self, unit: &Unit) -> Option<Millis> {
        match self {
            AbilitySlot::First => unit.last_ability1_time,
            AbilitySlot::Second => unit.last_ability2_time,
        }
    }

    fn mark(self, unit: &mut Unit, now: Millis) {
        match self {
            AbilitySlot::First => unit.last_ability1_time = Some(now),
            AbilitySlot::Second => unit.last_ability2_time = Some(now),
        }
    }
}

/// Always-on behavior attached to a unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Passive {
    /// Boss enrage below a quarter health. Never resets.
    LastGooStand,
}

/// Effect body. Returns the number of units affected, or `None` when the
/// preconditions are not met and the ability does not fire.
pub(crate) type AbilityEffect =
    fn(&mut Unit, &mut Snapshot, &mut TickContext<'_>, Option<usize>) -> Option<u32>;

/// One active ability in a kit.
#[derive(Clone, Copy)]
pub struct Ability {
    /// Which ability.
    pub id: AbilityId,
    /// Cooldown timer slot.
    pub slot: AbilitySlot,
    /// Minimum time between uses.
    pub cooldown_ms: Millis,
    pub(crate) effect: AbilityEffect,
}

impl fmt::Debug for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ability")
            .field("id", &self.id)
            .field("slot", &self.slot)
            .field("cooldown_ms", &self.cooldown_ms)
            .finish_non_exhaustive()
    }
}

impl Ability {
    /// Whether the cooldown has elapsed. Never-used abilities are ready.
    #[must_use]
    pub fn is_ready(&self, unit: &Unit, now: Millis) -> bool {
        self.slot
            .last_used(unit)
            .map_or(true, |t| now.saturating_sub(t) >= self.cooldown_ms)
    }
}

/// A unit type's abilities and passives.
#[derive(Debug, Clone, Copy)]
pub struct UnitKit {
    /// Active abilities in priority order.
    pub abilities: &'static [Ability],
    /// Passives.
    pub passives: &'static [Passive],
}

const EMPTY_KIT: UnitKit = UnitKit {
    abilities: &[],
    passives: &[],
};

const BOSS_KIT: UnitKit = UnitKit {
    abilities: &[
        Ability {
            id: AbilityId::MegaCrash,
            slot: AbilitySlot::Second,
            cooldown_ms: 25_000,
            effect: mega_crash,
        },
        Ability {
            id: AbilityId::SlimeWave,
            slot: AbilitySlot::First,
            cooldown_ms: 10_000,
            effect: slime_wave,
        },
    ],
    passives: &[Passive::LastGooStand],
};

const MAGE_KIT: UnitKit = UnitKit {
    abilities: &[
        Ability {
            id: AbilityId::Fireburst,
            slot: AbilitySlot::First,
            cooldown_ms: 15_000,
            effect: fireburst,
        },
        Ability {
            id: AbilityId::ShadowGrasp,
            slot: AbilitySlot::Second,
            cooldown_ms: 25_000,
            effect: shadow_grasp,
        },
    ],
    passives: &[],
};

/// Kit of a unit type.
#[must_use]
pub const fn kit(unit_type: UnitType) -> &'static UnitKit {
    match unit_type {
        UnitType::Boss => &BOSS_KIT,
        UnitType::Mage => &MAGE_KIT,
        UnitType::Worker
        | UnitType::Small
        | UnitType::Toxic
        | UnitType::Archer
        | UnitType::Paladin => &EMPTY_KIT,
    }
}

/// Attack interval multiplier from passives.
#[must_use]
pub fn interval_multiplier(unit: &Unit) -> f64 {
    if unit.is_enraged {
        ENRAGE_INTERVAL_MULTIPLIER
    } else {
        1.0
    }
}

/// Damage multiplier from passives.
#[must_use]
pub fn damage_multiplier(unit: &Unit) -> f64 {
    if unit.is_enraged {
        ENRAGE_DAMAGE_MULTIPLIER
    } else {
        1.0
    }
}

/// Update passive latches. Runs every tick the unit acts.
pub fn apply_passives(unit: &mut Unit) {
    for passive in kit(unit.unit_type).passives {
        match passive {
            Passive::LastGooStand => {
                if !unit.is_enraged && unit.hp < unit.max_hp * ENRAGE_THRESHOLD {
                    unit.is_enraged = true;
                    tracing::debug!(id = unit.id, hp = unit.hp, "Boss enraged");
                }
            }
        }
    }
}

/// Fire the first ready ability whose effect lands. Returns `true` if one
/// fired and the turn is consumed.
pub(crate) fn try_cast(
    unit: &mut Unit,
    state: &mut Snapshot,
    ctx: &mut TickContext<'_>,
    primary: Option<usize>,
) -> bool {
    let now = ctx.now;
    for ability in kit(unit.unit_type).abilities {
        if !ability.is_ready(unit, now) {
            continue;
        }
        if let Some(hits) = (ability.effect)(unit, state, ctx, primary) {
            ability.slot.mark(unit, now);
            tracing::debug!(id = unit.id, ability = ?ability.id, hits, "Ability fired");
            ctx.events.abilities.push(AbilityCast {
                caster: unit.id,
                ability: ability.id,
                hits,
            });
            return true;
        }
    }
    false
}

fn mega_crash(
    unit: &mut Unit,
    state: &mut Snapshot,
    ctx: &mut TickContext<'_>,
    _primary: Option<usize>,
) -> Option<u32> {
    let landing = clamp_to_field(unit.x + unit.side.facing() * MEGA_CRASH_LEAP);
    let hits = enemies_where(&state.units, unit.side, |u| {
        u.distance_to(landing) <= MEGA_CRASH_RADIUS
    });
    if hits.is_empty() {
        return None;
    }

    unit.x = landing;
    for &index in &hits {
        let target = &mut state.units[index];
        let amount = apply_flat_damage(target, MEGA_CRASH_DAMAGE, ctx.now);
        target.effects.stun(ctx.now, MEGA_CRASH_STUN_MS);
        ctx.events.damage.push(DamageEvent::new(
            Some(unit.id),
            DamageTarget::Unit(target.id),
            amount,
            DamageKind::Ability,
        ));
    }
    ctx.events.screen_shake = true;
    Some(hits.len() as u32)
}

fn slime_wave(
    unit: &mut Unit,
    state: &mut Snapshot,
    ctx: &mut TickContext<'_>,
    _primary: Option<usize>,
) -> Option<u32> {
    let (origin, facing) = (unit.x, unit.side.facing());
    let hits = enemies_where(&state.units, unit.side, |u| {
        let ahead = (u.x - origin) * facing;
        ahead > 0.0 && ahead <= SLIME_WAVE_RANGE
    });
    if hits.is_empty() {
        return None;
    }

    for &index in &hits {
        let target = &mut state.units[index];
        let amount = apply_mitigated_damage(target, SLIME_WAVE_DAMAGE, ctx.now);
        target.effects.slow(ctx.now, SLIME_WAVE_SLOW_MS);
        ctx.events.damage.push(DamageEvent::new(
            Some(unit.id),
            DamageTarget::Unit(target.id),
            amount,
            DamageKind::Ability,
        ));
    }
    Some(hits.len() as u32)
}

fn fireburst(
    unit: &mut Unit,
    state: &mut Snapshot,
    ctx: &mut TickContext<'_>,
    _primary: Option<usize>,
) -> Option<u32> {
    let origin = unit.x;
    let hits = enemies_where(&state.units, unit.side, |u| {
        u.distance_to(origin) <= FIREBURST_RADIUS
    });
    if hits.is_empty() {
        return None;
    }

    for &index in &hits {
        let target = &mut state.units[index];
        let amount = apply_mitigated_damage(target, FIREBURST_DAMAGE, ctx.now);
        target.effects.slow(ctx.now, FIREBURST_SLOW_MS);
        ctx.events.damage.push(DamageEvent::new(
            Some(unit.id),
            DamageTarget::Unit(target.id),
            amount,
            DamageKind::Ability,
        ));
    }
    Some(hits.len() as u32)
}

fn shadow_grasp(
    _unit: &mut Unit,
    state: &mut Snapshot,
    ctx: &mut TickContext<'_>,
    primary: Option<usize>,
) -> Option<u32> {
    let target = &mut state.units[primary?];
    target.effects.root(ctx.now, SHADOW_GRASP_ROOT_MS);
    target.last_damage_time = Some(ctx.now);
    Some(1)
}
