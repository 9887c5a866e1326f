//! Damage resolution shared by melee, ability and projectile hits.
//!
//! Armor is a flat percentage per unit type:
//! - Paladins take 70% of raw damage.
//! - Bosses take 85% of raw damage, or 80% once below 40% health.
//!
//! The multipliers compose multiplicatively; no unit type carries both.
//! Hit points drop by the unrounded mitigated value, only the displayed
//! amount is floored.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Millis, Side, Unit, UnitType};

/// Paladin damage multiplier.
pub const PALADIN_MULTIPLIER: f64 = 0.7;

/// Boss damage multiplier above the low-health threshold.
pub const BOSS_MULTIPLIER: f64 = 1.0 - 0.15;

/// Boss damage multiplier below the low-health threshold.
pub const BOSS_LOW_HP_MULTIPLIER: f64 = 1.0 - 0.20;

/// Health fraction below which the Boss hardens.
pub const BOSS_LOW_HP_THRESHOLD: f64 = 0.4;

/// What a hit landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageTarget {
    /// A unit.
    Unit(EntityId),
    /// A side's statue.
    Statue(Side),
}

/// How the damage was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageKind {
    /// Basic melee or caster hit.
    Melee,
    /// Projectile impact.
    Projectile,
    /// Ability effect.
    Ability,
    /// Poison tick.
    Poison,
    /// Direct hit on a statue.
    Siege,
}

/// A resolved hit, for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// Attacker, when there is one.
    pub source: Option<EntityId>,
    /// Victim.
    pub target: DamageTarget,
    /// Hit points removed.
    pub amount: f64,
    /// Floored amount for floating text.
    pub display: u32,
    /// Delivery.
    pub kind: DamageKind,
}

impl DamageEvent {
    /// Build an event, flooring the display amount.
    #[must_use]
    pub fn new(
        source: Option<EntityId>,
        target: DamageTarget,
        amount: f64,
        kind: DamageKind,
    ) -> Self {
        Self {
            source,
            target,
            amount,
            display: amount.max(0.0).floor() as u32,
            kind,
        }
    }
}

/// Damage multiplier for a unit at its current health.
#[must_use]
pub fn mitigation_multiplier(unit: &Unit) -> f64 {
    let mut multiplier = 1.0;
    if unit.unit_type == UnitType::Paladin {
        multiplier *= PALADIN_MULTIPLIER;
    }
    if unit.unit_type == UnitType::Boss {
        multiplier *= if unit.hp < unit.max_hp * BOSS_LOW_HP_THRESHOLD {
            BOSS_LOW_HP_MULTIPLIER
        } else {
            BOSS_MULTIPLIER
        };
    }
    multiplier
}

/// Raw damage after armor.
#[must_use]
pub fn mitigated_damage(unit: &Unit, raw: f64) -> f64 {
    raw * mitigation_multiplier(unit)
}

/// Apply armored damage and flash it. Returns hit points removed.
pub fn apply_mitigated_damage(unit: &mut Unit, raw: f64, now: Millis) -> f64 {
    let amount = mitigated_damage(unit, raw);
    unit.hp -= amount;
    unit.flash_damage(amount, now);
    amount
}

/// Apply damage that ignores armor and flash it. Returns hit points removed.
pub fn apply_flat_damage(unit: &mut Unit, amount: f64, now: Millis) -> f64 {
    unit.hp -= amount;
    unit.flash_damage(amount, now);
    amount
}
