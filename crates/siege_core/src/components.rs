//! Entity model: sides, unit kinds, units and projectiles.
//!
//! Records here are plain data. Behavior lives in the systems that read
//! and write them each tick.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::status::StatusEffects;

/// Unique identifier for units and projectiles.
///
/// Ids come from a per-match counter carried in the snapshot, so two runs
/// of the same match hand out identical ids.
pub type EntityId = u64;

/// Simulation timestamp in milliseconds.
pub type Millis = u64;

// ============================================================================
// Sides and commands
// ============================================================================

/// One of the two competing armies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The local / host army, statue on the left edge.
    Player,
    /// The opposing army, statue on the right edge.
    Enemy,
}

impl Side {
    /// Both sides in canonical order.
    pub const ALL: [Side; 2] = [Side::Player, Side::Enemy];

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }

    /// Direction this side's units face and advance in (`+1` or `-1`).
    #[must_use]
    pub const fn facing(self) -> f64 {
        match self {
            Side::Player => 1.0,
            Side::Enemy => -1.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Player => f.write_str("player"),
            Side::Enemy => f.write_str("enemy"),
        }
    }
}

/// Standing order issued to a whole side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// March on the enemy statue, charging anything seen on the way.
    Attack,
    /// Hold formation near the own mine, engaging only close threats.
    #[default]
    Defend,
    /// Fall back to the own statue and do nothing else.
    Retreat,
}

/// A value kept once per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerSide<T> {
    /// Player-side value.
    pub player: T,
    /// Enemy-side value.
    pub enemy: T,
}

impl<T> PerSide<T> {
    /// Create from explicit values.
    pub const fn new(player: T, enemy: T) -> Self {
        Self { player, enemy }
    }

    /// Value for a side.
    pub const fn get(&self, side: Side) -> &T {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    /// Mutable value for a side.
    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        }
    }
}

impl<T: Clone> PerSide<T> {
    /// Same value on both sides.
    pub fn splat(value: T) -> Self {
        Self {
            player: value.clone(),
            enemy: value,
        }
    }
}

// ============================================================================
// Unit kinds and states
// ============================================================================

/// Kind of combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    /// Gold miner; never fights.
    Worker,
    /// Cheap melee infantry.
    Small,
    /// Melee unit that poisons on hit.
    Toxic,
    /// Ranged unit firing projectiles.
    Archer,
    /// Caster with area and crowd-control abilities; summons Smalls.
    Mage,
    /// Armored melee tank.
    Paladin,
    /// Slime boss: area melee, two abilities and an enrage passive.
    Boss,
}

impl UnitType {
    /// All unit types in table order.
    pub const ALL: [UnitType; 7] = [
        UnitType::Worker,
        UnitType::Small,
        UnitType::Toxic,
        UnitType::Archer,
        UnitType::Mage,
        UnitType::Paladin,
        UnitType::Boss,
    ];

    /// Velocity smoothing rate. Higher is snappier.
    #[must_use]
    pub const fn agility(self) -> f64 {
        match self {
            UnitType::Worker => 10.0,
            UnitType::Small => 12.0,
            UnitType::Toxic => 8.0,
            UnitType::Archer => 7.0,
            UnitType::Mage => 5.0,
            UnitType::Paladin => 4.0,
            UnitType::Boss => 2.0,
        }
    }

    /// Heavy frontliners, counted as tanks by the opponent policy.
    #[must_use]
    pub const fn is_tank(self) -> bool {
        matches!(self, UnitType::Paladin | UnitType::Boss)
    }

    /// Units that fight from range.
    #[must_use]
    pub const fn is_ranged(self) -> bool {
        matches!(self, UnitType::Archer | UnitType::Mage)
    }

    /// Cheap units fielded in numbers.
    #[must_use]
    pub const fn is_swarm(self) -> bool {
        matches!(self, UnitType::Toxic | UnitType::Small)
    }

    /// Lowercase display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            UnitType::Worker => "worker",
            UnitType::Small => "small",
            UnitType::Toxic => "toxic",
            UnitType::Archer => "archer",
            UnitType::Mage => "mage",
            UnitType::Paladin => "paladin",
            UnitType::Boss => "boss",
        }
    }

    /// Parse a display name back into a unit type.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Behavioral state of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitState {
    /// Standing still.
    #[default]
    Idle,
    /// Moving toward some destination.
    Walking,
    /// Engaged with a target or the enemy statue.
    Attacking,
    /// Dead, waiting for the death animation window to elapse.
    Dying,
    /// Worker harvesting at the mine.
    Mining,
    /// Worker unloading gold at the statue.
    Depositing,
}

// ============================================================================
// Units
// ============================================================================

/// One battlefield combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Unique id.
    pub id: EntityId,
    /// Kind of unit.
    pub unit_type: UnitType,
    /// Owning army.
    pub side: Side,
    /// Summoning Mage, if this unit is a minion.
    #[serde(default)]
    pub owner_id: Option<EntityId>,

    /// Position on the field.
    pub x: f64,
    /// Signed smoothed speed in units per second.
    pub current_speed: f64,

    /// Current hit points. May dip below zero until cleanup runs.
    pub hp: f64,
    /// Maximum hit points.
    pub max_hp: f64,

    /// Behavioral state.
    pub state: UnitState,

    /// Last basic attack, or the moment a worker began mining/depositing.
    pub last_attack_time: Option<Millis>,
    /// Moment the unit entered [`UnitState::Dying`].
    pub death_time: Option<Millis>,
    /// Last Mage summon.
    pub last_summon_time: Option<Millis>,
    /// Last use of the ability in slot 1.
    pub last_ability1_time: Option<Millis>,
    /// Last use of the ability in slot 2.
    pub last_ability2_time: Option<Millis>,
    /// Last time the unit visibly took damage.
    pub last_damage_time: Option<Millis>,

    /// Active stun/root/poison/slow effects.
    #[serde(default)]
    pub effects: StatusEffects,

    /// Worker is carrying gold.
    pub has_gold: bool,
    /// Basic attacks landed (Boss combo counter).
    pub attack_count: u32,
    /// Boss enrage latch. Never resets.
    pub is_enraged: bool,
    /// Last damage taken, floored. Display only.
    pub last_damage_amount: u32,

    /// Nearest visible enemy. Display only.
    #[serde(default)]
    pub target_id: Option<EntityId>,
}

impl Unit {
    /// Create a fresh unit at full health.
    #[must_use]
    pub fn new(id: EntityId, unit_type: UnitType, side: Side, x: f64, max_hp: f64) -> Self {
        Self {
            id,
            unit_type,
            side,
            owner_id: None,
            x,
            current_speed: 0.0,
            hp: max_hp,
            max_hp,
            state: UnitState::Idle,
            last_attack_time: None,
            death_time: None,
            last_summon_time: None,
            last_ability1_time: None,
            last_ability2_time: None,
            last_damage_time: None,
            effects: StatusEffects::default(),
            has_gold: false,
            attack_count: 0,
            is_enraged: false,
            last_damage_amount: 0,
            target_id: None,
        }
    }

    /// In the death animation window.
    #[must_use]
    pub fn is_dying(&self) -> bool {
        self.state == UnitState::Dying
    }

    /// Targetable and still acting: not dying and above zero hp.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.is_dying() && self.hp > 0.0
    }

    /// Counts toward its side's capacity.
    #[must_use]
    pub fn occupies_slot(&self) -> bool {
        !self.is_dying()
    }

    /// Absolute distance to a position.
    #[must_use]
    pub fn distance_to(&self, x: f64) -> f64 {
        (self.x - x).abs()
    }

    /// Fraction of maximum health remaining.
    #[must_use]
    pub fn hp_fraction(&self) -> f64 {
        if self.max_hp <= 0.0 {
            0.0
        } else {
            self.hp / self.max_hp
        }
    }

    /// Record visible damage for the presentation flash.
    pub fn flash_damage(&mut self, amount: f64, now: Millis) {
        self.last_damage_time = Some(now);
        self.last_damage_amount = amount.max(0.0).floor() as u32;
    }

    /// Enter the dying state. Returns `false` if already dying.
    pub fn begin_dying(&mut self, now: Millis) -> bool {
        if self.is_dying() {
            return false;
        }
        self.state = UnitState::Dying;
        self.death_time = Some(now);
        self.current_speed = 0.0;
        true
    }
}

// ============================================================================
// Projectiles
// ============================================================================

/// A ranged shot in flight.
///
/// The impact point is fixed at spawn; projectiles do not home.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Unique id.
    pub id: EntityId,
    /// Current position.
    pub x: f64,
    /// Impact point.
    pub target_x: f64,
    /// Unit aimed at, if any.
    #[serde(default)]
    pub target_id: Option<EntityId>,
    /// Raw damage on impact.
    pub damage: f64,
    /// Units per second.
    pub speed: f64,
    /// Side that fired it.
    pub side: Side,
    /// Spawn time.
    pub created_at: Millis,
}
