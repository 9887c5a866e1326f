//! Battlefield geometry and DEFEND formation offsets.

use serde::{Deserialize, Serialize};

use crate::components::{Side, UnitType};
use crate::math::clamp_to_field;

/// Depth behind the defense front for each unit type, in field units.
///
/// Rows widen from the front: Small/Toxic, Paladin, Archer, Mage, Boss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormationOffsets {
    /// Worker depth (workers never hold formation).
    pub worker: f64,
    /// Small depth.
    pub small: f64,
    /// Toxic depth.
    pub toxic: f64,
    /// Archer depth.
    pub archer: f64,
    /// Mage depth.
    pub mage: f64,
    /// Paladin depth.
    pub paladin: f64,
    /// Boss depth.
    pub boss: f64,
}

impl FormationOffsets {
    /// Depth for a unit type.
    #[must_use]
    pub const fn depth(&self, unit_type: UnitType) -> f64 {
        match unit_type {
            UnitType::Worker => self.worker,
            UnitType::Small => self.small,
            UnitType::Toxic => self.toxic,
            UnitType::Archer => self.archer,
            UnitType::Mage => self.mage,
            UnitType::Paladin => self.paladin,
            UnitType::Boss => self.boss,
        }
    }
}

impl Default for FormationOffsets {
    fn default() -> Self {
        Self {
            worker: 0.0,
            small: 0.0,
            toxic: 0.0,
            archer: 7.0,
            mage: 10.0,
            paladin: 3.0,
            boss: 13.0,
        }
    }
}

/// Fixed positions on the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Player statue, also the player spawn point.
    pub player_statue_x: f64,
    /// Enemy statue, also the enemy spawn point.
    pub enemy_statue_x: f64,
    /// Player gold mine.
    pub player_mine_x: f64,
    /// Enemy gold mine.
    pub enemy_mine_x: f64,
    /// Distance from the own mine to the defense front, toward the enemy.
    pub defense_front_offset: f64,
    /// Per-type formation depth behind the front.
    pub formation: FormationOffsets,
    /// Workers start mining within this distance of the mine.
    pub mine_radius: f64,
    /// Workers start depositing within this distance of the statue.
    pub deposit_radius: f64,
    /// Retreating units stop within this distance of the statue.
    pub retreat_radius: f64,
    /// Defenders stop within this distance of their formation slot.
    pub formation_radius: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            player_statue_x: 5.0,
            enemy_statue_x: 95.0,
            player_mine_x: 20.0,
            enemy_mine_x: 80.0,
            defense_front_offset: 8.0,
            formation: FormationOffsets::default(),
            mine_radius: 1.0,
            deposit_radius: 2.0,
            retreat_radius: 2.0,
            formation_radius: 1.5,
        }
    }
}

impl Layout {
    /// Statue position of a side.
    #[must_use]
    pub const fn statue_x(&self, side: Side) -> f64 {
        match side {
            Side::Player => self.player_statue_x,
            Side::Enemy => self.enemy_statue_x,
        }
    }

    /// Where a side's recruits appear.
    #[must_use]
    pub const fn spawn_x(&self, side: Side) -> f64 {
        self.statue_x(side)
    }

    /// Gold mine of a side.
    #[must_use]
    pub const fn mine_x(&self, side: Side) -> f64 {
        match side {
            Side::Player => self.player_mine_x,
            Side::Enemy => self.enemy_mine_x,
        }
    }

    /// The line a defending side holds.
    #[must_use]
    pub fn defense_front(&self, side: Side) -> f64 {
        clamp_to_field(self.mine_x(side) + side.facing() * self.defense_front_offset)
    }

    /// Formation slot for a unit type under DEFEND.
    #[must_use]
    pub fn formation_slot(&self, side: Side, unit_type: UnitType) -> f64 {
        clamp_to_field(
            self.defense_front(side) - side.facing() * self.formation.depth(unit_type),
        )
    }
}
