//! Unit stat tables.

use serde::{Deserialize, Serialize};

use crate::components::UnitType;

/// Combat and movement statistics for a unit type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Maximum hit points.
    pub hp: f64,
    /// Base damage per basic attack.
    pub damage: f64,
    /// Attack reach in field units.
    pub range: f64,
    /// Walking speed in field units per second.
    pub speed: f64,
    /// Minimum time between basic attacks. Workers use it as harvest time.
    pub attack_interval_ms: u64,
}

/// Immutable configuration for one unit type.
///
/// # Example RON
///
/// ```ron
/// UnitTypeConfig(
///     cost: 120,
///     stats: UnitStats(
///         hp: 120.0,
///         damage: 70.0,
///         range: 20.0,
///         speed: 6.0,
///         attack_interval_ms: 2500,
///     ),
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitTypeConfig {
    /// Gold cost to recruit.
    pub cost: u32,
    /// Stats applied on spawn.
    pub stats: UnitStats,
}

impl UnitTypeConfig {
    const fn new(
        cost: u32,
        hp: f64,
        damage: f64,
        range: f64,
        speed: f64,
        attack_interval_ms: u64,
    ) -> Self {
        Self {
            cost,
            stats: UnitStats {
                hp,
                damage,
                range,
                speed,
                attack_interval_ms,
            },
        }
    }
}

/// One [`UnitTypeConfig`] per unit type.
///
/// Stored as named fields so every type always has an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitTable {
    /// Worker entry.
    pub worker: UnitTypeConfig,
    /// Small entry.
    pub small: UnitTypeConfig,
    /// Toxic entry.
    pub toxic: UnitTypeConfig,
    /// Archer entry.
    pub archer: UnitTypeConfig,
    /// Mage entry.
    pub mage: UnitTypeConfig,
    /// Paladin entry.
    pub paladin: UnitTypeConfig,
    /// Boss entry.
    pub boss: UnitTypeConfig,
}

impl UnitTable {
    /// Config for a unit type.
    #[must_use]
    pub const fn get(&self, unit_type: UnitType) -> &UnitTypeConfig {
        match unit_type {
            UnitType::Worker => &self.worker,
            UnitType::Small => &self.small,
            UnitType::Toxic => &self.toxic,
            UnitType::Archer => &self.archer,
            UnitType::Mage => &self.mage,
            UnitType::Paladin => &self.paladin,
            UnitType::Boss => &self.boss,
        }
    }

    /// Mutable config for a unit type.
    pub fn get_mut(&mut self, unit_type: UnitType) -> &mut UnitTypeConfig {
        match unit_type {
            UnitType::Worker => &mut self.worker,
            UnitType::Small => &mut self.small,
            UnitType::Toxic => &mut self.toxic,
            UnitType::Archer => &mut self.archer,
            UnitType::Mage => &mut self.mage,
            UnitType::Paladin => &mut self.paladin,
            UnitType::Boss => &mut self.boss,
        }
    }

    /// Gold cost of a unit type.
    #[must_use]
    pub const fn cost(&self, unit_type: UnitType) -> u32 {
        self.get(unit_type).cost
    }

    /// Stats of a unit type.
    #[must_use]
    pub const fn stats(&self, unit_type: UnitType) -> &UnitStats {
        &self.get(unit_type).stats
    }

    /// Check that every entry is usable.
    pub fn validate(&self) -> Result<(), String> {
        for unit_type in UnitType::ALL {
            let stats = self.stats(unit_type);
            if !(stats.hp > 0.0) {
                return Err(format!("{unit_type}: hp must be positive"));
            }
            if stats.damage < 0.0 || stats.range < 0.0 || stats.speed < 0.0 {
                return Err(format!("{unit_type}: damage, range and speed must not be negative"));
            }
        }
        Ok(())
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        Self {
            worker: UnitTypeConfig::new(50, 100.0, 0.0, 1.0, 6.0, 3_000),
            small: UnitTypeConfig::new(80, 180.0, 20.0, 2.0, 8.0, 1_000),
            toxic: UnitTypeConfig::new(100, 150.0, 12.0, 2.0, 9.0, 900),
            archer: UnitTypeConfig::new(120, 120.0, 70.0, 20.0, 6.0, 2_500),
            mage: UnitTypeConfig::new(250, 220.0, 35.0, 12.0, 5.0, 2_000),
            paladin: UnitTypeConfig::new(200, 600.0, 40.0, 2.5, 5.0, 1_500),
            boss: UnitTypeConfig::new(800, 2_500.0, 80.0, 4.0, 3.0, 2_200),
        }
    }
}
