//! Aggregate configuration loaded once before the first tick.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Layout, MapInfo, UnitTable};
use crate::components::Millis;
use crate::error::{GameError, Result};

/// Match-wide numeric rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    /// Hard cap on non-dying units per side.
    pub max_units: usize,
    /// Starting statue hit points.
    pub statue_hp: f64,
    /// Starting gold in a normal match.
    pub starting_gold: u32,
    /// Starting gold in surge mode.
    pub surge_gold: u32,
    /// Gold credited per worker deposit.
    pub deposit_amount: u32,
    /// Time a worker spends unloading at the statue.
    pub deposit_duration_ms: Millis,
    /// How long a dead unit stays in the collection.
    pub death_duration_ms: Millis,
    /// Units beyond this distance are ignored for targeting.
    pub aggro_range: f64,
    /// DEFEND units charge enemies closer than this.
    pub defend_aggro_range: f64,
    /// Largest simulated step per tick, in seconds.
    pub max_step_seconds: f64,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            max_units: 30,
            statue_hp: 2_000.0,
            starting_gold: 50,
            surge_gold: 2_000,
            deposit_amount: 20,
            deposit_duration_ms: 500,
            death_duration_ms: 1_500,
            aggro_range: 30.0,
            defend_aggro_range: 8.0,
            max_step_seconds: 0.05,
        }
    }
}

/// Everything the engine reads but never writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Per-type cost and stats.
    pub units: UnitTable,
    /// Field geometry and formation.
    pub layout: Layout,
    /// Numeric rules.
    pub rules: Rules,
    /// Available maps.
    pub maps: Vec<MapInfo>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            units: UnitTable::default(),
            layout: Layout::default(),
            rules: Rules::default(),
            maps: MapInfo::builtin(),
        }
    }
}

impl GameConfig {
    /// Load a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| GameError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents, &path.display().to_string())
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        Self::parse(ron, "<inline>")
    }

    fn parse(ron: &str, origin: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron).map_err(|e| GameError::DataParseError {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::Serialization(e.to_string()))
    }

    /// Reject tables the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.units.validate().map_err(GameError::InvalidConfig)?;
        if self.rules.max_units == 0 {
            return Err(GameError::InvalidConfig("max_units must be positive".into()));
        }
        if !(self.rules.max_step_seconds > 0.0) {
            return Err(GameError::InvalidConfig(
                "max_step_seconds must be positive".into(),
            ));
        }
        if self.layout.player_statue_x >= self.layout.enemy_statue_x {
            return Err(GameError::InvalidConfig(
                "player statue must sit left of the enemy statue".into(),
            ));
        }
        if self.maps.is_empty() {
            return Err(GameError::InvalidConfig("at least one map is required".into()));
        }
        Ok(())
    }

    /// Look up map metadata by id.
    pub fn map(&self, id: &str) -> Result<&MapInfo> {
        self.maps
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| GameError::UnknownMap(id.to_string()))
    }
}
