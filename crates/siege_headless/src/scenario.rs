//! Scenario loading and configuration.
//!
//! A scenario describes how a match starts: map, gold mode, which sides
//! the opponent policy plays, standing commands, free unit placements and
//! an optional generated enemy army. Scenarios are RON files or one of
//! the built-ins returned by [`Scenario::named`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use siege_core::army::{army_or_fallback, BuiltinGenerator};
use siege_core::components::{Command, PerSide, Side, UnitType};
use siege_core::data::{GameConfig, DEFAULT_MAP_ID};
use siege_core::simulation::{MatchConfig, Simulation};

use crate::error::ScenarioError;

/// A unit placed for free before the first tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Kind of unit.
    pub unit_type: UnitType,
    /// Owning side.
    pub side: Side,
    /// Position. Defaults to the spawn point for workers and the
    /// formation slot for everyone else.
    #[serde(default)]
    pub x: Option<f64>,
}

/// A complete match setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Map id.
    pub map_id: String,
    /// Start both sides with surge gold.
    pub surge: bool,
    /// Sides played by the opponent policy.
    pub ai_sides: Vec<Side>,
    /// Standing commands at the start.
    pub commands: PerSide<Command>,
    /// Free placements, in order.
    pub units: Vec<Placement>,
    /// Power rating for a generated enemy army, if any.
    pub enemy_army_power: Option<u32>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

impl Scenario {
    /// Both sides played by the opponent policy from surge gold.
    #[must_use]
    pub fn skirmish() -> Self {
        Self {
            name: "skirmish".to_string(),
            description: "Policy against policy, surge gold".to_string(),
            map_id: DEFAULT_MAP_ID.to_string(),
            surge: true,
            ai_sides: vec![Side::Player, Side::Enemy],
            commands: PerSide::splat(Command::Defend),
            units: Vec::new(),
            enemy_army_power: None,
        }
    }

    /// Policy against policy from normal starting gold.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            name: "standard".to_string(),
            description: "Policy against policy, starting gold".to_string(),
            surge: false,
            ..Self::skirmish()
        }
    }

    /// Policy against a generated high-power army.
    #[must_use]
    pub fn boss_rush() -> Self {
        Self {
            name: "boss_rush".to_string(),
            description: "Surge-gold policy against a generated Boss army".to_string(),
            enemy_army_power: Some(1_000),
            ..Self::skirmish()
        }
    }

    /// A built-in scenario by name.
    #[must_use]
    pub fn named(name: &str) -> Option<Self> {
        match name {
            "skirmish" => Some(Self::skirmish()),
            "standard" => Some(Self::standard()),
            "boss_rush" => Some(Self::boss_rush()),
            _ => None,
        }
    }

    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Parse a scenario from RON text. Missing fields take skirmish values.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        Ok(ron::from_str(ron)?)
    }

    /// A built-in name, or else a path to a RON file.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        if let Some(scenario) = Self::named(name_or_path) {
            return Ok(scenario);
        }
        let path = Path::new(name_or_path);
        if path.is_file() {
            return Self::load(path);
        }
        Err(ScenarioError::UnknownScenario(name_or_path.to_string()))
    }

    /// Match settings for a seed.
    #[must_use]
    pub fn match_config(&self, seed: u64) -> MatchConfig {
        MatchConfig {
            map_id: self.map_id.clone(),
            seed,
            surge: self.surge,
            ai_sides: self.ai_sides.clone(),
        }
    }

    /// Whether the whole setup is captured by the match settings, so a
    /// replay can rebuild it.
    #[must_use]
    pub fn is_replayable(&self) -> bool {
        self.units.is_empty()
            && self.enemy_army_power.is_none()
            && self.commands == PerSide::splat(Command::Defend)
    }

    /// Build the simulation for `seed`, starting at time 0.
    pub fn build(&self, config: GameConfig, seed: u64) -> Result<Simulation, ScenarioError> {
        config.map(&self.map_id)?;
        let mut sim = Simulation::new(config, &self.match_config(seed), 0);
        sim.snapshot_mut().commands = self.commands;

        for placement in &self.units {
            let layout = &sim.config().layout;
            let x = placement.x.unwrap_or_else(|| {
                if placement.unit_type == UnitType::Worker {
                    layout.spawn_x(placement.side)
                } else {
                    layout.formation_slot(placement.side, placement.unit_type)
                }
            });
            sim.place_unit(placement.unit_type, placement.side, x);
        }

        if let Some(power) = self.enemy_army_power {
            army_or_fallback(&BuiltinGenerator, power).deploy(&mut sim, Side::Enemy);
        }

        tracing::debug!(scenario = %self.name, seed, units = sim.snapshot().units.len(), "Scenario built");
        Ok(sim)
    }
}
