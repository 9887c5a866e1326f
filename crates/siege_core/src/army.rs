//! Opponent generation at match setup.
//!
//! An [`ArmyGenerator`] turns a player power rating into a starting army
//! and, after the match, into a short battle report. Generators may be
//! remote and may fail; callers go through [`army_or_fallback`] and
//! [`report_or_fallback`], which never fail and never block beyond the
//! generator call itself.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{EntityId, Side, UnitType};
use crate::simulation::{GameStatus, Simulation};

/// Why a generator could not produce a result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArmyError {
    /// The service could not be reached.
    #[error("army generator unavailable: {0}")]
    Unavailable(String),

    /// The service did not answer in time.
    #[error("army generator timed out after {0}ms")]
    Timeout(u64),

    /// The service answered with something unusable.
    #[error("malformed army description: {0}")]
    Malformed(String),
}

/// Rough challenge level of a generated army.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Early game.
    Easy,
    /// Default.
    Normal,
    /// Experienced players.
    Hard,
    /// Boss-led armies.
    Nightmare,
}

impl Difficulty {
    /// Difficulty tier for a power rating.
    #[must_use]
    pub const fn for_power(power: u32) -> Self {
        match power {
            0..=199 => Difficulty::Easy,
            200..=599 => Difficulty::Normal,
            600..=999 => Difficulty::Hard,
            _ => Difficulty::Nightmare,
        }
    }
}

/// A number of units of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmyEntry {
    /// Type to place.
    pub unit_type: UnitType,
    /// How many.
    pub count: u32,
}

/// A generated starting army.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmyDescription {
    /// Flavor name.
    pub name: String,
    /// Units to place.
    pub units: Vec<ArmyEntry>,
    /// Challenge level.
    pub difficulty: Difficulty,
    /// Gold awarded for beating it.
    pub reward: u32,
}

impl ArmyDescription {
    /// Total units described.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.units.iter().map(|e| e.count).sum()
    }

    /// Reject descriptions with nothing to place.
    pub fn validate(&self) -> Result<(), ArmyError> {
        if self.unit_count() == 0 {
            return Err(ArmyError::Malformed(format!("army '{}' has no units", self.name)));
        }
        Ok(())
    }

    /// Place the army for free on `side`, stopping at capacity.
    ///
    /// Workers appear at the spawn point, everyone else on their formation
    /// slot. Returns the ids placed in description order.
    pub fn deploy(&self, sim: &mut Simulation, side: Side) -> Vec<EntityId> {
        let max_units = sim.config().rules.max_units;
        let mut placed = Vec::new();

        'entries: for entry in &self.units {
            for _ in 0..entry.count {
                if sim.snapshot().live_count(side) >= max_units {
                    tracing::debug!(army = %self.name, "Army truncated at capacity");
                    break 'entries;
                }
                let layout = &sim.config().layout;
                let x = if entry.unit_type == UnitType::Worker {
                    layout.spawn_x(side)
                } else {
                    layout.formation_slot(side, entry.unit_type)
                };
                placed.push(sim.place_unit(entry.unit_type, side, x));
            }
        }

        tracing::info!(army = %self.name, %side, placed = placed.len(), "Army deployed");
        placed
    }
}

/// A short narrative of a finished match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReport {
    /// Headline.
    pub title: String,
    /// Body text.
    pub summary: String,
}

/// Source of generated opponents.
pub trait ArmyGenerator {
    /// An army appropriate for `power`.
    fn request_army(&self, power: u32) -> Result<ArmyDescription, ArmyError>;

    /// A report for a finished match.
    fn battle_report(&self, outcome: GameStatus, power: u32) -> Result<BattleReport, ArmyError>;
}

/// Built-in army for a power rating. Same input, same army.
#[must_use]
pub fn fallback_army(power: u32) -> ArmyDescription {
    let difficulty = Difficulty::for_power(power);
    let mut units = vec![
        ArmyEntry {
            unit_type: UnitType::Worker,
            count: 2,
        },
        ArmyEntry {
            unit_type: UnitType::Small,
            count: 2 + power / 150,
        },
        ArmyEntry {
            unit_type: UnitType::Archer,
            count: 1 + power / 300,
        },
    ];
    if power >= 300 {
        units.push(ArmyEntry {
            unit_type: UnitType::Paladin,
            count: power / 300,
        });
    }
    if difficulty == Difficulty::Nightmare {
        units.push(ArmyEntry {
            unit_type: UnitType::Boss,
            count: 1,
        });
    }

    ArmyDescription {
        name: "Goo Warband".to_string(),
        units,
        difficulty,
        reward: 100 + power / 2,
    }
}

/// Built-in report for an outcome.
#[must_use]
pub fn fallback_report(outcome: GameStatus) -> BattleReport {
    let (title, summary) = match outcome {
        GameStatus::Victory => ("Victory", "The enemy statue crumbles. The field is yours."),
        GameStatus::Defeat => ("Defeat", "Your statue has fallen. Regroup and return."),
        GameStatus::Playing => ("Stalemate", "Neither side broke through."),
    };
    BattleReport {
        title: title.to_string(),
        summary: summary.to_string(),
    }
}

/// Ask the generator, degrading to [`fallback_army`] on any failure.
pub fn army_or_fallback(generator: &dyn ArmyGenerator, power: u32) -> ArmyDescription {
    match generator
        .request_army(power)
        .and_then(|army| army.validate().map(|()| army))
    {
        Ok(army) => army,
        Err(error) => {
            tracing::warn!(%error, power, "Army generator failed, using built-in army");
            fallback_army(power)
        }
    }
}

/// Ask the generator, degrading to [`fallback_report`] on any failure.
pub fn report_or_fallback(
    generator: &dyn ArmyGenerator,
    outcome: GameStatus,
    power: u32,
) -> BattleReport {
    generator.battle_report(outcome, power).unwrap_or_else(|error| {
        tracing::warn!(%error, "Report generator failed, using built-in report");
        fallback_report(outcome)
    })
}

/// Generator that always answers with the built-in tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinGenerator;

impl ArmyGenerator for BuiltinGenerator {
    fn request_army(&self, power: u32) -> Result<ArmyDescription, ArmyError> {
        Ok(fallback_army(power))
    }

    fn battle_report(&self, outcome: GameStatus, _power: u32) -> Result<BattleReport, ArmyError> {
        Ok(fallback_report(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GameConfig;
    use crate::simulation::MatchConfig;

    struct Offline;

    impl ArmyGenerator for Offline {
        fn request_army(&self, _power: u32) -> Result<ArmyDescription, ArmyError> {
            Err(ArmyError::Unavailable("connection refused".into()))
        }

        fn battle_report(&self, _outcome: GameStatus, _power: u32) -> Result<BattleReport, ArmyError> {
            Err(ArmyError::Timeout(1_500))
        }
    }

    struct Empty;

    impl ArmyGenerator for Empty {
        fn request_army(&self, _power: u32) -> Result<ArmyDescription, ArmyError> {
            Ok(ArmyDescription {
                name: "Nobody".into(),
                units: Vec::new(),
                difficulty: Difficulty::Easy,
                reward: 0,
            })
        }

        fn battle_report(&self, outcome: GameStatus, _power: u32) -> Result<BattleReport, ArmyError> {
            Ok(fallback_report(outcome))
        }
    }

    #[test]
    fn test_fallback_is_deterministic_and_scales() {
        assert_eq!(fallback_army(450), fallback_army(450));
        assert!(fallback_army(900).unit_count() > fallback_army(100).unit_count());
        assert_eq!(fallback_army(50).difficulty, Difficulty::Easy);
        assert!(fallback_army(1_200)
            .units
            .iter()
            .any(|e| e.unit_type == UnitType::Boss));
    }

    #[test]
    fn test_failure_degrades_to_fallback() {
        assert_eq!(army_or_fallback(&Offline, 300), fallback_army(300));
        assert_eq!(
            report_or_fallback(&Offline, GameStatus::Victory, 300),
            fallback_report(GameStatus::Victory)
        );
    }

    #[test]
    fn test_empty_army_is_rejected() {
        assert_eq!(army_or_fallback(&Empty, 10), fallback_army(10));
    }

    #[test]
    fn test_deploy_respects_capacity() {
        let config = GameConfig::default();
        let mut sim = Simulation::new(config, &MatchConfig::default(), 0);
        let horde = ArmyDescription {
            name: "Horde".into(),
            units: vec![ArmyEntry {
                unit_type: UnitType::Small,
                count: 50,
            }],
            difficulty: Difficulty::Nightmare,
            reward: 0,
        };
        let placed = horde.deploy(&mut sim, Side::Enemy);
        assert_eq!(placed.len(), 30);
        assert_eq!(sim.snapshot().live_count(Side::Enemy), 30);
        assert_eq!(sim.snapshot().gold.enemy, 50, "deployment is free");
    }

    #[test]
    fn test_deploy_uses_formation_slots() {
        let mut sim = Simulation::new(GameConfig::default(), &MatchConfig::default(), 0);
        let ids = fallback_army(0).deploy(&mut sim, Side::Enemy);
        let worker = sim.snapshot().unit(ids[0]).unwrap();
        assert!((worker.x - 95.0).abs() < 1e-9);
        let archer = sim.snapshot().units.iter().find(|u| u.unit_type == UnitType::Archer).unwrap();
        assert!((archer.x - 79.0).abs() < 1e-9);
    }
}
