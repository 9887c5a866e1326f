//! Match metrics collection for balance analysis.
//!
//! A [`MetricsCollector`] watches the events of every tick and folds them
//! into per-side [`SideMetrics`]. [`BatchSummary`] aggregates many matches.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use siege_core::combat::DamageTarget;
use siege_core::components::{EntityId, Side, UnitType};
use siege_core::simulation::{GameStatus, Snapshot, TickEvents};

/// Complete metrics for a single match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Scenario name.
    pub scenario: String,
    /// Seed used.
    pub seed: u64,
    /// Ticks run.
    pub duration_ticks: u64,
    /// Match clock at the end.
    pub duration_ms: u64,
    /// Winning side, `None` for a draw.
    pub winner: Option<String>,
    /// How the match ended.
    pub win_condition: String,
    /// Per-side metrics.
    pub sides: BTreeMap<String, SideMetrics>,
    /// Final state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl GameMetrics {
    /// New, empty metrics.
    #[must_use]
    pub fn new(game_id: impl Into<String>, scenario: impl Into<String>, seed: u64) -> Self {
        Self {
            game_id: game_id.into(),
            scenario: scenario.into(),
            seed,
            ..Default::default()
        }
    }

    /// Get or create a side's metrics.
    pub fn side_mut(&mut self, side: Side) -> &mut SideMetrics {
        self.sides.entry(side.to_string()).or_default()
    }

    /// A side's metrics, if it did anything.
    #[must_use]
    pub fn side(&self, side: Side) -> Option<&SideMetrics> {
        self.sides.get(&side.to_string())
    }
}

/// Metrics for one side in one match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideMetrics {
    /// Units bought, by type.
    pub units_recruited: BTreeMap<String, u32>,
    /// Minions summoned by Mages.
    pub units_summoned: u32,
    /// Units that died, by type.
    pub units_lost: BTreeMap<String, u32>,
    /// Recruits dropped for gold or capacity.
    pub recruits_rejected: u32,
    /// Gold deposited by workers.
    pub gold_mined: u32,
    /// Damage dealt to enemy units.
    pub damage_dealt: f64,
    /// Damage dealt to the enemy statue.
    pub statue_damage: f64,
    /// Abilities cast.
    pub abilities_cast: u32,
    /// Most live units at once.
    pub peak_army_size: u32,
    /// Tick of the first hit on anything enemy.
    pub first_attack_tick: Option<u64>,
    /// Gold at the end.
    pub final_gold: u32,
    /// Statue hit points at the end.
    pub final_statue_hp: f64,
}

impl SideMetrics {
    /// Total units bought.
    #[must_use]
    pub fn total_recruited(&self) -> u32 {
        self.units_recruited.values().sum()
    }

    /// Total units lost.
    #[must_use]
    pub fn total_lost(&self) -> u32 {
        self.units_lost.values().sum()
    }
}

/// Tracks events during a match.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    metrics: GameMetrics,
    owners: HashMap<EntityId, (Side, UnitType)>,
}

impl MetricsCollector {
    /// New collector.
    #[must_use]
    pub fn new(game_id: &str, scenario: &str, seed: u64) -> Self {
        Self {
            metrics: GameMetrics::new(game_id, scenario, seed),
            owners: HashMap::new(),
        }
    }

    /// Remember who owns every unit already on the field.
    pub fn register_existing(&mut self, snapshot: &Snapshot) {
        for unit in &snapshot.units {
            self.owners.insert(unit.id, (unit.side, unit.unit_type));
        }
    }

    fn learn(&mut self, snapshot: &Snapshot, id: EntityId) -> Option<(Side, UnitType)> {
        if let Some(unit) = snapshot.unit(id) {
            self.owners.insert(id, (unit.side, unit.unit_type));
        }
        self.owners.get(&id).copied()
    }

    /// Fold one tick's events in.
    pub fn observe(&mut self, tick: u64, events: &TickEvents, snapshot: &Snapshot) {
        for &id in &events.recruited {
            if let Some((side, unit_type)) = self.learn(snapshot, id) {
                *self
                    .metrics
                    .side_mut(side)
                    .units_recruited
                    .entry(unit_type.to_string())
                    .or_default() += 1;
            }
        }
        for &id in &events.summoned {
            if let Some((side, _)) = self.learn(snapshot, id) {
                self.metrics.side_mut(side).units_summoned += 1;
            }
        }
        for rejected in &events.rejected {
            self.metrics.side_mut(rejected.side).recruits_rejected += 1;
        }
        for deposit in &events.deposits {
            self.metrics.side_mut(deposit.side).gold_mined += deposit.amount;
        }
        for cast in &events.abilities {
            if let Some((side, _)) = self.learn(snapshot, cast.caster) {
                self.metrics.side_mut(side).abilities_cast += 1;
            }
        }
        for hit in &events.damage {
            let Some((side, _)) = hit.source.and_then(|id| self.learn(snapshot, id)) else {
                continue;
            };
            let metrics = self.metrics.side_mut(side);
            match hit.target {
                DamageTarget::Statue(_) => metrics.statue_damage += hit.amount,
                DamageTarget::Unit(_) => metrics.damage_dealt += hit.amount,
            }
            metrics.first_attack_tick.get_or_insert(tick);
        }
        for &id in &events.deaths {
            if let Some((side, unit_type)) = self.learn(snapshot, id) {
                *self
                    .metrics
                    .side_mut(side)
                    .units_lost
                    .entry(unit_type.to_string())
                    .or_default() += 1;
            }
        }
        for &id in &events.removed {
            self.owners.remove(&id);
        }

        for side in Side::ALL {
            let live = snapshot.live_count(side) as u32;
            let metrics = self.metrics.side_mut(side);
            metrics.peak_army_size = metrics.peak_army_size.max(live);
        }
    }

    /// Record the outcome and hand the metrics over.
    #[must_use]
    pub fn finish(mut self, ticks: u64, snapshot: &Snapshot) -> GameMetrics {
        for side in Side::ALL {
            let metrics = self.metrics.side_mut(side);
            metrics.final_gold = *snapshot.gold.get(side);
            metrics.final_statue_hp = *snapshot.statue_hp.get(side);
        }

        let (winner, condition) = match snapshot.game_status {
            GameStatus::Victory => (Some(Side::Player.to_string()), "statue_destroyed"),
            GameStatus::Defeat => (Some(Side::Enemy.to_string()), "statue_destroyed"),
            GameStatus::Playing => (None, "timeout"),
        };
        self.metrics.duration_ticks = ticks;
        self.metrics.duration_ms = snapshot.last_tick;
        self.metrics.winner = winner;
        self.metrics.win_condition = condition.to_string();
        self.metrics.final_state_hash = snapshot.state_hash();
        self.metrics
    }
}

/// Aggregate over many matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches included.
    pub total_games: u32,
    /// Wins by side.
    pub wins_by_side: BTreeMap<String, u32>,
    /// Matches that hit the tick limit.
    pub draws: u32,
    /// Win rate by side.
    pub win_rates: BTreeMap<String, f64>,
    /// Average ticks per match.
    pub avg_duration_ticks: f64,
    /// Shortest match.
    pub min_duration_ticks: u64,
    /// Longest match.
    pub max_duration_ticks: u64,
    /// Average units bought per match, by side.
    pub avg_units_recruited: BTreeMap<String, f64>,
    /// Average gold mined per match, by side.
    pub avg_gold_mined: BTreeMap<String, f64>,
    /// Average tick of the first hit, by side.
    pub avg_first_attack_tick: BTreeMap<String, f64>,
}

impl BatchSummary {
    /// Summarize a list of matches.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_games: games.len() as u32,
            min_duration_ticks: u64::MAX,
            ..Default::default()
        };

        let mut duration_sum = 0u64;
        let mut recruited: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        let mut mined: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        let mut first_attack: BTreeMap<String, Vec<u64>> = BTreeMap::new();

        for game in games {
            duration_sum += game.duration_ticks;
            summary.min_duration_ticks = summary.min_duration_ticks.min(game.duration_ticks);
            summary.max_duration_ticks = summary.max_duration_ticks.max(game.duration_ticks);

            match &game.winner {
                Some(winner) => *summary.wins_by_side.entry(winner.clone()).or_default() += 1,
                None => summary.draws += 1,
            }

            for (side, metrics) in &game.sides {
                recruited.entry(side.clone()).or_default().push(metrics.total_recruited());
                mined.entry(side.clone()).or_default().push(metrics.gold_mined);
                if let Some(tick) = metrics.first_attack_tick {
                    first_attack.entry(side.clone()).or_default().push(tick);
                }
            }
        }

        summary.avg_duration_ticks = duration_sum as f64 / games.len() as f64;
        for (side, wins) in &summary.wins_by_side {
            summary
                .win_rates
                .insert(side.clone(), f64::from(*wins) / f64::from(summary.total_games));
        }
        for (side, values) in recruited {
            let avg = values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64;
            summary.avg_units_recruited.insert(side, avg);
        }
        for (side, values) in mined {
            let avg = values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64;
            summary.avg_gold_mined.insert(side, avg);
        }
        for (side, values) in first_attack {
            let avg = values.iter().sum::<u64>() as f64 / values.len() as f64;
            summary.avg_first_attack_tick.insert(side, avg);
        }

        summary
    }

    /// Whether every side's win rate is within `threshold` of one half.
    #[must_use]
    pub fn is_balanced(&self, threshold: f64) -> bool {
        self.win_rates.values().all(|rate| (rate - 0.5).abs() <= threshold)
    }

    /// The side winning more than half the matches by `threshold`, if any.
    #[must_use]
    pub fn dominant_side(&self, threshold: f64) -> Option<&str> {
        self.win_rates
            .iter()
            .find(|(_, rate)| **rate > 0.5 + threshold)
            .map(|(side, _)| side.as_str())
    }
}
