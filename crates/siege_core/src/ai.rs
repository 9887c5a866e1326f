//! Scripted opponent.
//!
//! The policy reads the latest snapshot and returns actions for the next
//! tick. It never mutates state directly, so every purchase it makes goes
//! through the same gold and capacity checks as a human click.
//!
//! Decision order: economy first (keep enough workers), then a counter-pick
//! against the opposing army, then the standing command.

use crate::actions::Action;
use crate::components::{Command, Millis, Side, UnitType};
use crate::data::GameConfig;
use crate::random::RandomSource;
use crate::simulation::Snapshot;

/// Minimum time between decisions.
pub const DECISION_INTERVAL_MS: Millis = 2_000;

/// Workers the policy always wants.
pub const MIN_WORKERS: usize = 2;

/// Workers the policy never exceeds.
pub const MAX_WORKERS: usize = 6;

/// Chance to add an Archer when nothing else is countered.
pub const ARCHER_CHANCE: f64 = 0.4;

/// Chance to save for a Boss once the army is big enough.
pub const SAVE_FOR_BOSS_CHANCE: f64 = 0.3;

/// Army size above which saving for a Boss is considered.
pub const SAVE_FOR_BOSS_ARMY: usize = 5;

/// Chance to buy a Toxic when the counter-pick is unaffordable.
pub const TOXIC_FALLBACK_CHANCE: f64 = 0.4;

/// Own/opposing ratio above which the policy attacks.
pub const ATTACK_RATIO: f64 = 1.4;

/// Own/opposing ratio below which an attacking policy retreats.
pub const RETREAT_RATIO: f64 = 0.5;

/// Counts of the opposing army by role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArmyProfile {
    /// Paladins and Bosses.
    pub tanks: usize,
    /// Archers and Mages.
    pub ranged: usize,
    /// Toxics and Smalls.
    pub swarm: usize,
}

impl ArmyProfile {
    /// Classify a side's live units.
    #[must_use]
    pub fn of(snapshot: &Snapshot, side: Side) -> Self {
        snapshot
            .live_units(side)
            .fold(Self::default(), |mut profile, unit| {
                let t = unit.unit_type;
                if t.is_tank() {
                    profile.tanks += 1;
                } else if t.is_ranged() {
                    profile.ranged += 1;
                } else if t.is_swarm() {
                    profile.swarm += 1;
                }
                profile
            })
    }
}

/// Decision-making for one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpponentPolicy {
    side: Side,
    last_decision: Option<Millis>,
}

impl OpponentPolicy {
    /// Policy for `side`. The first decision happens on the first tick.
    #[must_use]
    pub const fn new(side: Side) -> Self {
        Self {
            side,
            last_decision: None,
        }
    }

    /// The side this policy drives.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// When the policy last decided.
    #[must_use]
    pub const fn last_decision(&self) -> Option<Millis> {
        self.last_decision
    }

    /// Whether a decision is due at `now`.
    #[must_use]
    pub fn is_due(&self, now: Millis) -> bool {
        self.last_decision
            .map_or(true, |t| now.saturating_sub(t) >= DECISION_INTERVAL_MS)
    }

    /// Decide and restart the cadence.
    pub fn decide(
        &mut self,
        snapshot: &Snapshot,
        config: &GameConfig,
        now: Millis,
        rng: &mut dyn RandomSource,
    ) -> Vec<Action> {
        self.last_decision = Some(now);
        let side = self.side;

        let own_count = snapshot.live_count(side);
        if own_count >= config.rules.max_units {
            return Vec::new();
        }

        let mut actions = Vec::new();
        if let Some(unit_type) = self.purchase(snapshot, config, rng) {
            actions.push(Action::recruit(unit_type, side));
        }
        if let Some(command) = self.stance(snapshot) {
            actions.push(Action::command(side, command));
        }

        if !actions.is_empty() {
            tracing::debug!(%side, at_ms = now, ?actions, "Opponent decided");
        }
        actions
    }

    fn purchase(
        &self,
        snapshot: &Snapshot,
        config: &GameConfig,
        rng: &mut dyn RandomSource,
    ) -> Option<UnitType> {
        let side = self.side;
        let gold = *snapshot.gold.get(side);
        let affordable = |t: UnitType| gold >= config.units.cost(t);

        let own_count = snapshot.live_count(side);
        let workers = snapshot
            .live_units(side)
            .filter(|u| u.unit_type == UnitType::Worker)
            .count();
        let desired_workers = (own_count / 3).clamp(MIN_WORKERS, MAX_WORKERS);
        if workers < desired_workers && affordable(UnitType::Worker) {
            return Some(UnitType::Worker);
        }

        let opposing = ArmyProfile::of(snapshot, side.opponent());
        let pick = if opposing.tanks > 1 {
            UnitType::Mage
        } else if opposing.swarm > 3 {
            UnitType::Toxic
        } else if opposing.ranged > 2 {
            UnitType::Boss
        } else if rng.chance(ARCHER_CHANCE) {
            UnitType::Archer
        } else {
            UnitType::Paladin
        };

        if own_count > SAVE_FOR_BOSS_ARMY && rng.chance(SAVE_FOR_BOSS_CHANCE) {
            return affordable(UnitType::Boss).then_some(UnitType::Boss);
        }
        if affordable(pick) {
            return Some(pick);
        }
        (rng.chance(TOXIC_FALLBACK_CHANCE) && affordable(UnitType::Toxic)).then_some(UnitType::Toxic)
    }

    fn stance(&self, snapshot: &Snapshot) -> Option<Command> {
        let side = self.side;
        let own = snapshot.live_count(side) as f64;
        let opposing = snapshot.live_count(side.opponent()) as f64;
        let has_boss = snapshot
            .live_units(side)
            .any(|u| u.unit_type == UnitType::Boss && u.is_alive());
        let current = *snapshot.commands.get(side);

        if (has_boss || own > opposing * ATTACK_RATIO) && current != Command::Attack {
            Some(Command::Attack)
        } else if own < opposing * RETREAT_RATIO && current == Command::Attack {
            Some(Command::Retreat)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Unit;
    use crate::random::ScriptedRandom;
    use crate::simulation::MatchConfig;

    fn setup(gold: u32) -> (GameConfig, Snapshot) {
        let config = GameConfig::default();
        let mut snapshot = Snapshot::new(&config, &MatchConfig::default(), 0);
        snapshot.gold.enemy = gold;
        (config, snapshot)
    }

    fn add(snapshot: &mut Snapshot, unit_type: UnitType, side: Side, n: usize) {
        for _ in 0..n {
            let id = snapshot.allocate_id();
            snapshot.units.push(Unit::new(id, unit_type, side, 50.0, 100.0));
        }
    }

    fn decide(snapshot: &Snapshot, config: &GameConfig, rolls: Vec<f64>) -> Vec<Action> {
        let mut policy = OpponentPolicy::new(Side::Enemy);
        let mut rng = ScriptedRandom::new(rolls);
        policy.decide(snapshot, config, 0, &mut rng)
    }

    #[test]
    fn test_cadence() {
        let (config, snapshot) = setup(0);
        let mut policy = OpponentPolicy::new(Side::Enemy);
        assert!(policy.is_due(0));
        policy.decide(&snapshot, &config, 100, &mut ScriptedRandom::always(0.9));
        assert!(!policy.is_due(2_099));
        assert!(policy.is_due(2_100));
    }

    #[test]
    fn test_buys_worker_first() {
        let (config, snapshot) = setup(500);
        let actions = decide(&snapshot, &config, vec![0.0]);
        assert_eq!(actions, vec![Action::recruit(UnitType::Worker, Side::Enemy)]);
    }

    #[test]
    fn test_counters_tanks_with_mage() {
        let (config, mut snapshot) = setup(500);
        add(&mut snapshot, UnitType::Worker, Side::Enemy, 2);
        add(&mut snapshot, UnitType::Paladin, Side::Player, 2);
        let actions = decide(&snapshot, &config, vec![0.99]);
        assert_eq!(actions[0], Action::recruit(UnitType::Mage, Side::Enemy));
    }

    #[test]
    fn test_counters_swarm_with_toxic() {
        let (config, mut snapshot) = setup(500);
        add(&mut snapshot, UnitType::Worker, Side::Enemy, 2);
        add(&mut snapshot, UnitType::Small, Side::Player, 4);
        let actions = decide(&snapshot, &config, vec![0.99]);
        assert_eq!(actions[0], Action::recruit(UnitType::Toxic, Side::Enemy));
    }

    #[test]
    fn test_archer_roll_and_default_paladin() {
        let (config, mut snapshot) = setup(500);
        add(&mut snapshot, UnitType::Worker, Side::Enemy, 2);

        let archer = decide(&snapshot, &config, vec![0.1]);
        assert_eq!(archer[0], Action::recruit(UnitType::Archer, Side::Enemy));

        let paladin = decide(&snapshot, &config, vec![0.5]);
        assert_eq!(paladin[0], Action::recruit(UnitType::Paladin, Side::Enemy));
    }

    #[test]
    fn test_save_for_boss_branch() {
        let (config, mut snapshot) = setup(900);
        add(&mut snapshot, UnitType::Worker, Side::Enemy, 2);
        add(&mut snapshot, UnitType::Small, Side::Enemy, 4);
        // archer roll misses, save roll hits
        let actions = decide(&snapshot, &config, vec![0.9, 0.1]);
        assert_eq!(actions[0], Action::recruit(UnitType::Boss, Side::Enemy));

        snapshot.gold.enemy = 700;
        let saving = decide(&snapshot, &config, vec![0.9, 0.1]);
        assert!(
            !saving.iter().any(|a| matches!(a, Action::Recruit { .. })),
            "saving buys nothing else"
        );
    }

    #[test]
    fn test_toxic_fallback_when_pick_unaffordable() {
        let (config, mut snapshot) = setup(110);
        add(&mut snapshot, UnitType::Worker, Side::Enemy, 2);
        add(&mut snapshot, UnitType::Small, Side::Player, 2);
        // paladin (200) unaffordable, fallback roll hits
        let actions = decide(&snapshot, &config, vec![0.9, 0.1]);
        assert_eq!(actions[0], Action::recruit(UnitType::Toxic, Side::Enemy));

        let none = decide(&snapshot, &config, vec![0.9, 0.9]);
        assert!(none.is_empty());
    }

    #[test]
    fn test_full_army_skips_everything() {
        let (config, mut snapshot) = setup(5_000);
        add(&mut snapshot, UnitType::Small, Side::Enemy, config.rules.max_units);
        let actions = decide(&snapshot, &config, vec![0.0]);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_boss_triggers_attack_then_outnumbered_retreats() {
        let (config, mut snapshot) = setup(0);
        add(&mut snapshot, UnitType::Boss, Side::Enemy, 1);
        let actions = decide(&snapshot, &config, vec![0.9]);
        assert_eq!(actions, vec![Action::command(Side::Enemy, Command::Attack)]);

        snapshot.units.clear();
        snapshot.commands.enemy = Command::Attack;
        add(&mut snapshot, UnitType::Small, Side::Enemy, 1);
        add(&mut snapshot, UnitType::Small, Side::Player, 3);
        let actions = decide(&snapshot, &config, vec![0.9]);
        assert_eq!(actions, vec![Action::command(Side::Enemy, Command::Retreat)]);
    }

    #[test]
    fn test_mirrors_for_player_side() {
        let config = GameConfig::default();
        let snapshot = Snapshot::new(&config, &MatchConfig::default(), 0);
        let mut policy = OpponentPolicy::new(Side::Player);
        let actions = policy.decide(&snapshot, &config, 0, &mut ScriptedRandom::always(0.9));
        assert_eq!(actions, vec![Action::recruit(UnitType::Worker, Side::Player)]);
    }
}
