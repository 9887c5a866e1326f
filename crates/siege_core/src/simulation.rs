//! Core tick loop.
//!
//! [`advance`] is the tick engine: it takes the previous [`Snapshot`] by
//! reference, clones it, and returns the next one together with the events
//! produced along the way. [`Simulation`] owns the current snapshot, the
//! action inbox, the opponent policies and their random source, and is what
//! a driver calls once per timer fire.
//!
//! # Tick order
//!
//! Later steps observe earlier steps' mutations within the same tick:
//!
//! 1. Elapsed time, capped at `max_step_seconds`
//! 2. Drain queued actions (recruits, command changes)
//! 3. Advance and resolve projectiles
//! 4. Resolve every unit in list order
//! 5. Merge Mage summons up to capacity
//! 6. Death transitions and expiry of dying units
//! 7. Victory check
//! 8. Opponent policies, if due and the match is undecided
//!    ([`Simulation::tick`] only)
//!
//! Policies only queue actions; nothing they decide applies before the
//! next tick.
//!
//! # Determinism
//!
//! Units are processed in stable insertion order, nearest-target ties go to
//! the earlier unit, and ids come from a counter in the snapshot. With the
//! same seed and the same timed inputs two simulations stay bit-identical.
//!
//! # Example
//!
//! ```
//! use siege_core::prelude::*;
//!
//! let mut sim = Simulation::new(GameConfig::default(), &MatchConfig::default(), 0);
//! sim.submit(Action::recruit(UnitType::Worker, Side::Player));
//! sim.tick(20);
//! assert_eq!(sim.snapshot().live_count(Side::Player), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::abilities::AbilityId;
use crate::actions::{Action, ActionQueue};
use crate::ai::OpponentPolicy;
use crate::behavior;
use crate::combat::DamageEvent;
use crate::components::{Command, EntityId, Millis, PerSide, Projectile, Side, Unit, UnitType};
use crate::data::{GameConfig, DEFAULT_MAP_ID};
use crate::economy;
use crate::error::Result;
use crate::projectiles;
use crate::random::{RandomSource, SeededRandom};

/// Timer period the driver is expected to use.
pub const TICK_INTERVAL_MS: Millis = 20;

/// Ticks per second at the nominal period.
pub const TICK_RATE: u32 = (1_000 / TICK_INTERVAL_MS) as u32;

/// Match outcome from the player's (host's) perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    /// Match in progress.
    #[default]
    Playing,
    /// Enemy statue destroyed.
    Victory,
    /// Player statue destroyed.
    Defeat,
}

impl GameStatus {
    /// Whether the match has ended.
    #[must_use]
    pub const fn is_over(self) -> bool {
        !matches!(self, GameStatus::Playing)
    }
}

/// Why a recruit was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Side already fields the maximum number of units.
    AtCapacity,
    /// Not enough gold.
    InsufficientGold,
}

/// A recruit that was dropped while draining the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecruit {
    /// Requested type.
    pub unit_type: UnitType,
    /// Requesting side.
    pub side: Side,
    /// Cause.
    pub reason: RejectReason,
}

/// An ability that fired this tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityCast {
    /// Casting unit.
    pub caster: EntityId,
    /// Ability used.
    pub ability: AbilityId,
    /// Units affected.
    pub hits: u32,
}

/// Gold credited by a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldDeposit {
    /// Depositing worker.
    pub worker: EntityId,
    /// Credited side.
    pub side: Side,
    /// Amount credited.
    pub amount: u32,
}

/// Events generated during a tick, for presentation and metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Units created by recruit actions.
    pub recruited: Vec<EntityId>,
    /// Recruits that were dropped.
    pub rejected: Vec<RejectedRecruit>,
    /// Standing command changes.
    pub command_changes: Vec<(Side, Command)>,
    /// Every damage instance except root chip damage.
    pub damage: Vec<DamageEvent>,
    /// Abilities that fired.
    pub abilities: Vec<AbilityCast>,
    /// Projectiles spawned.
    pub projectiles_fired: Vec<EntityId>,
    /// Projectiles removed by impact or leaving the field.
    pub projectiles_expired: Vec<EntityId>,
    /// Units created by Mage summons.
    pub summoned: Vec<EntityId>,
    /// Gold deposits.
    pub deposits: Vec<GoldDeposit>,
    /// Units that entered the dying state.
    pub deaths: Vec<EntityId>,
    /// Dying units dropped from the collection.
    pub removed: Vec<EntityId>,
    /// A heavy hit asked the presentation to shake the screen.
    pub screen_shake: bool,
    /// Status after this tick, when it changed.
    pub status_change: Option<GameStatus>,
}

/// Full battle state. Replaced wholesale every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Units in stable insertion order.
    pub units: Vec<Unit>,
    /// Projectiles in flight.
    pub projectiles: Vec<Projectile>,
    /// Statue hit points.
    pub statue_hp: PerSide<f64>,
    /// Gold on hand.
    pub gold: PerSide<u32>,
    /// Standing commands.
    pub commands: PerSide<Command>,
    /// Timestamp of the tick that produced this snapshot.
    pub last_tick: Millis,
    /// Outcome, from the player's perspective.
    pub game_status: GameStatus,
    /// Map id, for presentation.
    pub map_id: String,
    /// Next id to hand out.
    pub next_id: EntityId,
}

impl Snapshot {
    /// Fresh battlefield at match start.
    #[must_use]
    pub fn new(config: &GameConfig, match_config: &MatchConfig, start: Millis) -> Self {
        let gold = if match_config.surge {
            config.rules.surge_gold
        } else {
            config.rules.starting_gold
        };
        Self {
            units: Vec::new(),
            projectiles: Vec::new(),
            statue_hp: PerSide::splat(config.rules.statue_hp),
            gold: PerSide::splat(gold),
            commands: PerSide::splat(Command::Defend),
            last_tick: start,
            game_status: GameStatus::Playing,
            map_id: match_config.map_id.clone(),
            next_id: 1,
        }
    }

    /// Hand out a fresh id.
    pub fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Non-dying units on a side. This is what capacity counts.
    #[must_use]
    pub fn live_count(&self, side: Side) -> usize {
        self.units
            .iter()
            .filter(|u| u.side == side && u.occupies_slot())
            .count()
    }

    /// Non-dying units on a side, in list order.
    pub fn live_units(&self, side: Side) -> impl Iterator<Item = &Unit> {
        self.units
            .iter()
            .filter(move |u| u.side == side && u.occupies_slot())
    }

    /// Look up a unit by id.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Look up a unit by id, mutably.
    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Deterministic hash of the whole state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.last_tick.hash(&mut hasher);
        self.game_status.hash(&mut hasher);
        self.map_id.hash(&mut hasher);
        self.next_id.hash(&mut hasher);
        for side in Side::ALL {
            self.statue_hp.get(side).to_bits().hash(&mut hasher);
            self.gold.get(side).hash(&mut hasher);
            self.commands.get(side).hash(&mut hasher);
        }

        self.units.len().hash(&mut hasher);
        for unit in &self.units {
            unit.id.hash(&mut hasher);
            unit.unit_type.hash(&mut hasher);
            unit.side.hash(&mut hasher);
            unit.owner_id.hash(&mut hasher);
            unit.x.to_bits().hash(&mut hasher);
            unit.current_speed.to_bits().hash(&mut hasher);
            unit.hp.to_bits().hash(&mut hasher);
            unit.state.hash(&mut hasher);
            unit.last_attack_time.hash(&mut hasher);
            unit.death_time.hash(&mut hasher);
            unit.last_summon_time.hash(&mut hasher);
            unit.last_ability1_time.hash(&mut hasher);
            unit.last_ability2_time.hash(&mut hasher);
            unit.has_gold.hash(&mut hasher);
            unit.attack_count.hash(&mut hasher);
            unit.is_enraged.hash(&mut hasher);
            unit.max_hp.to_bits().hash(&mut hasher);
            unit.last_damage_time.hash(&mut hasher);
            unit.last_damage_amount.hash(&mut hasher);
            unit.target_id.hash(&mut hasher);
            unit.effects.entries().hash(&mut hasher);
        }

        self.projectiles.len().hash(&mut hasher);
        for projectile in &self.projectiles {
            projectile.id.hash(&mut hasher);
            projectile.x.to_bits().hash(&mut hasher);
            projectile.target_x.to_bits().hash(&mut hasher);
            projectile.target_id.hash(&mut hasher);
            projectile.damage.to_bits().hash(&mut hasher);
            projectile.speed.to_bits().hash(&mut hasher);
            projectile.side.hash(&mut hasher);
            projectile.created_at.hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Encode for broadcast or storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a broadcast snapshot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Per-match settings chosen before the first tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Map id (presentation only).
    pub map_id: String,
    /// Seed for the opponent policy's random source.
    pub seed: u64,
    /// Start both sides with the surge gold grant.
    pub surge: bool,
    /// Sides driven by the opponent policy.
    pub ai_sides: Vec<Side>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            map_id: DEFAULT_MAP_ID.to_string(),
            seed: 0,
            surge: false,
            ai_sides: vec![Side::Enemy],
        }
    }
}

/// Working state threaded through the steps of one tick.
#[derive(Debug)]
pub(crate) struct TickContext<'a> {
    pub config: &'a GameConfig,
    pub now: Millis,
    pub dt: f64,
    pub events: TickEvents,
    pub summons: Vec<Unit>,
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    /// The new state.
    pub snapshot: Snapshot,
    /// What happened.
    pub events: TickEvents,
}

/// Elapsed simulated seconds between two ticks, capped.
#[must_use]
pub fn step_seconds(last_tick: Millis, now: Millis, max_step_seconds: f64) -> f64 {
    (now.saturating_sub(last_tick) as f64 / 1_000.0).min(max_step_seconds)
}

/// Produce the next snapshot from the previous one.
///
/// `actions` are applied in order before anything moves. This covers tick
/// steps 1–7; opponent policies run in [`Simulation::tick`].
#[must_use]
pub fn advance(
    config: &GameConfig,
    previous: &Snapshot,
    now: Millis,
    actions: Vec<Action>,
) -> TickOutcome {
    let mut next = previous.clone();
    let mut ctx = TickContext {
        config,
        now,
        dt: step_seconds(previous.last_tick, now, config.rules.max_step_seconds),
        events: TickEvents::default(),
        summons: Vec::new(),
    };

    for action in actions {
        economy::apply_action(&mut next, action, &mut ctx);
    }

    projectiles::advance_projectiles(&mut next, &mut ctx);

    for index in 0..next.units.len() {
        behavior::resolve_unit(&mut next, index, &mut ctx);
    }

    merge_summons(&mut next, &mut ctx);
    cleanup(&mut next, &mut ctx);
    update_status(&mut next, &mut ctx);

    next.last_tick = now;

    #[cfg(feature = "debug-validation")]
    for side in Side::ALL {
        debug_assert!(next.live_count(side) <= config.rules.max_units);
    }

    TickOutcome {
        snapshot: next,
        events: ctx.events,
    }
}

/// Append pending summons in order while their side has room.
fn merge_summons(state: &mut Snapshot, ctx: &mut TickContext<'_>) {
    let max_units = ctx.config.rules.max_units;
    for summon in std::mem::take(&mut ctx.summons) {
        if state.live_count(summon.side) >= max_units {
            tracing::debug!(id = summon.id, side = %summon.side, "Summon discarded at capacity");
            continue;
        }
        ctx.events.summoned.push(summon.id);
        state.units.push(summon);
    }
}

/// Edge-triggered death transitions, then expiry of old corpses.
fn cleanup(state: &mut Snapshot, ctx: &mut TickContext<'_>) {
    let now = ctx.now;
    for unit in &mut state.units {
        if unit.hp <= 0.0 && unit.begin_dying(now) {
            tracing::debug!(id = unit.id, unit_type = %unit.unit_type, side = %unit.side, "Unit died");
            ctx.events.deaths.push(unit.id);
        }
    }

    let death_duration = ctx.config.rules.death_duration_ms;
    let removed = &mut ctx.events.removed;
    state.units.retain(|unit| {
        let expired = unit.is_dying()
            && unit
                .death_time
                .is_some_and(|t| now.saturating_sub(t) > death_duration);
        if expired {
            removed.push(unit.id);
        }
        !expired
    });
}

/// Sticky victory check from the player's perspective.
fn update_status(state: &mut Snapshot, ctx: &mut TickContext<'_>) {
    if state.game_status.is_over() {
        return;
    }
    let status = if state.statue_hp.player <= 0.0 {
        GameStatus::Defeat
    } else if state.statue_hp.enemy <= 0.0 {
        GameStatus::Victory
    } else {
        GameStatus::Playing
    };
    if status != state.game_status {
        tracing::info!(?status, at_ms = ctx.now, "Match decided");
        state.game_status = status;
        ctx.events.status_change = Some(status);
    }
}

/// The authoritative owner of a match.
///
/// Holds the current snapshot, the pending action inbox and the opponent
/// policies. A driver calls [`tick`](Self::tick) once per timer fire and
/// publishes [`snapshot`](Self::snapshot) afterwards.
#[derive(Debug)]
pub struct Simulation {
    config: GameConfig,
    snapshot: Snapshot,
    queue: ActionQueue,
    policies: Vec<OpponentPolicy>,
    rng: Box<dyn RandomSource>,
    ticks: u64,
}

impl Simulation {
    /// Start a match at `start` ms.
    ///
    /// The opponent policy drives every side in `match_config.ai_sides`,
    /// rolling from a stream seeded with `match_config.seed`.
    #[must_use]
    pub fn new(config: GameConfig, match_config: &MatchConfig, start: Millis) -> Self {
        let snapshot = Snapshot::new(&config, match_config, start);
        let policies = match_config
            .ai_sides
            .iter()
            .map(|&side| OpponentPolicy::new(side))
            .collect();
        tracing::info!(
            map = %match_config.map_id,
            seed = match_config.seed,
            surge = match_config.surge,
            "Match started"
        );
        Self {
            config,
            snapshot,
            queue: ActionQueue::new(),
            policies,
            rng: Box::new(SeededRandom::new(match_config.seed)),
            ticks: 0,
        }
    }

    /// Resume from an existing snapshot with no opponent policy.
    #[must_use]
    pub fn from_snapshot(config: GameConfig, snapshot: Snapshot) -> Self {
        Self {
            config,
            snapshot,
            queue: ActionQueue::new(),
            policies: Vec::new(),
            rng: Box::new(SeededRandom::new(0)),
            ticks: 0,
        }
    }

    /// Replace the random source.
    #[must_use]
    pub fn with_random(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    /// Let the opponent policy drive `side` as well.
    pub fn enable_ai(&mut self, side: Side) {
        if !self.policies.iter().any(|p| p.side() == side) {
            self.policies.push(OpponentPolicy::new(side));
        }
    }

    /// Stop the opponent policy for `side`.
    pub fn disable_ai(&mut self, side: Side) {
        self.policies.retain(|p| p.side() != side);
    }

    /// Queue an action for the next tick.
    pub fn submit(&mut self, action: Action) {
        self.queue.push(action);
    }

    /// Actions waiting for the next tick.
    #[must_use]
    pub fn pending(&self) -> &ActionQueue {
        &self.queue
    }

    /// Run one tick at wall-clock `now`.
    pub fn tick(&mut self, now: Millis) -> TickEvents {
        let actions = self.queue.drain();
        let outcome = advance(&self.config, &self.snapshot, now, actions);
        self.snapshot = outcome.snapshot;
        self.ticks += 1;

        if !self.snapshot.game_status.is_over() {
            for policy in &mut self.policies {
                if policy.is_due(now) {
                    let decided =
                        policy.decide(&self.snapshot, &self.config, now, self.rng.as_mut());
                    self.queue.extend(decided);
                }
            }
        }

        #[cfg(debug_assertions)]
        tracing::trace!(
            tick = self.ticks,
            state_hash = self.snapshot.state_hash(),
            "Simulation state hash"
        );

        outcome.events
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Current snapshot, mutably. Meant for scenario setup.
    pub fn snapshot_mut(&mut self) -> &mut Snapshot {
        &mut self.snapshot
    }

    /// Configuration tables.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Hash of the current snapshot.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.snapshot.state_hash()
    }

    /// Place a unit for free at `x`, bypassing gold and capacity.
    ///
    /// Used by scenario setup and tests; recruits go through
    /// [`submit`](Self::submit).
    pub fn place_unit(&mut self, unit_type: UnitType, side: Side, x: f64) -> EntityId {
        let now = self.snapshot.last_tick;
        economy::spawn_unit(&mut self.snapshot, &self.config, unit_type, side, x, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::UnitState;
    use crate::random::ScriptedRandom;
    use crate::status::StatusEffect;

    fn quiet_match() -> MatchConfig {
        MatchConfig {
            ai_sides: Vec::new(),
            ..MatchConfig::default()
        }
    }

    #[test]
    fn test_step_is_capped() {
        assert!((step_seconds(0, 20, 0.05) - 0.02).abs() < 1e-12);
        assert!((step_seconds(0, 5_000, 0.05) - 0.05).abs() < 1e-12);
        assert_eq!(step_seconds(100, 50, 0.05), 0.0);
    }

    #[test]
    fn test_new_match_state() {
        let config = GameConfig::default();
        let snapshot = Snapshot::new(&config, &MatchConfig::default(), 0);
        assert_eq!(snapshot.gold.player, 50);
        assert_eq!(snapshot.gold.enemy, 50);
        assert!((snapshot.statue_hp.player - 2_000.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.game_status, GameStatus::Playing);
        assert_eq!(snapshot.commands.player, Command::Defend);
    }

    #[test]
    fn test_surge_grants_large_gold() {
        let config = GameConfig::default();
        let surge = MatchConfig {
            surge: true,
            ..MatchConfig::default()
        };
        let snapshot = Snapshot::new(&config, &surge, 0);
        assert_eq!(snapshot.gold.player, 2_000);
    }

    #[test]
    fn test_tick_applies_recruit_and_command() {
        let mut sim = Simulation::new(GameConfig::default(), &quiet_match(), 0);
        sim.submit(Action::recruit(UnitType::Worker, Side::Player));
        sim.submit(Action::command(Side::Player, Command::Attack));

        let events = sim.tick(20);

        assert_eq!(events.recruited.len(), 1);
        assert_eq!(events.command_changes, vec![(Side::Player, Command::Attack)]);
        assert_eq!(sim.snapshot().gold.player, 0);
        assert_eq!(sim.snapshot().commands.player, Command::Attack);
        assert!(sim.pending().is_empty());
    }

    #[test]
    fn test_unknown_action_is_ignored() {
        let mut sim = Simulation::new(GameConfig::default(), &quiet_match(), 0);
        let before = sim.snapshot().clone();
        sim.submit(Action::Unknown);
        sim.tick(20);
        assert_eq!(sim.snapshot().gold, before.gold);
        assert!(sim.snapshot().units.is_empty());
    }

    #[test]
    fn test_advance_does_not_touch_previous() {
        let config = GameConfig::default();
        let previous = Snapshot::new(&config, &quiet_match(), 0);
        let outcome = advance(
            &config,
            &previous,
            20,
            vec![Action::recruit(UnitType::Worker, Side::Enemy)],
        );
        assert!(previous.units.is_empty());
        assert_eq!(outcome.snapshot.units.len(), 1);
        assert_eq!(outcome.snapshot.last_tick, 20);
    }

    #[test]
    fn test_death_is_edge_triggered_and_expires() {
        let mut sim = Simulation::new(GameConfig::default(), &quiet_match(), 0);
        let id = sim.place_unit(UnitType::Small, Side::Player, 30.0);
        sim.snapshot_mut().unit_mut(id).unwrap().hp = 0.0;

        let events = sim.tick(1_000);
        assert_eq!(events.deaths, vec![id]);
        assert_eq!(sim.snapshot().unit(id).unwrap().state, UnitState::Dying);
        assert_eq!(sim.snapshot().unit(id).unwrap().death_time, Some(1_000));

        let events = sim.tick(1_020);
        assert!(events.deaths.is_empty());
        assert_eq!(sim.snapshot().unit(id).unwrap().death_time, Some(1_000));

        sim.tick(2_500);
        assert!(sim.snapshot().unit(id).is_some(), "present at exactly 1500ms");

        let events = sim.tick(2_501);
        assert_eq!(events.removed, vec![id]);
        assert!(sim.snapshot().unit(id).is_none());
    }

    #[test]
    fn test_status_is_sticky() {
        let mut sim = Simulation::new(GameConfig::default(), &quiet_match(), 0);
        sim.snapshot_mut().statue_hp.enemy = 0.0;

        let events = sim.tick(20);
        assert_eq!(events.status_change, Some(GameStatus::Victory));
        assert_eq!(sim.snapshot().game_status, GameStatus::Victory);

        sim.snapshot_mut().statue_hp.player = -10.0;
        let events = sim.tick(40);
        assert_eq!(events.status_change, None);
        assert_eq!(sim.snapshot().game_status, GameStatus::Victory);
    }

    #[test]
    fn test_defeat_when_player_statue_falls() {
        let mut sim = Simulation::new(GameConfig::default(), &quiet_match(), 0);
        sim.snapshot_mut().statue_hp.player = 0.0;
        sim.tick(20);
        assert_eq!(sim.snapshot().game_status, GameStatus::Defeat);
    }

    #[test]
    fn test_snapshot_bytes_preserve_hash() {
        let mut sim = Simulation::new(GameConfig::default(), &quiet_match(), 0);
        sim.place_unit(UnitType::Archer, Side::Player, 40.0);
        sim.place_unit(UnitType::Paladin, Side::Enemy, 55.0);
        for t in 1..=30 {
            sim.tick(t * 20);
        }
        let bytes = sim.snapshot().to_bytes().unwrap();
        let restored = Snapshot::from_bytes(&bytes).unwrap();
        assert_eq!(restored.state_hash(), sim.state_hash());
    }

    #[test]
    fn test_decided_match_skips_policies() {
        let mut sim = Simulation::new(GameConfig::default(), &MatchConfig::default(), 0)
            .with_random(Box::new(ScriptedRandom::always(0.99)));
        sim.snapshot_mut().statue_hp.player = 0.0;

        sim.tick(20);
        assert_eq!(sim.snapshot().game_status, GameStatus::Defeat);
        assert!(sim.pending().is_empty());
    }

    #[test]
    fn test_hash_covers_effects_and_damage_fields() {
        let mut sim = Simulation::new(GameConfig::default(), &quiet_match(), 0);
        sim.place_unit(UnitType::Paladin, Side::Player, 45.0);
        let enemy = sim.place_unit(UnitType::Small, Side::Enemy, 55.0);

        let mut a = sim.snapshot().clone();
        let mut b = sim.snapshot().clone();
        a.unit_mut(enemy).unwrap().effects.root(0, 2_500);
        b.unit_mut(enemy).unwrap().effects.root(0, 9_000);
        assert_ne!(a.state_hash(), b.state_hash());

        let mut c = a.clone();
        c.unit_mut(enemy).unwrap().last_damage_time = Some(400);
        assert_ne!(a.state_hash(), c.state_hash());

        let mut d = a.clone();
        d.unit_mut(enemy).unwrap().max_hp = 200.0;
        assert_ne!(a.state_hash(), d.state_hash());

        let mut e = a.clone();
        e.unit_mut(enemy).unwrap().effects.poison(3);
        let mut f = e.clone();
        f.unit_mut(enemy).unwrap().effects.apply(StatusEffect::Poison {
            stacks: 3,
            last_tick: Some(1_000),
        });
        assert_ne!(e.state_hash(), f.state_hash());

        assert_eq!(a.state_hash(), a.clone().state_hash());
    }

    #[test]
    fn test_ai_queues_for_next_tick() {
        let mut sim = Simulation::new(GameConfig::default(), &MatchConfig::default(), 0)
            .with_random(Box::new(ScriptedRandom::always(0.99)));
        sim.tick(20);
        assert_eq!(
            sim.pending().iter().copied().collect::<Vec<_>>(),
            vec![Action::recruit(UnitType::Worker, Side::Enemy)]
        );
        sim.tick(40);
        assert_eq!(sim.snapshot().live_count(Side::Enemy), 1);
    }
}
