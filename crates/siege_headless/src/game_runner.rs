//! Full match execution for headless testing.
//!
//! Runs one scenario on the nominal tick clock until it is decided or hits
//! its tick limit, collecting [`GameMetrics`] along the way.
//!
//! The loop is bounded by `max_ticks` and logs progress at a fixed
//! cadence; a match that never ends is reported as a draw.

use siege_core::data::GameConfig;
use siege_core::replay::{Recorder, Replay};
use siege_core::simulation::{GameStatus, Simulation, TICK_INTERVAL_MS};

use crate::error::ScenarioError;
use crate::metrics::{GameMetrics, MetricsCollector};
use crate::scenario::Scenario;

/// Ten minutes of match time at the nominal tick rate.
pub const DEFAULT_MAX_TICKS: u64 = 10 * 60 * 1_000 / TICK_INTERVAL_MS;

const PROGRESS_EVERY: u64 = 5_000;

/// Everything needed to run one match.
#[derive(Debug, Clone)]
pub struct MatchSettings {
    /// Identifier used in metrics and logs.
    pub game_id: String,
    /// Seed for the opponent policy.
    pub seed: u64,
    /// Tick limit (0 = runner default).
    pub max_ticks: u64,
    /// Match setup.
    pub scenario: Scenario,
    /// Unit, layout and rule tables.
    pub config: GameConfig,
}

impl MatchSettings {
    /// Default tables, named after the scenario and seed.
    #[must_use]
    pub fn new(scenario: Scenario, seed: u64, max_ticks: u64) -> Self {
        Self {
            game_id: format!("{}_{seed}", scenario.name),
            seed,
            max_ticks,
            scenario,
            config: GameConfig::default(),
        }
    }
}

/// What a finished match produced.
#[derive(Debug, Clone)]
pub struct GameResult {
    /// Collected metrics.
    pub metrics: GameMetrics,
    /// Outcome.
    pub outcome: GameStatus,
    /// Ticks run.
    pub ticks: u64,
    /// Hash of the last snapshot.
    pub final_state_hash: u64,
}

/// High-level match runner.
#[derive(Debug, Clone)]
pub struct GameRunner {
    /// Tick limit applied when a match asks for 0.
    pub default_max_ticks: u64,
}

impl Default for GameRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRunner {
    /// Runner with the default ten-minute limit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            default_max_ticks: DEFAULT_MAX_TICKS,
        }
    }

    fn limit(&self, settings: &MatchSettings) -> u64 {
        if settings.max_ticks == 0 {
            self.default_max_ticks
        } else {
            settings.max_ticks
        }
    }

    /// Run a match to completion.
    pub fn run(&self, settings: &MatchSettings) -> Result<GameResult, ScenarioError> {
        let sim = settings.scenario.build(settings.config.clone(), settings.seed)?;
        Ok(drive(sim, settings, self.limit(settings)))
    }

    /// Run a match while recording a replay of it.
    ///
    /// Only scenarios fully described by their match settings can be
    /// recorded.
    pub fn run_recorded(&self, settings: &MatchSettings) -> Result<(GameResult, Replay), ScenarioError> {
        let scenario = &settings.scenario;
        if !scenario.is_replayable() {
            return Err(ScenarioError::NotReplayable(scenario.name.clone()));
        }
        settings.config.map(&scenario.map_id)?;

        let limit = self.limit(settings);
        let mut recorder = Recorder::new(
            settings.config.clone(),
            scenario.match_config(settings.seed),
            0,
            TICK_INTERVAL_MS,
        );
        let mut collector = MetricsCollector::new(&settings.game_id, &scenario.name, settings.seed);

        for tick in 1..=limit {
            let events = recorder.tick();
            collector.observe(tick, &events, recorder.simulation().snapshot());
            if recorder.simulation().snapshot().game_status.is_over() {
                break;
            }
        }

        let sim = recorder.simulation();
        let ticks = sim.tick_count();
        let outcome = sim.snapshot().game_status;
        let metrics = collector.finish(ticks, sim.snapshot());
        let final_state_hash = metrics.final_state_hash;
        let replay = recorder.finish();
        Ok((
            GameResult {
                metrics,
                outcome,
                ticks,
                final_state_hash,
            },
            replay,
        ))
    }
}

/// Run a match with the default runner.
pub fn run_game(settings: &MatchSettings) -> Result<GameResult, ScenarioError> {
    GameRunner::new().run(settings)
}

fn drive(mut sim: Simulation, settings: &MatchSettings, limit: u64) -> GameResult {
    let mut collector = MetricsCollector::new(&settings.game_id, &settings.scenario.name, settings.seed);
    collector.register_existing(sim.snapshot());

    tracing::debug!(game = %settings.game_id, limit, "Match starting");

    for tick in 1..=limit {
        let now = sim.snapshot().last_tick + TICK_INTERVAL_MS;
        let events = sim.tick(now);
        collector.observe(tick, &events, sim.snapshot());

        if sim.snapshot().game_status.is_over() {
            break;
        }
        if tick % PROGRESS_EVERY == 0 {
            tracing::trace!(
                game = %settings.game_id,
                tick,
                player = sim.snapshot().live_count(siege_core::components::Side::Player),
                enemy = sim.snapshot().live_count(siege_core::components::Side::Enemy),
                "Match progress"
            );
        }
    }

    let ticks = sim.tick_count();
    let outcome = sim.snapshot().game_status;
    if !outcome.is_over() {
        tracing::debug!(game = %settings.game_id, ticks, "Match hit its tick limit");
    }
    let metrics = collector.finish(ticks, sim.snapshot());
    let final_state_hash = metrics.final_state_hash;

    GameResult {
        metrics,
        outcome,
        ticks,
        final_state_hash,
    }
}
