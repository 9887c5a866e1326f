//! Recording and playing back matches.
//!
//! A replay stores the configuration tables, the match settings (seed
//! included), the tick clock and every externally submitted action tagged
//! with the tick it was applied on. The opponent policy is not recorded: it
//! is reproduced from the seed.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::components::{Command, Millis, Side, UnitType};
use crate::data::GameConfig;
use crate::error::{GameError, Result};
use crate::simulation::{MatchConfig, Simulation, TickEvents};

/// Replay file format version.
pub const REPLAY_VERSION: u32 = 1;

/// An action as stored in a replay. Unknown actions are not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordedAction {
    /// See [`Action::Recruit`].
    Recruit(UnitType, Side),
    /// See [`Action::ChangeCommand`].
    ChangeCommand(Side, Command),
}

impl RecordedAction {
    /// Storable form of an action, if it has one.
    #[must_use]
    pub const fn from_action(action: Action) -> Option<Self> {
        match action {
            Action::Recruit { unit_type, side } => Some(Self::Recruit(unit_type, side)),
            Action::ChangeCommand { side, command } => Some(Self::ChangeCommand(side, command)),
            Action::Unknown => None,
        }
    }

    /// Back to a live action.
    #[must_use]
    pub const fn to_action(self) -> Action {
        match self {
            Self::Recruit(unit_type, side) => Action::recruit(unit_type, side),
            Self::ChangeCommand(side, command) => Action::command(side, command),
        }
    }
}

/// One recorded input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayInput {
    /// Tick (1-based) whose action drain applied it.
    pub tick: u64,
    /// The action.
    pub action: RecordedAction,
}

/// A complete recorded match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    /// Format version.
    pub version: u32,
    /// Tables the match ran with.
    pub config: GameConfig,
    /// Match settings, including the seed.
    pub match_config: MatchConfig,
    /// Clock value at match start.
    pub start_ms: Millis,
    /// Time between ticks.
    pub tick_interval_ms: Millis,
    /// Inputs in tick order.
    pub inputs: Vec<ReplayInput>,
    /// Ticks played.
    pub final_tick: u64,
    /// State hash after the final tick.
    pub final_hash: u64,
}

impl Replay {
    /// Empty replay for a match about to start.
    #[must_use]
    pub fn new(
        config: GameConfig,
        match_config: MatchConfig,
        start_ms: Millis,
        tick_interval_ms: Millis,
    ) -> Self {
        Self {
            version: REPLAY_VERSION,
            config,
            match_config,
            start_ms,
            tick_interval_ms,
            inputs: Vec::new(),
            final_tick: 0,
            final_hash: 0,
        }
    }

    /// Record an action applied on `tick`.
    pub fn record(&mut self, tick: u64, action: Action) {
        if let Some(action) = RecordedAction::from_action(action) {
            self.inputs.push(ReplayInput { tick, action });
        }
    }

    /// Seal the replay with the end state.
    pub fn finalize(&mut self, final_tick: u64, final_hash: u64) {
        self.final_tick = final_tick;
        self.final_hash = final_hash;
    }

    /// Inputs applied on `tick`.
    pub fn inputs_at(&self, tick: u64) -> impl Iterator<Item = Action> + '_ {
        self.inputs
            .iter()
            .filter(move |input| input.tick == tick)
            .map(|input| input.action.to_action())
    }

    /// Clock value of tick `n` (1-based).
    #[must_use]
    pub const fn tick_time(&self, n: u64) -> Millis {
        self.start_ms + n * self.tick_interval_ms
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode and check the version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let replay: Self = bincode::deserialize(bytes)?;
        if replay.version != REPLAY_VERSION {
            return Err(GameError::ReplayVersion {
                expected: REPLAY_VERSION,
                found: replay.version,
            });
        }
        Ok(replay)
    }

    /// Write to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_bytes()?).map_err(|source| GameError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Read from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| GameError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    /// Re-run the match and check it ends in the recorded state.
    pub fn verify(&self) -> Result<Simulation> {
        let mut player = ReplayPlayer::new(self);
        while player.step().is_some() {}
        let actual = player.simulation.state_hash();
        if actual != self.final_hash {
            return Err(GameError::DesyncDetected {
                at_ms: player.simulation.snapshot().last_tick,
                expected: self.final_hash,
                actual,
            });
        }
        Ok(player.simulation)
    }
}

/// Steps a replay one tick at a time.
#[derive(Debug)]
pub struct ReplayPlayer<'a> {
    replay: &'a Replay,
    simulation: Simulation,
    tick: u64,
}

impl<'a> ReplayPlayer<'a> {
    /// Start playback from the recorded settings.
    #[must_use]
    pub fn new(replay: &'a Replay) -> Self {
        let simulation = Simulation::new(
            replay.config.clone(),
            &replay.match_config,
            replay.start_ms,
        );
        Self {
            replay,
            simulation,
            tick: 0,
        }
    }

    /// Play the next tick. Returns `None` once the replay is exhausted.
    pub fn step(&mut self) -> Option<TickEvents> {
        if self.tick >= self.replay.final_tick {
            return None;
        }
        self.tick += 1;
        for action in self.replay.inputs_at(self.tick) {
            self.simulation.submit(action);
        }
        Some(self.simulation.tick(self.replay.tick_time(self.tick)))
    }

    /// Ticks played.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulation being played.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }
}

/// A simulation that records its own inputs.
#[derive(Debug)]
pub struct Recorder {
    simulation: Simulation,
    replay: Replay,
}

impl Recorder {
    /// Start a recorded match.
    #[must_use]
    pub fn new(
        config: GameConfig,
        match_config: MatchConfig,
        start_ms: Millis,
        tick_interval_ms: Millis,
    ) -> Self {
        let simulation = Simulation::new(config.clone(), &match_config, start_ms);
        Self {
            simulation,
            replay: Replay::new(config, match_config, start_ms, tick_interval_ms),
        }
    }

    /// Submit an action for the next tick and record it.
    pub fn submit(&mut self, action: Action) {
        self.replay.record(self.simulation.tick_count() + 1, action);
        self.simulation.submit(action);
    }

    /// Run the next tick on the replay clock.
    pub fn tick(&mut self) -> TickEvents {
        let now = self.replay.tick_time(self.simulation.tick_count() + 1);
        self.simulation.tick(now)
    }

    /// Simulation being recorded.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Stop recording and seal the replay.
    #[must_use]
    pub fn finish(mut self) -> Replay {
        self.replay
            .finalize(self.simulation.tick_count(), self.simulation.state_hash());
        self.replay
    }
}
