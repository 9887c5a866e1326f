//! JSON protocol for headless battle sessions.
//!
//! The runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Responses and state
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0","tick":0}`
//! 2. Controller sends commands as JSON lines
//! 3. Runner answers each command; with auto-state on, every `tick` also
//!    outputs the state
//! 4. When the match is decided, outputs `{"type":"game_over",...}` once
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0}
//! -> {"cmd":"recruit","unit_type":"worker","side":"player"}
//! <- {"type":"ack","cmd":"recruit"}
//! -> {"cmd":"tick","count":50}
//! <- {"type":"ack","cmd":"tick"}
//! -> {"cmd":"command","side":"player","command":"ATTACK"}
//! <- {"type":"ack","cmd":"command"}
//! -> {"cmd":"query"}
//! <- {"type":"state","tick":50,"time_ms":1000,...}
//! ```

use serde::{Deserialize, Serialize};
use siege_core::components::{Command as CoreCommand, EntityId, PerSide, Side, UnitState, UnitType};
use siege_core::simulation::{GameStatus, Simulation};

/// Protocol version announced in [`Response::Ready`].
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (controller -> runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance the simulation by N ticks (default: 1).
    Tick {
        /// Ticks to run.
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Queue a recruit for the next tick.
    Recruit {
        /// Kind of unit.
        unit_type: UnitType,
        /// Buying side.
        side: Side,
    },

    /// Queue a standing-command change for the next tick.
    Command {
        /// Commanded side.
        side: Side,
        /// New command.
        command: CoreCommand,
    },

    /// Current state without advancing time.
    Query,

    /// Current state hash (for determinism checks).
    Hash,

    /// End the session.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Command name for acknowledgments.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Recruit { .. } => "recruit",
            Self::Command { .. } => "command",
            Self::Query => "query",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}

// ============================================================================
// Output Responses (runner -> controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        /// Protocol version.
        version: String,
        /// Ticks run so far.
        tick: u64,
    },

    /// Acknowledgment of a command.
    Ack {
        /// Command name.
        cmd: String,
    },

    /// Error processing a line.
    Error {
        /// What went wrong.
        message: String,
        /// Command name, when the line parsed.
        cmd: Option<String>,
    },

    /// Current battle state.
    State(Box<StateView>),

    /// The match was decided.
    GameOver {
        /// Outcome from the player's side.
        result: GameStatus,
        /// Ticks run when it was decided.
        ticks: u64,
    },

    /// State hash for determinism verification.
    StateHash {
        /// Ticks run so far.
        tick: u64,
        /// Snapshot hash.
        hash: u64,
    },

    /// Goodbye message before shutdown.
    Bye,
}

impl Response {
    /// Ready message for a runner that has run `tick` ticks.
    #[must_use]
    pub fn ready(tick: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            tick,
        }
    }

    /// Acknowledgment.
    #[must_use]
    pub fn ack(cmd: &str) -> Self {
        Self::Ack { cmd: cmd.to_string() }
    }

    /// Error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// State response for a simulation.
    #[must_use]
    pub fn state(sim: &Simulation) -> Self {
        Self::State(Box::new(StateView::of(sim)))
    }

    /// Serialize to a JSON line (with newline).
    #[must_use]
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

// ============================================================================
// State Types
// ============================================================================

/// Battle state as reported to a controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateView {
    /// Ticks run so far.
    pub tick: u64,
    /// Match clock.
    pub time_ms: u64,
    /// Outcome so far.
    pub game_status: GameStatus,
    /// Gold per side.
    pub gold: PerSide<u32>,
    /// Statue hit points per side.
    pub statue_hp: PerSide<f64>,
    /// Standing commands.
    pub commands: PerSide<CoreCommand>,
    /// Units on the field, dying ones included.
    pub units: Vec<UnitView>,
    /// Projectiles in flight.
    pub projectiles: usize,
    /// Snapshot hash.
    pub hash: u64,
}

impl StateView {
    /// Summarize a simulation.
    #[must_use]
    pub fn of(sim: &Simulation) -> Self {
        let snapshot = sim.snapshot();
        Self {
            tick: sim.tick_count(),
            time_ms: snapshot.last_tick,
            game_status: snapshot.game_status,
            gold: snapshot.gold,
            statue_hp: snapshot.statue_hp,
            commands: snapshot.commands,
            units: snapshot
                .units
                .iter()
                .map(|u| UnitView {
                    id: u.id,
                    unit_type: u.unit_type,
                    side: u.side,
                    x: u.x,
                    hp: u.hp,
                    max_hp: u.max_hp,
                    state: u.state,
                })
                .collect(),
            projectiles: snapshot.projectiles.len(),
            hash: snapshot.state_hash(),
        }
    }
}

/// One unit as reported to a controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitView {
    /// Unit id.
    pub id: EntityId,
    /// Kind of unit.
    pub unit_type: UnitType,
    /// Owning side.
    pub side: Side,
    /// Position.
    pub x: f64,
    /// Hit points.
    pub hp: f64,
    /// Maximum hit points.
    pub max_hp: f64,
    /// Behavioral state.
    pub state: UnitState,
}
