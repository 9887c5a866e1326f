//! Wire messages between a host and its clients.
//!
//! Only the message shapes live here; the transport is the embedder's.
//! Every message is a JSON object tagged by `type` with its payload under
//! `data`:
//!
//! ```json
//! {"type":"RECRUIT","data":{"unit_type":"archer","side":"player"}}
//! ```

use serde::{Deserialize, Serialize};
use siege_core::actions::Action;
use siege_core::components::{Command, Side, UnitType};
use siege_core::simulation::Snapshot;

use crate::error::ProtocolError;
use crate::Role;

/// Bumped whenever a message shape changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Transport-assigned peer identifier.
pub type PeerId = u64;

/// A message on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetMessage {
    /// First message on a new connection.
    Hello {
        /// Sender's [`PROTOCOL_VERSION`].
        version: u32,
        /// Sender's role.
        role: Role,
    },
    /// Full authoritative state, host to clients, once per tick.
    Snapshot(Box<Snapshot>),
    /// Client asks the host to buy a unit.
    Recruit {
        /// Kind of unit.
        unit_type: UnitType,
        /// Buying side.
        side: Side,
    },
    /// Client asks the host to change a standing command.
    ChangeCommand {
        /// Commanded side.
        side: Side,
        /// New command.
        command: Command,
    },
}

impl NetMessage {
    /// Greeting for this build.
    #[must_use]
    pub const fn hello(role: Role) -> Self {
        Self::Hello {
            version: PROTOCOL_VERSION,
            role,
        }
    }

    /// Wire form of an action. Unknown actions have none.
    #[must_use]
    pub const fn from_action(action: Action) -> Option<Self> {
        match action {
            Action::Recruit { unit_type, side } => Some(Self::Recruit { unit_type, side }),
            Action::ChangeCommand { side, command } => Some(Self::ChangeCommand { side, command }),
            Action::Unknown => None,
        }
    }

    /// The action this message carries, if any.
    #[must_use]
    pub const fn to_action(&self) -> Option<Action> {
        match *self {
            Self::Recruit { unit_type, side } => Some(Action::recruit(unit_type, side)),
            Self::ChangeCommand { side, command } => Some(Action::command(side, command)),
            Self::Hello { .. } | Self::Snapshot(_) => None,
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "hello",
            Self::Snapshot(_) => "snapshot",
            Self::Recruit { .. } => "recruit",
            Self::ChangeCommand { .. } => "change_command",
        }
    }

    /// Encode as one line of JSON.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode one JSON message.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// What an authoritative end does with an inbound message.
///
/// Actions are returned for the inbox. Greetings are logged, and a
/// version mismatch is only a warning. Snapshots never flow toward the
/// authority.
pub fn accept_at_host(peer: PeerId, message: &NetMessage) -> Result<Option<Action>, ProtocolError> {
    match message {
        NetMessage::Hello { version, role } => {
            if *version != PROTOCOL_VERSION {
                tracing::warn!(peer, version, expected = PROTOCOL_VERSION, "Peer protocol mismatch");
            }
            tracing::info!(peer, ?role, "Peer said hello");
            Ok(None)
        }
        NetMessage::Snapshot(_) => Err(ProtocolError::Unexpected {
            message: message.kind(),
            role: Role::Host,
        }),
        NetMessage::Recruit { .. } | NetMessage::ChangeCommand { .. } => {
            tracing::debug!(peer, kind = message.kind(), "Peer action");
            Ok(message.to_action())
        }
    }
}

/// Connection lifecycle notifications from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    /// A peer connected.
    Connected {
        /// Peer id.
        peer: PeerId,
    },
    /// A peer went away.
    Disconnected {
        /// Peer id.
        peer: PeerId,
        /// Transport-supplied reason, if any.
        reason: Option<String>,
    },
}

impl PeerEvent {
    /// Log the event. Peer churn never touches the match.
    pub fn log(&self) {
        match self {
            PeerEvent::Connected { peer } => tracing::info!(peer, "Peer connected"),
            PeerEvent::Disconnected { peer, reason } => {
                tracing::info!(peer, reason = reason.as_deref().unwrap_or("none"), "Peer disconnected");
            }
        }
    }
}
