//! Client-side mirror of a host's match.
//!
//! A client keeps the newest snapshot it has been sent and forwards its
//! own actions to the host. It never runs the tick engine.

use siege_core::actions::Action;
use siege_core::simulation::{GameStatus, Snapshot};
use tokio::sync::mpsc;

use crate::error::{DriverError, ProtocolError};
use crate::protocol::NetMessage;
use crate::Role;

/// Latest host state plus an outbound message queue.
#[derive(Debug)]
pub struct ClientMirror {
    snapshot: Option<Snapshot>,
    outbound: mpsc::Sender<NetMessage>,
    received: u64,
    stale: u64,
}

impl ClientMirror {
    /// Mirror that sends its requests to `outbound`.
    #[must_use]
    pub fn new(outbound: mpsc::Sender<NetMessage>) -> Self {
        Self {
            snapshot: None,
            outbound,
            received: 0,
            stale: 0,
        }
    }

    /// Apply one inbound message. Returns whether the view changed.
    ///
    /// Snapshots older than the one already held are dropped; transports
    /// may reorder.
    pub fn receive(&mut self, message: NetMessage) -> Result<bool, ProtocolError> {
        match message {
            NetMessage::Snapshot(snapshot) => {
                self.received += 1;
                if let Some(current) = &self.snapshot {
                    if snapshot.last_tick < current.last_tick {
                        self.stale += 1;
                        tracing::trace!(
                            got = snapshot.last_tick,
                            have = current.last_tick,
                            "Dropping stale snapshot"
                        );
                        return Ok(false);
                    }
                }
                self.snapshot = Some(*snapshot);
                Ok(true)
            }
            NetMessage::Hello { version, role } => {
                tracing::info!(version, ?role, "Host said hello");
                Ok(false)
            }
            other => Err(ProtocolError::Unexpected {
                message: other.kind(),
                role: Role::Client,
            }),
        }
    }

    /// Decode and apply one line from the transport.
    pub fn receive_line(&mut self, line: &str) -> Result<bool, ProtocolError> {
        self.receive(NetMessage::decode(line)?)
    }

    /// Forward an action to the host. Unknown actions go nowhere.
    pub async fn submit(&self, action: Action) -> Result<(), DriverError> {
        let Some(message) = NetMessage::from_action(action) else {
            return Ok(());
        };
        self.outbound.send(message).await.map_err(|_| DriverError::Stopped)
    }

    /// Newest snapshot, once one has arrived.
    #[must_use]
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Match status as last reported by the host.
    #[must_use]
    pub fn status(&self) -> GameStatus {
        self.snapshot
            .as_ref()
            .map_or(GameStatus::Playing, |s| s.game_status)
    }

    /// Snapshots received and how many of them were stale.
    #[must_use]
    pub const fn counters(&self) -> (u64, u64) {
        (self.received, self.stale)
    }
}

/// Apply lines from `inbound` until the transport closes.
///
/// Malformed lines are logged and skipped.
pub async fn pump(mirror: &mut ClientMirror, inbound: &mut mpsc::Receiver<String>) {
    while let Some(line) = inbound.recv().await {
        if let Err(error) = mirror.receive_line(&line) {
            tracing::warn!(%error, "Ignoring host message");
        }
    }
    tracing::info!("Host connection closed");
}
