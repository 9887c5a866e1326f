//! Fixed-interval host driver.
//!
//! One task owns the [`Simulation`]. Everything else talks to it through
//! channels:
//!
//! - actions go in through a bounded mpsc inbox, drained at the start of
//!   each tick
//! - every tick's [`Frame`] goes out on a broadcast channel
//! - the match status is mirrored on a watch channel
//! - peer connection events go in through an unbounded channel so the
//!   transport never waits on the simulation
//!
//! The timer uses [`MissedTickBehavior::Delay`]: a slow tick pushes the
//! next one back instead of firing a burst to catch up, so ticks never
//! overlap and none are skipped.

use std::sync::Arc;
use std::time::Duration;

use siege_core::actions::Action;
use siege_core::components::Millis;
use siege_core::simulation::{GameStatus, Simulation, Snapshot, TickEvents};
use tokio::sync::{broadcast, mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::error::{DriverError, ProtocolError};
use crate::protocol::{accept_at_host, NetMessage, PeerEvent, PeerId};
use crate::{Role, ServerConfig};

/// What the driver publishes after each tick. Immutable once sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Ticks run so far, this one included.
    pub tick: u64,
    /// State after the tick.
    pub snapshot: Snapshot,
    /// What happened during the tick.
    pub events: TickEvents,
}

impl Frame {
    /// Wire form for remote peers.
    #[must_use]
    pub fn to_message(&self) -> NetMessage {
        NetMessage::Snapshot(Box::new(self.snapshot.clone()))
    }
}

/// Owner-side handle to a running driver.
///
/// Dropping the handle without calling [`stop`](Self::stop) still asks
/// the task to wind down.
#[derive(Debug)]
pub struct DriverHandle {
    actions: mpsc::Sender<Action>,
    peers: mpsc::UnboundedSender<PeerEvent>,
    frames: broadcast::Sender<Arc<Frame>>,
    status: watch::Receiver<GameStatus>,
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<Simulation>>,
}

impl DriverHandle {
    /// Start ticking `sim` on the current runtime.
    ///
    /// The first tick fires one period after the call. Fails for roles
    /// that do not run the simulation.
    pub fn spawn(sim: Simulation, config: &ServerConfig) -> Result<Self, DriverError> {
        if !config.role.is_authoritative() {
            return Err(DriverError::NotAuthoritative(config.role));
        }
        config.validate().map_err(|message| DriverError::Config {
            path: "<in-memory>".to_string(),
            message,
        })?;

        let (actions, inbox) = mpsc::channel(config.inbox_capacity.max(1));
        let (peers, peer_rx) = mpsc::unbounded_channel();
        let (frames, _) = broadcast::channel(config.broadcast_capacity.max(1));
        let (status_tx, status) = watch::channel(sim.snapshot().game_status);
        let shutdown = Arc::new(Notify::new());

        let worker = Worker {
            sim,
            role: config.role,
            period: config.tick_period(),
            inbox,
            peers: peer_rx,
            frames: frames.clone(),
            status: status_tx,
            shutdown: Arc::clone(&shutdown),
        };

        tracing::info!(
            role = ?config.role,
            period_ms = config.tick_period_ms,
            "Driver started"
        );

        Ok(Self {
            actions,
            peers,
            frames,
            status,
            shutdown,
            task: Some(tokio::spawn(worker.run())),
        })
    }

    /// Queue an action for the next tick, waiting if the inbox is full.
    pub async fn submit(&self, action: Action) -> Result<(), DriverError> {
        self.actions.send(action).await.map_err(|_| DriverError::Stopped)
    }

    /// Queue an action without waiting. A full inbox drops the action.
    pub fn try_submit(&self, action: Action) -> Result<(), DriverError> {
        match self.actions.try_send(action) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(action)) => {
                tracing::warn!(?action, "Action inbox full, dropping action");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(DriverError::Stopped),
        }
    }

    /// Another producer for the action inbox.
    #[must_use]
    pub fn action_sender(&self) -> mpsc::Sender<Action> {
        self.actions.clone()
    }

    /// Feed a peer's message to the match.
    ///
    /// Requests become actions; anything else is logged. A stopped driver
    /// is not the peer's fault, so it is only logged too.
    pub fn receive(&self, peer: PeerId, message: &NetMessage) -> Result<(), ProtocolError> {
        if let Some(action) = accept_at_host(peer, message)? {
            if let Err(error) = self.try_submit(action) {
                tracing::warn!(peer, %error, "Dropping peer action");
            }
        }
        Ok(())
    }

    /// Report a connection event. Never blocks.
    pub fn peer_event(&self, event: PeerEvent) {
        if self.peers.send(event).is_err() {
            tracing::debug!("Peer event after driver stopped");
        }
    }

    /// Receive every frame published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Frame>> {
        self.frames.subscribe()
    }

    /// Watch the match status.
    #[must_use]
    pub fn status(&self) -> watch::Receiver<GameStatus> {
        self.status.clone()
    }

    /// Wait until the match is decided.
    pub async fn wait_until_over(&mut self) -> Result<GameStatus, DriverError> {
        let status = self
            .status
            .wait_for(|s| s.is_over())
            .await
            .map_err(|_| DriverError::Stopped)?;
        Ok(*status)
    }

    /// Stop the timer and take the simulation back.
    pub async fn stop(mut self) -> Result<Simulation, DriverError> {
        self.shutdown.notify_one();
        let task = self.task.take().ok_or(DriverError::Stopped)?;
        Ok(task.await?)
    }
}

impl Drop for DriverHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.shutdown.notify_one();
        }
    }
}

/// State moved into the driver task.
struct Worker {
    sim: Simulation,
    role: Role,
    period: Duration,
    inbox: mpsc::Receiver<Action>,
    peers: mpsc::UnboundedReceiver<PeerEvent>,
    frames: broadcast::Sender<Arc<Frame>>,
    status: watch::Sender<GameStatus>,
    shutdown: Arc<Notify>,
}

impl Worker {
    async fn run(mut self) -> Simulation {
        let origin = Instant::now();
        let base = self.sim.snapshot().last_tick;
        let mut interval = time::interval_at(origin + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = self.shutdown.notified() => break,
                _ = interval.tick() => {}
            }

            let started = Instant::now();
            self.drain_peers();
            while let Ok(action) = self.inbox.try_recv() {
                self.sim.submit(action);
            }

            let now = base + elapsed_ms(origin);
            let events = self.sim.tick(now);
            let game_status = self.sim.snapshot().game_status;
            self.status.send_if_modified(|current| {
                let changed = *current != game_status;
                *current = game_status;
                changed
            });

            let frame = Arc::new(Frame {
                tick: self.sim.tick_count(),
                snapshot: self.sim.snapshot().clone(),
                events,
            });
            // Nobody listening is fine.
            let _ = self.frames.send(frame);

            let spent = started.elapsed();
            if spent > self.period {
                tracing::warn!(
                    tick = self.sim.tick_count(),
                    spent_us = spent.as_micros() as u64,
                    "Tick overran its period"
                );
            }
        }

        tracing::info!(ticks = self.sim.tick_count(), "Driver stopped");
        self.sim
    }

    fn drain_peers(&mut self) {
        while let Ok(event) = self.peers.try_recv() {
            match self.role {
                Role::Offline => tracing::debug!(?event, "Ignoring peer event offline"),
                Role::Host | Role::Client => event.log(),
            }
        }
    }
}

fn elapsed_ms(origin: Instant) -> Millis {
    u64::try_from(origin.elapsed().as_millis()).unwrap_or(Millis::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use siege_core::components::{Side, UnitType};
    use siege_core::data::GameConfig;
    use siege_core::simulation::MatchConfig;

    fn quiet() -> Simulation {
        let match_config = MatchConfig {
            ai_sides: Vec::new(),
            ..MatchConfig::default()
        };
        Simulation::new(GameConfig::default(), &match_config, 0)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_on_the_period() {
        let driver = DriverHandle::spawn(quiet(), &ServerConfig::default()).unwrap();
        let mut frames = driver.subscribe();

        for expected in 1..=5u64 {
            let frame = frames.recv().await.unwrap();
            assert_eq!(frame.tick, expected);
            assert_eq!(frame.snapshot.last_tick, expected * 20);
        }

        let sim = driver.stop().await.unwrap();
        assert!(sim.tick_count() >= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_actions_apply_on_next_tick() {
        let driver = DriverHandle::spawn(quiet(), &ServerConfig::default()).unwrap();
        let mut frames = driver.subscribe();

        driver
            .submit(Action::recruit(UnitType::Worker, Side::Player))
            .await
            .unwrap();
        let frame = frames.recv().await.unwrap();
        assert_eq!(frame.events.recruited.len(), 1);
        assert_eq!(frame.snapshot.gold.get(Side::Player), &0);

        driver.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_period_is_refused() {
        let config = ServerConfig {
            tick_period_ms: 0,
            ..ServerConfig::default()
        };
        let result = DriverHandle::spawn(quiet(), &config);
        assert!(matches!(result, Err(DriverError::Config { .. })));
    }

    #[tokio::test]
    async fn test_client_role_cannot_drive() {
        let config = ServerConfig {
            role: Role::Client,
            ..ServerConfig::default()
        };
        let result = DriverHandle::spawn(quiet(), &config);
        assert!(matches!(result, Err(DriverError::NotAuthoritative(Role::Client))));
    }
}
