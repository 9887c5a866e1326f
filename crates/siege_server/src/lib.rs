//! # Siege Host Server
//!
//! Runs the battle simulation on a fixed timer and publishes a full
//! snapshot after every tick.
//!
//! The host (or an offline session) is authoritative. Clients never tick;
//! they mirror the snapshots they receive and forward their actions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod army_service;
pub mod driver;
pub mod error;
pub mod mirror;
pub mod protocol;

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use error::{DriverError, ProtocolError};

/// Which end of a session this process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Authoritative, with remote peers.
    #[default]
    Host,
    /// Authoritative, no peers.
    Offline,
    /// Mirrors a host.
    Client,
}

impl Role {
    /// Whether this role runs the tick engine.
    #[must_use]
    pub const fn is_authoritative(self) -> bool {
        matches!(self, Role::Host | Role::Offline)
    }
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Timer period in milliseconds (should match the client).
    pub tick_period_ms: u64,
    /// Session role.
    pub role: Role,
    /// Frames a slow subscriber may fall behind before it starts missing them.
    pub broadcast_capacity: usize,
    /// Bound on queued actions between two ticks.
    pub inbox_capacity: usize,
    /// How long match setup waits for the army generator.
    pub generator_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: siege_core::simulation::TICK_INTERVAL_MS,
            role: Role::Host,
            broadcast_capacity: 16,
            inbox_capacity: 256,
            generator_timeout_ms: 3_000,
        }
    }
}

impl ServerConfig {
    /// Load a RON file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DriverError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| DriverError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config: Self = ron::from_str(&text).map_err(|e| DriverError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate().map_err(|message| DriverError::Config {
            path: path.display().to_string(),
            message,
        })?;
        Ok(config)
    }

    /// Check values the driver cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_period_ms == 0 {
            return Err("tick_period_ms must be positive".to_string());
        }
        Ok(())
    }

    /// Timer period.
    #[must_use]
    pub const fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Army generator deadline.
    #[must_use]
    pub const fn generator_timeout(&self) -> Duration {
        Duration::from_millis(self.generator_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_period_matches_core() {
        assert_eq!(ServerConfig::default().tick_period(), Duration::from_millis(20));
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config: ServerConfig = ron::from_str("(role: offline, broadcast_capacity: 4)").unwrap();
        assert_eq!(config.role, Role::Offline);
        assert_eq!(config.broadcast_capacity, 4);
        assert_eq!(config.tick_period_ms, 20);
    }

    #[test]
    fn test_zero_period_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero_period.ron");
        std::fs::write(&path, "(tick_period_ms: 0)").unwrap();

        match ServerConfig::load(&path) {
            Err(DriverError::Config { message, .. }) => assert!(message.contains("tick_period_ms")),
            other => panic!("expected a config error, got {other:?}"),
        }
    }

    #[test]
    fn test_only_host_and_offline_tick() {
        assert!(Role::Host.is_authoritative());
        assert!(Role::Offline.is_authoritative());
        assert!(!Role::Client.is_authoritative());
    }
}
