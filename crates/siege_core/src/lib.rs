//! # Siege Core
//!
//! Deterministic battle simulation for a two-sided, one-dimensional siege
//! game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No networking
//! - No system randomness (the opponent policy rolls from an injected,
//!   seeded source)
//!
//! This separation enables:
//! - Host-authoritative multiplayer (clients only mirror snapshots)
//! - Headless batch runs
//! - Replay systems
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`simulation`] - Snapshot, tick engine and the match owner
//! - [`behavior`] - Per-unit state machine
//! - [`abilities`] - Per-type ability kits and passives
//! - [`status`] - Stun, root, poison and slow
//! - [`combat`] - Damage mitigation
//! - [`ai`] - Scripted opponent
//! - [`army`] - Generated starting armies with a built-in fallback
//! - [`data`] - Configuration tables

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod abilities;
pub mod actions;
pub mod ai;
pub mod army;
pub mod behavior;
pub mod combat;
pub mod components;
pub mod data;
pub mod economy;
pub mod error;
pub mod math;
pub mod projectiles;
pub mod random;
pub mod replay;
pub mod simulation;
pub mod status;
pub mod targeting;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::actions::{Action, ActionQueue};
    pub use crate::ai::OpponentPolicy;
    pub use crate::army::{army_or_fallback, ArmyDescription, ArmyError, ArmyGenerator, BattleReport};
    pub use crate::combat::{DamageEvent, DamageKind, DamageTarget};
    pub use crate::components::*;
    pub use crate::data::{GameConfig, Layout, Rules, UnitStats, UnitTable};
    pub use crate::error::{GameError, Result};
    pub use crate::random::{RandomSource, ScriptedRandom, SeededRandom};
    pub use crate::replay::{Recorder, Replay};
    pub use crate::simulation::{
        advance, GameStatus, MatchConfig, Simulation, Snapshot, TickEvents, TickOutcome,
        TICK_INTERVAL_MS,
    };
    pub use crate::status::{EffectKind, StatusEffect, StatusEffects};
}
