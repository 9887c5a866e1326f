//! Static configuration tables.
//!
//! This module contains pure data structures: unit stats, field layout and
//! formation offsets, map metadata and match rules. All of them deserialize
//! from RON and are never mutated by the engine.

mod game_config;
mod layout;
mod map_data;
mod unit_data;

pub use game_config::{GameConfig, Rules};
pub use layout::{FormationOffsets, Layout};
pub use map_data::{MapInfo, DEFAULT_MAP_ID};
pub use unit_data::{UnitStats, UnitTable, UnitTypeConfig};
