//! Map metadata.
//!
//! Maps only change presentation. The snapshot carries the id so clients
//! pick the same backdrop as the host.

use serde::{Deserialize, Serialize};

/// Map identifier used when none is chosen.
pub const DEFAULT_MAP_ID: &str = "grasslands";

/// Presentation metadata for one map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapInfo {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Theme key for the renderer.
    pub theme: String,
}

impl MapInfo {
    fn new(id: &str, name: &str, theme: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            theme: theme.to_string(),
        }
    }

    /// Built-in maps.
    #[must_use]
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::new(DEFAULT_MAP_ID, "Grasslands", "meadow"),
            Self::new("swamp", "Goo Swamp", "bog"),
            Self::new("volcano", "Ashen Ridge", "lava"),
        ]
    }
}
