//! Tab State Machine
//!
//! ```text
//! Active  <-> Background
//!               | memory pressure
//!               v
//!           Discarded --(materialize)--> Background / Active
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabState {
    /// Foreground tab with a live render surface
    Active,
    /// Live render surface, not visible
    Background,
    /// Render surface released, only saved state remains
    Discarded,
}

impl TabState {
    /// Check if transition to another state is valid
    pub fn can_transition_to(&self, target: TabState) -> bool {
        match (self, target) {
            (TabState::Active, TabState::Background) => true,
            (TabState::Background, TabState::Active) => true,
            (TabState::Background, TabState::Discarded) => true,
            (TabState::Discarded, TabState::Background) => true,
            (TabState::Discarded, TabState::Active) => true,
            (a, b) if *a == b => true,
            _ => false,
        }
    }

    pub fn is_foreground(&self) -> bool {
        matches!(self, TabState::Active)
    }

    pub fn is_discarded(&self) -> bool {
        matches!(self, TabState::Discarded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TabState::Active => "active",
            TabState::Background => "background",
            TabState::Discarded => "discarded",
        }
    }
}

impl std::fmt::Display for TabState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TabState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(TabState::Active),
            "background" => Ok(TabState::Background),
            "discarded" => Ok(TabState::Discarded),
            _ => Err(format!("Unknown tab state: {}", s)),
        }
    }
}
