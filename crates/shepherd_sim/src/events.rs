//! Events raised by a tick

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    CaughtByPredator,
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Won,
    Lost(LossReason),
}

impl Outcome {
    pub fn is_win(&self) -> bool {
        matches!(self, Self::Won)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    /// Survivor reached the goal
    Won,
    Lost { reason: LossReason },
    /// A predator struck a follower and the flock broke up
    FlockScattered,
    /// Scatter lifted; `recruited` followers regrouped around the survivor
    FlockRecalled { recruited: usize },
    /// Speed zone at `index` was used up
    ZoneActivated { index: usize },
    WaypointReached,
    ShelterEntered { index: usize },
    ShelterLeft { index: usize },
}

impl SimEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Won | Self::Lost { .. })
    }
}
