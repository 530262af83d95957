//! Read-only picture of a session for presentation layers

use crate::error::Result;
use crate::events::Outcome;
use crate::state::SimulationState;
use serde::{Deserialize, Serialize};
use shepherd_ai::{FlockMode, Follower, PredatorState, Survivor, Waypoint, Weather};
use shepherd_math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredatorSnapshot {
    pub position: Vec2,
    pub velocity: Vec2,
    pub state: PredatorState,
}

/// Everything a renderer reads after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    /// Player-facing status label, e.g. `HUNTED!`
    pub status: String,
    pub mode: FlockMode,
    pub outcome: Option<Outcome>,
    pub weather: Weather,
    pub speed_multiplier: f32,
    pub scattered: bool,
    /// Followers currently recruited
    pub recruited: usize,
    pub survivor: Survivor,
    pub followers: Vec<Follower>,
    pub predators: Vec<PredatorSnapshot>,
    pub route: Vec<Vec2>,
    pub route_cursor: usize,
    pub waypoints: Vec<Waypoint>,
}

impl Snapshot {
    pub fn capture(state: &SimulationState) -> Self {
        let director = state.director();
        Self {
            tick: state.tick_count(),
            status: director.status().as_str().to_string(),
            mode: director.mode(),
            outcome: state.outcome(),
            weather: state.weather().weather,
            speed_multiplier: state.speed_multiplier(),
            scattered: state.is_scattered(),
            recruited: state.recruited_count(),
            survivor: state.survivor().clone(),
            followers: state.followers().to_vec(),
            predators: state
                .predators()
                .iter()
                .map(|p| PredatorSnapshot {
                    position: p.position,
                    velocity: p.velocity,
                    state: p.state,
                })
                .collect(),
            route: director.route().points().to_vec(),
            route_cursor: director.route().cursor(),
            waypoints: state.waypoints().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
