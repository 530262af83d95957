//! Shepherd AI - Agent Behaviour
//!
//! This crate provides everything that moves.
//!
//! # Features
//!
//! - Finite State Machines (FSM)
//! - Steering primitives and force blending
//! - Route composition and following (the AI director)
//! - Flocking followers with panic and luring
//! - Predators that wander, hunt and shelter from weather
//! - Survivor locomotion with shelter and speed zones
//!
//! # Example
//!
//! ```ignore
//! use shepherd_ai::prelude::*;
//!
//! let mut director = Director::new(DirectorTuning::default());
//! let target = director.update(&pathfinder, terrain.grid(), &view, &objectives);
//! ```

pub mod agent;
pub mod director;
pub mod flock;
pub mod predator;
pub mod state_machine;
pub mod steering;
pub mod survivor;
pub mod weather;
pub mod zones;

pub mod prelude {
    pub use crate::agent::{Agent, AgentKind};
    pub use crate::director::{
        compose_route, Director, DirectorTuning, DirectorView, FlockMode, Objective,
        StatusLabel,
    };
    pub use crate::flock::{step_flock, FlockEnv, FlockTuning, FlockWeights, Follower, Threat};
    pub use crate::predator::{
        spawn_predators, Predator, PredatorEnv, PredatorState, PredatorTuning, Strike,
    };
    pub use crate::state_machine::{State, StateMachine};
    pub use crate::steering::SteeringOutput;
    pub use crate::survivor::{
        nearest_hunter, ForceBlend, Survivor, SurvivorEnv, SurvivorReport,
        SurvivorTuning,
    };
    pub use crate::weather::{Weather, WeatherRules, WeatherState};
    pub use crate::zones::{BonusZone, Den, Waypoint, ZoneKind};
}

pub use prelude::*;
