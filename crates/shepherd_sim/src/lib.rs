//! Shepherd Sim - Session State and Tick Pipeline
//!
//! Owns one session: terrain, agents, route director, weather and the
//! per-tick inputs. A tick always runs in the same order:
//!
//! 1. follower hash rebuild
//! 2. director (route recompute / advance, target)
//! 3. predators
//! 4. survivor
//! 5. followers
//!
//! # Example
//!
//! ```ignore
//! use shepherd_sim::prelude::*;
//!
//! let mut sim = SimulationState::new(SessionConfig::medium())?;
//! while sim.outcome().is_none() {
//!     sim.tick(&TickInput::default())?;
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod layout;
pub mod snapshot;
pub mod state;

pub mod prelude {
    pub use crate::clock::FrameLimiter;
    pub use crate::config::{Difficulty, SessionConfig};
    pub use crate::error::{Result, SimError};
    pub use crate::events::{LossReason, Outcome, SimEvent};
    pub use crate::layout::{build_world, BuiltWorld, FixedLayout, WorldGenerator, WorldLayout};
    pub use crate::snapshot::Snapshot;
    pub use crate::state::{SimulationState, TickInput};
    pub use shepherd_ai::prelude::*;
    pub use shepherd_math::Vec2;
    pub use shepherd_nav::prelude::*;
}

pub use prelude::*;
