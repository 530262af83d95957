//! Shepherd Nav - Spatial Queries and Pathfinding
//!
//! This crate provides the static-world half of the simulation.
//!
//! # Features
//!
//! - Uniform-cell spatial hash for broad-phase neighbour queries
//! - Obstacle set with its own hash, rebuilt together with the nav grid
//! - Walkability grid baked from obstacle clearance
//! - 8-connected grid A* with an expansion cap
//! - Routes with an arrival cursor
//!
//! # Example
//!
//! ```ignore
//! use shepherd_nav::prelude::*;
//!
//! let terrain = Terrain::new(NavSettings::default(), vec![
//!     Obstacle::new(Vec2::new(1000.0, 1000.0), 80.0),
//! ]);
//! let outcome = Pathfinder::default().find_path(
//!     terrain.grid(),
//!     Vec2::new(300.0, 300.0),
//!     Vec2::new(4600.0, 4600.0),
//! );
//! ```

pub mod grid;
pub mod obstacle;
pub mod pathfinder;
pub mod route;
pub mod spatial;
pub mod terrain;

pub mod prelude {
    pub use crate::grid::{GridCoord, WalkabilityGrid};
    pub use crate::obstacle::{Obstacle, ObstacleKind};
    pub use crate::pathfinder::{PathOutcome, Pathfinder};
    pub use crate::route::Route;
    pub use crate::spatial::SpatialHash;
    pub use crate::terrain::{NavSettings, Terrain};
    pub use shepherd_math::Vec2;
}

pub use prelude::*;
