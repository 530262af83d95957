//! Objectives and shelters placed in the world

use serde::{Deserialize, Serialize};
use shepherd_math::Vec2;

/// Default radius of a speed zone
pub const SPEED_ZONE_RADIUS: f32 = 75.0;
/// Default radius of a shelter zone
pub const SHELTER_ZONE_RADIUS: f32 = 60.0;
/// Radius of every user waypoint
pub const WAYPOINT_RADIUS: f32 = 75.0;
/// Default radius of a predator den
pub const DEN_RADIUS: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    /// One-shot: boost, extra followers, then deactivates
    Speed,
    /// Persistent: makes the survivor invincible while inside
    Shelter,
}

fn active_by_default() -> bool {
    true
}

/// A circular bonus region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BonusZone {
    pub position: Vec2,
    pub radius: f32,
    pub kind: ZoneKind,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

impl BonusZone {
    pub fn speed(position: Vec2) -> Self {
        Self {
            position,
            radius: SPEED_ZONE_RADIUS,
            kind: ZoneKind::Speed,
            active: true,
        }
    }

    pub fn shelter(position: Vec2) -> Self {
        Self {
            position,
            radius: SHELTER_ZONE_RADIUS,
            kind: ZoneKind::Shelter,
            active: true,
        }
    }

    /// Strictly inside the zone
    pub fn contains(&self, point: Vec2) -> bool {
        self.position.distance_squared(point) < self.radius * self.radius
    }

    /// An active speed zone, i.e. a route objective
    pub fn is_open_speed_zone(&self) -> bool {
        self.active && self.kind == ZoneKind::Speed
    }
}

/// A user-placed point the route must visit. Consumed on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub position: Vec2,
    pub radius: f32,
}

impl Waypoint {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            radius: WAYPOINT_RADIUS,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.position.distance_squared(point) < self.radius * self.radius
    }
}

/// Where predators wait out bad weather
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Den {
    pub position: Vec2,
    #[serde(default = "default_den_radius")]
    pub radius: f32,
}

fn default_den_radius() -> f32 {
    DEN_RADIUS
}

impl Den {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            radius: DEN_RADIUS,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.position.distance_squared(point) < self.radius * self.radius
    }
}
