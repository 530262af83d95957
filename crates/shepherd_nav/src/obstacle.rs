//! Static obstacles

use serde::{Deserialize, Serialize};
use shepherd_math::Vec2;

/// Decorative tag carried through to presentation; it has no effect on
/// collision or walkability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleKind {
    #[default]
    Oak,
    Pine,
    Palm,
    Round,
}

/// A circular obstacle, static for the lifetime of a world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub position: Vec2,
    pub radius: f32,
    #[serde(default)]
    pub kind: ObstacleKind,
}

impl Obstacle {
    pub fn new(position: Vec2, radius: f32) -> Self {
        Self {
            position,
            radius,
            kind: ObstacleKind::default(),
        }
    }

    /// Whether `point` lies closer than `radius + clearance` to the centre
    #[inline]
    pub fn blocks(&self, point: Vec2, clearance: f32) -> bool {
        let min_dist = self.radius + clearance;
        point.distance_squared(self.position) < min_dist * min_dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_with_clearance() {
        let o = Obstacle::new(Vec2::new(100.0, 100.0), 20.0);
        assert!(o.blocks(Vec2::new(115.0, 100.0), 0.0));
        assert!(!o.blocks(Vec2::new(125.0, 100.0), 0.0));
        assert!(o.blocks(Vec2::new(125.0, 100.0), 10.0));
    }
}
