//! Static world geometry: obstacles plus the two structures derived from them

use crate::grid::WalkabilityGrid;
use crate::obstacle::Obstacle;
use crate::spatial::SpatialHash;
use serde::{Deserialize, Serialize};
use shepherd_math::Vec2;

/// Navigation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavSettings {
    /// Side length of the square world
    pub extent: f32,
    /// Walkability grid cell size
    pub cell_size: f32,
    /// Extra clearance beyond obstacle radius + half a cell
    pub margin: f32,
    /// Obstacle hash cell size (larger than the flock hash)
    pub obstacle_cell_size: f32,
    /// Minimum reach beyond an obstacle's radius that its hash entry covers
    pub query_margin: f32,
}

impl Default for NavSettings {
    fn default() -> Self {
        Self {
            extent: 5000.0,
            cell_size: 60.0,
            margin: 20.0,
            obstacle_cell_size: 200.0,
            query_margin: 50.0,
        }
    }
}

impl NavSettings {
    /// How far past its radius an obstacle is bucketed
    pub fn influence_margin(&self) -> f32 {
        (self.cell_size / 2.0 + self.margin).max(self.query_margin)
    }
}

/// Obstacle list, obstacle hash and walkability grid for one world.
///
/// The hash and grid are only ever rebuilt together, so they cannot drift
/// apart from the obstacle list.
#[derive(Debug, Clone)]
pub struct Terrain {
    settings: NavSettings,
    obstacles: Vec<Obstacle>,
    obstacle_hash: SpatialHash<usize>,
    grid: WalkabilityGrid,
}

impl Terrain {
    /// Build hash and grid for the given obstacles
    pub fn new(settings: NavSettings, obstacles: Vec<Obstacle>) -> Self {
        let mut terrain = Self {
            obstacle_hash: SpatialHash::new(settings.obstacle_cell_size),
            grid: WalkabilityGrid::open(settings.extent, settings.cell_size),
            settings,
            obstacles,
        };
        terrain.rebuild();
        terrain
    }

    /// Swap in a new obstacle set and rebake
    pub fn replace_obstacles(&mut self, obstacles: Vec<Obstacle>) {
        self.obstacles = obstacles;
        self.rebuild();
    }

    /// Drop every obstacle and rebake to a fully open grid
    pub fn clear_obstacles(&mut self) {
        self.replace_obstacles(Vec::new());
    }

    fn rebuild(&mut self) {
        let reach = self.settings.influence_margin();
        self.obstacle_hash.clear();
        for (i, o) in self.obstacles.iter().enumerate() {
            self.obstacle_hash.insert_radius(o.position, o.radius + reach, i);
        }
        self.grid = WalkabilityGrid::bake(
            &self.obstacles,
            &self.obstacle_hash,
            self.settings.extent,
            self.settings.cell_size,
            self.settings.margin,
        );
    }

    pub fn settings(&self) -> &NavSettings {
        &self.settings
    }

    pub fn extent(&self) -> f32 {
        self.settings.extent
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn obstacle_hash(&self) -> &SpatialHash<usize> {
        &self.obstacle_hash
    }

    pub fn grid(&self) -> &WalkabilityGrid {
        &self.grid
    }

    /// Obstacles whose influence (radius + `influence_margin`) may reach `pos`
    pub fn nearby_obstacles(&self, pos: Vec2) -> impl Iterator<Item = &Obstacle> + '_ {
        self.obstacle_hash
            .query(pos)
            .iter()
            .map(move |&i| &self.obstacles[i])
    }

    /// Clamp a point into the world square
    pub fn clamp_to_world(&self, pos: Vec2) -> Vec2 {
        pos.clamp_to_square(self.settings.extent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearby_obstacles_cover_influence() {
        let terrain = Terrain::new(
            NavSettings::default(),
            vec![Obstacle::new(Vec2::new(1000.0, 1000.0), 80.0)],
        );

        // Just inside radius + margin on every side
        for point in [
            Vec2::new(1000.0 + 129.0, 1000.0),
            Vec2::new(1000.0 - 129.0, 1000.0),
            Vec2::new(1000.0, 1000.0 + 129.0),
            Vec2::new(1000.0, 1000.0 - 129.0),
        ] {
            assert_eq!(terrain.nearby_obstacles(point).count(), 1, "{:?}", point);
        }
    }

    #[test]
    fn test_clear_obstacles_rebakes() {
        let mut terrain = Terrain::new(
            NavSettings::default(),
            vec![Obstacle::new(Vec2::new(1000.0, 1000.0), 80.0)],
        );
        let total = terrain.grid().len();
        assert!(terrain.grid().walkable_count() < total);

        terrain.clear_obstacles();
        assert_eq!(terrain.grid().walkable_count(), total);
        assert_eq!(terrain.nearby_obstacles(Vec2::new(1000.0, 1000.0)).count(), 0);
    }
}
