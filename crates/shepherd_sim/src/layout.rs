//! World layouts and connectivity validation
//!
//! A layout is only accepted once the nav grid baked from it connects the
//! survivor spawn to the goal. Generators get a bounded number of attempts;
//! if none connects, the obstacles are dropped so the session still starts
//! on a solvable map.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use shepherd_ai::{BonusZone, Den};
use shepherd_math::Vec2;
use shepherd_nav::{NavSettings, Obstacle, PathOutcome, Pathfinder, Terrain};

/// Obstacles, bonus zones and dens for one world
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldLayout {
    pub obstacles: Vec<Obstacle>,
    pub zones: Vec<BonusZone>,
    pub dens: Vec<Den>,
}

/// Source of candidate layouts
pub trait WorldGenerator {
    /// Produce the candidate for the given attempt (0-based)
    fn generate(&mut self, attempt: u32, rng: &mut StdRng) -> WorldLayout;

    /// Attempts allowed before falling back to an obstacle-free world
    fn max_attempts(&self) -> u32 {
        10
    }
}

/// Always yields the same layout
#[derive(Debug, Clone, Default)]
pub struct FixedLayout(pub WorldLayout);

impl WorldGenerator for FixedLayout {
    fn generate(&mut self, _attempt: u32, _rng: &mut StdRng) -> WorldLayout {
        self.0.clone()
    }

    fn max_attempts(&self) -> u32 {
        1
    }
}

/// Result of [`build_world`]
#[derive(Debug, Clone)]
pub struct BuiltWorld {
    pub terrain: Terrain,
    pub layout: WorldLayout,
    /// Whether the kept layout passed the connectivity check
    pub validated: bool,
    /// Candidates tried
    pub attempts: u32,
}

/// Generate layouts until one connects `spawn` to `goal`. A path of a single
/// point (spawn and goal in one cell) does not count as connected.
pub fn build_world(
    generator: &mut dyn WorldGenerator,
    settings: &NavSettings,
    spawn: Vec2,
    goal: Vec2,
    pathfinder: &Pathfinder,
    rng: &mut StdRng,
) -> BuiltWorld {
    let max_attempts = generator.max_attempts().max(1);
    let mut terrain = Terrain::new(settings.clone(), Vec::new());
    let mut layout = WorldLayout::default();

    for attempt in 0..max_attempts {
        layout = generator.generate(attempt, rng);
        terrain.replace_obstacles(layout.obstacles.clone());

        match pathfinder.find_path(terrain.grid(), spawn, goal) {
            PathOutcome::Found(points) if points.len() > 1 => {
                log::info!(
                    "World layout accepted on attempt {} ({} obstacles, {} path points)",
                    attempt + 1,
                    layout.obstacles.len(),
                    points.len()
                );
                return BuiltWorld {
                    terrain,
                    layout,
                    validated: true,
                    attempts: attempt + 1,
                };
            }
            outcome => {
                log::debug!(
                    "World layout attempt {} rejected: {:?}",
                    attempt + 1,
                    outcome
                );
            }
        }
    }

    log::warn!(
        "No connected layout after {} attempts; clearing obstacles",
        max_attempts
    );
    layout.obstacles.clear();
    terrain.clear_obstacles();
    BuiltWorld {
        terrain,
        layout,
        validated: false,
        attempts: max_attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn settings() -> NavSettings {
        NavSettings {
            extent: 1000.0,
            ..Default::default()
        }
    }

    fn wall() -> Vec<Obstacle> {
        (0..=10)
            .map(|i| Obstacle::new(Vec2::new(500.0, i as f32 * 100.0), 60.0))
            .collect()
    }

    /// Walled on the first attempt, open afterwards
    struct WallThenOpen;

    impl WorldGenerator for WallThenOpen {
        fn generate(&mut self, attempt: u32, _rng: &mut StdRng) -> WorldLayout {
            WorldLayout {
                obstacles: if attempt == 0 { wall() } else { Vec::new() },
                ..Default::default()
            }
        }
    }

    #[test]
    fn test_fixed_layout_accepted() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut generator = FixedLayout(WorldLayout {
            obstacles: vec![Obstacle::new(Vec2::new(500.0, 500.0), 80.0)],
            ..Default::default()
        });
        let built = build_world(
            &mut generator,
            &settings(),
            Vec2::new(100.0, 100.0),
            Vec2::new(900.0, 900.0),
            &Pathfinder::default(),
            &mut rng,
        );
        assert!(built.validated);
        assert_eq!(built.attempts, 1);
        assert_eq!(built.terrain.obstacles().len(), 1);
    }

    #[test]
    fn test_retries_until_connected() {
        let mut rng = StdRng::seed_from_u64(1);
        let built = build_world(
            &mut WallThenOpen,
            &settings(),
            Vec2::new(100.0, 500.0),
            Vec2::new(900.0, 500.0),
            &Pathfinder::default(),
            &mut rng,
        );
        assert!(built.validated);
        assert_eq!(built.attempts, 2);
        assert!(built.layout.obstacles.is_empty());
    }

    #[test]
    fn test_single_cell_path_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut generator = FixedLayout(WorldLayout {
            obstacles: vec![Obstacle::new(Vec2::new(500.0, 500.0), 80.0)],
            ..Default::default()
        });
        let built = build_world(
            &mut generator,
            &settings(),
            Vec2::new(100.0, 100.0),
            Vec2::new(110.0, 105.0),
            &Pathfinder::default(),
            &mut rng,
        );
        assert!(!built.validated);
        assert!(built.terrain.obstacles().is_empty());
    }

    #[test]
    fn test_falls_back_to_open_world() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut generator = FixedLayout(WorldLayout {
            obstacles: wall(),
            ..Default::default()
        });
        let built = build_world(
            &mut generator,
            &settings(),
            Vec2::new(100.0, 500.0),
            Vec2::new(900.0, 500.0),
            &Pathfinder::default(),
            &mut rng,
        );
        assert!(!built.validated);
        assert!(built.terrain.obstacles().is_empty());
        assert_eq!(built.terrain.grid().walkable_count(), built.terrain.grid().len());
    }
}
