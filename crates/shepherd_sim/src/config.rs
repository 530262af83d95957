//! Session configuration
//!
//! Everything a session is built from: world geometry, the fixed layout,
//! difficulty rules and per-agent tuning. Loaded from TOML; every field has
//! a default so a file only needs the values it changes.
//!
//! # Example Config File
//!
//! ```toml
//! seed = 7
//! predator_count = 15
//! initial_flock = 400
//!
//! [rules]
//! predator_avoids_adverse_weather = false
//! predator_targets_followers_when_shielded = true
//!
//! [[obstacles]]
//! position = { x = 1000.0, y = 1000.0 }
//! radius = 80.0
//! kind = "pine"
//!
//! [[zones]]
//! position = { x = 2200.0, y = 1800.0 }
//! radius = 75.0
//! kind = "speed"
//! ```

use crate::error::{Result, SimError};
use crate::layout::WorldLayout;
use serde::{Deserialize, Serialize};
use shepherd_ai::{
    BonusZone, Den, DirectorTuning, FlockTuning, PredatorTuning, SurvivorTuning, Weather,
    WeatherRules,
};
use shepherd_math::Vec2;
use shepherd_nav::{NavSettings, Obstacle};
use std::path::Path;

/// Named difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn config(self) -> SessionConfig {
        match self {
            Difficulty::Easy => SessionConfig::easy(),
            Difficulty::Medium => SessionConfig::medium(),
            Difficulty::Hard => SessionConfig::hard(),
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Medium => write!(f, "medium"),
            Self::Hard => write!(f, "hard"),
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" | "normal" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(format!("Unknown difficulty: {}", s)),
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// World extent, nav grid and obstacle hash settings
    pub nav: NavSettings,
    /// Follower hash cell size
    pub flock_cell_size: f32,

    pub survivor_spawn: Vec2,
    pub goal: Vec2,
    pub goal_radius: f32,

    pub predator_count: usize,
    pub rules: WeatherRules,
    /// Weather at session start
    pub weather: Weather,
    /// Free-roaming followers scattered over the world at start
    pub initial_flock: usize,
    pub seed: u64,
    /// Target tick rate for the runtime loop
    pub frame_rate: f32,

    /// Pathfinder expansion cap
    pub max_expansions: usize,
    /// Ring radius searched for a walkable substitute goal
    pub goal_search_radius: i32,

    /// Global speed multiplier at start
    pub speed_multiplier: f32,
    /// Added to the global speed multiplier per speed zone used
    pub speed_zone_bonus: f32,
    /// Recruited followers spawned by a speed zone
    pub speed_zone_followers: usize,
    /// Recalled followers land this far from the survivor, at least
    pub recall_min_distance: f32,
    /// Recalled followers land this far from the survivor, at most
    pub recall_max_distance: f32,

    pub obstacles: Vec<Obstacle>,
    pub zones: Vec<BonusZone>,
    /// Predator shelters
    pub dens: Vec<Den>,

    pub flock: FlockTuning,
    pub predator: PredatorTuning,
    pub survivor: SurvivorTuning,
    pub director: DirectorTuning,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let nav = NavSettings::default();
        let extent = nav.extent;
        Self {
            nav,
            flock_cell_size: 100.0,
            survivor_spawn: Vec2::new(300.0, 300.0),
            goal: Vec2::new(extent - 400.0, extent - 400.0),
            goal_radius: 150.0,
            predator_count: 10,
            rules: WeatherRules {
                predator_avoids_adverse_weather: true,
                predator_targets_followers_when_shielded: false,
            },
            weather: Weather::Sunny,
            initial_flock: 800,
            seed: 0,
            frame_rate: 30.0,
            max_expansions: 8000,
            goal_search_radius: 14,
            speed_multiplier: 1.0,
            speed_zone_bonus: 0.2,
            speed_zone_followers: 50,
            recall_min_distance: 100.0,
            recall_max_distance: 300.0,
            obstacles: Vec::new(),
            zones: Vec::new(),
            dens: Vec::new(),
            flock: FlockTuning::default(),
            predator: PredatorTuning::default(),
            survivor: SurvivorTuning::default(),
            director: DirectorTuning::default(),
        }
    }
}

impl SessionConfig {
    /// Few predators that fear the rain
    pub fn easy() -> Self {
        Self {
            predator_count: 5,
            ..Default::default()
        }
    }

    pub fn medium() -> Self {
        Self::default()
    }

    /// Many predators that ignore weather and go after the flock
    pub fn hard() -> Self {
        Self {
            predator_count: 15,
            rules: WeatherRules {
                predator_avoids_adverse_weather: false,
                predator_targets_followers_when_shielded: true,
            },
            ..Default::default()
        }
    }

    /// Load and validate a configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded session config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a configuration
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f32) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SimError::InvalidConfig(format!("{} must be positive, got {}", name, value)))
            }
        }

        positive("nav.extent", self.nav.extent)?;
        positive("nav.cell_size", self.nav.cell_size)?;
        positive("nav.obstacle_cell_size", self.nav.obstacle_cell_size)?;
        positive("flock_cell_size", self.flock_cell_size)?;
        positive("goal_radius", self.goal_radius)?;
        positive("frame_rate", self.frame_rate)?;
        positive("speed_multiplier", self.speed_multiplier)?;

        let extent = self.nav.extent;
        for (name, p) in [("survivor_spawn", self.survivor_spawn), ("goal", self.goal)] {
            if !(0.0..=extent).contains(&p.x) || !(0.0..=extent).contains(&p.y) {
                return Err(SimError::InvalidConfig(format!(
                    "{} ({}, {}) lies outside the {} world",
                    name, p.x, p.y, extent
                )));
            }
        }
        if self.max_expansions == 0 {
            return Err(SimError::InvalidConfig("max_expansions must be at least 1".into()));
        }
        if self.director.replan_interval == 0 {
            return Err(SimError::InvalidConfig(
                "director.replan_interval must be at least 1".into(),
            ));
        }
        if self.recall_min_distance > self.recall_max_distance {
            return Err(SimError::InvalidConfig(format!(
                "recall distance range {}..{} is empty",
                self.recall_min_distance, self.recall_max_distance
            )));
        }
        if let Some(o) = self.obstacles.iter().find(|o| !(o.radius > 0.0)) {
            return Err(SimError::InvalidConfig(format!(
                "obstacle at ({}, {}) has radius {}",
                o.position.x, o.position.y, o.radius
            )));
        }
        Ok(())
    }

    /// The fixed layout described by this configuration
    pub fn layout(&self) -> WorldLayout {
        WorldLayout {
            obstacles: self.obstacles.clone(),
            zones: self.zones.clone(),
            dens: self.dens.clone(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_extent(mut self, extent: f32) -> Self {
        self.nav.extent = extent;
        self
    }

    pub fn with_predator_count(mut self, count: usize) -> Self {
        self.predator_count = count;
        self
    }

    pub fn with_rules(mut self, rules: WeatherRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_weather(mut self, weather: Weather) -> Self {
        self.weather = weather;
        self
    }

    pub fn with_initial_flock(mut self, count: usize) -> Self {
        self.initial_flock = count;
        self
    }

    pub fn with_spawn(mut self, spawn: Vec2) -> Self {
        self.survivor_spawn = spawn;
        self
    }

    pub fn with_goal(mut self, goal: Vec2, radius: f32) -> Self {
        self.goal = goal;
        self.goal_radius = radius;
        self
    }

    pub fn with_obstacles(mut self, obstacles: Vec<Obstacle>) -> Self {
        self.obstacles = obstacles;
        self
    }

    pub fn with_zones(mut self, zones: Vec<BonusZone>) -> Self {
        self.zones = zones;
        self
    }

    pub fn with_dens(mut self, dens: Vec<Den>) -> Self {
        self.dens = dens;
        self
    }
}
