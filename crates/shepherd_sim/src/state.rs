//! Session state and the tick pipeline

use crate::config::SessionConfig;
use crate::error::{Result, SimError};
use crate::events::{LossReason, Outcome, SimEvent};
use crate::layout::{build_world, FixedLayout, WorldGenerator};
use crate::snapshot::Snapshot;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use shepherd_ai::{
    nearest_hunter, spawn_predators, step_flock, Agent, BonusZone, Den, Director, DirectorView,
    FlockEnv, Follower, Objective, Predator, PredatorEnv, StatusLabel, Strike, Survivor, SurvivorEnv,
    Threat, Waypoint, Weather, WeatherState,
};
use shepherd_math::{consts::TAU, Vec2};
use shepherd_nav::{Pathfinder, Route, SpatialHash, Terrain};

/// External inputs for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickInput {
    /// Recruitment pulse is held
    pub luring: bool,
    /// Break up the flock
    pub scatter: bool,
    /// Regroup a scattered flock around the survivor
    pub recall: bool,
}

impl TickInput {
    pub fn luring() -> Self {
        Self {
            luring: true,
            ..Default::default()
        }
    }
}

/// One owned session. Every tick runs the same fixed order; nothing else
/// mutates agents between ticks except the explicit input methods.
#[derive(Debug)]
pub struct SimulationState {
    config: SessionConfig,
    terrain: Terrain,
    pathfinder: Pathfinder,
    rng: StdRng,
    tick: u64,

    survivor: Survivor,
    followers: Vec<Follower>,
    predators: Vec<Predator>,
    zones: Vec<BonusZone>,
    dens: Vec<Den>,
    waypoints: Vec<Waypoint>,
    follower_hash: SpatialHash<usize>,

    director: Director,
    weather: WeatherState,
    speed_multiplier: f32,
    scattered: bool,
    outcome: Option<Outcome>,
}

impl SimulationState {
    /// Build a session on the layout given in the configuration
    pub fn new(config: SessionConfig) -> Result<Self> {
        let mut generator = FixedLayout(config.layout());
        Self::with_generator(config, &mut generator)
    }

    /// Build a session on the first connected layout `generator` produces
    pub fn with_generator(config: SessionConfig, generator: &mut dyn WorldGenerator) -> Result<Self> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let pathfinder = Pathfinder {
            max_expansions: config.max_expansions,
            goal_search_radius: config.goal_search_radius,
        };

        let built = build_world(
            generator,
            &config.nav,
            config.survivor_spawn,
            config.goal,
            &pathfinder,
            &mut rng,
        );
        let terrain = built.terrain;
        let extent = terrain.extent();

        let followers: Vec<Follower> = (0..config.initial_flock)
            .map(|_| Follower::roaming(extent, &mut rng))
            .collect();
        let predators = spawn_predators(
            config.predator_count,
            &terrain,
            config.survivor_spawn,
            &config.predator,
            &mut rng,
        );
        let weather = WeatherState::new(config.weather, &mut rng);

        log::info!(
            "Session started: seed {}, {} obstacles, {} zones, {} predators, {} followers, {:?} weather",
            config.seed,
            terrain.obstacles().len(),
            built.layout.zones.len(),
            predators.len(),
            followers.len(),
            weather.weather
        );

        Ok(Self {
            survivor: Survivor::new(config.survivor_spawn),
            follower_hash: SpatialHash::new(config.flock_cell_size),
            director: Director::new(config.director.clone()),
            speed_multiplier: config.speed_multiplier,
            zones: built.layout.zones,
            dens: built.layout.dens,
            waypoints: Vec::new(),
            scattered: false,
            outcome: None,
            tick: 0,
            followers,
            predators,
            weather,
            terrain,
            pathfinder,
            rng,
            config,
        })
    }

    /// Advance the session by one tick.
    ///
    /// Order: inputs, follower hash, director, predators, survivor, flock.
    /// A kill or an arrival ends the tick at once.
    pub fn tick(&mut self, input: &TickInput) -> Result<Vec<SimEvent>> {
        if self.outcome.is_some() {
            return Err(SimError::SessionEnded);
        }
        self.tick += 1;
        let mut events = Vec::new();

        if input.scatter && self.scatter() {
            events.push(SimEvent::FlockScattered);
        }
        if input.recall && self.scattered {
            let recruited = self.recall();
            events.push(SimEvent::FlockRecalled { recruited });
        }

        self.follower_hash.rebuild(
            self.followers
                .iter()
                .enumerate()
                .map(|(i, f)| (f.position, i)),
        );

        let target = self.update_director();
        if self
            .director
            .consume_waypoint(&mut self.waypoints, self.survivor.position)
            .is_some()
        {
            events.push(SimEvent::WaypointReached);
        }

        let (caught, follower_hit) = self.step_predators();
        if caught {
            self.survivor.kill();
            self.end(Outcome::Lost(LossReason::CaughtByPredator));
            events.push(SimEvent::Lost {
                reason: LossReason::CaughtByPredator,
            });
            return Ok(events);
        }
        if follower_hit && self.scatter() {
            events.push(SimEvent::FlockScattered);
        }

        let env = SurvivorEnv {
            terrain: &self.terrain,
            predators: &self.predators,
            followers: &self.followers,
            follower_hash: &self.follower_hash,
            target,
            goal: self.config.goal,
            goal_radius: self.config.goal_radius,
            speed_multiplier: self.speed_multiplier,
            weather: self.weather,
            scattered: self.scattered,
        };
        let report = self
            .survivor
            .step(&env, &mut self.zones, &self.config.survivor, &mut self.rng);

        for index in report.activated {
            self.activate_speed_zone(index);
            events.push(SimEvent::ZoneActivated { index });
        }
        if let Some(index) = report.left_shelter {
            events.push(SimEvent::ShelterLeft { index });
        }
        if let Some(index) = report.entered_shelter {
            events.push(SimEvent::ShelterEntered { index });
        }
        if report.reached_goal {
            self.end(Outcome::Won);
            events.push(SimEvent::Won);
            return Ok(events);
        }

        if !self.scattered {
            self.step_followers(input.luring, target);
        }

        Ok(events)
    }

    fn update_director(&mut self) -> Vec2 {
        let objectives: Vec<Objective> = self
            .zones
            .iter()
            .filter(|z| z.is_open_speed_zone())
            .map(Objective::from_zone)
            .chain(self.waypoints.iter().map(Objective::from_waypoint))
            .collect();
        // Measured now, before predators move this tick
        let survivor = self.survivor.position;
        let chased = nearest_hunter(survivor, &self.predators)
            .is_some_and(|p| p.distance(survivor) < self.config.survivor.chased_radius);
        let view = DirectorView {
            survivor: self.survivor.position,
            goal: self.config.goal,
            extent: self.terrain.extent(),
            speed_multiplier: self.speed_multiplier,
            chased,
            scattered: self.scattered,
            shielded: self.survivor.invincible,
        };
        self.director
            .update(&self.pathfinder, self.terrain.grid(), &view, &objectives)
    }

    /// Returns (survivor caught, a follower caught)
    fn step_predators(&mut self) -> (bool, bool) {
        let env = PredatorEnv {
            terrain: &self.terrain,
            dens: &self.dens,
            survivor: self.survivor.position,
            survivor_alive: self.survivor.alive,
            survivor_shielded: self.survivor.invincible,
            followers: &self.followers,
            follower_hash: &self.follower_hash,
            flock_scattered: self.scattered,
            rules: self.config.rules,
            weather: self.weather,
        };

        let mut follower_hit = false;
        for predator in &mut self.predators {
            match predator.step(&env, &self.config.predator, &mut self.rng) {
                Some(Strike::Survivor) => return (true, follower_hit),
                Some(Strike::Follower(index)) => {
                    log::debug!("predator caught follower {}", index);
                    follower_hit = true;
                }
                None => {}
            }
        }
        (false, follower_hit)
    }

    fn step_followers(&mut self, luring: bool, target: Vec2) {
        let threats: Vec<Threat> = if self.fear_active() {
            self.predators
                .iter()
                .map(|p| Threat {
                    position: p.position,
                    aura: self.config.predator.fear_aura,
                })
                .collect()
        } else {
            Vec::new()
        };
        let env = FlockEnv {
            terrain: &self.terrain,
            neighbors: &self.follower_hash,
            threats: &threats,
            target,
            mode: self.director.mode(),
            survivor: self.survivor.position,
            luring,
            boosted: self.survivor.is_boosted(),
            speed_multiplier: self.speed_multiplier,
            weather: self.weather,
        };
        step_flock(&mut self.followers, &env, &self.config.flock, &mut self.rng);
    }

    /// Followers only fear predators that are allowed to hunt them
    fn fear_active(&self) -> bool {
        self.config.rules.predator_targets_followers_when_shielded && self.survivor.invincible
    }

    fn activate_speed_zone(&mut self, index: usize) {
        let Some(zone) = self.zones.get(index) else {
            return;
        };
        let at = zone.position;
        self.speed_multiplier += self.config.speed_zone_bonus;
        for _ in 0..self.config.speed_zone_followers {
            let follower = Follower::spawn(at, true, &mut self.rng);
            self.followers.push(follower);
        }
        self.director.invalidate();
        log::info!(
            "Speed zone {} used at ({:.0}, {:.0}); speed multiplier now {:.1}",
            index,
            at.x,
            at.y,
            self.speed_multiplier
        );
    }

    fn end(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
        self.director.finish(match outcome {
            Outcome::Won => StatusLabel::Arrived,
            Outcome::Lost(_) => StatusLabel::Dead,
        });
        log::info!("Session ended on tick {}: {:?}", self.tick, outcome);
    }

    /// Freeze the flock and stop predators targeting it. Returns false if
    /// it was already scattered.
    pub fn scatter(&mut self) -> bool {
        if self.scattered {
            return false;
        }
        self.scattered = true;
        log::info!("Flock scattered ({} recruited)", self.recruited_count());
        true
    }

    /// Lift a scatter. Recruited followers are regrouped 100 to 300 units
    /// around the survivor; free-roaming ones stay where they are. Returns
    /// the number of recruited followers.
    pub fn recall(&mut self) -> usize {
        let recruited = self.recruited_count();
        if !self.scattered {
            return recruited;
        }
        self.scattered = false;

        let center = self.survivor.position;
        let (min, max) = (
            self.config.recall_min_distance,
            self.config.recall_max_distance,
        );
        for follower in self.followers.iter_mut().filter(|f| f.recruited) {
            let angle = self.rng.gen_range(0.0..TAU);
            let distance = self.rng.gen_range(min..=max);
            let position = self
                .terrain
                .clamp_to_world(center + Vec2::from_angle(angle) * distance);
            *follower = Follower::spawn(position, true, &mut self.rng);
        }
        log::info!("Flock recalled: {} recruited followers", recruited);
        recruited
    }

    /// Change the weather; a new wind direction is drawn
    pub fn set_weather(&mut self, weather: Weather) {
        self.weather = WeatherState::new(weather, &mut self.rng);
        log::info!("Weather set to {}", weather.as_str());
    }

    pub fn set_speed_multiplier(&mut self, multiplier: f32) {
        self.speed_multiplier = multiplier.max(0.0);
    }

    /// Add a waypoint the route must visit before the goal
    pub fn add_waypoint(&mut self, position: Vec2) {
        let position = self.terrain.clamp_to_world(position);
        self.waypoints.push(Waypoint::new(position));
        self.director.invalidate();
    }

    /// Remove the first waypoint containing `position`
    pub fn remove_waypoint_at(&mut self, position: Vec2) -> Option<Waypoint> {
        let index = self.waypoints.iter().position(|w| w.contains(position))?;
        self.director.invalidate();
        Some(self.waypoints.remove(index))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn pathfinder(&self) -> &Pathfinder {
        &self.pathfinder
    }

    /// Ticks run so far
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn survivor(&self) -> &Survivor {
        &self.survivor
    }

    pub fn followers(&self) -> &[Follower] {
        &self.followers
    }

    pub fn predators(&self) -> &[Predator] {
        &self.predators
    }

    pub fn zones(&self) -> &[BonusZone] {
        &self.zones
    }

    pub fn dens(&self) -> &[Den] {
        &self.dens
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn director(&self) -> &Director {
        &self.director
    }

    pub fn route(&self) -> &Route {
        self.director.route()
    }

    pub fn status(&self) -> StatusLabel {
        self.director.status()
    }

    pub fn weather(&self) -> WeatherState {
        self.weather
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    pub fn is_scattered(&self) -> bool {
        self.scattered
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn recruited_count(&self) -> usize {
        self.followers.iter().filter(|f| f.recruited).count()
    }

    /// Survivor first, then followers, then predators
    pub fn agents(&self) -> impl Iterator<Item = Agent<'_>> + '_ {
        std::iter::once(Agent::Survivor(&self.survivor))
            .chain(self.followers.iter().map(Agent::Follower))
            .chain(self.predators.iter().map(Agent::Predator))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    /// Test hook: place agents directly
    #[doc(hidden)]
    pub fn agents_mut(&mut self) -> (&mut Survivor, &mut Vec<Follower>, &mut Vec<Predator>) {
        (&mut self.survivor, &mut self.followers, &mut self.predators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shepherd_ai::{AgentKind, PredatorState, ZoneKind};

    fn quiet() -> SessionConfig {
        SessionConfig::default()
            .with_predator_count(0)
            .with_initial_flock(0)
            .with_seed(3)
    }

    #[test]
    fn test_new_session() {
        let sim = SimulationState::new(SessionConfig::medium().with_seed(1)).unwrap();
        assert_eq!(sim.followers().len(), 800);
        assert_eq!(sim.predators().len(), 10);
        assert_eq!(sim.recruited_count(), 0);
        assert_eq!(sim.survivor().position, Vec2::new(300.0, 300.0));
        assert!(sim.outcome().is_none());
        assert_eq!(sim.agents().count(), 811);
        assert_eq!(sim.agents().next().map(|a| a.kind()), Some(AgentKind::Survivor));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SessionConfig::default().with_goal(Vec2::new(-5.0, 0.0), 150.0);
        assert!(matches!(
            SimulationState::new(config),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_first_tick_plans_route() {
        let mut sim = SimulationState::new(quiet()).unwrap();
        sim.tick(&TickInput::default()).unwrap();
        assert_eq!(sim.director().plans(), 1);
        assert!(!sim.route().is_empty());
        assert_eq!(sim.route().destination(), Some(Vec2::new(4600.0, 4600.0)));
        assert_eq!(sim.status(), StatusLabel::Moving);
        assert_eq!(sim.tick_count(), 1);
    }

    #[test]
    fn test_speed_zone_activation() {
        let zone = BonusZone::speed(Vec2::new(300.0, 300.0));
        let mut sim = SimulationState::new(quiet().with_zones(vec![zone])).unwrap();

        let events = sim.tick(&TickInput::default()).unwrap();
        assert!(events.contains(&SimEvent::ZoneActivated { index: 0 }));
        assert!(!sim.zones()[0].active);
        assert_eq!(sim.followers().len(), 50);
        assert_eq!(sim.recruited_count(), 50);
        assert!((sim.speed_multiplier() - 1.2).abs() < 1e-6);
        assert!(sim.survivor().is_boosted());
        assert!(sim.followers().iter().all(|f| f.position.x >= 0.0));
    }

    #[test]
    fn test_shelter_events() {
        let zone = BonusZone::shelter(Vec2::new(300.0, 300.0));
        assert_eq!(zone.kind, ZoneKind::Shelter);
        let mut sim = SimulationState::new(quiet().with_zones(vec![zone])).unwrap();

        let events = sim.tick(&TickInput::default()).unwrap();
        assert!(events.contains(&SimEvent::ShelterEntered { index: 0 }));
        assert!(sim.survivor().invincible);

        sim.tick(&TickInput::default()).unwrap();
        assert_eq!(sim.status(), StatusLabel::Hiding);
        assert!(sim.zones()[0].active);
    }

    #[test]
    fn test_scatter_freezes_flock_and_recall_regroups() {
        let zone = BonusZone::speed(Vec2::new(300.0, 300.0));
        let mut sim = SimulationState::new(
            quiet().with_zones(vec![zone]).with_initial_flock(20),
        )
        .unwrap();
        sim.tick(&TickInput::default()).unwrap();
        let total = sim.followers().len();
        let recruited = sim.recruited_count();

        let events = sim
            .tick(&TickInput {
                scatter: true,
                ..Default::default()
            })
            .unwrap();
        assert!(events.contains(&SimEvent::FlockScattered));
        let frozen = sim.followers().to_vec();
        sim.tick(&TickInput::default()).unwrap();
        assert_eq!(sim.followers(), frozen.as_slice());
        assert_eq!(sim.status(), StatusLabel::Scattered);

        let events = sim
            .tick(&TickInput {
                recall: true,
                ..Default::default()
            })
            .unwrap();
        assert!(events.contains(&SimEvent::FlockRecalled { recruited }));
        assert!(!sim.is_scattered());
        assert_eq!(sim.followers().len(), total);
        assert_eq!(sim.recruited_count(), recruited);
    }

    #[test]
    fn test_recall_places_around_survivor() {
        let mut sim = SimulationState::new(quiet()).unwrap();
        {
            let (_, followers, _) = sim.agents_mut();
            followers.push(Follower {
                position: Vec2::new(4000.0, 4000.0),
                velocity: Vec2::ZERO,
                recruited: true,
                panicked: false,
            });
            followers.push(Follower {
                position: Vec2::new(2000.0, 2000.0),
                velocity: Vec2::ZERO,
                recruited: false,
                panicked: false,
            });
        }
        assert!(sim.scatter());
        assert!(!sim.scatter());
        assert_eq!(sim.recall(), 1);

        let survivor = sim.survivor().position;
        let d = sim.followers()[0].position.distance(survivor);
        assert!((100.0 - 1e-3..=300.0 + 1e-3).contains(&d));
        assert_eq!(sim.followers()[1].position, Vec2::new(2000.0, 2000.0));
    }

    #[test]
    fn test_hunted_label_on_first_tick() {
        let mut sim = SimulationState::new(quiet()).unwrap();
        {
            let (survivor, _, predators) = sim.agents_mut();
            let mut wolf = Predator::new(survivor.position + Vec2::new(450.0, 0.0), 0.0);
            wolf.state = PredatorState::Hunting;
            predators.push(wolf);
        }
        assert!(!sim.survivor().chased);

        sim.tick(&TickInput::default()).unwrap();
        assert_eq!(sim.status(), StatusLabel::Hunted);
    }

    #[test]
    fn test_predator_kill_ends_session() {
        let mut sim = SimulationState::new(quiet()).unwrap();
        {
            let (survivor, _, predators) = sim.agents_mut();
            let at = survivor.position + Vec2::new(39.0, 0.0);
            predators.push(Predator::new(at, 0.0));
        }
        let events = sim.tick(&TickInput::default()).unwrap();
        assert!(events.contains(&SimEvent::Lost {
            reason: LossReason::CaughtByPredator
        }));
        assert_eq!(sim.outcome(), Some(Outcome::Lost(LossReason::CaughtByPredator)));
        assert!(!sim.survivor().alive);
        assert_eq!(sim.status(), StatusLabel::Dead);
        assert_eq!(sim.predators()[0].state, PredatorState::Hunting);
        assert!(matches!(
            sim.tick(&TickInput::default()),
            Err(SimError::SessionEnded)
        ));
    }

    #[test]
    fn test_reaching_goal_wins() {
        let config = quiet().with_goal(Vec2::new(400.0, 300.0), 150.0);
        let mut sim = SimulationState::new(config).unwrap();
        let events = sim.tick(&TickInput::default()).unwrap();
        assert_eq!(events.last(), Some(&SimEvent::Won));
        assert_eq!(sim.status(), StatusLabel::Arrived);
        assert!(sim.outcome().is_some_and(|o| o.is_win()));
    }

    #[test]
    fn test_waypoint_editing_invalidates_route() {
        let mut sim = SimulationState::new(quiet()).unwrap();
        sim.tick(&TickInput::default()).unwrap();
        assert_eq!(sim.director().plans(), 1);

        sim.add_waypoint(Vec2::new(2000.0, 600.0));
        sim.tick(&TickInput::default()).unwrap();
        assert_eq!(sim.director().plans(), 2);
        assert!(sim
            .route()
            .points()
            .iter()
            .any(|p| p.distance(Vec2::new(2000.0, 600.0)) < 75.0));

        assert!(sim.remove_waypoint_at(Vec2::new(2010.0, 600.0)).is_some());
        assert!(sim.remove_waypoint_at(Vec2::new(2010.0, 600.0)).is_none());
        sim.tick(&TickInput::default()).unwrap();
        assert_eq!(sim.director().plans(), 3);
    }

    #[test]
    fn test_waypoint_reached() {
        let mut sim = SimulationState::new(quiet()).unwrap();
        sim.add_waypoint(Vec2::new(310.0, 300.0));
        let events = sim.tick(&TickInput::default()).unwrap();
        assert!(events.contains(&SimEvent::WaypointReached));
        assert!(sim.waypoints().is_empty());
    }

    #[test]
    fn test_weather_and_snapshot() {
        let mut sim = SimulationState::new(quiet()).unwrap();
        sim.set_weather(Weather::Storm);
        assert!(sim.weather().is_adverse());
        assert!((sim.weather().wind.length() - 0.18).abs() < 1e-4);

        sim.tick(&TickInput::default()).unwrap();
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.weather, Weather::Storm);
        assert_eq!(snapshot.status, "MOVING");
        assert!(!snapshot.route.is_empty());

        let json = snapshot.to_json().unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tick, snapshot.tick);
        assert_eq!(back.route.len(), snapshot.route.len());
    }
}
