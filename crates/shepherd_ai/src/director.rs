//! AI director: composes the survivor's route and decides where to steer
//!
//! Each tick the director
//! 1. recomputes the route if it was invalidated or the replan interval
//!    elapsed,
//! 2. advances the route cursor past points the survivor has reached,
//! 3. picks a status label and runs the guiding/fetching machine,
//! 4. publishes the steering target followed by survivor and flock.

use crate::state_machine::{State, StateMachine};
use crate::steering::direction;
use crate::zones::{BonusZone, Waypoint};
use serde::{Deserialize, Serialize};
use shepherd_math::Vec2;
use shepherd_nav::{PathOutcome, Pathfinder, Route, WalkabilityGrid};

/// Whether the survivor leads at full pace or waits for the flock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlockMode {
    #[default]
    Guiding,
    Fetching,
}

impl State for FlockMode {
    fn on_enter(&self) {
        log::debug!("flock mode -> {:?}", self);
    }
}

/// Inputs to the guiding/fetching transitions
#[derive(Debug, Clone, Copy)]
pub struct ModeContext {
    pub distance_to_target: f32,
    pub fetch_threshold: f32,
    pub regroup_threshold: f32,
}

/// Status shown to the player, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusLabel {
    Dead,
    Arrived,
    Scattered,
    Hiding,
    Hunted,
    Moving,
    Waiting,
}

impl StatusLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusLabel::Dead => "DEAD",
            StatusLabel::Arrived => "ARRIVED",
            StatusLabel::Scattered => "SCATTERED!",
            StatusLabel::Hiding => "HIDING",
            StatusLabel::Hunted => "HUNTED!",
            StatusLabel::Moving => "MOVING",
            StatusLabel::Waiting => "WAITING",
        }
    }
}

/// Director configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorTuning {
    /// A route point this close to the survivor counts as reached
    pub arrival_radius: f32,
    /// Guiding -> fetching when the target is farther than this
    /// (scaled by the global speed multiplier)
    pub fetch_threshold: f32,
    /// Fetching -> guiding when the target is closer than this
    pub regroup_threshold: f32,
    /// How far ahead the shortened target sits while fetching
    pub fetch_step: f32,
    /// Ticks between scheduled route recomputes
    pub replan_interval: u32,
    /// Pass-through distance past a speed zone, in zone radii
    pub pass_through_factor: f32,
}

impl Default for DirectorTuning {
    fn default() -> Self {
        Self {
            arrival_radius: 70.0,
            fetch_threshold: 600.0,
            regroup_threshold: 250.0,
            fetch_step: 180.0,
            replan_interval: 60,
            pass_through_factor: 1.5,
        }
    }
}

/// A point the route must visit before the goal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Objective {
    pub position: Vec2,
    pub radius: f32,
    /// Append a point past the objective so the route crosses it
    pub pass_through: bool,
}

impl Objective {
    pub fn from_zone(zone: &BonusZone) -> Self {
        Self {
            position: zone.position,
            radius: zone.radius,
            pass_through: true,
        }
    }

    pub fn from_waypoint(waypoint: &Waypoint) -> Self {
        Self {
            position: waypoint.position,
            radius: waypoint.radius,
            pass_through: false,
        }
    }
}

/// What the director needs to know about the world this tick
#[derive(Debug, Clone, Copy)]
pub struct DirectorView {
    pub survivor: Vec2,
    pub goal: Vec2,
    pub extent: f32,
    pub speed_multiplier: f32,
    /// A hunting predator is within chase range
    pub chased: bool,
    pub scattered: bool,
    /// The survivor is inside a shelter zone
    pub shielded: bool,
}

/// A composed route and how its legs went
#[derive(Debug, Clone, Default)]
pub struct Composition {
    pub route: Route,
    /// Some leg hit the expansion cap
    pub exhausted: bool,
    /// Some leg had no path at all
    pub unreachable: bool,
}

/// Chain pathfinder legs from `start` through `objectives` (nearest to
/// `start` first) and on to `goal`. Legs without a path are skipped; the
/// next leg starts from the last objective actually reached.
pub fn compose_route(
    pathfinder: &Pathfinder,
    grid: &WalkabilityGrid,
    start: Vec2,
    goal: Vec2,
    objectives: &[Objective],
    extent: f32,
    pass_through_factor: f32,
) -> Composition {
    let mut ordered = objectives.to_vec();
    ordered.sort_by(|a, b| {
        a.position
            .distance_squared(start)
            .total_cmp(&b.position.distance_squared(start))
    });

    let mut out = Composition::default();
    let mut from = start;
    for objective in &ordered {
        if !leg(pathfinder, grid, from, objective.position, &mut out) {
            continue;
        }
        if objective.pass_through {
            let heading = direction(from, objective.position);
            if heading != Vec2::ZERO {
                let beyond = objective.position + heading * objective.radius * pass_through_factor;
                out.route.push(beyond.clamp_to_square(extent));
            }
        }
        from = objective.position;
    }
    leg(pathfinder, grid, from, goal, &mut out);
    out
}

fn leg(
    pathfinder: &Pathfinder,
    grid: &WalkabilityGrid,
    from: Vec2,
    to: Vec2,
    out: &mut Composition,
) -> bool {
    match pathfinder.find_path(grid, from, to) {
        PathOutcome::Found(points) => {
            out.route.append_segment(&points);
            true
        }
        PathOutcome::Exhausted => {
            out.exhausted = true;
            false
        }
        PathOutcome::Unreachable => {
            out.unreachable = true;
            false
        }
    }
}

/// Owns the route and the flock mode
#[derive(Debug)]
pub struct Director {
    tuning: DirectorTuning,
    route: Route,
    mode: StateMachine<FlockMode, ModeContext>,
    status: StatusLabel,
    target: Vec2,
    ticks_since_plan: u32,
    /// Replan on the next update regardless of the interval
    pending: bool,
    plans: u64,
}

impl Director {
    pub fn new(tuning: DirectorTuning) -> Self {
        let mut mode = StateMachine::new(FlockMode::Guiding);
        mode.add_transition(FlockMode::Guiding, FlockMode::Fetching, |c: &ModeContext| {
            c.distance_to_target > c.fetch_threshold
        });
        mode.add_transition(FlockMode::Fetching, FlockMode::Guiding, |c: &ModeContext| {
            c.distance_to_target < c.regroup_threshold
        });
        Self {
            tuning,
            route: Route::new(),
            mode,
            status: StatusLabel::Moving,
            target: Vec2::ZERO,
            ticks_since_plan: 0,
            pending: true,
            plans: 0,
        }
    }

    pub fn tuning(&self) -> &DirectorTuning {
        &self.tuning
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn mode(&self) -> FlockMode {
        self.mode.current()
    }

    pub fn status(&self) -> StatusLabel {
        self.status
    }

    /// Steering target published by the last update
    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// Number of route recomputes so far
    pub fn plans(&self) -> u64 {
        self.plans
    }

    /// Drop the route and recompute on the next update
    pub fn invalidate(&mut self) {
        self.route.clear();
        self.pending = true;
    }

    /// Pin a terminal label once the session has ended
    pub fn finish(&mut self, status: StatusLabel) {
        self.status = status;
    }

    fn replan_due(&self) -> bool {
        self.pending || self.ticks_since_plan >= self.tuning.replan_interval
    }

    /// Run one tick and return the steering target
    pub fn update(
        &mut self,
        pathfinder: &Pathfinder,
        grid: &WalkabilityGrid,
        view: &DirectorView,
        objectives: &[Objective],
    ) -> Vec2 {
        self.ticks_since_plan = self.ticks_since_plan.saturating_add(1);
        if self.replan_due() {
            self.plan(pathfinder, grid, view, objectives);
        }

        self.route
            .advance_within(view.survivor, self.tuning.arrival_radius);
        let path_point = self.route.current().unwrap_or(view.goal);

        self.status = if view.scattered {
            StatusLabel::Scattered
        } else if view.shielded {
            StatusLabel::Hiding
        } else if view.chased {
            StatusLabel::Hunted
        } else {
            self.mode.update(&ModeContext {
                distance_to_target: path_point.distance(view.survivor),
                fetch_threshold: self.tuning.fetch_threshold * view.speed_multiplier,
                regroup_threshold: self.tuning.regroup_threshold,
            });
            match self.mode() {
                FlockMode::Guiding => StatusLabel::Moving,
                FlockMode::Fetching => StatusLabel::Waiting,
            }
        };

        self.target = match self.mode() {
            FlockMode::Fetching => {
                view.survivor + direction(view.survivor, path_point) * self.tuning.fetch_step
            }
            FlockMode::Guiding => path_point,
        };
        self.target
    }

    fn plan(
        &mut self,
        pathfinder: &Pathfinder,
        grid: &WalkabilityGrid,
        view: &DirectorView,
        objectives: &[Objective],
    ) {
        let composition = compose_route(
            pathfinder,
            grid,
            view.survivor,
            view.goal,
            objectives,
            view.extent,
            self.tuning.pass_through_factor,
        );
        self.plans += 1;
        self.ticks_since_plan = 0;
        // An exhausted search may succeed next tick; a structural failure
        // waits for the schedule.
        self.pending = composition.route.is_empty() && composition.exhausted;

        log::debug!(
            "route recomputed: {} points via {} objectives (exhausted: {}, unreachable: {})",
            composition.route.len(),
            objectives.len(),
            composition.exhausted,
            composition.unreachable,
        );
        if !composition.route.is_empty() {
            self.route = composition.route;
        }
    }

    /// Remove the first waypoint the survivor stands in, invalidating the
    /// route when one is consumed
    pub fn consume_waypoint(
        &mut self,
        waypoints: &mut Vec<Waypoint>,
        survivor: Vec2,
    ) -> Option<Waypoint> {
        let index = waypoints.iter().position(|w| w.contains(survivor))?;
        let reached = waypoints.remove(index);
        log::info!(
            "waypoint reached at ({:.0}, {:.0})",
            reached.position.x,
            reached.position.y
        );
        self.invalidate();
        Some(reached)
    }
}
