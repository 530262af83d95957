//! Predators: wander, hunt, shelter

use crate::flock::Follower;
use crate::steering::direction;
use crate::weather::{WeatherRules, WeatherState};
use crate::zones::Den;
use rand::Rng;
use serde::{Deserialize, Serialize};
use shepherd_math::{consts::TAU, Vec2};
use shepherd_nav::{SpatialHash, Terrain};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredatorState {
    #[default]
    Wandering,
    Hunting,
    Sheltering,
}

/// Predator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredatorTuning {
    pub base_speed: f32,
    pub radius: f32,
    /// Followers inside this radius panic
    pub fear_aura: f32,
    pub kill_radius: f32,
    pub hunting_range: f32,
    pub hunt_speed_factor: f32,
    pub hunt_accel: f32,
    pub shelter_accel: f32,
    /// Velocity multiplier applied each tick spent inside a den
    pub shelter_damping: f32,
    /// Max wander heading change per tick, radians
    pub wander_turn: f32,
    pub wander_accel: f32,
    /// Extra gap kept from obstacle edges
    pub collision_margin: f32,
    /// Spawn at least this far past any obstacle's radius
    pub spawn_clearance: f32,
    /// Spawn at least this far from the survivor
    pub spawn_survivor_distance: f32,
    /// Extra gap between predators at spawn
    pub spawn_spacing: f32,
    pub spawn_attempts: u32,
}

impl Default for PredatorTuning {
    fn default() -> Self {
        Self {
            base_speed: 4.0,
            radius: 25.0,
            fear_aura: 280.0,
            kill_radius: 40.0,
            hunting_range: 400.0,
            hunt_speed_factor: 1.3,
            hunt_accel: 0.25,
            shelter_accel: 0.5,
            shelter_damping: 0.1,
            wander_turn: 0.1,
            wander_accel: 0.1,
            collision_margin: 5.0,
            spawn_clearance: 100.0,
            spawn_survivor_distance: 800.0,
            spawn_spacing: 20.0,
            spawn_attempts: 100,
        }
    }
}

/// A predator reaching its kill radius
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strike {
    /// The survivor was caught
    Survivor,
    /// A follower was caught; the flock scatters
    Follower(usize),
}

/// What a predator can see this tick
#[derive(Debug, Clone, Copy)]
pub struct PredatorEnv<'a> {
    pub terrain: &'a Terrain,
    pub dens: &'a [Den],
    pub survivor: Vec2,
    pub survivor_alive: bool,
    pub survivor_shielded: bool,
    pub followers: &'a [Follower],
    pub follower_hash: &'a SpatialHash<usize>,
    pub flock_scattered: bool,
    pub rules: WeatherRules,
    pub weather: WeatherState,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Predator {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Wander heading in radians
    pub heading: f32,
    pub state: PredatorState,
}

impl Predator {
    pub fn new(position: Vec2, heading: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ONE,
            heading,
            state: PredatorState::Wandering,
        }
    }

    pub fn is_hunting(&self) -> bool {
        self.state == PredatorState::Hunting
    }

    /// Advance one tick. Returns a strike when a hunted target is inside
    /// the kill radius at the start of the tick.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        env: &PredatorEnv<'_>,
        tuning: &PredatorTuning,
        rng: &mut R,
    ) -> Option<Strike> {
        let mut strike = None;

        if env.rules.predators_shelter(&env.weather) {
            self.state = PredatorState::Sheltering;
            let nearest = env.dens.iter().min_by(|a, b| {
                a.position
                    .distance_squared(self.position)
                    .total_cmp(&b.position.distance_squared(self.position))
            });
            if let Some(den) = nearest {
                if den.contains(self.position) {
                    self.velocity *= tuning.shelter_damping;
                    return None;
                }
                self.velocity += direction(self.position, den.position) * tuning.shelter_accel;
            }
        } else if let Some((target, at)) = self.find_target(env, tuning) {
            self.state = PredatorState::Hunting;
            self.velocity += direction(self.position, at) * tuning.hunt_accel;
            if self.position.distance_squared(at) < tuning.kill_radius * tuning.kill_radius {
                strike = Some(target);
            }
        } else {
            self.state = PredatorState::Wandering;
            self.heading += rng.gen_range(-tuning.wander_turn..=tuning.wander_turn);
            self.velocity += Vec2::from_angle(self.heading) * tuning.wander_accel;
        }

        self.travel(env, tuning);
        strike
    }

    /// The survivor if exposed and in range, otherwise the nearest follower
    /// in range when the rules allow it
    fn find_target(&self, env: &PredatorEnv<'_>, tuning: &PredatorTuning) -> Option<(Strike, Vec2)> {
        let range_sq = tuning.hunting_range * tuning.hunting_range;
        if env.survivor_alive
            && !env.survivor_shielded
            && self.position.distance_squared(env.survivor) < range_sq
        {
            return Some((Strike::Survivor, env.survivor));
        }

        if !(env.rules.predator_targets_followers_when_shielded
            && env.survivor_shielded
            && !env.flock_scattered)
        {
            return None;
        }
        let mut best: Option<(usize, f32)> = None;
        env.follower_hash
            .for_each_nearby(self.position, tuning.hunting_range, |i| {
                let Some(f) = env.followers.get(i) else {
                    return;
                };
                let d_sq = f.position.distance_squared(self.position);
                let closer = best.map_or(true, |(bi, bd)| d_sq < bd || (d_sq == bd && i < bi));
                if d_sq < range_sq && closer {
                    best = Some((i, d_sq));
                }
            });
        best.map(|(i, _)| (Strike::Follower(i), env.followers[i].position))
    }

    /// Rescale velocity to the state's speed and move, unless the next
    /// position leaves the world or touches an obstacle
    fn travel(&mut self, env: &PredatorEnv<'_>, tuning: &PredatorTuning) {
        let factor = if self.is_hunting() {
            tuning.hunt_speed_factor
        } else {
            1.0
        };
        let speed = tuning.base_speed * factor * env.rules.predator_speed_modifier(&env.weather);
        self.velocity = self.velocity.with_length(speed);

        let extent = env.terrain.extent();
        let next = self.position + self.velocity;
        let mut hit = false;
        if next.x < 0.0 || next.x > extent {
            self.velocity.x = -self.velocity.x;
            hit = true;
        }
        if next.y < 0.0 || next.y > extent {
            self.velocity.y = -self.velocity.y;
            hit = true;
        }
        let reach = tuning.radius + tuning.collision_margin;
        if let Some(o) = env
            .terrain
            .nearby_obstacles(next)
            .find(|o| o.blocks(next, reach))
        {
            let normal = (next - o.position).angle();
            self.velocity = Vec2::from_angle(normal) * speed;
            self.heading = normal;
            hit = true;
        }
        if !hit {
            self.position = next;
        }
    }
}

/// Place `count` predators by rejection sampling. A predator whose attempts
/// run out keeps its last sample.
pub fn spawn_predators<R: Rng + ?Sized>(
    count: usize,
    terrain: &Terrain,
    survivor: Vec2,
    tuning: &PredatorTuning,
    rng: &mut R,
) -> Vec<Predator> {
    let extent = terrain.extent();
    let mut placed: Vec<Predator> = Vec::with_capacity(count);
    for n in 0..count {
        let mut position = Vec2::ZERO;
        let mut valid = false;
        for _ in 0..tuning.spawn_attempts.max(1) {
            position = Vec2::new(rng.gen_range(0.0..=extent), rng.gen_range(0.0..=extent));
            let clear_of_obstacles = terrain
                .obstacles()
                .iter()
                .all(|o| !o.blocks(position, tuning.spawn_clearance));
            let far_from_survivor = position.distance(survivor) >= tuning.spawn_survivor_distance;
            let spacing = tuning.radius * 2.0 + tuning.spawn_spacing;
            let apart = placed.iter().all(|p| p.position.distance(position) >= spacing);
            if clear_of_obstacles && far_from_survivor && apart {
                valid = true;
                break;
            }
        }
        if !valid {
            log::warn!("predator {} placed after exhausting spawn attempts", n);
        }
        placed.push(Predator::new(position, rng.gen_range(0.0..TAU)));
    }
    placed
}
