//! Flocking followers
//!
//! Every follower is advanced from the same previous-tick snapshot, so the
//! result does not depend on iteration order.

use crate::director::FlockMode;
use crate::steering::{self, SteeringOutput};
use crate::weather::WeatherState;
use rand::Rng;
use serde::{Deserialize, Serialize};
use shepherd_math::{consts::TAU, Vec2};
use shepherd_nav::{SpatialHash, Terrain};

/// Separation / alignment / cohesion weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockWeights {
    pub separation: f32,
    pub alignment: f32,
    pub cohesion: f32,
}

impl Default for FlockWeights {
    fn default() -> Self {
        Self {
            separation: 1.5,
            alignment: 1.0,
            cohesion: 1.0,
        }
    }
}

/// Follower configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockTuning {
    pub weights: FlockWeights,
    pub max_speed: f32,
    /// Cap on the seek correction
    pub max_force: f32,
    /// Seek speed ramps down inside this radius of the target
    pub slow_radius: f32,
    pub neighbor_radius: f32,
    pub separation_radius: f32,
    pub alignment_damping: f32,
    pub cohesion_step: f32,
    /// Obstacle push starts at radius + this
    pub avoid_margin: f32,
    pub avoid_strength: f32,
    pub fear_strength: f32,
    /// Distance over which avoid and fear pushes grow by one strength unit
    pub falloff: f32,
    pub panic_speed_factor: f32,
    pub boost_speed_factor: f32,
    pub wander_jitter: f32,
    /// Luring recruits free followers within this distance of the survivor
    pub recruit_radius: f32,
    /// Luring pulls free followers within this distance
    pub lure_radius: f32,
    pub lure_accel: f32,
    pub wall_restitution: f32,
}

impl Default for FlockTuning {
    fn default() -> Self {
        Self {
            weights: FlockWeights::default(),
            max_speed: 9.0,
            max_force: 0.6,
            slow_radius: 100.0,
            neighbor_radius: 60.0,
            separation_radius: 25.0,
            alignment_damping: 0.1,
            cohesion_step: 0.05,
            avoid_margin: 50.0,
            avoid_strength: 5.0,
            fear_strength: 8.0,
            falloff: 50.0,
            panic_speed_factor: 1.4,
            boost_speed_factor: 1.3,
            wander_jitter: 0.25,
            recruit_radius: 600.0,
            lure_radius: 800.0,
            lure_accel: 1.5,
            wall_restitution: 0.5,
        }
    }
}

/// A flock member
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Follower {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Following the survivor rather than roaming free
    pub recruited: bool,
    pub panicked: bool,
}

impl Follower {
    /// A follower at `position` heading in a random direction at unit speed
    pub fn spawn<R: Rng + ?Sized>(position: Vec2, recruited: bool, rng: &mut R) -> Self {
        Self {
            position,
            velocity: Vec2::from_angle(rng.gen_range(0.0..TAU)),
            recruited,
            panicked: false,
        }
    }

    /// A free-roaming follower anywhere in the world
    pub fn roaming<R: Rng + ?Sized>(extent: f32, rng: &mut R) -> Self {
        let position = Vec2::new(rng.gen_range(0.0..=extent), rng.gen_range(0.0..=extent));
        Self::spawn(position, false, rng)
    }
}

/// A fear source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threat {
    pub position: Vec2,
    pub aura: f32,
}

/// Read-only surroundings shared by every follower in a tick
#[derive(Debug, Clone, Copy)]
pub struct FlockEnv<'a> {
    pub terrain: &'a Terrain,
    /// Follower indices bucketed by position
    pub neighbors: &'a SpatialHash<usize>,
    /// Active fear auras; empty when nothing is frightening
    pub threats: &'a [Threat],
    /// Director target
    pub target: Vec2,
    pub mode: FlockMode,
    pub survivor: Vec2,
    pub luring: bool,
    /// Survivor boost is running
    pub boosted: bool,
    pub speed_multiplier: f32,
    pub weather: WeatherState,
}

/// Advance every follower by one tick
pub fn step_flock<R: Rng + ?Sized>(
    followers: &mut [Follower],
    env: &FlockEnv<'_>,
    tuning: &FlockTuning,
    rng: &mut R,
) {
    let snapshot = followers.to_vec();
    for (i, follower) in followers.iter_mut().enumerate() {
        *follower = step_follower(i, &snapshot, env, tuning, rng);
    }
}

/// Next state of `snapshot[index]`
pub fn step_follower<R: Rng + ?Sized>(
    index: usize,
    snapshot: &[Follower],
    env: &FlockEnv<'_>,
    tuning: &FlockTuning,
    rng: &mut R,
) -> Follower {
    let mut f = snapshot[index];
    let to_survivor = f.position.distance(env.survivor);
    if env.luring && !f.recruited && to_survivor < tuning.recruit_radius {
        f.recruited = true;
    }

    let max_speed = tuning.max_speed * env.speed_multiplier * env.weather.speed_modifier();
    let flock = flock_force(index, snapshot, env.neighbors, tuning);
    let avoid = avoid_force(f.position, env.terrain, tuning);
    let fear = if f.recruited {
        fear_force(f.position, env.threats, tuning)
    } else {
        None
    };
    f.panicked = fear.is_some();

    let mut accel = SteeringOutput::zero();
    if env.luring && !f.recruited && to_survivor < tuning.lure_radius {
        accel.add(steering::direction(f.position, env.survivor), tuning.lure_accel);
    }
    if let Some(fear) = fear {
        accel.add(fear, 1.0);
        accel.add(avoid, 2.0);
        accel.add(flock, 0.5);
    } else if f.recruited {
        let seek = steering::seek(
            f.position,
            f.velocity,
            env.target,
            max_speed,
            tuning.max_force,
            tuning.slow_radius,
        );
        let (seek_w, flock_w) = match env.mode {
            FlockMode::Fetching => (1.5, 2.0),
            FlockMode::Guiding => (1.2, 1.0),
        };
        accel.add(seek, seek_w);
        accel.add(flock, flock_w);
        accel.add(avoid, 1.0);
    } else {
        accel.add(flock, 1.0);
        accel.add(avoid, 1.0);
        accel.add(steering::jitter(rng, tuning.wander_jitter), 1.0);
    }
    accel.add(env.weather.wind, 1.0);

    let mut cap = max_speed;
    if env.boosted {
        cap *= tuning.boost_speed_factor;
    }
    if f.panicked {
        cap *= tuning.panic_speed_factor;
    }
    f.velocity = (f.velocity + accel.linear).clamp_length_max(cap);
    f.position += f.velocity;
    steering::contain(
        &mut f.position,
        &mut f.velocity,
        env.terrain.extent(),
        tuning.wall_restitution,
    );
    f
}

/// Weighted separation, alignment and cohesion against neighbours found in
/// the 3x3 hash neighbourhood
pub fn flock_force(
    index: usize,
    snapshot: &[Follower],
    neighbors: &SpatialHash<usize>,
    tuning: &FlockTuning,
) -> Vec2 {
    let me = snapshot[index];
    let radius_sq = tuning.neighbor_radius * tuning.neighbor_radius;
    let mut separation = Vec2::ZERO;
    let mut heading = Vec2::ZERO;
    let mut centroid = Vec2::ZERO;
    let mut count = 0usize;

    for j in neighbors.neighborhood(me.position) {
        if j == index {
            continue;
        }
        let Some(other) = snapshot.get(j) else {
            continue;
        };
        let offset = me.position - other.position;
        let d_sq = offset.length_squared();
        if d_sq <= 0.0 || d_sq >= radius_sq {
            continue;
        }
        let d = d_sq.sqrt();
        if d < tuning.separation_radius {
            separation += offset / d;
        }
        heading += other.velocity;
        centroid += other.position;
        count += 1;
    }

    if count == 0 {
        return Vec2::ZERO;
    }
    let n = count as f32;
    let alignment = (heading / n - me.velocity) * tuning.alignment_damping;
    let cohesion = steering::direction(me.position, centroid / n) * tuning.cohesion_step;
    let w = tuning.weights;
    separation * w.separation + alignment * w.alignment + cohesion * w.cohesion
}

/// Push away from every obstacle closer than radius + avoid margin
pub fn avoid_force(position: Vec2, terrain: &Terrain, tuning: &FlockTuning) -> Vec2 {
    terrain
        .nearby_obstacles(position)
        .map(|o| {
            steering::repel(
                position,
                o.position,
                o.radius + tuning.avoid_margin,
                tuning.falloff,
                tuning.avoid_strength,
            )
        })
        .fold(Vec2::ZERO, |acc, f| acc + f)
}

/// Panic push away from every threat whose aura covers `position`, or
/// `None` when no aura does
pub fn fear_force(position: Vec2, threats: &[Threat], tuning: &FlockTuning) -> Option<Vec2> {
    let mut force = Vec2::ZERO;
    let mut afraid = false;
    for t in threats {
        if position.distance_squared(t.position) < t.aura * t.aura {
            afraid = true;
            force += steering::repel(position, t.position, t.aura, tuning.falloff, tuning.fear_strength);
        }
    }
    afraid.then_some(force)
}
