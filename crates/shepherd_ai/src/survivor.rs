//! Survivor locomotion

use crate::flock::Follower;
use crate::predator::Predator;
use crate::steering::{self, direction};
use crate::weather::WeatherState;
use crate::zones::{BonusZone, ZoneKind};
use rand::Rng;
use serde::{Deserialize, Serialize};
use shepherd_math::{consts::TAU, Vec2};
use shepherd_nav::{SpatialHash, Terrain};

/// Weights for blending the survivor's forces in one regime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceBlend {
    pub flee: f32,
    pub path: f32,
    pub flock: f32,
    pub shelter: f32,
    /// Fraction of the gap to the desired velocity closed per tick
    pub damping: f32,
}

/// Survivor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurvivorTuning {
    pub base_speed: f32,
    pub radius: f32,
    pub collision_margin: f32,
    /// A hunting predator this close speeds up the position step
    pub hunted_radius: f32,
    /// A hunting predator this close switches to the chased blend
    pub chased_radius: f32,
    /// Ticks a fresh shelter holds the survivor still
    pub hide_hold_ticks: u32,
    pub boost_ticks: u32,
    pub boost_factor: f32,
    pub path_force: f32,
    pub shelter_force: f32,
    pub flee_force: f32,
    pub cohesion_radius: f32,
    /// The flock pull needs more recruited followers than this
    pub cohesion_min_followers: usize,
    /// Pulls longer than this are rescaled to the current speed
    pub cohesion_normalize_above: f32,
    pub chased: ForceBlend,
    pub calm: ForceBlend,
    pub hunted_step_factor: f32,
    pub obstacle_damping: f32,
    pub wall_restitution: f32,
    /// Minimum speed while chased, as a fraction of base speed
    pub min_chase_speed_factor: f32,
}

impl Default for SurvivorTuning {
    fn default() -> Self {
        Self {
            base_speed: 4.0,
            radius: 14.0,
            collision_margin: 2.0,
            hunted_radius: 700.0,
            chased_radius: 500.0,
            hide_hold_ticks: 300,
            boost_ticks: 180,
            boost_factor: 1.5,
            path_force: 1.5,
            shelter_force: 2.0,
            flee_force: 2.5,
            cohesion_radius: 600.0,
            cohesion_min_followers: 10,
            cohesion_normalize_above: 50.0,
            chased: ForceBlend {
                flee: 1.5,
                path: 0.8,
                flock: 0.3,
                shelter: 0.9,
                damping: 0.15,
            },
            calm: ForceBlend {
                flee: 0.0,
                path: 1.2,
                flock: 0.3,
                shelter: 0.9,
                damping: 0.1,
            },
            hunted_step_factor: 1.5,
            obstacle_damping: 0.7,
            wall_restitution: 0.5,
            min_chase_speed_factor: 0.8,
        }
    }
}

/// Everything the survivor reads this tick
#[derive(Debug, Clone, Copy)]
pub struct SurvivorEnv<'a> {
    pub terrain: &'a Terrain,
    pub predators: &'a [Predator],
    pub followers: &'a [Follower],
    pub follower_hash: &'a SpatialHash<usize>,
    /// Director target
    pub target: Vec2,
    pub goal: Vec2,
    pub goal_radius: f32,
    pub speed_multiplier: f32,
    pub weather: WeatherState,
    pub scattered: bool,
}

/// Side effects of one survivor tick for the caller to apply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurvivorReport {
    /// Speed zones entered (and deactivated) this tick
    pub activated: Vec<usize>,
    pub entered_shelter: Option<usize>,
    pub left_shelter: Option<usize>,
    pub reached_goal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survivor {
    pub position: Vec2,
    pub velocity: Vec2,
    pub alive: bool,
    /// Inside a shelter zone
    pub invincible: bool,
    pub hide_ticks: u32,
    pub boost_ticks: u32,
    /// Index of the shelter zone currently occupied
    pub shelter: Option<usize>,
    /// Hunting predator within the hunted radius
    pub hunted: bool,
    /// Hunting predator within the chased radius
    pub chased: bool,
}

impl Survivor {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            alive: true,
            invincible: false,
            hide_ticks: 0,
            boost_ticks: 0,
            shelter: None,
            hunted: false,
            chased: false,
        }
    }

    pub fn is_boosted(&self) -> bool {
        self.boost_ticks > 0
    }

    pub fn kill(&mut self) {
        self.alive = false;
        self.velocity = Vec2::ZERO;
    }

    /// Advance one tick
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        env: &SurvivorEnv<'_>,
        zones: &mut [BonusZone],
        tuning: &SurvivorTuning,
        rng: &mut R,
    ) -> SurvivorReport {
        let mut report = SurvivorReport::default();
        if !self.alive {
            return report;
        }

        let threat = nearest_hunter(self.position, env.predators);
        let threat_dist = threat.map_or(f32::INFINITY, |t| t.distance(self.position));
        self.hunted = threat_dist < tuning.hunted_radius;
        self.chased = threat_dist < tuning.chased_radius;

        let mut inside = None;
        let mut nearest_shelter: Option<Vec2> = None;
        let mut nearest_dist = f32::INFINITY;
        for (i, zone) in zones.iter_mut().enumerate() {
            match zone.kind {
                ZoneKind::Shelter => {
                    if zone.contains(self.position) {
                        inside = Some(i);
                    }
                    let d = zone.position.distance(self.position);
                    if d < nearest_dist {
                        nearest_dist = d;
                        nearest_shelter = Some(zone.position);
                    }
                }
                ZoneKind::Speed => {
                    if zone.active && zone.contains(self.position) {
                        zone.active = false;
                        self.boost_ticks = tuning.boost_ticks;
                        report.activated.push(i);
                    }
                }
            }
        }

        match inside {
            Some(i) => {
                if self.shelter != Some(i) {
                    report.entered_shelter = Some(i);
                }
                self.invincible = true;
                self.hide_ticks += 1;
                self.shelter = Some(i);
                if self.hide_ticks < tuning.hide_hold_ticks && !self.chased {
                    self.velocity = Vec2::ZERO;
                    return report;
                }
            }
            None => {
                report.left_shelter = self.shelter.take();
                self.invincible = false;
                self.hide_ticks = 0;
            }
        }

        let mut speed = tuning.base_speed * env.speed_multiplier * env.weather.speed_modifier();
        if self.boost_ticks > 0 {
            speed *= tuning.boost_factor;
            self.boost_ticks -= 1;
        }

        let path = direction(self.position, env.target) * speed * tuning.path_force;
        let mut shelter = Vec2::ZERO;
        let mut flock = Vec2::ZERO;
        match nearest_shelter {
            Some(at) if self.chased && inside.is_none() => {
                shelter = direction(self.position, at) * speed * tuning.shelter_force;
            }
            _ if !env.scattered => {
                flock = flock_pull(self.position, env, tuning, speed);
            }
            _ => {}
        }
        let flee = match threat {
            Some(at) if self.chased => steering::flee(self.position, at, speed * tuning.flee_force),
            _ => Vec2::ZERO,
        };

        let blend = if self.chased {
            &tuning.chased
        } else {
            &tuning.calm
        };
        let desired = flee * blend.flee + path * blend.path + flock * blend.flock + shelter * blend.shelter;
        self.velocity += (desired - self.velocity) * blend.damping;
        self.velocity += env.weather.wind;

        let step = if self.hunted || self.chased {
            tuning.hunted_step_factor
        } else {
            1.0
        };
        let mut next = self.position + self.velocity * step;
        let reach = tuning.radius + tuning.collision_margin;
        for o in env.terrain.nearby_obstacles(next) {
            if o.blocks(next, reach) {
                let angle = (next - o.position).angle();
                next = o.position + Vec2::from_angle(angle) * (o.radius + reach);
                self.velocity *= tuning.obstacle_damping;
            }
        }
        self.position = next;
        steering::contain(
            &mut self.position,
            &mut self.velocity,
            env.terrain.extent(),
            tuning.wall_restitution,
        );

        if self.chased {
            let floor = tuning.base_speed * tuning.min_chase_speed_factor;
            if self.velocity.length() < floor {
                let angle = if self.velocity != Vec2::ZERO {
                    self.velocity.angle()
                } else {
                    rng.gen_range(0.0..TAU)
                };
                self.velocity = Vec2::from_angle(angle) * floor;
            }
        }

        report.reached_goal =
            self.position.distance_squared(env.goal) < env.goal_radius * env.goal_radius;
        report
    }
}

/// Position of the closest predator in the hunting state
pub fn nearest_hunter(position: Vec2, predators: &[Predator]) -> Option<Vec2> {
    predators
        .iter()
        .filter(|p| p.is_hunting())
        .map(|p| p.position)
        .min_by(|a, b| {
            a.distance_squared(position)
                .total_cmp(&b.distance_squared(position))
        })
}

/// Pull toward recruited followers within the cohesion radius. Zero unless
/// enough followers are close.
pub fn flock_pull(position: Vec2, env: &SurvivorEnv<'_>, tuning: &SurvivorTuning, speed: f32) -> Vec2 {
    let radius_sq = tuning.cohesion_radius * tuning.cohesion_radius;
    let mut sum = Vec2::ZERO;
    let mut count = 0usize;
    env.follower_hash
        .for_each_nearby(position, tuning.cohesion_radius, |i| {
            if let Some(f) = env.followers.get(i) {
                if f.recruited && f.position.distance_squared(position) < radius_sq {
                    sum += f.position - position;
                    count += 1;
                }
            }
        });
    if count <= tuning.cohesion_min_followers {
        return Vec2::ZERO;
    }
    if sum.length() > tuning.cohesion_normalize_above {
        sum.normalize() * speed
    } else {
        sum
    }
}
