//! Borrowed, kind-tagged view over every agent in a session

use crate::flock::Follower;
use crate::predator::Predator;
use crate::survivor::Survivor;
use serde::{Deserialize, Serialize};
use shepherd_math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Follower,
    Predator,
    Survivor,
}

/// One agent of any kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Agent<'a> {
    Follower(&'a Follower),
    Predator(&'a Predator),
    Survivor(&'a Survivor),
}

impl Agent<'_> {
    pub fn kind(&self) -> AgentKind {
        match self {
            Agent::Follower(_) => AgentKind::Follower,
            Agent::Predator(_) => AgentKind::Predator,
            Agent::Survivor(_) => AgentKind::Survivor,
        }
    }

    pub fn position(&self) -> Vec2 {
        match self {
            Agent::Follower(f) => f.position,
            Agent::Predator(p) => p.position,
            Agent::Survivor(s) => s.position,
        }
    }

    pub fn velocity(&self) -> Vec2 {
        match self {
            Agent::Follower(f) => f.velocity,
            Agent::Predator(p) => p.velocity,
            Agent::Survivor(s) => s.velocity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_accessors() {
        let s = Survivor::new(Vec2::new(3.0, 4.0));
        let p = Predator::new(Vec2::new(7.0, 8.0), 0.0);
        let agents = [Agent::Survivor(&s), Agent::Predator(&p)];

        assert_eq!(agents[0].kind(), AgentKind::Survivor);
        assert_eq!(agents[0].position(), Vec2::new(3.0, 4.0));
        assert_eq!(agents[1].velocity(), Vec2::ONE);
    }
}
