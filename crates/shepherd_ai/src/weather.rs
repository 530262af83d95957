//! Weather and the rules that decide who cares about it

use rand::Rng;
use serde::{Deserialize, Serialize};
use shepherd_math::{consts::TAU, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    #[default]
    Sunny,
    Rain,
    Wind,
    Storm,
}

impl Weather {
    pub const ALL: [Weather; 4] = [Weather::Sunny, Weather::Rain, Weather::Wind, Weather::Storm];

    /// Multiplier applied to agent top speeds
    pub fn speed_modifier(self) -> f32 {
        match self {
            Weather::Sunny => 1.0,
            Weather::Rain => 0.6,
            Weather::Wind => 0.7,
            Weather::Storm => 0.4,
        }
    }

    /// Magnitude of the per-tick wind push
    pub fn wind_strength(self) -> f32 {
        match self {
            Weather::Wind => 0.1,
            Weather::Storm => 0.18,
            Weather::Sunny | Weather::Rain => 0.0,
        }
    }

    /// Rain or storm
    pub fn is_adverse(self) -> bool {
        matches!(self, Weather::Rain | Weather::Storm)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Weather::Sunny => "sunny",
            Weather::Rain => "rain",
            Weather::Wind => "wind",
            Weather::Storm => "storm",
        }
    }
}

/// Current weather with its wind vector fixed at the moment it was set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherState {
    pub weather: Weather,
    pub wind: Vec2,
}

impl WeatherState {
    /// Pick a wind direction for `weather`
    pub fn new<R: Rng + ?Sized>(weather: Weather, rng: &mut R) -> Self {
        let strength = weather.wind_strength();
        let wind = if strength > 0.0 {
            Vec2::from_angle(rng.gen_range(0.0..TAU)) * strength
        } else {
            Vec2::ZERO
        };
        Self { weather, wind }
    }

    pub fn speed_modifier(&self) -> f32 {
        self.weather.speed_modifier()
    }

    pub fn is_adverse(&self) -> bool {
        self.weather.is_adverse()
    }
}

/// Difficulty-dependent predator rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherRules {
    /// Predators run for a den in rain or storm and are slowed by weather
    pub predator_avoids_adverse_weather: bool,
    /// Predators go after followers while the survivor is shielded
    pub predator_targets_followers_when_shielded: bool,
}

impl WeatherRules {
    /// Weather speed multiplier as it applies to predators
    pub fn predator_speed_modifier(&self, weather: &WeatherState) -> f32 {
        if self.predator_avoids_adverse_weather {
            weather.speed_modifier()
        } else {
            1.0
        }
    }

    /// Whether predators should be heading for shelter right now
    pub fn predators_shelter(&self, weather: &WeatherState) -> bool {
        self.predator_avoids_adverse_weather && weather.is_adverse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_wind_magnitude() {
        let mut rng = StdRng::seed_from_u64(1);
        for w in Weather::ALL {
            let state = WeatherState::new(w, &mut rng);
            assert_relative_eq!(state.wind.length(), w.wind_strength(), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_predator_rules() {
        let mut rng = StdRng::seed_from_u64(1);
        let storm = WeatherState::new(Weather::Storm, &mut rng);
        let wind = WeatherState::new(Weather::Wind, &mut rng);

        let averse = WeatherRules {
            predator_avoids_adverse_weather: true,
            ..Default::default()
        };
        assert!(averse.predators_shelter(&storm));
        assert!(!averse.predators_shelter(&wind));
        assert_eq!(averse.predator_speed_modifier(&wind), 0.7);

        let bold = WeatherRules::default();
        assert!(!bold.predators_shelter(&storm));
        assert_eq!(bold.predator_speed_modifier(&storm), 1.0);
    }

    #[test]
    fn test_weather_names() {
        let parsed: Weather = serde_json::from_str("\"storm\"").unwrap_or_default();
        assert_eq!(parsed, Weather::Storm);
        assert_eq!(parsed.as_str(), "storm");
    }
}
