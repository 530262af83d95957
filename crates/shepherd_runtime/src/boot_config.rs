//! Boot Configuration
//!
//! Decides which session to run and how to drive it.
//!
//! # Configuration Sources (in priority order)
//!
//! 1. First positional argument: a TOML session file or a preset name
//!    (`easy`, `medium`, `hard`)
//! 2. Environment variable: `SHEPHERD_CONFIG=meadow.toml`
//! 3. The built-in medium preset
//!
//! Flags: `--ticks=N`, `--seed=N`, `--weather=storm`, `--no-lure`,
//! `--no-recall`, `--fast`, `--pretty`. `SHEPHERD_MAX_TICKS` and
//! `SHEPHERD_SEED` are read when the matching flag is absent.

use serde::{Deserialize, Serialize};
use shepherd_sim::{Difficulty, SessionConfig, Weather};
use std::path::PathBuf;

/// Where the session configuration comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    File(PathBuf),
    Preset(Difficulty),
}

impl Default for ConfigSource {
    fn default() -> Self {
        Self::Preset(Difficulty::Medium)
    }
}

impl ConfigSource {
    fn parse(value: &str) -> Self {
        match value.parse::<Difficulty>() {
            Ok(difficulty) => Self::Preset(difficulty),
            Err(_) => Self::File(PathBuf::from(value)),
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Preset(difficulty) => write!(f, "{} preset", difficulty),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootConfig {
    pub source: ConfigSource,
    /// Stop after this many ticks even without an outcome
    pub max_ticks: u64,
    /// Overrides the session seed
    pub seed: Option<u64>,
    /// Overrides the starting weather
    pub weather: Option<Weather>,
    /// Hold the recruitment pulse every tick
    pub luring: bool,
    /// Recall the flock on the tick after it scatters
    pub auto_recall: bool,
    /// Skip frame pacing and tick as fast as possible
    pub fast: bool,
    /// Pretty-print the final snapshot
    pub pretty: bool,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            source: ConfigSource::default(),
            max_ticks: 18_000,
            seed: None,
            weather: None,
            luring: true,
            auto_recall: true,
            fast: false,
            pretty: false,
        }
    }
}

impl BootConfig {
    /// Resolve from the process arguments and environment
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    /// Resolve from explicit arguments and an environment lookup
    pub fn from_sources(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = env("SHEPHERD_CONFIG").filter(|v| !v.is_empty()) {
            config.source = ConfigSource::parse(&value);
            log::info!("Session config from env: {}", config.source);
        }
        if let Some(ticks) = env("SHEPHERD_MAX_TICKS").and_then(|v| v.parse().ok()) {
            config.max_ticks = ticks;
        }
        if let Some(seed) = env("SHEPHERD_SEED").and_then(|v| v.parse().ok()) {
            config.seed = Some(seed);
        }

        let mut positional = None;
        for arg in args {
            if let Some(flag) = arg.strip_prefix("--") {
                config.apply_flag(flag);
            } else if positional.is_none() {
                positional = Some(arg.as_str());
            }
        }
        if let Some(value) = positional {
            config.source = ConfigSource::parse(value);
            log::info!("Session config from args: {}", config.source);
        }

        config
    }

    fn apply_flag(&mut self, flag: &str) {
        let (key, value) = match flag.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (flag, None),
        };
        match (key, value) {
            ("ticks", Some(v)) => match v.parse() {
                Ok(ticks) => self.max_ticks = ticks,
                Err(_) => log::warn!("Ignoring bad tick count: {}", v),
            },
            ("seed", Some(v)) => match v.parse() {
                Ok(seed) => self.seed = Some(seed),
                Err(_) => log::warn!("Ignoring bad seed: {}", v),
            },
            ("weather", Some(v)) => match parse_weather(v) {
                Some(weather) => self.weather = Some(weather),
                None => log::warn!("Unknown weather: {}", v),
            },
            ("no-lure", None) => self.luring = false,
            ("no-recall", None) => self.auto_recall = false,
            ("fast", None) => self.fast = true,
            ("pretty", None) => self.pretty = true,
            _ => log::warn!("Unknown flag: --{}", flag),
        }
    }

    /// Build the session configuration this boot config points at
    pub fn session_config(&self) -> shepherd_sim::Result<SessionConfig> {
        let mut config = match &self.source {
            ConfigSource::File(path) => SessionConfig::load(path)?,
            ConfigSource::Preset(difficulty) => difficulty.config(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(weather) = self.weather {
            config.weather = weather;
        }
        Ok(config)
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        log::info!("Boot Configuration:");
        log::info!("  Session: {}", self.source);
        log::info!("  Max ticks: {}{}", self.max_ticks, if self.fast { " (unpaced)" } else { "" });
        if let Some(seed) = self.seed {
            log::info!("  Seed: {}", seed);
        }
        if let Some(weather) = self.weather {
            log::info!("  Weather: {}", weather.as_str());
        }
        log::info!("  Luring: {}, auto recall: {}", self.luring, self.auto_recall);
    }
}

fn parse_weather(value: &str) -> Option<Weather> {
    Weather::ALL
        .into_iter()
        .find(|w| w.as_str().eq_ignore_ascii_case(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_is_medium_preset() {
        let config = BootConfig::from_sources(&[], no_env);
        assert_eq!(config.source, ConfigSource::Preset(Difficulty::Medium));
        assert!(config.luring);
        assert_eq!(config.session_config().unwrap().predator_count, 10);
    }

    #[test]
    fn test_env_used_without_args() {
        let env = |key: &str| (key == "SHEPHERD_CONFIG").then(|| "meadow.toml".to_string());
        let config = BootConfig::from_sources(&[], env);
        assert_eq!(config.source, ConfigSource::File(PathBuf::from("meadow.toml")));
    }

    #[test]
    fn test_args_override_env() {
        let env = |key: &str| match key {
            "SHEPHERD_CONFIG" => Some("meadow.toml".to_string()),
            "SHEPHERD_SEED" => Some("5".to_string()),
            _ => None,
        };
        let config = BootConfig::from_sources(&args(&["--seed=9", "hard"]), env);
        assert_eq!(config.source, ConfigSource::Preset(Difficulty::Hard));
        assert_eq!(config.seed, Some(9));

        let session = config.session_config().unwrap();
        assert_eq!(session.predator_count, 15);
        assert_eq!(session.seed, 9);
    }

    #[test]
    fn test_flags() {
        let config = BootConfig::from_sources(
            &args(&["--ticks=300", "--weather=Storm", "--no-lure", "--fast", "--bogus"]),
            no_env,
        );
        assert_eq!(config.max_ticks, 300);
        assert_eq!(config.weather, Some(Weather::Storm));
        assert!(!config.luring);
        assert!(config.fast);
        assert!(config.auto_recall);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let config = BootConfig::from_sources(&args(&["/nowhere/session.toml"]), no_env);
        assert!(config.session_config().is_err());
    }
}
