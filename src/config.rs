use crate::fare::FarePolicy;
use crate::map::{DEFAULT_REFERENCE, DEFAULT_SPAN_DEGREES, GeoPoint, MockMap};
use crate::modes::DEFAULT_DURATIONS_MINUTES;
use crate::navigator::TransitionPolicy;
use crate::ticker::DEFAULT_TICK_INTERVAL;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_QR_SCAN_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub pricing: Option<PricingSection>,
    #[serde(default)]
    pub ride: Option<RideSection>,
    #[serde(default)]
    pub exercise: Option<ExerciseSection>,
    #[serde(default)]
    pub map: Option<MapSection>,
    #[serde(default)]
    pub navigation: Option<NavigationSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
    /// Period of ride and timer ticks in milliseconds (default: 1000)
    pub tick_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingSection {
    pub initial_fee: Option<u64>,
    pub free_minutes: Option<u64>,
    pub per_minute_rate: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RideSection {
    /// Simulated QR scan time before payment is offered (default: 2000)
    pub qr_scan_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExerciseSection {
    pub durations_minutes: Option<Vec<u32>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapSection {
    pub reference_lat: Option<f64>,
    pub reference_lng: Option<f64>,
    pub span_degrees: Option<f64>,
    /// Fixed seed for the mock trip estimates; random when absent.
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NavigationSection {
    /// Reject screen changes outside the app's route table.
    #[serde(default)]
    pub guarded: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Runtime settings resolved from [`Config`], with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub fare: FarePolicy,
    pub qr_scan_delay: Duration,
    pub tick_interval: Duration,
    pub exercise_durations: Vec<u32>,
    pub map: MockMap,
    pub rng_seed: Option<u64>,
    pub transition_policy: TransitionPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fare: FarePolicy::default(),
            qr_scan_delay: DEFAULT_QR_SCAN_DELAY,
            tick_interval: DEFAULT_TICK_INTERVAL,
            exercise_durations: DEFAULT_DURATIONS_MINUTES.to_vec(),
            map: MockMap::default(),
            rng_seed: None,
            transition_policy: TransitionPolicy::Open,
        }
    }
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    pub fn tick_interval(&self) -> Duration {
        self.server
            .as_ref()
            .and_then(|s| s.tick_interval_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TICK_INTERVAL)
    }

    pub fn fare_policy(&self) -> FarePolicy {
        let defaults = FarePolicy::default();
        match &self.pricing {
            Some(pricing) => FarePolicy {
                initial_fee: pricing.initial_fee.unwrap_or(defaults.initial_fee),
                free_minutes: pricing.free_minutes.unwrap_or(defaults.free_minutes),
                per_minute_rate: pricing.per_minute_rate.unwrap_or(defaults.per_minute_rate),
            },
            None => defaults,
        }
    }

    pub fn qr_scan_delay(&self) -> Duration {
        self.ride
            .as_ref()
            .and_then(|r| r.qr_scan_delay_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_QR_SCAN_DELAY)
    }

    pub fn exercise_durations(&self) -> Vec<u32> {
        self.exercise
            .as_ref()
            .and_then(|e| e.durations_minutes.clone())
            .unwrap_or_else(|| DEFAULT_DURATIONS_MINUTES.to_vec())
    }

    pub fn mock_map(&self) -> MockMap {
        let section = self.map.as_ref();
        let reference = GeoPoint {
            lat: section
                .and_then(|m| m.reference_lat)
                .unwrap_or(DEFAULT_REFERENCE.lat),
            lng: section
                .and_then(|m| m.reference_lng)
                .unwrap_or(DEFAULT_REFERENCE.lng),
        };
        let span = section
            .and_then(|m| m.span_degrees)
            .unwrap_or(DEFAULT_SPAN_DEGREES);
        MockMap::new(reference, span)
    }

    pub fn transition_policy(&self) -> TransitionPolicy {
        match &self.navigation {
            Some(section) if section.guarded => TransitionPolicy::Guarded,
            _ => TransitionPolicy::Open,
        }
    }

    /// Resolve and validate everything the app state needs.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let tick_interval = self.tick_interval();
        if tick_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "server.tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        let exercise_durations = self.exercise_durations();
        if exercise_durations.is_empty() || exercise_durations.contains(&0) {
            return Err(ConfigError::Invalid(
                "exercise.durations_minutes must list positive durations".to_string(),
            ));
        }
        let span = self
            .map
            .as_ref()
            .and_then(|m| m.span_degrees)
            .unwrap_or(DEFAULT_SPAN_DEGREES);
        if !(span.is_finite() && span > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "map.span_degrees must be positive, got {span}"
            )));
        }

        Ok(Settings {
            fare: self.fare_policy(),
            qr_scan_delay: self.qr_scan_delay(),
            tick_interval,
            exercise_durations,
            map: self.mock_map(),
            rng_seed: self.map.as_ref().and_then(|m| m.seed),
            transition_policy: self.transition_policy(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    const MINIMAL: &str = r#"
[app]
name = "mada-ride"

[logging]
level = "info"
"#;

    #[test]
    fn default_config_resolves_to_default_settings() -> Result<(), Box<dyn std::error::Error>> {
        let config = load_default()?;
        let settings = config.settings()?;
        assert_eq!(settings.fare, FarePolicy::default());
        assert_eq!(settings.qr_scan_delay, Duration::from_millis(2000));
        assert_eq!(settings.exercise_durations, vec![90, 60, 30]);
        Ok(())
    }

    #[test]
    fn minimal_config_falls_back_to_constants() -> Result<(), Box<dyn std::error::Error>> {
        let config: Config = toml::from_str(MINIMAL)?;

        assert_eq!(config.server_port(), DEFAULT_SERVER_PORT);
        assert_eq!(config.settings()?, Settings::default());
        Ok(())
    }

    #[test]
    fn sections_override_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let contents = format!(
            "{MINIMAL}
[server]
port = 9090
tick_interval_ms = 250

[pricing]
per_minute_rate = 2

[ride]
qr_scan_delay_ms = 500

[exercise]
durations_minutes = [15]

[map]
seed = 42

[navigation]
guarded = true
"
        );
        let config: Config = toml::from_str(&contents)?;
        let settings = config.settings()?;

        assert_eq!(config.server_port(), 9090);
        assert_eq!(settings.tick_interval, Duration::from_millis(250));
        assert_eq!(settings.fare.per_minute_rate, 2);
        assert_eq!(settings.fare.initial_fee, 5);
        assert_eq!(settings.qr_scan_delay, Duration::from_millis(500));
        assert_eq!(settings.exercise_durations, vec![15]);
        assert_eq!(settings.rng_seed, Some(42));
        assert_eq!(settings.transition_policy, TransitionPolicy::Guarded);
        Ok(())
    }

    #[test]
    fn zero_tick_interval_is_invalid() -> Result<(), Box<dyn std::error::Error>> {
        let contents = format!("{MINIMAL}\n[server]\ntick_interval_ms = 0\n");
        let config: Config = toml::from_str(&contents)?;

        assert!(matches!(config.settings(), Err(ConfigError::Invalid(_))));
        Ok(())
    }

    #[test]
    fn empty_exercise_presets_are_invalid() -> Result<(), Box<dyn std::error::Error>> {
        let contents = format!("{MINIMAL}\n[exercise]\ndurations_minutes = []\n");
        let config: Config = toml::from_str(&contents)?;

        assert!(matches!(config.settings(), Err(ConfigError::Invalid(_))));
        Ok(())
    }

    #[test]
    fn missing_config_file_returns_read_error() {
        let temp_dir = std::env::temp_dir();
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        let path = temp_dir.join(format!("mada-config-missing-{unique}.toml"));

        let result = load_from_path(&path);

        assert!(matches!(result, Err(ConfigError::Read(_))));
    }

    #[test]
    fn invalid_toml_returns_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = std::env::temp_dir();
        let unique = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        let path = temp_dir.join(format!("mada-config-invalid-{unique}.toml"));
        fs::write(&path, "not = [valid")?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        Ok(())
    }
}
