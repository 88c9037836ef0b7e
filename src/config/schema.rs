//! Configuration schema definitions.
//!
//! Raw config types mirror the TOML file and accept any integer; [`Strategy`] is the
//! normalized form a breaker actually runs with.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Failures tolerated before the breaker leaves Closed.
pub const DEFAULT_THRESHOLD: u32 = 5;
/// Seconds between recovery probe attempts.
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 5;
/// Probe attempts before the breaker gives up and opens.
pub const DEFAULT_RETRY_MAX: u32 = 5;

/// Root configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BreakerSettings {
    /// Strategy applied to breakers without their own entry.
    pub defaults: StrategyConfig,

    /// Per-breaker overrides.
    pub breakers: Vec<NamedStrategyConfig>,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

impl BreakerSettings {
    /// Effective strategy for `name`: its own entry when present, otherwise the defaults.
    pub fn strategy_for(&self, name: &str) -> Strategy {
        self.override_for(name)
            .unwrap_or_else(|| Strategy::from(self.defaults.clone()))
    }

    /// Strategy from the breaker's own `[[breakers]]` entry, if it has one.
    pub fn override_for(&self, name: &str) -> Option<Strategy> {
        self.breakers
            .iter()
            .find(|b| b.name == name)
            .map(|b| Strategy::from(b.strategy.clone()))
    }
}

/// Raw strategy values. Zero or negative means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub threshold: i64,
    pub retry_interval_secs: i64,
    pub retry_max: i64,
}

/// A strategy bound to a breaker name.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NamedStrategyConfig {
    pub name: String,

    #[serde(flatten)]
    pub strategy: StrategyConfig,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Install the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Normalized, immutable breaker tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    threshold: u32,
    retry_interval: Duration,
    retry_max: u32,
}

impl Strategy {
    /// Build a strategy; any value `<= 0` falls back to its default.
    pub fn new(threshold: i64, retry_interval: Duration, retry_max: i64) -> Self {
        let retry_interval = if retry_interval.is_zero() {
            Duration::from_secs(DEFAULT_RETRY_INTERVAL_SECS)
        } else {
            retry_interval
        };

        Self {
            threshold: positive_or(threshold, DEFAULT_THRESHOLD),
            retry_interval,
            retry_max: positive_or(retry_max, DEFAULT_RETRY_MAX),
        }
    }

    /// Number of consecutive failures allowed before the breaker trips.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Spacing between recovery probe attempts.
    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// Probe attempts allowed before the breaker opens.
    pub fn retry_max(&self) -> u32 {
        self.retry_max
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::new(0, Duration::ZERO, 0)
    }
}

impl From<StrategyConfig> for Strategy {
    fn from(raw: StrategyConfig) -> Self {
        let secs = u64::try_from(raw.retry_interval_secs).unwrap_or(0);
        Self::new(raw.threshold, Duration::from_secs(secs), raw.retry_max)
    }
}

impl From<&Strategy> for StrategyConfig {
    fn from(strategy: &Strategy) -> Self {
        Self {
            threshold: i64::from(strategy.threshold),
            retry_interval_secs: strategy.retry_interval.as_secs() as i64,
            retry_max: i64::from(strategy.retry_max),
        }
    }
}

fn positive_or(value: i64, default: u32) -> u32 {
    if value <= 0 {
        return default;
    }
    u32::try_from(value).unwrap_or(u32::MAX)
}
