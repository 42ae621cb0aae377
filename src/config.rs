//! Application-level configuration loading: matching threshold, cache TTL,
//! retry policy, calendar offset and availability rules.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, DurationSeconds, serde_as};
use time::UtcOffset;
use tracing::{info, warn};

use crate::{
    dao::{availability::AvailabilityRules, retry::RetryPolicy},
    services::matching::DEFAULT_MIN_OVERLAP_MINUTES,
    state::calendar::to_minutes,
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PADEL_LEAGUE_CONFIG_PATH";
/// Default lifetime of cached table snapshots.
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Shortest common window proposed as a match candidate, in minutes.
    pub min_overlap_minutes: u16,
    /// Lifetime of cached table snapshots.
    pub cache_ttl: Duration,
    /// Backoff applied to transient store failures.
    pub retry: RetryPolicy,
    /// Fixed offset of the league's local time zone.
    pub utc_offset: UtcOffset,
    /// Availability grid and retention rules.
    pub availability: AvailabilityRules,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        min_overlap_minutes = app_config.min_overlap_minutes,
                        cache_ttl_secs = app_config.cache_ttl.as_secs(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document. Missing keys take their default and out-of-range
    /// values are replaced by the default with a warning.
    pub fn from_json_str(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            min_overlap_minutes: DEFAULT_MIN_OVERLAP_MINUTES,
            cache_ttl: DEFAULT_CACHE_TTL,
            retry: RetryPolicy::default(),
            utc_offset: UtcOffset::UTC,
            availability: AvailabilityRules::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    matching: RawMatching,
    cache: RawCache,
    retry: RawRetry,
    calendar: RawCalendar,
    availability: RawAvailability,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMatching {
    min_overlap_minutes: Option<u16>,
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCache {
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    ttl_secs: Option<Duration>,
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRetry {
    max_attempts: Option<u32>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    base_delay_ms: Option<Duration>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    max_delay_ms: Option<Duration>,
    jitter: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCalendar {
    utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAvailability {
    prune_past_dates: Option<bool>,
    grid_end: Option<String>,
    slot_minutes: Option<u16>,
}

/// Keep `value` unless it fails `valid`, in which case warn and use `default`.
fn checked<T: std::fmt::Debug>(
    key: &'static str,
    value: Option<T>,
    default: T,
    valid: impl FnOnce(&T) -> bool,
) -> T {
    match value {
        Some(value) if valid(&value) => value,
        Some(value) => {
            warn!(key, ?value, "invalid config value; keeping default");
            default
        }
        None => default,
    }
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();

        let min_overlap_minutes = checked(
            "matching.min_overlap_minutes",
            raw.matching.min_overlap_minutes,
            defaults.min_overlap_minutes,
            |minutes| *minutes > 0,
        );
        // A zero TTL is allowed and disables caching.
        let cache_ttl = raw.cache.ttl_secs.unwrap_or(defaults.cache_ttl);

        let retry = RetryPolicy {
            max_attempts: checked(
                "retry.max_attempts",
                raw.retry.max_attempts,
                defaults.retry.max_attempts,
                |attempts| *attempts > 0,
            ),
            base_delay: raw.retry.base_delay_ms.unwrap_or(defaults.retry.base_delay),
            max_delay: raw.retry.max_delay_ms.unwrap_or(defaults.retry.max_delay),
            jitter: raw.retry.jitter.unwrap_or(defaults.retry.jitter),
        };

        let utc_offset = raw
            .calendar
            .utc_offset_minutes
            .and_then(|minutes| match UtcOffset::from_whole_seconds(minutes.saturating_mul(60)) {
                Ok(offset) => Some(offset),
                Err(err) => {
                    warn!(key = "calendar.utc_offset_minutes", minutes, error = %err, "invalid config value; keeping default");
                    None
                }
            })
            .unwrap_or(defaults.utc_offset);

        let grid_end = raw
            .availability
            .grid_end
            .and_then(|value| match to_minutes(&value) {
                Ok(minutes) => Some(minutes),
                Err(err) => {
                    warn!(key = "availability.grid_end", error = %err, "invalid config value; keeping default");
                    None
                }
            })
            .unwrap_or(defaults.availability.grid_end);

        let availability = AvailabilityRules {
            grid_end,
            slot_minutes: checked(
                "availability.slot_minutes",
                raw.availability.slot_minutes,
                defaults.availability.slot_minutes,
                |minutes| *minutes > 0,
            ),
            prune_past_dates: raw
                .availability
                .prune_past_dates
                .unwrap_or(defaults.availability.prune_past_dates),
        };

        Self {
            min_overlap_minutes,
            cache_ttl,
            retry,
            utc_offset,
            availability,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
