use std::time::Duration;

use crate::poller::PollerConfig;

/// Runtime configuration, read from the environment with sane defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend root URL (`TRANSIT_API_BASE`)
    pub api_base: String,
    /// Path of the SQLite session database (`TRANSIT_DB`)
    pub db_path: String,
    /// Vehicle poll cadence in seconds (`VEHICLE_POLL_SECS`)
    pub vehicles_every: Duration,
    /// Trip-update poll cadence in seconds (`TRIP_POLL_SECS`)
    pub trip_updates_every: Duration,
    /// Vehicle to start tracking on launch (`TRACK_VEHICLE`)
    pub track_vehicle: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:5000".to_string(),
            db_path: "transit-companion.db".to_string(),
            vehicles_every: Duration::from_secs(30),
            trip_updates_every: Duration::from_secs(60),
            track_vehicle: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base: std::env::var("TRANSIT_API_BASE").unwrap_or(defaults.api_base),
            db_path: std::env::var("TRANSIT_DB").unwrap_or(defaults.db_path),
            vehicles_every: secs_var("VEHICLE_POLL_SECS", defaults.vehicles_every),
            trip_updates_every: secs_var("TRIP_POLL_SECS", defaults.trip_updates_every),
            track_vehicle: std::env::var("TRACK_VEHICLE").ok(),
        }
    }

    pub fn poller(&self) -> PollerConfig {
        PollerConfig {
            vehicles_every: self.vehicles_every,
            trip_updates_every: self.trip_updates_every,
        }
    }
}

fn secs_var(name: &str, default: Duration) -> Duration {
    match std::env::var(name) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                tracing::warn!(var = name, value = %raw, "Ignoring invalid poll cadence");
                default
            }
        },
        Err(_) => default,
    }
}
