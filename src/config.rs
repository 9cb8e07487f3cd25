//! Configuration management module
//!
//! Loads and validates environment-based configuration.
//! Designed to be production-ready and easily extensible.

use chrono::Duration;
use serde::Deserialize;
use std::env;
use thiserror::Error;

use crate::models::SafeBand;
use crate::store::StoreConfig;

/// Configuration errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid number format in environment variable")]
    ParseError,
}

/// Server configuration settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Telemetry engine settings
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Readings retained per sensor
    pub window_capacity: usize,
    /// Expected seconds between reports from a healthy sensor
    pub report_interval_secs: u64,
    /// Seconds without a reading before a sensor is offline
    pub liveness_timeout_secs: u64,
    /// Milliseconds between liveness sweeps
    pub sweep_interval_ms: u64,
}

/// Default safe bands for sensors registered without one
#[derive(Debug, Clone, Deserialize)]
pub struct BandSettings {
    pub temp_low: f64,
    pub temp_high: f64,
    pub humidity_low: f64,
    pub humidity_high: f64,
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub engine: EngineSettings,
    pub bands: BandSettings,
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self, SettingsError> {
        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .map_err(|_| SettingsError::ParseError)?;

        let window_capacity = env::var("WINDOW_CAPACITY")
            .unwrap_or_else(|_| "24".into())
            .parse()
            .map_err(|_| SettingsError::ParseError)?;

        let report_interval_secs: u64 = env::var("REPORT_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .map_err(|_| SettingsError::ParseError)?;

        // Default liveness timeout is 10x the expected reporting interval
        let liveness_timeout_secs = match env::var("LIVENESS_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().map_err(|_| SettingsError::ParseError)?,
            Err(_) => report_interval_secs * 10,
        };

        let sweep_interval_ms = env::var("SWEEP_INTERVAL_MS")
            .unwrap_or_else(|_| "60000".into())
            .parse()
            .map_err(|_| SettingsError::ParseError)?;

        Ok(Self {
            server: ServerSettings {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
                port,
            },
            engine: EngineSettings {
                window_capacity,
                report_interval_secs,
                liveness_timeout_secs,
                sweep_interval_ms,
            },
            bands: BandSettings {
                temp_low: parse_env_f64("TEMP_BAND_LOW", 0.0)?,
                temp_high: parse_env_f64("TEMP_BAND_HIGH", 30.0)?,
                humidity_low: parse_env_f64("HUMIDITY_BAND_LOW", 30.0)?,
                humidity_high: parse_env_f64("HUMIDITY_BAND_HIGH", 70.0)?,
            },
        })
    }

    /// Store configuration derived from these settings
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            window_capacity: self.engine.window_capacity,
            liveness_timeout: Duration::seconds(self.engine.liveness_timeout_secs as i64),
            default_temp_band: SafeBand::new(self.bands.temp_low, self.bands.temp_high),
            default_humidity_band: SafeBand::new(
                self.bands.humidity_low,
                self.bands.humidity_high,
            ),
        }
    }
}

fn parse_env_f64(key: &str, default: f64) -> Result<f64, SettingsError> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| SettingsError::ParseError),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests mutate process-wide environment variables; serialize them
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_settings() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var("SERVER_HOST");
        env::remove_var("SERVER_PORT");
        env::remove_var("WINDOW_CAPACITY");
        env::remove_var("REPORT_INTERVAL_SECS");
        env::remove_var("LIVENESS_TIMEOUT_SECS");
        env::remove_var("SWEEP_INTERVAL_MS");

        let settings = Settings::from_env().unwrap();

        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.engine.window_capacity, 24);
        // 10x the 60-second reporting interval
        assert_eq!(settings.engine.liveness_timeout_secs, 600);
        assert_eq!(settings.engine.sweep_interval_ms, 60_000);
        assert_eq!(settings.bands.temp_low, 0.0);
        assert_eq!(settings.bands.temp_high, 30.0);
    }

    #[test]
    fn test_custom_settings() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("SERVER_PORT", "3000");
        env::set_var("WINDOW_CAPACITY", "48");
        env::set_var("LIVENESS_TIMEOUT_SECS", "120");

        let settings = Settings::from_env().unwrap();

        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.engine.window_capacity, 48);
        assert_eq!(settings.engine.liveness_timeout_secs, 120);

        env::remove_var("SERVER_PORT");
        env::remove_var("WINDOW_CAPACITY");
        env::remove_var("LIVENESS_TIMEOUT_SECS");
    }

    #[test]
    fn test_store_config_conversion() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var("WINDOW_CAPACITY");
        env::remove_var("LIVENESS_TIMEOUT_SECS");
        env::remove_var("REPORT_INTERVAL_SECS");

        let settings = Settings::from_env().unwrap();
        let config = settings.store_config();

        assert_eq!(config.window_capacity, 24);
        assert_eq!(config.liveness_timeout.num_seconds(), 600);
        assert_eq!(config.default_temp_band.low, 0.0);
        assert_eq!(config.default_humidity_band.high, 70.0);
    }
}
