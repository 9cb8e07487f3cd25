//! Data models for sensor telemetry and derived snapshots
//!
//! Defines the core data structures used throughout the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped sample from a sensor
///
/// Immutable once constructed; humidity is absent for temperature-only
/// sensors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// ISO 8601 timestamp of the sample
    pub timestamp: DateTime<Utc>,

    /// Temperature in degrees Celsius
    pub temperature: f64,

    /// Relative humidity in percent, when the sensor reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, temperature: f64, humidity: Option<f64>) -> Self {
        Self {
            timestamp,
            temperature,
            humidity,
        }
    }
}

/// What a sensor measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Temperature,
    Humidity,
    Combined,
}

/// Derived health classification of a sensor
///
/// Never set directly; always recomputed from the latest reading and the
/// liveness timeout (see `status::derive_status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Online,
    Warning,
    Offline,
}

/// Inclusive value range considered healthy for a sensor
///
/// Interpreted against temperature for temperature/combined sensors and
/// against humidity for humidity-only sensors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeBand {
    pub low: f64,
    pub high: f64,
}

impl SafeBand {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Aggregate statistics over one sensor's rolling window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub min: f64,
    pub max: f64,
    /// Mean temperature, rounded to one decimal place
    pub avg: f64,
}

/// Immutable point-in-time copy of a sensor record's observable state
///
/// Snapshots share no storage with the live record, so holding one across
/// concurrent ingestion is always safe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub id: String,
    pub name: String,
    pub location: String,
    pub kind: SensorKind,
    pub status: SensorStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reading: Option<Reading>,

    /// Absent while the window is empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_stats: Option<WindowStats>,

    /// Window contents, ordered oldest to newest
    pub window_series: Vec<Reading>,
}

/// Fleet-wide dashboard statistics computed over a single consistent
/// snapshot of the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetStats {
    pub total: usize,
    pub online: usize,
    pub warning: usize,
    pub offline: usize,

    /// Mean of per-sensor window averages; absent when no sensor has data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_temperature: Option<f64>,
}

/// WebSocket message types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    /// Fleet statistics changed since the last push
    FleetUpdate(FleetStats),
    /// Connection acknowledgment
    Connected { client_id: String },
    /// Error message
    Error { message: String },
    /// Heartbeat/ping
    Ping,
    /// Heartbeat/pong response
    Pong,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub total_sensors: usize,
}

/// Round to one decimal place, the precision served to dashboards
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
