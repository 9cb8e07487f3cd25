//! Sensor store: record ownership and concurrent access arbitration
//!
//! The store owns every `SensorRecord` behind two lock scopes: the id map
//! is guarded by its own `RwLock`, held only long enough to look up,
//! insert, or remove an `Arc` handle; record contents are guarded by a
//! per-record `RwLock`, so ingestion for one sensor never blocks ingestion
//! for or queries of another. No lock is ever held across I/O.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::models::{Reading, RecordSnapshot, SafeBand, SensorKind, SensorStatus};
use crate::query::{self, SensorFilter, SortKey};
use crate::status::derive_status;
use crate::window::{RollingWindow, DEFAULT_WINDOW_CAPACITY};

/// Tunables governing windows, liveness, and default safe bands
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Readings retained per sensor
    pub window_capacity: usize,
    /// Maximum gap since the last reading before a sensor is offline
    pub liveness_timeout: Duration,
    /// Band applied to temperature/combined sensors registered without one
    pub default_temp_band: SafeBand,
    /// Band applied to humidity-only sensors registered without one
    pub default_humidity_band: SafeBand,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            // 10x the expected one-minute reporting interval
            liveness_timeout: Duration::seconds(600),
            default_temp_band: SafeBand::new(0.0, 30.0),
            default_humidity_band: SafeBand::new(30.0, 70.0),
        }
    }
}

impl StoreConfig {
    fn default_band_for(&self, kind: SensorKind) -> SafeBand {
        match kind {
            SensorKind::Humidity => self.default_humidity_band,
            SensorKind::Temperature | SensorKind::Combined => self.default_temp_band,
        }
    }
}

/// One sensor's identity, metadata, window, and derived status
///
/// Owned exclusively by the store; mutated only through `record()` and the
/// liveness sweep. Everything consumers see is a `RecordSnapshot` copy.
#[derive(Debug)]
struct SensorRecord {
    id: String,
    name: String,
    location: String,
    kind: SensorKind,
    safe_band: SafeBand,
    window: RollingWindow,
    last_reading: Option<Reading>,
    status: SensorStatus,
}

impl SensorRecord {
    fn new(
        id: String,
        name: String,
        location: String,
        kind: SensorKind,
        safe_band: SafeBand,
        window_capacity: usize,
    ) -> Self {
        Self {
            id,
            name,
            location,
            kind,
            safe_band,
            window: RollingWindow::new(window_capacity),
            last_reading: None,
            status: SensorStatus::Offline,
        }
    }

    fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            location: self.location.clone(),
            kind: self.kind,
            status: self.status,
            last_reading: self.last_reading,
            window_stats: self.window.stats(),
            window_series: self.window.snapshot(),
        }
    }
}

type RecordHandle = Arc<RwLock<SensorRecord>>;

/// Concurrent in-memory store of all registered sensors
///
/// Constructed once at process start and passed around as an
/// `Arc<SensorStore>` handle.
#[derive(Debug)]
pub struct SensorStore {
    sensors: RwLock<HashMap<String, RecordHandle>>,
    config: StoreConfig,
    started_at: DateTime<Utc>,
}

impl SensorStore {
    pub fn new(config: StoreConfig) -> Self {
        info!(
            window_capacity = config.window_capacity,
            liveness_timeout_secs = config.liveness_timeout.num_seconds(),
            "Initializing sensor store"
        );

        Self {
            sensors: RwLock::new(HashMap::new()),
            config,
            started_at: Utc::now(),
        }
    }

    /// Register a new sensor with an empty window and `offline` status
    ///
    /// A sensor registered without a safe band gets the configured default
    /// for its kind.
    pub async fn register(
        &self,
        id: &str,
        name: &str,
        location: &str,
        kind: SensorKind,
        safe_band: Option<SafeBand>,
    ) -> Result<(), StoreError> {
        let mut sensors = self.sensors.write().await;

        if sensors.contains_key(id) {
            return Err(StoreError::AlreadyExists(id.to_string()));
        }

        let band = safe_band.unwrap_or_else(|| self.config.default_band_for(kind));
        let record = SensorRecord::new(
            id.to_string(),
            name.to_string(),
            location.to_string(),
            kind,
            band,
            self.config.window_capacity,
        );
        sensors.insert(id.to_string(), Arc::new(RwLock::new(record)));

        info!(sensor_id = %id, kind = ?kind, "Sensor registered");
        Ok(())
    }

    /// Remove a sensor; snapshots already handed out are unaffected
    pub async fn deregister(&self, id: &str) -> Result<(), StoreError> {
        let mut sensors = self.sensors.write().await;

        match sensors.remove(id) {
            Some(_) => {
                info!(sensor_id = %id, "Sensor deregistered");
                Ok(())
            }
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    /// Apply one reading to a sensor
    ///
    /// Rejects timestamps strictly earlier than the latest accepted reading
    /// (late or duplicate delivery is refused rather than reordered, keeping
    /// per-sensor aggregates monotonic). A failed call leaves the record
    /// untouched. The window push, last-reading update, and status
    /// re-derivation happen under one record write lock, so readers never
    /// observe a half-applied reading.
    pub async fn record(&self, id: &str, reading: Reading) -> Result<(), StoreError> {
        let handle = self
            .lookup(id)
            .await
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut record = handle.write().await;

        if let Some(last) = &record.last_reading {
            if reading.timestamp < last.timestamp {
                return Err(StoreError::OutOfOrder {
                    sensor_id: id.to_string(),
                    incoming: reading.timestamp,
                    latest: last.timestamp,
                });
            }
        }

        record.window.push(reading);
        record.last_reading = Some(reading);
        // Status evaluated at the reading's own timestamp; wall-clock
        // staleness is the sweep's job
        let next = derive_status(
            Some(&reading),
            record.kind,
            record.safe_band,
            self.config.liveness_timeout,
            reading.timestamp,
        );
        record.status = next;

        debug!(
            sensor_id = %id,
            temperature = reading.temperature,
            status = ?record.status,
            window_len = record.window.len(),
            "Reading recorded"
        );

        Ok(())
    }

    /// Immutable copy of one sensor's observable state
    pub async fn get(&self, id: &str) -> Option<RecordSnapshot> {
        let handle = self.lookup(id).await?;
        let record = handle.read().await;
        Some(record.snapshot())
    }

    /// Snapshots of all sensors matching `filter`, deterministically ordered
    pub async fn list_all(&self, filter: &SensorFilter, sort: SortKey) -> Vec<RecordSnapshot> {
        let handles: Vec<RecordHandle> = {
            let sensors = self.sensors.read().await;
            sensors.values().cloned().collect()
        };

        let mut snapshots = Vec::with_capacity(handles.len());
        for handle in handles {
            let record = handle.read().await;
            let snapshot = record.snapshot();
            if filter.matches(&snapshot) {
                snapshots.push(snapshot);
            }
        }

        query::apply_sort(&mut snapshots, sort);
        snapshots
    }

    /// Fleet-wide statistics over a single consistent `list_all` snapshot
    pub async fn fleet_stats(&self) -> crate::models::FleetStats {
        let snapshots = self.list_all(&SensorFilter::default(), SortKey::Id).await;
        query::fleet_stats(&snapshots)
    }

    /// Re-derive every sensor's status against `now`
    ///
    /// Returns the number of sensors whose status changed. Idempotent: a
    /// second call with the same `now` and no intervening readings
    /// transitions nothing. Each record is re-evaluated under its own lock;
    /// the store-wide map lock is released before the first evaluation, so
    /// ingestion proceeds during a sweep over a large fleet. A sensor
    /// deregistered mid-sweep is skipped.
    pub async fn sweep_liveness(&self, now: DateTime<Utc>) -> usize {
        let ids: Vec<String> = {
            let sensors = self.sensors.read().await;
            sensors.keys().cloned().collect()
        };

        let mut transitioned = 0;
        for id in ids {
            let Some(handle) = self.lookup(&id).await else {
                warn!(sensor_id = %id, "Sensor removed mid-sweep, skipping");
                continue;
            };

            let mut record = handle.write().await;
            let next = derive_status(
                record.last_reading.as_ref(),
                record.kind,
                record.safe_band,
                self.config.liveness_timeout,
                now,
            );

            if next != record.status {
                debug!(
                    sensor_id = %id,
                    from = ?record.status,
                    to = ?next,
                    "Liveness sweep transitioned sensor"
                );
                record.status = next;
                transitioned += 1;
            }
        }

        transitioned
    }

    /// Number of registered sensors
    pub async fn count(&self) -> usize {
        self.sensors.read().await.len()
    }

    /// Seconds since the store was constructed
    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }

    async fn lookup(&self, id: &str) -> Option<RecordHandle> {
        self.sensors.read().await.get(id).cloned()
    }
}
