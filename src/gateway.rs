//! Ingestion gateway: validation and normalization at the boundary
//!
//! Wraps whatever transport delivers raw samples. Everything is checked
//! here; the store never sees NaN, out-of-physical-range values, or
//! unparseable timestamps.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use validator::Validate;

use crate::error::StoreError;
use crate::models::Reading;
use crate::store::SensorStore;

/// Physical plausibility limits for incoming samples
pub struct SampleConstraints;

impl SampleConstraints {
    /// Sane terrestrial temperature range (Celsius)
    pub const TEMP_MIN: f64 = -90.0;
    pub const TEMP_MAX: f64 = 90.0;

    /// Relative humidity range (percentage)
    pub const HUMIDITY_MIN: f64 = 0.0;
    pub const HUMIDITY_MAX: f64 = 100.0;
}

/// Raw sample as delivered by a transport, before normalization
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RawSample {
    /// RFC 3339 timestamp; receive time is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Temperature must be between -90 and 90°C"))]
    pub temperature: f64,

    #[validate(range(min = 0.0, max = 100.0, message = "Humidity must be between 0 and 100%"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
}

/// Boundary between transports and the store
///
/// Cheap to clone; all clones share the same store handle.
#[derive(Clone)]
pub struct IngestionGateway {
    store: Arc<SensorStore>,
}

impl IngestionGateway {
    pub fn new(store: Arc<SensorStore>) -> Self {
        Self { store }
    }

    /// Validate and normalize a raw sample, then record it
    ///
    /// Returns the normalized reading on success so callers can echo it
    /// back. Malformed input fails with `InvalidValue` before the store is
    /// touched.
    pub async fn ingest(&self, sensor_id: &str, sample: RawSample) -> Result<Reading, StoreError> {
        let reading = normalize(&sample)?;
        self.store.record(sensor_id, reading).await?;

        debug!(
            sensor_id = %sensor_id,
            temperature = reading.temperature,
            "Sample ingested"
        );

        Ok(reading)
    }
}

/// Turn a raw sample into a `Reading`, rejecting anything malformed
pub fn normalize(sample: &RawSample) -> Result<Reading, StoreError> {
    if let Err(validation_errors) = sample.validate() {
        let messages: Vec<String> = validation_errors
            .field_errors()
            .iter()
            .map(|(field, errors)| {
                let msgs: Vec<&str> = errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|c| c.as_ref()))
                    .collect();
                format!("{}: {}", field, msgs.join(", "))
            })
            .collect();

        warn!(errors = ?messages, "Sample validation failed");
        return Err(StoreError::InvalidValue(messages.join("; ")));
    }

    // Additional semantic validation
    validate_temperature(sample.temperature)?;
    if let Some(humidity) = sample.humidity {
        validate_humidity(humidity)?;
    }

    let timestamp = parse_timestamp(sample.timestamp.as_deref())?;

    Ok(Reading::new(timestamp, sample.temperature, sample.humidity))
}

fn validate_temperature(value: f64) -> Result<(), StoreError> {
    if !value.is_finite() {
        return Err(StoreError::InvalidValue(
            "Temperature must be a finite number".to_string(),
        ));
    }

    if value < SampleConstraints::TEMP_MIN || value > SampleConstraints::TEMP_MAX {
        return Err(StoreError::InvalidValue(format!(
            "Temperature {} out of valid range [{}, {}]",
            value,
            SampleConstraints::TEMP_MIN,
            SampleConstraints::TEMP_MAX
        )));
    }

    Ok(())
}

fn validate_humidity(value: f64) -> Result<(), StoreError> {
    if !value.is_finite() {
        return Err(StoreError::InvalidValue(
            "Humidity must be a finite number".to_string(),
        ));
    }

    if value < SampleConstraints::HUMIDITY_MIN || value > SampleConstraints::HUMIDITY_MAX {
        return Err(StoreError::InvalidValue(format!(
            "Humidity {} out of valid range [{}, {}]",
            value,
            SampleConstraints::HUMIDITY_MIN,
            SampleConstraints::HUMIDITY_MAX
        )));
    }

    Ok(())
}

fn parse_timestamp(raw: Option<&str>) -> Result<DateTime<Utc>, StoreError> {
    match raw {
        Some(text) => DateTime::parse_from_rfc3339(text)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| {
                StoreError::InvalidValue(format!(
                    "timestamp '{text}' is not a valid RFC 3339 instant: {e}"
                ))
            }),
        None => Ok(Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SensorKind;
    use crate::store::StoreConfig;

    fn sample(timestamp: Option<&str>, temperature: f64, humidity: Option<f64>) -> RawSample {
        RawSample {
            timestamp: timestamp.map(|s| s.to_string()),
            temperature,
            humidity,
        }
    }

    #[test]
    fn test_normalize_valid_sample() {
        let reading =
            normalize(&sample(Some("2024-03-01T12:00:00Z"), 22.5, Some(60.0))).unwrap();

        assert_eq!(reading.temperature, 22.5);
        assert_eq!(reading.humidity, Some(60.0));
        assert_eq!(reading.timestamp.to_rfc3339(), "2024-03-01T12:00:00+00:00");
    }

    #[test]
    fn test_normalize_accepts_offset_timestamps() {
        let reading = normalize(&sample(Some("2024-03-01T09:00:00-03:00"), 20.0, None)).unwrap();
        assert_eq!(reading.timestamp.to_rfc3339(), "2024-03-01T12:00:00+00:00");
    }

    #[test]
    fn test_missing_timestamp_defaults_to_now() {
        let before = Utc::now();
        let reading = normalize(&sample(None, 20.0, None)).unwrap();
        let after = Utc::now();

        assert!(reading.timestamp >= before && reading.timestamp <= after);
    }

    #[test]
    fn test_out_of_range_temperature_rejected() {
        let result = normalize(&sample(None, 120.0, None));
        assert!(matches!(result, Err(StoreError::InvalidValue(_))));

        let result = normalize(&sample(None, -100.0, None));
        assert!(matches!(result, Err(StoreError::InvalidValue(_))));
    }

    #[test]
    fn test_out_of_range_humidity_rejected() {
        let result = normalize(&sample(None, 20.0, Some(150.0)));
        assert!(matches!(result, Err(StoreError::InvalidValue(_))));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        assert!(validate_temperature(f64::NAN).is_err());
        assert!(validate_temperature(f64::INFINITY).is_err());
        assert!(validate_humidity(f64::NEG_INFINITY).is_err());

        assert!(normalize(&sample(None, f64::NAN, None)).is_err());
        assert!(normalize(&sample(None, 20.0, Some(f64::NAN))).is_err());
    }

    #[test]
    fn test_garbage_timestamp_rejected() {
        let result = normalize(&sample(Some("yesterday at noon"), 20.0, None));
        assert!(matches!(result, Err(StoreError::InvalidValue(_))));
    }

    #[tokio::test]
    async fn test_invalid_sample_never_reaches_store() {
        let store = Arc::new(SensorStore::new(StoreConfig::default()));
        store
            .register("s1", "Sensor", "Lab", SensorKind::Combined, None)
            .await
            .unwrap();
        let gateway = IngestionGateway::new(store.clone());

        let result = gateway.ingest("s1", sample(None, f64::NAN, None)).await;
        assert!(matches!(result, Err(StoreError::InvalidValue(_))));

        // Store state untouched
        let snapshot = store.get("s1").await.unwrap();
        assert!(snapshot.window_series.is_empty());
    }

    #[tokio::test]
    async fn test_gateway_passes_store_errors_through() {
        let store = Arc::new(SensorStore::new(StoreConfig::default()));
        let gateway = IngestionGateway::new(store);

        let result = gateway.ingest("unknown", sample(None, 20.0, None)).await;
        assert_eq!(result, Err(StoreError::NotFound("unknown".to_string())));
    }

    #[tokio::test]
    async fn test_gateway_records_valid_sample() {
        let store = Arc::new(SensorStore::new(StoreConfig::default()));
        store
            .register("s1", "Sensor", "Lab", SensorKind::Combined, None)
            .await
            .unwrap();
        let gateway = IngestionGateway::new(store.clone());

        gateway
            .ingest("s1", sample(Some("2024-03-01T12:00:00Z"), 22.5, Some(55.0)))
            .await
            .unwrap();

        let snapshot = store.get("s1").await.unwrap();
        assert_eq!(snapshot.window_series.len(), 1);
        assert_eq!(snapshot.last_reading.unwrap().temperature, 22.5);
    }
}
