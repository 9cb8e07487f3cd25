//! Sensor health classification
//!
//! One pure derivation function, called from exactly two places: the
//! store's `record` path (with the reading's own timestamp as "now") and
//! the periodic liveness sweep (with wall-clock "now"). Status is never
//! patched incrementally anywhere else.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Reading, SafeBand, SensorKind, SensorStatus};

/// Classify a sensor from its latest reading and the evaluation instant
///
/// - `offline`: no reading yet, or the latest one is older than the
///   liveness timeout relative to `now`.
/// - `warning`: live, but the classified value falls outside the safe
///   band. Humidity-only sensors are classified on humidity; a humidity
///   sensor whose latest reading carries no humidity value is `warning`.
/// - `online`: live and within the band.
pub fn derive_status(
    last_reading: Option<&Reading>,
    kind: SensorKind,
    safe_band: SafeBand,
    liveness_timeout: Duration,
    now: DateTime<Utc>,
) -> SensorStatus {
    let Some(reading) = last_reading else {
        return SensorStatus::Offline;
    };

    if now - reading.timestamp > liveness_timeout {
        return SensorStatus::Offline;
    }

    let value = match kind {
        SensorKind::Humidity => match reading.humidity {
            Some(humidity) => humidity,
            None => return SensorStatus::Warning,
        },
        SensorKind::Temperature | SensorKind::Combined => reading.temperature,
    };

    if safe_band.contains(value) {
        SensorStatus::Online
    } else {
        SensorStatus::Warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const TIMEOUT_SECS: i64 = 600;

    fn band() -> SafeBand {
        SafeBand::new(0.0, 30.0)
    }

    fn reading(temperature: f64, humidity: Option<f64>) -> Reading {
        Reading::new(Utc.timestamp_opt(1_000_000, 0).unwrap(), temperature, humidity)
    }

    #[test]
    fn test_no_reading_is_offline() {
        let status = derive_status(
            None,
            SensorKind::Combined,
            band(),
            Duration::seconds(TIMEOUT_SECS),
            Utc::now(),
        );
        assert_eq!(status, SensorStatus::Offline);
    }

    #[test]
    fn test_stale_reading_is_offline_regardless_of_value() {
        let r = reading(20.0, None);
        let now = r.timestamp + Duration::seconds(TIMEOUT_SECS) + Duration::milliseconds(1);

        let status = derive_status(
            Some(&r),
            SensorKind::Temperature,
            band(),
            Duration::seconds(TIMEOUT_SECS),
            now,
        );
        assert_eq!(status, SensorStatus::Offline);
    }

    #[test]
    fn test_reading_at_exact_timeout_is_still_live() {
        let r = reading(20.0, None);
        let now = r.timestamp + Duration::seconds(TIMEOUT_SECS);

        let status = derive_status(
            Some(&r),
            SensorKind::Temperature,
            band(),
            Duration::seconds(TIMEOUT_SECS),
            now,
        );
        assert_eq!(status, SensorStatus::Online);
    }

    #[test]
    fn test_live_out_of_band_is_warning() {
        let r = reading(35.0, None);
        let now = r.timestamp + Duration::milliseconds(1);

        let status = derive_status(
            Some(&r),
            SensorKind::Combined,
            band(),
            Duration::seconds(TIMEOUT_SECS),
            now,
        );
        assert_eq!(status, SensorStatus::Warning);
    }

    #[test]
    fn test_live_in_band_is_online() {
        let r = reading(20.0, None);
        let now = r.timestamp + Duration::milliseconds(1);

        let status = derive_status(
            Some(&r),
            SensorKind::Combined,
            band(),
            Duration::seconds(TIMEOUT_SECS),
            now,
        );
        assert_eq!(status, SensorStatus::Online);
    }

    #[test]
    fn test_refrigeration_band_differs_from_office_band() {
        // A cold-storage sensor reading -18°C is healthy inside its own band
        let r = reading(-18.5, Some(85.1));
        let now = r.timestamp + Duration::seconds(60);
        let cold_band = SafeBand::new(-25.0, -15.0);

        let status = derive_status(
            Some(&r),
            SensorKind::Combined,
            cold_band,
            Duration::seconds(TIMEOUT_SECS),
            now,
        );
        assert_eq!(status, SensorStatus::Online);
    }

    #[test]
    fn test_humidity_sensor_classified_on_humidity() {
        let humidity_band = SafeBand::new(30.0, 70.0);
        let r = reading(22.0, Some(85.0));
        let now = r.timestamp + Duration::seconds(1);

        let status = derive_status(
            Some(&r),
            SensorKind::Humidity,
            humidity_band,
            Duration::seconds(TIMEOUT_SECS),
            now,
        );
        assert_eq!(status, SensorStatus::Warning);

        let r = reading(22.0, Some(55.0));
        let status = derive_status(
            Some(&r),
            SensorKind::Humidity,
            humidity_band,
            Duration::seconds(TIMEOUT_SECS),
            now,
        );
        assert_eq!(status, SensorStatus::Online);
    }

    #[test]
    fn test_humidity_sensor_without_humidity_value_is_warning() {
        let r = reading(22.0, None);
        let now = r.timestamp + Duration::seconds(1);

        let status = derive_status(
            Some(&r),
            SensorKind::Humidity,
            SafeBand::new(30.0, 70.0),
            Duration::seconds(TIMEOUT_SECS),
            now,
        );
        assert_eq!(status, SensorStatus::Warning);
    }
}
