//! Read-only projections over store snapshots
//!
//! Fleet-wide statistics and the filter/sort vocabulary for sensor lists.
//! Every function here is pure and operates on one `Vec<RecordSnapshot>`
//! taken from a single `list_all` call, so each computed figure is
//! internally consistent even while ingestion continues.

use std::cmp::Ordering;

use serde::Deserialize;

use crate::models::{round1, FleetStats, RecordSnapshot, SensorStatus};

/// Predicate applied to each snapshot by `SensorStore::list_all`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SensorFilter {
    /// Keep only sensors with this status
    pub status: Option<SensorStatus>,
    /// Case-insensitive substring match on name or location
    pub search: Option<String>,
}

impl SensorFilter {
    pub fn matches(&self, snapshot: &RecordSnapshot) -> bool {
        if let Some(status) = self.status {
            if snapshot.status != status {
                return false;
            }
        }

        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let in_name = snapshot.name.to_lowercase().contains(&term);
            let in_location = snapshot.location.to_lowercase().contains(&term);
            if !in_name && !in_location {
                return false;
            }
        }

        true
    }
}

/// Sort order for sensor listings; ties always break by id ascending
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Id,
    Name,
    Location,
    /// Latest temperature; sensors without readings sort last
    Temperature,
}

pub fn apply_sort(snapshots: &mut [RecordSnapshot], key: SortKey) {
    match key {
        SortKey::Id => snapshots.sort_by(|a, b| a.id.cmp(&b.id)),
        SortKey::Name => {
            snapshots.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)))
        }
        SortKey::Location => {
            snapshots.sort_by(|a, b| a.location.cmp(&b.location).then_with(|| a.id.cmp(&b.id)))
        }
        SortKey::Temperature => snapshots.sort_by(|a, b| {
            let ta = a.last_reading.map(|r| r.temperature);
            let tb = b.last_reading.map(|r| r.temperature);
            match (ta, tb) {
                (Some(x), Some(y)) => x
                    .partial_cmp(&y)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.id.cmp(&b.id),
            }
        }),
    }
}

pub fn total_count(snapshots: &[RecordSnapshot]) -> usize {
    snapshots.len()
}

pub fn count_by_status(snapshots: &[RecordSnapshot], status: SensorStatus) -> usize {
    snapshots.iter().filter(|s| s.status == status).count()
}

/// Equal-weighted mean of per-sensor window averages
///
/// Sensors with empty windows are excluded; `None` when no sensor has data.
pub fn avg_temperature(snapshots: &[RecordSnapshot]) -> Option<f64> {
    let averages: Vec<f64> = snapshots
        .iter()
        .filter_map(|s| s.window_stats.map(|w| w.avg))
        .collect();

    if averages.is_empty() {
        return None;
    }

    Some(round1(averages.iter().sum::<f64>() / averages.len() as f64))
}

/// Minimum across all sensors' window minima
pub fn min_temperature(snapshots: &[RecordSnapshot]) -> Option<f64> {
    snapshots
        .iter()
        .filter_map(|s| s.window_stats.map(|w| w.min))
        .reduce(f64::min)
}

/// Maximum across all sensors' window maxima
pub fn max_temperature(snapshots: &[RecordSnapshot]) -> Option<f64> {
    snapshots
        .iter()
        .filter_map(|s| s.window_stats.map(|w| w.max))
        .reduce(f64::max)
}

/// All fleet statistics from one snapshot set
pub fn fleet_stats(snapshots: &[RecordSnapshot]) -> FleetStats {
    FleetStats {
        total: total_count(snapshots),
        online: count_by_status(snapshots, SensorStatus::Online),
        warning: count_by_status(snapshots, SensorStatus::Warning),
        offline: count_by_status(snapshots, SensorStatus::Offline),
        avg_temperature: avg_temperature(snapshots),
        min_temperature: min_temperature(snapshots),
        max_temperature: max_temperature(snapshots),
    }
}
