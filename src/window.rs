//! Fixed-capacity rolling window with incrementally maintained statistics
//!
//! Each sensor keeps the most recent N readings in ring-buffer order.
//! `count`, `sum`, `min`, and `max` are maintained on every push instead of
//! being recomputed by scanning the window; the only O(N) path is a rescan
//! of the remaining elements when the evicted reading was itself the
//! current extremum.

use std::collections::VecDeque;

use crate::models::{round1, Reading, WindowStats};

/// Default number of retained readings (one per hour of history)
pub const DEFAULT_WINDOW_CAPACITY: usize = 24;

#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    readings: VecDeque<Reading>,
    sum: f64,
    min: f64,
    max: f64,
}

impl RollingWindow {
    /// Create an empty window holding at most `capacity` readings
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be at least 1");

        Self {
            capacity,
            readings: VecDeque::with_capacity(capacity),
            sum: 0.0,
            min: f64::MAX,
            max: f64::MIN,
        }
    }

    /// Append a reading, evicting the oldest one when at capacity
    ///
    /// Never fails for a well-formed reading.
    pub fn push(&mut self, reading: Reading) {
        if self.readings.len() == self.capacity {
            if let Some(evicted) = self.readings.pop_front() {
                self.sum -= evicted.temperature;
                if evicted.temperature <= self.min || evicted.temperature >= self.max {
                    self.rescan_extrema();
                }
            }
        }

        let temperature = reading.temperature;
        if self.readings.is_empty() {
            self.min = temperature;
            self.max = temperature;
        } else {
            if temperature < self.min {
                self.min = temperature;
            }
            if temperature > self.max {
                self.max = temperature;
            }
        }

        self.sum += temperature;
        self.readings.push_back(reading);
    }

    /// Copy of the window contents in chronological order (oldest first)
    pub fn snapshot(&self) -> Vec<Reading> {
        self.readings.iter().copied().collect()
    }

    /// Aggregate statistics, or `None` while the window is empty
    pub fn stats(&self) -> Option<WindowStats> {
        if self.is_empty() {
            return None;
        }

        Some(WindowStats {
            min: self.min,
            max: self.max,
            avg: round1(self.sum / self.readings.len() as f64),
        })
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    fn rescan_extrema(&mut self) {
        self.min = self
            .readings
            .iter()
            .map(|r| r.temperature)
            .fold(f64::MAX, f64::min);
        self.max = self
            .readings
            .iter()
            .map(|r| r.temperature)
            .fold(f64::MIN, f64::max);
    }
}
