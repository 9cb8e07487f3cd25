//! Periodic liveness sweep
//!
//! Absence of data is itself a status trigger, so a background task
//! re-evaluates every sensor on a fixed cadence, catching transitions to
//! `offline` that no `record()` call would ever observe. The sweep locks
//! one record at a time and stops promptly on shutdown; because each
//! record's update is atomic, cancellation can never leave partial state.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

use crate::store::SensorStore;

pub struct LivenessSweeper {
    store: Arc<SensorStore>,
    interval_ms: u64,
}

impl LivenessSweeper {
    pub fn new(store: Arc<SensorStore>, interval_ms: u64) -> Self {
        Self { store, interval_ms }
    }

    /// Sweep until the shutdown channel fires
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_ms = self.interval_ms,
            "Starting liveness sweep loop"
        );

        let mut tick = interval(Duration::from_millis(self.interval_ms));

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let transitioned = self.store.sweep_liveness(Utc::now()).await;
                    if transitioned > 0 {
                        info!(transitioned, "Liveness sweep reclassified sensors");
                    } else {
                        debug!("Liveness sweep found no transitions");
                    }
                }
                _ = shutdown.changed() => {
                    info!("Liveness sweeper shutting down");
                    break;
                }
            }
        }
    }
}
