//! Sample Ingestor
//!
//! Resolves one raw sample into a stored observation. The distance is taken
//! from the most recent earlier observation of the same reference-timezone
//! day, so every day forms its own chain starting at zero.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::MonitorError;
use crate::metrics::{step_distance, ReferenceClock};
use crate::storage::{run_blocking, ObservationLog};
use crate::types::{ActivityFields, Observation, Sample, SchemaPolicy};

/// Writes samples to the observation log.
///
/// `record` calls are serialized by an async write gate: the predecessor
/// lookup and the append happen as one step with respect to other writers in
/// this process.
pub struct SampleIngestor {
    log: Arc<dyn ObservationLog>,
    clock: ReferenceClock,
    schema: SchemaPolicy,
    timeout: Duration,
    write_gate: Mutex<()>,
}

impl SampleIngestor {
    pub fn new(
        log: Arc<dyn ObservationLog>,
        clock: ReferenceClock,
        schema: SchemaPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            log,
            clock,
            schema,
            timeout,
            write_gate: Mutex::new(()),
        }
    }

    pub const fn schema(&self) -> SchemaPolicy {
        self.schema
    }

    pub const fn clock(&self) -> &ReferenceClock {
        &self.clock
    }

    /// Store `sample` with its distance from the preceding same-day row.
    ///
    /// A failed lookup never proceeds to the append. Nothing is retried.
    ///
    /// A [`StorageError::Timeout`](crate::storage::StorageError::Timeout) only
    /// means the caller stopped waiting: the blocking append may still land
    /// afterwards, so resubmitting the same sample can store it twice.
    pub async fn record(&self, sample: Sample) -> Result<Observation, MonitorError> {
        self.check(&sample)?;
        let day_start = self
            .clock
            .day_of(sample.timestamp)
            .and_then(|day| self.clock.day_bounds(day))
            .map(|(start, _)| start)
            .ok_or_else(|| {
                MonitorError::validation(format!(
                    "timestamp {} is out of range",
                    sample.timestamp
                ))
            })?;

        let _gate = self.write_gate.lock().await;

        let before = sample.timestamp;

        let log = Arc::clone(&self.log);
        let previous = run_blocking(self.timeout, move || log.latest_before(day_start, before))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, timestamp = %before, "Predecessor lookup failed");
                e
            })?;

        let distance = step_distance(previous.and_then(|p| p.position), sample.position);

        let log = Arc::clone(&self.log);
        let observation = run_blocking(self.timeout, move || log.append(&sample, distance))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, timestamp = %before, "Append failed");
                e
            })?;

        tracing::info!(
            id = observation.id,
            timestamp = %observation.timestamp,
            distance = observation.distance,
            detected = observation.detected,
            "Recorded observation"
        );
        Ok(observation)
    }

    /// Schema and value checks shared by every caller.
    fn check(&self, sample: &Sample) -> Result<(), MonitorError> {
        if sample.activity.schema() != self.schema {
            return Err(MonitorError::validation(format!(
                "activity fields use the {} schema but this deployment stores {}",
                sample.activity.schema(),
                self.schema
            )));
        }

        if let Some(p) = sample.position {
            if !p.is_finite() {
                return Err(MonitorError::validation("position must be finite"));
            }
        }

        if let ActivityFields::Magnitudes {
            home_data,
            eating_data,
            drinking_data,
        } = sample.activity
        {
            for (name, value) in [
                ("home_data", home_data),
                ("eating_data", eating_data),
                ("drinking_data", drinking_data),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(MonitorError::validation(format!(
                        "{name} must be a finite, non-negative number"
                    )));
                }
            }
        }
        Ok(())
    }
}
