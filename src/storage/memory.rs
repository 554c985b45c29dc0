//! In-memory observation log for tests and ephemeral deployments
//!
//! Thread-safe via `RwLock`. Not durable, data is lost on restart.

use chrono::{DateTime, Utc};
use std::sync::RwLock;

use super::{ObservationLog, StorageError};
use crate::types::{Observation, Sample};

#[derive(Default)]
struct Inner {
    /// Sorted by `(timestamp, id)`
    rows: Vec<Observation>,
    next_id: u64,
}

/// Volatile observation log
#[derive(Default)]
pub struct InMemoryObservationLog {
    inner: RwLock<Inner>,
}

impl InMemoryObservationLog {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> StorageError {
    StorageError::Database(e.to_string())
}

impl ObservationLog for InMemoryObservationLog {
    fn append(&self, sample: &Sample, distance: f64) -> Result<Observation, StorageError> {
        let mut inner = self.inner.write().map_err(poisoned)?;

        let id = inner.next_id;
        inner.next_id += 1;

        let observation = Observation::from_sample(id, sample, distance);
        // Ids only grow, so anything at the same timestamp sorts before us
        let at = inner
            .rows
            .partition_point(|r| r.timestamp <= observation.timestamp);
        inner.rows.insert(at, observation.clone());

        Ok(observation)
    }

    fn latest_before(
        &self,
        from: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> Result<Option<Observation>, StorageError> {
        let inner = self.inner.read().map_err(poisoned)?;
        let end = inner.rows.partition_point(|r| r.timestamp < before);

        Ok(inner.rows[..end]
            .last()
            .filter(|r| r.timestamp >= from)
            .cloned())
    }

    fn range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>, StorageError> {
        let inner = self.inner.read().map_err(poisoned)?;
        let lo = inner.rows.partition_point(|r| r.timestamp < start);
        let hi = inner.rows.partition_point(|r| r.timestamp < end);

        Ok(if lo < hi {
            inner.rows[lo..hi].to_vec()
        } else {
            Vec::new()
        })
    }

    fn recent_positions(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Observation>, StorageError> {
        let inner = self.inner.read().map_err(poisoned)?;

        Ok(inner
            .rows
            .iter()
            .rev()
            .filter(|r| r.position.is_some())
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    fn count(&self) -> usize {
        self.inner.read().map(|i| i.rows.len()).unwrap_or(0)
    }

    fn ping(&self) -> Result<(), StorageError> {
        self.inner.read().map(|_| ()).map_err(poisoned)
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActivityFields;
    use chrono::TimeZone;

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, 0, 0).unwrap()
    }

    fn sample_at(t: DateTime<Utc>, x: f64) -> Sample {
        Sample::new(t, ActivityFields::no_flags()).with_position(x, 0.0)
    }

    #[test]
    fn test_out_of_order_inserts_stay_sorted() {
        let log = InMemoryObservationLog::new();
        log.append(&sample_at(ts(3), 3.0), 0.0).unwrap();
        log.append(&sample_at(ts(1), 1.0), 0.0).unwrap();
        log.append(&sample_at(ts(2), 2.0), 0.0).unwrap();

        let rows = log.range(ts(0), ts(23)).unwrap();
        let xs: Vec<f64> = rows.iter().map(|r| r.position.unwrap().x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_latest_before_matches_sled_semantics() {
        let log = InMemoryObservationLog::new();
        log.append(&sample_at(ts(1), 1.0), 0.0).unwrap();
        log.append(&sample_at(ts(1), 2.0), 0.0).unwrap();
        log.append(&sample_at(ts(2), 3.0), 0.0).unwrap();

        let prev = log.latest_before(ts(0), ts(2)).unwrap().unwrap();
        assert_eq!(prev.position.unwrap().x, 2.0);
        assert!(log.latest_before(ts(0), ts(1)).unwrap().is_none());
        assert!(log.latest_before(ts(2), ts(3)).unwrap().unwrap().id == 2);
    }

    #[test]
    fn test_recent_positions_with_offset() {
        let log = InMemoryObservationLog::new();
        log.append(&sample_at(ts(1), 1.0), 0.0).unwrap();
        log.append(&Sample::new(ts(2), ActivityFields::no_flags()), 0.0)
            .unwrap();
        log.append(&sample_at(ts(3), 3.0), 0.0).unwrap();

        let recent = log.recent_positions(0, 10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].position.unwrap().x, 3.0);

        let rest = log.recent_positions(1, 10).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].position.unwrap().x, 1.0);
        assert_eq!(log.count(), 3);
    }
}
