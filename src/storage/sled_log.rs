//! Sled-backed observation log
//!
//! Rows live in the `observations` tree.
//! Key: order-preserving timestamp (micros, 8 bytes BE) followed by the id (8 bytes BE)
//! Value: JSON-serialized Observation

use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

use super::{ObservationLog, StorageError};
use crate::types::{Observation, Sample};

const OBSERVATIONS_TREE: &str = "observations";

/// Persistent observation log
#[derive(Clone)]
pub struct SledObservationLog {
    db: Arc<sled::Db>,
    tree: sled::Tree,
}

impl SledObservationLog {
    /// Open or create the log at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)?;
        let tree = db.open_tree(OBSERVATIONS_TREE)?;

        tracing::info!(path = %path_ref.display(), rows = tree.len(), "Observation log opened");

        Ok(Self {
            db: Arc::new(db),
            tree,
        })
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

/// Encode `(timestamp, id)` so byte order equals chronological order.
///
/// Flipping the sign bit maps i64 micros onto u64 without breaking ordering
/// for pre-epoch timestamps.
fn row_key(timestamp: DateTime<Utc>, id: u64) -> [u8; 16] {
    #[allow(clippy::cast_sign_loss)]
    let ts = (timestamp.timestamp_micros() as u64) ^ (1u64 << 63);
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&ts.to_be_bytes());
    key[8..].copy_from_slice(&id.to_be_bytes());
    key
}

fn decode(value: &[u8]) -> Result<Observation, StorageError> {
    Ok(serde_json::from_slice(value)?)
}

impl ObservationLog for SledObservationLog {
    /// Note: Does not call flush() on each write.
    /// Sled provides durability via background flushing.
    fn append(&self, sample: &Sample, distance: f64) -> Result<Observation, StorageError> {
        let id = self.db.generate_id()?;
        let observation = Observation::from_sample(id, sample, distance);
        let value = serde_json::to_vec(&observation)?;

        self.tree.insert(row_key(observation.timestamp, id), value)?;

        tracing::debug!(id, timestamp = %observation.timestamp, distance, "Appended observation");
        Ok(observation)
    }

    fn latest_before(
        &self,
        from: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> Result<Option<Observation>, StorageError> {
        if before <= from {
            return Ok(None);
        }
        // id 0 as the exclusive upper bound drops every row stamped exactly `before`
        match self.tree.range(row_key(from, 0)..row_key(before, 0)).next_back() {
            Some(item) => {
                let (_key, value) = item?;
                Ok(Some(decode(&value)?))
            }
            None => Ok(None),
        }
    }

    fn range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>, StorageError> {
        if end <= start {
            return Ok(Vec::new());
        }

        let mut rows = Vec::new();
        for item in self.tree.range(row_key(start, 0)..row_key(end, 0)) {
            let (_key, value) = item?;
            rows.push(decode(&value)?);
        }
        Ok(rows)
    }

    fn recent_positions(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Observation>, StorageError> {
        let mut rows = Vec::with_capacity(limit);
        let mut skipped = 0;

        // Iterate in reverse order (newest first)
        for item in self.tree.iter().rev() {
            if rows.len() >= limit {
                break;
            }

            let (_key, value) = item?;
            let observation = decode(&value)?;
            if observation.position.is_none() {
                continue;
            }
            if skipped < offset {
                skipped += 1;
                continue;
            }
            rows.push(observation);
        }

        Ok(rows)
    }

    fn count(&self) -> usize {
        self.tree.len()
    }

    fn ping(&self) -> Result<(), StorageError> {
        self.tree.first()?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActivityFields;
    use chrono::{Duration, TimeZone};

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    fn sample_at(t: DateTime<Utc>, x: f64) -> Sample {
        Sample::new(t, ActivityFields::no_flags()).with_position(x, 0.0)
    }

    #[test]
    fn test_storage_open() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log = SledObservationLog::open(temp_dir.path().join("obs.db")).unwrap();
        assert_eq!(log.count(), 0);
        assert!(log.ping().is_ok());
        assert_eq!(log.backend_name(), "sled");
    }

    #[test]
    fn test_row_key_orders_pre_epoch() {
        let before = Utc.with_ymd_and_hms(1960, 1, 1, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(1980, 1, 1, 0, 0, 0).unwrap();
        assert!(row_key(before, 9) < row_key(after, 0));
        assert!(row_key(after, 1) < row_key(after, 2));
    }

    #[test]
    fn test_append_assigns_increasing_ids() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log = SledObservationLog::open(temp_dir.path().join("obs.db")).unwrap();

        let a = log.append(&sample_at(ts(1, 0), 0.0), 0.0).unwrap();
        let b = log.append(&sample_at(ts(2, 0), 1.0), 1.0).unwrap();
        assert!(b.id > a.id);
        assert_eq!(log.count(), 2);
    }

    #[test]
    fn test_latest_before_is_strict_and_prefers_last_inserted() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log = SledObservationLog::open(temp_dir.path().join("obs.db")).unwrap();

        log.append(&sample_at(ts(1, 0), 1.0), 0.0).unwrap();
        log.append(&sample_at(ts(1, 0), 2.0), 0.0).unwrap();
        log.append(&sample_at(ts(2, 0), 3.0), 0.0).unwrap();

        let day_start = ts(0, 0);
        let prev = log.latest_before(day_start, ts(2, 0)).unwrap().unwrap();
        assert_eq!(prev.position.unwrap().x, 2.0);

        let prev = log.latest_before(day_start, ts(3, 0)).unwrap().unwrap();
        assert_eq!(prev.position.unwrap().x, 3.0);

        assert!(log.latest_before(day_start, ts(1, 0)).unwrap().is_none());
        assert!(log.latest_before(ts(1, 30), ts(2, 0)).unwrap().is_none());
    }

    #[test]
    fn test_range_is_half_open_and_chronological() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log = SledObservationLog::open(temp_dir.path().join("obs.db")).unwrap();

        // Store out of order
        log.append(&sample_at(ts(3, 0), 3.0), 0.0).unwrap();
        log.append(&sample_at(ts(1, 0), 1.0), 0.0).unwrap();
        log.append(&sample_at(ts(2, 0), 2.0), 0.0).unwrap();

        let rows = log.range(ts(1, 0), ts(3, 0)).unwrap();
        let xs: Vec<f64> = rows.iter().map(|r| r.position.unwrap().x).collect();
        assert_eq!(xs, vec![1.0, 2.0]);

        assert!(log.range(ts(3, 0), ts(3, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_recent_positions_skips_category_only_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log = SledObservationLog::open(temp_dir.path().join("obs.db")).unwrap();

        for i in 0..12i32 {
            let t = ts(0, 0) + Duration::minutes(i64::from(i));
            log.append(&sample_at(t, f64::from(i)), 0.0).unwrap();
        }
        log.append(&Sample::new(ts(5, 0), ActivityFields::no_flags()), 0.0)
            .unwrap();

        let recent = log.recent_positions(0, 10).unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].position.unwrap().x, 11.0);

        let skipped = log.recent_positions(1, 10).unwrap();
        assert_eq!(skipped[0].position.unwrap().x, 10.0);
    }

    #[test]
    fn test_rows_survive_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("obs.db");
        {
            let log = SledObservationLog::open(&path).unwrap();
            log.append(&sample_at(ts(1, 0), 1.0), 0.5).unwrap();
            log.flush().unwrap();
        }

        let log = SledObservationLog::open(&path).unwrap();
        let rows = log.range(ts(0, 0), ts(23, 0)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].distance, 0.5);
    }
}
