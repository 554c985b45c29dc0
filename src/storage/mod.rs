//! Observation Log Storage
//!
//! Append-only, timestamp-ordered log of observations behind the
//! [`ObservationLog`] trait:
//! - `SledObservationLog`: persistent backend (production)
//! - `InMemoryObservationLog`: volatile backend for tests and demos
//!
//! Backends are synchronous. Async callers go through [`run_blocking`], which
//! moves the call onto the blocking pool and bounds it with a timeout.

mod memory;
mod sled_log;

pub use memory::InMemoryObservationLog;
pub use sled_log::SledObservationLog;

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::types::{Observation, Sample};

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),
    #[error("storage task failed: {0}")]
    TaskFailed(String),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Ordered, timestamp-queryable append-only log of observations.
///
/// Ordering is by `(timestamp, id)`, so rows sharing a timestamp keep
/// insertion order. Implementations must be thread-safe (Send + Sync).
pub trait ObservationLog: Send + Sync {
    /// Assign the next id and append the sample with its computed distance.
    fn append(&self, sample: &Sample, distance: f64) -> Result<Observation, StorageError>;

    /// Last row with `from <= timestamp < before`; the last-inserted wins on ties.
    fn latest_before(
        &self,
        from: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> Result<Option<Observation>, StorageError>;

    /// All rows with `start <= timestamp < end`, oldest first.
    fn range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>, StorageError>;

    /// Rows carrying a position, newest first, after skipping `offset` of them.
    fn recent_positions(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Observation>, StorageError>;

    /// Total number of stored rows.
    fn count(&self) -> usize;

    /// Check that the backend is reachable.
    fn ping(&self) -> Result<(), StorageError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Run a synchronous storage call on the blocking pool, bounded by `timeout`.
///
/// On expiry the caller gets [`StorageError::Timeout`]; the call itself is not
/// cancelled and may still complete in the background.
pub async fn run_blocking<T, F>(timeout: Duration, call: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(call)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(StorageError::TaskFailed(join_err.to_string())),
        Err(_) => Err(StorageError::Timeout(timeout)),
    }
}
