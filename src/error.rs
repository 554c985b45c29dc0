//! Errors surfaced by the core ingest and aggregation operations

use crate::storage::StorageError;

/// Error type for `record`, `daily_totals` and `baseline`.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Malformed or missing input. Reported to callers as a client error.
    #[error("validation error: {0}")]
    Validation(String),
    /// Connection, query or write failure in the observation log.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl MonitorError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
