//! Behavior Monitor: activity tracking backend for a single subject
//!
//! Ingests timestamped position/activity samples and derives daily movement,
//! feeding, drinking and rest figures with trailing baselines.
//!
//! ## Architecture
//!
//! - **Ingest**: resolves each sample's distance from the preceding same-day row
//! - **Metrics**: per-day totals and baselines under the configured schema policy
//! - **Storage**: append-only observation log (sled, or in-memory for tests)
//! - **Advisory**: natural-language advice with a placeholder fallback
//! - **API**: axum HTTP endpoints

pub mod advisory;
pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod storage;
pub mod types;

pub use config::MonitorConfig;
pub use error::MonitorError;
pub use ingest::SampleIngestor;
pub use metrics::{AggregationRules, MetricsAggregator, ReferenceClock};
pub use storage::{InMemoryObservationLog, ObservationLog, SledObservationLog, StorageError};
pub use types::{
    ActiveFilter, ActivityFields, DailyReport, MetricTotals, Observation, Position, Sample,
    SchemaPolicy,
};
