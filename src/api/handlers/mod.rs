//! API route handlers
//!
//! - `tracking`: sample ingestion and movement queries
//! - `activity`: feed / drink / rest totals against the baseline
//! - `advice`: advisory text for today
//! - `status`: liveness page and JSON health

mod activity;
mod advice;
mod status;
mod tracking;

pub use activity::*;
pub use advice::*;
pub use status::*;
pub use tracking::*;

use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::error::ApiError;
use crate::advisory::{AdvisoryGenerator, AdvisoryService};
use crate::config::MonitorConfig;
use crate::ingest::SampleIngestor;
use crate::metrics::MetricsAggregator;
use crate::storage::ObservationLog;
use crate::types::SchemaPolicy;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub ingestor: Arc<SampleIngestor>,
    pub aggregator: MetricsAggregator,
    pub advisory: AdvisoryService,
    /// Direct log handle for recent positions and health checks
    pub log: Arc<dyn ObservationLog>,
    pub storage_timeout: Duration,
    /// Suffix for formatted movement figures
    pub movement_unit: String,
    pub started_at: Instant,
}

impl ApiState {
    /// Wire every component from one configuration and one log.
    pub fn from_config(
        config: &MonitorConfig,
        log: Arc<dyn ObservationLog>,
        generator: Arc<dyn AdvisoryGenerator>,
    ) -> Self {
        let clock = config.clock();
        let timeout = config.storage_timeout();

        let ingestor = SampleIngestor::new(
            Arc::clone(&log),
            clock,
            config.metrics.schema,
            timeout,
        );
        let aggregator = MetricsAggregator::new(Arc::clone(&log), clock, config.rules(), timeout)
            .with_window_days(config.metrics.baseline_window_days);
        let advisory = AdvisoryService::new(generator, config.advisory_timeout())
            .with_placeholder(config.advisory.placeholder.clone());

        Self {
            ingestor: Arc::new(ingestor),
            aggregator,
            advisory,
            log,
            storage_timeout: timeout,
            movement_unit: config.metrics.movement_unit.clone(),
            started_at: Instant::now(),
        }
    }

    pub fn schema(&self) -> SchemaPolicy {
        self.aggregator.rules().schema
    }
}

// ============================================================================
// Shared query parameters
// ============================================================================

/// `?date=YYYY-MM-DD` (or `?query_date=`), defaulting to today.
#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    #[serde(default, alias = "query_date")]
    pub date: Option<NaiveDate>,
}

impl DateQuery {
    /// Resolve the requested date, mapping a malformed query to a 400.
    pub fn resolve(
        query: Result<Query<DateQuery>, QueryRejection>,
        state: &ApiState,
    ) -> Result<NaiveDate, ApiError> {
        let Query(q) = query.map_err(|e| ApiError::validation(e.body_text()))?;
        Ok(q.date.unwrap_or_else(|| state.aggregator.today()))
    }
}
