//! Daily totals and trailing baselines over the observation log

use chrono::{DateTime, Days, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::clock::ReferenceClock;
use super::rules::AggregationRules;
use crate::error::MonitorError;
use crate::storage::{run_blocking, ObservationLog};
use crate::types::{DailyReport, MetricTotals, Observation};

/// Default number of prior days averaged into a baseline.
pub const DEFAULT_BASELINE_WINDOW_DAYS: u32 = 7;

/// Read-only view computing derived metrics on demand.
///
/// Nothing is cached; every call re-reads the log.
#[derive(Clone)]
pub struct MetricsAggregator {
    log: Arc<dyn ObservationLog>,
    clock: ReferenceClock,
    rules: AggregationRules,
    timeout: Duration,
    window_days: u32,
}

impl MetricsAggregator {
    pub fn new(
        log: Arc<dyn ObservationLog>,
        clock: ReferenceClock,
        rules: AggregationRules,
        timeout: Duration,
    ) -> Self {
        Self {
            log,
            clock,
            rules,
            timeout,
            window_days: DEFAULT_BASELINE_WINDOW_DAYS,
        }
    }

    /// Override the baseline window used by [`daily_report`](Self::daily_report).
    #[must_use]
    pub fn with_window_days(mut self, window_days: u32) -> Self {
        self.window_days = window_days;
        self
    }

    pub const fn clock(&self) -> &ReferenceClock {
        &self.clock
    }

    pub const fn rules(&self) -> &AggregationRules {
        &self.rules
    }

    pub const fn window_days(&self) -> u32 {
        self.window_days
    }

    /// Today in the reference timezone.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Totals for one reference-timezone day. Empty days are all zeros.
    pub async fn daily_totals(&self, date: NaiveDate) -> Result<MetricTotals, MonitorError> {
        let (start, end) = self.bounds(date)?;
        let rows = self.fetch(start, end).await?;
        let totals = self.rules.day_totals(&rows);

        tracing::debug!(%date, rows = rows.len(), movement = totals.movement, "Computed daily totals");
        Ok(totals)
    }

    /// Mean of the daily totals over `[date - window_days, date - 1]`.
    ///
    /// Days without rows count as zero, so the divisor is always
    /// `window_days`. The whole window is read in a single range scan.
    pub async fn baseline(
        &self,
        date: NaiveDate,
        window_days: u32,
    ) -> Result<MetricTotals, MonitorError> {
        let (first, last) = Self::window(date, window_days)?;
        let (start, _) = self.bounds(first)?;
        let (_, end) = self.bounds(last)?;

        let rows = self.fetch(start, end).await?;

        let mut by_day: BTreeMap<NaiveDate, Vec<Observation>> = BTreeMap::new();
        for row in rows {
            if let Some(day) = self.clock.day_of(row.timestamp) {
                by_day.entry(day).or_default().push(row);
            }
        }

        let per_day: Vec<MetricTotals> = by_day
            .values()
            .map(|rows| self.rules.day_totals(rows))
            .collect();

        tracing::debug!(
            %date,
            window_days,
            days_with_data = per_day.len(),
            "Computed baseline"
        );
        Ok(self.rules.average(&per_day, window_days))
    }

    /// Same-day totals next to the configured baseline window.
    pub async fn daily_report(&self, date: NaiveDate) -> Result<DailyReport, MonitorError> {
        let current = self.daily_totals(date).await?;
        let baseline = self.baseline(date, self.window_days).await?;
        let (baseline_start, baseline_end) = Self::window(date, self.window_days)?;

        Ok(DailyReport {
            date,
            current,
            baseline,
            baseline_start,
            baseline_end,
            window_days: self.window_days,
        })
    }

    /// Inclusive first and last day of the window preceding `date`.
    fn window(date: NaiveDate, window_days: u32) -> Result<(NaiveDate, NaiveDate), MonitorError> {
        if window_days == 0 {
            return Err(MonitorError::validation("baseline window must be at least one day"));
        }
        let first = date
            .checked_sub_days(Days::new(u64::from(window_days)))
            .ok_or_else(|| MonitorError::validation(format!("baseline window before {date} is out of range")))?;
        let last = date
            .pred_opt()
            .ok_or_else(|| MonitorError::validation(format!("no day precedes {date}")))?;
        Ok((first, last))
    }

    fn bounds(&self, date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), MonitorError> {
        self.clock
            .day_bounds(date)
            .ok_or_else(|| MonitorError::validation(format!("date {date} is out of range")))
    }

    async fn fetch(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>, MonitorError> {
        let log = Arc::clone(&self.log);
        Ok(run_blocking(self.timeout, move || log.range(start, end)).await?)
    }
}
