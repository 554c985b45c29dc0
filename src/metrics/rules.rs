//! Per-schema aggregation rules
//!
//! Pure functions from a day's rows to [`MetricTotals`]. The aggregator only
//! fetches and groups rows; all arithmetic lives here.

use crate::types::{ActiveFilter, ActivityFields, MetricTotals, Observation, SchemaPolicy};

use super::distance::{round_to, DISTANCE_DECIMALS};

/// Seconds in a day, the ceiling of flag-schema rest time.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Magnitude-schema rest is stored in seconds and reported in hours.
pub const SECONDS_PER_HOUR: f64 = 3_600.0;

/// Default factor converting stored drink magnitudes to the reported unit.
pub const DEFAULT_DRINK_SCALE: f64 = 3.6;

/// Aggregation rules for one deployment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregationRules {
    pub schema: SchemaPolicy,
    pub active_filter: ActiveFilter,
    pub drink_scale: f64,
}

impl Default for AggregationRules {
    fn default() -> Self {
        Self {
            schema: SchemaPolicy::Flags,
            active_filter: ActiveFilter::All,
            drink_scale: DEFAULT_DRINK_SCALE,
        }
    }
}

impl AggregationRules {
    /// Totals for one day's rows, rounded for display.
    ///
    /// A day with no admitted rows is all zeros. Rows whose activity fields
    /// belong to the other schema still contribute their distance.
    pub fn day_totals(&self, rows: &[Observation]) -> MetricTotals {
        let admitted: Vec<&Observation> = rows
            .iter()
            .filter(|r| self.active_filter.admits(r.detected))
            .collect();

        if admitted.is_empty() {
            return MetricTotals::ZERO;
        }

        let movement: f64 = admitted.iter().map(|r| r.distance).sum();

        let raw = match self.schema {
            SchemaPolicy::Flags => Self::flag_totals(&admitted, movement),
            SchemaPolicy::Magnitudes => self.magnitude_totals(&admitted, movement),
        };
        self.round(raw, false)
    }

    /// Mean of per-day totals over a fixed window.
    ///
    /// Days missing from `days` count as zero; the divisor is always
    /// `window_days`.
    pub fn average(&self, days: &[MetricTotals], window_days: u32) -> MetricTotals {
        if window_days == 0 {
            return MetricTotals::ZERO;
        }
        let sum = days.iter().fold(MetricTotals::ZERO, |acc, d| acc + *d);
        self.round(sum / f64::from(window_days), true)
    }

    /// Counts of flagged rows; rest is one second per competing event.
    ///
    /// `rest = max(86400 - home - feed - drink, 0)` is an approximation of
    /// idle time, not a measured duration.
    #[allow(clippy::cast_precision_loss)]
    fn flag_totals(rows: &[&Observation], movement: f64) -> MetricTotals {
        let (mut home, mut feed, mut drink) = (0usize, 0usize, 0usize);
        for row in rows {
            if let ActivityFields::Flags {
                home: h,
                eating,
                drinking,
            } = row.activity
            {
                home += usize::from(h);
                feed += usize::from(eating);
                drink += usize::from(drinking);
            }
        }

        let rest = (SECONDS_PER_DAY - (home + feed + drink) as f64).max(0.0);

        MetricTotals {
            movement,
            feed: feed as f64,
            drink: drink as f64,
            rest,
        }
    }

    fn magnitude_totals(&self, rows: &[&Observation], movement: f64) -> MetricTotals {
        let (mut home, mut feed, mut drink) = (0.0, 0.0, 0.0);
        for row in rows {
            if let ActivityFields::Magnitudes {
                home_data,
                eating_data,
                drinking_data,
            } = row.activity
            {
                home += home_data;
                feed += eating_data;
                drink += drinking_data;
            }
        }

        MetricTotals {
            movement,
            feed,
            drink: drink * self.drink_scale,
            rest: home / SECONDS_PER_HOUR,
        }
    }

    /// Movement keeps 4 places; counts are whole; averaged or derived
    /// rest/water values keep 1 place.
    fn round(&self, t: MetricTotals, averaged: bool) -> MetricTotals {
        let movement = round_to(t.movement, DISTANCE_DECIMALS);
        match self.schema {
            SchemaPolicy::Flags => MetricTotals {
                movement,
                feed: t.feed.round(),
                drink: t.drink.round(),
                rest: if averaged { round_to(t.rest, 1) } else { t.rest.round() },
            },
            SchemaPolicy::Magnitudes => MetricTotals {
                movement,
                feed: round_to(t.feed, 1),
                drink: round_to(t.drink, 1),
                rest: round_to(t.rest, 1),
            },
        }
    }
}
