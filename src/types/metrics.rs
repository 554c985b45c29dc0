//! Derived metric types and the per-deployment policies that shape them

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which activity schema a deployment stores and aggregates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SchemaPolicy {
    /// Boolean `home` / `eating` / `drinking` indicators; totals are counts.
    #[default]
    Flags,
    /// Numeric `home_data` / `eating_data` / `drinking_data`; totals are sums.
    Magnitudes,
}

impl std::fmt::Display for SchemaPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaPolicy::Flags => write!(f, "flags"),
            SchemaPolicy::Magnitudes => write!(f, "magnitudes"),
        }
    }
}

/// Which rows take part in aggregation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActiveFilter {
    /// Every stored row
    #[default]
    All,
    /// Only rows marked as a valid detection
    DetectedOnly,
}

impl ActiveFilter {
    pub const fn admits(self, detected: bool) -> bool {
        match self {
            ActiveFilter::All => true,
            ActiveFilter::DetectedOnly => detected,
        }
    }
}

/// Totals for the four metric families.
///
/// Units depend on the schema policy:
///
/// | family   | flags            | magnitudes                 |
/// |----------|------------------|----------------------------|
/// | movement | distance units   | distance units             |
/// | feed     | event count      | sum of `eating_data`       |
/// | drink    | event count      | sum of `drinking_data` x 3.6 |
/// | rest     | seconds          | hours                      |
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricTotals {
    pub movement: f64,
    pub feed: f64,
    pub drink: f64,
    pub rest: f64,
}

impl MetricTotals {
    pub const ZERO: Self = Self {
        movement: 0.0,
        feed: 0.0,
        drink: 0.0,
        rest: 0.0,
    };
}

impl std::ops::Add for MetricTotals {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            movement: self.movement + rhs.movement,
            feed: self.feed + rhs.feed,
            drink: self.drink + rhs.drink,
            rest: self.rest + rhs.rest,
        }
    }
}

impl std::ops::Div<f64> for MetricTotals {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self {
            movement: self.movement / rhs,
            feed: self.feed / rhs,
            drink: self.drink / rhs,
            rest: self.rest / rhs,
        }
    }
}

/// Same-day totals next to the trailing baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub current: MetricTotals,
    pub baseline: MetricTotals,
    /// First day of the baseline window (inclusive)
    pub baseline_start: NaiveDate,
    /// Last day of the baseline window (inclusive)
    pub baseline_end: NaiveDate,
    pub window_days: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_filter() {
        assert!(ActiveFilter::All.admits(false));
        assert!(ActiveFilter::DetectedOnly.admits(true));
        assert!(!ActiveFilter::DetectedOnly.admits(false));
    }

    #[test]
    fn test_policy_serde_names() {
        let p: SchemaPolicy = serde_json::from_str("\"magnitudes\"").unwrap();
        assert_eq!(p, SchemaPolicy::Magnitudes);
        let f: ActiveFilter = serde_json::from_str("\"detected_only\"").unwrap();
        assert_eq!(f, ActiveFilter::DetectedOnly);
    }

    #[test]
    fn test_totals_arithmetic() {
        let a = MetricTotals { movement: 2.0, feed: 4.0, drink: 6.0, rest: 8.0 };
        let avg = (a + MetricTotals::ZERO) / 2.0;
        assert_eq!(avg, MetricTotals { movement: 1.0, feed: 2.0, drink: 3.0, rest: 4.0 });
    }
}
