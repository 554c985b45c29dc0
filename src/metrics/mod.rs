//! Derived Metrics
//!
//! Sequential distance, per-schema aggregation rules and the aggregator that
//! turns stored observations into daily totals and trailing baselines. All
//! day grouping goes through the [`ReferenceClock`].

mod aggregator;
mod clock;
mod distance;
mod rules;

pub use aggregator::{MetricsAggregator, DEFAULT_BASELINE_WINDOW_DAYS};
pub use clock::{ReferenceClock, DEFAULT_UTC_OFFSET_HOURS};
pub use distance::{round_to, step_distance, DISTANCE_DECIMALS};
pub use rules::{AggregationRules, DEFAULT_DRINK_SCALE, SECONDS_PER_DAY, SECONDS_PER_HOUR};
