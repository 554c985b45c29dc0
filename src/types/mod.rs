//! Shared data structures for behavior monitoring
//!
//! - Samples and stored observations (position + activity fields)
//! - Schema and filter policies selected per deployment
//! - Derived daily metric totals and reports

mod observation;
mod metrics;

pub use observation::*;
pub use metrics::*;
