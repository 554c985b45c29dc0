//! Template-based advice
//!
//! Compares each current figure with its baseline and produces one sentence
//! per family. Used when no chat-completion key is configured.

use async_trait::async_trait;

use super::{AdvisoryError, AdvisoryGenerator, AdvisoryRequest};
use crate::metrics::ReferenceClock;
use crate::types::SchemaPolicy;

/// Relative change below which a figure counts as "about the same".
const STEADY_BAND: f64 = 0.15;

/// Deterministic advisory backend
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateAdvisor {
    clock: ReferenceClock,
    schema: SchemaPolicy,
}

impl TemplateAdvisor {
    pub const fn new(clock: ReferenceClock, schema: SchemaPolicy) -> Self {
        Self { clock, schema }
    }

    /// Render advice text for `request`. Pure.
    pub fn render(&self, request: &AdvisoryRequest) -> String {
        let (feed_unit, drink_unit, rest_unit) = match self.schema {
            SchemaPolicy::Flags => ("meals", "drinks", "seconds of rest"),
            SchemaPolicy::Magnitudes => ("units of food", "ml of water", "hours of rest"),
        };

        let when = self.clock.format(request.timestamp, "%Y-%m-%d %H:%M");
        let mut lines = vec![format!("Summary as of {when}:")];

        lines.push(compare("Feeding", request.cur_feed, request.avg_feed, feed_unit));
        lines.push(compare("Drinking", request.cur_drink, request.avg_drink, drink_unit));
        lines.push(compare("Rest", request.cur_rest, request.avg_rest, rest_unit));

        if request.avg_drink > 0.0 && request.cur_drink < request.avg_drink * (1.0 - STEADY_BAND) {
            lines.push("Make sure fresh water is easy to reach.".to_string());
        }
        if request.avg_feed > 0.0 && request.cur_feed < request.avg_feed * (1.0 - STEADY_BAND) {
            lines.push("Appetite is lower than usual; keep an eye on meals tomorrow.".to_string());
        }

        lines.join(" ")
    }
}

fn compare(label: &str, current: f64, average: f64, unit: &str) -> String {
    if average <= 0.0 {
        return format!("{label}: {current} {unit} today, no baseline yet.");
    }

    let change = (current - average) / average;
    let trend = if change > STEADY_BAND {
        "above"
    } else if change < -STEADY_BAND {
        "below"
    } else {
        "in line with"
    };
    format!(
        "{label}: {current} {unit} today, {trend} the {average} average ({:+.0}%).",
        change * 100.0
    )
}

#[async_trait]
impl AdvisoryGenerator for TemplateAdvisor {
    async fn summarize(&self, request: &AdvisoryRequest) -> Result<String, AdvisoryError> {
        Ok(self.render(request))
    }

    fn backend_name(&self) -> &'static str {
        "template"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn request(cur: f64, avg: f64) -> AdvisoryRequest {
        AdvisoryRequest {
            avg_feed: avg,
            avg_drink: avg,
            avg_rest: avg,
            cur_feed: cur,
            cur_drink: cur,
            cur_rest: cur,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 16, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_zero_inputs_are_tolerated() {
        let text = TemplateAdvisor::default().render(&request(0.0, 0.0));
        assert!(text.contains("no baseline yet"));
        assert!(text.starts_with("Summary as of 2024-05-02 01:30:"));
    }

    #[test]
    fn test_trend_wording() {
        let advisor = TemplateAdvisor::default();
        assert!(advisor.render(&request(2.0, 1.0)).contains("above the 1 average"));
        assert!(advisor.render(&request(1.0, 1.0)).contains("in line with"));

        let low = advisor.render(&request(1.0, 4.0));
        assert!(low.contains("below"));
        assert!(low.contains("fresh water"));
    }

    #[test]
    fn test_units_follow_schema() {
        let advisor = TemplateAdvisor::new(ReferenceClock::default(), SchemaPolicy::Magnitudes);
        assert!(advisor.render(&request(1.0, 1.0)).contains("hours of rest"));
    }

    #[test]
    fn test_summarize_matches_render() {
        let advisor = TemplateAdvisor::default();
        let req = request(2.0, 1.0);
        let text = tokio_test::block_on(advisor.summarize(&req)).unwrap();
        assert_eq!(text, advisor.render(&req));
    }

    #[test]
    fn test_deterministic() {
        let advisor = TemplateAdvisor::default();
        assert_eq!(advisor.render(&request(3.0, 2.0)), advisor.render(&request(3.0, 2.0)));
    }
}
