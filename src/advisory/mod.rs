//! Advisory Generation
//!
//! Turns a day's feed/drink/rest figures and their baselines into short
//! natural-language advice.
//!
//! ## Backends
//!
//! - **OpenAiAdvisor**: OpenAI-compatible chat completions endpoint
//! - **TemplateAdvisor**: deterministic comparison text, used when no API key
//!   is configured
//!
//! [`AdvisoryService`] wraps whichever backend is active with a timeout and
//! degrades every failure to placeholder text, so the advice endpoint never
//! fails because the generator is unavailable.

mod openai;
mod templates;

pub use openai::OpenAiAdvisor;
pub use templates::TemplateAdvisor;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::types::DailyReport;

/// Placeholder returned when no advice could be generated.
pub const DEFAULT_PLACEHOLDER: &str =
    "Advice is temporarily unavailable. Today's figures are still shown above.";

/// Inputs to one advisory call. Every value is non-negative and may be 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisoryRequest {
    pub avg_feed: f64,
    pub avg_drink: f64,
    pub avg_rest: f64,
    pub cur_feed: f64,
    pub cur_drink: f64,
    pub cur_rest: f64,
    pub timestamp: DateTime<Utc>,
}

impl AdvisoryRequest {
    pub fn from_report(report: &DailyReport, timestamp: DateTime<Utc>) -> Self {
        Self {
            avg_feed: report.baseline.feed,
            avg_drink: report.baseline.drink,
            avg_rest: report.baseline.rest,
            cur_feed: report.current.feed,
            cur_drink: report.current.drink,
            cur_rest: report.current.rest,
            timestamp,
        }
    }
}

/// Advisory backend errors
#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("generator returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("generator returned no text")]
    EmptyResponse,
    #[error("generator timed out after {0:?}")]
    Timeout(Duration),
}

/// Text generator behind the advice endpoint
#[async_trait]
pub trait AdvisoryGenerator: Send + Sync {
    /// Produce advice for `request`.
    async fn summarize(&self, request: &AdvisoryRequest) -> Result<String, AdvisoryError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Where a piece of advice came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceSource {
    Generator,
    Placeholder,
}

/// Advice ready to return to a caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advice {
    pub text: String,
    pub source: AdviceSource,
    pub backend: &'static str,
}

/// Bounded, failure-tolerant front for an [`AdvisoryGenerator`].
#[derive(Clone)]
pub struct AdvisoryService {
    generator: Arc<dyn AdvisoryGenerator>,
    timeout: Duration,
    placeholder: String,
}

impl AdvisoryService {
    pub fn new(generator: Arc<dyn AdvisoryGenerator>, timeout: Duration) -> Self {
        Self {
            generator,
            timeout,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.generator.backend_name()
    }

    /// Generate advice, falling back to the placeholder on any failure.
    pub async fn advise(&self, request: &AdvisoryRequest) -> Advice {
        let backend = self.generator.backend_name();

        let outcome = match tokio::time::timeout(self.timeout, self.generator.summarize(request)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => Ok(text),
            Ok(Ok(_)) => Err(AdvisoryError::EmptyResponse),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AdvisoryError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(text) => {
                tracing::debug!(backend, chars = text.len(), "Advice generated");
                Advice {
                    text: text.trim().to_string(),
                    source: AdviceSource::Generator,
                    backend,
                }
            }
            Err(e) => {
                tracing::warn!(backend, error = %e, "Advisory unavailable, using placeholder");
                Advice {
                    text: self.placeholder.clone(),
                    source: AdviceSource::Placeholder,
                    backend,
                }
            }
        }
    }
}
