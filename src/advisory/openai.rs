//! OpenAI-compatible chat completions backend

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{AdvisoryError, AdvisoryGenerator, AdvisoryRequest};
use crate::metrics::ReferenceClock;

const SYSTEM_PROMPT: &str = "You are a caring assistant who reviews a pet's daily activity. \
    Compare today's figures with the recent average and give two or three short, practical \
    suggestions. Do not invent figures that were not provided.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client
#[derive(Clone)]
pub struct OpenAiAdvisor {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    clock: ReferenceClock,
}

impl OpenAiAdvisor {
    /// Build a client for `{base_url}/chat/completions`.
    ///
    /// `timeout` bounds each HTTP request; the advisory service applies its
    /// own timeout on top.
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        clock: ReferenceClock,
        timeout: Duration,
    ) -> Result<Self, AdvisoryError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            clock,
        })
    }

    /// User prompt carrying the six figures and the reference-time timestamp.
    pub fn user_prompt(&self, request: &AdvisoryRequest) -> String {
        format!(
            "Recent average: feeding {}, drinking {}, rest {}.\n\
             Today so far: feeding {}, drinking {}, rest {}.\n\
             Current time: {}.",
            request.avg_feed,
            request.avg_drink,
            request.avg_rest,
            request.cur_feed,
            request.cur_drink,
            request.cur_rest,
            self.clock.format(request.timestamp, "%Y-%m-%d %H:%M:%S"),
        )
    }
}

#[async_trait]
impl AdvisoryGenerator for OpenAiAdvisor {
    async fn summarize(&self, request: &AdvisoryRequest) -> Result<String, AdvisoryError> {
        let prompt = self.user_prompt(request);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: 0.7,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AdvisoryError::Status(status));
        }

        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(AdvisoryError::EmptyResponse)
    }

    fn backend_name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_user_prompt_uses_reference_time() {
        let advisor = OpenAiAdvisor::new(
            "https://api.example.com/v1/",
            "gpt-4o-mini",
            "sk-test",
            ReferenceClock::default(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(advisor.base_url, "https://api.example.com/v1");

        let request = AdvisoryRequest {
            avg_feed: 3.0,
            avg_drink: 2.5,
            avg_rest: 86_000.0,
            cur_feed: 1.0,
            cur_drink: 0.0,
            cur_rest: 86_399.0,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 16, 0, 0).unwrap(),
        };
        let prompt = advisor.user_prompt(&request);
        assert!(prompt.contains("feeding 3, drinking 2.5, rest 86000"));
        assert!(prompt.contains("2024-05-02 01:00:00"));
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"Offer more water."}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Offer more water.")
        );

        let empty: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.choices.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        let advisor = OpenAiAdvisor::new(
            "http://127.0.0.1:9",
            "gpt-4o-mini",
            "sk-test",
            ReferenceClock::default(),
            Duration::from_millis(500),
        )
        .unwrap();
        let request = AdvisoryRequest {
            avg_feed: 0.0,
            avg_drink: 0.0,
            avg_rest: 0.0,
            cur_feed: 0.0,
            cur_drink: 0.0,
            cur_rest: 0.0,
            timestamp: Utc::now(),
        };
        let err = advisor.summarize(&request).await.unwrap_err();
        assert!(matches!(err, AdvisoryError::Http(_)));
    }
}
