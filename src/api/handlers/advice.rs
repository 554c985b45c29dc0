//! GET /get_gpt_advice

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use super::tracking::TIME_FORMAT;
use super::ApiState;
use crate::advisory::{AdviceSource, AdvisoryRequest};
use crate::api::error::ApiError;

#[derive(Debug, Serialize)]
pub struct AdviceResponse {
    pub advice: String,
    pub generated_at: String,
    pub source: AdviceSource,
}

/// GET /get_gpt_advice - Advisory text for today's figures
///
/// Generator failures degrade to placeholder text; only storage failures
/// produce an error status.
pub async fn get_gpt_advice(State(state): State<ApiState>) -> Result<Json<AdviceResponse>, ApiError> {
    let report = state.aggregator.daily_report(state.aggregator.today()).await?;

    let now = Utc::now();
    let advice = state
        .advisory
        .advise(&AdvisoryRequest::from_report(&report, now))
        .await;

    Ok(Json(AdviceResponse {
        advice: advice.text,
        generated_at: state.aggregator.clock().format(now, TIME_FORMAT),
        source: advice.source,
    }))
}
