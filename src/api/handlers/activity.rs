//! Feed / drink / rest endpoints
//!
//! Each returns the day's total next to the trailing baseline:
//! `{date, total_<metric>, prev_avg_<metric>, prev_start, prev_end}`.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde_json::{json, Value};

use super::{ApiState, DateQuery};
use crate::api::error::ApiError;
use crate::types::{DailyReport, SchemaPolicy};

#[derive(Clone, Copy)]
enum Family {
    Feed,
    Drink,
    Rest,
}

impl Family {
    const fn key(self) -> &'static str {
        match self {
            Family::Feed => "diet",
            Family::Drink => "water",
            Family::Rest => "sleep",
        }
    }
}

/// Flag-schema feed and drink figures are counts and serialize as integers.
#[allow(clippy::cast_possible_truncation)]
fn figure(schema: SchemaPolicy, family: Family, value: f64) -> Value {
    match (schema, family) {
        (SchemaPolicy::Flags, Family::Feed | Family::Drink) => json!(value.round() as i64),
        _ => json!(value),
    }
}

fn render(report: &DailyReport, schema: SchemaPolicy, family: Family) -> Value {
    let (current, baseline) = match family {
        Family::Feed => (report.current.feed, report.baseline.feed),
        Family::Drink => (report.current.drink, report.baseline.drink),
        Family::Rest => (report.current.rest, report.baseline.rest),
    };
    let key = family.key();

    let mut body = serde_json::Map::new();
    body.insert("date".to_string(), json!(report.date));
    body.insert(format!("total_{key}"), figure(schema, family, current));
    body.insert(format!("prev_avg_{key}"), figure(schema, family, baseline));
    body.insert("prev_start".to_string(), json!(report.baseline_start));
    body.insert("prev_end".to_string(), json!(report.baseline_end));
    Value::Object(body)
}

async fn family_report(
    state: &ApiState,
    date: NaiveDate,
    family: Family,
) -> Result<Json<Value>, ApiError> {
    let report = state.aggregator.daily_report(date).await?;
    Ok(Json(render(&report, state.schema(), family)))
}

/// GET /get_diet_info - Feeding total and baseline
pub async fn get_diet_info(
    State(state): State<ApiState>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let date = DateQuery::resolve(query, &state)?;
    family_report(&state, date, Family::Feed).await
}

/// GET /get_water_info - Drinking total and baseline
pub async fn get_water_info(
    State(state): State<ApiState>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let date = DateQuery::resolve(query, &state)?;
    family_report(&state, date, Family::Drink).await
}

/// GET /get_sleep_info - Rest total and baseline
pub async fn get_sleep_info(
    State(state): State<ApiState>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let date = DateQuery::resolve(query, &state)?;
    family_report(&state, date, Family::Rest).await
}
