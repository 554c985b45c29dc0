//! Sample ingestion and movement endpoints

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ApiState, DateQuery};
use crate::api::error::ApiError;
use crate::config::defaults::RECENT_MOVEMENTS_LIMIT;
use crate::metrics::ReferenceClock;
use crate::storage::run_blocking;
use crate::types::{ActivityFields, Sample, SchemaPolicy};

/// Wall-clock format used in every response.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

// ============================================================================
// POST /tracking_data
// ============================================================================

/// Flag given as a JSON bool or as 0/1.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
}

impl FlagValue {
    fn as_bool(self, field: &str) -> Result<bool, ApiError> {
        match self {
            FlagValue::Bool(b) => Ok(b),
            FlagValue::Int(0) => Ok(false),
            FlagValue::Int(1) => Ok(true),
            FlagValue::Int(n) => Err(ApiError::validation(format!(
                "{field} must be true/false or 0/1, got {n}"
            ))),
        }
    }
}

/// Request body for `POST /tracking_data`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingRequest {
    /// RFC 3339, or `YYYY-MM-DD HH:MM:SS` in the reference timezone
    pub timestamp: String,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub detected: Option<FlagValue>,
    #[serde(default)]
    pub home: Option<FlagValue>,
    #[serde(default)]
    pub eating: Option<FlagValue>,
    #[serde(default)]
    pub drinking: Option<FlagValue>,
    #[serde(default)]
    pub home_data: Option<f64>,
    #[serde(default)]
    pub eating_data: Option<f64>,
    #[serde(default)]
    pub drinking_data: Option<f64>,
}

impl TrackingRequest {
    /// Validate the body against `schema` and build a [`Sample`].
    pub fn into_sample(self, clock: &ReferenceClock, schema: SchemaPolicy) -> Result<Sample, ApiError> {
        let timestamp = parse_timestamp(&self.timestamp, clock)?;

        let has_flags = self.home.is_some() || self.eating.is_some() || self.drinking.is_some();
        let has_magnitudes =
            self.home_data.is_some() || self.eating_data.is_some() || self.drinking_data.is_some();

        let activity = match schema {
            SchemaPolicy::Flags => {
                if has_magnitudes {
                    return Err(ApiError::validation(
                        "home_data/eating_data/drinking_data are not accepted by the flags schema",
                    ));
                }
                let flag = |v: Option<FlagValue>, name: &str| v.map_or(Ok(false), |f| f.as_bool(name));
                ActivityFields::Flags {
                    home: flag(self.home, "home")?,
                    eating: flag(self.eating, "eating")?,
                    drinking: flag(self.drinking, "drinking")?,
                }
            }
            SchemaPolicy::Magnitudes => {
                if has_flags {
                    return Err(ApiError::validation(
                        "home/eating/drinking flags are not accepted by the magnitudes schema",
                    ));
                }
                ActivityFields::Magnitudes {
                    home_data: self.home_data.unwrap_or(0.0),
                    eating_data: self.eating_data.unwrap_or(0.0),
                    drinking_data: self.drinking_data.unwrap_or(0.0),
                }
            }
        };

        let mut sample = Sample::new(timestamp, activity);

        match (self.x, self.y) {
            (Some(x), Some(y)) => sample = sample.with_position(x, y),
            (None, None) => {
                if schema == SchemaPolicy::Flags && !has_flags {
                    return Err(ApiError::validation(
                        "sample must carry a position (x, y) or at least one activity flag",
                    ));
                }
            }
            _ => return Err(ApiError::validation("x and y must be given together")),
        }

        if let Some(detected) = self.detected {
            sample = sample.with_detected(detected.as_bool("detected")?);
        }

        Ok(sample)
    }
}

/// Parse RFC 3339, falling back to naive reference-timezone wall-clock time.
pub fn parse_timestamp(raw: &str, clock: &ReferenceClock) -> Result<DateTime<Utc>, ApiError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let local = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| {
            ApiError::validation(format!(
                "invalid timestamp '{raw}': expected RFC 3339 or YYYY-MM-DD HH:MM:SS"
            ))
        })?;
    clock
        .localize(local)
        .ok_or_else(|| ApiError::validation(format!("timestamp '{raw}' is out of range")))
}

#[derive(Debug, Serialize)]
pub struct TrackingResponse {
    pub message: &'static str,
    pub id: u64,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub time: String,
    pub calculated_distance: f64,
    pub detected: bool,
    pub activity: ActivityFields,
}

/// POST /tracking_data - Store one sample and echo it with its distance
pub async fn post_tracking_data(
    State(state): State<ApiState>,
    body: Result<Json<TrackingRequest>, JsonRejection>,
) -> Result<Json<TrackingResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    let clock = *state.ingestor.clock();

    let sample = request.into_sample(&clock, state.ingestor.schema())?;
    let observation = state.ingestor.record(sample).await?;

    Ok(Json(TrackingResponse {
        message: "Data saved successfully",
        id: observation.id,
        x: observation.position.map(|p| p.x),
        y: observation.position.map(|p| p.y),
        time: clock.format(observation.timestamp, TIME_FORMAT),
        calculated_distance: observation.distance,
        detected: observation.detected,
        activity: observation.activity,
    }))
}

// ============================================================================
// GET /daily_movement
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DailyMovementResponse {
    pub date: NaiveDate,
    pub total_movement: f64,
}

/// GET /daily_movement - Sum of stored distances for one day
pub async fn get_daily_movement(
    State(state): State<ApiState>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<DailyMovementResponse>, ApiError> {
    let date = DateQuery::resolve(query, &state)?;
    let totals = state.aggregator.daily_totals(date).await?;

    Ok(Json(DailyMovementResponse {
        date,
        total_movement: totals.movement,
    }))
}

// ============================================================================
// GET /recent_movements
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    /// Skip the newest position
    #[serde(default)]
    pub skip_first: bool,
    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Serialize)]
pub struct MovementPoint {
    pub timestamp: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize)]
pub struct RecentMovementsResponse {
    pub recent_movements: Vec<MovementPoint>,
}

/// GET /recent_movements - Newest positions first
pub async fn get_recent_movements(
    State(state): State<ApiState>,
    query: Result<Query<RecentQuery>, QueryRejection>,
) -> Result<Json<RecentMovementsResponse>, ApiError> {
    let Query(q) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let skip = q.offset.saturating_add(usize::from(q.skip_first));

    let log = std::sync::Arc::clone(&state.log);
    let rows = run_blocking(state.storage_timeout, move || {
        log.recent_positions(skip, RECENT_MOVEMENTS_LIMIT)
    })
    .await?;

    let clock = state.aggregator.clock();
    let recent_movements = rows
        .into_iter()
        .filter_map(|row| {
            row.position.map(|p| MovementPoint {
                timestamp: clock.format(row.timestamp, TIME_FORMAT),
                x: p.x,
                y: p.y,
            })
        })
        .collect();

    Ok(Json(RecentMovementsResponse { recent_movements }))
}

// ============================================================================
// GET /get_tracking_info
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TrackingInfoResponse {
    pub date: NaiveDate,
    pub total_movement: String,
    pub prev_avg_movement: String,
}

/// GET /get_tracking_info - Today's movement and the baseline as display text
pub async fn get_tracking_info(
    State(state): State<ApiState>,
) -> Result<Json<TrackingInfoResponse>, ApiError> {
    let report = state.aggregator.daily_report(state.aggregator.today()).await?;
    let unit = &state.movement_unit;

    Ok(Json(TrackingInfoResponse {
        date: report.date,
        total_movement: format!("{:.2} {unit}", report.current.movement),
        prev_avg_movement: format!("{:.2} {unit}", report.baseline.movement),
    }))
}
