//! API route definitions
//!
//! - POST /tracking_data - store one sample
//! - GET /daily_movement, /recent_movements, /get_tracking_info - movement
//! - GET /get_diet_info, /get_water_info, /get_sleep_info - activity families
//! - GET /get_gpt_advice - advisory text
//! - GET /, /health - liveness

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, ApiState};

/// Create all API routes
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/", get(handlers::get_root))
        .route("/health", get(handlers::get_health))
        // Ingestion
        .route("/tracking_data", post(handlers::post_tracking_data))
        // Movement
        .route("/daily_movement", get(handlers::get_daily_movement))
        .route("/recent_movements", get(handlers::get_recent_movements))
        .route("/get_tracking_info", get(handlers::get_tracking_info))
        // Activity families
        .route("/get_diet_info", get(handlers::get_diet_info))
        .route("/get_water_info", get(handlers::get_water_info))
        .route("/get_sleep_info", get(handlers::get_sleep_info))
        // Advisory
        .route("/get_gpt_advice", get(handlers::get_gpt_advice))
        .with_state(state)
}
