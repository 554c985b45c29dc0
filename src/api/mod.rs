//! REST API module using Axum
//!
//! JSON endpoints for ingesting samples and reading daily metrics, plus an
//! HTML liveness page at `/`.

pub mod error;
pub mod handlers;
mod routes;

pub use error::ApiError;
pub use handlers::ApiState;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the CORS layer from the configured origin list.
///
/// `*` anywhere in the list allows every origin. Unparseable origins are
/// skipped with a warning.
pub fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.iter().any(|o| o.trim() == "*") {
        tracing::info!("CORS: allowing any origin");
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.trim().parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "CORS: ignoring invalid origin");
                None
            }
        })
        .collect();
    tracing::info!(origins = ?origins, "CORS: allowing configured origins");
    base.allow_origin(allowed)
}

/// Create the complete application router.
pub fn create_app(state: ApiState, cors_origins: &[String]) -> Router {
    routes::api_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(cors_origins))
}
