//! Liveness page and JSON health

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use super::ApiState;
use crate::storage::run_blocking;

/// Ping the log within the storage timeout. `Err` carries the reason.
async fn probe_storage(state: &ApiState) -> Result<(), String> {
    let log = Arc::clone(&state.log);
    run_blocking(state.storage_timeout, move || log.ping())
        .await
        .map_err(|e| e.to_string())
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ============================================================================
// GET /
// ============================================================================

/// GET / - HTML status page reporting storage reachability
///
/// Always 200: the page itself is the liveness signal.
pub async fn get_root(State(state): State<ApiState>) -> Html<String> {
    let storage_line = match probe_storage(&state).await {
        Ok(()) => format!("Storage reachable ({})", state.log.backend_name()),
        Err(e) => {
            tracing::warn!(error = %e, "Storage probe failed");
            format!("Storage unreachable: {}", escape_html(&e))
        }
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Server status</title></head>
<body>
    <h1>Server status</h1>
    <p>{storage_line}</p>
    <p>The server is running.</p>
</body>
</html>
"#
    ))
}

// ============================================================================
// GET /health
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`
    pub status: &'static str,
    /// `reachable` or `unreachable`
    pub storage: &'static str,
    pub backend: &'static str,
    pub observations: usize,
    pub schema: String,
    pub advisory_backend: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
}

/// GET /health - JSON health; 503 when storage is unreachable
pub async fn get_health(State(state): State<ApiState>) -> Response {
    let reachable = probe_storage(&state).await.is_ok();

    let body = HealthResponse {
        status: if reachable { "ok" } else { "degraded" },
        storage: if reachable { "reachable" } else { "unreachable" },
        backend: state.log.backend_name(),
        observations: if reachable { state.log.count() } else { 0 },
        schema: state.schema().to_string(),
        advisory_backend: state.advisory.backend_name(),
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
    };

    let status = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"x\" & y</b>"), "&lt;b&gt;&quot;x&quot; &amp; y&lt;/b&gt;");
    }
}
