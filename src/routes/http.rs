// GET handlers: version, latest statistics

use axum::{extract::State, http::header, response::IntoResponse};

use super::AppState;
use crate::version::{NAME, VERSION};

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/statistics — the payload most recently pushed to subscribers; `[]` before the first cycle.
pub(super) async fn statistics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = state
        .publisher
        .latest()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "[]".to_string());
    ([(header::CONTENT_TYPE, "application/json")], body)
}
