//! # routes::sessions
//!
//! Static reference data and liveness.

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::state::SharedState;

/// GET /api/sessions — London / New York / Asia with `HH:MM` bounds and colors
pub async fn list_sessions(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "ok":       true,
        "sessions": state.sessions.all(),
    }))
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "ok":      true,
        "status":  "healthy",
        "service": "trade-journal",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
