//! # auth — API Key Middleware + Caller Identity
//!
//! Two independent layers:
//!
//! 1. [`require_api_key`] ป้องกัน Endpoint ด้วย `X-API-Key` header
//!    - `API_KEY` ไม่ได้ตั้ง (หรือ empty) → **Allow All** (Dev Mode)
//!    - `API_KEY` ตั้งค่า → ต้องส่ง `X-API-Key: <key>` ทุก Request
//!    - `/health` ไม่ต้อง Auth
//! 2. [`CurrentUser`] extractor — the journal UI names the logged-in user in
//!    `X-User-Email`; the email must belong to a registered user.
//!
//! ## Usage
//! ```bash
//! curl -H "X-API-Key: super-secret-key-here" \
//!      -H "X-User-Email: trader@example.com" \
//!      http://localhost:5000/api/accounts
//! ```

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::{error::AppError, models::User, state::SharedState};

pub const USER_HEADER: &str = "X-User-Email";

// ─── API Key ──────────────────────────────────────────────────────────────────

/// Axum middleware — ตรวจสอบ X-API-Key header
pub async fn require_api_key(
    State(state): State<SharedState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // ── Dev Mode: ไม่มี API_KEY → ยอมให้ผ่านหมด ─────────────────────────────
    let Some(expected) = state.config.api_key.as_deref() else {
        return next.run(request).await;
    };

    let path = request.uri().path();
    if path == "/health" {
        return next.run(request).await;
    }

    let provided = request
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if provided == expected {
        next.run(request).await
    } else {
        warn!(path, "❌ Unauthorized request — invalid or missing X-API-Key");
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "ok":    false,
                "error": "Unauthorized: invalid or missing X-API-Key header",
                "hint":  "Set X-API-Key header with your API key"
            })),
        )
            .into_response()
    }
}

// ─── CurrentUser ──────────────────────────────────────────────────────────────

/// The registered user named by the `X-User-Email` header.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let email = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Unauthorized("No user email provided".into()))?;

        match state.store.find_user(&email).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                warn!(%email, "❌ Request from unknown user");
                Err(AppError::Unauthorized("Unknown user".into()))
            }
        }
    }
}
