//! # routes::analytics
//!
//! GET /api/analytics/sessions — the caller's statistics across **all** of
//! their accounts, optionally narrowed by `session`, `profit_filter` and an
//! inclusive `start_date` / `end_date` range.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{
    analytics::summarize,
    auth::CurrentUser,
    error::AppError,
    routes::TradeFilterParams,
    state::SharedState,
    store::TradeQuery,
};

pub async fn session_analytics(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<TradeFilterParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = params.apply(TradeQuery::for_owner(&user.email))?;
    let trades = state.store.find_trades(&query).await?;

    Ok(Json(json!({
        "ok":      true,
        "summary": summarize(&trades, state.config.average_method),
    })))
}
