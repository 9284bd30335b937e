//! # routes::trades
//!
//! The journal's main screen: list an account's trades together with their
//! [`TradeSummary`](crate::analytics::TradeSummary), add and delete trades.
//!
//! Filtering (session / outcome / dates) is pushed into the store query, so
//! the summary is always computed over exactly the rows that are returned.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::{debug, info};

use crate::{
    analytics::summarize,
    auth::CurrentUser,
    error::AppError,
    models::NewTrade,
    routes::{owned_account, parse_id, ApiJson, TradeFilterParams},
    state::SharedState,
    store::TradeQuery,
};

// ─── GET /api/accounts/:account_id/trades ─────────────────────────────────────

pub async fn list_trades(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(account_id): Path<String>,
    Query(params): Query<TradeFilterParams>,
) -> Result<impl IntoResponse, AppError> {
    let account = owned_account(&state, &user, &account_id).await?;
    let query = params.apply(TradeQuery::for_account(&user.email, account.id))?;

    let trades = state.store.find_trades(&query).await?;
    let summary = summarize(&trades, state.config.average_method);

    debug!(
        account_id = %account.id,
        session    = ?query.session,
        outcome    = ?query.outcome,
        count      = summary.total_trades,
        total_pl   = summary.total_profit,
        "📊 Trades listed"
    );

    Ok(Json(json!({
        "ok":      true,
        "trades":  trades,
        "summary": summary,
    })))
}

// ─── POST /api/accounts/:account_id/trades ────────────────────────────────────

pub async fn add_trade(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(account_id): Path<String>,
    ApiJson(body): ApiJson<NewTrade>,
) -> Result<impl IntoResponse, AppError> {
    let account = owned_account(&state, &user, &account_id).await?;
    let trade = body.into_trade(account.id, &user.email, &state.sessions)?;

    state.store.insert_trade(trade.clone()).await?;

    info!(
        trade_id   = %trade.id,
        account_id = %account.id,
        pair       = %trade.pair,
        session    = ?trade.session,
        pl         = trade.profit_amount,
        "📝 Trade logged"
    );

    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "trade": trade }))))
}

// ─── DELETE /api/accounts/:account_id/trades/:trade_id ────────────────────────

pub async fn delete_trade(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path((account_id, trade_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let account_id = parse_id(&account_id, "Account")?;
    let trade_id = parse_id(&trade_id, "Trade")?;

    if !state.store.delete_trade(&user.email, account_id, trade_id).await? {
        return Err(AppError::NotFound("Trade not found".into()));
    }

    info!(%trade_id, %account_id, "🗑️ Trade deleted");
    Ok(Json(json!({ "ok": true, "message": "Trade deleted" })))
}
