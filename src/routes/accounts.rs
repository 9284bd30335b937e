//! # routes::accounts
//!
//! Accounts are listed and created per caller; there is no server-side
//! notion of a "selected" account.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::Account,
    routes::{owned_account, ApiJson},
    state::SharedState,
};

/// GET /api/accounts
pub async fn list_accounts(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let accounts = state.store.list_accounts(&user.email).await?;
    Ok(Json(json!({ "ok": true, "accounts": accounts })))
}

#[derive(Deserialize)]
pub struct CreateAccount {
    #[serde(default)]
    pub name: Option<String>,
}

/// POST /api/accounts
pub async fn create_account(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<CreateAccount>,
) -> Result<impl IntoResponse, AppError> {
    let account = Account::new(&user.email, body.name.as_deref());
    state.store.insert_account(account.clone()).await?;

    info!(owner = %user.email, account_id = %account.id, name = %account.name, "📒 Account created");
    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "account": account }))))
}

/// GET /api/accounts/:account_id/pairs — pairs already traded, for autocomplete
pub async fn list_pairs(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let account = owned_account(&state, &user, &account_id).await?;
    let pairs = state.store.list_pairs(&user.email, account.id).await?;
    Ok(Json(json!({ "ok": true, "pairs": pairs })))
}
