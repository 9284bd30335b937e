//! # routes
//!
//! Axum handlers, grouped by resource, plus the shared request plumbing
//! ([`ApiJson`], [`TradeFilterParams`]) they all use.

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequest, Request},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::{
    auth::require_api_key,
    error::AppError,
    models::{Account, Outcome, User},
    state::SharedState,
    store::{SortField, SortOrder, TradeQuery},
};

pub mod accounts;
pub mod analytics;
pub mod sessions;
pub mod trades;
pub mod users;

// ─── Router ───────────────────────────────────────────────────────────────────

pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health",                                  get(sessions::health_check))
        // ── Users ─────────────────────────────────────────────────────────────
        .route("/api/register",                            post(users::register))
        .route("/api/login",                               post(users::login))
        .route("/api/change-password",                     post(users::change_password))
        .route("/api/profile",                             put(users::update_profile))
        .route("/api/users",                               get(users::list_users))
        .route("/api/users/:email",                        delete(users::delete_user))
        // ── Accounts ──────────────────────────────────────────────────────────
        .route("/api/accounts",                            get(accounts::list_accounts).post(accounts::create_account))
        .route("/api/accounts/:account_id/pairs",          get(accounts::list_pairs))
        // ── Trades ────────────────────────────────────────────────────────────
        .route("/api/accounts/:account_id/trades",         get(trades::list_trades).post(trades::add_trade))
        .route("/api/accounts/:account_id/trades/:trade_id", delete(trades::delete_trade))
        // ── Analytics ─────────────────────────────────────────────────────────
        .route("/api/analytics/sessions",                  get(analytics::session_analytics))
        .route("/api/sessions",                            get(sessions::list_sessions))
        // ── Middleware ────────────────────────────────────────────────────────
        .layer(axum::middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ─── ApiJson ──────────────────────────────────────────────────────────────────

/// `Json<T>` whose rejection is our 400 JSON body instead of axum's plain text.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

// ─── Filter Params ────────────────────────────────────────────────────────────

/// Query string shared by the trade list and analytics endpoints.
///
/// The UI always sends every key, with `""` meaning "no filter".
#[derive(Debug, Default, Deserialize)]
pub struct TradeFilterParams {
    pub session:       Option<String>,
    pub profit_filter: Option<String>,
    pub sort_by:       Option<String>,
    pub sort_order:    Option<String>,
    pub start_date:    Option<String>,
    pub end_date:      Option<String>,
}

impl TradeFilterParams {
    pub fn apply(self, mut query: TradeQuery) -> Result<TradeQuery, AppError> {
        query.session = non_empty(self.session);

        if let Some(raw) = non_empty(self.profit_filter) {
            query.outcome = Some(Outcome::parse(&raw).ok_or_else(|| {
                AppError::BadRequest(format!("profit_filter must be 'wins' or 'losses', got '{raw}'"))
            })?);
        }
        if let Some(raw) = non_empty(self.sort_by) {
            query.sort.field = SortField::parse(&raw).ok_or_else(|| {
                AppError::BadRequest(format!("sort_by must be date, profit or session, got '{raw}'"))
            })?;
        }
        if let Some(raw) = non_empty(self.sort_order) {
            query.sort.order = SortOrder::parse(&raw).ok_or_else(|| {
                AppError::BadRequest(format!("sort_order must be asc or desc, got '{raw}'"))
            })?;
        }

        query.from = non_empty(self.start_date).map(|d| parse_date("start_date", &d)).transpose()?;
        query.to   = non_empty(self.end_date).map(|d| parse_date("end_date", &d)).transpose()?;
        Ok(query)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("{field} must be YYYY-MM-DD, got '{raw}'")))
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// An id that does not parse cannot exist, so it is a 404 rather than a 400.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("{what} not found")))
}

/// The caller's account, or 404 if it does not exist or belongs to someone else.
pub(crate) async fn owned_account(
    state: &SharedState,
    user: &User,
    raw_id: &str,
) -> Result<Account, AppError> {
    let id = parse_id(raw_id, "Account")?;
    state
        .store
        .find_account(&user.email, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".into()))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
