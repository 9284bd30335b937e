//! # Trade Journal — Personal Trading Journal Backend
//!
//! ```text
//!  ┌─────────────┐  X-User-Email            ┌─────────────────────────────┐
//!  │  Journal UI │ ───────────────────────▶ │ AppState                    │
//!  └─────────────┘                          │ ├─ store (memory | postgres)│
//!     POST /api/accounts/:id/trades         │ ├─ sessions (London/NY/Asia)│
//!     GET  /api/accounts/:id/trades  📊     │ └─ config                   │
//!     GET  /api/analytics/sessions   📊     └──────────────┬──────────────┘
//!                                                          │ find_trades(query)
//!                                                          ▼
//!                                           analytics::summarize() → TradeSummary
//! ```

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod analytics;
mod auth;
mod config;
mod error;
mod models;
mod routes;
mod state;
mod store;

use config::AppConfig;
use routes::build_router;
use state::build_state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env ──────────────────────────────────────────────────────────
    dotenvy::dotenv().ok();

    // ── 2. Structured logging ─────────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("trade_journal=debug".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!(r#"

  ╔═══════════════════════════════════════════════════════╗
  ║              TRADE JOURNAL — Backend                  ║
  ║      Accounts · Trades · Sessions · Analytics         ║
  ╚═══════════════════════════════════════════════════════╝"#);

    // ── 3. Config + shared state ──────────────────────────────────────────────
    let config = AppConfig::from_env()?;
    let addr = config.bind_addr;
    info!(
        api_key        = config.api_key.is_some(),
        average_method = ?config.average_method,
        max_body_bytes = config.max_body_bytes,
        "Configuration loaded"
    );

    let state = build_state(config).await?;

    // ── 4. Router ─────────────────────────────────────────────────────────────
    let app = build_router(state);

    // ── 5. Bind & Serve ───────────────────────────────────────────────────────
    info!(?addr, "🚀 Trade Journal server starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
