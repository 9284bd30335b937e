//! # state
//!
//! The journal's **shared application state**.  Holds no per-user mutable
//! data of its own: which account a request aggregates over always comes from
//! the request path, never from a server-side "current account".
//!
//! `Arc<AppState>` is cloned cheaply into every Axum handler via
//! `axum::extract::State`.

use std::sync::Arc;

use tracing::info;

use crate::{
    config::AppConfig,
    error::AppError,
    models::{Role, SessionCatalog, User},
    store::{JournalStore, MemoryStore},
};

// ─── AppState ─────────────────────────────────────────────────────────────────

/// Top-level shared state injected into every Axum handler.
pub struct AppState {
    /// Users, accounts and trades.
    pub store:    Arc<dyn JournalStore>,
    /// Static session reference list (London / New York / Asia).
    pub sessions: SessionCatalog,
    pub config:   AppConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn JournalStore>, config: AppConfig) -> Self {
        Self {
            store,
            sessions: SessionCatalog::standard(),
            config,
        }
    }

    /// Create the configured admin user if it does not exist yet.
    pub async fn seed_admin(&self) -> Result<(), AppError> {
        let email = &self.config.admin_email;
        if self.store.find_user(email).await?.is_some() {
            info!(%email, "Admin user already exists");
            return Ok(());
        }

        let mut admin = User::register(email, &self.config.admin_password, Role::Admin).await?;
        admin.name = self.config.admin_name.clone();
        self.store.insert_user(admin).await?;
        info!(%email, "👑 Created admin user");
        Ok(())
    }
}

/// Convenience type alias
pub type SharedState = Arc<AppState>;

/// Pick the store backend from config and seed the admin account.
pub async fn build_state(config: AppConfig) -> anyhow::Result<SharedState> {
    let store = open_store(&config).await?;
    let state = Arc::new(AppState::new(store, config));
    state.seed_admin().await?;
    Ok(state)
}

#[cfg(feature = "postgres")]
async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn JournalStore>> {
    match &config.database_url {
        Some(url) => Ok(Arc::new(crate::store::postgres::PgStore::connect(url).await?)),
        None => {
            info!("DATABASE_URL not set — using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn JournalStore>> {
    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL is set but the postgres feature is off — using in-memory store");
    }
    Ok(Arc::new(MemoryStore::new()))
}
