//! # config — อ่าน Config จาก Environment Variables
//!
//! Everything is optional; defaults give a working dev server on port 5000
//! with an in-memory store and no API key.

use std::net::SocketAddr;

use anyhow::{bail, Context};

use crate::analytics::AverageMethod;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr:      SocketAddr,
    /// `None` = dev mode, no `X-API-Key` check.
    pub api_key:        Option<String>,
    /// Seeded at startup with the admin role if missing.
    pub admin_email:    String,
    pub admin_password: String,
    pub admin_name:     String,
    /// Only used when built with `--features postgres`.
    pub database_url:   Option<String>,
    /// Upper bound on request bodies (trades carry data-URL screenshots).
    pub max_body_bytes: usize,
    pub average_method: AverageMethod,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source; unset and empty are the same.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let bind_addr = get_or("BIND_ADDR", "0.0.0.0:5000")
            .parse()
            .context("BIND_ADDR must be host:port")?;

        let max_body_bytes = get_or("MAX_BODY_BYTES", "8388608")
            .trim()
            .parse()
            .context("MAX_BODY_BYTES must be a number")?;

        let average_method = match AverageMethod::parse(&get_or("AVERAGE_METHOD", "mean")) {
            Some(m) => m,
            None => bail!("Unknown AVERAGE_METHOD. Use 'mean' or 'largest'"),
        };

        Ok(Self {
            bind_addr,
            api_key:        get("API_KEY"),
            admin_email:    get_or("ADMIN_EMAIL", "admin@journal.local").trim().to_lowercase(),
            admin_password: get_or("ADMIN_PASSWORD", "admin"),
            admin_name:     get_or("ADMIN_NAME", "Admin"),
            database_url:   get("DATABASE_URL"),
            max_body_bytes,
            average_method,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr:      SocketAddr::from(([0, 0, 0, 0], 5000)),
            api_key:        None,
            admin_email:    "admin@journal.local".to_string(),
            admin_password: "admin".to_string(),
            admin_name:     "Admin".to_string(),
            database_url:   None,
            max_body_bytes: 8 * 1024 * 1024,
            average_method: AverageMethod::Mean,
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
