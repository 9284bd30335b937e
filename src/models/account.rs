//! # models::account
//!
//! An [`Account`] partitions one user's trades (e.g. "Prop Firm", "Personal").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_ACCOUNT_NAME: &str = "New Account";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id:         Uuid,
    pub name:       String,
    /// Email of the owning user.
    pub owner:      String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Blank or missing names fall back to [`DEFAULT_ACCOUNT_NAME`].
    pub fn new(owner: &str, name: Option<&str>) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_ACCOUNT_NAME);

        Self {
            id:         Uuid::new_v4(),
            name:       name.to_string(),
            owner:      owner.to_string(),
            created_at: Utc::now(),
        }
    }
}
