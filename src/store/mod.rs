//! # store — Journal Persistence
//!
//! [`JournalStore`] is the seam between the HTTP layer and whatever holds the
//! data.  Two implementations:
//!
//! | Backend               | When                                              |
//! |-----------------------|---------------------------------------------------|
//! | [`MemoryStore`]       | default; dev mode and tests                       |
//! | `PgStore`             | `--features postgres` **and** `DATABASE_URL` set  |
//!
//! Trade queries are expressed once as a [`TradeQuery`]; the memory store
//! evaluates it with [`TradeQuery::matches`] + [`TradeSort::apply`], the
//! Postgres store translates it to SQL.  Both must return the same rows in
//! the same order.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Account, Outcome, Trade, User};

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryStore;

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key already exists.
    #[error("{0} already exists")]
    Duplicate(String),

    /// A stored row could not be mapped back into a model.
    #[cfg(feature = "postgres")]
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ─── Sorting ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Date,
    Profit,
    Session,
}

impl SortField {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "date"    => Some(SortField::Date),
            "profit"  => Some(SortField::Profit),
            "session" => Some(SortField::Session),
            _         => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc"  => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _      => None,
        }
    }
}

/// Default is newest trade date first.  Ties always fall back to
/// `created_at`, newest first, regardless of `order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TradeSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl TradeSort {
    pub fn compare(&self, a: &Trade, b: &Trade) -> Ordering {
        let primary = match self.field {
            SortField::Date    => a.date.cmp(&b.date),
            SortField::Profit  => a.profit_amount.total_cmp(&b.profit_amount),
            SortField::Session => a.session.as_deref().unwrap_or("")
                .cmp(b.session.as_deref().unwrap_or("")),
        };
        let primary = match self.order {
            SortOrder::Asc  => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| b.created_at.cmp(&a.created_at))
    }

    pub fn apply(&self, trades: &mut [Trade]) {
        trades.sort_by(|a, b| self.compare(a, b));
    }
}

// ─── TradeQuery ───────────────────────────────────────────────────────────────

/// Filter for [`JournalStore::find_trades`].
///
/// `owner` is mandatory: no query ever crosses users.  `account_id = None`
/// spans all of the owner's accounts.
#[derive(Debug, Clone, Default)]
pub struct TradeQuery {
    pub owner:      String,
    pub account_id: Option<Uuid>,
    pub session:    Option<String>,
    pub outcome:    Option<Outcome>,
    /// Inclusive.
    pub from:       Option<NaiveDate>,
    /// Inclusive.
    pub to:         Option<NaiveDate>,
    pub sort:       TradeSort,
}

impl TradeQuery {
    pub fn for_account(owner: &str, account_id: Uuid) -> Self {
        Self {
            owner: owner.to_string(),
            account_id: Some(account_id),
            ..Self::default()
        }
    }

    pub fn for_owner(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            ..Self::default()
        }
    }

    pub fn matches(&self, trade: &Trade) -> bool {
        trade.owner == self.owner
            && self.account_id.map_or(true, |id| trade.account_id == id)
            && self.session.as_deref().map_or(true, |s| trade.session.as_deref() == Some(s))
            && self.outcome.map_or(true, |o| o.matches(trade.profit_amount))
            && self.from.map_or(true, |d| trade.date >= d)
            && self.to.map_or(true, |d| trade.date <= d)
    }
}

// ─── ProfileChanges ───────────────────────────────────────────────────────────

/// Partial profile update.  `None` leaves a field untouched;
/// `profile_picture: Some(None)` clears the avatar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub name:            Option<String>,
    pub profile_picture: Option<Option<String>>,
}

// ─── JournalStore ─────────────────────────────────────────────────────────────

#[async_trait]
pub trait JournalStore: Send + Sync {
    // ── Users ─────────────────────────────────────────────────────────────────
    async fn find_user(&self, email: &str) -> StoreResult<Option<User>>;
    /// Fails with [`StoreError::Duplicate`] if the email is taken.
    async fn insert_user(&self, user: User) -> StoreResult<()>;
    /// Replaces only the password hash.  Returns `false` if no such user exists.
    async fn update_password(&self, email: &str, password_hash: &str) -> StoreResult<bool>;
    /// Applies only the fields set in `changes` and returns the stored user.
    async fn update_profile(&self, email: &str, changes: &ProfileChanges) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    /// Also removes the user's accounts and trades.
    async fn delete_user(&self, email: &str) -> StoreResult<bool>;

    // ── Accounts ──────────────────────────────────────────────────────────────
    async fn list_accounts(&self, owner: &str) -> StoreResult<Vec<Account>>;
    async fn find_account(&self, owner: &str, id: Uuid) -> StoreResult<Option<Account>>;
    async fn insert_account(&self, account: Account) -> StoreResult<()>;

    // ── Trades ────────────────────────────────────────────────────────────────
    /// Matching trades, ordered by `query.sort`.
    async fn find_trades(&self, query: &TradeQuery) -> StoreResult<Vec<Trade>>;
    async fn insert_trade(&self, trade: Trade) -> StoreResult<()>;
    /// Deletes only when the trade belongs to both `owner` and `account_id`.
    async fn delete_trade(&self, owner: &str, account_id: Uuid, trade_id: Uuid) -> StoreResult<bool>;
    /// Distinct pairs the owner has traded in `account_id`, sorted.
    async fn list_pairs(&self, owner: &str, account_id: Uuid) -> StoreResult<Vec<String>>;
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::models::trade::Position;

    fn trade(session: Option<&str>, minutes_ago: i64) -> Trade {
        Trade {
            id:            Uuid::new_v4(),
            account_id:    Uuid::new_v4(),
            owner:         "trader@example.com".into(),
            market:        "Forex".into(),
            pair:          "EURUSD".into(),
            position:      Position::Buy,
            entry:         1.0,
            exit:          1.1,
            profit_amount: 10.0,
            risk_reward:   "1:2".into(),
            date:          NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            hour:          9,
            minute:        0,
            strategy:      String::new(),
            image_url:     None,
            notes:         String::new(),
            session:       session.map(str::to_string),
            session_color: None,
            created_at:    Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    fn sessions_sorted(trades: &mut [Trade], order: SortOrder) -> Vec<Option<String>> {
        TradeSort { field: SortField::Session, order }.apply(trades);
        trades.iter().map(|t| t.session.clone()).collect()
    }

    #[test]
    fn test_sort_by_session_ascending() {
        let mut trades = vec![
            trade(Some("New York"), 1),
            trade(Some("Asia"), 2),
            trade(None, 3),
            trade(Some("London"), 4),
        ];
        assert_eq!(
            sessions_sorted(&mut trades, SortOrder::Asc),
            vec![None, Some("Asia".into()), Some("London".into()), Some("New York".into())]
        );
    }

    #[test]
    fn test_sort_by_session_descending() {
        let mut trades = vec![
            trade(Some("Asia"), 1),
            trade(None, 2),
            trade(Some("New York"), 3),
            trade(Some("London"), 4),
        ];
        assert_eq!(
            sessions_sorted(&mut trades, SortOrder::Desc),
            vec![Some("New York".into()), Some("London".into()), Some("Asia".into()), None]
        );
    }

    #[test]
    fn test_session_ties_newest_created_first_in_both_orders() {
        for order in [SortOrder::Asc, SortOrder::Desc] {
            let older = trade(Some("London"), 10);
            let newer = trade(Some("London"), 1);
            let mut trades = vec![older.clone(), newer.clone()];
            TradeSort { field: SortField::Session, order }.apply(&mut trades);
            assert_eq!(trades[0].id, newer.id);
            assert_eq!(trades[1].id, older.id);
        }
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!(SortField::parse("session"), Some(SortField::Session));
        assert_eq!(SortField::parse("Session"), None);
        assert_eq!(SortOrder::parse("asc"), Some(SortOrder::Asc));
        assert_eq!(SortOrder::parse("up"), None);
    }
}
