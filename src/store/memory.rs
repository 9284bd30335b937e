//! # store::memory
//!
//! In-process [`JournalStore`] — everything lives in `tokio::sync::RwLock`
//! guarded collections and is gone on restart.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{JournalStore, ProfileChanges, StoreError, StoreResult, TradeQuery};
use crate::models::{Account, Trade, User};

#[derive(Default)]
pub struct MemoryStore {
    /// Key = email.
    users:    RwLock<HashMap<String, User>>,
    accounts: RwLock<Vec<Account>>,
    trades:   RwLock<Vec<Trade>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JournalStore for MemoryStore {
    async fn find_user(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn insert_user(&self, user: User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(StoreError::Duplicate(format!("user {}", user.email)));
        }
        users.insert(user.email.clone(), user);
        Ok(())
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(email) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_profile(&self, email: &str, changes: &ProfileChanges) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(email) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(picture) = &changes.profile_picture {
            user.profile_picture = picture.clone();
        }
        Ok(Some(user.clone()))
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.email.cmp(&b.email)));
        Ok(users)
    }

    async fn delete_user(&self, email: &str) -> StoreResult<bool> {
        if self.users.write().await.remove(email).is_none() {
            return Ok(false);
        }
        self.accounts.write().await.retain(|a| a.owner != email);
        self.trades.write().await.retain(|t| t.owner != email);
        Ok(true)
    }

    async fn list_accounts(&self, owner: &str) -> StoreResult<Vec<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().filter(|a| a.owner == owner).cloned().collect())
    }

    async fn find_account(&self, owner: &str, id: Uuid) -> StoreResult<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.id == id && a.owner == owner).cloned())
    }

    async fn insert_account(&self, account: Account) -> StoreResult<()> {
        self.accounts.write().await.push(account);
        Ok(())
    }

    async fn find_trades(&self, query: &TradeQuery) -> StoreResult<Vec<Trade>> {
        let mut found: Vec<Trade> = {
            let trades = self.trades.read().await;
            trades.iter().filter(|t| query.matches(t)).cloned().collect()
        };
        query.sort.apply(&mut found);
        Ok(found)
    }

    async fn insert_trade(&self, trade: Trade) -> StoreResult<()> {
        self.trades.write().await.push(trade);
        Ok(())
    }

    async fn delete_trade(&self, owner: &str, account_id: Uuid, trade_id: Uuid) -> StoreResult<bool> {
        let mut trades = self.trades.write().await;
        let before = trades.len();
        trades.retain(|t| !(t.id == trade_id && t.account_id == account_id && t.owner == owner));
        Ok(trades.len() < before)
    }

    async fn list_pairs(&self, owner: &str, account_id: Uuid) -> StoreResult<Vec<String>> {
        let trades = self.trades.read().await;
        let pairs: BTreeSet<&str> = trades
            .iter()
            .filter(|t| t.owner == owner && t.account_id == account_id)
            .map(|t| t.pair.as_str())
            .collect();
        Ok(pairs.into_iter().map(str::to_string).collect())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};

    use crate::{
        analytics::{summarize, AverageMethod},
        models::{trade::Position, Outcome, Role},
        store::{SortField, SortOrder, TradeSort},
    };

    const ALICE: &str = "alice@example.com";
    const BOB: &str = "bob@example.com";

    fn trade(owner: &str, account_id: Uuid, pl: f64, day: u32, session: &str) -> Trade {
        Trade {
            id:            Uuid::new_v4(),
            account_id,
            owner:         owner.into(),
            market:        "Crypto".into(),
            pair:          if pl >= 0.0 { "BTCUSD".into() } else { "ETHUSD".into() },
            position:      Position::Sell,
            entry:         100.0,
            exit:          90.0,
            profit_amount: pl,
            risk_reward:   "1:3".into(),
            date:          NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            hour:          10,
            minute:        0,
            strategy:      "breakout".into(),
            image_url:     None,
            notes:         String::new(),
            session:       Some(session.into()),
            session_color: None,
            created_at:    Utc::now(),
        }
    }

    async fn seeded() -> (MemoryStore, Uuid, Uuid) {
        let store = MemoryStore::new();
        let main = Uuid::new_v4();
        let side = Uuid::new_v4();
        for t in [
            trade(ALICE, main, 30.0, 1, "London"),
            trade(ALICE, main, -10.0, 3, "London"),
            trade(ALICE, main, 55.0, 2, "New York"),
            trade(ALICE, main, 0.0, 4, "Asia"),
            trade(ALICE, side, -99.0, 5, "London"),
            trade(BOB, main, 1000.0, 6, "London"),
        ] {
            store.insert_trade(t).await.unwrap();
        }
        (store, main, side)
    }

    #[tokio::test]
    async fn test_scoped_to_owner_and_account() {
        let (store, main, _) = seeded().await;
        let found = store.find_trades(&TradeQuery::for_account(ALICE, main)).await.unwrap();
        assert_eq!(found.len(), 4);
        assert!(found.iter().all(|t| t.owner == ALICE && t.account_id == main));
    }

    #[tokio::test]
    async fn test_default_order_is_newest_date_first() {
        let (store, main, _) = seeded().await;
        let found = store.find_trades(&TradeQuery::for_account(ALICE, main)).await.unwrap();
        let days: Vec<u32> = found.iter().map(|t| chrono::Datelike::day(&t.date)).collect();
        assert_eq!(days, vec![4, 3, 2, 1]);
    }

    #[tokio::test]
    async fn test_sort_by_profit_ascending() {
        let (store, main, _) = seeded().await;
        let mut query = TradeQuery::for_account(ALICE, main);
        query.sort = TradeSort { field: SortField::Profit, order: SortOrder::Asc };
        let pls: Vec<f64> = store.find_trades(&query).await.unwrap()
            .iter().map(|t| t.profit_amount).collect();
        assert_eq!(pls, vec![-10.0, 0.0, 30.0, 55.0]);
    }

    #[tokio::test]
    async fn test_wins_filter_applies_before_summary() {
        let (store, main, _) = seeded().await;
        let mut query = TradeQuery::for_account(ALICE, main);
        query.outcome = Some(Outcome::Wins);
        let found = store.find_trades(&query).await.unwrap();
        assert!(found.iter().all(|t| t.profit_amount > 0.0));

        let s = summarize(&found, AverageMethod::Mean);
        assert_eq!(s.total_trades, 2);
        assert_eq!(s.losing_trades, 0);
        assert_eq!(s.win_rate, 100.0);
    }

    #[tokio::test]
    async fn test_session_filter_with_no_match_is_empty() {
        let (store, main, _) = seeded().await;
        let mut query = TradeQuery::for_account(ALICE, main);
        query.session = Some("Sydney".into());
        let found = store.find_trades(&query).await.unwrap();
        assert!(found.is_empty());
        assert_eq!(summarize(&found, AverageMethod::Mean).total_trades, 0);
    }

    #[tokio::test]
    async fn test_owner_wide_date_range() {
        let (store, _, _) = seeded().await;
        let mut query = TradeQuery::for_owner(ALICE);
        query.from = NaiveDate::from_ymd_opt(2024, 5, 3);
        query.to = NaiveDate::from_ymd_opt(2024, 5, 5);
        let found = store.find_trades(&query).await.unwrap();
        assert_eq!(found.len(), 3);
    }

    #[tokio::test]
    async fn test_ties_fall_back_to_newest_created() {
        let store = MemoryStore::new();
        let account = Uuid::new_v4();
        let mut older = trade(ALICE, account, 1.0, 1, "London");
        older.created_at = Utc::now() - Duration::minutes(5);
        let newer = trade(ALICE, account, 2.0, 1, "London");
        store.insert_trade(older.clone()).await.unwrap();
        store.insert_trade(newer.clone()).await.unwrap();

        let found = store.find_trades(&TradeQuery::for_account(ALICE, account)).await.unwrap();
        assert_eq!(found[0].id, newer.id);
        assert_eq!(found[1].id, older.id);
    }

    #[tokio::test]
    async fn test_delete_trade_requires_matching_scope() {
        let (store, main, side) = seeded().await;
        let target = store.find_trades(&TradeQuery::for_account(ALICE, main)).await.unwrap()[0].id;

        assert!(!store.delete_trade(BOB, main, target).await.unwrap());
        assert!(!store.delete_trade(ALICE, side, target).await.unwrap());
        assert!(store.delete_trade(ALICE, main, target).await.unwrap());
        assert!(!store.delete_trade(ALICE, main, target).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_pairs_distinct_sorted() {
        let (store, main, _) = seeded().await;
        let pairs = store.list_pairs(ALICE, main).await.unwrap();
        assert_eq!(pairs, vec!["BTCUSD".to_string(), "ETHUSD".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_user_rejected() {
        let store = MemoryStore::new();
        let user = User::register(ALICE, "pw", Role::User).await.unwrap();
        store.insert_user(user.clone()).await.unwrap();
        assert!(matches!(store.insert_user(user).await, Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let (store, main, _) = seeded().await;
        store.insert_user(User::register(ALICE, "pw", Role::User).await.unwrap()).await.unwrap();
        store.insert_account(Account::new(ALICE, Some("Main"))).await.unwrap();

        assert!(store.delete_user(ALICE).await.unwrap());
        assert!(store.list_accounts(ALICE).await.unwrap().is_empty());
        assert!(store.find_trades(&TradeQuery::for_account(ALICE, main)).await.unwrap().is_empty());
        assert_eq!(store.find_trades(&TradeQuery::for_account(BOB, main)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_profile_update_keeps_concurrent_password_change() {
        let store = MemoryStore::new();
        store.insert_user(User::register(ALICE, "old", Role::User).await.unwrap()).await.unwrap();

        // Profile request loaded the user before the password changed.
        let stale = store.find_user(ALICE).await.unwrap().unwrap();
        let new_hash = crate::models::user::hash_password("new").await.unwrap();
        assert!(store.update_password(ALICE, &new_hash).await.unwrap());

        let changes = ProfileChanges { name: Some("Alice".into()), ..ProfileChanges::default() };
        let updated = store.update_profile(&stale.email, &changes).await.unwrap().unwrap();
        assert_eq!(updated.name, "Alice");

        let stored = store.find_user(ALICE).await.unwrap().unwrap();
        assert!(stored.verify_password("new").await);
        assert!(!stored.verify_password("old").await);
    }

    #[tokio::test]
    async fn test_password_change_keeps_profile_fields() {
        let store = MemoryStore::new();
        store.insert_user(User::register(ALICE, "pw", Role::User).await.unwrap()).await.unwrap();

        let changes = ProfileChanges {
            name:            Some("Alice".into()),
            profile_picture: Some(Some("data:image/png;base64,AAAA".into())),
        };
        store.update_profile(ALICE, &changes).await.unwrap();
        let new_hash = crate::models::user::hash_password("next").await.unwrap();
        store.update_password(ALICE, &new_hash).await.unwrap();

        let stored = store.find_user(ALICE).await.unwrap().unwrap();
        assert_eq!(stored.name, "Alice");
        assert!(stored.profile_picture.is_some());
    }

    #[tokio::test]
    async fn test_profile_picture_cleared_and_missing_user() {
        let store = MemoryStore::new();
        store.insert_user(User::register(ALICE, "pw", Role::User).await.unwrap()).await.unwrap();
        store.update_profile(ALICE, &ProfileChanges {
            profile_picture: Some(Some("data:image/png;base64,AAAA".into())),
            ..ProfileChanges::default()
        }).await.unwrap();

        let cleared = store.update_profile(ALICE, &ProfileChanges {
            profile_picture: Some(None),
            ..ProfileChanges::default()
        }).await.unwrap().unwrap();
        assert!(cleared.profile_picture.is_none());
        assert_eq!(cleared.name, "alice");

        assert!(store.update_profile(BOB, &ProfileChanges::default()).await.unwrap().is_none());
        assert!(!store.update_password(BOB, "x").await.unwrap());
    }
}
