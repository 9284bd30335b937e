//! # store::postgres — PostgreSQL Journal Store
//!
//! ใช้ `sqlx` สำหรับ async PostgreSQL.  Queries are built at runtime
//! (`query` / `QueryBuilder`) so the crate compiles without a live database.
//!
//! ## Setup
//! 1. Create a database and set `DATABASE_URL` in `.env`
//! 2. `cargo run --features postgres`
//! 3. `migrations/001_init.sql` is applied on startup (idempotent)

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{postgres::PgPoolOptions, Executor, PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use super::{JournalStore, ProfileChanges, SortField, SortOrder, StoreError, StoreResult, TradeQuery};
use crate::models::{trade::Position, Account, Outcome, Role, Trade, User};

const MIGRATION: &str = include_str!("../../migrations/001_init.sql");

const TRADE_COLUMNS: &str = "id, account_id, owner, market, pair, side, entry_price, exit_price, \
     profit_amount, risk_reward, trade_date, hour, minute, strategy, image_url, notes, \
     session, session_color, created_at";

// ─── Pool Init ────────────────────────────────────────────────────────────────

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and apply the schema.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to PostgreSQL...");

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        pool.execute(MIGRATION)
            .await
            .context("Failed to run migration 001_init.sql")?;

        info!("✅ PostgreSQL connected and migrations applied");
        Ok(Self { pool })
    }
}

fn duplicate_or(err: sqlx::Error, what: String) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate(what),
        _ => StoreError::Database(err),
    }
}

// ─── Rows ─────────────────────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct UserRow {
    email:           String,
    name:            String,
    password_hash:   String,
    role:            String,
    profile_picture: Option<String>,
    created_at:      DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| StoreError::Corrupt(format!("user {} has role '{}'", row.email, row.role)))?;
        Ok(User {
            email:           row.email,
            name:            row.name,
            password_hash:   row.password_hash,
            role,
            profile_picture: row.profile_picture,
            created_at:      row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id:         Uuid,
    name:       String,
    owner:      String,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account { id: row.id, name: row.name, owner: row.owner, created_at: row.created_at }
    }
}

#[derive(sqlx::FromRow)]
struct TradeRow {
    id:            Uuid,
    account_id:    Uuid,
    owner:         String,
    market:        String,
    pair:          String,
    side:          String,
    entry_price:   f64,
    exit_price:    f64,
    profit_amount: f64,
    risk_reward:   String,
    trade_date:    NaiveDate,
    hour:          i16,
    minute:        i16,
    strategy:      String,
    image_url:     Option<String>,
    notes:         String,
    session:       Option<String>,
    session_color: Option<String>,
    created_at:    DateTime<Utc>,
}

impl TryFrom<TradeRow> for Trade {
    type Error = StoreError;

    fn try_from(row: TradeRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str| StoreError::Corrupt(format!("trade {}: {what}", row.id));
        let position = Position::parse(&row.side).ok_or_else(|| corrupt("unknown side"))?;
        let hour     = u32::try_from(row.hour).map_err(|_| corrupt("negative hour"))?;
        let minute   = u32::try_from(row.minute).map_err(|_| corrupt("negative minute"))?;

        Ok(Trade {
            id:            row.id,
            account_id:    row.account_id,
            owner:         row.owner,
            market:        row.market,
            pair:          row.pair,
            position,
            entry:         row.entry_price,
            exit:          row.exit_price,
            profit_amount: row.profit_amount,
            risk_reward:   row.risk_reward,
            date:          row.trade_date,
            hour,
            minute,
            strategy:      row.strategy,
            image_url:     row.image_url,
            notes:         row.notes,
            session:       row.session,
            session_color: row.session_color,
            created_at:    row.created_at,
        })
    }
}

// ─── Query Translation ────────────────────────────────────────────────────────

fn push_trade_filter(qb: &mut QueryBuilder<'_, Postgres>, query: &TradeQuery) {
    qb.push(" WHERE owner = ").push_bind(query.owner.clone());

    if let Some(account_id) = query.account_id {
        qb.push(" AND account_id = ").push_bind(account_id);
    }
    if let Some(session) = &query.session {
        qb.push(" AND session = ").push_bind(session.clone());
    }
    match query.outcome {
        Some(Outcome::Wins)   => { qb.push(" AND profit_amount > 0"); }
        Some(Outcome::Losses) => { qb.push(" AND profit_amount < 0"); }
        None                  => {}
    }
    if let Some(from) = query.from {
        qb.push(" AND trade_date >= ").push_bind(from);
    }
    if let Some(to) = query.to {
        qb.push(" AND trade_date <= ").push_bind(to);
    }

    let column = match query.sort.field {
        SortField::Date    => "trade_date",
        SortField::Profit  => "profit_amount",
        SortField::Session => "COALESCE(session, '')",
    };
    let direction = match query.sort.order {
        SortOrder::Asc  => "ASC",
        SortOrder::Desc => "DESC",
    };
    qb.push(format!(" ORDER BY {column} {direction}, created_at DESC"));
}

// ─── JournalStore ─────────────────────────────────────────────────────────────

#[async_trait]
impl JournalStore for PgStore {
    async fn find_user(&self, email: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            "SELECT email, name, password_hash, role, profile_picture, created_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn insert_user(&self, user: User) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO users (email, name, password_hash, role, profile_picture, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.profile_picture)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_or(e, format!("user {}", user.email)))?;
        Ok(())
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE email = $1")
            .bind(email)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_profile(&self, email: &str, changes: &ProfileChanges) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            "UPDATE users SET \
                 name = COALESCE($2, name), \
                 profile_picture = CASE WHEN $3 THEN $4 ELSE profile_picture END \
             WHERE email = $1 \
             RETURNING email, name, password_hash, role, profile_picture, created_at",
        )
        .bind(email)
        .bind(&changes.name)
        .bind(changes.profile_picture.is_some())
        .bind(changes.profile_picture.clone().flatten())
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        sqlx::query_as::<_, UserRow>(
            "SELECT email, name, password_hash, role, profile_picture, created_at \
             FROM users ORDER BY created_at, email",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
    }

    async fn delete_user(&self, email: &str) -> StoreResult<bool> {
        // accounts → trades cascade via foreign keys
        let result = sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_accounts(&self, owner: &str) -> StoreResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            "SELECT id, name, owner, created_at FROM accounts WHERE owner = $1 ORDER BY created_at",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Account::from).collect())
    }

    async fn find_account(&self, owner: &str, id: Uuid) -> StoreResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, name, owner, created_at FROM accounts WHERE id = $1 AND owner = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Account::from))
    }

    async fn insert_account(&self, account: Account) -> StoreResult<()> {
        sqlx::query("INSERT INTO accounts (id, name, owner, created_at) VALUES ($1, $2, $3, $4)")
            .bind(account.id)
            .bind(&account.name)
            .bind(&account.owner)
            .bind(account.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| duplicate_or(e, format!("account {}", account.id)))?;
        Ok(())
    }

    async fn find_trades(&self, query: &TradeQuery) -> StoreResult<Vec<Trade>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {TRADE_COLUMNS} FROM trades"));
        push_trade_filter(&mut qb, query);

        qb.build_query_as::<TradeRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Trade::try_from)
            .collect()
    }

    async fn insert_trade(&self, trade: Trade) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO trades ({TRADE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)"
        ))
        .bind(trade.id)
        .bind(trade.account_id)
        .bind(&trade.owner)
        .bind(&trade.market)
        .bind(&trade.pair)
        .bind(trade.position.as_str())
        .bind(trade.entry)
        .bind(trade.exit)
        .bind(trade.profit_amount)
        .bind(&trade.risk_reward)
        .bind(trade.date)
        .bind(trade.hour as i16)
        .bind(trade.minute as i16)
        .bind(&trade.strategy)
        .bind(&trade.image_url)
        .bind(&trade.notes)
        .bind(&trade.session)
        .bind(&trade.session_color)
        .bind(trade.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_or(e, format!("trade {}", trade.id)))?;
        Ok(())
    }

    async fn delete_trade(&self, owner: &str, account_id: Uuid, trade_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM trades WHERE id = $1 AND account_id = $2 AND owner = $3")
            .bind(trade_id)
            .bind(account_id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_pairs(&self, owner: &str, account_id: Uuid) -> StoreResult<Vec<String>> {
        let pairs = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT pair FROM trades WHERE owner = $1 AND account_id = $2 ORDER BY pair",
        )
        .bind(owner)
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(pairs)
    }
}
