//! # models::trade
//!
//! Defines [`Trade`] — one logged position with its realized P/L — and
//! [`NewTrade`], the unvalidated payload the journal UI posts.
//!
//! ## Outcome
//! The sign of `profit_amount` is the only source of truth for win/loss.
//! There is no stored "win" flag that could drift out of sync with it; a
//! break-even trade (`0.0`) is neither a win nor a loss.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::session::SessionCatalog,
};

// ─── Position ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    Buy,
    Sell,
}

#[cfg(feature = "postgres")]
impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Buy  => "Buy",
            Position::Sell => "Sell",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Buy"  => Some(Position::Buy),
            "Sell" => Some(Position::Sell),
            _      => None,
        }
    }
}

// ─── Outcome ──────────────────────────────────────────────────────────────────

/// Win/loss classification derived from the sign of a profit amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Wins,
    Losses,
}

impl Outcome {
    /// `None` for break-even.
    #[inline]
    pub fn of(profit_amount: f64) -> Option<Self> {
        if profit_amount > 0.0 {
            Some(Outcome::Wins)
        } else if profit_amount < 0.0 {
            Some(Outcome::Losses)
        } else {
            None
        }
    }

    #[inline]
    pub fn matches(&self, profit_amount: f64) -> bool {
        Outcome::of(profit_amount) == Some(*self)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "wins"   => Some(Outcome::Wins),
            "losses" => Some(Outcome::Losses),
            _        => None,
        }
    }
}

// ─── Trade ────────────────────────────────────────────────────────────────────

/// A journal entry, scoped to exactly one account and one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id:            Uuid,
    pub account_id:    Uuid,
    /// Email of the user who logged the trade.
    pub owner:         String,
    /// Market category, e.g. `"Forex"`, `"Crypto"`.
    pub market:        String,
    /// Instrument symbol, always uppercase, e.g. `"EURUSD"`.
    pub pair:          String,
    pub position:      Position,
    pub entry:         f64,
    pub exit:          f64,
    /// Signed realized P/L in account currency.
    pub profit_amount: f64,
    /// Ratio label such as `"1:2"`.
    pub risk_reward:   String,
    pub date:          NaiveDate,
    pub hour:          u32,
    pub minute:        u32,
    pub strategy:      String,
    /// Chart screenshot, usually a `data:image/...;base64,` URL.
    pub image_url:     Option<String>,
    pub notes:         String,
    pub session:       Option<String>,
    pub session_color: Option<String>,
    pub created_at:    DateTime<Utc>,
}

impl Trade {
    #[inline]
    pub fn outcome(&self) -> Option<Outcome> {
        Outcome::of(self.profit_amount)
    }
}

// ─── NewTrade ─────────────────────────────────────────────────────────────────

/// Request body for `POST /api/accounts/:id/trades`.
///
/// Numeric fields accept either a JSON number or a numeric string, since the
/// journal form posts whatever the input element holds.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTrade {
    #[serde(default)]
    pub market:        String,
    pub pair:          String,
    pub position:      Position,
    #[serde(default, deserialize_with = "amount")]
    pub entry:         f64,
    #[serde(default, deserialize_with = "amount")]
    pub exit:          f64,
    #[serde(deserialize_with = "amount")]
    pub profit_amount: f64,
    #[serde(default)]
    pub risk_reward:   String,
    pub date:          String,
    #[serde(default)]
    pub hour:          u32,
    #[serde(default)]
    pub minute:        u32,
    #[serde(default)]
    pub strategy:      String,
    #[serde(default)]
    pub image_url:     Option<String>,
    #[serde(default)]
    pub notes:         String,
    /// Explicit session choice; classified from `hour:minute` when absent.
    #[serde(default)]
    pub session:       Option<String>,
}

impl NewTrade {
    /// Validate and stamp the payload into a [`Trade`] owned by `owner`.
    pub fn into_trade(
        self,
        account_id: Uuid,
        owner:      &str,
        sessions:   &SessionCatalog,
    ) -> Result<Trade, AppError> {
        let pair = self.pair.trim().to_uppercase();
        if pair.is_empty() {
            return Err(AppError::BadRequest("pair is required".into()));
        }

        for (field, value) in [
            ("entry", self.entry),
            ("exit", self.exit),
            ("profit_amount", self.profit_amount),
        ] {
            if !value.is_finite() {
                return Err(AppError::BadRequest(format!("{field} must be a finite number")));
            }
        }

        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| AppError::BadRequest(format!("date must be YYYY-MM-DD, got '{}'", self.date)))?;

        if self.hour > 23 || self.minute > 59 {
            return Err(AppError::BadRequest(format!(
                "invalid time {}:{}", self.hour, self.minute
            )));
        }

        let image_url = self.image_url.filter(|u| !u.trim().is_empty());
        if let Some(url) = &image_url {
            if !is_acceptable_image_url(url) {
                return Err(AppError::BadRequest(
                    "image_url must be a data:image/ URL or an http(s) URL".into(),
                ));
            }
        }

        let (session, session_color) = match self.session.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                let def = sessions
                    .get(name)
                    .ok_or_else(|| AppError::BadRequest(format!("unknown session '{name}'")))?;
                (def.name.clone(), def.color.clone())
            }
            _ => sessions.label_for(self.hour, self.minute),
        };

        Ok(Trade {
            id:            Uuid::new_v4(),
            account_id,
            owner:         owner.to_string(),
            market:        self.market.trim().to_string(),
            pair,
            position:      self.position,
            entry:         self.entry,
            exit:          self.exit,
            // -0.0 == 0.0, but total_cmp orders them apart
            profit_amount: if self.profit_amount == 0.0 { 0.0 } else { self.profit_amount },
            risk_reward:   self.risk_reward.trim().to_string(),
            date,
            hour:          self.hour,
            minute:        self.minute,
            strategy:      self.strategy,
            image_url,
            notes:         self.notes,
            session:       Some(session),
            session_color: Some(session_color),
            created_at:    Utc::now(),
        })
    }
}

fn is_acceptable_image_url(url: &str) -> bool {
    url.starts_with("data:image/") || url.starts_with("https://") || url.starts_with("http://")
}

/// Accepts `12.5` or `"12.5"`; rejects anything else at deserialization time.
fn amount<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(d)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("'{s}' is not a number"))),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
