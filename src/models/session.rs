//! # models::session
//!
//! Defines [`SessionDefinition`] — a named trading window (London, New York,
//! Asia) with a display color — and [`SessionCatalog`], the static reference
//! list that trades are classified against.
//!
//! Sessions are reference data, never derived from trades.  A trade entered
//! at 14:00 UTC falls inside both London and New York; the catalog resolves
//! overlaps by list order, so it is tagged London.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Bucket name for trades that fall outside every session window, and for
/// records that carry no session at all.
pub const UNASSIGNED_SESSION: &str = "Other";

/// Display color of the [`UNASSIGNED_SESSION`] bucket (gray).
pub const UNASSIGNED_COLOR: &str = "#6b7280";

// ─── SessionDefinition ────────────────────────────────────────────────────────

/// A named UTC time window with inclusive bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDefinition {
    pub name:  String,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end:   NaiveTime,
    /// CSS hex color, e.g. `"#2563eb"`.
    pub color: String,
}

impl SessionDefinition {
    pub fn new(name: &str, start: (u32, u32), end: (u32, u32), color: &str) -> Self {
        Self {
            name:  name.to_string(),
            start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap_or(NaiveTime::MIN),
            end:   NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap_or(NaiveTime::MIN),
            color: color.to_string(),
        }
    }

    /// Returns `true` if `time` falls inside `[start, end]`.
    ///
    /// A window whose end is before its start wraps past midnight.
    #[inline]
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            time >= self.start && time <= self.end
        } else {
            time >= self.start || time <= self.end
        }
    }
}

// ─── SessionCatalog ───────────────────────────────────────────────────────────

/// The ordered list of known sessions.
#[derive(Debug, Clone)]
pub struct SessionCatalog {
    sessions: Vec<SessionDefinition>,
}

impl SessionCatalog {
    /// London / New York / Asia, in that precedence order.
    pub fn standard() -> Self {
        Self {
            sessions: vec![
                SessionDefinition::new("London",   (8, 0),  (16, 30), "#2563eb"),
                SessionDefinition::new("New York", (13, 0), (22, 0),  "#f97316"),
                SessionDefinition::new("Asia",     (0, 0),  (9, 0),   "#dc2626"),
            ],
        }
    }

    pub fn all(&self) -> &[SessionDefinition] {
        &self.sessions
    }

    pub fn get(&self, name: &str) -> Option<&SessionDefinition> {
        self.sessions.iter().find(|s| s.name == name)
    }

    /// First session whose window contains `hour:minute`, if any.
    pub fn classify(&self, hour: u32, minute: u32) -> Option<&SessionDefinition> {
        let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
        self.sessions.iter().find(|s| s.contains(time))
    }

    /// Session name and color for a trade entered at `hour:minute`, falling
    /// back to the unassigned bucket.
    pub fn label_for(&self, hour: u32, minute: u32) -> (String, String) {
        match self.classify(hour, minute) {
            Some(s) => (s.name.clone(), s.color.clone()),
            None    => (UNASSIGNED_SESSION.to_string(), UNASSIGNED_COLOR.to_string()),
        }
    }
}

impl Default for SessionCatalog {
    fn default() -> Self { Self::standard() }
}

// ─── HH:MM serde ──────────────────────────────────────────────────────────────

mod hhmm {
    use super::*;
    use serde::{de::Error, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("{:02}:{:02}", time.hour(), time.minute()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, "%H:%M").map_err(D::Error::custom)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
