//! # models::user
//!
//! Defines [`User`], its [`Role`], and the [`Capability`] check that gates
//! admin-only endpoints.
//!
//! Authorization never compares identities: an endpoint asks
//! `user.has_capability(Capability::ManageUsers)` and the role decides.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ─── Role / Capability ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

#[cfg(feature = "postgres")]
impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User  => "user",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "admin" => Some(Role::Admin),
            "user"  => Some(Role::User),
            _       => None,
        }
    }
}

/// Actions that not every user may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// List every registered user and delete non-admin users.
    ManageUsers,
}

// ─── User ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub email:           String,
    pub name:            String,
    #[serde(skip_serializing, default)]
    pub password_hash:   String,
    pub role:            Role,
    /// Avatar as a data URL.
    pub profile_picture: Option<String>,
    pub created_at:      DateTime<Utc>,
}

impl User {
    /// Hashes `password` with Argon2id.  The display name defaults to the
    /// local part of the email.
    pub async fn register(email: &str, password: &str, role: Role) -> Result<Self, AppError> {
        let email = email.trim().to_lowercase();
        let name = email.split('@').next().unwrap_or_default().to_string();

        Ok(Self {
            password_hash: hash_password(password).await?,
            email,
            name,
            role,
            profile_picture: None,
            created_at: Utc::now(),
        })
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::ManageUsers => self.role == Role::Admin,
        }
    }

    /// Fails with `Forbidden` when the role lacks `capability`.
    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.has_capability(capability) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("{capability:?} requires the admin role")))
        }
    }

    pub async fn verify_password(&self, password: &str) -> bool {
        let hash = self.password_hash.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || {
            PasswordHash::new(&hash)
                .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
                .unwrap_or(false)
        })
        .await
        .unwrap_or(false)
    }
}

// ─── Hashing ──────────────────────────────────────────────────────────────────

/// Argon2id hash in PHC string form, computed on the blocking pool.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {e}")))
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing task failed: {e}")))?
}

// ─── Tests ────────────────────────────────────────────────────────────────────
