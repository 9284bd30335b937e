//! # routes::users
//!
//! | Method | Path                   | Description                        |
//! |--------|------------------------|------------------------------------|
//! | POST   | `/api/register`        | สมัครสมาชิก (role = user)           |
//! | POST   | `/api/login`           | ตรวจรหัสผ่าน                        |
//! | POST   | `/api/change-password` | เปลี่ยนรหัสผ่าน                      |
//! | PUT    | `/api/profile`         | ชื่อ / รูปโปรไฟล์                    |
//! | GET    | `/api/users`           | รายชื่อผู้ใช้ทั้งหมด (ManageUsers)     |
//! | DELETE | `/api/users/:email`    | ลบผู้ใช้ (ManageUsers)               |

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{user::hash_password, Capability, Role, User},
    routes::ApiJson,
    state::SharedState,
    store::ProfileChanges,
};

#[derive(Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email:    String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    fn validated(&self) -> Result<(String, &str), AppError> {
        let email = self.email.trim().to_lowercase();
        if email.is_empty() || self.password.is_empty() {
            return Err(AppError::BadRequest("Email and password are required".into()));
        }
        Ok((email, self.password.as_str()))
    }
}

// ─── POST /api/register ───────────────────────────────────────────────────────

pub async fn register(
    State(state): State<SharedState>,
    ApiJson(body): ApiJson<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    let (email, password) = body.validated()?;
    if !email.contains('@') {
        return Err(AppError::BadRequest(format!("'{email}' is not an email address")));
    }

    let user = User::register(&email, password, Role::User).await?;
    let name = user.name.clone();

    state.store.insert_user(user).await.map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict("Email already registered".into()),
        other => other,
    })?;

    info!(%email, "📝 User registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok":      true,
            "message": "Registration successful",
            "email":   email,
            "name":    name,
        })),
    ))
}

// ─── POST /api/login ──────────────────────────────────────────────────────────

pub async fn login(
    State(state): State<SharedState>,
    ApiJson(body): ApiJson<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    let (email, password) = body.validated()?;

    let found = state.store.find_user(&email).await?;
    let verified = match &found {
        Some(user) => user.verify_password(password).await,
        None => false,
    };
    let Some(user) = found.filter(|_| verified) else {
        warn!(%email, "❌ Failed login");
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    };

    Ok(Json(json!({
        "ok":              true,
        "message":         "Login successful",
        "email":           user.email,
        "name":            user.name,
        "role":            user.role,
        "profile_picture": user.profile_picture,
    })))
}

// ─── POST /api/change-password ────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    #[serde(default)]
    pub email:            String,
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password:     String,
}

pub async fn change_password(
    State(state): State<SharedState>,
    ApiJson(body): ApiJson<ChangePassword>,
) -> Result<impl IntoResponse, AppError> {
    let email = body.email.trim().to_lowercase();
    if email.is_empty() || body.current_password.is_empty() || body.new_password.is_empty() {
        return Err(AppError::BadRequest("All fields are required".into()));
    }

    let user = state
        .store
        .find_user(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if !user.verify_password(&body.current_password).await {
        return Err(AppError::Unauthorized("Current password is incorrect".into()));
    }

    let new_hash = hash_password(&body.new_password).await?;
    if !state.store.update_password(&email, &new_hash).await? {
        return Err(AppError::NotFound("User not found".into()));
    }

    info!(%email, "🔑 Password changed");
    Ok(Json(json!({ "ok": true, "message": "Password changed successfully" })))
}

// ─── PUT /api/profile ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ProfileUpdate {
    pub name:            Option<String>,
    pub profile_picture: Option<String>,
}

pub async fn update_profile(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<ProfileUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let mut changes = ProfileChanges::default();

    if let Some(name) = body.name.map(|n| n.trim().to_string()) {
        if name.is_empty() {
            return Err(AppError::BadRequest("name cannot be blank".into()));
        }
        changes.name = Some(name);
    }

    if let Some(picture) = body.profile_picture {
        if picture.is_empty() {
            changes.profile_picture = Some(None);
        } else if picture.starts_with("data:image/") {
            changes.profile_picture = Some(Some(picture));
        } else {
            return Err(AppError::BadRequest("profile_picture must be a data:image/ URL".into()));
        }
    }

    // Only the touched columns are written.
    let updated = state
        .store
        .update_profile(&user.email, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(json!({ "ok": true, "user": updated })))
}

// ─── GET /api/users ───────────────────────────────────────────────────────────

pub async fn list_users(
    State(state): State<SharedState>,
    CurrentUser(caller): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Capability::ManageUsers)?;

    let users = state.store.list_users().await?;
    Ok(Json(json!({
        "ok":    true,
        "count": users.len(),
        "users": users,
    })))
}

// ─── DELETE /api/users/:email ─────────────────────────────────────────────────

pub async fn delete_user(
    State(state): State<SharedState>,
    CurrentUser(caller): CurrentUser,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Capability::ManageUsers)?;

    let email = email.trim().to_lowercase();
    let target = state
        .store
        .find_user(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if target.has_capability(Capability::ManageUsers) {
        return Err(AppError::BadRequest("Cannot delete admin account".into()));
    }

    if !state.store.delete_user(&email).await? {
        return Err(AppError::NotFound("User not found".into()));
    }

    info!(admin = %caller.email, deleted = %email, "🗑️ User deleted");
    Ok(Json(json!({ "ok": true, "message": "User deleted successfully" })))
}
