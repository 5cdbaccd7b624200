//! Data models for Folio auth storage.

use serde::{Deserialize, Serialize};

/// Account role. Stored as snake-case text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Regular,
    Editor,
    AdManager,
    Admin,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Editor => "editor",
            Self::AdManager => "ad_manager",
            Self::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
    pub email_verified_at: Option<i64>,
    pub last_login: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    /// Whether this account may authenticate at all.
    pub const fn can_authenticate(&self) -> bool {
        self.is_active && self.email_verified
    }
}

/// Client-facing projection of [`User`]; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
    pub email_verified_at: Option<i64>,
    pub last_login: Option<i64>,
    pub created_at: i64,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            is_active: user.is_active,
            email_verified: user.email_verified,
            email_verified_at: user.email_verified_at,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

/// Fields needed to create a verified account.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub full_name: &'a str,
    pub role: Role,
    pub email_verified_at: i64,
}

/// An unconfirmed signup awaiting OTP verification.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PendingRegistration {
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub otp_code: String,
    pub otp_expires_at: i64,
    pub attempts: i64,
    pub created_at: i64,
}

/// A password reset awaiting OTP verification and then the new password.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PasswordResetRequest {
    pub email: String,
    pub otp_code: String,
    pub otp_expires_at: i64,
    pub attempts: i64,
    pub verified: bool,
    pub created_at: i64,
}

/// A persisted refresh token. Only the SHA-256 of the token string is kept.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: i64,
    pub created_at: i64,
}
