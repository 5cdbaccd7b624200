//! Password login and password change.

use std::sync::Arc;

use folio_core::db::unix_timestamp;
use tracing::{info, warn};

use super::error::{AuthError, AuthResult};
use super::tokens::{TokenService, ensure_can_authenticate};
use super::validate::{normalize_email, require, validate_password};
use super::{AuthSession, record};
use crate::auth::PasswordHasher;
use crate::storage::{AuthDatabase, DatabaseError};

#[derive(Clone)]
pub struct CredentialService {
    db: AuthDatabase,
    hasher: Arc<dyn PasswordHasher>,
    tokens: TokenService,
    /// Verified against when the email is unknown, so both failure paths
    /// cost one argon2 run.
    dummy_hash: Arc<str>,
}

impl CredentialService {
    pub fn new(
        db: AuthDatabase,
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenService,
    ) -> AuthResult<Self> {
        let dummy_hash = hasher.hash(&uuid::Uuid::new_v4().to_string())?;
        Ok(Self {
            db,
            hasher,
            tokens,
            dummy_hash: dummy_hash.into(),
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        let email = normalize_email(email)?;
        require(password, "password")?;

        let user = self.db.find_user_by_email(&email).await?;
        let hash = user
            .as_ref()
            .map_or(&*self.dummy_hash, |u| u.password_hash.as_str());
        let matches = self.hasher.verify(password, hash)?;

        let Some(mut user) = user.filter(|_| matches) else {
            warn!("Login failed: invalid credentials");
            record("auth.logins", "invalid_credentials");
            return Err(AuthError::InvalidCredentials);
        };

        if !user.is_active {
            record("auth.logins", "inactive");
            return Err(AuthError::AccountInactive);
        }
        if !user.email_verified {
            record("auth.logins", "unverified");
            return Err(AuthError::EmailNotVerified);
        }

        let now = unix_timestamp();
        self.db.touch_last_login(&user.id, now).await?;
        user.last_login = Some(now);

        let tokens = self.tokens.issue_pair(&user.id).await?;
        record("auth.logins", "success");
        info!(user_id = %user.id, "User logged in");
        Ok(AuthSession::new(user, tokens))
    }

    /// Replace the password after checking the current one; every refresh
    /// token of the user is revoked.
    pub async fn change_password(
        &self,
        user_id: &str,
        current: &str,
        new: &str,
    ) -> AuthResult<()> {
        require(current, "currentPassword")?;
        validate_password(new)?;

        let user = match self.db.get_user(user_id).await {
            Ok(user) => user,
            Err(DatabaseError::NotFound(_)) => return Err(AuthError::TokenInvalid),
            Err(e) => return Err(e.into()),
        };
        ensure_can_authenticate(&user)?;

        if !self.hasher.verify(current, &user.password_hash)? {
            warn!(user_id, "Password change rejected: wrong current password");
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = self.hasher.hash(new)?;
        self.db.update_password_hash(&user.id, &password_hash).await?;
        let revoked = self.tokens.revoke_user(&user.id).await?;

        info!(user_id, revoked, "Password changed");
        Ok(())
    }
}
