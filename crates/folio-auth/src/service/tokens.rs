//! Refresh token persistence and single-use rotation.

use std::sync::Arc;

use folio_core::db::unix_timestamp;
use tracing::{debug, info, warn};

use super::error::{AuthError, AuthResult};
use crate::auth::{Claims, TokenError, TokenKind, TokenSigner, hash_token};
use crate::storage::{AuthDatabase, DatabaseError, User};

/// Access/refresh pair handed to a client.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenService {
    db: AuthDatabase,
    signer: Arc<dyn TokenSigner>,
}

impl TokenService {
    pub fn new(db: AuthDatabase, signer: Arc<dyn TokenSigner>) -> Self {
        Self { db, signer }
    }

    /// Sign a fresh pair and persist the refresh token's hash.
    pub async fn issue_pair(&self, user_id: &str) -> AuthResult<TokenPair> {
        let access = self.signer.issue(user_id, TokenKind::Access)?;
        let refresh = self.signer.issue(user_id, TokenKind::Refresh)?;

        let token_id = uuid::Uuid::new_v4().to_string();
        self.db
            .create_refresh_token(
                &token_id,
                user_id,
                &hash_token(&refresh.token),
                refresh.expires_at,
            )
            .await?;

        debug!(user_id, token_id, "Issued token pair");
        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
        })
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// The presented token is consumed by a conditional update on its hash,
    /// so of two concurrent rotations of the same token exactly one wins.
    pub async fn rotate(&self, presented: &str) -> AuthResult<(User, TokenPair)> {
        let old_hash = hash_token(presented);

        let claims = match self.signer.verify(presented, TokenKind::Refresh) {
            Ok(claims) => claims,
            Err(TokenError::Expired) => {
                self.db.delete_refresh_token(&old_hash).await?;
                return Err(AuthError::TokenExpired);
            }
            Err(e) => return Err(e.into()),
        };

        let Some(stored) = self.db.find_refresh_token(&old_hash).await? else {
            warn!(user_id = %claims.sub, "Refresh token not found (revoked or replayed)");
            return Err(AuthError::TokenInvalid);
        };

        if stored.user_id != claims.sub {
            warn!(user_id = %claims.sub, "Refresh token owner mismatch");
            self.db.delete_refresh_token(&old_hash).await?;
            return Err(AuthError::TokenInvalid);
        }

        if stored.expires_at <= unix_timestamp() {
            self.db.delete_refresh_token(&old_hash).await?;
            return Err(AuthError::TokenExpired);
        }

        let user = match self.db.get_user(&stored.user_id).await {
            Ok(user) => user,
            Err(DatabaseError::NotFound(_)) => {
                self.db.delete_refresh_token(&old_hash).await?;
                return Err(AuthError::TokenInvalid);
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = ensure_can_authenticate(&user) {
            let revoked = self.db.delete_user_refresh_tokens(&user.id).await?;
            warn!(user_id = %user.id, revoked, "Refresh by inactive or unverified account");
            return Err(e);
        }

        let access = self.signer.issue(&user.id, TokenKind::Access)?;
        let refresh = self.signer.issue(&user.id, TokenKind::Refresh)?;

        let rotated = self
            .db
            .rotate_refresh_token(&old_hash, &hash_token(&refresh.token), refresh.expires_at)
            .await?;
        if !rotated {
            warn!(user_id = %user.id, "Lost refresh rotation race");
            return Err(AuthError::TokenInvalid);
        }

        info!(user_id = %user.id, token_id = %stored.id, "Refresh token rotated");
        Ok((
            user,
            TokenPair {
                access_token: access.token,
                refresh_token: refresh.token,
            },
        ))
    }

    /// Delete every refresh token of a user.
    pub async fn revoke_user(&self, user_id: &str) -> AuthResult<u64> {
        let revoked = self.db.delete_user_refresh_tokens(user_id).await?;
        info!(user_id, revoked, "Revoked all refresh tokens");
        Ok(revoked)
    }

    /// Delete one refresh token, only if it belongs to `user_id`.
    pub async fn revoke_token(&self, user_id: &str, token: &str) -> AuthResult<bool> {
        let removed = self
            .db
            .delete_user_refresh_token(user_id, &hash_token(token))
            .await?;
        debug!(user_id, removed, "Revoke single refresh token");
        Ok(removed)
    }

    /// Verify an access token and check that its owner may still hold a
    /// session.
    pub async fn authenticate(&self, access_token: &str) -> AuthResult<Claims> {
        let claims = self.signer.verify(access_token, TokenKind::Access)?;
        let user = match self.db.get_user(&claims.sub).await {
            Ok(user) => user,
            Err(DatabaseError::NotFound(_)) => return Err(AuthError::TokenInvalid),
            Err(e) => return Err(e.into()),
        };
        ensure_can_authenticate(&user)?;
        Ok(claims)
    }
}

/// `AccountInactive` for a disabled account, `EmailNotVerified` for an
/// unverified one.
pub(super) fn ensure_can_authenticate(user: &User) -> AuthResult<()> {
    if !user.is_active {
        Err(AuthError::AccountInactive)
    } else if !user.email_verified {
        Err(AuthError::EmailNotVerified)
    } else {
        Ok(())
    }
}
