//! Public surface of the credential and session flows.

use std::sync::Arc;

use folio_core::db::unix_timestamp;
use tracing::{debug, info, instrument};

use super::credentials::CredentialService;
use super::error::AuthResult;
use super::registration::RegistrationManager;
use super::reset::PasswordResetManager;
use super::tokens::TokenService;
use super::validate::require;
use super::{AuthSession, OtpIssued, record};
use crate::auth::{Claims, OtpEngine, PasswordHasher, TokenSigner};
use crate::mail::Mailer;
use crate::storage::{AuthDatabase, Role};

/// Row counts removed by one housekeeping pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    pub pending_registrations: u64,
    pub reset_requests: u64,
    pub refresh_tokens: u64,
}

#[derive(Clone)]
pub struct SessionController {
    db: AuthDatabase,
    registration: RegistrationManager,
    reset: PasswordResetManager,
    credentials: CredentialService,
    tokens: TokenService,
}

impl SessionController {
    pub fn new(
        db: AuthDatabase,
        hasher: Arc<dyn PasswordHasher>,
        signer: Arc<dyn TokenSigner>,
        otp: OtpEngine,
        mailer: Arc<dyn Mailer>,
    ) -> AuthResult<Self> {
        let tokens = TokenService::new(db.clone(), signer);
        let registration = RegistrationManager::new(
            db.clone(),
            Arc::clone(&hasher),
            otp.clone(),
            Arc::clone(&mailer),
            tokens.clone(),
        );
        let reset = PasswordResetManager::new(
            db.clone(),
            Arc::clone(&hasher),
            otp,
            mailer,
            tokens.clone(),
        );
        let credentials = CredentialService::new(db.clone(), hasher, tokens.clone())?;

        Ok(Self {
            db,
            registration,
            reset,
            credentials,
            tokens,
        })
    }

    #[instrument(skip_all, fields(op = "request_registration_otp"))]
    pub async fn request_registration_otp(
        &self,
        email: &str,
        full_name: &str,
        password: &str,
    ) -> AuthResult<OtpIssued> {
        self.registration.request(email, full_name, password).await
    }

    #[instrument(skip_all, fields(op = "resend_registration_otp"))]
    pub async fn resend_registration_otp(&self, email: &str) -> AuthResult<OtpIssued> {
        self.registration.resend(email).await
    }

    #[instrument(skip_all, fields(op = "confirm_registration"))]
    pub async fn confirm_registration(
        &self,
        email: &str,
        otp: &str,
        role: Option<Role>,
    ) -> AuthResult<AuthSession> {
        self.registration.confirm(email, otp, role).await
    }

    #[instrument(skip_all, fields(op = "login"))]
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        self.credentials.login(email, password).await
    }

    #[instrument(skip_all, fields(op = "refresh"))]
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        require(refresh_token, "refreshToken")?;
        match self.tokens.rotate(refresh_token).await {
            Ok((user, tokens)) => {
                record("auth.token_rotations", "success");
                Ok(AuthSession::new(user, tokens))
            }
            Err(e) => {
                record("auth.token_rotations", "rejected");
                Err(e)
            }
        }
    }

    /// Revoke one refresh token of the caller. Without a token this is a
    /// no-op; the access token simply runs out.
    #[instrument(skip_all, fields(op = "logout", user_id = %user_id))]
    pub async fn logout(&self, user_id: &str, refresh_token: Option<&str>) -> AuthResult<()> {
        match refresh_token.filter(|t| !t.trim().is_empty()) {
            Some(token) => {
                let removed = self.tokens.revoke_token(user_id, token).await?;
                info!(removed, "User logged out");
            }
            None => debug!("Logout without refresh token"),
        }
        Ok(())
    }

    #[instrument(skip_all, fields(op = "logout_all", user_id = %user_id))]
    pub async fn logout_all(&self, user_id: &str) -> AuthResult<()> {
        self.tokens.revoke_user(user_id).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(op = "change_password", user_id = %user_id))]
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        self.credentials
            .change_password(user_id, current_password, new_password)
            .await
    }

    #[instrument(skip_all, fields(op = "request_password_reset"))]
    pub async fn request_password_reset(&self, email: &str) -> AuthResult<OtpIssued> {
        self.reset.request(email).await
    }

    #[instrument(skip_all, fields(op = "verify_password_reset"))]
    pub async fn verify_password_reset(&self, email: &str, otp: &str) -> AuthResult<()> {
        self.reset.verify(email, otp).await
    }

    #[instrument(skip_all, fields(op = "reset_password"))]
    pub async fn reset_password(&self, email: &str, new_password: &str) -> AuthResult<()> {
        self.reset.reset(email, new_password).await
    }

    /// Verify a bearer access token against the signer and the owner's
    /// current status.
    pub async fn authenticate(&self, access_token: &str) -> AuthResult<Claims> {
        self.tokens.authenticate(access_token).await
    }

    pub async fn ping_store(&self) -> AuthResult<()> {
        Ok(self.db.ping().await?)
    }

    /// Drop expired staging records and refresh tokens.
    pub async fn purge_expired(&self) -> AuthResult<PurgeReport> {
        let now = unix_timestamp();
        let (pending_registrations, reset_requests) = self.db.purge_expired_staging(now).await?;
        let refresh_tokens = self.db.purge_expired_refresh_tokens(now).await?;
        Ok(PurgeReport {
            pending_registrations,
            reset_requests,
            refresh_tokens,
        })
    }
}
