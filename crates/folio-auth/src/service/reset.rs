//! Password reset: request a code, verify it, then set the new password.

use std::sync::Arc;

use folio_core::db::unix_timestamp;
use tracing::{debug, info, warn};

use super::error::{AuthError, AuthResult};
use super::tokens::TokenService;
use super::validate::{normalize_email, validate_otp, validate_password};
use super::{OtpIssued, record};
use crate::auth::otp::{AttemptOutcome, MAX_OTP_ATTEMPTS, OTP_TTL_SECS};
use crate::auth::{OtpCheck, OtpEngine, PasswordHasher};
use crate::mail::templates::{OtpPurpose, otp_notice};
use crate::mail::{self, Mailer};
use crate::storage::AuthDatabase;

#[derive(Clone)]
pub struct PasswordResetManager {
    db: AuthDatabase,
    hasher: Arc<dyn PasswordHasher>,
    otp: OtpEngine,
    mailer: Arc<dyn Mailer>,
    tokens: TokenService,
}

impl PasswordResetManager {
    pub fn new(
        db: AuthDatabase,
        hasher: Arc<dyn PasswordHasher>,
        otp: OtpEngine,
        mailer: Arc<dyn Mailer>,
        tokens: TokenService,
    ) -> Self {
        Self {
            db,
            hasher,
            otp,
            mailer,
            tokens,
        }
    }

    /// Unknown emails get the same answer as known ones and nothing happens.
    pub async fn request(&self, email: &str) -> AuthResult<OtpIssued> {
        let email = normalize_email(email)?;
        let issued = OtpIssued {
            email: email.clone(),
            expires_in: OTP_TTL_SECS,
        };

        let Some(user) = self.db.find_user_by_email(&email).await? else {
            debug!("Password reset requested for unknown email");
            return Ok(issued);
        };
        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        let otp = self.otp.issue(unix_timestamp());
        self.db
            .upsert_reset_request(&email, &otp.code, otp.expires_at)
            .await?;
        mail::dispatch(
            &self.mailer,
            email,
            otp_notice(OtpPurpose::PasswordReset, &otp.code),
        );
        info!(user_id = %user.id, "Password reset code issued");

        Ok(issued)
    }

    /// Mark the request verified. The original expiry still applies.
    pub async fn verify(&self, email: &str, code: &str) -> AuthResult<()> {
        let email = normalize_email(email)?;
        validate_otp(code)?;

        let request = self
            .db
            .get_reset_request(&email)
            .await?
            .ok_or(AuthError::NoResetRequest)?;

        if request.attempts >= MAX_OTP_ATTEMPTS {
            self.db.delete_reset_request(&email).await?;
            return Err(AuthError::AttemptsExceeded);
        }

        match OtpEngine::check(
            &request.otp_code,
            request.otp_expires_at,
            code,
            unix_timestamp(),
        ) {
            OtpCheck::Valid => {}
            OtpCheck::Expired => {
                self.db.delete_reset_request(&email).await?;
                return Err(AuthError::OtpExpired);
            }
            OtpCheck::Mismatch => return Err(self.fail_attempt(&email).await),
        }

        if !self.db.mark_reset_verified(&email, &request.otp_code).await? {
            // Replaced by a newer request in between.
            return Err(AuthError::NoResetRequest);
        }
        debug!(email = %email, "Password reset verified");
        Ok(())
    }

    /// Set the new password and sign the user out everywhere.
    pub async fn reset(&self, email: &str, new_password: &str) -> AuthResult<()> {
        let email = normalize_email(email)?;
        validate_password(new_password)?;

        let request = self
            .db
            .get_reset_request(&email)
            .await?
            .ok_or(AuthError::NoResetRequest)?;
        if !request.verified {
            return Err(AuthError::NotVerified);
        }
        if unix_timestamp() >= request.otp_expires_at {
            self.db.delete_reset_request(&email).await?;
            return Err(AuthError::OtpExpired);
        }

        let Some(user) = self.db.find_user_by_email(&email).await? else {
            self.db.delete_reset_request(&email).await?;
            return Err(AuthError::NoResetRequest);
        };

        let password_hash = self.hasher.hash(new_password)?;

        // Deleting the request is the claim; a concurrent reset sees nothing.
        if !self.db.delete_reset_request(&email).await? {
            return Err(AuthError::NoResetRequest);
        }
        self.db.update_password_hash(&user.id, &password_hash).await?;
        let revoked = self.tokens.revoke_user(&user.id).await?;

        info!(user_id = %user.id, revoked, "Password reset completed");
        Ok(())
    }

    async fn fail_attempt(&self, email: &str) -> AuthError {
        record("auth.otp_failures", "password_reset");
        let attempts = match self.db.increment_reset_attempts(email).await {
            Ok(Some(attempts)) => attempts,
            Ok(None) => return AuthError::NoResetRequest,
            Err(e) => return e.into(),
        };

        match OtpEngine::after_failed_attempt(attempts) {
            AttemptOutcome::Retry { remaining } => AuthError::OtpInvalid {
                remaining_attempts: remaining,
            },
            AttemptOutcome::Exhausted => {
                warn!(email, attempts, "Password reset attempts exhausted");
                match self.db.delete_reset_request(email).await {
                    Ok(_) => AuthError::AttemptsExceeded,
                    Err(e) => e.into(),
                }
            }
        }
    }
}
