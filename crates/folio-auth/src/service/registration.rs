//! Email-verified signup: stage, (re)send the code, confirm.

use std::sync::Arc;

use folio_core::db::unix_timestamp;
use tracing::{debug, info, warn};

use super::error::{AuthError, AuthResult};
use super::tokens::TokenService;
use super::validate::{normalize_email, validate_full_name, validate_otp, validate_password};
use super::{AuthSession, OtpIssued, record};
use crate::auth::otp::{AttemptOutcome, MAX_OTP_ATTEMPTS, OTP_TTL_SECS};
use crate::auth::{OtpCheck, OtpEngine, PasswordHasher};
use crate::mail::templates::{OtpPurpose, otp_notice, welcome_notice};
use crate::mail::{self, Mailer};
use crate::storage::{AuthDatabase, DatabaseError, NewUser, Role};

#[derive(Clone)]
pub struct RegistrationManager {
    db: AuthDatabase,
    hasher: Arc<dyn PasswordHasher>,
    otp: OtpEngine,
    mailer: Arc<dyn Mailer>,
    tokens: TokenService,
}

impl RegistrationManager {
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

    /// Stage a signup and mail its code. A repeat request replaces the
    /// staged record and resets its attempt counter.
    pub async fn request(
        &self,
        email: &str,
        full_name: &str,
        password: &str,
    ) -> AuthResult<OtpIssued> {
        let email = normalize_email(email)?;
        let full_name = validate_full_name(full_name)?;
        validate_password(password)?;

        if self.db.user_exists(&email).await? {
            return Err(AuthError::DuplicateUser);
        }

        let password_hash = self.hasher.hash(password)?;
        let otp = self.otp.issue(unix_timestamp());
        self.db
            .upsert_pending_registration(
                &email,
                &full_name,
                &password_hash,
                &otp.code,
                otp.expires_at,
            )
            .await?;

        mail::dispatch(
            &self.mailer,
            email.clone(),
            otp_notice(OtpPurpose::Registration, &otp.code),
        );
        info!(email = %email, "Registration code issued");

        Ok(OtpIssued {
            email,
            expires_in: OTP_TTL_SECS,
        })
    }

    pub async fn resend(&self, email: &str) -> AuthResult<OtpIssued> {
        let email = normalize_email(email)?;
        let otp = self.otp.issue(unix_timestamp());

        if !self
            .db
            .reissue_pending_otp(&email, &otp.code, otp.expires_at)
            .await?
        {
            return Err(AuthError::NoPendingRegistration);
        }

        mail::dispatch(
            &self.mailer,
            email.clone(),
            otp_notice(OtpPurpose::Registration, &otp.code),
        );
        info!(email = %email, "Registration code re-issued");

        Ok(OtpIssued {
            email,
            expires_in: OTP_TTL_SECS,
        })
    }

    /// Check the code and promote the staged signup to a verified account.
    pub async fn confirm(
        &self,
        email: &str,
        code: &str,
        role: Option<Role>,
    ) -> AuthResult<AuthSession> {
        let email = normalize_email(email)?;
        validate_otp(code)?;

        let pending = self
            .db
            .get_pending_registration(&email)
            .await?
            .ok_or(AuthError::NoPendingRegistration)?;

        if pending.attempts >= MAX_OTP_ATTEMPTS {
            self.db.delete_pending_registration(&email).await?;
            return Err(AuthError::AttemptsExceeded);
        }

        let now = unix_timestamp();
        match OtpEngine::check(&pending.otp_code, pending.otp_expires_at, code, now) {
            OtpCheck::Valid => {}
            OtpCheck::Expired => {
                self.db.delete_pending_registration(&email).await?;
                debug!(email = %email, "Registration code expired");
                return Err(AuthError::OtpExpired);
            }
            OtpCheck::Mismatch => return Err(self.fail_attempt(&email).await),
        }

        // Only one concurrent confirm deletes the row.
        if !self
            .db
            .consume_pending_registration(&email, &pending.otp_code)
            .await?
        {
            return Err(AuthError::NoPendingRegistration);
        }

        let user_id = uuid::Uuid::new_v4().to_string();
        let user = match self
            .db
            .create_user(&NewUser {
                id: &user_id,
                email: &email,
                password_hash: &pending.password_hash,
                full_name: &pending.full_name,
                role: role.unwrap_or_default(),
                email_verified_at: now,
            })
            .await
        {
            Ok(user) => user,
            Err(DatabaseError::Conflict(_)) => return Err(AuthError::DuplicateUser),
            Err(e) => return Err(e.into()),
        };

        let tokens = self.tokens.issue_pair(&user.id).await?;
        mail::dispatch(&self.mailer, email, welcome_notice(&user.full_name));
        info!(user_id = %user.id, role = user.role.as_str(), "Account created");

        Ok(AuthSession::new(user, tokens))
    }

    /// Record a wrong code and turn the new counter into the caller's error.
    async fn fail_attempt(&self, email: &str) -> AuthError {
        record("auth.otp_failures", "registration");
        let attempts = match self.db.increment_pending_attempts(email).await {
            Ok(Some(attempts)) => attempts,
            Ok(None) => return AuthError::NoPendingRegistration,
            Err(e) => return e.into(),
        };

        match OtpEngine::after_failed_attempt(attempts) {
            AttemptOutcome::Retry { remaining } => AuthError::OtpInvalid {
                remaining_attempts: remaining,
            },
            AttemptOutcome::Exhausted => {
                warn!(email, attempts, "Registration attempts exhausted");
                match self.db.delete_pending_registration(email).await {
                    Ok(_) => AuthError::AttemptsExceeded,
                    Err(e) => e.into(),
                }
            }
        }
    }
}
