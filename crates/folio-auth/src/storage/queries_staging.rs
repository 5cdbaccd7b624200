//! Staging record queries: pending registrations and password resets.
//!
//! Attempt counters are only ever changed by single-statement updates so
//! concurrent verifications serialise in the database.

use folio_core::db::unix_timestamp;

use super::db::{AuthDatabase, DatabaseError};
use super::models::{PasswordResetRequest, PendingRegistration};

impl AuthDatabase {
    // =========================================================================
    // Pending registration queries
    // =========================================================================

    /// Insert or overwrite the pending registration for an email.
    ///
    /// Overwriting resets the attempt counter to zero.
    pub async fn upsert_pending_registration(
        &self,
        email: &str,
        full_name: &str,
        password_hash: &str,
        otp_code: &str,
        otp_expires_at: i64,
    ) -> Result<(), DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO pending_registrations \
             (email, full_name, password_hash, otp_code, otp_expires_at, attempts, created_at) \
             VALUES (?, ?, ?, ?, ?, 0, ?) \
             ON CONFLICT(email) DO UPDATE SET full_name = excluded.full_name, \
             password_hash = excluded.password_hash, otp_code = excluded.otp_code, \
             otp_expires_at = excluded.otp_expires_at, attempts = 0, created_at = excluded.created_at",
        )
        .bind(email)
        .bind(full_name)
        .bind(password_hash)
        .bind(otp_code)
        .bind(otp_expires_at)
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Replace the OTP of an existing pending registration.
    ///
    /// Returns `false` if there is no pending registration for the email.
    pub async fn reissue_pending_otp(
        &self,
        email: &str,
        otp_code: &str,
        otp_expires_at: i64,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE pending_registrations SET otp_code = ?, otp_expires_at = ?, attempts = 0 \
             WHERE email = ?",
        )
        .bind(otp_code)
        .bind(otp_expires_at)
        .bind(email)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_pending_registration(
        &self,
        email: &str,
    ) -> Result<Option<PendingRegistration>, DatabaseError> {
        let pending = sqlx::query_as::<_, PendingRegistration>(
            "SELECT * FROM pending_registrations WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        Ok(pending)
    }

    /// Atomically bump the attempt counter and return its new value.
    ///
    /// `None` means the record vanished (consumed or deleted concurrently).
    pub async fn increment_pending_attempts(
        &self,
        email: &str,
    ) -> Result<Option<i64>, DatabaseError> {
        let attempts = sqlx::query_scalar::<_, i64>(
            "UPDATE pending_registrations SET attempts = attempts + 1 WHERE email = ? \
             RETURNING attempts",
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        Ok(attempts)
    }

    /// Delete the pending registration only if it still holds `otp_code`.
    ///
    /// Exactly one of several concurrent callers gets `true`.
    pub async fn consume_pending_registration(
        &self,
        email: &str,
        otp_code: &str,
    ) -> Result<bool, DatabaseError> {
        let result =
            sqlx::query("DELETE FROM pending_registrations WHERE email = ? AND otp_code = ?")
                .bind(email)
                .bind(otp_code)
                .execute(self.pool())
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_pending_registration(&self, email: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM pending_registrations WHERE email = ?")
            .bind(email)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Password reset queries
    // =========================================================================

    /// Insert or overwrite the reset request for an email, unverified.
    pub async fn upsert_reset_request(
        &self,
        email: &str,
        otp_code: &str,
        otp_expires_at: i64,
    ) -> Result<(), DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO password_reset_requests \
             (email, otp_code, otp_expires_at, attempts, verified, created_at) \
             VALUES (?, ?, ?, 0, 0, ?) \
             ON CONFLICT(email) DO UPDATE SET otp_code = excluded.otp_code, \
             otp_expires_at = excluded.otp_expires_at, attempts = 0, verified = 0, \
             created_at = excluded.created_at",
        )
        .bind(email)
        .bind(otp_code)
        .bind(otp_expires_at)
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    pub async fn get_reset_request(
        &self,
        email: &str,
    ) -> Result<Option<PasswordResetRequest>, DatabaseError> {
        let request = sqlx::query_as::<_, PasswordResetRequest>(
            "SELECT * FROM password_reset_requests WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        Ok(request)
    }

    /// Atomically bump the attempt counter and return its new value.
    pub async fn increment_reset_attempts(&self, email: &str) -> Result<Option<i64>, DatabaseError> {
        let attempts = sqlx::query_scalar::<_, i64>(
            "UPDATE password_reset_requests SET attempts = attempts + 1 WHERE email = ? \
             RETURNING attempts",
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        Ok(attempts)
    }

    /// Flip `verified` if the request still holds `otp_code`.
    pub async fn mark_reset_verified(
        &self,
        email: &str,
        otp_code: &str,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE password_reset_requests SET verified = 1 WHERE email = ? AND otp_code = ?",
        )
        .bind(email)
        .bind(otp_code)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_reset_request(&self, email: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM password_reset_requests WHERE email = ?")
            .bind(email)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Housekeeping
    // =========================================================================

    /// Delete staging records whose OTP expired before `now`.
    ///
    /// Returns `(pending_registrations, reset_requests)` removed.
    pub async fn purge_expired_staging(&self, now: i64) -> Result<(u64, u64), DatabaseError> {
        let pending = sqlx::query("DELETE FROM pending_registrations WHERE otp_expires_at <= ?")
            .bind(now)
            .execute(self.pool())
            .await?;

        let resets = sqlx::query("DELETE FROM password_reset_requests WHERE otp_expires_at <= ?")
            .bind(now)
            .execute(self.pool())
            .await?;

        Ok((pending.rows_affected(), resets.rows_affected()))
    }
}
