//! Credential store queries.

use folio_core::db::unix_timestamp;

use super::db::{AuthDatabase, DatabaseError};
use super::models::{NewUser, User};

impl AuthDatabase {
    // =========================================================================
    // User queries
    // =========================================================================

    /// Create a verified, active user.
    ///
    /// Returns `DatabaseError::Conflict` if the email is already taken.
    pub async fn create_user(&self, new: &NewUser<'_>) -> Result<User, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, full_name, role, is_active, \
             email_verified, email_verified_at, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, 1, 1, ?, ?, ?)",
        )
        .bind(new.id)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.full_name)
        .bind(new.role)
        .bind(new.email_verified_at)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_user(new.id).await
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {id}")))
    }

    /// Find a user by (already normalised) email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.pool())
            .await?;

        Ok(user)
    }

    /// Whether an account exists for the email.
    pub async fn user_exists(&self, email: &str) -> Result<bool, DatabaseError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(self.pool())
            .await?;

        Ok(row.0 > 0)
    }

    /// Stamp a successful login.
    pub async fn touch_last_login(&self, id: &str, at: i64) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET last_login = ?, updated_at = ? WHERE id = ?")
            .bind(at)
            .bind(at)
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Replace a user's password hash.
    pub async fn update_password_hash(
        &self,
        id: &str,
        password_hash: &str,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(unix_timestamp())
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Activate or deactivate an account.
    pub async fn set_user_active(&self, id: &str, active: bool) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active)
            .bind(unix_timestamp())
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Set the email verification flag. Clearing it also clears the timestamp.
    pub async fn set_email_verified(&self, id: &str, verified: bool) -> Result<bool, DatabaseError> {
        let now = unix_timestamp();
        let verified_at = verified.then_some(now);

        let result = sqlx::query(
            "UPDATE users SET email_verified = ?, email_verified_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(verified)
        .bind(verified_at)
        .bind(now)
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
