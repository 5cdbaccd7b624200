//! Refresh token store queries.

use folio_core::db::unix_timestamp;

use super::db::{AuthDatabase, DatabaseError};
use super::models::RefreshToken;

impl AuthDatabase {
    // =========================================================================
    // Refresh token queries
    // =========================================================================

    /// Store a refresh token hash.
    pub async fn create_refresh_token(
        &self,
        id: &str,
        user_id: &str,
        token_hash: &str,
        expires_at: i64,
    ) -> Result<RefreshToken, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(RefreshToken {
            id: id.to_string(),
            user_id: user_id.to_string(),
            token_hash: token_hash.to_string(),
            expires_at,
            created_at: now,
        })
    }

    /// Find a token by hash, expired or not.
    pub async fn find_refresh_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, DatabaseError> {
        let token =
            sqlx::query_as::<_, RefreshToken>("SELECT * FROM refresh_tokens WHERE token_hash = ?")
                .bind(token_hash)
                .fetch_optional(self.pool())
                .await?;

        Ok(token)
    }

    /// Replace a token's hash and expiry in place, keyed by the old hash.
    ///
    /// Returns `false` when no row holds `old_hash` any more, which is what a
    /// replayed or concurrently rotated token sees.
    pub async fn rotate_refresh_token(
        &self,
        old_hash: &str,
        new_hash: &str,
        new_expires_at: i64,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET token_hash = ?, expires_at = ? WHERE token_hash = ?",
        )
        .bind(new_hash)
        .bind(new_expires_at)
        .bind(old_hash)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_refresh_token(&self, token_hash: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = ?")
            .bind(token_hash)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete one token, but only if it belongs to `user_id`.
    pub async fn delete_user_refresh_token(
        &self,
        user_id: &str,
        token_hash: &str,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = ? AND token_hash = ?")
            .bind(user_id)
            .bind(token_hash)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every token of a user.
    pub async fn delete_user_refresh_tokens(&self, user_id: &str) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }

    /// Count a user's unexpired tokens.
    pub async fn count_live_refresh_tokens(&self, user_id: &str) -> Result<i64, DatabaseError> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM refresh_tokens WHERE user_id = ? AND expires_at > ?")
                .bind(user_id)
                .bind(unix_timestamp())
                .fetch_one(self.pool())
                .await?;

        Ok(row.0)
    }

    /// Delete tokens that expired before `now`.
    pub async fn purge_expired_refresh_tokens(&self, now: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= ?")
            .bind(now)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}
