//! SQLite database for the Folio auth server.

pub use folio_core::db::DatabaseError;

folio_core::define_database!(AuthDatabase, "Auth database migrations complete");

impl AuthDatabase {
    /// Round-trip a trivial query.
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(self.pool()).await?;
        Ok(())
    }
}
