//! Database connection and pool management.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

/// Idempotent table definitions, applied on every connect.
const SCHEMA: &str = include_str!("../queries/schema.sql");
// Imports write one row per archive and the worker only reads; a handful
// of connections is plenty.
const MAX_CONNECTIONS: u32 = 4;

/// Database connection pool for the catalogue.
///
/// This is the main entry point for interacting with the catalogue database.
/// It manages the SQLite connection pool and hands out
/// [`Repository`](crate::Repository) handles.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn new(options: SqliteConnectOptions, max: Option<u32>) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            // Query-based PRAGMAs have to be applied to EVERY connection the
            // pool opens, not only the first one.
            .after_connect(|conn, meta| Box::pin(async move { Self::apply_pragmas(conn, meta).await }))
            .max_connections(max.unwrap_or(MAX_CONNECTIONS))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Connect to the catalogue database at the given path.
    ///
    /// Creates the database file (but not its parent directory) if it doesn't
    /// exist, and the `books` table if it's missing.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let options = Self::base_options().filename(path.as_ref()).create_if_missing(true);
        Self::new(options, None).await
    }

    /// Connect to an in-memory database (useful for testing).
    ///
    /// Note:
    /// - In-memory databases are destroyed when the connection closes.
    /// - Do NOT apply `#[cfg(test)]` so that other crates can also use this in their tests.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = Self::base_options().filename(":memory:");
        // Every pooled connection to ":memory:" would otherwise see its own,
        // empty database.
        Self::new(options, Some(1)).await
    }

    fn base_options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // The import stream and the enrichment worker may write at the
            // same time; let one of them wait instead of failing with BUSY.
            .busy_timeout(Duration::from_millis(1500))
    }

    /// Apply additional PRAGMA settings that aren't exposed via SqliteConnectOptions.
    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA cache_size = -4096;
                PRAGMA temp_store = MEMORY;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    #[instrument("ensuring catalogue schema", skip(self))]
    async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await.or_raise(|| ErrorKind::Schema)?;
        Ok(())
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    ///
    /// Waits for all connections to be returned to the pool, then closes them.
    pub async fn close(&self) {
        // Let SQLite update query planner statistics
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_in_memory() {
        let db = Database::connect_in_memory().await.unwrap();
        assert!(!db.pool().is_closed());
        db.close().await;
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let db = Database::connect_in_memory().await.unwrap();
        db.ensure_schema().await.unwrap();
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books").fetch_one(db.pool()).await.unwrap();
        assert_eq!(row.0, 0);
        db.close().await;
    }

    #[tokio::test]
    async fn test_connect_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.sqlite");
        let db = Database::connect(&path).await.unwrap();
        assert!(path.exists());
        db.close().await;
        // Reconnecting to an existing catalogue must not fail on the schema.
        let db = Database::connect(&path).await.unwrap();
        db.close().await;
    }

    #[tokio::test]
    async fn test_pragmas_are_applied() {
        let db = Database::connect_in_memory().await.unwrap();
        let row: (i64,) = sqlx::query_as("PRAGMA temp_store").fetch_one(db.pool()).await.unwrap();
        assert_eq!(row.0, 2, "temp_store should be MEMORY");
        let row: (i64,) = sqlx::query_as("PRAGMA cache_size").fetch_one(db.pool()).await.unwrap();
        assert_eq!(row.0, -4096, "cache_size should be 4 MiB");
        db.close().await;
    }
}
