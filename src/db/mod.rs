mod cursor;
mod migrations;
mod models;
mod queries;

pub use cursor::*;
pub use models::*;
pub use queries::*;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tracing::info;

/// Connections shared by the sync engine and the API handlers.
const MAX_CONNECTIONS: u32 = 5;

/// How long a writer waits on another writer's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to the SQLite store holding mirrored posts and relayed comments.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the store at `path` and bring its schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, a migration fails, or the
    /// store turns out to be read-only.
    pub async fn new(path: &Path) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(connect_options(path))
            .await
            .with_context(|| format!("Failed to open SQLite store at {}", path.display()))?;

        let db = Self { pool };
        migrations::run(&db.pool).await?;
        info!(path = %path.display(), "Database schema up to date");

        db.ensure_writable(path).await?;
        Ok(db)
    }

    /// Take and release the write lock once.
    ///
    /// Migrations on an already current schema write nothing, so a read-only
    /// file would otherwise go unnoticed until the first upsert.
    async fn ensure_writable(&self, path: &Path) -> Result<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire SQLite connection")?;

        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .with_context(|| format!("SQLite store at {} is read-only", path.display()))?;
        sqlx::query("ROLLBACK")
            .execute(&mut *conn)
            .await
            .context("Failed to release SQLite write lock")?;

        Ok(())
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn connect_options(path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT)
}
