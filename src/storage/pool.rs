//! SQLite connection pool setup.

use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};

use crate::config::DatabaseConfig;

use super::backend::StoreResult;

/// Open the pool described by `config` and bring the schema up to date.
///
/// The database file and its parent directory are created when missing.
pub async fn connect(config: &DatabaseConfig) -> StoreResult<SqlitePool> {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let connect_options = SqliteConnectOptions::new()
        .filename(&config.path)
        // Readers keep a snapshot while a writer commits
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(connect_options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!(
        path = %config.path.display(),
        max_connections = config.max_connections,
        "SQLite pool initialized"
    );

    Ok(pool)
}
