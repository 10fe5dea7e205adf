//! Database layer for SQLite storage.
//!
//! This module handles:
//! - Connection pool management with WAL mode
//! - Schema migrations
//! - The persistence gateway used by the services, and its SQLite backend

pub mod gateway;
pub mod pool;
pub mod sqlite;

pub use gateway::{Gateway, Store};
pub use sqlite::SqliteStore;

use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Database-related errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Ordered schema migrations. Each is applied once and recorded by name.
const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_initial_schema",
    include_str!("migrations/0001_initial_schema.sql"),
)];

/// Initialize the database with default pool settings.
pub async fn initialize(db_path: &Path) -> Result<pool::DbPool, DbError> {
    initialize_with(db_path, pool::PoolSettings::default()).await
}

/// Initialize the database: create the file if needed and run migrations.
///
/// # Arguments
/// * `db_path` - Path to the SQLite database file
/// * `settings` - Pool size and timeouts
///
/// # Returns
/// A connection pool configured with WAL mode
pub async fn initialize_with(
    db_path: &Path,
    settings: pool::PoolSettings,
) -> Result<pool::DbPool, DbError> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DbError::Migration(format!("Failed to create database directory: {}", e))
            })?;
        }
    }

    let pool = pool::create_pool(db_path, settings).await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Close the pool, waiting at most `deadline` for checked-out connections.
///
/// Returns `false` when connections were still held at the deadline. Their
/// transactions are left uncommitted and roll back once they are dropped.
pub async fn close_within(pool: &pool::DbPool, deadline: Duration) -> bool {
    match tokio::time::timeout(deadline, pool.close()).await {
        Ok(()) => {
            log::info!("[db] Pool closed");
            true
        }
        Err(_) => {
            log::warn!(
                "[db] {} connection(s) still in use after {:?}, not waiting further",
                pool.size().saturating_sub(pool.num_idle() as u32),
                deadline
            );
            false
        }
    }
}

/// Run all pending database migrations.
///
/// Each migration runs in its own transaction together with its
/// `_migrations` record, so a failed migration leaves no partial schema.
async fn run_migrations(pool: &pool::DbPool) -> Result<(), DbError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    for (name, sql) in MIGRATIONS {
        let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

        let applied: Option<(i64,)> = sqlx::query_as("SELECT id FROM _migrations WHERE name = ?")
            .bind(*name)
            .fetch_optional(&mut *tx)
            .await?;

        if applied.is_some() {
            continue;
        }

        sqlx::raw_sql(sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::Migration(format!("{}: {}", name, e)))?;

        sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
            .bind(*name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        log::info!("[db] Applied migration {}", name);
    }

    Ok(())
}
