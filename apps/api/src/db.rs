use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL
    )
"#;

const CREATE_CAREER_PLANS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS career_plans (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        career_goal TEXT NOT NULL,
        roadmap_json TEXT NOT NULL,
        checkbox_states TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        UNIQUE(user_id, career_goal)
    )
"#;

/// Opens (creating if missing) the embedded SQLite database and returns a pool.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Opening SQLite database at {database_url}");

    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid DATABASE_URL '{database_url}'"))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    ensure_schema(&pool).await?;

    info!("SQLite connection pool established");
    Ok(pool)
}

/// Creates the `users` table if absent. Safe to call before every statement.
pub async fn ensure_users_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_USERS_TABLE).execute(pool).await?;
    Ok(())
}

/// Creates the `career_plans` table if absent. Safe to call before every statement.
pub async fn ensure_career_plans_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_CAREER_PLANS_TABLE).execute(pool).await?;
    Ok(())
}

pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    ensure_users_table(pool).await?;
    ensure_career_plans_table(pool).await
}

/// True when the statement failed on a UNIQUE constraint.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Single-connection in-memory pool. Every connection to `sqlite::memory:` is a
/// separate database, so the pool must never open a second one.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite pool");
    ensure_schema(&pool).await.expect("schema");
    pool
}
