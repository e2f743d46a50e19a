//! Credential Store: username / password-hash pairs.

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::{ensure_users_table, is_unique_violation};
use crate::errors::AppError;
use crate::models::user::UserRow;

/// Hex-encoded SHA-256 digest of the password (64 lowercase hex chars).
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Creates a user. The UNIQUE constraint on `username` decides `UsernameTaken`.
pub async fn register(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<UserRow, AppError> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("username cannot be empty".to_string()));
    }
    if password.is_empty() {
        return Err(AppError::Validation("password cannot be empty".to_string()));
    }

    ensure_users_table(pool).await?;
    let password_hash = hash_password(password);

    let inserted = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
        .bind(username)
        .bind(&password_hash)
        .execute(pool)
        .await;

    match inserted {
        Ok(done) => {
            let user = UserRow {
                id: done.last_insert_rowid(),
                username: username.to_string(),
                password_hash,
            };
            info!("Registered user '{}' (id {})", user.username, user.id);
            Ok(user)
        }
        Err(e) if is_unique_violation(&e) => Err(AppError::UsernameTaken),
        Err(e) => Err(e.into()),
    }
}

/// Checks a username / password pair. An unknown username and a wrong
/// password both return `AuthRejected`.
pub async fn verify(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<UserRow, AppError> {
    ensure_users_table(pool).await?;
    let supplied_hash = hash_password(password);

    let user = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, password_hash FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    match user {
        Some(user) if user.password_hash == supplied_hash => Ok(user),
        _ => {
            warn!("Rejected login attempt for '{username}'");
            Err(AppError::AuthRejected)
        }
    }
}
