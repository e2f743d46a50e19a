use sqlx::FromRow;

/// Row in `users`. `password_hash` is the hex SHA-256 digest, never the password.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}
