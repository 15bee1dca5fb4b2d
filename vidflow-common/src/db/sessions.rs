//! Login sessions
//!
//! The client holds a random token; only its SHA-256 digest is stored.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::users::user_from_row;
use crate::models::User;
use crate::Result;

const TOKEN_BYTES: usize = 32;

/// New random session token, hex encoded
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

/// Hex SHA-256 digest of a session token
pub fn hash_token(token: &str) -> String {
    to_hex(&Sha256::digest(token.as_bytes()))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Store a session for `user_id`, returning the plain token for the cookie
pub async fn create_session(pool: &SqlitePool, user_id: i64, ttl: Duration) -> Result<String> {
    let token = generate_token();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO sessions (id, token_hash, user_id, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(hash_token(&token))
    .bind(user_id)
    .bind(now)
    .bind(now + ttl)
    .execute(pool)
    .await?;

    Ok(token)
}

/// User owning an unexpired session with this token
pub async fn session_user(pool: &SqlitePool, token: &str, now: DateTime<Utc>) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT u.id, u.username, u.full_name, u.email, u.role, u.max_assigned_videos,
               u.max_monthly_videos, u.created_at, u.updated_at, u.last_login_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token_hash = ? AND s.expires_at > ?
        "#,
    )
    .bind(hash_token(token))
    .bind(now)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(hash_token(token))
        .execute(pool)
        .await?;
    Ok(())
}

/// Drop expired sessions, returning how many were removed
pub async fn purge_expired(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
