//! User accounts and project access

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::conflict_on_unique;
use crate::models::User;
use crate::workflow::Role;
use crate::{Error, Result};

/// Fields for a new account; `password_hash` is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    pub max_assigned_videos: Option<i64>,
    pub max_monthly_videos: Option<i64>,
}

/// Partial profile update; `None` leaves the column unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    #[serde(skip)]
    pub password_hash: Option<String>,
}

const USER_COLUMNS: &str = "id, username, full_name, email, role, max_assigned_videos, \
     max_monthly_videos, created_at, updated_at, last_login_at";

pub(crate) fn user_from_row(row: &SqliteRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        role: role.parse()?,
        max_assigned_videos: row.try_get("max_assigned_videos")?,
        max_monthly_videos: row.try_get("max_monthly_videos")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        last_login_at: row.try_get("last_login_at")?,
    })
}

pub async fn create_user(pool: &SqlitePool, new_user: &NewUser) -> Result<User> {
    let now = Utc::now();
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (username, password_hash, full_name, email, role,
                           max_assigned_videos, max_monthly_videos, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(new_user.username.trim())
    .bind(&new_user.password_hash)
    .bind(&new_user.full_name)
    .bind(&new_user.email)
    .bind(new_user.role.as_str())
    .bind(new_user.max_assigned_videos)
    .bind(new_user.max_monthly_videos)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "El nombre de usuario ya existe"))?;

    get_user(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("User {} vanished after insert", id)))
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// User plus stored password hash, for login
pub async fn get_user_credentials(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<(User, String)>> {
    let row = sqlx::query(&format!(
        "SELECT {}, password_hash FROM users WHERE username = ?",
        USER_COLUMNS
    ))
    .bind(username.trim())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let hash: String = row.try_get("password_hash")?;
            Ok(Some((user_from_row(&row)?, hash)))
        }
        None => Ok(None),
    }
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query(&format!("SELECT {} FROM users ORDER BY username", USER_COLUMNS))
        .fetch_all(pool)
        .await?;

    rows.iter().map(user_from_row).collect()
}

pub async fn count_users(pool: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?)
}

/// Ids of every user holding `role`
pub async fn user_ids_with_role(pool: &SqlitePool, role: Role) -> Result<Vec<i64>> {
    Ok(sqlx::query_scalar("SELECT id FROM users WHERE role = ?")
        .bind(role.as_str())
        .fetch_all(pool)
        .await?)
}

pub async fn all_user_ids(pool: &SqlitePool) -> Result<Vec<i64>> {
    Ok(sqlx::query_scalar("SELECT id FROM users")
        .fetch_all(pool)
        .await?)
}

pub async fn update_user(pool: &SqlitePool, id: i64, update: &UserUpdate) -> Result<User> {
    let result = sqlx::query(
        r#"
        UPDATE users SET
            full_name = COALESCE(?, full_name),
            email = COALESCE(?, email),
            role = COALESCE(?, role),
            password_hash = COALESCE(?, password_hash),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&update.full_name)
    .bind(&update.email)
    .bind(update.role.map(|r| r.as_str()))
    .bind(&update.password_hash)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Usuario {} no encontrado", id)));
    }
    get_user(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Usuario {} no encontrado", id)))
}

/// Set per-user limits; `None` leaves a limit unchanged
pub async fn update_limits(
    pool: &SqlitePool,
    id: i64,
    max_assigned_videos: Option<i64>,
    max_monthly_videos: Option<i64>,
) -> Result<User> {
    let result = sqlx::query(
        r#"
        UPDATE users SET
            max_assigned_videos = COALESCE(?, max_assigned_videos),
            max_monthly_videos = COALESCE(?, max_monthly_videos),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(max_assigned_videos)
    .bind(max_monthly_videos)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Usuario {} no encontrado", id)));
    }
    get_user(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Usuario {} no encontrado", id)))
}

pub async fn delete_user(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Usuario {} no encontrado", id)));
    }
    Ok(())
}

pub async fn touch_last_login(pool: &SqlitePool, id: i64, at: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
        .bind(at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Project ids the user may work in
pub async fn project_access(pool: &SqlitePool, user_id: i64) -> Result<Vec<i64>> {
    Ok(sqlx::query_scalar(
        "SELECT project_id FROM project_access WHERE user_id = ? ORDER BY project_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

/// Replace the user's project access list
pub async fn set_project_access(pool: &SqlitePool, user_id: i64, project_ids: &[i64]) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM project_access WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let now = Utc::now();
    for project_id in project_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO project_access (user_id, project_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(project_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
