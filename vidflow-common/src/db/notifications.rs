//! Notification storage and per-user delivery settings

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::json_column;
use crate::models::{NewNotification, Notification, NotificationSettings};
use crate::{Error, Result};

const NOTIFICATION_SELECT: &str = r#"
    SELECT n.id, n.user_id, n.title, n.message, n.type, n.is_read, n.is_archived,
           n.action_url, n.action_label, n.related_entity_type, n.related_entity_id,
           n.created_by, n.created_at,
           s.full_name AS sender_name, s.username AS sender_username
    FROM notifications n
    LEFT JOIN users s ON s.id = n.created_by
"#;

fn notification_from_row(row: &SqliteRow) -> Result<Notification> {
    let kind: String = row.try_get("type")?;
    Ok(Notification {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        message: row.try_get("message")?,
        kind: kind.parse()?,
        is_read: row.try_get("is_read")?,
        is_archived: row.try_get("is_archived")?,
        action_url: row.try_get("action_url")?,
        action_label: row.try_get("action_label")?,
        related_entity_type: row.try_get("related_entity_type")?,
        related_entity_id: row.try_get("related_entity_id")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        sender_name: row.try_get("sender_name")?,
        sender_username: row.try_get("sender_username")?,
    })
}

/// Store a notification for `user_id`
///
/// Returns `None` without writing when the recipient disabled in-app
/// notifications.
pub async fn create_notification(
    pool: &SqlitePool,
    user_id: i64,
    notification: &NewNotification,
    created_by: Option<i64>,
) -> Result<Option<Notification>> {
    if notification.title.trim().is_empty() || notification.message.trim().is_empty() {
        return Err(Error::InvalidInput("Título y mensaje son requeridos".into()));
    }

    if !get_settings(pool, user_id).await?.in_app_enabled {
        return Ok(None);
    }

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO notifications (user_id, title, message, type, action_url, action_label,
                                   related_entity_type, related_entity_id, created_by, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(notification.title.trim())
    .bind(notification.message.trim())
    .bind(notification.kind.as_str())
    .bind(&notification.action_url)
    .bind(&notification.action_label)
    .bind(&notification.related_entity_type)
    .bind(notification.related_entity_id)
    .bind(created_by)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    get_notification(pool, id).await
}

pub async fn get_notification(pool: &SqlitePool, id: i64) -> Result<Option<Notification>> {
    let row = sqlx::query(&format!("{} WHERE n.id = ?", NOTIFICATION_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(notification_from_row).transpose()
}

/// Non-archived notifications for a user, newest first
pub async fn list_notifications(
    pool: &SqlitePool,
    user_id: i64,
    include_read: bool,
    limit: i64,
) -> Result<Vec<Notification>> {
    let filter = if include_read { "" } else { " AND n.is_read = 0" };
    let rows = sqlx::query(&format!(
        "{} WHERE n.user_id = ? AND n.is_archived = 0{} ORDER BY n.created_at DESC, n.id DESC LIMIT ?",
        NOTIFICATION_SELECT, filter
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(notification_from_row).collect()
}

/// Mark one notification read; false when it is not the user's
pub async fn mark_read(pool: &SqlitePool, user_id: i64, id: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_all_read(pool: &SqlitePool, user_id: i64) -> Result<u64> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Archive one notification; false when it is not the user's
pub async fn archive(pool: &SqlitePool, user_id: i64, id: i64) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE notifications SET is_archived = 1, is_read = 1 WHERE id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Physical delete
pub async fn delete_notification(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Notificación {} no encontrada", id)));
    }
    Ok(())
}

/// Stored settings, or defaults when the user never saved any
pub async fn get_settings(pool: &SqlitePool, user_id: i64) -> Result<NotificationSettings> {
    let raw: Option<String> =
        sqlx::query_scalar("SELECT settings FROM notification_settings WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    json_column(raw)
}

pub async fn save_settings(
    pool: &SqlitePool,
    user_id: i64,
    settings: &NotificationSettings,
) -> Result<NotificationSettings> {
    sqlx::query(
        r#"
        INSERT INTO notification_settings (user_id, settings, updated_at) VALUES (?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET settings = excluded.settings, updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(serde_json::to_string(settings)?)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(*settings)
}
