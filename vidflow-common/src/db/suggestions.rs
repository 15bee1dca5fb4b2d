//! User suggestions

use chrono::Utc;
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};

use crate::models::{NewSuggestion, Suggestion, SuggestionStatus};
use crate::{Error, Result};

const SUGGESTION_SELECT: &str = r#"
    SELECT s.id, s.user_id, s.title, s.description, s.category, s.status, s.admin_notes,
           s.created_at, s.updated_at, u.username AS username
    FROM suggestions s
    LEFT JOIN users u ON u.id = s.user_id
"#;

/// Admin listing filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionFilter {
    pub status: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

fn suggestion_from_row(row: &SqliteRow) -> Result<Suggestion> {
    let status: String = row.try_get("status")?;
    Ok(Suggestion {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        status: status.parse()?,
        admin_notes: row.try_get("admin_notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        username: row.try_get("username")?,
    })
}

async fn get_suggestion(pool: &SqlitePool, id: i64) -> Result<Suggestion> {
    let row = sqlx::query(&format!("{} WHERE s.id = ?", SUGGESTION_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound("Sugerencia no encontrada".into()))?;
    suggestion_from_row(&row)
}

pub async fn create_suggestion(
    pool: &SqlitePool,
    user_id: i64,
    suggestion: &NewSuggestion,
) -> Result<Suggestion> {
    suggestion.validate()?;

    let now = Utc::now();
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO suggestions (user_id, title, description, category, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(suggestion.title.trim())
    .bind(suggestion.description.trim())
    .bind(suggestion.category.trim())
    .bind(SuggestionStatus::Pending.as_str())
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    get_suggestion(pool, id).await
}

pub async fn list_user_suggestions(pool: &SqlitePool, user_id: i64) -> Result<Vec<Suggestion>> {
    let rows = sqlx::query(&format!(
        "{} WHERE s.user_id = ? ORDER BY s.created_at DESC",
        SUGGESTION_SELECT
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(suggestion_from_row).collect()
}

pub async fn list_suggestions(pool: &SqlitePool, filter: &SuggestionFilter) -> Result<Vec<Suggestion>> {
    let mut builder = QueryBuilder::<Sqlite>::new(SUGGESTION_SELECT);
    builder.push(" WHERE 1 = 1");

    if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty() && *s != "all") {
        let status: SuggestionStatus = status.parse()?;
        builder.push(" AND s.status = ").push_bind(status.as_str());
    }
    if let Some(category) = filter.category.as_ref().filter(|c| !c.is_empty() && c.as_str() != "all") {
        builder.push(" AND s.category = ").push_bind(category.clone());
    }
    if let Some(search) = filter.search.as_ref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        builder
            .push(" AND (s.title LIKE ")
            .push_bind(pattern.clone())
            .push(" OR s.description LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    builder.push(" ORDER BY s.created_at DESC");

    let rows = builder.build().fetch_all(pool).await?;
    rows.iter().map(suggestion_from_row).collect()
}

pub async fn update_status(
    pool: &SqlitePool,
    id: i64,
    status: SuggestionStatus,
    admin_notes: Option<&str>,
) -> Result<Suggestion> {
    let result = sqlx::query(
        "UPDATE suggestions SET status = ?, admin_notes = COALESCE(?, admin_notes), updated_at = ? WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(admin_notes)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Sugerencia no encontrada".into()));
    }
    get_suggestion(pool, id).await
}
