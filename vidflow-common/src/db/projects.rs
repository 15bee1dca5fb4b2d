//! Projects and their series-number counters

use chrono::Utc;
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, Row, Sqlite, SqlitePool, Transaction};

use crate::models::{format_series_number, Project};
use crate::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectInput {
    pub name: String,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn project_from_row(row: &SqliteRow) -> Result<Project> {
    Ok(Project {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        prefix: row.try_get("prefix")?,
        current_number: row.try_get("current_number")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

fn validated_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("El nombre del proyecto es requerido".into()));
    }
    Ok(name)
}

fn normalized_prefix(prefix: Option<&str>) -> Option<String> {
    prefix
        .map(|p| p.trim().to_uppercase())
        .filter(|p| !p.is_empty())
}

pub async fn create_project(pool: &SqlitePool, input: &ProjectInput) -> Result<Project> {
    let name = validated_name(&input.name)?;
    let row = sqlx::query(
        r#"
        INSERT INTO projects (name, prefix, current_number, description, created_at)
        VALUES (?, ?, 0, ?, ?)
        RETURNING id, name, prefix, current_number, description, created_at
        "#,
    )
    .bind(name)
    .bind(normalized_prefix(input.prefix.as_deref()))
    .bind(&input.description)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    project_from_row(&row)
}

pub async fn get_project(pool: &SqlitePool, id: i64) -> Result<Option<Project>> {
    let row = sqlx::query(
        "SELECT id, name, prefix, current_number, description, created_at FROM projects WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(project_from_row).transpose()
}

/// Project or [`Error::NotFound`]
pub async fn require_project(pool: &SqlitePool, id: i64) -> Result<Project> {
    get_project(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Proyecto {} no encontrado", id)))
}

/// All projects, or only `ids` when given
pub async fn list_projects(pool: &SqlitePool, ids: Option<&[i64]>) -> Result<Vec<Project>> {
    let rows = sqlx::query(
        "SELECT id, name, prefix, current_number, description, created_at FROM projects ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    let projects = rows
        .iter()
        .map(project_from_row)
        .collect::<Result<Vec<_>>>()?;

    Ok(match ids {
        Some(ids) => projects.into_iter().filter(|p| ids.contains(&p.id)).collect(),
        None => projects,
    })
}

pub async fn update_project(pool: &SqlitePool, id: i64, input: &ProjectInput) -> Result<Project> {
    let name = validated_name(&input.name)?;
    let result = sqlx::query("UPDATE projects SET name = ?, prefix = ?, description = ? WHERE id = ?")
        .bind(name)
        .bind(normalized_prefix(input.prefix.as_deref()))
        .bind(&input.description)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Proyecto {} no encontrado", id)));
    }
    require_project(pool, id).await
}

pub async fn delete_project(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Proyecto {} no encontrado", id)));
    }
    Ok(())
}

/// Advance the project counter inside `tx` and format the next series number
pub async fn next_series_number(tx: &mut Transaction<'_, Sqlite>, project_id: i64) -> Result<String> {
    let row = sqlx::query(
        "UPDATE projects SET current_number = current_number + 1 WHERE id = ? RETURNING prefix, current_number",
    )
    .bind(project_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Proyecto {} no encontrado", project_id)))?;

    let prefix: Option<String> = row.try_get("prefix")?;
    let number: i64 = row.try_get("current_number")?;
    Ok(format_series_number(prefix.as_deref(), number))
}
