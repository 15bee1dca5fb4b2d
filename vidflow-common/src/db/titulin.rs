//! Harvested channels and videos, embeddings, training examples

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};

use super::videos::{insert_video, NewVideo};
use super::{conflict_on_unique, json_column};
use crate::models::{
    AnalysisData, ChannelInfo, HarvestedVideo, TitulinChannel, TitulinStats, TitulinVideo,
    TrainingExample,
};
use crate::titulin::LabelledEmbedding;
use crate::{Error, Result};

// ============================================================================
// Channels
// ============================================================================

fn channel_from_row(row: &SqliteRow) -> Result<TitulinChannel> {
    Ok(TitulinChannel {
        id: row.try_get("id")?,
        channel_id: row.try_get("channel_id")?,
        name: row.try_get("name")?,
        url: row.try_get("url")?,
        description: row.try_get("description")?,
        thumbnail_url: row.try_get("thumbnail_url")?,
        subscriber_count: row.try_get("subscriber_count")?,
        video_count: row.try_get("video_count")?,
        active: row.try_get("active")?,
        last_video_fetch: row.try_get("last_video_fetch")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn create_channel(pool: &SqlitePool, info: &ChannelInfo, url: &str) -> Result<TitulinChannel> {
    let row = sqlx::query(
        r#"
        INSERT INTO titulin_channels (channel_id, name, url, description, thumbnail_url,
                                      subscriber_count, video_count, active, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?)
        RETURNING *
        "#,
    )
    .bind(&info.channel_id)
    .bind(&info.name)
    .bind(url.trim())
    .bind(&info.description)
    .bind(&info.thumbnail_url)
    .bind(info.subscriber_count)
    .bind(info.video_count)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "El canal ya está registrado"))?;

    channel_from_row(&row)
}

pub async fn list_channels(pool: &SqlitePool) -> Result<Vec<TitulinChannel>> {
    let rows = sqlx::query("SELECT * FROM titulin_channels ORDER BY name")
        .fetch_all(pool)
        .await?;
    rows.iter().map(channel_from_row).collect()
}

pub async fn get_channel(pool: &SqlitePool, id: i64) -> Result<Option<TitulinChannel>> {
    let row = sqlx::query("SELECT * FROM titulin_channels WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(channel_from_row).transpose()
}

/// Delete a channel together with its harvested videos
pub async fn delete_channel(pool: &SqlitePool, id: i64) -> Result<()> {
    let channel = get_channel(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound("Canal no encontrado".into()))?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM titulin_videos WHERE channel_id = ?")
        .bind(&channel.channel_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM titulin_channels WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

pub async fn mark_channel_fetched(pool: &SqlitePool, id: i64, at: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE titulin_channels SET last_video_fetch = ? WHERE id = ?")
        .bind(at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// ============================================================================
// Videos
// ============================================================================

fn video_from_row(row: &SqliteRow) -> Result<TitulinVideo> {
    let is_evergreen: Option<bool> = row.try_get("is_evergreen")?;
    let analyzed_at: Option<DateTime<Utc>> = row.try_get("analyzed_at")?;
    let analysis_data = match (is_evergreen, analyzed_at) {
        (Some(is_evergreen), Some(analyzed_at)) => Some(AnalysisData {
            is_evergreen,
            confidence: row.try_get::<Option<f64>, _>("confidence")?.unwrap_or(0.0),
            reason: row.try_get::<Option<String>, _>("reason")?.unwrap_or_default(),
            analyzed_at,
        }),
        _ => None,
    };

    let embedding: Option<Vec<f32>> = json_column(row.try_get("embedding")?)?;

    Ok(TitulinVideo {
        id: row.try_get("id")?,
        youtube_id: row.try_get("youtube_id")?,
        channel_id: row.try_get("channel_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        published_at: row.try_get("published_at")?,
        thumbnail_url: row.try_get("thumbnail_url")?,
        view_count: row.try_get("view_count")?,
        tags: json_column(row.try_get("tags")?)?,
        analysis_data,
        sent_to_optimize: row.try_get("sent_to_optimize")?,
        sent_to_optimize_project_id: row.try_get("sent_to_optimize_project_id")?,
        created_at: row.try_get("created_at")?,
        embedding,
    })
}

/// Insert or refresh a harvested video; true when it was new
pub async fn upsert_video(pool: &SqlitePool, channel_id: &str, video: &HarvestedVideo) -> Result<bool> {
    let existed: Option<i64> = sqlx::query_scalar("SELECT id FROM titulin_videos WHERE youtube_id = ?")
        .bind(&video.youtube_id)
        .fetch_optional(pool)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO titulin_videos (youtube_id, channel_id, title, description, published_at,
                                    thumbnail_url, view_count, tags, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(youtube_id) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            thumbnail_url = excluded.thumbnail_url,
            view_count = excluded.view_count,
            tags = excluded.tags
        "#,
    )
    .bind(&video.youtube_id)
    .bind(channel_id)
    .bind(&video.title)
    .bind(&video.description)
    .bind(video.published_at)
    .bind(&video.thumbnail_url)
    .bind(video.view_count)
    .bind(serde_json::to_string(&video.tags)?)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(existed.is_none())
}

pub async fn get_video(pool: &SqlitePool, id: i64) -> Result<Option<TitulinVideo>> {
    let row = sqlx::query("SELECT * FROM titulin_videos WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(video_from_row).transpose()
}

/// Filters for the harvested video listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoQuery {
    pub channel_id: Option<String>,
    pub title: Option<String>,
    pub is_evergreen: Option<bool>,
    pub analyzed: Option<bool>,
}

fn push_video_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &VideoQuery) {
    builder.push(" WHERE 1 = 1");
    if let Some(channel_id) = query.channel_id.as_ref().filter(|c| !c.is_empty()) {
        builder.push(" AND channel_id = ").push_bind(channel_id.clone());
    }
    if let Some(title) = query.title.as_ref().filter(|t| !t.trim().is_empty()) {
        builder
            .push(" AND title LIKE ")
            .push_bind(format!("%{}%", title.trim()));
    }
    if let Some(is_evergreen) = query.is_evergreen {
        builder.push(" AND is_evergreen = ").push_bind(is_evergreen);
    }
    match query.analyzed {
        Some(true) => {
            builder.push(" AND analyzed_at IS NOT NULL");
        }
        Some(false) => {
            builder.push(" AND analyzed_at IS NULL");
        }
        None => {}
    }
}

/// One page of harvested videos plus the filtered total
pub async fn list_videos(
    pool: &SqlitePool,
    query: &VideoQuery,
    limit: i64,
    offset: i64,
) -> Result<(Vec<TitulinVideo>, i64)> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM titulin_videos");
    push_video_filters(&mut count, query);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM titulin_videos");
    push_video_filters(&mut select, query);
    select
        .push(" ORDER BY published_at DESC, id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let rows = select.build().fetch_all(pool).await?;

    let videos = rows.iter().map(video_from_row).collect::<Result<Vec<_>>>()?;
    Ok((videos, total))
}

pub async fn store_video_embedding(pool: &SqlitePool, id: i64, embedding: &[f32]) -> Result<()> {
    sqlx::query("UPDATE titulin_videos SET embedding = ? WHERE id = ?")
        .bind(serde_json::to_string(embedding)?)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn store_analysis(pool: &SqlitePool, id: i64, analysis: &AnalysisData) -> Result<()> {
    let result = sqlx::query(
        "UPDATE titulin_videos SET is_evergreen = ?, confidence = ?, reason = ?, analyzed_at = ? WHERE id = ?",
    )
    .bind(analysis.is_evergreen)
    .bind(analysis.confidence)
    .bind(&analysis.reason)
    .bind(analysis.analyzed_at)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Video no encontrado".into()));
    }
    Ok(())
}

/// Labelled embeddings to compare new titles against
///
/// Analyzed harvested videos (except `exclude_video_id`) plus embedded
/// training examples.
pub async fn labelled_embeddings(
    pool: &SqlitePool,
    exclude_video_id: Option<i64>,
) -> Result<Vec<LabelledEmbedding>> {
    let mut labelled = Vec::new();

    let rows = sqlx::query(
        "SELECT id, title, is_evergreen, embedding FROM titulin_videos \
         WHERE embedding IS NOT NULL AND is_evergreen IS NOT NULL AND id != ?",
    )
    .bind(exclude_video_id.unwrap_or(-1))
    .fetch_all(pool)
    .await?;
    for row in &rows {
        labelled.push(labelled_from_row(row)?);
    }

    let rows = sqlx::query(
        "SELECT id, title, is_evergreen, embedding FROM training_examples WHERE embedding IS NOT NULL",
    )
    .fetch_all(pool)
    .await?;
    for row in &rows {
        labelled.push(labelled_from_row(row)?);
    }

    Ok(labelled)
}

fn labelled_from_row(row: &SqliteRow) -> Result<LabelledEmbedding> {
    Ok(LabelledEmbedding {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        is_evergreen: row.try_get("is_evergreen")?,
        embedding: json_column(row.try_get("embedding")?)?,
    })
}

/// Create a workflow video from a harvested one, at most once
pub async fn send_to_optimize(
    pool: &SqlitePool,
    id: i64,
    project_id: i64,
    created_by: i64,
) -> Result<i64> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query("SELECT title, description, tags, sent_to_optimize FROM titulin_videos WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("Video no encontrado".into()))?;

    let already_sent: bool = row.try_get("sent_to_optimize")?;
    if already_sent {
        return Err(Error::InvalidInput(
            "El video ya fue enviado a optimización".into(),
        ));
    }

    let tags: Vec<String> = json_column(row.try_get("tags")?)?;
    let new_video = NewVideo {
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        tags: (!tags.is_empty()).then(|| tags.join(",")),
    };
    let video_id = insert_video(&mut tx, project_id, &new_video, Some(created_by), Utc::now()).await?;

    sqlx::query(
        "UPDATE titulin_videos SET sent_to_optimize = 1, sent_to_optimize_project_id = ? WHERE id = ?",
    )
    .bind(project_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(video_id)
}

pub async fn stats(pool: &SqlitePool) -> Result<TitulinStats> {
    let row = sqlx::query(
        r#"
        SELECT
            (SELECT COUNT(*) FROM titulin_videos) AS total_videos,
            (SELECT COUNT(*) FROM titulin_videos WHERE analyzed_at IS NOT NULL) AS analyzed_videos,
            (SELECT COUNT(*) FROM titulin_videos WHERE is_evergreen = 1) AS evergreen_videos,
            (SELECT COUNT(*) FROM titulin_channels) AS total_channels,
            (SELECT COUNT(*) FROM training_examples) AS training_examples
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(TitulinStats {
        total_videos: row.try_get("total_videos")?,
        analyzed_videos: row.try_get("analyzed_videos")?,
        evergreen_videos: row.try_get("evergreen_videos")?,
        total_channels: row.try_get("total_channels")?,
        training_examples: row.try_get("training_examples")?,
    })
}

// ============================================================================
// Training examples
// ============================================================================

fn example_from_row(row: &SqliteRow) -> Result<TrainingExample> {
    let embedding: Option<Vec<f32>> = json_column(row.try_get("embedding")?)?;
    Ok(TrainingExample {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        is_evergreen: row.try_get("is_evergreen")?,
        category: row.try_get("category")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        has_embedding: embedding.is_some(),
        embedding,
    })
}

/// Listing parameters for training examples
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleQuery {
    pub search: Option<String>,
    /// `evergreen`, `not_evergreen` or anything else for both
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl ExampleQuery {
    fn evergreen_filter(&self) -> Option<bool> {
        match self.kind.as_deref() {
            Some("evergreen") => Some(true),
            Some("not_evergreen") | Some("non_evergreen") => Some(false),
            _ => None,
        }
    }

    /// Whitelisted ORDER BY clause
    fn order_clause(&self) -> String {
        let column = match self.sort_by.as_deref() {
            Some("title") => "title",
            Some("isEvergreen") | Some("is_evergreen") => "is_evergreen",
            Some("category") => "category",
            _ => "created_at",
        };
        let direction = match self.sort_dir.as_deref() {
            Some(dir) if dir.eq_ignore_ascii_case("asc") => "ASC",
            _ => "DESC",
        };
        format!(" ORDER BY {} {}, id {}", column, direction, direction)
    }
}

fn push_example_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &ExampleQuery) {
    builder.push(" WHERE 1 = 1");
    if let Some(search) = query.search.as_ref().filter(|s| !s.trim().is_empty()) {
        builder
            .push(" AND title LIKE ")
            .push_bind(format!("%{}%", search.trim()));
    }
    if let Some(is_evergreen) = query.evergreen_filter() {
        builder.push(" AND is_evergreen = ").push_bind(is_evergreen);
    }
}

pub async fn list_training_examples(
    pool: &SqlitePool,
    query: &ExampleQuery,
    limit: i64,
    offset: i64,
) -> Result<(Vec<TrainingExample>, i64)> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM training_examples");
    push_example_filters(&mut count, query);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM training_examples");
    push_example_filters(&mut select, query);
    select
        .push(query.order_clause())
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let rows = select.build().fetch_all(pool).await?;

    let examples = rows.iter().map(example_from_row).collect::<Result<Vec<_>>>()?;
    Ok((examples, total))
}

/// Every example, oldest first, for export and prompt building
pub async fn all_training_examples(pool: &SqlitePool) -> Result<Vec<TrainingExample>> {
    let rows = sqlx::query("SELECT * FROM training_examples ORDER BY id")
        .fetch_all(pool)
        .await?;
    rows.iter().map(example_from_row).collect()
}

/// Up to `limit` example titles of one class
pub async fn example_titles(pool: &SqlitePool, is_evergreen: bool, limit: i64) -> Result<Vec<String>> {
    Ok(sqlx::query_scalar(
        "SELECT title FROM training_examples WHERE is_evergreen = ? ORDER BY created_at DESC LIMIT ?",
    )
    .bind(is_evergreen)
    .bind(limit)
    .fetch_all(pool)
    .await?)
}

pub async fn create_training_example(
    pool: &SqlitePool,
    title: &str,
    is_evergreen: bool,
    category: Option<&str>,
    created_by: Option<i64>,
) -> Result<TrainingExample> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::InvalidInput("El título es requerido".into()));
    }

    let row = sqlx::query(
        "INSERT INTO training_examples (title, is_evergreen, category, created_by, created_at) \
         VALUES (?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(title)
    .bind(is_evergreen)
    .bind(category)
    .bind(created_by)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    example_from_row(&row)
}

/// Insert many examples in one transaction, skipping blank titles
pub async fn create_training_examples(
    pool: &SqlitePool,
    examples: &[(String, bool)],
    created_by: Option<i64>,
) -> Result<u64> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;
    let mut created = 0;

    for (title, is_evergreen) in examples {
        let title = title.trim();
        if title.is_empty() {
            continue;
        }
        sqlx::query(
            "INSERT INTO training_examples (title, is_evergreen, created_by, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(title)
        .bind(is_evergreen)
        .bind(created_by)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        created += 1;
    }

    tx.commit().await?;
    Ok(created)
}

pub async fn delete_training_example(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM training_examples WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Ejemplo no encontrado".into()));
    }
    Ok(())
}

pub async fn delete_training_examples(pool: &SqlitePool, ids: &[i64]) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM training_examples WHERE id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
    Ok(builder.build().execute(pool).await?.rows_affected())
}

/// Relabel examples; their embeddings stay valid since titles are unchanged
pub async fn set_examples_evergreen(pool: &SqlitePool, ids: &[i64], is_evergreen: bool) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE training_examples SET is_evergreen = ");
    builder.push_bind(is_evergreen).push(" WHERE id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
    Ok(builder.build().execute(pool).await?.rows_affected())
}

pub async fn set_examples_category(pool: &SqlitePool, ids: &[i64], category: Option<&str>) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE training_examples SET category = ");
    builder.push_bind(category.map(str::to_string)).push(" WHERE id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
    Ok(builder.build().execute(pool).await?.rows_affected())
}

/// `(id, title)` of examples still missing an embedding
pub async fn examples_without_embedding(pool: &SqlitePool, limit: i64) -> Result<Vec<(i64, String)>> {
    let rows = sqlx::query("SELECT id, title FROM training_examples WHERE embedding IS NULL ORDER BY id LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| Ok((row.try_get("id")?, row.try_get("title")?)))
        .collect()
}

pub async fn store_example_embedding(pool: &SqlitePool, id: i64, embedding: &[f32]) -> Result<()> {
    sqlx::query("UPDATE training_examples SET embedding = ? WHERE id = ?")
        .bind(serde_json::to_string(embedding)?)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_query_type_filter() {
        let mut query = ExampleQuery::default();
        assert_eq!(query.evergreen_filter(), None);
        query.kind = Some("evergreen".into());
        assert_eq!(query.evergreen_filter(), Some(true));
        query.kind = Some("not_evergreen".into());
        assert_eq!(query.evergreen_filter(), Some(false));
    }

    #[test]
    fn test_order_clause_is_whitelisted() {
        let query = ExampleQuery {
            sort_by: Some("title; DROP TABLE users".into()),
            sort_dir: Some("asc".into()),
            ..ExampleQuery::default()
        };
        assert_eq!(query.order_clause(), " ORDER BY created_at ASC, id ASC");

        let query = ExampleQuery {
            sort_by: Some("title".into()),
            ..ExampleQuery::default()
        };
        assert_eq!(query.order_clause(), " ORDER BY title DESC, id DESC");
    }
}
