//! Video rows, creation with series numbers, trash handling

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, Row, Sqlite, SqlitePool, Transaction};
use tracing::debug;

use super::json_column;
use super::projects::next_series_number;
use crate::models::Video;
use crate::workflow::{Role, VideoStatus};
use crate::{Error, Result};

const VIDEO_SELECT: &str = r#"
    SELECT v.id, v.project_id, v.title, v.description, v.optimized_title,
           v.optimized_description, v.tags, v.series_number, v.status, v.metadata,
           v.youtube_url, v.video_url, v.thumbnail_url, v.current_reviewer_id,
           v.created_by, v.optimized_by, v.content_uploaded_by, v.media_reviewed_by,
           v.created_at, v.updated_at, v.is_deleted, v.deleted_at, v.deleted_by,
           u.full_name AS reviewer_name, u.username AS reviewer_username
    FROM videos v
    LEFT JOIN users u ON u.id = v.current_reviewer_id
"#;

/// Fields accepted when creating a video
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVideo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

fn video_from_row(row: &SqliteRow) -> Result<Video> {
    let status: String = row.try_get("status")?;
    Ok(Video {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        optimized_title: row.try_get("optimized_title")?,
        optimized_description: row.try_get("optimized_description")?,
        tags: row.try_get("tags")?,
        series_number: row.try_get("series_number")?,
        status: status.parse()?,
        metadata: json_column(row.try_get("metadata")?)?,
        youtube_url: row.try_get("youtube_url")?,
        video_url: row.try_get("video_url")?,
        thumbnail_url: row.try_get("thumbnail_url")?,
        current_reviewer_id: row.try_get("current_reviewer_id")?,
        created_by: row.try_get("created_by")?,
        optimized_by: row.try_get("optimized_by")?,
        content_uploaded_by: row.try_get("content_uploaded_by")?,
        media_reviewed_by: row.try_get("media_reviewed_by")?,
        reviewer_name: row.try_get("reviewer_name")?,
        reviewer_username: row.try_get("reviewer_username")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        is_deleted: row.try_get("is_deleted")?,
        deleted_at: row.try_get("deleted_at")?,
        deleted_by: row.try_get("deleted_by")?,
    })
}

/// Video by id, including trashed ones
pub async fn get_video(pool: &SqlitePool, id: i64) -> Result<Option<Video>> {
    let row = sqlx::query(&format!("{} WHERE v.id = ?", VIDEO_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(video_from_row).transpose()
}

/// Video that must belong to `project_id`
pub async fn require_project_video(pool: &SqlitePool, project_id: i64, id: i64) -> Result<Video> {
    match get_video(pool, id).await? {
        Some(video) if video.project_id == project_id && !video.is_deleted => Ok(video),
        _ => Err(Error::NotFound(format!("Video {} no encontrado", id))),
    }
}

/// Like [`require_project_video`], but trashed videos are found too
pub async fn require_project_video_with_trash(
    pool: &SqlitePool,
    project_id: i64,
    id: i64,
) -> Result<Video> {
    match get_video(pool, id).await? {
        Some(video) if video.project_id == project_id => Ok(video),
        _ => Err(Error::NotFound(format!("Video {} no encontrado", id))),
    }
}

/// Videos of one project (or all), either live or in the trash
pub async fn list_videos(pool: &SqlitePool, project_id: Option<i64>, trash: bool) -> Result<Vec<Video>> {
    let rows = match project_id {
        Some(project_id) => {
            sqlx::query(&format!(
                "{} WHERE v.project_id = ? AND v.is_deleted = ? ORDER BY v.updated_at DESC",
                VIDEO_SELECT
            ))
            .bind(project_id)
            .bind(trash)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!(
                "{} WHERE v.is_deleted = ? ORDER BY v.updated_at DESC",
                VIDEO_SELECT
            ))
            .bind(trash)
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter().map(video_from_row).collect()
}

/// Insert one video inside `tx`, allocating its series number
pub async fn insert_video(
    tx: &mut Transaction<'_, Sqlite>,
    project_id: i64,
    video: &NewVideo,
    created_by: Option<i64>,
    now: DateTime<Utc>,
) -> Result<i64> {
    let title = video.title.trim();
    if title.is_empty() {
        return Err(Error::InvalidInput("El título es requerido".into()));
    }

    let series_number = next_series_number(tx, project_id).await?;
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO videos (project_id, title, description, tags, series_number, status,
                            metadata, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, '{}', ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(project_id)
    .bind(title)
    .bind(&video.description)
    .bind(&video.tags)
    .bind(&series_number)
    .bind(VideoStatus::Pending.as_str())
    .bind(created_by)
    .bind(now)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;

    debug!("Created video {} ({}) in project {}", id, series_number, project_id);
    Ok(id)
}

pub async fn create_video(
    pool: &SqlitePool,
    project_id: i64,
    video: &NewVideo,
    created_by: Option<i64>,
) -> Result<Video> {
    let mut tx = pool.begin().await?;
    let id = insert_video(&mut tx, project_id, video, created_by, Utc::now()).await?;
    tx.commit().await?;

    get_video(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Video {} vanished after insert", id)))
}

/// Create one video per non-blank title in a single transaction
pub async fn bulk_create_videos(
    pool: &SqlitePool,
    project_id: i64,
    titles: &[String],
    max_titles: usize,
    created_by: Option<i64>,
) -> Result<Vec<Video>> {
    let titles: Vec<&str> = titles
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();

    if titles.is_empty() {
        return Err(Error::InvalidInput("Se requiere al menos un título".into()));
    }
    if titles.len() > max_titles {
        return Err(Error::InvalidInput(format!(
            "Se permiten como máximo {} títulos por operación",
            max_titles
        )));
    }

    let now = Utc::now();
    let mut tx = pool.begin().await?;
    let mut ids = Vec::with_capacity(titles.len());
    for title in titles {
        let new_video = NewVideo {
            title: title.to_string(),
            ..NewVideo::default()
        };
        ids.push(insert_video(&mut tx, project_id, &new_video, created_by, now).await?);
    }
    tx.commit().await?;

    let mut videos = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(video) = get_video(pool, id).await? {
            videos.push(video);
        }
    }
    Ok(videos)
}

/// Write back every mutable column of `video`
pub async fn save_video(pool: &SqlitePool, video: &Video) -> Result<Video> {
    let metadata = serde_json::to_string(&video.metadata)?;
    let result = sqlx::query(
        r#"
        UPDATE videos SET
            title = ?, description = ?, optimized_title = ?, optimized_description = ?,
            tags = ?, status = ?, metadata = ?, youtube_url = ?, video_url = ?,
            thumbnail_url = ?, current_reviewer_id = ?, optimized_by = ?,
            content_uploaded_by = ?, media_reviewed_by = ?, updated_at = ?
        WHERE id = ? AND is_deleted = 0
        "#,
    )
    .bind(&video.title)
    .bind(&video.description)
    .bind(&video.optimized_title)
    .bind(&video.optimized_description)
    .bind(&video.tags)
    .bind(video.status.as_str())
    .bind(metadata)
    .bind(&video.youtube_url)
    .bind(&video.video_url)
    .bind(&video.thumbnail_url)
    .bind(video.current_reviewer_id)
    .bind(video.optimized_by)
    .bind(video.content_uploaded_by)
    .bind(video.media_reviewed_by)
    .bind(video.updated_at)
    .bind(video.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Video {} no encontrado", video.id)));
    }
    get_video(pool, video.id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Video {} no encontrado", video.id)))
}

/// Move videos to the trash (`permanent = false`) or delete them outright
pub async fn delete_videos(
    pool: &SqlitePool,
    project_id: i64,
    ids: &[i64],
    permanent: bool,
    deleted_by: i64,
) -> Result<u64> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;
    let mut affected = 0;

    for id in ids {
        let result = if permanent {
            sqlx::query("DELETE FROM videos WHERE id = ? AND project_id = ?")
                .bind(id)
                .bind(project_id)
                .execute(&mut *tx)
                .await?
        } else {
            sqlx::query(
                "UPDATE videos SET is_deleted = 1, deleted_at = ?, deleted_by = ? \
                 WHERE id = ? AND project_id = ? AND is_deleted = 0",
            )
            .bind(now)
            .bind(deleted_by)
            .bind(id)
            .bind(project_id)
            .execute(&mut *tx)
            .await?
        };
        affected += result.rows_affected();
    }

    tx.commit().await?;
    Ok(affected)
}

/// Bring a trashed video back
/// Hands an upload to a youtuber in a single conditional write
///
/// Succeeds only while the video is live, still in `upload_review`, and not
/// held by a different youtuber. Returns `false` when another claim won.
pub async fn claim_upload(
    pool: &SqlitePool,
    video_id: i64,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE videos SET current_reviewer_id = ?, content_uploaded_by = ?, updated_at = ?
        WHERE id = ? AND is_deleted = 0 AND status = ?
          AND (current_reviewer_id IS NULL
               OR current_reviewer_id = ?
               OR current_reviewer_id NOT IN (SELECT id FROM users WHERE role = ?))
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .bind(now)
    .bind(video_id)
    .bind(VideoStatus::UploadReview.as_str())
    .bind(user_id)
    .bind(Role::Youtuber.as_str())
    .execute(pool)
    .await?;

    debug!("Upload claim of video {} by user {}: {} row(s)", video_id, user_id, result.rows_affected());
    Ok(result.rows_affected() > 0)
}

pub async fn restore_video(pool: &SqlitePool, project_id: i64, id: i64) -> Result<Video> {
    let result = sqlx::query(
        "UPDATE videos SET is_deleted = 0, deleted_at = NULL, deleted_by = NULL \
         WHERE id = ? AND project_id = ? AND is_deleted = 1",
    )
    .bind(id)
    .bind(project_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Video {} no está en la papelera", id)));
    }
    require_project_video(pool, project_id, id).await
}

/// Permanently delete every trashed video of a project
pub async fn empty_trash(pool: &SqlitePool, project_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM videos WHERE project_id = ? AND is_deleted = 1")
        .bind(project_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Videos a youtuber is currently working on
pub async fn count_assigned_uploads(pool: &SqlitePool, user_id: i64) -> Result<i64> {
    Ok(sqlx::query_scalar(
        "SELECT COUNT(*) FROM videos WHERE content_uploaded_by = ? AND status IN (?, ?) AND is_deleted = 0",
    )
    .bind(user_id)
    .bind(VideoStatus::UploadReview.as_str())
    .bind(VideoStatus::MediaCorrections.as_str())
    .fetch_one(pool)
    .await?)
}

/// Videos a youtuber completed since `since`
pub async fn count_completed_uploads_since(
    pool: &SqlitePool,
    user_id: i64,
    since: DateTime<Utc>,
) -> Result<i64> {
    Ok(sqlx::query_scalar(
        "SELECT COUNT(*) FROM videos WHERE content_uploaded_by = ? AND status = ? \
         AND updated_at >= ? AND is_deleted = 0",
    )
    .bind(user_id)
    .bind(VideoStatus::Completed.as_str())
    .bind(since)
    .fetch_one(pool)
    .await?)
}
