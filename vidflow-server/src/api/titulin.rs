//! Titulin: harvested channels, evergreen analysis and training data

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use vidflow_common::db::init::get_setting_i64;
use vidflow_common::db::titulin::{self, ExampleQuery, VideoQuery};
use vidflow_common::models::{AnalysisData, TitulinChannel, TitulinStats, TitulinVideo, TrainingExample};
use vidflow_common::titulin::import::{export_training_examples as examples_csv, parse_training_examples};
use vidflow_common::titulin::SimilarTitle;
use vidflow_common::workflow::Role;

use super::{ok, ApiError, CurrentUser, Envelope};
use crate::pagination::{calculate_pagination, page_offset, PageQuery, Pagination};
use crate::services::{self, TitleAnalysis};
use crate::AppState;

const DEFAULT_SIMILAR_LIMIT: usize = 5;
const MAX_SIMILAR_LIMIT: usize = 50;

/// Examples embedded per process-vectors call
const VECTOR_BATCH: i64 = 50;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

// ============================================================================
// Channels
// ============================================================================

/// GET /api/titulin/channels
pub async fn list_channels(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Envelope<Vec<TitulinChannel>>>, ApiError> {
    Ok(ok(titulin::list_channels(&state.db).await?))
}

#[derive(Debug, Deserialize)]
pub struct AddChannelRequest {
    pub url: String,
}

/// POST /api/titulin/channels
pub async fn add_channel(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<AddChannelRequest>,
) -> Result<(StatusCode, Json<Envelope<TitulinChannel>>), ApiError> {
    user.require_admin()?;
    if body.url.trim().is_empty() {
        return Err(ApiError::bad_request("La URL del canal es requerida"));
    }

    let info = state.youtube.resolve_channel(&body.url).await?;
    let channel = titulin::create_channel(&state.db, &info, &body.url).await?;
    info!("Channel '{}' ({}) added by '{}'", channel.name, channel.channel_id, user.username);
    Ok((StatusCode::CREATED, ok(channel)))
}

/// DELETE /api/titulin/channels/:id
pub async fn delete_channel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, ApiError> {
    user.require_admin()?;
    titulin::delete_channel(&state.db, id).await?;
    Ok(ok(()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub fetched: usize,
    pub new_videos: usize,
}

/// POST /api/titulin/channels/:id/sync
///
/// Fetches videos published after the previous sync and upserts them by
/// YouTube id.
pub async fn sync_channel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<SyncResult>>, ApiError> {
    user.require_admin()?;
    let channel = titulin::get_channel(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Canal no encontrado"))?;

    let started = Utc::now();
    let fetched = state
        .youtube
        .fetch_videos(&channel.channel_id, channel.last_video_fetch)
        .await?;

    let mut new_videos = 0;
    for video in &fetched {
        if titulin::upsert_video(&state.db, &channel.channel_id, video).await? {
            new_videos += 1;
        }
    }
    titulin::mark_channel_fetched(&state.db, id, started).await?;

    info!(
        "Synced channel '{}': {} fetched, {} new",
        channel.name,
        fetched.len(),
        new_videos
    );
    Ok(ok(SyncResult {
        fetched: fetched.len(),
        new_videos,
    }))
}

// ============================================================================
// Harvested videos
// ============================================================================

/// GET /api/titulin/videos
pub async fn list_titulin_videos(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(page): Query<PageQuery>,
    Query(filter): Query<VideoQuery>,
) -> Result<Json<Envelope<Page<TitulinVideo>>>, ApiError> {
    let default_size = get_setting_i64(&state.db, "titulin_page_size", 20).await?;
    let (page, size) = page.resolve(default_size);

    let (items, total) = titulin::list_videos(&state.db, &filter, size, page_offset(page, size)).await?;
    Ok(ok(Page {
        items,
        pagination: calculate_pagination(total, page, size),
    }))
}

/// GET /api/titulin/videos/stats
pub async fn titulin_stats(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Envelope<TitulinStats>>, ApiError> {
    Ok(ok(titulin::stats(&state.db).await?))
}

async fn require_harvested(state: &AppState, id: i64) -> Result<TitulinVideo, ApiError> {
    titulin::get_video(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Video no encontrado"))
}

/// POST /api/titulin/videos/:id/analyze
pub async fn analyze_video(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<TitleAnalysis>>, ApiError> {
    let video = require_harvested(&state, id).await?;

    let analysis = services::analyze_title(
        &state.db,
        state.embeddings.as_ref(),
        state.classifier.as_ref(),
        &video.title,
        Some(id),
    )
    .await?;

    titulin::store_video_embedding(&state.db, id, &analysis.embedding).await?;
    titulin::store_analysis(
        &state.db,
        id,
        &AnalysisData {
            is_evergreen: analysis.classification.is_evergreen,
            confidence: analysis.classification.confidence,
            reason: analysis.classification.reason.clone(),
            analyzed_at: Utc::now(),
        },
    )
    .await?;

    Ok(ok(analysis))
}

#[derive(Debug, Default, Deserialize)]
pub struct SimilarQuery {
    pub limit: Option<usize>,
}

/// GET /api/titulin/videos/:id/similar
pub async fn similar_videos(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<SimilarQuery>,
) -> Result<Json<Envelope<Vec<SimilarTitle>>>, ApiError> {
    let video = require_harvested(&state, id).await?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SIMILAR_LIMIT)
        .clamp(1, MAX_SIMILAR_LIMIT);

    let embedding = match video.embedding {
        Some(embedding) => embedding,
        None => {
            let embedding = state.embeddings.embed(&video.title).await?;
            titulin::store_video_embedding(&state.db, id, &embedding).await?;
            embedding
        }
    };

    Ok(ok(services::find_similar_titles(&state.db, &embedding, Some(id), limit).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendToOptimizeRequest {
    pub project_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentToOptimize {
    pub video_id: i64,
}

/// POST /api/titulin/videos/:id/send-to-optimize
pub async fn send_to_optimize(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<SendToOptimizeRequest>,
) -> Result<(StatusCode, Json<Envelope<SentToOptimize>>), ApiError> {
    if !matches!(user.role, Role::Admin | Role::Optimizer) {
        return Err(ApiError::forbidden("No tienes permiso para enviar videos a optimización"));
    }

    let video_id = titulin::send_to_optimize(&state.db, id, body.project_id, user.id).await?;
    info!("Harvested video {} sent to project {} as video {}", id, body.project_id, video_id);
    Ok((StatusCode::CREATED, ok(SentToOptimize { video_id })))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeTitleRequest {
    pub title: String,
}

/// POST /api/titulin/analyze
pub async fn analyze_title(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(body): Json<AnalyzeTitleRequest>,
) -> Result<Json<Envelope<TitleAnalysis>>, ApiError> {
    let title = body.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("El título es requerido"));
    }

    let analysis = services::analyze_title(
        &state.db,
        state.embeddings.as_ref(),
        state.classifier.as_ref(),
        title,
        None,
    )
    .await?;
    Ok(ok(analysis))
}

// ============================================================================
// Training examples
// ============================================================================

/// GET /api/titulin/training-examples
pub async fn list_training_examples(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(page): Query<PageQuery>,
    Query(filter): Query<ExampleQuery>,
) -> Result<Json<Envelope<Page<TrainingExample>>>, ApiError> {
    let default_size = get_setting_i64(&state.db, "titulin_page_size", 20).await?;
    let (page, size) = page.resolve(default_size);

    let (items, total) =
        titulin::list_training_examples(&state.db, &filter, size, page_offset(page, size)).await?;
    Ok(ok(Page {
        items,
        pagination: calculate_pagination(total, page, size),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExample {
    pub title: String,
    pub is_evergreen: bool,
    #[serde(default)]
    pub category: Option<String>,
}

/// POST /api/titulin/training-examples
pub async fn create_training_example(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<NewExample>,
) -> Result<(StatusCode, Json<Envelope<TrainingExample>>), ApiError> {
    user.require_admin()?;
    let example = titulin::create_training_example(
        &state.db,
        &body.title,
        body.is_evergreen,
        body.category.as_deref(),
        Some(user.id),
    )
    .await?;
    Ok((StatusCode::CREATED, ok(example)))
}

/// DELETE /api/titulin/training-examples/:id
pub async fn delete_training_example(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, ApiError> {
    user.require_admin()?;
    titulin::delete_training_example(&state.db, id).await?;
    Ok(ok(()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Delete,
    Update,
    Create,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkExamplesRequest {
    pub action: BulkAction,
    #[serde(default)]
    pub ids: Vec<i64>,
    #[serde(default)]
    pub is_evergreen: Option<bool>,
    #[serde(default)]
    pub examples: Vec<NewExample>,
}

#[derive(Debug, Serialize)]
pub struct Affected {
    pub affected: u64,
}

/// POST /api/titulin/training-examples/bulk
///
/// `delete` and `update` act on `ids` (`update` sets `isEvergreen`);
/// `create` inserts `examples`.
pub async fn bulk_training_examples(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<BulkExamplesRequest>,
) -> Result<Json<Envelope<Affected>>, ApiError> {
    user.require_admin()?;

    let affected = match body.action {
        BulkAction::Delete => {
            if body.ids.is_empty() {
                return Err(ApiError::bad_request("No se indicaron ejemplos"));
            }
            titulin::delete_training_examples(&state.db, &body.ids).await?
        }
        BulkAction::Update => {
            let is_evergreen = body
                .is_evergreen
                .ok_or_else(|| ApiError::bad_request("isEvergreen es requerido"))?;
            if body.ids.is_empty() {
                return Err(ApiError::bad_request("No se indicaron ejemplos"));
            }
            titulin::set_examples_evergreen(&state.db, &body.ids, is_evergreen).await?
        }
        BulkAction::Create => {
            let examples: Vec<(String, bool)> = body
                .examples
                .into_iter()
                .map(|e| (e.title, e.is_evergreen))
                .collect();
            if examples.is_empty() {
                return Err(ApiError::bad_request("No se indicaron ejemplos"));
            }
            titulin::create_training_examples(&state.db, &examples, Some(user.id)).await?
        }
    };

    Ok(ok(Affected { affected }))
}

/// GET /api/titulin/training-examples/export
pub async fn export_training_examples(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, ApiError> {
    user.require_admin()?;
    let examples = titulin::all_training_examples(&state.db).await?;
    let body = examples_csv(&examples)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"ejemplos_entrenamiento.csv\""),
        ],
        body,
    )
        .into_response())
}

/// POST /api/titulin/training-examples/import
///
/// Raw CSV body.
pub async fn import_training_examples(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Bytes,
) -> Result<Json<Envelope<Affected>>, ApiError> {
    user.require_admin()?;
    let rows: Vec<(String, bool)> = parse_training_examples(&body)?
        .into_iter()
        .map(|e| (e.title, e.is_evergreen))
        .collect();

    let affected = titulin::create_training_examples(&state.db, &rows, Some(user.id)).await?;
    info!("Imported {} training examples", affected);
    Ok(ok(Affected { affected }))
}

#[derive(Debug, Serialize)]
pub struct VectorProgress {
    pub processed: usize,
    pub failed: usize,
}

/// POST /api/titulin/training-examples/process-vectors
///
/// Embeds one batch of examples that have no vector yet.
pub async fn process_training_vectors(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Envelope<VectorProgress>>, ApiError> {
    user.require_admin()?;
    let pending = titulin::examples_without_embedding(&state.db, VECTOR_BATCH).await?;

    let mut processed = 0;
    let mut failed = 0;
    for (id, title) in pending {
        match state.embeddings.embed(&title).await {
            Ok(embedding) => {
                titulin::store_example_embedding(&state.db, id, &embedding).await?;
                processed += 1;
            }
            Err(e) => {
                warn!("Embedding failed for training example {}: {}", id, e);
                failed += 1;
            }
        }
    }

    Ok(ok(VectorProgress { processed, failed }))
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub ids: Vec<i64>,
    #[serde(default)]
    pub category: Option<String>,
}

/// PUT /api/titulin/training-examples/category
pub async fn set_examples_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<Envelope<Affected>>, ApiError> {
    user.require_admin()?;
    if body.ids.is_empty() {
        return Err(ApiError::bad_request("No se indicaron ejemplos"));
    }
    let category = body.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let affected = titulin::set_examples_category(&state.db, &body.ids, category).await?;
    Ok(ok(Affected { affected }))
}
