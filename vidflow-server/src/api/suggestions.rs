//! Suggestion box

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use vidflow_common::db::suggestions::{self, SuggestionFilter};
use vidflow_common::models::{NewSuggestion, Suggestion, SuggestionStatus, SUGGESTION_CATEGORIES};

use super::{ok, ApiError, CurrentUser, Envelope};
use crate::AppState;

/// POST /api/suggestions
pub async fn create_suggestion(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<NewSuggestion>,
) -> Result<(StatusCode, Json<Envelope<Suggestion>>), ApiError> {
    let suggestion = suggestions::create_suggestion(&state.db, user.id, &body).await?;
    info!("Suggestion {} filed by '{}'", suggestion.id, user.username);
    Ok((StatusCode::CREATED, ok(suggestion)))
}

/// GET /api/suggestions/user
pub async fn list_user_suggestions(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Envelope<Vec<Suggestion>>>, ApiError> {
    Ok(ok(suggestions::list_user_suggestions(&state.db, user.id).await?))
}

/// GET /api/suggestions/categories
pub async fn suggestion_categories(_user: CurrentUser) -> Json<Envelope<Vec<&'static str>>> {
    ok(SUGGESTION_CATEGORIES.to_vec())
}

/// GET /api/suggestions
pub async fn list_suggestions(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filter): Query<SuggestionFilter>,
) -> Result<Json<Envelope<Vec<Suggestion>>>, ApiError> {
    user.require_admin()?;
    Ok(ok(suggestions::list_suggestions(&state.db, &filter).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub status: String,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

/// PATCH /api/suggestions/:id/status
pub async fn update_suggestion_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Envelope<Suggestion>>, ApiError> {
    user.require_admin()?;
    let status: SuggestionStatus = body.status.parse()?;
    let updated = suggestions::update_status(&state.db, id, status, body.admin_notes.as_deref()).await?;
    Ok(ok(updated))
}
