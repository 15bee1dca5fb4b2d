//! Affiliate companies and per-video matches

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use vidflow_common::db::affiliates::{self, CompanyInput};
use vidflow_common::db::videos;
use vidflow_common::export::{export_company_names, parse_company_names};
use vidflow_common::models::{AffiliateCompany, AffiliateMatch};

use super::{ok, ApiError, CurrentUser, Envelope};
use crate::notify;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyListQuery {
    #[serde(default)]
    pub active_only: bool,
}

/// GET /api/affiliates/companies
pub async fn list_companies(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<CompanyListQuery>,
) -> Result<Json<Envelope<Vec<AffiliateCompany>>>, ApiError> {
    Ok(ok(affiliates::list_companies(&state.db, query.active_only).await?))
}

/// Match `company` against existing videos and notify each new mention
async fn rescan(state: &AppState, company: &AffiliateCompany) -> Result<usize, ApiError> {
    let matched = affiliates::scan_videos_for_company(&state.db, company).await?;
    for video_id in &matched {
        if let Some(video) = videos::get_video(&state.db, *video_id).await? {
            notify::affiliate_mentions(&state.db, &state.hub, &video, std::slice::from_ref(company)).await?;
        }
    }
    if !matched.is_empty() {
        info!("Company '{}' matched {} existing videos", company.name, matched.len());
    }
    Ok(matched.len())
}

/// POST /api/affiliates/companies
pub async fn create_company(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<CompanyInput>,
) -> Result<(StatusCode, Json<Envelope<AffiliateCompany>>), ApiError> {
    user.require_admin()?;
    let company = affiliates::create_company(&state.db, &input).await?;
    info!("Affiliate company '{}' created by '{}'", company.name, user.username);

    if let Err(e) = rescan(&state, &company).await {
        warn!("Initial affiliate scan for '{}' failed: {:?}", company.name, e);
    }
    Ok((StatusCode::CREATED, ok(company)))
}

/// PUT /api/affiliates/companies/:id
///
/// Re-activating a company rescans every video.
pub async fn update_company(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<CompanyInput>,
) -> Result<Json<Envelope<AffiliateCompany>>, ApiError> {
    user.require_admin()?;
    let (company, reactivated) = affiliates::update_company(&state.db, id, &input).await?;
    if reactivated {
        rescan(&state, &company).await?;
    }
    Ok(ok(company))
}

/// DELETE /api/affiliates/companies/:id
pub async fn delete_company(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, ApiError> {
    user.require_admin()?;
    affiliates::delete_company(&state.db, id).await?;
    Ok(ok(()))
}

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub created: u64,
    pub skipped: u64,
}

/// POST /api/affiliates/companies/import
///
/// Plain-text body, one company name per line.
pub async fn import_companies(
    State(state): State<AppState>,
    user: CurrentUser,
    body: String,
) -> Result<Json<Envelope<ImportSummary>>, ApiError> {
    user.require_admin()?;
    let names = parse_company_names(&body);
    if names.is_empty() {
        return Err(ApiError::bad_request("El archivo no contiene nombres de empresas"));
    }

    let (created, skipped) = affiliates::import_company_names(&state.db, &names).await?;
    info!("Imported {} affiliate companies ({} already existed)", created, skipped);
    Ok(ok(ImportSummary { created, skipped }))
}

/// GET /api/affiliates/companies/export
pub async fn export_companies(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, ApiError> {
    user.require_admin()?;
    let companies = affiliates::list_companies(&state.db, false).await?;
    let body = export_company_names(companies.iter().map(|c| c.name.as_str()));

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"empresas_afiliadas.txt\""),
        ],
        body,
    )
        .into_response())
}

/// GET /api/affiliates/videos/:video_id/matches
pub async fn video_matches(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(video_id): Path<i64>,
) -> Result<Json<Envelope<Vec<AffiliateMatch>>>, ApiError> {
    Ok(ok(affiliates::list_matches_for_video(&state.db, video_id).await?))
}

/// PUT /api/affiliates/matches/:match_id/inclusion
///
/// Only the video's youtuber or an admin may record inclusion.
pub async fn update_inclusion(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(match_id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Envelope<AffiliateMatch>>, ApiError> {
    let included = body
        .get("included")
        .and_then(Value::as_bool)
        .ok_or_else(|| ApiError::bad_request("El campo 'included' debe ser booleano"))?;

    let existing = affiliates::get_match(&state.db, match_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Coincidencia no encontrada"))?;

    if !user.role.is_admin() {
        let owner = videos::get_video(&state.db, existing.video_id)
            .await?
            .and_then(|v| v.content_uploaded_by);
        if owner != Some(user.id) {
            return Err(ApiError::forbidden("No tienes permiso para modificar esta coincidencia"));
        }
    }

    Ok(ok(affiliates::set_inclusion(&state.db, match_id, included).await?))
}
