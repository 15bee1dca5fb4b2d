//! Video update orchestrator
//!
//! Applies an edit to a video on behalf of an actor. Status changes are
//! checked against the actor's transition table before anything is
//! written; approved edits are stamped with the bookkeeping each
//! transition needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::transitions::can_transition;
use super::VideoStatus;
use crate::models::{
    Actor, AssignedTo, CorrectionEntry, CorrectionTargets, FileCorrection, UserRef, Video,
};
use crate::{Error, Result};

/// Metadata keys only an administrator may write through a patch
const ADMIN_METADATA_KEYS: [&str; 4] = [
    "customStatus",
    "optimization",
    "secondaryStatus",
    "corrections",
];

/// Correction request sent along with a move into `media_corrections`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRequest {
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub video: bool,
    #[serde(default)]
    pub thumbnail: bool,
}

/// Client-supplied edit of a video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPatch {
    #[serde(default)]
    pub status: Option<VideoStatus>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub optimized_title: Option<String>,
    #[serde(default)]
    pub optimized_description: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub youtube_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Shallow-merged into the stored metadata
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub corrections: Option<CorrectionRequest>,
}

/// Outcome of an approved update, ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    pub video: Video,
    /// `(from, to)` when the update changed the status
    pub transition: Option<(VideoStatus, VideoStatus)>,
    pub title_changed: bool,
}

/// Validate and apply `patch` to `video` as `actor`
///
/// Requesting the status the video already has is not a transition and is
/// always accepted.
pub fn apply_update(
    actor: &Actor,
    video: &Video,
    patch: VideoPatch,
    now: DateTime<Utc>,
) -> Result<UpdatePlan> {
    let from = video.status;
    let transition = match patch.status {
        Some(to) if to != from => {
            if !can_transition(actor.role, from, to) {
                return Err(Error::InvalidTransition {
                    role: actor.role,
                    from,
                    to,
                });
            }
            Some((from, to))
        }
        _ => None,
    };

    let mut next = video.clone();
    let title_changed = patch.title.as_ref().is_some_and(|t| *t != video.title);

    if let Some(title) = patch.title {
        if title.trim().is_empty() {
            return Err(Error::InvalidInput("El título no puede estar vacío".to_string()));
        }
        next.title = title;
    }
    if let Some(description) = patch.description {
        next.description = Some(description);
    }
    if let Some(optimized_title) = patch.optimized_title {
        next.optimized_title = Some(optimized_title);
    }
    if let Some(optimized_description) = patch.optimized_description {
        next.optimized_description = Some(optimized_description);
    }
    if let Some(tags) = patch.tags {
        next.tags = Some(tags);
    }
    if let Some(youtube_url) = patch.youtube_url {
        next.youtube_url = Some(youtube_url);
    }
    if let Some(video_url) = patch.video_url {
        next.video_url = Some(video_url);
    }
    if let Some(thumbnail_url) = patch.thumbnail_url {
        next.thumbnail_url = Some(thumbnail_url);
    }
    if let Some(metadata) = patch.metadata {
        if !actor.role.is_admin() {
            if let Some(key) = metadata
                .keys()
                .find(|k| ADMIN_METADATA_KEYS.contains(&k.as_str()))
            {
                return Err(Error::Forbidden(format!(
                    "Solo un administrador puede modificar metadata.{}",
                    key
                )));
            }
        }
        next.metadata = video.metadata.merge_patch(metadata)?;
    }

    next.updated_at = now;

    if let Some((from, to)) = transition {
        debug!(video_id = video.id, %from, %to, actor = actor.id, "Applying status transition");
        next.status = to;
        stamp_transition(&mut next, actor, from, to, patch.corrections, now);
    }

    Ok(UpdatePlan {
        video: next,
        transition,
        title_changed,
    })
}

fn stamp_transition(
    video: &mut Video,
    actor: &Actor,
    from: VideoStatus,
    to: VideoStatus,
    corrections: Option<CorrectionRequest>,
    now: DateTime<Utc>,
) {
    let actor_ref = UserRef {
        user_id: actor.id,
        username: actor.username.clone(),
    };

    match (from, to) {
        (VideoStatus::Pending, VideoStatus::InProgress) => {
            video.current_reviewer_id = Some(actor.id);
            video.reviewer_name = None;
            video.reviewer_username = Some(actor.username.clone());
            let optimization = video.metadata.optimization.get_or_insert_with(Default::default);
            optimization.assigned_to = Some(AssignedTo {
                user_id: actor.id,
                username: actor.username.clone(),
                assigned_at: now,
            });
        }
        (VideoStatus::InProgress | VideoStatus::TitleCorrections, VideoStatus::OptimizeReview) => {
            video.optimized_by = Some(actor.id);
            let optimization = video.metadata.optimization.get_or_insert_with(Default::default);
            optimization.optimized_by = Some(actor_ref);
        }
        (_, VideoStatus::MediaCorrections) => {
            let request = corrections.unwrap_or_default();
            let targets = CorrectionTargets {
                video: request.video,
                thumbnail: request.thumbnail,
            };
            let original_video = video.video_url.clone();
            let original_thumbnail = video.thumbnail_url.clone();
            let meta = video.metadata.corrections.get_or_insert_with(Default::default);
            meta.files.video = Some(FileCorrection {
                needs_correction: targets.video,
                original_url: original_video,
            });
            meta.files.thumbnail = Some(FileCorrection {
                needs_correction: targets.thumbnail,
                original_url: original_thumbnail,
            });
            meta.status = Some("pending".to_string());
            meta.history.push(CorrectionEntry {
                comment: request.comment,
                timestamp: now,
                files: targets,
                requested_by: Some(actor_ref),
            });
            video.media_reviewed_by = Some(actor.id);
        }
        (VideoStatus::MediaCorrections, _) => {
            if let Some(meta) = video.metadata.corrections.as_mut() {
                meta.status = Some("resolved".to_string());
            }
        }
        _ => {}
    }
}
