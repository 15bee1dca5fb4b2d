//! Effective status and effective assignment
//!
//! The same stored video reads differently per role: `upload_review` is a
//! shared pool for youtubers and reviewers, pending work is "available" to
//! optimizers, and a `customStatus` override wins for everyone.

use serde::{Serialize, Serializer};
use std::fmt;

use super::{Role, VideoStatus};
use crate::models::{Actor, Video};

/// Status a role perceives for a video
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectiveStatus {
    /// Stored status, shown unchanged
    Raw(VideoStatus),
    /// Pending work an optimizer can pick up
    Disponible,
    /// Upload pool entry not held by the viewer
    VideoDisponible,
    /// Upload pool entry held by the viewing youtuber
    Asignado,
    /// `metadata.customStatus` override
    Custom(String),
}

impl EffectiveStatus {
    pub fn as_str(&self) -> &str {
        match self {
            EffectiveStatus::Raw(status) => status.as_str(),
            EffectiveStatus::Disponible => "disponible",
            EffectiveStatus::VideoDisponible => "video_disponible",
            EffectiveStatus::Asignado => "asignado",
            EffectiveStatus::Custom(custom) => custom,
        }
    }

    /// Human label for `role`
    pub fn label_for(&self, role: Role) -> &str {
        match self {
            EffectiveStatus::Raw(status) => status.label_for(role),
            EffectiveStatus::Disponible => "Disponible",
            EffectiveStatus::VideoDisponible => "Video Disponible",
            EffectiveStatus::Asignado => "Asignado",
            EffectiveStatus::Custom(custom) => custom,
        }
    }
}

impl fmt::Display for EffectiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EffectiveStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Resolve the status `role` perceives for `video`; first matching rule wins
///
/// A reviewer always sees `upload_review` as `video_disponible`, even when
/// they are the stored assignee.
pub fn effective_status(video: &Video, role: Role, viewer: &Actor) -> EffectiveStatus {
    if let Some(custom) = video.metadata.custom_status() {
        return EffectiveStatus::Custom(custom.to_string());
    }

    match (role, video.status) {
        (Role::Youtuber, VideoStatus::UploadReview) => {
            if video.current_reviewer_id == Some(viewer.id) {
                EffectiveStatus::Asignado
            } else {
                EffectiveStatus::VideoDisponible
            }
        }
        (Role::Reviewer, VideoStatus::UploadReview) => EffectiveStatus::VideoDisponible,
        (Role::Optimizer, VideoStatus::Pending) => EffectiveStatus::Disponible,
        (_, status) => EffectiveStatus::Raw(status),
    }
}

/// Who a role perceives as owning a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub name: Option<String>,
    pub id: Option<i64>,
}

impl Assignment {
    fn available() -> Self {
        Self {
            name: Some("Disponible".to_string()),
            id: None,
        }
    }
}

/// Resolve the assignee `role` perceives for `video`
///
/// Youtubers never learn which other youtuber claimed an upload.
pub fn effective_assignment(video: &Video, role: Role, viewer: &Actor) -> Assignment {
    match (role, video.status) {
        (Role::Reviewer, VideoStatus::UploadReview) => return Assignment::available(),
        (Role::Youtuber, VideoStatus::UploadReview) => {
            return match video.current_reviewer_id {
                Some(id) if id == viewer.id => Assignment {
                    name: Some(if viewer.username.is_empty() {
                        "Tú".to_string()
                    } else {
                        viewer.username.clone()
                    }),
                    id: Some(id),
                },
                Some(id) => Assignment {
                    name: Some("No disponible".to_string()),
                    id: Some(id),
                },
                None => Assignment::available(),
            };
        }
        _ => {}
    }

    if role == Role::Optimizer {
        let title_approved = video
            .metadata
            .secondary_status
            .as_ref()
            .is_some_and(|s| s.kind == "title_approved");
        if let Some(optimization) = video.metadata.optimization.as_ref() {
            let approved = optimization.reviewed_by.as_ref().is_some_and(|r| r.approved);
            if let (true, true, Some(optimizer)) =
                (title_approved, approved, optimization.optimized_by.as_ref())
            {
                return Assignment {
                    name: Some(optimizer.username.clone()),
                    id: Some(optimizer.user_id),
                };
            }
        }
    }

    Assignment {
        name: video
            .reviewer_name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| video.reviewer_username.clone()),
        id: video.current_reviewer_id,
    }
}
