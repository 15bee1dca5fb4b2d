//! Status registry
//!
//! The closed set of stored video statuses and the labels each role sees
//! for them. Role-specific labels fall back to the generic label.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Role;
use crate::Error;

/// Stored video status
///
/// Main pipeline order:
/// `pending → in_progress → optimize_review → title_corrections → upload_review
/// → media_corrections → review → youtube_ready → completed`,
/// plus the side state `en_revision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    Pending,
    InProgress,
    OptimizeReview,
    TitleCorrections,
    UploadReview,
    MediaCorrections,
    Review,
    YoutubeReady,
    Completed,
    EnRevision,
}

impl VideoStatus {
    /// All statuses, pipeline order first, side state last
    pub const ALL: [VideoStatus; 10] = [
        VideoStatus::Pending,
        VideoStatus::InProgress,
        VideoStatus::OptimizeReview,
        VideoStatus::TitleCorrections,
        VideoStatus::UploadReview,
        VideoStatus::MediaCorrections,
        VideoStatus::Review,
        VideoStatus::YoutubeReady,
        VideoStatus::Completed,
        VideoStatus::EnRevision,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Pending => "pending",
            VideoStatus::InProgress => "in_progress",
            VideoStatus::OptimizeReview => "optimize_review",
            VideoStatus::TitleCorrections => "title_corrections",
            VideoStatus::UploadReview => "upload_review",
            VideoStatus::MediaCorrections => "media_corrections",
            VideoStatus::Review => "review",
            VideoStatus::YoutubeReady => "youtube_ready",
            VideoStatus::Completed => "completed",
            VideoStatus::EnRevision => "en_revision",
        }
    }

    /// Generic human label
    pub fn label(&self) -> &'static str {
        match self {
            VideoStatus::Pending => "Pendiente",
            VideoStatus::InProgress => "En Optimización",
            VideoStatus::OptimizeReview => "Revisión de Optimización",
            VideoStatus::TitleCorrections => "Correcciones de Título",
            VideoStatus::UploadReview => "Subir Archivos",
            VideoStatus::MediaCorrections => "Correcciones de Archivos",
            VideoStatus::Review => "Rev. Final",
            VideoStatus::YoutubeReady => "Listo para YouTube",
            VideoStatus::Completed => "Completado",
            VideoStatus::EnRevision => "En Revisión",
        }
    }

    /// Label as perceived by `role`
    pub fn label_for(&self, role: Role) -> &'static str {
        let role_label = match (role, self) {
            (Role::Optimizer, VideoStatus::Pending) => Some("Disponible"),
            (Role::Optimizer, VideoStatus::OptimizeReview) => Some("En Revisión de Título"),
            (Role::Youtuber, VideoStatus::UploadReview) => Some("Subir Media"),
            (Role::Youtuber, VideoStatus::MediaCorrections) => Some("Correcciones de Media"),
            (Role::Reviewer, VideoStatus::OptimizeReview) => Some("Revisar Título"),
            (Role::Reviewer, VideoStatus::Review) => Some("Revisión Final"),
            _ => None,
        };

        role_label.unwrap_or_else(|| self.label())
    }

    /// True for statuses no further work happens in
    pub fn is_final(&self) -> bool {
        matches!(self, VideoStatus::Completed)
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VideoStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown video status: {}", s)))
    }
}
