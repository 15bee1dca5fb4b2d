//! Video record and its metadata document

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::workflow::VideoStatus;

/// A video moving through the production pipeline
///
/// `reviewer_name` / `reviewer_username` are joined from the users table for
/// the current assignee and are not stored on the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub optimized_title: Option<String>,
    pub optimized_description: Option<String>,
    /// Comma-delimited tag list
    pub tags: Option<String>,
    pub series_number: Option<String>,
    pub status: VideoStatus,
    pub metadata: VideoMetadata,
    pub youtube_url: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub current_reviewer_id: Option<i64>,
    pub created_by: Option<i64>,
    pub optimized_by: Option<i64>,
    pub content_uploaded_by: Option<i64>,
    pub media_reviewed_by: Option<i64>,
    pub reviewer_name: Option<String>,
    pub reviewer_username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<i64>,
}

impl Video {
    /// Minimal in-memory video, mostly useful to tests and previews
    pub fn new(id: i64, project_id: i64, title: impl Into<String>, status: VideoStatus) -> Self {
        let now = Utc::now();
        Self {
            id,
            project_id,
            title: title.into(),
            description: None,
            optimized_title: None,
            optimized_description: None,
            tags: None,
            series_number: None,
            status,
            metadata: VideoMetadata::default(),
            youtube_url: None,
            video_url: None,
            thumbnail_url: None,
            current_reviewer_id: None,
            created_by: None,
            optimized_by: None,
            content_uploaded_by: None,
            media_reviewed_by: None,
            reviewer_name: None,
            reviewer_username: None,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
        }
    }

    /// Title shown once optimization produced one
    pub fn display_title(&self) -> &str {
        self.optimized_title.as_deref().unwrap_or(&self.title)
    }
}

/// Free-form metadata bag stored as JSON alongside the video
///
/// Known keys are typed; anything else (`roleView`, client extensions) is
/// kept in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_status: Option<SecondaryStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizationMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrections: Option<CorrectionsMeta>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VideoMetadata {
    /// Custom status override, ignoring empty strings
    pub fn custom_status(&self) -> Option<&str> {
        self.custom_status.as_deref().filter(|s| !s.is_empty())
    }

    /// Shallow merge of a client-supplied metadata object
    ///
    /// Top-level keys in `patch` replace existing ones. Correction history
    /// is never taken from the patch; the stored history always survives.
    pub fn merge_patch(&self, patch: Map<String, Value>) -> crate::Result<VideoMetadata> {
        let history = self
            .corrections
            .as_ref()
            .map(|c| c.history.clone())
            .unwrap_or_default();

        let mut merged = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            merged.insert(key, value);
        }

        let mut metadata: VideoMetadata = serde_json::from_value(Value::Object(merged))?;
        match metadata.corrections.as_mut() {
            Some(corrections) => corrections.history = history,
            None if !history.is_empty() => {
                metadata.corrections = Some(CorrectionsMeta {
                    history,
                    ..CorrectionsMeta::default()
                });
            }
            None => {}
        }
        Ok(metadata)
    }
}

/// Sub-state attached by reviewers (`title_approved`, `title_rejected`, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryStatus {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Optimization bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<AssignedTo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized_by: Option<UserRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<ReviewedBy>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedTo {
    pub user_id: i64,
    pub username: String,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewedBy {
    #[serde(default)]
    pub approved: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Media correction cycle state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionsMeta {
    #[serde(default)]
    pub files: CorrectionFiles,
    /// Append-only audit log of correction requests
    #[serde(default)]
    pub history: Vec<CorrectionEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionFiles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<FileCorrection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<FileCorrection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCorrection {
    pub needs_correction: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionEntry {
    pub comment: String,
    pub timestamp: DateTime<Utc>,
    pub files: CorrectionTargets,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<UserRef>,
}

/// Which media a correction request targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionTargets {
    #[serde(default)]
    pub video: bool,
    #[serde(default)]
    pub thumbnail: bool,
}
