//! Video list filters, evaluated from the viewer's perspective

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::effective::effective_status;
use super::visibility::can_view_video;
use crate::models::{Actor, Video};

/// Query-string filters for the video listing
///
/// `"all"` and missing values disable a filter. `assignedTo=unassigned`
/// selects videos without a current reviewer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListFilter {
    pub search: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<String>,
    pub project_id: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

fn active(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "all")
}

impl VideoListFilter {
    /// True when `viewer` may see `video` and it passes every filter
    pub fn matches(&self, video: &Video, viewer: &Actor) -> bool {
        if !can_view_video(video, viewer) {
            return false;
        }

        if let Some(term) = active(&self.search) {
            let term = term.to_lowercase();
            let in_title = video.title.to_lowercase().contains(&term);
            let in_series = video
                .series_number
                .as_deref()
                .map(|s| s.to_lowercase().contains(&term))
                .unwrap_or(false);
            if !in_title && !in_series {
                return false;
            }
        }

        if let Some(status) = active(&self.status) {
            if effective_status(video, viewer.role, viewer).as_str() != status {
                return false;
            }
        }

        match active(&self.assigned_to) {
            Some("unassigned") if video.current_reviewer_id.is_some() => return false,
            Some("unassigned") | None => {}
            Some(id) => {
                if video.current_reviewer_id.map(|r| r.to_string()).as_deref() != Some(id) {
                    return false;
                }
            }
        }

        if let Some(project) = active(&self.project_id) {
            if video.project_id.to_string() != project {
                return false;
            }
        }

        if let Some(from) = self.date_from {
            if video.updated_at < from {
                return false;
            }
            if self.date_to.is_some_and(|to| video.updated_at > to) {
                return false;
            }
        }

        true
    }
}
