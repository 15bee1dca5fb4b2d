//! Harvested YouTube channels, videos and classifier training data

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitulinChannel {
    pub id: i64,
    pub channel_id: String,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub subscriber_count: Option<i64>,
    pub video_count: Option<i64>,
    pub active: bool,
    pub last_video_fetch: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Result of the evergreen classification attached to a harvested video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisData {
    pub is_evergreen: bool,
    pub confidence: f64,
    pub reason: String,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitulinVideo {
    pub id: i64,
    pub youtube_id: String,
    pub channel_id: String,
    pub title: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
    pub view_count: Option<i64>,
    pub tags: Vec<String>,
    pub analysis_data: Option<AnalysisData>,
    pub sent_to_optimize: bool,
    pub sent_to_optimize_project_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

/// Video metadata as returned by the YouTube client, before storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestedVideo {
    pub youtube_id: String,
    pub title: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
    pub view_count: Option<i64>,
    pub tags: Vec<String>,
}

/// Channel details as returned by the YouTube client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub channel_id: String,
    pub name: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub subscriber_count: Option<i64>,
    pub video_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingExample {
    pub id: i64,
    pub title: String,
    pub is_evergreen: bool,
    pub category: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub has_embedding: bool,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

/// Aggregate counters for the harvesting dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitulinStats {
    pub total_videos: i64,
    pub analyzed_videos: i64,
    pub evergreen_videos: i64,
    pub total_channels: i64,
    pub training_examples: i64,
}
