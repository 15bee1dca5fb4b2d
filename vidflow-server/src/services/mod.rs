//! External collaborators: YouTube Data API and the analysis service
//!
//! Handlers only see the traits; `main` wires the `reqwest`
//! implementations when credentials are configured and the disabled ones
//! otherwise.

pub mod analysis;
pub mod classifier;
pub mod youtube;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vidflow_common::models::{ChannelInfo, HarvestedVideo};
use vidflow_common::titulin::Classification;
use vidflow_common::{Error, Result};

pub use analysis::OpenAiAnalysis;
pub use classifier::{analyze_title, find_similar_titles, TitleAnalysis};
pub use youtube::YoutubeApiClient;

#[async_trait]
pub trait YoutubeClient: Send + Sync {
    /// Resolve a channel URL, handle or id to its details
    async fn resolve_channel(&self, url: &str) -> Result<ChannelInfo>;

    /// Uploads of a channel, newest first, published after `since` when given
    async fn fetch_videos(
        &self,
        channel_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<HarvestedVideo>>;
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[async_trait]
pub trait TitleClassifier: Send + Sync {
    /// Classify a title given the prompt built from examples and neighbours
    async fn classify(&self, prompt: &str) -> Result<Classification>;
}

/// Stand-in when no YouTube API key is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledYoutube;

#[async_trait]
impl YoutubeClient for DisabledYoutube {
    async fn resolve_channel(&self, _url: &str) -> Result<ChannelInfo> {
        Err(Error::External("YouTube API no configurada".into()))
    }

    async fn fetch_videos(
        &self,
        _channel_id: &str,
        _since: Option<DateTime<Utc>>,
    ) -> Result<Vec<HarvestedVideo>> {
        Err(Error::External("YouTube API no configurada".into()))
    }
}

/// Stand-in when no analysis API key is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAnalysis;

#[async_trait]
impl EmbeddingProvider for DisabledAnalysis {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::External("Servicio de análisis no configurado".into()))
    }
}

#[async_trait]
impl TitleClassifier for DisabledAnalysis {
    async fn classify(&self, _prompt: &str) -> Result<Classification> {
        Err(Error::External("Servicio de análisis no configurado".into()))
    }
}
