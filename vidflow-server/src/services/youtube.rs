//! YouTube Data API v3 client

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};
use vidflow_common::config::YoutubeConfig;
use vidflow_common::models::{ChannelInfo, HarvestedVideo};
use vidflow_common::{Error, Result};

use super::YoutubeClient;

/// Playlist page size, the API maximum
const PLAYLIST_PAGE_SIZE: &str = "50";

/// Ids per `videos.list` request
const DETAILS_BATCH: usize = 25;

/// How a channel reference has to be looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    Id(String),
    Handle(String),
}

/// Parse a channel URL, `@handle` or bare `UC...` id
pub fn parse_channel_ref(url: &str) -> Option<ChannelRef> {
    let url = url.trim().trim_end_matches('/');
    if url.is_empty() {
        return None;
    }

    if url.starts_with("UC") && !url.contains('/') {
        return Some(ChannelRef::Id(url.to_string()));
    }
    if let Some((_, handle)) = url.rsplit_once('@') {
        return non_empty(first_segment(handle)).map(ChannelRef::Handle);
    }
    if let Some((_, id)) = url.split_once("/channel/") {
        return non_empty(first_segment(id)).map(ChannelRef::Id);
    }
    if let Some((_, custom)) = url.split_once("/c/") {
        return non_empty(first_segment(custom)).map(ChannelRef::Handle);
    }
    url.rsplit('/').next().and_then(non_empty).map(ChannelRef::Handle)
}

fn first_segment(path: &str) -> &str {
    path.split(['/', '?']).next().unwrap_or(path)
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    channel_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Snippet {
    title: String,
    description: Option<String>,
    published_at: Option<DateTime<Utc>>,
    thumbnails: Thumbnails,
    tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Thumbnails {
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// Counts arrive as decimal strings
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Statistics {
    subscriber_count: Option<String>,
    video_count: Option<String>,
    view_count: Option<String>,
}

fn count(value: &Option<String>) -> Option<i64> {
    value.as_deref().and_then(|v| v.parse().ok())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    id: String,
    #[serde(default)]
    snippet: Snippet,
    #[serde(default)]
    statistics: Statistics,
    #[serde(default)]
    content_details: ChannelContentDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    content_details: PlaylistContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistContentDetails {
    video_id: String,
    video_published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: Snippet,
    #[serde(default)]
    statistics: Statistics,
}

impl From<VideoItem> for HarvestedVideo {
    fn from(item: VideoItem) -> Self {
        HarvestedVideo {
            youtube_id: item.id,
            title: item.snippet.title,
            description: item.snippet.description,
            published_at: item.snippet.published_at,
            thumbnail_url: item.snippet.thumbnails.default.map(|t| t.url),
            view_count: count(&item.statistics.view_count),
            tags: item.snippet.tags,
        }
    }
}

/// `reqwest` implementation keyed by an API key
pub struct YoutubeApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YoutubeApiClient {
    pub fn new(config: &YoutubeConfig, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn get<T: DeserializeOwned>(&self, resource: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, resource);
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|e| Error::External(format!("YouTube request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::External(format!("YouTube API error {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| Error::External(format!("Invalid YouTube response: {}", e)))
    }

    async fn channel(&self, channel_id: &str, parts: &str) -> Result<ChannelItem> {
        let response: ListResponse<ChannelItem> = self
            .get("channels", &[("part", parts), ("id", channel_id)])
            .await?;
        response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound("Canal no encontrado".into()))
    }
}

#[async_trait]
impl YoutubeClient for YoutubeApiClient {
    async fn resolve_channel(&self, url: &str) -> Result<ChannelInfo> {
        let channel_id = match parse_channel_ref(url) {
            Some(ChannelRef::Id(id)) => id,
            Some(ChannelRef::Handle(handle)) => {
                debug!("Searching channel by handle '{}'", handle);
                let response: ListResponse<SearchItem> = self
                    .get(
                        "search",
                        &[("part", "snippet"), ("q", handle.as_str()), ("type", "channel"), ("maxResults", "1")],
                    )
                    .await?;
                response
                    .items
                    .into_iter()
                    .next()
                    .map(|item| item.snippet.channel_id)
                    .ok_or_else(|| Error::NotFound("Canal no encontrado".into()))?
            }
            None => return Err(Error::InvalidInput("URL de canal inválida".into())),
        };

        let channel = self.channel(&channel_id, "snippet,statistics").await?;
        Ok(ChannelInfo {
            channel_id: channel.id,
            name: channel.snippet.title,
            description: channel.snippet.description,
            thumbnail_url: channel.snippet.thumbnails.default.map(|t| t.url),
            subscriber_count: count(&channel.statistics.subscriber_count),
            video_count: count(&channel.statistics.video_count),
        })
    }

    async fn fetch_videos(
        &self,
        channel_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<HarvestedVideo>> {
        let channel = self.channel(channel_id, "contentDetails").await?;
        let uploads = channel
            .content_details
            .related_playlists
            .uploads
            .ok_or_else(|| Error::External("El canal no tiene lista de subidas".into()))?;

        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;
        'pages: loop {
            let mut query = vec![
                ("part", "contentDetails"),
                ("playlistId", uploads.as_str()),
                ("maxResults", PLAYLIST_PAGE_SIZE),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let page: ListResponse<PlaylistItem> = self.get("playlistItems", &query).await?;

            for item in page.items {
                let details = item.content_details;
                if let (Some(since), Some(published)) = (since, details.video_published_at) {
                    if published <= since {
                        break 'pages;
                    }
                }
                ids.push(details.video_id);
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        let mut videos = Vec::with_capacity(ids.len());
        for batch in ids.chunks(DETAILS_BATCH) {
            let joined = batch.join(",");
            let response: ListResponse<VideoItem> = self
                .get("videos", &[("part", "snippet,statistics"), ("id", joined.as_str())])
                .await?;
            videos.extend(response.items.into_iter().map(HarvestedVideo::from));
        }

        info!("Fetched {} videos for channel {}", videos.len(), channel_id);
        Ok(videos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel_references() {
        assert_eq!(
            parse_channel_ref("https://www.youtube.com/@midudev/"),
            Some(ChannelRef::Handle("midudev".into()))
        );
        assert_eq!(
            parse_channel_ref("https://www.youtube.com/channel/UC8LeXCWOalN8SxlrPcG-PaQ"),
            Some(ChannelRef::Id("UC8LeXCWOalN8SxlrPcG-PaQ".into()))
        );
        assert_eq!(
            parse_channel_ref("UC8LeXCWOalN8SxlrPcG-PaQ"),
            Some(ChannelRef::Id("UC8LeXCWOalN8SxlrPcG-PaQ".into()))
        );
        assert_eq!(
            parse_channel_ref("https://youtube.com/c/Fazt"),
            Some(ChannelRef::Handle("Fazt".into()))
        );
        assert_eq!(parse_channel_ref("  "), None);
    }

    #[test]
    fn test_video_item_conversion() {
        let item: VideoItem = serde_json::from_str(
            r#"{
                "id": "abc123",
                "snippet": {
                    "title": "Cómo usar Excel",
                    "publishedAt": "2024-03-01T10:00:00Z",
                    "thumbnails": {"default": {"url": "https://i.ytimg.com/x.jpg"}},
                    "tags": ["excel"]
                },
                "statistics": {"viewCount": "1500"}
            }"#,
        )
        .unwrap();

        let video = HarvestedVideo::from(item);
        assert_eq!(video.youtube_id, "abc123");
        assert_eq!(video.view_count, Some(1500));
        assert_eq!(video.thumbnail_url.as_deref(), Some("https://i.ytimg.com/x.jpg"));
        assert_eq!(video.tags, vec!["excel".to_string()]);
    }
}
