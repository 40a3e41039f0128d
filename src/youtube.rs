//! YouTube Data API v3 implementation of [`CatalogClient`] (API-key auth, blocking HTTP).
//!
//! - `search.list` with `type=channel` for discovery
//! - `channels.list` with `part=snippet,statistics` for enrichment, up to 50 ids per call
//!
//! See: <https://developers.google.com/youtube/v3/docs/search/list>

use crate::catalog::CatalogClient;
use crate::error::RemoteError;
use crate::record::{ChannelStats, SearchPage};
use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Provider cap on `maxResults` for `search.list`.
pub const MAX_PAGE_SIZE: u32 = 50;

pub struct YouTubeCatalog {
    http: reqwest::blocking::Client,
    base: String,
}

impl YouTubeCatalog {
    pub fn new(api_base: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("chanharvest/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build HTTP client")?;
        Ok(Self { http, base: api_base.into().trim_end_matches('/').to_string() })
    }

    fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, RemoteError> {
        let url = format!("{}/{}", self.base, endpoint);
        let resp = self
            .http
            .get(&url)
            .query(params)
            .send()
            // the request URL carries the API key
            .map_err(|e| RemoteError::Other(format!("send {endpoint} request: {}", e.without_url())))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| RemoteError::Other(format!("read {endpoint} response: {}", e.without_url())))?;
        if !status.is_success() {
            return Err(RemoteError::classify(status.as_u16(), &body));
        }
        Ok(body)
    }
}

impl CatalogClient for YouTubeCatalog {
    fn search_channels(
        &self,
        credential: &str,
        query: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<SearchPage, RemoteError> {
        let max_results = page_size.clamp(1, MAX_PAGE_SIZE).to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("type", "channel"),
            ("q", query),
            ("maxResults", max_results.as_str()),
            ("key", credential),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        let body = self.get("search", &params)?;
        parse_search_page(&body)
    }

    fn channel_stats(&self, credential: &str, ids: &[String]) -> Result<Vec<ChannelStats>, RemoteError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let joined = ids.join(",");
        let body = self.get(
            "channels",
            &[("part", "snippet,statistics"), ("id", joined.as_str()), ("key", credential)],
        )?;
        parse_channel_stats(&body)
    }
}

#[derive(Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct SearchResult {
    id: ResourceId,
}

#[derive(Deserialize)]
struct ResourceId {
    #[serde(rename = "channelId")]
    channel_id: Option<String>,
}

#[derive(Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<Channel>,
}

#[derive(Deserialize)]
struct Channel {
    id: String,
    #[serde(default)]
    snippet: ChannelSnippet,
    #[serde(default)]
    statistics: ChannelStatistics,
}

#[derive(Deserialize, Default)]
struct ChannelSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "publishedAt", default)]
    published_at: String,
}

// Counts come back as decimal strings; subscriberCount is absent when hidden.
#[derive(Deserialize, Default)]
struct ChannelStatistics {
    #[serde(rename = "subscriberCount")]
    subscriber_count: Option<String>,
    #[serde(rename = "viewCount")]
    view_count: Option<String>,
    #[serde(rename = "videoCount")]
    video_count: Option<String>,
}

/// Decode a `search.list` response body. Results without a channel id are skipped.
pub fn parse_search_page(body: &str) -> Result<SearchPage, RemoteError> {
    let resp: SearchListResponse = serde_json::from_str(body)
        .map_err(|e| RemoteError::Other(format!("decode search response: {e}")))?;
    Ok(SearchPage {
        channel_ids: resp.items.into_iter().filter_map(|r| r.id.channel_id).collect(),
        next_page_token: resp.next_page_token.filter(|t| !t.is_empty()),
    })
}

/// Decode a `channels.list` response body, preserving response order.
pub fn parse_channel_stats(body: &str) -> Result<Vec<ChannelStats>, RemoteError> {
    let resp: ChannelListResponse = serde_json::from_str(body)
        .map_err(|e| RemoteError::Other(format!("decode channels response: {e}")))?;
    Ok(resp
        .items
        .into_iter()
        .map(|ch| ChannelStats {
            channel_id: ch.id,
            title: ch.snippet.title,
            description: ch.snippet.description,
            published_at: ch.snippet.published_at,
            subscriber_count: count(&ch.statistics.subscriber_count),
            view_count: count(&ch.statistics.view_count),
            video_count: count(&ch.statistics.video_count),
        })
        .collect())
}

#[inline]
fn count(raw: &Option<String>) -> u64 {
    raw.as_deref().and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}
