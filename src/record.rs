//! Row and wire types shared by the store, the engine and catalog clients.

use serde::{Deserialize, Serialize};

/// One collected channel. Field names (and their order) are the persisted header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    #[serde(rename = "channelId")]
    pub channel_id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    #[serde(rename = "subscriberCount")]
    pub subscriber_count: u64,
    #[serde(rename = "viewCount")]
    pub view_count: u64,
    #[serde(rename = "videoCount")]
    pub video_count: u64,
    /// Search term that surfaced this channel.
    pub query: String,
}

impl ChannelRecord {
    pub fn from_stats(stats: ChannelStats, query: &str) -> Self {
        Self {
            channel_id: stats.channel_id,
            title: stats.title,
            description: stats.description,
            published_at: stats.published_at,
            subscriber_count: stats.subscriber_count,
            view_count: stats.view_count,
            video_count: stats.video_count,
            query: query.to_string(),
        }
    }
}

/// Public statistics for one channel as returned by a stats lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelStats {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub subscriber_count: u64,
    pub view_count: u64,
    pub video_count: u64,
}

/// One page of channel search results.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub channel_ids: Vec<String>,
    /// Absent when the query has no further pages.
    pub next_page_token: Option<String>,
}
