//! YouTube stats fetcher
//!
//! One YouTube Data API v3 call per invocation, no retry. Returns the
//! subscriber count plus view and video totals.

use serde::Deserialize;
use tracing::{debug, warn};

use super::FetchedStats;
use crate::config::Config;
use crate::db::stats::ExtraStats;
use crate::platform::Platform;

const YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3/channels";

#[derive(Debug, Deserialize)]
struct ChannelResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    statistics: ChannelStatistics,
}

// The API returns the numeric statistics as strings
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    subscriber_count: String,
    view_count: String,
    video_count: String,
}

/// Fetch YouTube channel statistics; `None` on any failure
pub async fn fetch(client: &reqwest::Client, config: &Config) -> Option<FetchedStats> {
    let (api_key, channel_id) = match (&config.youtube_api_key, &config.youtube_channel_id) {
        (Some(key), Some(id)) => (key, id),
        _ => {
            warn!("YouTube API credentials not configured, skipping");
            return None;
        }
    };

    debug!("Fetching YouTube stats");
    let response = client
        .get(YOUTUBE_API_URL)
        .query(&[("part", "statistics"), ("id", channel_id.as_str()), ("key", api_key.as_str())])
        .send()
        .await
        .map_err(|e| warn!("YouTube fetch failed: {}", e))
        .ok()?;

    if !response.status().is_success() {
        warn!("YouTube API returned {}", response.status());
        return None;
    }

    let data: ChannelResponse = response
        .json()
        .await
        .map_err(|e| warn!("YouTube response parse failed: {}", e))
        .ok()?;

    let stats = match data.items.first() {
        Some(item) => &item.statistics,
        None => {
            warn!("YouTube channel not found");
            return None;
        }
    };

    let count = stats
        .subscriber_count
        .parse::<u64>()
        .map_err(|e| warn!("YouTube subscriber count unparsable: {}", e))
        .ok()?;

    debug!(count, "YouTube stats fetched");
    Some(FetchedStats {
        platform: Platform::YouTube,
        count,
        extra: ExtraStats {
            views: stats.view_count.parse().ok(),
            videos: stats.video_count.parse().ok(),
        },
    })
}
