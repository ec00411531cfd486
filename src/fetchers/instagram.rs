//! Instagram stats fetcher
//!
//! Instagram blocks automated scraping, so the count comes from a configured
//! JSON endpoint (typically a manually maintained counter service) returning
//! `{"followersCount": N}`. One call per invocation, no retry.

use serde::Deserialize;
use tracing::{debug, warn};

use super::FetchedStats;
use crate::config::Config;
use crate::db::stats::ExtraStats;
use crate::platform::Platform;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstagramStats {
    #[serde(default)]
    followers_count: u64,
}

/// Fetch the Instagram follower count; `None` on any failure
pub async fn fetch(client: &reqwest::Client, config: &Config) -> Option<FetchedStats> {
    let url = match &config.instagram_stats_url {
        Some(url) => url,
        None => {
            warn!("Instagram stats URL not configured, skipping");
            return None;
        }
    };

    debug!(url = %url, "Fetching Instagram stats");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| warn!("Instagram fetch failed: {}", e))
        .ok()?;

    if !response.status().is_success() {
        warn!("Instagram endpoint returned {}", response.status());
        return None;
    }

    let data: InstagramStats = response
        .json()
        .await
        .map_err(|e| warn!("Instagram response parse failed: {}", e))
        .ok()?;

    debug!(count = data.followers_count, "Instagram stats fetched");
    Some(FetchedStats {
        platform: Platform::Instagram,
        count: data.followers_count,
        extra: ExtraStats::default(),
    })
}
