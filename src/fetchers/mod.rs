//! Per-platform stat retrieval
//!
//! One fetch function per platform. Each call is bounded by the shared HTTP
//! client's per-request timeout and returns `None` on timeout, non-success
//! status, missing credential, or unparsable payload; a fetcher never fails
//! the caller. All platforms are fetched concurrently and independently.

pub mod instagram;
pub mod telegram;
pub mod youtube;

use crate::config::Config;
use crate::db::stats::ExtraStats;
use crate::platform::Platform;

/// A successfully fetched count for one platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedStats {
    pub platform: Platform,
    pub count: u64,
    pub extra: ExtraStats,
}

/// Fetch all configured platforms concurrently
///
/// One platform's failure never prevents the others from completing; the
/// result contains whichever subset succeeded.
pub async fn fetch_all(client: &reqwest::Client, config: &Config) -> Vec<FetchedStats> {
    let (youtube, telegram, instagram) = tokio::join!(
        youtube::fetch(client, config),
        telegram::fetch(client, config),
        instagram::fetch(client, config),
    );

    [youtube, telegram, instagram].into_iter().flatten().collect()
}
