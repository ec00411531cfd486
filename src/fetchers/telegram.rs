//! Telegram stats fetcher
//!
//! Scrapes the public `t.me/<channel>` page and extracts the member count
//! with an ordered sequence of heuristics: space-grouped digits, then
//! comma-grouped digits, then plain digits (taking the largest candidate),
//! then a meta-tag fallback. The largest-candidate step can pick a wrong
//! number when the page contains unrelated large numbers near the keyword;
//! known risk, unchanged.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::FetchedStats;
use crate::config::Config;
use crate::db::stats::ExtraStats;
use crate::platform::Platform;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

// e.g. "1 120 members"
static SPACE_GROUPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?: \d+)+)\s+(?:subscribers|members)").expect("valid regex"));
// e.g. "1,120 members"
static COMMA_GROUPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:,\d+)+)\s+(?:subscribers|members)").expect("valid regex"));
// e.g. "1120 members"
static PLAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s+(?:subscribers|members)").expect("valid regex"));
static META_SUBSCRIBER_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""subscriberCount":"(\d+)""#).expect("valid regex"));
static META_DATA_BEFORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)data-before="(\d+(?:[ ,]\d+)*)\s+(?:subscribers|members)""#)
        .expect("valid regex")
});

/// Fetch the Telegram channel member count; `None` on any failure
pub async fn fetch(client: &reqwest::Client, config: &Config) -> Option<FetchedStats> {
    let channel = match &config.telegram_channel {
        Some(channel) => channel.trim_start_matches('@'),
        None => {
            warn!("Telegram channel not configured, skipping");
            return None;
        }
    };

    let url = format!("https://t.me/{}", channel);
    debug!(url = %url, "Fetching Telegram stats");

    let response = client
        .get(&url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await
        .map_err(|e| warn!("Telegram fetch failed: {}", e))
        .ok()?;

    if !response.status().is_success() {
        warn!("Telegram page returned {}", response.status());
        return None;
    }

    let html = response
        .text()
        .await
        .map_err(|e| warn!("Telegram body read failed: {}", e))
        .ok()?;

    match extract_member_count(&html) {
        Some(count) => {
            debug!(count, "Telegram stats fetched");
            Some(FetchedStats {
                platform: Platform::Telegram,
                count,
                extra: ExtraStats::default(),
            })
        }
        None => {
            warn!("Could not extract member count from Telegram page");
            None
        }
    }
}

/// Apply the extraction heuristics in order
fn extract_member_count(html: &str) -> Option<u64> {
    // Pattern 1: space-grouped digits ("1 120 members")
    if let Some(caps) = SPACE_GROUPED.captures(html) {
        return caps[1].replace(' ', "").parse().ok();
    }

    // Pattern 2: comma-grouped digits ("1,120 members")
    if let Some(caps) = COMMA_GROUPED.captures(html) {
        return caps[1].replace(',', "").parse().ok();
    }

    // Pattern 3: plain digits; when several match, the largest is most
    // likely the channel total
    let largest = PLAIN
        .captures_iter(html)
        .filter_map(|caps| caps[1].parse::<u64>().ok())
        .filter(|&n| n > 0)
        .max();
    if largest.is_some() {
        return largest;
    }

    // Fallback: meta tags
    if let Some(caps) = META_SUBSCRIBER_COUNT.captures(html) {
        return caps[1].parse().ok();
    }
    if let Some(caps) = META_DATA_BEFORE.captures(html) {
        return caps[1].replace([' ', ','], "").parse().ok();
    }

    None
}
