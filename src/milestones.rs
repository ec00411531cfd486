//! Milestone detection
//!
//! Pure threshold-table logic, no I/O. The table is a fixed ascending set of
//! notable counts: every 1K from 1K to 10K, every 5K from 15K to 50K, then a
//! list of major milestones up to 10M.

use rand::seq::SliceRandom;

use crate::platform::Platform;

/// Notable count thresholds, ascending
pub const THRESHOLDS: [u64; 31] = [
    // Every 1K from 1K to 10K
    1_000, 2_000, 3_000, 4_000, 5_000, 6_000, 7_000, 8_000, 9_000, 10_000,
    // Every 5K from 15K to 50K
    15_000, 20_000, 25_000, 30_000, 35_000, 40_000, 45_000, 50_000,
    // Major milestones
    75_000, 100_000, 150_000, 200_000, 250_000, 500_000, 750_000, 1_000_000, 1_500_000, 2_000_000,
    2_500_000, 5_000_000, 10_000_000,
];

/// Exact-match lookup: is this count itself a notable threshold?
pub fn detect(count: u64) -> Option<u64> {
    if count < 1_000 {
        return None;
    }
    THRESHOLDS.binary_search(&count).ok().map(|i| THRESHOLDS[i])
}

/// Highest threshold less than or equal to `count`
///
/// Used to seed a platform's cursor the first time it is observed, so
/// long-past thresholds never produce notifications.
pub fn last_passed_threshold(count: u64) -> Option<u64> {
    match THRESHOLDS.binary_search(&count) {
        Ok(i) => Some(THRESHOLDS[i]),
        Err(0) => None,
        Err(i) => Some(THRESHOLDS[i - 1]),
    }
}

/// Decide whether a count warrants a notification given the last notified
/// threshold.
///
/// Detection is crossing-based: the highest threshold at or below `count` is
/// compared against the cursor, so a count that jumps over a threshold
/// between two polls still triggers it exactly once. Returns `None` when the
/// threshold has already been notified.
pub fn should_notify(count: u64, last_notified: Option<u64>) -> Option<u64> {
    let threshold = last_passed_threshold(count)?;
    match last_notified {
        None => Some(threshold),
        Some(last) if threshold > last => Some(threshold),
        Some(_) => None,
    }
}

/// Format a count as a readable milestone label ("1K", "7.5K", "1M", "1.5M")
pub fn format_milestone(count: u64) -> String {
    if count >= 1_000_000 {
        let millions = count as f64 / 1_000_000.0;
        if millions.fract() == 0.0 {
            format!("{}M", millions as u64)
        } else {
            format!("{:.1}M", millions)
        }
    } else if count >= 1_000 {
        let thousands = count as f64 / 1_000.0;
        if thousands.fract() == 0.0 {
            format!("{}K", thousands as u64)
        } else {
            format!("{:.1}K", thousands)
        }
    } else {
        count.to_string()
    }
}

/// Pick a celebration phrase for a milestone
pub fn celebration_message(formatted: &str, platform: Platform) -> String {
    let messages = [
        format!(
            "🎉 We just hit {} {} subscribers/followers!",
            formatted, platform
        ),
        format!("🚀 Amazing milestone reached: {} on {}!", formatted, platform),
        format!(
            "🎯 Incredible! We've reached {} {} subscribers!",
            formatted, platform
        ),
        format!(
            "⭐ Celebration time! {} {} milestone achieved!",
            formatted, platform
        ),
        format!("🔥 Huge milestone alert: {} on {}!", formatted, platform),
    ];

    messages
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_else(|| messages[0].clone())
}
