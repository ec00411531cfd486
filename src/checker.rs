//! Milestone check cycle
//!
//! One externally triggered invocation: fetch all platforms concurrently,
//! save whichever subset succeeded, then seed or check the milestone cursor
//! per platform and broadcast on a positive detection. The cursor advances
//! only when at least one delivery succeeded; withholding the advance is the
//! pipeline's sole retry mechanism. The checker holds no timer and no lock;
//! concurrent invocations are tolerated (at-least-once notification).

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db;
use crate::fetchers::{self, FetchedStats};
use crate::milestones;
use crate::platform::Platform;
use crate::AppState;

/// Per-platform outcome of one check cycle
#[derive(Debug, Clone, Serialize)]
pub struct PlatformCheck {
    pub platform: Platform,
    pub count: u64,
    pub last_notified: Option<u64>,
}

/// A notification sent during one check cycle
#[derive(Debug, Clone, Serialize)]
pub struct NotificationOutcome {
    pub platform: Platform,
    pub milestone: String,
    pub value: u64,
    pub delivered: usize,
    pub total: usize,
}

/// Report returned by one check cycle
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub checked: usize,
    pub stats: Vec<PlatformCheck>,
    pub notifications: Vec<NotificationOutcome>,
    pub checked_at: String,
}

/// Fetch all platforms and run the milestone check over the results
pub async fn run_check(state: &AppState) -> CheckReport {
    info!("Checking for milestones and saving stats");
    let fetched = fetchers::fetch_all(&state.http, &state.config).await;
    process(state, fetched).await
}

/// Run the save/detect/notify steps for an already fetched set of stats
///
/// A platform whose fetch returned absent is simply not in `fetched`: no
/// save and no detection happens for it this cycle.
pub async fn process(state: &AppState, fetched: Vec<FetchedStats>) -> CheckReport {
    let stats_policy = state.config.stats_policy();
    let milestone_policy = state.config.milestone_policy();

    let mut stats = Vec::with_capacity(fetched.len());
    let mut notifications = Vec::new();

    for observed in &fetched {
        let platform = observed.platform;

        if let Err(e) =
            db::stats::save_stats(&state.db, platform, observed.count, observed.extra, &stats_policy)
                .await
        {
            warn!(platform = platform.key(), "Failed to save stats: {}", e);
        }

        let last_notified = match db::milestones::get_last(&state.db, platform).await {
            Ok(last) => last,
            Err(e) => {
                // Skip detection rather than risk a duplicate notification
                warn!(platform = platform.key(), "Cursor read failed: {}", e);
                stats.push(PlatformCheck {
                    platform,
                    count: observed.count,
                    last_notified: None,
                });
                continue;
            }
        };

        stats.push(PlatformCheck {
            platform,
            count: observed.count,
            last_notified,
        });

        match last_notified {
            // First observation: seed the cursor so long-past thresholds
            // never flood subscribers with historical notifications
            None => {
                if let Some(seeded) = milestones::last_passed_threshold(observed.count) {
                    match db::milestones::seed(&state.db, platform, seeded, &milestone_policy).await
                    {
                        Ok(()) => info!(
                            platform = platform.key(),
                            seeded, "Seeded milestone cursor without notifying"
                        ),
                        Err(e) => {
                            warn!(platform = platform.key(), "Cursor seed failed: {}", e)
                        }
                    }
                }
            }
            Some(last) => {
                let Some(value) = milestones::should_notify(observed.count, Some(last)) else {
                    debug!(
                        platform = platform.key(),
                        count = observed.count,
                        last,
                        "No new milestone"
                    );
                    continue;
                };

                let formatted = milestones::format_milestone(value);
                info!(
                    platform = platform.key(),
                    milestone = %formatted,
                    "New milestone detected"
                );

                let message = compose_message(platform, &formatted, state);
                match state.dispatcher.send_text(&state.db, &message).await {
                    Ok(result) if result.successful > 0 => {
                        if let Err(e) =
                            db::milestones::set_last(&state.db, platform, value, &milestone_policy)
                                .await
                        {
                            warn!(platform = platform.key(), "Cursor advance failed: {}", e);
                        }
                        info!(
                            platform = platform.key(),
                            milestone = %formatted,
                            "Milestone saved and notified {}/{} subscribers",
                            result.successful,
                            result.total
                        );
                        notifications.push(NotificationOutcome {
                            platform,
                            milestone: formatted,
                            value,
                            delivered: result.successful,
                            total: result.total,
                        });
                    }
                    Ok(result) => {
                        // Zero deliveries: leave the cursor alone so the
                        // same threshold is retried next invocation
                        warn!(
                            platform = platform.key(),
                            failed = result.failed,
                            "No delivery succeeded; cursor not advanced"
                        );
                    }
                    Err(e) => {
                        warn!(
                            platform = platform.key(),
                            "Broadcast failed: {}; cursor not advanced", e
                        );
                    }
                }
            }
        }
    }

    CheckReport {
        checked: fetched.len(),
        stats,
        notifications,
        checked_at: Utc::now().to_rfc3339(),
    }
}

/// Compose the HTML celebration message for a milestone
fn compose_message(platform: Platform, formatted: &str, state: &AppState) -> String {
    let dashboard = state
        .config
        .dashboard_url
        .as_deref()
        .map(|url| format!("\n\n🔗 Dashboard: {}", url))
        .unwrap_or_default();

    format!(
        "🎉 <b>Milestone Reached!</b>\n\n\
         📱 Platform: <b>{}</b>\n\
         🎯 Milestone: <b>{}</b>\n\n\
         {}\n\n\
         Thank you for being part of this journey! 🙏{}",
        platform,
        formatted,
        milestones::celebration_message(formatted, platform),
        dashboard
    )
}
