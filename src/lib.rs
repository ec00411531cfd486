//! # fanpulse
//!
//! Tracks follower/subscriber/member counts for a fixed set of platforms,
//! persists them as a time series, detects notable round-number milestones,
//! and broadcasts a celebration message to registered subscribers.
//!
//! Pipeline: fetch (parallel, per platform) → stats store (TTL cache +
//! retention-pruned history) → milestone detection against a cursor →
//! fan-out broadcast → cursor advance on first successful delivery.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;

pub mod api;
pub mod broadcast;
pub mod checker;
pub mod config;
pub mod db;
pub mod error;
pub mod fetchers;
pub mod milestones;
pub mod platform;
pub mod time;

pub use config::Config;
pub use error::{Error, Result};

use broadcast::BroadcastDispatcher;

/// Application state shared across HTTP handlers and the check cycle
///
/// All shared resources (database pool, HTTP client, dispatcher) are
/// constructed once at startup and passed in; nothing is lazily initialized.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Outbound HTTP client with the configured per-request timeout
    pub http: reqwest::Client,
    /// Service configuration
    pub config: Arc<Config>,
    /// Broadcast fan-out over the configured message transport
    pub dispatcher: BroadcastDispatcher,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        http: reqwest::Client,
        config: Config,
        dispatcher: BroadcastDispatcher,
    ) -> Self {
        Self {
            db,
            http,
            config: Arc::new(config),
            dispatcher,
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/health", get(api::health_check))
        .route("/api/check", post(api::run_check))
        .route("/api/stats", get(api::get_all_stats))
        .route("/api/stats/:platform/history", get(api::get_history))
        .route("/api/stats/:platform/timeseries", get(api::get_time_series))
        .route("/api/milestones", get(api::get_milestones))
        .route("/api/milestones/:platform/history", get(api::get_milestone_history))
        .route("/api/notify", post(api::send_notification))
        .with_state(state)
}
