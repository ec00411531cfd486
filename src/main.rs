//! fanpulse - follower-count milestone tracker
//!
//! Fetches per-platform follower counts, persists them as a time series,
//! and broadcasts a celebration to registered subscribers whenever a count
//! crosses a notable round-number threshold.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use fanpulse::broadcast::{BroadcastDispatcher, TelegramTransport};
use fanpulse::config::{Args, Config};
use fanpulse::{build_router, db, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting fanpulse v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let config = Config::load(&args)?;
    info!(
        "Cache TTL {}s, history retention {}d, history throttle {}s",
        config.stats_cache_ttl_secs,
        config.stats_history_retention_days,
        config.history_min_interval_secs
    );

    let pool = db::init_database(&config.database).await?;

    // One HTTP client for all outbound calls; the timeout applies
    // per-request (fetches and sends), there is no overall cycle deadline
    let http = reqwest::Client::builder()
        .timeout(config.api_timeout())
        .build()?;

    let transport = TelegramTransport::new(http.clone(), config.telegram_bot_token.clone());
    let dispatcher = BroadcastDispatcher::new(Arc::new(transport));

    let bind = config.bind.clone();
    let state = AppState::new(pool, http, config, dispatcher);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("fanpulse listening on http://{}", bind);
    info!("Trigger a check: POST http://{}/api/check", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
