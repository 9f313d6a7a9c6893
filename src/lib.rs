// src/lib.rs
// Public library surface for integration tests and the binary.

pub mod api;
pub mod config;
pub mod metrics;
pub mod news;
pub mod retry;
pub mod telemetry;
pub mod weather;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::news::{rank, trending, RankedArticle, RawArticle};
pub use crate::retry::{fetch_with_retry, FetchError, RetryExecutor, RetryPolicy};

use anyhow::Context;
use axum::Router;
use tracing::{info, warn};

/// Build the full application Router from the process environment:
/// config, upstream services, API routes and (when available) `/metrics`.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = config::AppConfig::from_env().context("loading configuration")?;
    info!(
        news_configured = cfg.news.api_key.is_some(),
        weather_configured = cfg.weather.api_key.is_some(),
        news_max_retries = cfg.news.max_retries,
        weather_max_retries = cfg.weather.max_retries,
        base_delay_ms = cfg.retry.base_delay_ms,
        environment = %cfg.environment,
        "configuration loaded"
    );

    let state = AppState::from_config(&cfg)?;
    let mut router = api::router(state);

    match metrics::init() {
        Ok(handle) => router = router.merge(metrics::router(handle)),
        Err(e) => warn!(error = %e, "prometheus recorder unavailable, /metrics disabled"),
    }

    Ok(router)
}
