use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
use crate::news::{NewsQuery, NewsService};
use crate::retry::{HttpTransport, ReqwestTransport, RetryExecutor};
use crate::weather::{WeatherService, DEFAULT_DISTRICT};

pub const SERVICE_NAME: &str = "IremboCare+";
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Clone)]
pub struct AppState {
    news: Arc<NewsService>,
    weather: Arc<WeatherService>,
    started_at: Instant,
    environment: String,
}

impl AppState {
    /// Production state backed by reqwest.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(cfg.http_timeout)?);
        Ok(Self::with_transport(cfg, transport))
    }

    /// State over any transport (tests inject scripted ones).
    pub fn with_transport(cfg: &AppConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let executor = RetryExecutor::new(cfg.retry);
        Self {
            news: Arc::new(NewsService::new(
                transport.clone(),
                cfg.news.clone(),
                executor,
                cfg.http_timeout,
            )),
            weather: Arc::new(WeatherService::new(
                transport,
                cfg.weather.clone(),
                executor,
                cfg.http_timeout,
            )),
            started_at: Instant::now(),
            environment: cfg.environment.clone(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/api/weather-health-tips", get(weather_health_tips))
        .route("/api/health-news", get(health_news))
        .route("/api/health-news/trending", get(trending_news))
        .route("/api/health-news/category/{category}", get(news_by_category))
        .fallback(not_found)
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({ "error": error, "message": message.into() })),
    )
        .into_response()
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "uptime": state.started_at.elapsed().as_secs_f64(),
        "environment": state.environment,
        "timestamp": chrono::Utc::now(),
    }))
}

async fn ready() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ready",
        "service": SERVICE_NAME,
        "timestamp": chrono::Utc::now(),
    }))
}

#[derive(Debug, Deserialize)]
struct WeatherParams {
    location: Option<String>,
}

async fn weather_health_tips(
    State(state): State<AppState>,
    Query(q): Query<WeatherParams>,
) -> Json<serde_json::Value> {
    let district = q
        .location
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_DISTRICT);
    let tips = state.weather.weather_health_tips(district).await;
    Json(json!({
        "success": true,
        "location": district,
        "data": tips,
    }))
}

#[derive(Debug, Deserialize)]
struct NewsParams {
    country: Option<String>,
    category: Option<String>,
    /// Kept as text so malformed values get the same JSON 400 as out-of-range ones.
    #[serde(rename = "pageSize")]
    page_size: Option<String>,
    language: Option<String>,
}

impl NewsParams {
    fn into_query(self) -> Result<NewsQuery, Response> {
        let mut q = NewsQuery::default();
        if let Some(raw) = self.page_size {
            q.page_size = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=MAX_PAGE_SIZE).contains(n))
                .ok_or_else(|| {
                    error_response(
                        StatusCode::BAD_REQUEST,
                        "Invalid parameter",
                        format!("pageSize must be between 1 and {MAX_PAGE_SIZE}, got {raw:?}"),
                    )
                })?;
        }
        let non_empty = |s: Option<String>| s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(c) = non_empty(self.country) {
            q.country = c;
        }
        if let Some(c) = non_empty(self.category) {
            q.category = c;
        }
        if let Some(l) = non_empty(self.language) {
            q.language = l;
        }
        Ok(q)
    }
}

async fn health_news(State(state): State<AppState>, Query(p): Query<NewsParams>) -> Response {
    match p.into_query() {
        Ok(q) => Json(state.news.health_news(&q).await).into_response(),
        Err(resp) => resp,
    }
}

async fn news_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Json<crate::news::service::CategoryFeed> {
    Json(
        state
            .news
            .health_news_by_category(&category, &NewsQuery::default())
            .await,
    )
}

async fn trending_news(State(state): State<AppState>) -> Json<crate::news::service::TrendingFeed> {
    Json(state.news.trending_topics().await)
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found", "The requested endpoint does not exist")
}
