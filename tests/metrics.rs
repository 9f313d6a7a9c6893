// tests/metrics.rs
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serial_test::serial;
use tower::ServiceExt;

use irembocare::api::{router, AppState};
use irembocare::config::AppConfig;
use irembocare::retry::{FetchError, HttpResponse, HttpTransport};

/// Upstream that rejects every key.
struct Rejecting;

#[async_trait]
impl HttpTransport for Rejecting {
    async fn get(&self, _url: &str) -> Result<HttpResponse, FetchError> {
        Ok(HttpResponse {
            status: 401,
            reason: "Unauthorized".into(),
            body: String::new(),
        })
    }
}

async fn get_text(app: &Router, uri: &str) -> (StatusCode, String) {
    let resp = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
#[serial]
async fn app_from_env_serves_metrics() {
    for key in ["NEWS_API_KEY", "WEATHER_API_KEY", "RETRY_CONFIG_PATH", "HTTP_TIMEOUT_MS"] {
        std::env::remove_var(key);
    }
    let app = irembocare::app().await.expect("app() should build Router in tests");

    let (status, _) = get_text(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get_text(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[serial]
async fn upstream_failures_show_up_in_counters() {
    let handle = irembocare::metrics::init().expect("recorder");

    let mut cfg = AppConfig::offline();
    cfg.news.api_key = Some("bad".into());
    let app = router(AppState::with_transport(&cfg, Arc::new(Rejecting)))
        .merge(irembocare::metrics::router(handle));

    let (status, body) = get_text(&app, "/api/health-news").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"isMockData\":true"), "{body}");

    let (status, text) = get_text(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    for needle in [
        "retry_attempts_total",
        "upstream_fallback_total{service=\"news\"}",
    ] {
        assert!(text.contains(needle), "missing {needle} in:\n{text}");
    }
}
