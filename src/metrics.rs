use axum::{routing::get, Router};
use metrics::{describe_counter, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder once per process and describe our series.
/// Later calls reuse the first handle.
pub fn init() -> anyhow::Result<&'static PrometheusHandle> {
    HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;
        describe();
        Ok(handle)
    })
}

fn describe() {
    describe_counter!("retry_attempts_total", Unit::Count, "Outbound attempts started.");
    describe_counter!("retry_retries_total", Unit::Count, "Attempts followed by a backoff.");
    describe_counter!(
        "retry_exhausted_total",
        Unit::Count,
        "Operations that failed after the full retry budget."
    );
    describe_counter!(
        "news_articles_ranked_total",
        Unit::Count,
        "Live articles kept by the ranker."
    );
    describe_counter!(
        "news_articles_dropped_total",
        Unit::Count,
        "Live articles dropped for missing or removed titles."
    );
    describe_counter!(
        "upstream_fallback_total",
        Unit::Count,
        "Requests answered with mock data after an upstream failure."
    );
}

/// Router exposing `/metrics` in the Prometheus exposition format.
pub fn router(handle: &'static PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}
