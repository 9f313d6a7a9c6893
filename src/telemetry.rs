// src/telemetry.rs
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// Filter: `RUST_LOG`, else `LOG_LEVEL`, else `info`.
/// Format: JSON lines when `LOG_FORMAT=json`, compact text otherwise.
/// A no-op if a subscriber is already installed (e.g. by the Shuttle runtime).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        std::env::var("LOG_LEVEL")
            .ok()
            .filter(|l| !l.trim().is_empty())
            .and_then(|l| EnvFilter::try_new(l.trim()).ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    });

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };

    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
