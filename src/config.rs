// src/config.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::news::service::NEWS_MAX_RETRIES;
use crate::retry::RetryPolicy;
use crate::weather::service::WEATHER_MAX_RETRIES;

pub const ENV_RETRY_CONFIG_PATH: &str = "RETRY_CONFIG_PATH";
pub const DEFAULT_NEWS_API_URL: &str = "https://newsapi.org/v2";
pub const DEFAULT_WEATHER_API_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;

/// One third-party API: base URL plus optional key. No key means mock data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Retries after the first attempt for every call to this API.
    pub max_retries: u32,
}

impl UpstreamConfig {
    pub fn offline(base_url: &str, max_retries: u32) -> Self {
        Self {
            api_key: None,
            base_url: base_url.to_string(),
            max_retries,
        }
    }
}

/// Everything the retry policy file can set: the shared backoff curve plus
/// the attempt budget of each upstream service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrySettings {
    pub policy: RetryPolicy,
    pub news_max_retries: u32,
    pub weather_max_retries: u32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::default(),
            news_max_retries: NEWS_MAX_RETRIES,
            weather_max_retries: WEATHER_MAX_RETRIES,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ServiceBudgets {
    news_max_retries: u32,
    weather_max_retries: u32,
}

impl Default for ServiceBudgets {
    fn default() -> Self {
        Self {
            news_max_retries: NEWS_MAX_RETRIES,
            weather_max_retries: WEATHER_MAX_RETRIES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub news: UpstreamConfig,
    pub weather: UpstreamConfig,
    /// Per-attempt deadline for outbound requests.
    pub http_timeout: Duration,
    pub retry: RetryPolicy,
    pub environment: String,
}

impl AppConfig {
    /// Defaults with no API keys: every upstream call is served from mock data.
    pub fn offline() -> Self {
        Self {
            news: UpstreamConfig::offline(DEFAULT_NEWS_API_URL, NEWS_MAX_RETRIES),
            weather: UpstreamConfig::offline(DEFAULT_WEATHER_API_URL, WEATHER_MAX_RETRIES),
            http_timeout: Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS),
            retry: RetryPolicy::default(),
            environment: "development".to_string(),
        }
    }

    /// Read from process env (call `dotenvy::dotenv()` first if a `.env` is wanted).
    pub fn from_env() -> Result<Self> {
        let timeout_ms = match env_opt("HTTP_TIMEOUT_MS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("HTTP_TIMEOUT_MS is not a number: {v:?}"))?,
            None => DEFAULT_HTTP_TIMEOUT_MS,
        };
        let retry = load_retry_settings_default()?;

        Ok(Self {
            news: UpstreamConfig {
                api_key: env_opt("NEWS_API_KEY"),
                base_url: env_opt("NEWS_API_URL")
                    .unwrap_or_else(|| DEFAULT_NEWS_API_URL.to_string()),
                max_retries: retry.news_max_retries,
            },
            weather: UpstreamConfig {
                api_key: env_opt("WEATHER_API_KEY"),
                base_url: env_opt("WEATHER_API_URL")
                    .unwrap_or_else(|| DEFAULT_WEATHER_API_URL.to_string()),
                max_retries: retry.weather_max_retries,
            },
            http_timeout: Duration::from_millis(timeout_ms),
            retry: retry.policy,
            environment: env_opt("APP_ENV")
                .or_else(|| env_opt("SHUTTLE_ENV"))
                .unwrap_or_else(|| "development".to_string()),
        })
    }
}

/// Env var, trimmed; empty counts as unset.
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Load retry settings from an explicit TOML or JSON file.
pub fn load_retry_settings_from(path: &Path) -> Result<RetrySettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading retry policy from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_retry_settings(&content, &ext)
}

/// Resolve the retry settings:
/// 1) $RETRY_CONFIG_PATH
/// 2) config/retry.toml
/// 3) config/retry.json
/// 4) built-in defaults
pub fn load_retry_settings_default() -> Result<RetrySettings> {
    if let Some(p) = env_opt(ENV_RETRY_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("RETRY_CONFIG_PATH points to non-existent path"));
        }
        return load_retry_settings_from(&pb);
    }
    for candidate in ["config/retry.toml", "config/retry.json"] {
        let pb = PathBuf::from(candidate);
        if pb.exists() {
            return load_retry_settings_from(&pb);
        }
    }
    Ok(RetrySettings::default())
}

fn parse_retry_settings(s: &str, hint_ext: &str) -> Result<RetrySettings> {
    let policy: RetryPolicy = parse_retry_section(s, hint_ext)?;
    let budgets: ServiceBudgets = parse_retry_section(s, hint_ext)?;
    Ok(RetrySettings {
        policy: policy.validated()?,
        news_max_retries: budgets.news_max_retries,
        weather_max_retries: budgets.weather_max_retries,
    })
}

fn parse_retry_section<T: DeserializeOwned>(s: &str, hint_ext: &str) -> Result<T> {
    #[derive(Deserialize)]
    struct Wrapped<T> {
        retry: T,
    }

    if hint_ext == "json" {
        return serde_json::from_str(s).context("parsing retry policy json");
    }
    // TOML accepts either a `[retry]` table or top-level keys.
    if let Ok(w) = toml::from_str::<Wrapped<T>>(s) {
        return Ok(w.retry);
    }
    toml::from_str::<T>(s)
        .or_else(|_| serde_json::from_str::<T>(s))
        .map_err(|_| anyhow!("unsupported retry policy format"))
}
