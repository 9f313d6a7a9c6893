// src/retry/http.rs
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::error::FetchError;
use super::executor::RetryExecutor;

/// Query parameters whose values must never reach the logs.
const SECRET_PARAMS: [&str; 3] = ["apikey", "appid", "api_key"];

/// Fully buffered upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            reason: "OK".to_string(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_str(&self.body)
            .map_err(|e| FetchError::permanent(format!("invalid JSON body: {e}")))
    }
}

/// Minimal GET transport. Implementations classify their own failures.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// Production transport on top of `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(connect_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("irembocare/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .build()
            .context("building reqwest client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;
        let status = resp.status();
        let body = resp.text().await.map_err(FetchError::from_reqwest)?;
        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

/// One GET bounded by `timeout`. When the deadline passes the in-flight request
/// future is dropped, which aborts it, and `FetchError::Timeout` is returned.
/// Non-2xx responses become `FetchError::Status`.
pub async fn fetch_once(
    transport: &dyn HttpTransport,
    url: &str,
    timeout: Duration,
) -> Result<HttpResponse, FetchError> {
    let resp = match tokio::time::timeout(timeout, transport.get(url)).await {
        Ok(res) => res?,
        Err(_) => return Err(FetchError::Timeout { after: timeout }),
    };
    if !resp.is_success() {
        return Err(FetchError::status(resp.status, resp.reason));
    }
    Ok(resp)
}

/// `fetch_once` under the executor's retry policy.
pub async fn fetch_with_retry(
    transport: &dyn HttpTransport,
    url: &str,
    timeout: Duration,
    executor: &RetryExecutor,
) -> Result<HttpResponse, FetchError> {
    let context = format!("Fetch {}", redact_url(url));
    executor
        .execute(&context, || fetch_once(transport, url, timeout))
        .await
}

/// Replace credential-bearing query values with `***`.
pub fn redact_url(url: &str) -> String {
    let Ok(mut parsed) = reqwest::Url::parse(url) else {
        return url.to_string();
    };
    if parsed.query().is_none() {
        return parsed.to_string();
    }
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let secret = SECRET_PARAMS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(&k));
            let v = if secret { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}
