// src/retry/mod.rs
//! Outbound-call resilience: retry policy, the closed error taxonomy used to
//! classify failures, the retry executor and the HTTP wrapper built on it.

pub mod error;
pub mod executor;
pub mod http;
pub mod policy;

pub use error::{FetchError, NetworkErrorKind, Retryable, RETRYABLE_STATUS};
pub use executor::{AttemptOutcome, RetryExecutor};
pub use http::{fetch_once, fetch_with_retry, redact_url, HttpResponse, HttpTransport, ReqwestTransport};
pub use policy::{RetryPolicy, JITTER_CAP_MS};
