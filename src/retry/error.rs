// src/retry/error.rs
use std::fmt;
use std::time::Duration;

/// HTTP statuses worth another attempt: rate limiting and gateway-level failures.
pub const RETRYABLE_STATUS: [u16; 4] = [429, 502, 503, 504];

/// Decides whether a failed attempt may be retried.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Connection-level failure kinds. All of them are transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    HostUnresolvable,
    ConnectionRefused,
    ConnectionReset,
    TimedOut,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::HostUnresolvable => "host unresolvable",
            Self::ConnectionRefused => "connection refused",
            Self::ConnectionReset => "connection reset",
            Self::TimedOut => "connection timed out",
        };
        f.write_str(s)
    }
}

/// Failure of one outbound call, classified where the call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network error ({kind}): {message}")]
    Network {
        kind: NetworkErrorKind,
        message: String,
    },
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },
    #[error("request timeout after {}ms", .after.as_millis())]
    Timeout { after: Duration },
    #[error("{0}")]
    Permanent(String),
}

impl FetchError {
    pub fn network(kind: NetworkErrorKind, message: impl Into<String>) -> Self {
        Self::Network {
            kind,
            message: message.into(),
        }
    }

    pub fn status(status: u16, reason: impl Into<String>) -> Self {
        Self::Status {
            status,
            reason: reason.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent(message.into())
    }

    /// HTTP status carried by the error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Map a reqwest transport error onto the closed taxonomy.
    ///
    /// Connect-phase failures are transient only when the socket was refused,
    /// reset or timed out, or the host did not resolve. TLS and certificate
    /// failures are permanent. A peer hanging up before the response
    /// completes counts as a reset.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        // The URL may carry API keys; callers log a redacted one themselves.
        let err = err.without_url();
        let message = describe_chain(&err);
        if err.is_timeout() {
            return Self::network(NetworkErrorKind::TimedOut, message);
        }
        if let Some(kind) = network_kind_in_chain(&err) {
            return Self::network(kind, message);
        }
        if err.is_connect() {
            if chain_mentions(&err, "dns error") {
                return Self::network(NetworkErrorKind::HostUnresolvable, message);
            }
            return Self::Permanent(message);
        }
        if (err.is_request() || err.is_body())
            && PEER_CLOSED_MARKERS.iter().any(|m| chain_mentions(&err, m))
        {
            return Self::network(NetworkErrorKind::ConnectionReset, message);
        }
        if let Some(status) = err.status() {
            let reason = status.canonical_reason().unwrap_or_default();
            return Self::status(status.as_u16(), reason);
        }
        Self::Permanent(message)
    }
}

/// hyper's wording when the peer closes the connection mid-exchange.
const PEER_CLOSED_MARKERS: [&str; 2] = [
    "connection closed before message completed",
    "connection reset",
];

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => RETRYABLE_STATUS.contains(status),
            Self::Permanent(_) => false,
        }
    }
}

fn network_kind_in_chain(err: &(dyn std::error::Error + 'static)) -> Option<NetworkErrorKind> {
    let mut cur = Some(err);
    while let Some(e) = cur {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            match io.kind() {
                std::io::ErrorKind::ConnectionRefused => {
                    return Some(NetworkErrorKind::ConnectionRefused)
                }
                std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::BrokenPipe => {
                    return Some(NetworkErrorKind::ConnectionReset)
                }
                std::io::ErrorKind::TimedOut => return Some(NetworkErrorKind::TimedOut),
                _ => {}
            }
        }
        cur = e.source();
    }
    None
}

/// Every message in the source chain, outermost first, joined with ": ".
fn describe_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(e) = cur {
        let text = e.to_string();
        if !text.is_empty() && !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        cur = e.source();
    }
    out
}

fn chain_mentions(err: &(dyn std::error::Error + 'static), needle: &str) -> bool {
    let mut cur = Some(err);
    while let Some(e) = cur {
        if e.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }
        cur = e.source();
    }
    false
}
