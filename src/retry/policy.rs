// src/retry/policy.rs
use anyhow::{bail, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound (exclusive) of the random jitter added to every backoff delay.
pub const JITTER_CAP_MS: u64 = 1000;

/// Exponential backoff parameters. Copied into each executor, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Reject parameter combinations that would make the backoff curve meaningless.
    pub fn validated(self) -> Result<Self> {
        if self.base_delay_ms == 0 {
            bail!("retry policy: base_delay_ms must be positive");
        }
        if self.max_delay_ms < self.base_delay_ms {
            bail!(
                "retry policy: max_delay_ms ({}) must be >= base_delay_ms ({})",
                self.max_delay_ms,
                self.base_delay_ms
            );
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor <= 1.0 {
            bail!(
                "retry policy: backoff_factor must be > 1, got {}",
                self.backoff_factor
            );
        }
        Ok(self)
    }

    /// Unjittered delay after the failed attempt with index `attempt` (0-based):
    /// `min(base * factor^attempt, max)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let raw = self.base_delay_ms as f64 * self.backoff_factor.powi(exp);
        let capped = raw.min(self.max_delay_ms as f64);
        Duration::from_secs_f64(capped / 1_000.0)
    }

    /// Backoff plus jitter. Jitter is additive only.
    pub fn delay_for(&self, attempt: u32, jitter: Duration) -> Duration {
        self.backoff(attempt) + jitter
    }
}

/// Uniform jitter in `[0, JITTER_CAP_MS)` milliseconds.
pub fn random_jitter() -> Duration {
    Duration::from_millis(rand::rng().random_range(0..JITTER_CAP_MS))
}
