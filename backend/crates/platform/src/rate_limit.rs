//! Rate Limiting Infrastructure
//!
//! Fixed-window counters. The first hit on a key opens its window, every hit
//! inside the window counts, and the key expires when the window closes.

use std::time::Duration;

/// Rate limit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window: Duration::from_secs(600),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Window length in milliseconds, at least 1
    pub fn window_ms(&self) -> i64 {
        i64::try_from(self.window.as_millis())
            .unwrap_or(i64::MAX)
            .max(1)
    }

    /// Judge a counter value read back from a store
    pub fn evaluate(&self, count: u64, reset_after: Duration) -> RateLimitResult {
        let max = u64::from(self.max_requests);
        RateLimitResult {
            allowed: count <= max,
            remaining: max.saturating_sub(count) as u32,
            reset_after,
        }
    }
}

/// Rate limit check result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    /// Time until the current window closes
    pub reset_after: Duration,
}

impl RateLimitResult {
    /// Whole seconds until the window closes, never zero (for `Retry-After`)
    pub fn retry_after_secs(&self) -> u64 {
        u64::try_from(self.reset_after.as_millis().div_ceil(1000))
            .unwrap_or(u64::MAX)
            .max(1)
    }
}

/// Trait for rate limit storage backends
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    type Error;

    /// Count one hit against `key` and judge it against `config`
    ///
    /// Rejected hits still count, so hammering a key does not reopen it early.
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, Self::Error>;
}
