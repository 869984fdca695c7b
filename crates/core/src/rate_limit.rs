//! Rate limiting for backend and third-party calls
//!
//! Every outbound surface (backend REST, search RPC, routing, geocoding)
//! gets its own token bucket keyed by endpoint so one chatty page cannot
//! starve the rest, and public services with usage policies are respected.
//!
//! # Example
//!
//! ```rust
//! use findixi_core::rate_limit::{RateLimiter, RateLimitConfig};
//!
//! let limiter = RateLimiter::new(RateLimitConfig::per_minute(60));
//!
//! if limiter.try_acquire("search") {
//!     // Proceed with the request
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Rate limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
    /// Burst allowance (extra requests allowed in short bursts)
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
            burst: 10,
        }
    }
}

impl RateLimitConfig {
    /// Strict rate limit with no burst allowance
    #[must_use]
    pub fn strict(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            burst: 0,
        }
    }

    /// Per-second rate limit
    #[must_use]
    pub fn per_second(max: u32) -> Self {
        Self {
            max_requests: max,
            window: Duration::from_secs(1),
            burst: max / 2,
        }
    }

    /// Per-minute rate limit
    #[must_use]
    pub fn per_minute(max: u32) -> Self {
        Self {
            max_requests: max,
            window: Duration::from_secs(60),
            burst: max / 4,
        }
    }
}

/// Token bucket state
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
    config: RateLimitConfig,
}

impl TokenBucket {
    fn new(config: RateLimitConfig) -> Self {
        Self {
            tokens: f64::from(config.max_requests + config.burst),
            last_update: Instant::now(),
            config,
        }
    }

    fn try_acquire(&mut self, tokens: u32) -> bool {
        self.refill();

        if self.tokens >= f64::from(tokens) {
            self.tokens -= f64::from(tokens);
            true
        } else {
            false
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update);
        let refill_rate = f64::from(self.config.max_requests) / self.config.window.as_secs_f64();
        let new_tokens = elapsed.as_secs_f64() * refill_rate;

        self.tokens = (self.tokens + new_tokens)
            .min(f64::from(self.config.max_requests + self.config.burst));
        self.last_update = now;
    }

    fn available(&mut self) -> u32 {
        self.refill();
        self.tokens as u32
    }
}

/// Per-key token-bucket rate limiter
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: RwLock<HashMap<String, TokenBucket>>,
}

impl RateLimiter {
    /// Create a rate limiter; each distinct key gets its own bucket
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: RwLock::new(HashMap::new()),
        }
    }

    /// Try to acquire one token for the given key
    pub fn try_acquire(&self, key: &str) -> bool {
        self.try_acquire_n(key, 1)
    }

    /// Try to acquire `n` tokens for the given key
    pub fn try_acquire_n(&self, key: &str, n: u32) -> bool {
        let Ok(mut buckets) = self.buckets.write() else {
            return false;
        };

        buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.config.clone()))
            .try_acquire(n)
    }

    /// Remaining tokens for the given key
    pub fn available(&self, key: &str) -> u32 {
        let Ok(mut buckets) = self.buckets.write() else {
            return 0;
        };

        buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.config.clone()))
            .available()
    }

    /// Reset the bucket for a specific key
    pub fn reset(&self, key: &str) {
        if let Ok(mut buckets) = self.buckets.write() {
            buckets.remove(key);
        }
    }

    /// Reset all buckets
    pub fn reset_all(&self) {
        if let Ok(mut buckets) = self.buckets.write() {
            buckets.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_within_limit() {
        let limiter = RateLimiter::new(RateLimitConfig::per_minute(10));
        for _ in 0..10 {
            assert!(limiter.try_acquire("search"));
        }
    }

    #[test]
    fn test_acquire_exhausted() {
        let limiter = RateLimiter::new(RateLimitConfig::strict(2, Duration::from_secs(60)));
        assert!(limiter.try_acquire("routing"));
        assert!(limiter.try_acquire("routing"));
        assert!(!limiter.try_acquire("routing"));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(RateLimitConfig::strict(1, Duration::from_secs(60)));
        assert!(limiter.try_acquire("search"));
        assert!(!limiter.try_acquire("search"));
        assert!(limiter.try_acquire("geocode"));
    }

    #[test]
    fn test_reset_restores_tokens() {
        let limiter = RateLimiter::new(RateLimitConfig::strict(1, Duration::from_secs(60)));
        assert!(limiter.try_acquire("search"));
        assert!(!limiter.try_acquire("search"));

        limiter.reset("search");
        assert!(limiter.try_acquire("search"));
    }

    #[test]
    fn test_available_counts_down() {
        let limiter = RateLimiter::new(RateLimitConfig::strict(5, Duration::from_secs(60)));
        assert_eq!(limiter.available("search"), 5);
        limiter.try_acquire("search");
        assert_eq!(limiter.available("search"), 4);
    }
}
