//! Shared foundation for the Findixi client platform
//!
//! This crate provides the cross-cutting pieces every other Findixi crate
//! leans on:
//!
//! - **Error handling**: structured errors with codes, context, and recovery
//!   suggestions
//! - **Retry**: exponential backoff with jitter and a circuit breaker for
//!   backend calls
//! - **Rate limiting**: per-endpoint token buckets
//! - **Caching**: TTL cache for geocoding and routing answers
//! - **Validation**: fluent validation for form input and query parameters
//!
//! # Example
//!
//! ```rust
//! use findixi_core::validation::validate_coordinates;
//!
//! let result = validate_coordinates(18.2208, -66.5901);
//! assert!(result.is_valid());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod error;
pub mod rate_limit;
pub mod retry;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::{Cache, CacheConfig};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::rate_limit::{RateLimitConfig, RateLimiter};
    pub use crate::retry::{retry, CircuitBreaker, CircuitBreakerConfig, RetryConfig};
    pub use crate::validation::{ValidationResult, Validator};
}
