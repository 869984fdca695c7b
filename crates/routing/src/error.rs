//! Error types for the routing crate

use thiserror::Error;

/// Result type alias for routing operations
pub type RoutingResult<T> = Result<T, RoutingError>;

/// Routing service errors
#[derive(Debug, Error)]
pub enum RoutingError {
    /// HTTP request failed
    #[error("Routing request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Routing service answered with a non-success status
    #[error("Routing service error ({status})")]
    ServiceStatus {
        /// HTTP status code
        status: u16,
    },

    /// Response body did not match the expected shape
    #[error("Invalid routing response: {0}")]
    InvalidResponse(String),

    /// Local rate limit rejected the call
    #[error("Routing rate limited")]
    RateLimited,
}
