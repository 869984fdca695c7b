//! Error types for the backend client

use thiserror::Error;

/// Result type alias for backend operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Backend client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing environment variable
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Backend returned an error response
    #[error("Backend error ({status}): {message}")]
    ApiResponse {
        /// HTTP status code
        status: u16,
        /// Error message from the backend
        message: String,
    },

    /// Circuit breaker is open
    #[error("Circuit breaker is open - backend temporarily unavailable")]
    CircuitOpen,

    /// Rate limited
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Request timeout
    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// All retry attempts exhausted
    #[error("All {attempts} retry attempts failed: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Last error message
        last_error: String,
    },

    /// Operation needs a signed-in session
    #[error("Sign-in required: {0}")]
    AuthRequired(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a missing env var error
    pub fn missing_env(var: impl Into<String>) -> Self {
        Self::MissingEnvVar(var.into())
    }

    /// Create a backend response error
    pub fn api_response(status: u16, message: impl Into<String>) -> Self {
        Self::ApiResponse {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(e) => e.is_connect() || e.is_timeout(),
            Self::ApiResponse { status, .. } => *status >= 500 || *status == 429,
            Self::Timeout(_) => true,
            Self::CircuitOpen | Self::RateLimited => false,
            Self::Config(_)
            | Self::MissingEnvVar(_)
            | Self::Json(_)
            | Self::AuthRequired(_)
            | Self::InvalidUrl(_)
            | Self::RetriesExhausted { .. } => false,
        }
    }

    /// Check if the backend rejected the request because a column is
    /// missing from the schema.
    ///
    /// The hosted backend has drifted between snake_case and camelCase
    /// column names over time; callers use this to retry with a reduced
    /// or renamed column set.
    #[must_use]
    pub fn is_missing_column(&self) -> bool {
        match self {
            Self::ApiResponse { message, .. } => {
                let msg = message.to_lowercase();
                msg.contains("column") && msg.contains("does not exist")
            }
            _ => false,
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiResponse { status, .. } if (400..500).contains(status))
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiResponse { status, .. } if *status >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_detection() {
        let err = ApiError::api_response(400, "column orders.updated_at does not exist");
        assert!(err.is_missing_column());

        let err = ApiError::api_response(400, "permission denied for table orders");
        assert!(!err.is_missing_column());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::api_response(503, "unavailable").is_retryable());
        assert!(ApiError::api_response(429, "slow down").is_retryable());
        assert!(!ApiError::api_response(404, "not found").is_retryable());
        assert!(!ApiError::RateLimited.is_retryable());
    }

    #[test]
    fn test_client_server_split() {
        assert!(ApiError::api_response(404, "x").is_client_error());
        assert!(ApiError::api_response(500, "x").is_server_error());
    }
}
