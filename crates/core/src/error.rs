//! Structured error handling with codes, context and recovery suggestions
//!
//! Every failure surfaced to an operator carries:
//! - An [`ErrorCode`] for programmatic handling
//! - A human-readable message
//! - Optional context describing what the caller was doing
//! - An optional recovery suggestion

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // General errors (1xxx)
    /// Unclassified failure
    Unknown = 1000,
    /// Internal invariant violated
    Internal = 1001,
    /// Operation timed out
    Timeout = 1002,

    // IO errors (2xxx)
    /// Generic IO failure
    IoError = 2000,
    /// File not found on disk
    FileNotFound = 2001,
    /// Filesystem permission denied
    PermissionDenied = 2002,

    // Configuration errors (3xxx)
    /// Generic configuration failure
    ConfigError = 3000,
    /// Configuration could not be parsed
    ConfigParseError = 3001,
    /// Configuration failed validation
    ConfigValidationError = 3002,
    /// Required environment variable missing
    MissingEnvVar = 3003,

    // Backend errors (4xxx)
    /// Generic backend read/write failure
    BackendError = 4000,
    /// A server-side RPC function returned an error
    RpcFailed = 4001,
    /// Expected row was not found
    RowNotFound = 4002,
    /// Backend schema is missing an expected column
    SchemaMismatch = 4003,
    /// Object storage operation failed
    StorageError = 4004,

    // Auth errors (5xxx)
    /// Operation requires a signed-in session
    AuthRequired = 5000,
    /// Signed-in user has no access to the resource
    AccessDenied = 5001,
    /// Session exists but is no longer valid
    SessionExpired = 5002,

    // Validation errors (6xxx)
    /// Generic validation failure
    ValidationError = 6000,
    /// Invalid caller-supplied input
    InvalidInput = 6001,
    /// Value has the wrong format
    InvalidFormat = 6002,
    /// Domain constraint violated
    ConstraintViolation = 6003,

    // Location errors (7xxx)
    /// Generic geolocation failure
    LocationError = 7000,
    /// User declined the location permission prompt
    LocationPermissionDenied = 7001,
    /// Reverse-geocoding lookup failed
    GeocodingFailed = 7002,

    // Routing errors (8xxx)
    /// Generic routing-service failure
    RoutingError = 8000,
    /// No drivable route between the two points
    RouteNotFound = 8001,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a human-readable category
    pub fn category(&self) -> &'static str {
        match self.code() / 1000 {
            1 => "General",
            2 => "IO",
            3 => "Configuration",
            4 => "Backend",
            5 => "Auth",
            6 => "Validation",
            7 => "Location",
            8 => "Routing",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Main error type with rich context
#[derive(Error, Debug)]
pub struct Error {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context
    pub context: Option<String>,
    /// Recovery suggestion
    pub suggestion: Option<String>,
    /// Source error
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n  Context: {}", ctx)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a recovery suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Convert to a serializable report
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code,
            code_str: self.code.to_string(),
            category: self.code.category().to_string(),
            message: self.message.clone(),
            context: self.context.clone(),
            suggestion: self.suggestion.clone(),
            source: self.source.as_ref().map(|e| e.to_string()),
        }
    }

    // Convenience constructors

    /// Generic IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::IoError, message)
    }

    /// Generic configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Missing environment variable
    pub fn missing_env(var: &str) -> Self {
        Self::new(
            ErrorCode::MissingEnvVar,
            format!("Missing environment variable: {}", var),
        )
        .with_suggestion(format!("Export {} or add it to your .env file", var))
    }

    /// Generic backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BackendError, message)
    }

    /// Server-side RPC function failed
    pub fn rpc_failed(function: &str, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::RpcFailed,
            format!("RPC {} failed: {}", function, message.into()),
        )
    }

    /// Backend schema is missing a column the client expected
    pub fn schema_mismatch(column: &str) -> Self {
        Self::new(
            ErrorCode::SchemaMismatch,
            format!("Column does not exist: {}", column),
        )
        .with_suggestion("Retry with a reduced column set")
    }

    /// Operation requires a signed-in session
    pub fn auth_required(action: &str) -> Self {
        Self::new(
            ErrorCode::AuthRequired,
            format!("Sign-in required to {}", action),
        )
        .with_suggestion("Open the login flow and retry")
    }

    /// Signed-in user has no access to the resource
    pub fn access_denied(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::AccessDenied,
            format!("No access to {}", resource.into()),
        )
    }

    /// Generic validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// User declined the location permission prompt
    pub fn location_denied() -> Self {
        Self::new(
            ErrorCode::LocationPermissionDenied,
            "Location permission denied",
        )
        .with_suggestion("Re-prompt the user or fall back to alphabetical ordering")
    }

    /// Reverse-geocoding lookup failed
    pub fn geocoding(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::GeocodingFailed, message)
    }

    /// Routing service failed
    pub fn routing(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RoutingError, message)
    }
}

/// Serializable error report for logging and API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error code
    pub code: ErrorCode,
    /// Error code rendered as `EXXXX`
    pub code_str: String,
    /// Category name
    pub category: String,
    /// Human-readable message
    pub message: String,
    /// Additional context, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Recovery suggestion, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Stringified source error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Exit codes for CLI commands
pub mod exit_codes {
    /// Clean exit
    pub const SUCCESS: i32 = 0;
    /// Generic failure
    pub const FAILURE: i32 = 1;
    /// Input failed validation
    pub const VALIDATION_ERROR: i32 = 2;
    /// Configuration problem
    pub const CONFIG_ERROR: i32 = 3;
    /// Backend unreachable or rejected the request
    pub const BACKEND_ERROR: i32 = 4;
    /// Auth/session problem
    pub const AUTH_ERROR: i32 = 5;
    /// Operation timed out
    pub const TIMEOUT: i32 = 124;
}

// Implement From for common error types

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(
            ErrorCode::ConfigParseError,
            format!("JSON parse error: {}", err),
        )
        .with_source(err)
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Attach context to the error, if any
    fn context(self, context: impl Into<String>) -> Result<T>;
    /// Attach a recovery suggestion to the error, if any
    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_suggestion(suggestion))
    }
}
