//! Configuration for the Findixi backend client
//!
//! Supports environment-based configuration with sensible defaults.

use crate::error::{ApiError, ApiResult};
use findixi_core::rate_limit::RateLimitConfig;
use findixi_core::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default production backend URL
const DEFAULT_BACKEND_URL: &str = "https://zgjaxanqfkweslkxtayt.supabase.co";

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development (typically a localhost backend)
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

impl Default for Environment {
    fn default() -> Self {
        Self::Production
    }
}

impl Environment {
    /// Parse from environment variable
    pub fn from_env() -> Self {
        match env::var("FINDIXI_ENV")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "development" | "dev" | "local" => Self::Development,
            "staging" | "stage" => Self::Staging,
            _ => Self::Production,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend project root URL
    pub base_url: String,
    /// Anonymous key (for public reads)
    pub anon_key: Option<String>,
    /// Bearer token of the signed-in user, when any
    pub access_token: Option<String>,
    /// Request timeout
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
    /// Rate limit configuration
    pub rate_limit: RateLimitConfig,
    /// Current environment
    pub environment: Environment,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            anon_key: None,
            access_token: None,
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            rate_limit: RateLimitConfig::per_minute(100),
            environment: Environment::default(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `FINDIXI_BACKEND_URL` or `SUPABASE_URL`: backend project root
    /// - `SUPABASE_ANON_KEY`: anonymous key for public reads
    /// - `FINDIXI_ACCESS_TOKEN`: bearer token of a signed-in user
    /// - `FINDIXI_ENV`: environment (development/staging/production)
    /// - `FINDIXI_TIMEOUT_SECS`: request timeout in seconds
    pub fn from_env() -> ApiResult<Self> {
        let environment = Environment::from_env();

        let base_url = env::var("FINDIXI_BACKEND_URL")
            .or_else(|_| env::var("SUPABASE_URL"))
            .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());

        let anon_key = env::var("SUPABASE_ANON_KEY").ok();
        let access_token = env::var("FINDIXI_ACCESS_TOKEN").ok();

        let timeout = env::var("FINDIXI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        let retry = match environment {
            Environment::Development => RetryConfig::quick(),
            Environment::Staging => RetryConfig::default(),
            Environment::Production => RetryConfig::patient(),
        };

        let rate_limit = match environment {
            Environment::Development => RateLimitConfig::per_minute(1000),
            Environment::Staging => RateLimitConfig::per_minute(200),
            Environment::Production => RateLimitConfig::per_minute(100),
        };

        Ok(Self {
            base_url,
            anon_key,
            access_token,
            timeout,
            retry,
            rate_limit,
            environment,
        })
    }

    /// Create development configuration (local backend)
    #[must_use]
    pub fn development() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            anon_key: env::var("SUPABASE_ANON_KEY").ok(),
            access_token: env::var("FINDIXI_ACCESS_TOKEN").ok(),
            timeout: Duration::from_secs(10),
            retry: RetryConfig::quick(),
            rate_limit: RateLimitConfig::per_minute(1000),
            environment: Environment::Development,
        }
    }

    /// URL of the REST surface (`{base}/rest/v1`)
    #[must_use]
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.base_url.trim_end_matches('/'))
    }

    /// Public URL of an object in the storage bucket
    ///
    /// # Example
    /// ```
    /// use findixi_api_client::ClientConfig;
    ///
    /// let config = ClientConfig::default();
    /// let url = config.storage_public_url("logos/42.png");
    /// assert!(url.ends_with("/storage/v1/object/public/logos/42.png"));
    /// ```
    #[must_use]
    pub fn storage_public_url(&self, path: &str) -> String {
        let normalized = path.trim_start_matches('/');
        format!(
            "{}/storage/v1/object/public/{}",
            self.base_url.trim_end_matches('/'),
            normalized
        )
    }

    /// Builder-style method to set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Builder-style method to set the anon key
    #[must_use]
    pub fn with_anon_key(mut self, key: impl Into<String>) -> Self {
        self.anon_key = Some(key.into());
        self
    }

    /// Builder-style method to set the user's access token
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Builder-style method to set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to set the retry config
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Builder-style method to set the rate limit config
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.base_url.is_empty() {
            return Err(ApiError::config("base_url cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ApiError::config(
                "base_url must start with http:// or https://",
            ));
        }

        if self.timeout.is_zero() {
            return Err(ApiError::config("timeout cannot be zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(config.base_url.contains("supabase.co"));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_rest_url() {
        let config = ClientConfig::default().with_base_url("https://x.supabase.co/");
        assert_eq!(config.rest_url(), "https://x.supabase.co/rest/v1");
    }

    #[test]
    fn test_storage_public_url_strips_leading_slash() {
        let config = ClientConfig::default().with_base_url("https://x.supabase.co");
        assert_eq!(
            config.storage_public_url("/galleries/7/front.jpg"),
            "https://x.supabase.co/storage/v1/object/public/galleries/7/front.jpg"
        );
    }

    #[test]
    fn test_builder_pattern() {
        let config = ClientConfig::default()
            .with_base_url("https://test.supabase.co")
            .with_timeout(Duration::from_secs(60));

        assert_eq!(config.base_url, "https://test.supabase.co");
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_validation() {
        let valid = ClientConfig::default();
        assert!(valid.validate().is_ok());

        let invalid = ClientConfig::default().with_base_url("");
        assert!(invalid.validate().is_err());

        let invalid = ClientConfig::default().with_base_url("ftp://nope");
        assert!(invalid.validate().is_err());
    }
}
