//! Main backend client implementation

use crate::config::ClientConfig;
use crate::endpoints::{FavoritesApi, HealthApi, ListingsApi, MunicipalitiesApi, OrdersApi};
use crate::error::{ApiError, ApiResult};
use findixi_core::rate_limit::RateLimiter;
use findixi_core::retry::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// API key header expected by the hosted backend
const APIKEY_HEADER: &str = "apikey";

/// Findixi backend client with built-in resilience patterns
///
/// This client wraps `reqwest` and adds:
/// - Automatic retry with exponential backoff
/// - Circuit breaker to prevent cascading failures
/// - Per-table rate limiting to avoid throttling
/// - Request correlation IDs for tracing
#[derive(Clone)]
pub struct FindixiClient {
    inner: Client,
    config: Arc<ClientConfig>,
    circuit_breaker: Arc<CircuitBreaker>,
    rate_limiter: Arc<RateLimiter>,
}

impl FindixiClient {
    /// Create a new client with configuration from the environment
    pub fn new() -> ApiResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static("findixi-api-client/0.3"),
        );

        if let Some(ref key) = config.anon_key {
            if let Ok(value) = HeaderValue::from_str(key) {
                default_headers.insert(APIKEY_HEADER, value);
            }
        }

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Request)?;

        let circuit_breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default()));
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));

        Ok(Self {
            inner,
            config: Arc::new(config),
            circuit_breaker,
            rate_limiter,
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get circuit breaker state
    #[must_use]
    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    /// Reset the circuit breaker
    pub fn reset_circuit(&self) {
        self.circuit_breaker.reset();
    }

    /// Reset rate limits for a specific table or RPC
    pub fn reset_rate_limit(&self, key: &str) {
        self.rate_limiter.reset(key);
    }

    // -------------------------------------------------------------------------
    // Endpoint API accessors
    // -------------------------------------------------------------------------

    /// Access listing search and enrichment endpoints
    #[must_use]
    pub fn listings(&self) -> ListingsApi {
        ListingsApi::new(self.clone())
    }

    /// Access municipality and postal-code endpoints
    #[must_use]
    pub fn municipalities(&self) -> MunicipalitiesApi {
        MunicipalitiesApi::new(self.clone())
    }

    /// Access favorite-membership endpoints
    #[must_use]
    pub fn favorites(&self) -> FavoritesApi {
        FavoritesApi::new(self.clone())
    }

    /// Access pickup-order endpoints
    #[must_use]
    pub fn orders(&self) -> OrdersApi {
        OrdersApi::new(self.clone())
    }

    /// Access health check endpoints
    #[must_use]
    pub fn health(&self) -> HealthApi {
        HealthApi::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Low-level HTTP methods with resilience
    // -------------------------------------------------------------------------

    /// GET from a REST path (relative to `{base}/rest/v1/`)
    #[instrument(skip(self), fields(request_id))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(Method::GET, path, Option::<&()>::None).await
    }

    /// POST to a REST path
    #[instrument(skip(self, body), fields(request_id))]
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// PATCH a REST path (row updates)
    #[instrument(skip(self, body), fields(request_id))]
    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    /// DELETE rows matching a REST path filter
    #[instrument(skip(self), fields(request_id))]
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        let _: serde_json::Value = self.request(Method::DELETE, path, Option::<&()>::None).await?;
        Ok(())
    }

    /// Invoke a server-side RPC function with a JSON payload
    #[instrument(skip(self, payload), fields(request_id))]
    pub async fn rpc<T: DeserializeOwned, B: Serialize>(
        &self,
        function: &str,
        payload: &B,
    ) -> ApiResult<T> {
        let path = format!("rpc/{}", function);
        self.request(Method::POST, &path, Some(payload)).await
    }

    /// Execute a request with full resilience patterns
    async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<T> {
        let url = format!("{}/{}", self.config.rest_url(), path.trim_start_matches('/'));
        let request_id = Uuid::new_v4().to_string();
        let rate_limit_key = extract_rate_limit_key(path);

        if !self.circuit_breaker.can_execute() {
            warn!(
                request_id = %request_id,
                url = %url,
                "Circuit breaker is open, rejecting request"
            );
            return Err(ApiError::CircuitOpen);
        }

        if !self.rate_limiter.try_acquire(&rate_limit_key) {
            warn!(
                request_id = %request_id,
                url = %url,
                "Rate limited"
            );
            return Err(ApiError::RateLimited);
        }

        self.execute_with_retry(&request_id, method, &url, body)
            .await
    }

    /// Execute request with retry logic
    async fn execute_with_retry<T: DeserializeOwned, B: Serialize>(
        &self,
        request_id: &str,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> ApiResult<T> {
        let retry_config = &self.config.retry;
        let mut last_error: Option<ApiError> = None;

        for attempt in 0..retry_config.max_attempts {
            if attempt > 0 {
                let delay = retry_config.delay_for_attempt(attempt);
                debug!(
                    request_id = %request_id,
                    attempt = attempt,
                    delay_ms = delay.as_millis(),
                    "Retrying after delay"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();
            let result = self
                .execute_single_request(request_id, method.clone(), url, body)
                .await;
            let elapsed = start.elapsed();

            match result {
                Ok(value) => {
                    self.circuit_breaker.record_success();
                    debug!(
                        request_id = %request_id,
                        attempt = attempt + 1,
                        elapsed_ms = elapsed.as_millis(),
                        "Request succeeded"
                    );
                    return Ok(value);
                }
                Err(e) => {
                    self.circuit_breaker.record_failure();

                    if e.is_retryable() && attempt + 1 < retry_config.max_attempts {
                        debug!(
                            request_id = %request_id,
                            attempt = attempt + 1,
                            error = %e,
                            "Request failed, will retry"
                        );
                        last_error = Some(e);
                    } else {
                        debug!(
                            request_id = %request_id,
                            attempt = attempt + 1,
                            error = %e,
                            "Request failed, not retrying"
                        );
                        return Err(e);
                    }
                }
            }
        }

        Err(ApiError::RetriesExhausted {
            attempts: retry_config.max_attempts,
            last_error: last_error.map_or_else(|| "Unknown error".to_string(), |e| e.to_string()),
        })
    }

    /// Execute a single request without retry
    async fn execute_single_request<T: DeserializeOwned, B: Serialize>(
        &self,
        request_id: &str,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> ApiResult<T> {
        let mut request = self
            .inner
            .request(method, url)
            .header(X_REQUEST_ID, request_id);

        // Signed-in requests carry the user's bearer token so row-level
        // security applies; anonymous requests fall back to the anon key.
        if let Some(ref token) = self.config.access_token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        } else if let Some(ref key) = self.config.anon_key {
            request = request.header(AUTHORIZATION, format!("Bearer {key}"));
        }

        if let Some(b) = body {
            request = request.json(b);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Handle HTTP response and deserialize
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> ApiResult<T> {
        let status = response.status();

        if status.is_success() {
            // DELETE and some PATCH responses have empty bodies
            let bytes = response.bytes().await.map_err(ApiError::Request)?;
            if bytes.is_empty() {
                return serde_json::from_slice(b"null").map_err(ApiError::Json);
            }
            serde_json::from_slice(&bytes).map_err(ApiError::Json)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(ApiError::api_response(status.as_u16(), message))
        }
    }
}

/// Extract a rate limit key from a REST path (table or RPC name)
fn extract_rate_limit_key(path: &str) -> String {
    let path = path.trim_start_matches('/');
    let head = path.split('?').next().unwrap_or("default");

    match head.strip_prefix("rpc/") {
        Some(function) => format!("rpc:{}", function),
        None => head.split('/').next().unwrap_or("default").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_rate_limit_key_table() {
        assert_eq!(
            extract_rate_limit_key("listings?select=id&id=in.(1,2)"),
            "listings"
        );
        assert_eq!(extract_rate_limit_key("/orders?id=eq.4"), "orders");
    }

    #[test]
    fn test_extract_rate_limit_key_rpc() {
        assert_eq!(
            extract_rate_limit_key("rpc/search_listings_filtered"),
            "rpc:search_listings_filtered"
        );
    }

    #[test]
    fn test_client_creation() {
        let config = ClientConfig::development();
        let client = FindixiClient::with_config(config);
        assert!(client.is_ok());
    }
}
