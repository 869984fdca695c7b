//! Backend reachability check

use crate::client::FindixiClient;
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Health check API
#[derive(Clone)]
pub struct HealthApi {
    client: FindixiClient,
}

/// Result of a backend reachability probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendHealth {
    /// Whether the probe read succeeded
    pub reachable: bool,
    /// Round-trip latency in milliseconds
    pub latency_ms: u128,
    /// Error message when unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthApi {
    /// Create a new health API interface
    pub(crate) fn new(client: FindixiClient) -> Self {
        Self { client }
    }

    /// Probe the backend with the cheapest read available.
    pub async fn check(&self) -> ApiResult<BackendHealth> {
        let start = Instant::now();
        let result: ApiResult<Vec<serde_json::Value>> =
            self.client.get("municipalities?select=id&limit=1").await;

        Ok(match result {
            Ok(_) => BackendHealth {
                reachable: true,
                latency_ms: start.elapsed().as_millis(),
                error: None,
            },
            Err(e) => BackendHealth {
                reachable: false,
                latency_ms: start.elapsed().as_millis(),
                error: Some(e.to_string()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_serializes_without_error_when_reachable() {
        let health = BackendHealth {
            reachable: true,
            latency_ms: 42,
            error: None,
        };
        let json = serde_json::to_string(&health).unwrap();
        assert!(!json.contains("error"));
    }
}
