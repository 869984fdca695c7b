//! OSRM-style routing client
//!
//! Returns driving distance and duration for a coordinate pair from an
//! OSRM `route` endpoint. Any failure is recoverable: callers treat a
//! missing route the same as a failed lookup and keep their straight-line
//! estimate.

use crate::error::{RoutingError, RoutingResult};
use findixi_core::rate_limit::{RateLimitConfig, RateLimiter};
use findixi_geo::Coordinate;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default public routing endpoint
const DEFAULT_ROUTING_URL: &str = "https://osrm.findixi.app";

/// A routed driving leg between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrivingRoute {
    /// Route length in meters
    pub distance_m: f64,
    /// Driving duration in seconds
    pub duration_secs: f64,
}

impl DrivingRoute {
    /// Route length in kilometers
    #[must_use]
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }
}

/// Source of routed driving distances.
///
/// The production implementation is [`OsrmClient`]; tests substitute a
/// canned implementation.
pub trait RoutingClient {
    /// Routed driving leg between two coordinates.
    ///
    /// `Ok(None)` means the service answered but found no drivable route.
    fn driving_route(
        &self,
        from: Coordinate,
        to: Coordinate,
    ) -> impl std::future::Future<Output = RoutingResult<Option<DrivingRoute>>> + Send;
}

/// HTTP client for an OSRM `route/v1/driving` endpoint
pub struct OsrmClient {
    base_url: String,
    http: reqwest::Client,
    limiter: RateLimiter,
}

impl OsrmClient {
    /// Create a client against the default public endpoint
    pub fn new() -> RoutingResult<Self> {
        Self::with_base_url(DEFAULT_ROUTING_URL)
    }

    /// Create a client against a specific endpoint (e.g. a local OSRM)
    pub fn with_base_url(base_url: impl Into<String>) -> RoutingResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(8))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            // Public OSRM instances throttle aggressively
            limiter: RateLimiter::new(RateLimitConfig::per_second(10)),
        })
    }

    /// The configured endpoint root
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Deserialize)]
struct RouteResponse {
    #[serde(default)]
    routes: Vec<RouteLeg>,
}

#[derive(Deserialize)]
struct RouteLeg {
    distance: f64,
    duration: f64,
}

impl RoutingClient for OsrmClient {
    async fn driving_route(
        &self,
        from: Coordinate,
        to: Coordinate,
    ) -> RoutingResult<Option<DrivingRoute>> {
        if !self.limiter.try_acquire("route") {
            return Err(RoutingError::RateLimited);
        }

        // OSRM takes lon,lat pairs
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}?overview=false",
            self.base_url, from.longitude, from.latitude, to.longitude, to.latitude
        );

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RoutingError::ServiceStatus {
                status: status.as_u16(),
            });
        }

        let body: RouteResponse = response
            .json()
            .await
            .map_err(|e| RoutingError::InvalidResponse(e.to_string()))?;

        let Some(leg) = body.routes.into_iter().next() else {
            debug!("No drivable route between points");
            return Ok(None);
        };

        if !leg.distance.is_finite() || !leg.duration.is_finite() {
            return Err(RoutingError::InvalidResponse(
                "non-finite distance or duration".to_string(),
            ));
        }

        Ok(Some(DrivingRoute {
            distance_m: leg.distance,
            duration_secs: leg.duration,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_km_conversion() {
        let route = DrivingRoute {
            distance_m: 12_500.0,
            duration_secs: 900.0,
        };
        assert!((route.distance_km() - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = OsrmClient::with_base_url("http://127.0.0.1:5000/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:5000");
    }

    #[test]
    fn test_route_response_parses_osrm_shape() {
        let json = r#"{"code":"Ok","routes":[{"distance":15234.1,"duration":1145.9,"legs":[]}]}"#;
        let parsed: RouteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.routes.len(), 1);
        assert!((parsed.routes[0].distance - 15234.1).abs() < 0.01);
    }

    #[test]
    fn test_route_response_tolerates_empty_routes() {
        let json = r#"{"code":"NoRoute"}"#;
        let parsed: RouteResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.routes.is_empty());
    }
}
