//! Municipality resolution
//!
//! Finds the administrative area a user is in, for pre-selecting the
//! municipality filter. Resolution order:
//!
//! 1. Postal code, when known, against the backend's postal-codes table
//! 2. Reverse geocoding of the coordinates through a Nominatim-style
//!    service, cached on disk (public instances throttle hard)
//!
//! Every failure degrades to `None`; a page must never fail to load
//! because the user's municipality could not be named.

use findixi_api_client::MunicipalitiesApi;
use findixi_core::cache::Cache;
use findixi_geo::Coordinate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Default public reverse-geocoding endpoint
const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// Reverse-geocoding errors
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed
    #[error("Geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("Geocoding service error ({status})")]
    ServiceStatus {
        /// HTTP status code
        status: u16,
    },
}

/// Address fields of a reverse-geocoded place
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeocodedPlace {
    /// Town name
    #[serde(default)]
    pub town: Option<String>,
    /// City name
    #[serde(default)]
    pub city: Option<String>,
    /// Village name
    #[serde(default)]
    pub village: Option<String>,
    /// County name
    #[serde(default)]
    pub county: Option<String>,
}

impl GeocodedPlace {
    /// Best municipality candidate: town, then city, village, county
    #[must_use]
    pub fn municipality(&self) -> Option<&str> {
        self.town
            .as_deref()
            .or(self.city.as_deref())
            .or(self.village.as_deref())
            .or(self.county.as_deref())
    }
}

/// Source of reverse-geocoded places
pub trait ReverseGeocoder {
    /// Resolve the place at a coordinate; `Ok(None)` when nothing matched
    fn reverse(
        &self,
        coordinate: Coordinate,
    ) -> impl std::future::Future<Output = Result<Option<GeocodedPlace>, GeocodeError>> + Send;
}

/// Nominatim-style HTTP reverse geocoder
pub struct NominatimGeocoder {
    base_url: String,
    http: reqwest::Client,
}

impl NominatimGeocoder {
    /// Client against the default public endpoint
    pub fn new() -> Result<Self, GeocodeError> {
        Self::with_base_url(DEFAULT_GEOCODER_URL)
    }

    /// Client against a specific endpoint
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, GeocodeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(8))
            .user_agent("findixi-platform/0.3")
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[derive(Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<GeocodedPlace>,
}

impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<GeocodedPlace>, GeocodeError> {
        let url = format!(
            "{}/reverse?format=jsonv2&lat={}&lon={}",
            self.base_url, coordinate.latitude, coordinate.longitude
        );

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::ServiceStatus {
                status: status.as_u16(),
            });
        }

        let body: ReverseResponse = response.json().await?;
        Ok(body.address)
    }
}

/// Resolves the user's municipality from a postal code or coordinates
pub struct MunicipalityResolver<G> {
    api: MunicipalitiesApi,
    geocoder: G,
    cache: Option<Cache>,
}

impl<G: ReverseGeocoder> MunicipalityResolver<G> {
    /// Create a resolver; pass a cache to keep geocoder answers across runs
    pub fn new(api: MunicipalitiesApi, geocoder: G, cache: Option<Cache>) -> Self {
        Self {
            api,
            geocoder,
            cache,
        }
    }

    /// Resolve a municipality name. Postal code wins over coordinates;
    /// all failures degrade to `None`.
    pub async fn resolve(
        &self,
        postal_code: Option<&str>,
        coordinate: Option<Coordinate>,
    ) -> Option<String> {
        if let Some(code) = postal_code.map(str::trim).filter(|c| !c.is_empty()) {
            match self.api.by_postal_code(code).await {
                Ok(Some(municipality)) => {
                    debug!(code, municipality, "Municipality resolved by postal code");
                    return Some(municipality);
                }
                Ok(None) => debug!(code, "Postal code unknown, trying coordinates"),
                Err(e) => warn!(error = %e, "Postal-code lookup failed"),
            }
        }

        let coordinate = coordinate.filter(Coordinate::is_valid)?;
        self.resolve_by_coordinate(coordinate).await
    }

    async fn resolve_by_coordinate(&self, coordinate: Coordinate) -> Option<String> {
        let cache_key = format!(
            "geocode:{:.4},{:.4}",
            coordinate.latitude, coordinate.longitude
        );

        if let Some(cache) = &self.cache {
            if let Ok(Some(cached)) = cache.get::<String>(&cache_key) {
                return Some(cached);
            }
        }

        let place = match self.geocoder.reverse(coordinate).await {
            Ok(Some(place)) => place,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Reverse geocoding failed");
                return None;
            }
        };

        let municipality = place.municipality()?.to_string();

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(&cache_key, &municipality, None) {
                debug!(error = %e, "Could not cache geocode answer");
            }
        }

        Some(municipality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_municipality_priority_order() {
        let place = GeocodedPlace {
            town: Some("Rincón".to_string()),
            city: Some("Aguadilla".to_string()),
            ..Default::default()
        };
        assert_eq!(place.municipality(), Some("Rincón"));

        let place = GeocodedPlace {
            city: Some("Aguadilla".to_string()),
            county: Some("Aguadilla Municipio".to_string()),
            ..Default::default()
        };
        assert_eq!(place.municipality(), Some("Aguadilla"));

        let place = GeocodedPlace {
            county: Some("Lajas Municipio".to_string()),
            ..Default::default()
        };
        assert_eq!(place.municipality(), Some("Lajas Municipio"));
    }

    #[test]
    fn test_empty_place_has_no_municipality() {
        assert!(GeocodedPlace::default().municipality().is_none());
    }

    #[test]
    fn test_reverse_response_shape() {
        let json = r#"{
            "place_id": 1,
            "address": {"town": "Guánica", "county": "Guánica Municipio", "state": "Puerto Rico"}
        }"#;
        let parsed: ReverseResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.address.unwrap().municipality(), Some("Guánica"));
    }

    #[test]
    fn test_reverse_response_without_address() {
        let json = r#"{"error": "Unable to geocode"}"#;
        let parsed: ReverseResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.address.is_none());
    }
}
