//! Geospatial utilities for the Findixi directory.
//!
//! This crate provides:
//! - Haversine distance calculations
//! - PostGIS POINT parsing (JSON and WKT formats)
//! - Batch distance computation with optional parallelism
//! - Driving-time estimates from straight-line distance
//!
//! # Example
//!
//! ```
//! use findixi_geo::{haversine_distance, Coordinate};
//!
//! let san_juan = Coordinate::new(18.4655, -66.1057);
//! let ponce = Coordinate::new(18.0111, -66.6140);
//!
//! let distance_km = haversine_distance(&san_juan, &ponce);
//! assert!((distance_km - 73.0).abs() < 5.0);
//! ```

mod haversine;
mod postgis;
pub mod batch;
mod error;
mod travel;

pub use batch::{calculate_distances, DistancePoint, DistanceResult};
pub use error::{GeoError, Result};
pub use haversine::{haversine_distance, haversine_distance_meters, EARTH_RADIUS_KM, EARTH_RADIUS_M};
pub use postgis::{parse_postgis_point, PostGisPoint};
pub use travel::{estimate_travel, travel_from_route, TravelEstimate};

/// Centroid used when no user location is available at all.
///
/// Roughly the geographic center of the island the directory serves.
pub const ISLAND_CENTER: Coordinate = Coordinate {
    latitude: 18.2208,
    longitude: -66.5901,
};

/// A geographic coordinate with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a new coordinate.
    #[inline]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns true if the coordinate has valid values.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    /// Converts degrees to radians for internal calculations.
    #[inline]
    pub(crate) fn to_radians(&self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_creation() {
        let coord = Coordinate::new(18.4655, -66.1057);
        assert_eq!(coord.latitude, 18.4655);
        assert_eq!(coord.longitude, -66.1057);
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(0.0, 0.0).is_valid());
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 181.0).is_valid());
    }

    #[test]
    fn test_island_center_is_valid() {
        assert!(ISLAND_CENTER.is_valid());
    }

    #[test]
    fn test_coordinate_from_tuple() {
        let coord: Coordinate = (18.4655, -66.1057).into();
        assert_eq!(coord.latitude, 18.4655);
    }
}
