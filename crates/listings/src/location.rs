//! User location providers
//!
//! The browse pipeline only needs "a coordinate or nothing". Where that
//! coordinate comes from (GPS, a browser prompt, a CLI flag) is behind
//! [`LocationProvider`]; a denied permission is its own error variant so
//! callers can surface a re-prompt instead of silently degrading.

use findixi_geo::Coordinate;
use thiserror::Error;

/// Location acquisition errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocationError {
    /// The user declined the permission prompt
    #[error("Location permission denied")]
    PermissionDenied,

    /// No positioning source is available at all
    #[error("Location unavailable")]
    Unavailable,
}

/// Source of the user's coordinate
pub trait LocationProvider {
    /// Current coordinate; `Ok(None)` when the source timed out benignly
    fn locate(&self) -> Result<Option<Coordinate>, LocationError>;
}

/// Fixed coordinate supplied up front (CLI flags, a stored preference)
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinate);

impl LocationProvider for FixedLocation {
    fn locate(&self) -> Result<Option<Coordinate>, LocationError> {
        if self.0.is_valid() {
            Ok(Some(self.0))
        } else {
            Err(LocationError::Unavailable)
        }
    }
}

/// Absent location source (no flags given, no stored preference)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

impl LocationProvider for NoLocation {
    fn locate(&self) -> Result<Option<Coordinate>, LocationError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_location() {
        let provider = FixedLocation(Coordinate::new(18.2, -66.5));
        assert_eq!(provider.locate().unwrap(), Some(Coordinate::new(18.2, -66.5)));
    }

    #[test]
    fn test_fixed_location_rejects_garbage() {
        let provider = FixedLocation(Coordinate::new(200.0, 0.0));
        assert_eq!(provider.locate(), Err(LocationError::Unavailable));
    }

    #[test]
    fn test_no_location() {
        assert_eq!(NoLocation.locate().unwrap(), None);
    }
}
