//! Batch distance calculations with optional parallelism.
//!
//! Recomputing distances for a whole result page is the hot path when the
//! user's location changes mid-session, so the batch path can fan out over
//! rayon when the `parallel` feature is enabled.

use crate::{haversine_distance, Coordinate};
use serde::{Deserialize, Serialize};

/// Result of a distance calculation for a single item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceResult {
    /// The item ID
    pub id: i64,
    /// Calculated distance in kilometers (Infinity if the location is unknown)
    pub distance: f64,
}

/// Input item for batch distance calculation.
#[derive(Debug, Clone, Deserialize)]
pub struct DistancePoint {
    /// Item ID
    pub id: i64,
    /// Item location, if known
    pub location: Option<Coordinate>,
}

/// Calculate distances from a reference point to multiple items.
///
/// Items without a usable location get `f64::INFINITY` so they sort last.
///
/// # Example
/// ```
/// use findixi_geo::{calculate_distances, Coordinate, DistancePoint};
///
/// let items = vec![
///     DistancePoint { id: 1, location: Some(Coordinate::new(18.4655, -66.1057)) },
///     DistancePoint { id: 2, location: None },
/// ];
///
/// let results = calculate_distances(&Coordinate::new(18.0111, -66.6140), &items);
/// assert_eq!(results.len(), 2);
/// assert!(results[1].distance.is_infinite());
/// ```
pub fn calculate_distances(reference: &Coordinate, items: &[DistancePoint]) -> Vec<DistanceResult> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        items
            .par_iter()
            .map(|item| single_distance(reference, item))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        items
            .iter()
            .map(|item| single_distance(reference, item))
            .collect()
    }
}

/// Calculate distances and return them sorted closest-first.
pub fn calculate_distances_sorted(
    reference: &Coordinate,
    items: &[DistancePoint],
    max_results: Option<usize>,
) -> Vec<DistanceResult> {
    let mut results = calculate_distances(reference, items);

    results.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if let Some(max) = max_results {
        results.truncate(max);
    }

    results
}

/// Calculate distances, keeping only items within a radius, sorted closest-first.
pub fn calculate_distances_within_radius(
    reference: &Coordinate,
    items: &[DistancePoint],
    radius_km: f64,
) -> Vec<DistanceResult> {
    let mut results = calculate_distances(reference, items);

    results.retain(|r| r.distance <= radius_km);
    results.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    results
}

#[inline]
fn single_distance(reference: &Coordinate, item: &DistancePoint) -> DistanceResult {
    let distance = item
        .location
        .filter(Coordinate::is_valid)
        .map(|coord| haversine_distance(reference, &coord))
        .unwrap_or(f64::INFINITY);

    DistanceResult {
        id: item.id,
        distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_items() -> Vec<DistancePoint> {
        vec![
            // San Juan
            DistancePoint {
                id: 1,
                location: Some(Coordinate::new(18.4655, -66.1057)),
            },
            // Ponce
            DistancePoint {
                id: 2,
                location: Some(Coordinate::new(18.0111, -66.6140)),
            },
            // Mayaguez
            DistancePoint {
                id: 3,
                location: Some(Coordinate::new(18.2011, -67.1397)),
            },
            // No coordinates on the row
            DistancePoint {
                id: 4,
                location: None,
            },
        ]
    }

    #[test]
    fn test_batch_distances() {
        let items = test_items();
        // Reference: Caguas, central-east
        let results = calculate_distances(&Coordinate::new(18.2341, -66.0485), &items);

        assert_eq!(results.len(), 4);

        let san_juan = results.iter().find(|r| r.id == 1).unwrap();
        assert!(san_juan.distance > 0.0 && san_juan.distance < 50.0);

        let missing = results.iter().find(|r| r.id == 4).unwrap();
        assert!(missing.distance.is_infinite());
    }

    #[test]
    fn test_sorted_distances() {
        let items = test_items();
        let results = calculate_distances_sorted(&Coordinate::new(18.2341, -66.0485), &items, None);

        for window in results.windows(2) {
            assert!(window[0].distance <= window[1].distance);
        }
        // Unknown locations sort last
        assert_eq!(results.last().unwrap().id, 4);
    }

    #[test]
    fn test_radius_filter_drops_unknown_locations() {
        let items = test_items();
        let results =
            calculate_distances_within_radius(&Coordinate::new(18.2341, -66.0485), &items, 60.0);

        assert!(results.iter().all(|r| r.distance <= 60.0));
        assert!(results.iter().all(|r| r.id != 4));
    }

    #[test]
    fn test_max_results() {
        let items = test_items();
        let results =
            calculate_distances_sorted(&Coordinate::new(18.2341, -66.0485), &items, Some(2));

        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_invalid_coordinate_treated_as_unknown() {
        let items = vec![DistancePoint {
            id: 9,
            location: Some(Coordinate::new(999.0, 0.0)),
        }];
        let results = calculate_distances(&Coordinate::new(18.0, -66.0), &items);
        assert!(results[0].distance.is_infinite());
    }
}
