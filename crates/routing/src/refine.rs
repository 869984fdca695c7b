//! Progressive distance refinement
//!
//! Listing cards first show straight-line distances. For the visible head
//! of the result list, the engine swaps in routed driving distances from
//! a memoized per-listing cache, fetching misses from the routing
//! service. The pass is best effort: a failed lookup leaves that listing
//! on its straight-line estimate.
//!
//! If any corrected distance deviates from its straight-line estimate by
//! more than 15%, the pass reports that the caller should re-sort and
//! re-render.

use crate::client::RoutingClient;
use findixi_geo::{travel_from_route, Coordinate, TravelEstimate};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Only the first visible page of results is refined
pub const VISIBLE_REFINEMENT_LIMIT: usize = 10;

/// Relative deviation that forces a re-sort of the result list
pub const RESORT_THRESHOLD: f64 = 0.15;

/// A routed correction for one listing
#[derive(Debug, Clone)]
pub struct RefinedDistance {
    /// Routed driving distance in kilometers
    pub distance_km: f64,
    /// Travel estimate derived from the routed duration
    pub travel: TravelEstimate,
}

/// Listing-shaped items the engine can correct in place.
///
/// Refinement only ever touches distance and travel time; identity and
/// every other field stay untouched.
pub trait Refinable {
    /// Stable listing id used as the cache key
    fn id(&self) -> i64;
    /// Listing coordinates, when known
    fn coordinate(&self) -> Option<Coordinate>;
    /// Current (straight-line or previously refined) distance
    fn distance_km(&self) -> Option<f64>;
    /// Apply a routed correction
    fn apply_refinement(&mut self, distance_km: f64, travel: TravelEstimate);
}

/// Outcome of one refinement pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefinementOutcome {
    /// Listings that received a routed distance
    pub refined: usize,
    /// Whether a corrected distance moved enough to change ordering
    pub needs_resort: bool,
    /// Whether the pass was skipped because another one was running
    pub skipped: bool,
}

/// Distance-refinement engine with a per-listing memo cache
pub struct RefinementEngine<R> {
    client: R,
    cache: Mutex<HashMap<i64, RefinedDistance>>,
    busy: AtomicBool,
}

impl<R: RoutingClient> RefinementEngine<R> {
    /// Create an engine around a routing client
    pub fn new(client: R) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
            busy: AtomicBool::new(false),
        }
    }

    /// Refine the visible head of a result list in place.
    ///
    /// Re-entrant calls are no-ops: a second pass starting while one is
    /// in flight returns immediately with `skipped = true` instead of
    /// queueing.
    pub async fn refine<T: Refinable>(
        &self,
        user: Coordinate,
        items: &mut [T],
    ) -> RefinementOutcome {
        if self.busy.swap(true, Ordering::AcqRel) {
            debug!("Refinement already running, skipping pass");
            return RefinementOutcome {
                skipped: true,
                ..Default::default()
            };
        }

        let mut outcome = RefinementOutcome::default();

        for item in items.iter_mut().take(VISIBLE_REFINEMENT_LIMIT) {
            let refined = match self.lookup(user, item).await {
                Some(refined) => refined,
                None => continue,
            };

            let original = item.distance_km();
            item.apply_refinement(refined.distance_km, refined.travel.clone());
            outcome.refined += 1;

            if let Some(original) = original.filter(|d| d.is_finite() && *d > 0.0) {
                let deviation = (refined.distance_km - original).abs() / original;
                if deviation > RESORT_THRESHOLD {
                    outcome.needs_resort = true;
                }
            }
        }

        self.busy.store(false, Ordering::Release);
        outcome
    }

    /// Apply every cached correction to a list (used after a re-sort).
    ///
    /// Returns the number of items updated.
    pub fn apply_cached<T: Refinable>(&self, items: &mut [T]) -> usize {
        let Ok(cache) = self.cache.lock() else {
            return 0;
        };

        let mut applied = 0;
        for item in items.iter_mut() {
            if let Some(refined) = cache.get(&item.id()) {
                item.apply_refinement(refined.distance_km, refined.travel.clone());
                applied += 1;
            }
        }
        applied
    }

    /// Cached correction for a listing, if any
    pub fn cached(&self, id: i64) -> Option<RefinedDistance> {
        self.cache.lock().ok()?.get(&id).cloned()
    }

    /// Cache hit or routed fetch for one item; `None` swallows failures
    async fn lookup<T: Refinable>(&self, user: Coordinate, item: &T) -> Option<RefinedDistance> {
        if let Some(hit) = self.cached(item.id()) {
            return Some(hit);
        }

        let destination = item.coordinate()?;

        match self.client.driving_route(user, destination).await {
            Ok(Some(route)) => {
                let refined = RefinedDistance {
                    distance_km: route.distance_km(),
                    travel: travel_from_route(route.duration_secs),
                };
                if let Ok(mut cache) = self.cache.lock() {
                    cache.insert(item.id(), refined.clone());
                }
                Some(refined)
            }
            Ok(None) => {
                debug!(listing = item.id(), "No drivable route, keeping estimate");
                None
            }
            Err(e) => {
                warn!(listing = item.id(), error = %e, "Routing lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DrivingRoute;
    use crate::error::{RoutingError, RoutingResult};
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug, Clone)]
    struct TestListing {
        id: i64,
        coordinate: Option<Coordinate>,
        distance_km: Option<f64>,
        travel_text: String,
    }

    impl Refinable for TestListing {
        fn id(&self) -> i64 {
            self.id
        }

        fn coordinate(&self) -> Option<Coordinate> {
            self.coordinate
        }

        fn distance_km(&self) -> Option<f64> {
            self.distance_km
        }

        fn apply_refinement(&mut self, distance_km: f64, travel: TravelEstimate) {
            self.distance_km = Some(distance_km);
            self.travel_text = travel.text;
        }
    }

    /// Canned router: answers `route_km` for every pair, optionally failing
    struct StubRouter {
        route_km: f64,
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubRouter {
        fn returning(route_km: f64) -> Self {
            Self {
                route_km,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                route_km: 0.0,
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RoutingClient for &StubRouter {
        async fn driving_route(
            &self,
            _from: Coordinate,
            _to: Coordinate,
        ) -> RoutingResult<Option<DrivingRoute>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RoutingError::ServiceStatus { status: 503 });
            }
            Ok(Some(DrivingRoute {
                distance_m: self.route_km * 1000.0,
                duration_secs: self.route_km * 60.0,
            }))
        }
    }

    fn listing(id: i64, distance_km: f64) -> TestListing {
        TestListing {
            id,
            coordinate: Some(Coordinate::new(18.4, -66.1)),
            distance_km: Some(distance_km),
            travel_text: "est".to_string(),
        }
    }

    #[tokio::test]
    async fn test_refines_in_place_without_changing_identity() {
        let router = StubRouter::returning(12.0);
        let engine = RefinementEngine::new(&router);
        let mut items = vec![listing(1, 10.0), listing(2, 11.0)];

        let outcome = engine.refine(Coordinate::new(18.2, -66.0), &mut items).await;

        assert_eq!(outcome.refined, 2);
        assert!(!outcome.skipped);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, 1);
        assert_eq!(items[1].id, 2);
        assert_eq!(items[0].distance_km, Some(12.0));
    }

    #[tokio::test]
    async fn test_small_correction_does_not_force_resort() {
        // 10.0 -> 11.0 is a 10% deviation, under the 15% threshold
        let router = StubRouter::returning(11.0);
        let engine = RefinementEngine::new(&router);
        let mut items = vec![listing(1, 10.0)];

        let outcome = engine.refine(Coordinate::new(18.2, -66.0), &mut items).await;
        assert!(!outcome.needs_resort);
    }

    #[tokio::test]
    async fn test_large_correction_forces_resort() {
        // 10.0 -> 12.0 is a 20% deviation
        let router = StubRouter::returning(12.0);
        let engine = RefinementEngine::new(&router);
        let mut items = vec![listing(1, 10.0)];

        let outcome = engine.refine(Coordinate::new(18.2, -66.0), &mut items).await;
        assert!(outcome.needs_resort);
    }

    #[tokio::test]
    async fn test_cache_avoids_second_fetch() {
        let router = StubRouter::returning(12.0);
        let engine = RefinementEngine::new(&router);
        let mut items = vec![listing(1, 10.0)];

        engine.refine(Coordinate::new(18.2, -66.0), &mut items).await;
        engine.refine(Coordinate::new(18.2, -66.0), &mut items).await;

        assert_eq!(router.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_straight_line_estimate() {
        let router = StubRouter::failing();
        let engine = RefinementEngine::new(&router);
        let mut items = vec![listing(1, 10.0)];

        let outcome = engine.refine(Coordinate::new(18.2, -66.0), &mut items).await;

        assert_eq!(outcome.refined, 0);
        assert_eq!(items[0].distance_km, Some(10.0));
        assert_eq!(items[0].travel_text, "est");
    }

    #[tokio::test]
    async fn test_only_visible_head_is_refined() {
        let router = StubRouter::returning(5.0);
        let engine = RefinementEngine::new(&router);
        let mut items: Vec<TestListing> =
            (0..25).map(|i| listing(i, 10.0 + i as f64)).collect();

        let outcome = engine.refine(Coordinate::new(18.2, -66.0), &mut items).await;

        assert_eq!(outcome.refined, VISIBLE_REFINEMENT_LIMIT);
        assert_eq!(router.call_count(), VISIBLE_REFINEMENT_LIMIT);
        // Tail keeps its straight-line estimates
        assert_eq!(items[20].distance_km, Some(30.0));
    }

    #[tokio::test]
    async fn test_missing_coordinates_are_skipped() {
        let router = StubRouter::returning(5.0);
        let engine = RefinementEngine::new(&router);
        let mut items = vec![TestListing {
            id: 1,
            coordinate: None,
            distance_km: None,
            travel_text: "est".to_string(),
        }];

        let outcome = engine.refine(Coordinate::new(18.2, -66.0), &mut items).await;
        assert_eq!(outcome.refined, 0);
        assert_eq!(router.call_count(), 0);
    }

    #[tokio::test]
    async fn test_apply_cached_after_resort() {
        let router = StubRouter::returning(12.0);
        let engine = RefinementEngine::new(&router);
        let mut items = vec![listing(1, 10.0)];
        engine.refine(Coordinate::new(18.2, -66.0), &mut items).await;

        // Fresh copies of the same listings, as after a re-sort rebuild
        let mut rebuilt = vec![listing(1, 10.0), listing(99, 50.0)];
        let applied = engine.apply_cached(&mut rebuilt);

        assert_eq!(applied, 1);
        assert_eq!(rebuilt[0].distance_km, Some(12.0));
        assert_eq!(rebuilt[1].distance_km, Some(50.0));
    }

    #[tokio::test]
    async fn test_busy_flag_resets_between_passes() {
        let router = StubRouter::returning(12.0);
        let engine = RefinementEngine::new(&router);
        let mut items = vec![listing(1, 10.0)];

        let first = engine.refine(Coordinate::new(18.2, -66.0), &mut items).await;
        let second = engine.refine(Coordinate::new(18.2, -66.0), &mut items).await;

        assert!(!first.skipped);
        assert!(!second.skipped);
    }
}
