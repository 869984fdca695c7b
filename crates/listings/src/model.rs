//! The listing entity as the browse pipeline sees it
//!
//! A [`Listing`] is a transient, derived copy of a backend row: created
//! when a page of candidates arrives, enriched and refined in place, and
//! dropped when the page goes away. The backend remains the only owner
//! of listing data.

use crate::plan::Plan;
use findixi_api_client::ListingRow;
use findixi_geo::{
    estimate_travel, haversine_distance, parse_postgis_point, Coordinate, TravelEstimate,
};
use findixi_routing::Refinable;
use serde::{Deserialize, Serialize};

/// One listing in a browse/search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Listing id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Branch label, when the listing is a branch location
    pub branch_label: Option<String>,
    /// Phone number as stored
    pub phone: Option<String>,
    /// Municipality name
    pub municipality: Option<String>,
    /// Resolved coordinates
    pub coordinate: Option<Coordinate>,
    /// Category ids (join table and legacy column merged)
    pub category_ids: Vec<i64>,
    /// Subcategory ids
    pub subcategory_ids: Vec<i64>,
    /// Open right now, as computed server-side from stored hours
    pub open_now: bool,
    /// Fully onboarded listing vs placeholder
    pub active: bool,
    /// Favorite of the signed-in user
    pub favorite: bool,
    /// Straight-line or routed distance from the reference point, in km
    pub distance_km: Option<f64>,
    /// Travel estimate matching `distance_km`
    pub travel: Option<TravelEstimate>,
    /// Storage path of the logo object
    pub logo_path: Option<String>,
    /// Resolved plan
    pub plan: Plan,
}

impl Listing {
    /// Build a listing from a backend row, computing the straight-line
    /// distance against a reference point when one is known.
    #[must_use]
    pub fn from_row(row: ListingRow, reference: Option<Coordinate>) -> Self {
        let coordinate = resolve_coordinate(&row);

        let distance_km = match (reference, coordinate) {
            (Some(reference), Some(coordinate)) => {
                Some(haversine_distance(&reference, &coordinate))
            }
            _ => None,
        };
        let travel = distance_km.map(estimate_travel);

        let category_ids = merge_category_ids(
            row.category_ids.as_deref().unwrap_or_default(),
            row.categories.as_deref(),
        );

        Self {
            id: row.id,
            name: row.name.unwrap_or_else(|| "Unnamed".to_string()),
            branch_label: None,
            phone: row.phone,
            municipality: row.municipality,
            coordinate,
            category_ids,
            subcategory_ids: row.subcategory_ids.unwrap_or_default(),
            open_now: row.open_now.unwrap_or(false),
            active: row.active.unwrap_or(false),
            favorite: false,
            distance_km,
            travel,
            logo_path: row.logo_path,
            plan: Plan::resolve(row.plan_level, row.allows_nearby),
        }
    }

    /// Recompute straight-line distance and travel estimate against a new
    /// reference point (the user moved or granted location access).
    pub fn recompute_distance(&mut self, reference: Coordinate) {
        self.distance_km = self
            .coordinate
            .map(|coordinate| haversine_distance(&reference, &coordinate));
        self.travel = self.distance_km.map(estimate_travel);
    }

    /// Phone formatted for display (`787-555-0199`), when well-formed
    #[must_use]
    pub fn display_phone(&self) -> Option<String> {
        let phone = self.phone.as_deref()?;
        let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

        let local = match digits.len() {
            10 => &digits[..],
            11 if digits.starts_with('1') => &digits[1..],
            _ => return Some(phone.trim().to_string()),
        };

        Some(format!("{}-{}-{}", &local[..3], &local[3..6], &local[6..]))
    }
}

impl Refinable for Listing {
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
        self.travel = Some(travel);
    }
}

/// Prefer the numeric latitude/longitude columns; fall back to the
/// PostGIS location column old rows still carry.
fn resolve_coordinate(row: &ListingRow) -> Option<Coordinate> {
    if let (Some(lat), Some(lon)) = (row.latitude, row.longitude) {
        let coordinate = Coordinate::new(lat, lon);
        if coordinate.is_valid() {
            return Some(coordinate);
        }
    }

    row.location
        .as_ref()
        .and_then(parse_postgis_point)
        .filter(Coordinate::is_valid)
}

/// Merge join-table category ids with the legacy delimited column.
///
/// Old rows store `"3;7;12"`; both forms are tolerated and merged,
/// deduplicated, preserving join-table order first.
fn merge_category_ids(join_ids: &[i64], legacy: Option<&str>) -> Vec<i64> {
    let mut merged: Vec<i64> = join_ids.to_vec();

    if let Some(legacy) = legacy {
        for part in legacy.split([';', ',']) {
            if let Ok(id) = part.trim().parse::<i64>() {
                if !merged.contains(&id) {
                    merged.push(id);
                }
            }
        }
    }

    merged
}
