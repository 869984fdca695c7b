//! Client-side refinement: filtering and sorting of a candidate page
//!
//! The server returns up to a page of candidates; everything here is a
//! pure function from (candidates, filter state) to an ordered display
//! list. No I/O, no globals.

use crate::model::Listing;
use findixi_api_client::MenuMatches;
use findixi_geo::Coordinate;
use findixi_search::normalize_text;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Free-text terms shorter than this do not filter locally
pub const TEXT_FILTER_MIN_CHARS: usize = 3;

/// Sort modes offered by the browse page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Alphabetical by display name
    #[default]
    Alphabetical,
    /// Most recently created first
    Newest,
    /// Closest first; requires a known user coordinate
    Distance,
}

impl SortMode {
    /// Parse from the wire/CLI form (`az`, `recent`, `distance`)
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "az" | "alphabetical" => Some(Self::Alphabetical),
            "recent" | "newest" => Some(Self::Newest),
            "distance" | "location" => Some(Self::Distance),
            _ => None,
        }
    }
}

/// The mutable filter record of one browse page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterState {
    /// Free-text search term
    pub text: String,
    /// Selected municipality, when any
    pub municipality: Option<String>,
    /// Selected category id
    pub category: Option<i64>,
    /// Selected subcategory id
    pub subcategory: Option<i64>,
    /// Selected sort mode
    pub sort: SortMode,
    /// Only listings open right now
    pub open_now: bool,
    /// Only the user's favorites
    pub favorites_only: bool,
    /// Active listings as a block ahead of placeholders
    pub featured_first: bool,
    /// Listing ids matched through menu content for the current term
    #[serde(skip)]
    pub menu_matches: MenuMatches,
}

impl FilterState {
    /// Default state for a fresh page: featured first, alphabetical
    #[must_use]
    pub fn new() -> Self {
        Self {
            featured_first: true,
            ..Self::default()
        }
    }

    /// Whether the term is long enough to filter by name locally
    #[must_use]
    pub fn has_text_search(&self) -> bool {
        self.text.trim().chars().count() >= TEXT_FILTER_MIN_CHARS
    }

    /// Sort mode actually used: distance ordering silently falls back to
    /// alphabetical when no user coordinate is known.
    #[must_use]
    pub fn effective_sort(&self, user_coordinate: Option<Coordinate>) -> SortMode {
        match (self.sort, user_coordinate) {
            (SortMode::Distance, None) => SortMode::Alphabetical,
            (sort, _) => sort,
        }
    }
}

/// Apply the filter state to a candidate list and return the ordered
/// display list.
///
/// A text search of three or more characters takes precedence over the
/// municipality filter: the term already narrowed results island-wide, so
/// municipality becomes inert for that render.
#[must_use]
pub fn apply_filters(
    candidates: &[Listing],
    state: &FilterState,
    user_coordinate: Option<Coordinate>,
) -> Vec<Listing> {
    let mut result: Vec<Listing> = candidates.to_vec();

    let text_search = state.has_text_search();
    let menu_ids = state.menu_matches.all_ids();

    if text_search {
        let term = normalize_text(&state.text);
        result.retain(|listing| {
            normalize_text(&listing.name).contains(&term) || menu_ids.contains(&listing.id)
        });
    } else if !menu_ids.is_empty() {
        // A dish filter without a (long enough) name term still narrows
        result.retain(|listing| menu_ids.contains(&listing.id));
    }

    if let Some(municipality) = state.municipality.as_deref() {
        if !text_search && menu_ids.is_empty() && !municipality.trim().is_empty() {
            let wanted = normalize_text(municipality);
            result.retain(|listing| {
                listing
                    .municipality
                    .as_deref()
                    .is_some_and(|m| normalize_text(m) == wanted)
            });
        }
    }

    if let Some(subcategory) = state.subcategory {
        result.retain(|listing| listing.subcategory_ids.contains(&subcategory));
    }

    if state.open_now {
        result.retain(|listing| listing.open_now);
    }

    if state.favorites_only {
        result.retain(|listing| listing.favorite);
    }

    sort_listings(&mut result, state, user_coordinate);
    result
}

/// Sort in place per the filter state.
///
/// With `featured_first`, the list is partitioned into the active group
/// followed by the placeholder group, each independently sorted by the
/// selected key. The partition is stable: within a group, equal keys keep
/// their input order.
pub fn sort_listings(
    listings: &mut Vec<Listing>,
    state: &FilterState,
    user_coordinate: Option<Coordinate>,
) {
    let sort = state.effective_sort(user_coordinate);

    if state.featured_first {
        let (mut active, mut placeholder): (Vec<Listing>, Vec<Listing>) =
            listings.drain(..).partition(|listing| listing.active);

        sort_group(&mut active, sort);
        sort_group(&mut placeholder, sort);

        listings.extend(active);
        listings.extend(placeholder);
    } else {
        sort_group(listings, sort);
    }
}

fn sort_group(group: &mut [Listing], sort: SortMode) {
    match sort {
        SortMode::Alphabetical => {
            group.sort_by(|a, b| normalize_text(&a.name).cmp(&normalize_text(&b.name)));
        }
        SortMode::Newest => {
            group.sort_by(|a, b| b.id.cmp(&a.id));
        }
        SortMode::Distance => {
            group.sort_by(|a, b| compare_distance(a.distance_km, b.distance_km));
        }
    }
}

/// Closest first; unknown distances sort last
fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    let a = a.unwrap_or(f64::INFINITY);
    let b = b.unwrap_or(f64::INFINITY);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use findixi_api_client::ListingRow;
    use proptest::prelude::*;
    use serde_json::json;

    fn listing(id: i64, name: &str) -> Listing {
        let row: ListingRow =
            serde_json::from_value(json!({ "id": id, "name": name, "active": true })).unwrap();
        Listing::from_row(row, None)
    }

    fn candidates() -> Vec<Listing> {
        let mut l1 = listing(1, "Café del Puerto");
        l1.municipality = Some("Ponce".to_string());
        l1.open_now = true;
        l1.distance_km = Some(5.0);

        let mut l2 = listing(2, "Panadería La Ceiba");
        l2.municipality = Some("Ponce".to_string());
        l2.distance_km = Some(1.0);

        let mut l3 = listing(3, "Pizzeria Bella");
        l3.municipality = Some("Cayey".to_string());
        l3.open_now = true;
        l3.favorite = true;
        l3.distance_km = Some(12.0);

        let mut l4 = listing(4, "Antojitos del Sur");
        l4.active = false;
        l4.municipality = Some("Ponce".to_string());
        l4.distance_km = Some(0.5);

        vec![l1, l2, l3, l4]
    }

    #[test]
    fn test_alphabetical_is_non_decreasing() {
        let state = FilterState::new();
        let result = apply_filters(&candidates(), &state, None);

        // Active block sorted, then the placeholder block
        let active_names: Vec<&str> = result
            .iter()
            .filter(|l| l.active)
            .map(|l| l.name.as_str())
            .collect();
        let mut sorted = active_names.clone();
        sorted.sort_by_key(|n| normalize_text(n));
        assert_eq!(active_names, sorted);
    }

    #[test]
    fn test_featured_first_partition() {
        let state = FilterState::new();
        let result = apply_filters(&candidates(), &state, None);

        let first_placeholder = result.iter().position(|l| !l.active).unwrap();
        assert!(result[first_placeholder..].iter().all(|l| !l.active));
        assert!(result[..first_placeholder].iter().all(|l| l.active));
    }

    #[test]
    fn test_distance_sort_without_partition() {
        let mut state = FilterState::new();
        state.sort = SortMode::Distance;
        state.featured_first = false;

        let user = Coordinate::new(18.0, -66.6);
        let result = apply_filters(&candidates(), &state, Some(user));

        let distances: Vec<f64> = result.iter().filter_map(|l| l.distance_km).collect();
        let mut sorted = distances.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(distances, sorted);
    }

    #[test]
    fn test_distance_sort_falls_back_without_coordinate() {
        let mut state = FilterState::new();
        state.sort = SortMode::Distance;

        assert_eq!(state.effective_sort(None), SortMode::Alphabetical);
        // Must not panic, must still return everything
        let result = apply_filters(&candidates(), &state, None);
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_text_search_matches_normalized_substring() {
        let mut state = FilterState::new();
        state.text = "panaderia".to_string();

        let result = apply_filters(&candidates(), &state, None);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 2);
    }

    #[test]
    fn test_short_term_does_not_filter() {
        let mut state = FilterState::new();
        state.text = "pa".to_string();

        let result = apply_filters(&candidates(), &state, None);
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_text_search_overrides_municipality() {
        let mut state = FilterState::new();
        state.text = "pizzeria".to_string();
        state.municipality = Some("Ponce".to_string());

        // Pizzeria Bella is in Cayey; with a >=3-char term the
        // municipality filter must be inert
        let result = apply_filters(&candidates(), &state, None);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 3);
    }

    #[test]
    fn test_municipality_filter_without_text() {
        let mut state = FilterState::new();
        state.municipality = Some("Ponce".to_string());

        let result = apply_filters(&candidates(), &state, None);
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|l| l.municipality.as_deref() == Some("Ponce")));
    }

    #[test]
    fn test_menu_matches_extend_text_search() {
        let mut state = FilterState::new();
        state.text = "mofongo".to_string();
        // No listing has "mofongo" in its name, but listing 2's menu does
        state.menu_matches = MenuMatches {
            by_dish: vec![2],
            by_menu: vec![],
        };

        let result = apply_filters(&candidates(), &state, None);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 2);
    }

    #[test]
    fn test_open_now_and_favorites_predicates() {
        let mut state = FilterState::new();
        state.open_now = true;
        let result = apply_filters(&candidates(), &state, None);
        assert!(result.iter().all(|l| l.open_now));

        let mut state = FilterState::new();
        state.favorites_only = true;
        let result = apply_filters(&candidates(), &state, None);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 3);
    }

    #[test]
    fn test_subcategory_filter() {
        let mut items = candidates();
        items[0].subcategory_ids = vec![9];

        let mut state = FilterState::new();
        state.subcategory = Some(9);

        let result = apply_filters(&items, &state, None);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 1);
    }

    #[test]
    fn test_sort_mode_parse() {
        assert_eq!(SortMode::parse("az"), Some(SortMode::Alphabetical));
        assert_eq!(SortMode::parse("RECENT"), Some(SortMode::Newest));
        assert_eq!(SortMode::parse("location"), Some(SortMode::Distance));
        assert_eq!(SortMode::parse("random"), None);
    }

    proptest! {
        /// Featured-first law: every active index precedes every inactive
        /// index, for any mix of candidates.
        #[test]
        fn featured_first_partition_law(actives in proptest::collection::vec(any::<bool>(), 0..40)) {
            let items: Vec<Listing> = actives
                .iter()
                .enumerate()
                .map(|(i, active)| {
                    let mut l = listing(i as i64, &format!("L{}", i));
                    l.active = *active;
                    l
                })
                .collect();

            let state = FilterState::new();
            let result = apply_filters(&items, &state, None);

            prop_assert_eq!(result.len(), items.len());
            let first_placeholder = result.iter().position(|l| !l.active);
            if let Some(pos) = first_placeholder {
                prop_assert!(result[pos..].iter().all(|l| !l.active));
            }
        }
    }
}
