//! The browse page controller
//!
//! [`BrowseSession`] owns everything one listing page used to keep in
//! ambient globals: the filter record, the user's coordinate, the
//! candidate list, the pagination cursor and the refinement engine. The
//! pipeline for one render is:
//!
//! 1. Remote query (search RPC, plus a reinforcement fetch for menu
//!    matches under a text search)
//! 2. Enrichment (branch labels, favorite membership), best effort
//! 3. Client-side refinement (filter, sort, featured-first partition)
//! 4. Progressive distance refinement of the visible head
//!
//! Zero-result renders fall back to nearby suggestions around the user
//! or the selected municipality's centroid.

use crate::enrich::{merge_branch_labels, merge_favorites};
use crate::filter::{apply_filters, FilterState, SortMode};
use crate::model::Listing;
use crate::pagination::Pagination;
use findixi_api_client::{ApiResult, FindixiClient, SearchParams};
use findixi_geo::Coordinate;
use findixi_routing::{RefinementEngine, RefinementOutcome, RoutingClient};
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

/// Radius of the nearby-suggestions fallback, in km
pub const NEARBY_RADIUS_KM: f64 = 15.0;

/// Maximum nearby suggestions shown under an empty result
pub const NEARBY_LIMIT: usize = 10;

/// Page size of the reinforcement fetch for menu matches
const REINFORCEMENT_LIMIT: u32 = 200;

/// Candidate pool requested for the nearby fallback before plan gating
const NEARBY_POOL_LIMIT: u32 = 30;

/// One browse page's state and pipeline
pub struct BrowseSession<R> {
    client: FindixiClient,
    engine: RefinementEngine<R>,
    /// The page's filter record
    pub filter: FilterState,
    user_coordinate: Option<Coordinate>,
    user_id: Option<String>,
    detected_municipality: Option<String>,
    manual_municipality: bool,
    use_detected: bool,
    manual_sort: bool,
    listings: Vec<Listing>,
    pagination: Pagination,
    suggestions_shown: bool,
}

impl<R: RoutingClient> BrowseSession<R> {
    /// Create a session around a backend client and a routing client
    pub fn new(client: FindixiClient, routing: R) -> Self {
        Self {
            client,
            engine: RefinementEngine::new(routing),
            filter: FilterState::new(),
            user_coordinate: None,
            user_id: None,
            detected_municipality: None,
            manual_municipality: false,
            use_detected: true,
            manual_sort: false,
            listings: Vec::new(),
            pagination: Pagination::new(),
            suggestions_shown: false,
        }
    }

    /// Attach the signed-in user (enables favorite membership)
    pub fn set_user(&mut self, user_id: impl Into<String>) {
        self.user_id = Some(user_id.into());
    }

    /// Record the user's coordinate (or its loss).
    ///
    /// Gaining a coordinate switches to distance ordering unless the user
    /// picked a sort mode themselves; losing it falls back to
    /// alphabetical the same way. Existing candidates get their
    /// straight-line distances recomputed.
    pub fn set_location(&mut self, coordinate: Option<Coordinate>) {
        self.user_coordinate = coordinate.filter(Coordinate::is_valid);

        if !self.manual_sort {
            self.filter.sort = match self.user_coordinate {
                Some(_) => SortMode::Distance,
                None => SortMode::Alphabetical,
            };
        }

        if let Some(coordinate) = self.user_coordinate {
            for listing in &mut self.listings {
                listing.recompute_distance(coordinate);
            }
        }
    }

    /// The coordinate the pipeline is currently using
    #[must_use]
    pub fn location(&self) -> Option<Coordinate> {
        self.user_coordinate
    }

    /// Select a sort mode explicitly
    pub fn set_sort(&mut self, sort: SortMode) {
        self.manual_sort = true;
        self.filter.sort = sort;
    }

    /// Record the auto-detected municipality.
    ///
    /// Applies to the filter only until the first load completes or the
    /// user selects a municipality manually.
    pub fn set_detected_municipality(&mut self, municipality: impl Into<String>) {
        let municipality = municipality.into();
        self.detected_municipality = Some(municipality.clone());
        if !self.manual_municipality {
            self.filter.municipality = Some(municipality);
            self.use_detected = true;
        }
    }

    /// Select (or clear) the municipality filter manually
    pub fn select_municipality(&mut self, municipality: Option<String>) {
        self.manual_municipality = municipality.is_some();
        self.filter.municipality = municipality;
        self.use_detected = false;
    }

    /// Update the free-text term, refreshing menu matches when it is long
    /// enough to trigger the secondary lookups.
    #[instrument(skip(self))]
    pub async fn set_text(&mut self, term: impl Into<String> + std::fmt::Debug) {
        let term = term.into();
        self.filter.text = term.trim().to_string();

        self.filter.menu_matches = self.client.listings().menu_matches(&self.filter.text).await;
        debug!(
            by_dish = self.filter.menu_matches.by_dish.len(),
            by_menu = self.filter.menu_matches.by_menu.len(),
            "Menu matches refreshed"
        );
    }

    /// Load a page of candidates from the backend.
    ///
    /// `append = false` starts over at the first page; `append = true`
    /// extends the pool with the next page.
    #[instrument(skip(self))]
    pub async fn load(&mut self, append: bool) -> ApiResult<()> {
        if !append {
            self.pagination.reset();
            self.suggestions_shown = false;
        }

        let params = self.build_search_params(append);
        let listings_api = self.client.listings();
        let favorites_api = self.client.favorites();
        let user_id = self.user_id.clone();

        let (rows, favorite_ids) = tokio::join!(listings_api.search(&params), async {
            match user_id {
                Some(user_id) => favorites_api.ids_for_user(&user_id).await,
                None => HashSet::new(),
            }
        });
        let rows = rows?;
        let fetched = rows.len();

        // Reinforcement: a text call can miss listings matched only
        // through their menu content; pull those in a second, unfiltered
        // call and keep the menu-matched ones.
        let mut reinforcement = Vec::new();
        if params.is_text_search() && !self.filter.menu_matches.is_empty() {
            let matched_ids = self.filter.menu_matches.all_ids();
            let reinforcement_params = SearchParams {
                text: None,
                municipality: None,
                latitude: None,
                longitude: None,
                radius_km: None,
                limit: Some(REINFORCEMENT_LIMIT),
                offset: 0,
                ..params.clone()
            };

            match listings_api.search(&reinforcement_params).await {
                Ok(extra) => {
                    reinforcement = extra
                        .into_iter()
                        .filter(|row| matched_ids.contains(&row.id))
                        .collect();
                }
                Err(e) => warn!(error = %e, "Reinforcement fetch failed"),
            }
        }

        let reference = self.user_coordinate;
        let mut page: Vec<Listing> = Vec::new();
        let mut seen = HashSet::new();
        for row in rows.into_iter().chain(reinforcement) {
            if seen.insert(row.id) {
                page.push(Listing::from_row(row, reference));
            }
        }

        // Branch enrichment is best effort: on failure the page renders
        // without branch labels rather than not at all.
        let ids: Vec<i64> = page.iter().map(|l| l.id).collect();
        match listings_api.branch_rows(&ids).await {
            Ok(branch_rows) => merge_branch_labels(&mut page, &branch_rows),
            Err(e) => warn!(error = %e, "Branch enrichment failed, keeping bare page"),
        }

        merge_favorites(&mut page, &favorite_ids);

        self.pagination.record_fetch(fetched, append);
        if append {
            let existing: HashSet<i64> = self.listings.iter().map(|l| l.id).collect();
            self.listings
                .extend(page.into_iter().filter(|l| !existing.contains(&l.id)));
        } else {
            self.listings = page;
        }

        // The detected municipality only steers the very first load
        self.use_detected = false;

        Ok(())
    }

    /// The ordered display list for the current filter state
    #[must_use]
    pub fn visible(&self) -> Vec<Listing> {
        apply_filters(&self.listings, &self.filter, self.user_coordinate)
    }

    /// Whether a further page can be offered
    #[must_use]
    pub fn can_load_more(&self) -> bool {
        self.pagination.can_load_more()
    }

    /// The display list with routed distances applied to its visible head.
    ///
    /// Runs one refinement pass; when corrections are large enough to
    /// change ordering, the list is re-sorted with every cached
    /// correction applied before returning.
    pub async fn refined_view(&mut self) -> (Vec<Listing>, RefinementOutcome) {
        let mut view = self.visible();

        let Some(user) = self.user_coordinate else {
            return (view, RefinementOutcome::default());
        };

        let outcome = self.engine.refine(user, &mut view).await;

        // Keep the base pool in sync so later renders reuse corrections
        self.engine.apply_cached(&mut self.listings);

        if outcome.needs_resort {
            debug!("Routed corrections changed ordering, re-sorting");
            view = self.visible();
        }

        (view, outcome)
    }

    /// Nearby suggestions for an empty result set.
    ///
    /// Reference point: the user's coordinate, else the centroid of the
    /// municipality being filtered on. Suggestions are gated to plans
    /// that allow nearby placement and capped at [`NEARBY_LIMIT`]. Only
    /// one suggestion block is produced per render cycle.
    #[instrument(skip(self))]
    pub async fn nearby_suggestions(&mut self) -> ApiResult<Vec<Listing>> {
        self.nearby_suggestions_within(NEARBY_RADIUS_KM, NEARBY_LIMIT).await
    }

    /// [`Self::nearby_suggestions`] with an explicit radius and cap
    #[instrument(skip(self))]
    pub async fn nearby_suggestions_within(
        &mut self,
        radius_km: f64,
        limit: usize,
    ) -> ApiResult<Vec<Listing>> {
        if self.suggestions_shown {
            return Ok(Vec::new());
        }

        let reference = match self.user_coordinate {
            Some(coordinate) => Some(coordinate),
            None => match self.filter.municipality.as_deref() {
                Some(municipality) => {
                    self.client.municipalities().centroid(municipality).await?
                }
                None => None,
            },
        };

        let Some(reference) = reference else {
            return Ok(Vec::new());
        };

        let mut params = SearchParams::new()
            .active_only()
            .with_location(reference.latitude, reference.longitude, Some(radius_km))
            .with_limit(NEARBY_POOL_LIMIT);
        params.category = self.filter.category;
        if self.filter.open_now {
            params = params.open_now();
        }

        let rows = self.client.listings().search(&params).await?;

        let mut suggestions: Vec<Listing> = rows
            .into_iter()
            .map(|row| Listing::from_row(row, Some(reference)))
            .filter(|listing| listing.plan.capabilities.nearby)
            .collect();
        suggestions.truncate(limit);

        self.suggestions_shown = true;
        Ok(suggestions)
    }

    /// Build the RPC parameters for the next load
    fn build_search_params(&self, append: bool) -> SearchParams {
        let mut params = SearchParams::new()
            .with_text(self.filter.text.clone())
            .with_offset(if append { self.pagination.offset } else { 0 });

        if let Some(municipality) = self.effective_municipality() {
            params = params.with_municipality(municipality);
        }
        if let Some(category) = self.filter.category {
            params = params.with_category(category);
        }
        if let Some(subcategory) = self.filter.subcategory {
            params = params.with_subcategory(subcategory);
        }
        if let Some(coordinate) = self.user_coordinate {
            params = params.with_location(coordinate.latitude, coordinate.longitude, None);
        }
        if self.filter.open_now {
            params = params.open_now();
        }

        params
    }

    /// Municipality the next query should filter on: a manual selection
    /// always; the detected one only until the first load.
    fn effective_municipality(&self) -> Option<String> {
        if self.manual_municipality {
            return self.filter.municipality.clone();
        }
        if self.use_detected {
            return self.detected_municipality.clone();
        }
        None
    }
}
