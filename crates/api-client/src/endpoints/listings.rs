//! Listing search endpoints
//!
//! Wraps the server-side `search_listings_filtered` RPC plus the secondary
//! lookups the browse page issues around it:
//! - menu-item matching (dish names and menu titles)
//! - branch-label enrichment with schema-drift fallback

use crate::client::FindixiClient;
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// Server page size for the search RPC
pub const SEARCH_PAGE_SIZE: u32 = 25;

/// Free-text terms shorter than this never trigger secondary lookups
const MENU_MATCH_MIN_CHARS: usize = 3;

/// Listing search and enrichment API
#[derive(Clone)]
pub struct ListingsApi {
    client: FindixiClient,
}

impl ListingsApi {
    /// Create a new listings API interface
    pub(crate) fn new(client: FindixiClient) -> Self {
        Self { client }
    }

    /// Run the filtered search RPC
    ///
    /// POST /rest/v1/rpc/search_listings_filtered
    pub async fn search(&self, params: &SearchParams) -> ApiResult<Vec<ListingRow>> {
        let payload = params.to_rpc_payload();
        self.client.rpc("search_listings_filtered", &payload).await
    }

    /// Resolve listing ids whose menu content matches a free-text term.
    ///
    /// Terms shorter than three characters return empty sets without
    /// touching the network. Lookup failures degrade to empty sets; a
    /// broken secondary search must not take down the primary one.
    pub async fn menu_matches(&self, term: &str) -> MenuMatches {
        let term = term.trim();
        if term.chars().count() < MENU_MATCH_MIN_CHARS {
            return MenuMatches::default();
        }

        let (by_dish, by_menu) = tokio::join!(self.ids_by_dish(term), self.ids_by_menu(term));

        MenuMatches {
            by_dish: by_dish.unwrap_or_else(|e| {
                warn!(error = %e, "Dish-name match failed");
                Vec::new()
            }),
            by_menu: by_menu.unwrap_or_else(|e| {
                warn!(error = %e, "Menu-title match failed");
                Vec::new()
            }),
        }
    }

    /// Listing ids owning a dish whose name matches the term
    async fn ids_by_dish(&self, term: &str) -> ApiResult<Vec<i64>> {
        #[derive(Deserialize)]
        struct DishRow {
            menu_id: Option<i64>,
        }

        let path = format!(
            "dishes?select=menu_id&name=ilike.{}",
            encode_like_pattern(term)
        );
        let dishes: Vec<DishRow> = self.client.get(&path).await?;

        let menu_ids: BTreeSet<i64> = dishes.into_iter().filter_map(|d| d.menu_id).collect();
        if menu_ids.is_empty() {
            return Ok(Vec::new());
        }

        #[derive(Deserialize)]
        struct MenuRow {
            listing_id: Option<i64>,
        }

        let path = format!(
            "menus?select=listing_id&id=in.({})",
            join_ids(menu_ids.iter())
        );
        let menus: Vec<MenuRow> = self.client.get(&path).await?;

        let ids: BTreeSet<i64> = menus.into_iter().filter_map(|m| m.listing_id).collect();
        Ok(ids.into_iter().collect())
    }

    /// Listing ids owning a menu whose title matches the term
    async fn ids_by_menu(&self, term: &str) -> ApiResult<Vec<i64>> {
        #[derive(Deserialize)]
        struct MenuRow {
            listing_id: Option<i64>,
        }

        let path = format!(
            "menus?select=listing_id&title=ilike.{}",
            encode_like_pattern(term)
        );
        let menus: Vec<MenuRow> = self.client.get(&path).await?;

        let ids: BTreeSet<i64> = menus.into_iter().filter_map(|m| m.listing_id).collect();
        Ok(ids.into_iter().collect())
    }

    /// Bulk branch-label rows for a set of listing ids.
    ///
    /// The branch columns have drifted across backend versions; if the
    /// full column set is rejected, retry with the reduced set before
    /// giving up.
    pub async fn branch_rows(&self, ids: &[i64]) -> ApiResult<Vec<BranchRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let id_list = join_ids(ids.iter());

        let full = format!(
            "listings?select=id,branch_name,is_branch&id=in.({})",
            id_list
        );
        match self.client.get::<Vec<BranchRow>>(&full).await {
            Ok(rows) => Ok(rows),
            Err(e) if e.is_missing_column() => {
                warn!(error = %e, "Branch columns missing, retrying reduced set");
                let reduced = format!("listings?select=id,branch_name&id=in.({})", id_list);
                self.client.get(&reduced).await
            }
            Err(e) => Err(e),
        }
    }
}

/// Parameters for the filtered search RPC
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    /// Free-text term; non-empty text suppresses geographic filtering
    pub text: Option<String>,
    /// Municipality name filter
    pub municipality: Option<String>,
    /// Category id filter
    pub category: Option<i64>,
    /// Subcategory id filter
    pub subcategory: Option<i64>,
    /// Restrict to active (fully onboarded) listings
    pub active_only: bool,
    /// Search center latitude
    pub latitude: Option<f64>,
    /// Search center longitude
    pub longitude: Option<f64>,
    /// Search radius in km (requires coordinates)
    pub radius_km: Option<f64>,
    /// Restrict to listings open right now
    pub open_now: bool,
    /// Page size (defaults to [`SEARCH_PAGE_SIZE`])
    pub limit: Option<u32>,
    /// Page offset
    pub offset: u32,
}

impl SearchParams {
    /// Create new params with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the free-text term
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.text = if text.trim().is_empty() {
            None
        } else {
            Some(text.trim().to_string())
        };
        self
    }

    /// Filter by municipality
    #[must_use]
    pub fn with_municipality(mut self, municipality: impl Into<String>) -> Self {
        self.municipality = Some(municipality.into());
        self
    }

    /// Filter by category
    #[must_use]
    pub fn with_category(mut self, category: i64) -> Self {
        self.category = Some(category);
        self
    }

    /// Filter by subcategory
    #[must_use]
    pub fn with_subcategory(mut self, subcategory: i64) -> Self {
        self.subcategory = Some(subcategory);
        self
    }

    /// Center the search on a coordinate with an optional radius
    #[must_use]
    pub fn with_location(mut self, latitude: f64, longitude: f64, radius_km: Option<f64>) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self.radius_km = radius_km;
        self
    }

    /// Restrict to active listings only
    #[must_use]
    pub fn active_only(mut self) -> Self {
        self.active_only = true;
        self
    }

    /// Restrict to listings open right now
    #[must_use]
    pub fn open_now(mut self) -> Self {
        self.open_now = true;
        self
    }

    /// Set the page offset
    #[must_use]
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether this search is text-driven
    #[must_use]
    pub fn is_text_search(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Build the RPC payload.
    ///
    /// Text search and geographic search are mutually exclusive in one
    /// call: a non-empty term nulls out municipality, coordinates and
    /// radius for that call.
    pub(crate) fn to_rpc_payload(&self) -> SearchRpcPayload {
        let text_search = self.is_text_search();

        SearchRpcPayload {
            p_text: if text_search { self.text.clone() } else { None },
            p_municipality: if text_search {
                None
            } else {
                self.municipality
                    .as_deref()
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(String::from)
            },
            p_category: self.category,
            p_subcategory: self.subcategory,
            p_active: if self.active_only { Some(true) } else { None },
            p_latitude: if text_search { None } else { self.latitude },
            p_longitude: if text_search { None } else { self.longitude },
            p_radius: if text_search { None } else { self.radius_km },
            p_open_now: if self.open_now { Some(true) } else { None },
            p_limit: self.limit.unwrap_or(SEARCH_PAGE_SIZE),
            p_offset: self.offset,
        }
    }
}

/// Wire payload of `search_listings_filtered`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SearchRpcPayload {
    pub p_text: Option<String>,
    pub p_municipality: Option<String>,
    pub p_category: Option<i64>,
    pub p_subcategory: Option<i64>,
    pub p_active: Option<bool>,
    pub p_latitude: Option<f64>,
    pub p_longitude: Option<f64>,
    pub p_radius: Option<f64>,
    pub p_open_now: Option<bool>,
    pub p_limit: u32,
    pub p_offset: u32,
}

/// One candidate row returned by the search RPC
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRow {
    /// Listing id
    pub id: i64,
    /// Display name
    pub name: Option<String>,
    /// Phone number as stored
    pub phone: Option<String>,
    /// Municipality name
    pub municipality: Option<String>,
    /// Latitude column, when present
    pub latitude: Option<f64>,
    /// Longitude column, when present
    pub longitude: Option<f64>,
    /// PostGIS location column, when the row predates the numeric columns
    #[serde(default)]
    pub location: Option<serde_json::Value>,
    /// Category ids via the join table
    #[serde(default)]
    pub category_ids: Option<Vec<i64>>,
    /// Legacy delimited category column, still present on old rows
    #[serde(default)]
    pub categories: Option<String>,
    /// Subcategory ids via the join table
    #[serde(default)]
    pub subcategory_ids: Option<Vec<i64>>,
    /// Server-computed open-right-now flag
    #[serde(default)]
    pub open_now: Option<bool>,
    /// Fully onboarded listing vs placeholder
    #[serde(default)]
    pub active: Option<bool>,
    /// Storage path of the logo object
    #[serde(default)]
    pub logo_path: Option<String>,
    /// Plan tier level (0-3), when the backend exposes it
    #[serde(default)]
    pub plan_level: Option<i32>,
    /// Explicit nearby-placement flag overriding the plan tier
    #[serde(default)]
    pub allows_nearby: Option<bool>,
}

/// Branch-label enrichment row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchRow {
    /// Listing id
    pub id: i64,
    /// Branch display label, e.g. "Plaza Las Américas"
    #[serde(default)]
    pub branch_name: Option<String>,
    /// Explicit branch flag (reduced column set omits it)
    #[serde(default)]
    pub is_branch: Option<bool>,
}

/// Listing-id sets matched through menu content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuMatches {
    /// Ids matched by dish name
    pub by_dish: Vec<i64>,
    /// Ids matched by menu title
    pub by_menu: Vec<i64>,
}

impl MenuMatches {
    /// Union of both id sets
    #[must_use]
    pub fn all_ids(&self) -> BTreeSet<i64> {
        self.by_dish.iter().chain(self.by_menu.iter()).copied().collect()
    }

    /// True when neither lookup matched anything
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_dish.is_empty() && self.by_menu.is_empty()
    }
}

/// Render ids as a PostgREST `in.(..)` list
fn join_ids<'a>(ids: impl Iterator<Item = &'a i64>) -> String {
    ids.map(i64::to_string).collect::<Vec<_>>().join(",")
}

/// Encode a term as an `ilike` pattern with wildcards on both sides
fn encode_like_pattern(term: &str) -> String {
    let escaped: String = term
        .chars()
        .map(|c| match c {
            ' ' => "%20".to_string(),
            '%' | '&' | '#' | '?' => format!("%{:02X}", c as u32),
            other => other.to_string(),
        })
        .collect();
    format!("*{}*", escaped)
}
