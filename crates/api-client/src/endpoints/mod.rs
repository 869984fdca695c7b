//! Typed endpoint groups for the hosted backend
//!
//! Each group wraps one area of the REST/RPC surface:
//! - [`ListingsApi`]: the filtered search RPC, menu-item matching, branch
//!   enrichment
//! - [`MunicipalitiesApi`]: municipality rows, centroids, postal codes
//! - [`FavoritesApi`]: per-user favorite membership
//! - [`OrdersApi`]: the pickup order board tables
//! - [`HealthApi`]: backend reachability

mod favorites;
mod health;
mod listings;
mod municipalities;
mod orders;

pub use favorites::FavoritesApi;
pub use health::{BackendHealth, HealthApi};
pub use listings::{
    BranchRow, ListingRow, ListingsApi, MenuMatches, SearchParams, SEARCH_PAGE_SIZE,
};
pub use municipalities::{MunicipalitiesApi, MunicipalityRow};
pub use orders::{OrderLineRow, OrderRow, OrdersApi};
