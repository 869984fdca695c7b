//! Browse/search domain for the Findixi directory
//!
//! Everything between the backend's candidate rows and a rendered result
//! grid lives here:
//!
//! - [`Listing`]: the transient entity one page works with
//! - [`FilterState`] + [`apply_filters`]: pure client-side refinement
//!   (text, municipality, open-now, favorites, featured-first partition)
//! - [`card_for`]: the active/placeholder card union
//! - [`Plan`]: tier-based capability gating
//! - [`MunicipalityResolver`]: postal-code and reverse-geocode resolution
//! - [`BrowseSession`]: the page controller composing remote query,
//!   enrichment, refinement and the nearby-suggestions fallback
//!
//! # Example
//!
//! ```rust,no_run
//! use findixi_api_client::FindixiClient;
//! use findixi_listings::BrowseSession;
//! use findixi_routing::OsrmClient;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = BrowseSession::new(FindixiClient::new()?, OsrmClient::new()?);
//! session.set_text("pizza").await;
//! session.load(false).await?;
//!
//! for listing in session.visible() {
//!     println!("{}", listing.name);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod browse;
mod card;
mod enrich;
mod filter;
mod location;
mod model;
mod municipality;
mod pagination;
mod plan;

pub use browse::{BrowseSession, NEARBY_LIMIT, NEARBY_RADIUS_KM};
pub use card::{banner_slots, card_for, CardData, ListingCard, CARDS_PER_ROW, ROWS_PER_BANNER};
pub use enrich::{merge_branch_labels, merge_favorites};
pub use filter::{apply_filters, sort_listings, FilterState, SortMode, TEXT_FILTER_MIN_CHARS};
pub use location::{FixedLocation, LocationError, LocationProvider, NoLocation};
pub use model::Listing;
pub use municipality::{
    GeocodeError, GeocodedPlace, MunicipalityResolver, NominatimGeocoder, ReverseGeocoder,
};
pub use pagination::Pagination;
pub use plan::{Plan, PlanCapabilities, PlanTier};
