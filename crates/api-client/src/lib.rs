//! Resilient client for the Findixi hosted backend
//!
//! The directory runs on a hosted Postgres-as-a-service backend: table
//! reads and writes over its REST surface, one server-side search RPC,
//! and public-URL derivation for the storage buckets. This crate wraps
//! that surface with the platform's resilience defaults:
//!
//! - Automatic retry with exponential backoff
//! - Circuit breaker to fail fast when the backend is down
//! - Per-table rate limiting
//! - Request correlation IDs threaded through `tracing`
//!
//! # Example
//!
//! ```rust,no_run
//! use findixi_api_client::{FindixiClient, SearchParams};
//!
//! # async fn run() -> Result<(), findixi_api_client::ApiError> {
//! let client = FindixiClient::new()?;
//!
//! let rows = client
//!     .listings()
//!     .search(&SearchParams::new().with_municipality("Rincón"))
//!     .await?;
//!
//! println!("{} candidates", rows.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod client;
mod config;
pub mod endpoints;
mod error;

pub use client::FindixiClient;
pub use config::{ClientConfig, Environment};
pub use endpoints::{
    BackendHealth, BranchRow, FavoritesApi, HealthApi, ListingRow, ListingsApi, MenuMatches,
    MunicipalitiesApi, MunicipalityRow, OrderLineRow, OrderRow, OrdersApi, SearchParams,
    SEARCH_PAGE_SIZE,
};
pub use error::{ApiError, ApiResult};
