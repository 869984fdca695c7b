//! Routed driving distances and progressive refinement for Findixi
//!
//! Straight-line distances are good enough to order a result page, but
//! the distance a driver actually covers can differ wildly on an island
//! crossed by mountain roads. This crate provides:
//!
//! - An OSRM-style [`OsrmClient`] returning routed distance and duration
//! - A [`RefinementEngine`] that progressively corrects the visible head
//!   of a result list, memoized per listing, guarded against re-entrant
//!   passes
//!
//! # Example
//!
//! ```rust,no_run
//! use findixi_routing::{OsrmClient, RefinementEngine};
//!
//! # fn run() -> Result<(), findixi_routing::RoutingError> {
//! let engine = RefinementEngine::new(OsrmClient::new()?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod client;
mod error;
mod refine;

pub use client::{DrivingRoute, OsrmClient, RoutingClient};
pub use error::{RoutingError, RoutingResult};
pub use refine::{
    Refinable, RefinedDistance, RefinementEngine, RefinementOutcome, RESORT_THRESHOLD,
    VISIBLE_REFINEMENT_LIMIT,
};
