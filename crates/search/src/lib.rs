//! Text normalization and matching for Findixi listing search.
//!
//! This crate provides:
//! - Accent-stripped, lower-cased normalization for user-facing names
//! - Multi-level relevance scoring
//! - Levenshtein edit distance and simple fuzzy matching
//!
//! Listing names in the directory mix Spanish and English spelling
//! ("Panadería" vs "Panaderia"), so every comparison goes through
//! [`normalize_text`] first.

mod fuzzy;
mod normalize;
mod relevance;

pub use fuzzy::{fuzzy_match, levenshtein_distance};
pub use normalize::{normalize_text, normalized_contains};
pub use relevance::{calculate_relevance, RelevanceScore};

/// Search result with relevance score.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchResult<T> {
    /// The matched item
    pub item: T,
    /// Relevance score (higher is better)
    pub score: u32,
}
