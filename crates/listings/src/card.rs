//! Card view models
//!
//! One listing renders as one card, in exactly one of two variants chosen
//! by the `active` flag: a full card for onboarded listings, a placeholder
//! card for the rest. The variant is a tagged union dispatched through
//! [`card_for`]; renderers (terminal, web) consume the data and never
//! re-check the flag themselves.

use crate::model::Listing;
use serde::{Deserialize, Serialize};

/// Data shared by both card variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardData {
    /// Listing id
    pub id: i64,
    /// Title line: name, with the branch label appended when present
    pub title: String,
    /// Municipality line
    pub municipality: Option<String>,
    /// Open right now
    pub open_now: bool,
    /// Distance line, e.g. `4.2 km`
    pub distance_text: Option<String>,
    /// Travel line, e.g. `12 min`
    pub travel_text: Option<String>,
    /// Formatted phone line
    pub phone: Option<String>,
    /// Favorite marker for the signed-in user
    pub favorite: bool,
}

/// A listing card in one of its two variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum ListingCard {
    /// Fully onboarded listing
    Active(CardData),
    /// Placeholder for a listing that has not completed onboarding
    Placeholder(CardData),
}

impl ListingCard {
    /// The shared card data, whichever the variant
    #[must_use]
    pub fn data(&self) -> &CardData {
        match self {
            Self::Active(data) | Self::Placeholder(data) => data,
        }
    }

    /// True for the active variant
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }
}

/// Build the card for a listing. The variant follows the `active` flag
/// and nothing else.
#[must_use]
pub fn card_for(listing: &Listing) -> ListingCard {
    let title = match listing.branch_label.as_deref() {
        Some(branch) => format!("{} · {}", listing.name, branch),
        None => listing.name.clone(),
    };

    let data = CardData {
        id: listing.id,
        title,
        municipality: listing.municipality.clone(),
        open_now: listing.open_now,
        distance_text: listing
            .distance_km
            .filter(|d| d.is_finite())
            .map(|d| format!("{:.1} km", d)),
        travel_text: listing.travel.as_ref().map(|t| t.text.clone()),
        phone: listing.display_phone(),
        favorite: listing.favorite,
    };

    if listing.active {
        ListingCard::Active(data)
    } else {
        ListingCard::Placeholder(data)
    }
}

/// Number of cards per grid row
pub const CARDS_PER_ROW: usize = 2;

/// A banner is interleaved after this many complete rows
pub const ROWS_PER_BANNER: usize = 4;

/// Card indices after which a banner slot is interleaved.
///
/// One slot after every fourth complete row, never after the final row;
/// the closing banner below the grid is separate.
#[must_use]
pub fn banner_slots(card_count: usize) -> Vec<usize> {
    let mut slots = Vec::new();
    let cards_per_banner = CARDS_PER_ROW * ROWS_PER_BANNER;

    if card_count == 0 {
        return slots;
    }

    let mut position = cards_per_banner;
    while position < card_count {
        slots.push(position - 1);
        position += cards_per_banner;
    }

    slots
}
