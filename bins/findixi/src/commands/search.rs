//! `findixi search` - run the browse pipeline and print cards

use anyhow::Result;
use clap::Args;
use findixi_cli::output::{format_count, Status};
use findixi_cli::progress;
use findixi_core::cache::Cache;
use findixi_core::error::exit_codes;
use findixi_geo::Coordinate;
use findixi_listings::{
    banner_slots, card_for, BrowseSession, ListingCard, MunicipalityResolver, NominatimGeocoder,
    SortMode,
};
use owo_colors::OwoColorize;

/// Arguments of `findixi search`
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Free-text search term
    #[arg(short, long)]
    pub text: Option<String>,

    /// Municipality filter
    #[arg(short, long)]
    pub municipality: Option<String>,

    /// Category id filter
    #[arg(short, long)]
    pub category: Option<i64>,

    /// Subcategory id filter
    #[arg(long)]
    pub subcategory: Option<i64>,

    /// Sort mode: az, recent, distance
    #[arg(short, long, default_value = "az")]
    pub sort: String,

    /// Only listings open right now
    #[arg(long)]
    pub open_now: bool,

    /// User latitude (enables distance sorting and refinement)
    #[arg(long, requires = "lon")]
    pub lat: Option<f64>,

    /// User longitude
    #[arg(long, requires = "lat")]
    pub lon: Option<f64>,

    /// Postal code, used to resolve a municipality when none is given
    #[arg(long)]
    pub postal_code: Option<String>,

    /// Pages to fetch (each page is one "load more")
    #[arg(short, long, default_value = "1")]
    pub pages: u32,

    /// Refine visible distances through the routing service
    #[arg(short, long)]
    pub refine: bool,
}

/// Run the search command
pub async fn run(args: SearchArgs, json: bool) -> Result<i32> {
    let Some(sort) = SortMode::parse(&args.sort) else {
        Status::error(&format!("Unknown sort mode: {}", args.sort));
        return Ok(exit_codes::VALIDATION_ERROR);
    };

    let client = super::backend_client()?;
    let routing = super::routing_client()?;
    let mut session = BrowseSession::new(client.clone(), routing);

    let coordinate = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
        _ => None,
    };
    session.set_location(coordinate);
    session.set_sort(sort);

    if let Some(municipality) = args.municipality {
        session.select_municipality(Some(municipality));
    } else if args.postal_code.is_some() || coordinate.is_some() {
        // No explicit municipality: resolve one like the page does
        let resolver = MunicipalityResolver::new(
            client.municipalities(),
            NominatimGeocoder::new()?,
            Cache::default_cache().ok(),
        );
        if let Some(detected) = resolver.resolve(args.postal_code.as_deref(), coordinate).await {
            Status::info(&format!("Municipality detected: {}", detected));
            session.set_detected_municipality(detected);
        }
    }

    session.filter.category = args.category;
    session.filter.subcategory = args.subcategory;
    session.filter.open_now = args.open_now;

    if let Some(text) = args.text {
        session.set_text(text).await;
    }

    let pb = progress::spinner("Loading listings...");
    session.load(false).await?;
    for _ in 1..args.pages {
        if !session.can_load_more() {
            break;
        }
        session.load(true).await?;
    }
    progress::finish_success(&pb, "Listings loaded");

    let view = if args.refine && session.location().is_some() {
        let (view, outcome) = session.refined_view().await;
        if outcome.refined > 0 {
            Status::info(&format!(
                "{} refined through routing{}",
                format_count(outcome.refined, "distance", "distances"),
                if outcome.needs_resort { ", order changed" } else { "" }
            ));
        }
        view
    } else {
        session.visible()
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(exit_codes::SUCCESS);
    }

    if view.is_empty() {
        Status::warning("No results for the current filters.");
        let suggestions = session.nearby_suggestions().await?;
        if suggestions.is_empty() {
            Status::info("No nearby suggestions either.");
        } else {
            Status::header("Nearby you might like");
            for listing in &suggestions {
                print_card(&card_for(listing));
            }
        }
        return Ok(exit_codes::SUCCESS);
    }

    Status::header(&format!(
        "{} found",
        format_count(view.len(), "listing", "listings")
    ));

    let banner_after = banner_slots(view.len());
    for (index, listing) in view.iter().enumerate() {
        print_card(&card_for(listing));
        if banner_after.contains(&index) {
            println!("{}", "─── sponsored ───".dimmed());
        }
    }

    if session.can_load_more() {
        Status::info("More results available (raise --pages).");
    }

    Ok(exit_codes::SUCCESS)
}

/// Print one card line; placeholders render dimmed
pub fn print_card(card: &ListingCard) {
    let data = card.data();

    let open = if data.open_now {
        format!("{}", "● open".green())
    } else {
        format!("{}", "○ closed".dimmed())
    };

    let favorite = if data.favorite { " ♥" } else { "" };

    let distance = match (&data.distance_text, &data.travel_text) {
        (Some(distance), Some(travel)) => format!("  {} · {}", distance, travel),
        (Some(distance), None) => format!("  {}", distance),
        _ => String::new(),
    };

    let place = data
        .municipality
        .as_deref()
        .map(|m| format!(" — {}", m))
        .unwrap_or_default();

    match card {
        ListingCard::Active(_) => {
            println!(
                "  {}{}{} [{}]{}",
                data.title.bold(),
                favorite,
                place,
                open,
                distance
            );
            if let Some(phone) = &data.phone {
                println!("    {}", phone.dimmed());
            }
        }
        ListingCard::Placeholder(_) => {
            println!(
                "  {}{} {}",
                data.title.dimmed(),
                place.dimmed(),
                "(not yet onboarded)".dimmed()
            );
        }
    }
}
