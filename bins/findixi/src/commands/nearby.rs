//! `findixi nearby` - suggestions around a point

use anyhow::Result;
use clap::Args;
use findixi_cli::output::{format_count, Status};
use findixi_cli::progress;
use findixi_core::error::exit_codes;
use findixi_geo::Coordinate;
use findixi_listings::{card_for, BrowseSession, NEARBY_LIMIT};

/// Arguments of `findixi nearby`
#[derive(Args, Debug)]
pub struct NearbyArgs {
    /// Reference latitude
    #[arg(long)]
    pub lat: f64,

    /// Reference longitude
    #[arg(long)]
    pub lon: f64,

    /// Radius in kilometers
    #[arg(short, long, default_value = "15")]
    pub radius: f64,

    /// Category id filter
    #[arg(short, long)]
    pub category: Option<i64>,

    /// Only listings open right now
    #[arg(long)]
    pub open_now: bool,

    /// Maximum suggestions to print
    #[arg(short, long, default_value_t = NEARBY_LIMIT)]
    pub limit: usize,
}

/// Run the nearby command
pub async fn run(args: NearbyArgs, json: bool) -> Result<i32> {
    let coordinate = Coordinate::new(args.lat, args.lon);
    if !coordinate.is_valid() {
        Status::error("Coordinates out of range.");
        return Ok(exit_codes::VALIDATION_ERROR);
    }

    let mut session = BrowseSession::new(super::backend_client()?, super::routing_client()?);
    session.set_location(Some(coordinate));
    session.filter.category = args.category;
    session.filter.open_now = args.open_now;

    let pb = progress::spinner("Looking around...");
    let suggestions = session
        .nearby_suggestions_within(args.radius, args.limit)
        .await?;
    progress::finish_success(&pb, "Done");

    if json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        return Ok(exit_codes::SUCCESS);
    }

    if suggestions.is_empty() {
        Status::warning(&format!("Nothing within {} km.", args.radius));
        return Ok(exit_codes::SUCCESS);
    }

    Status::header(&format!(
        "{} within {} km",
        format_count(suggestions.len(), "listing", "listings"),
        args.radius
    ));
    for listing in &suggestions {
        super::search::print_card(&card_for(listing));
    }

    Ok(exit_codes::SUCCESS)
}
