//! Findixi operator CLI
//!
//! Drives the directory's client pipelines from a terminal: the
//! nearby/listing search, the nearby-suggestions fallback, the pickup
//! order board, and backend health probes.

use clap::{Parser, Subcommand};
use findixi_core::error::exit_codes;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{health, nearby, orders, search};

/// Operator CLI for the Findixi local-commerce directory
#[derive(Parser)]
#[command(name = "findixi")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search listings with filters
    Search(search::SearchArgs),

    /// Nearby suggestions around a point
    Nearby(nearby::NearbyArgs),

    /// Show or watch a listing's pickup order board
    Orders(orders::OrdersArgs),

    /// Check backend and routing reachability
    Health {
        /// Include per-surface latencies
        #[arg(short, long)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    let json = cli.format.eq_ignore_ascii_case("json");

    let result = match cli.command {
        Commands::Search(args) => search::run(args, json).await,
        Commands::Nearby(args) => nearby::run(args, json).await,
        Commands::Orders(args) => orders::run(args, json).await,
        Commands::Health { detailed } => health::run(detailed, json).await,
    };

    match result {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            findixi_cli::output::Status::error(&format!("{e:#}"));
            ExitCode::from(u8::try_from(exit_codes::FAILURE).unwrap_or(1))
        }
    }
}
