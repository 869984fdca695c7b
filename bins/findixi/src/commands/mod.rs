//! CLI subcommands

pub mod health;
pub mod nearby;
pub mod orders;
pub mod search;

use anyhow::Result;
use findixi_api_client::FindixiClient;
use findixi_routing::OsrmClient;
use std::env;

/// Backend client from the environment
pub fn backend_client() -> Result<FindixiClient> {
    Ok(FindixiClient::new()?)
}

/// Routing client from `FINDIXI_ROUTING_URL`, or the default endpoint
pub fn routing_client() -> Result<OsrmClient> {
    let client = match env::var("FINDIXI_ROUTING_URL") {
        Ok(url) => OsrmClient::with_base_url(url)?,
        Err(_) => OsrmClient::new()?,
    };
    Ok(client)
}
