//! `findixi health` - backend and routing reachability

use anyhow::Result;
use findixi_cli::output::Status;
use findixi_core::error::exit_codes;
use findixi_geo::Coordinate;
use findixi_routing::RoutingClient;
use serde_json::json;
use std::time::Instant;

/// Run the health command
pub async fn run(detailed: bool, json_output: bool) -> Result<i32> {
    let client = super::backend_client()?;

    let backend = client.health().check().await?;

    // Probe routing with a short, always-routable leg
    let routing = super::routing_client()?;
    let routing_start = Instant::now();
    let routing_result = routing
        .driving_route(
            Coordinate::new(18.4655, -66.1057),
            Coordinate::new(18.4037, -66.0636),
        )
        .await;
    let routing_latency = routing_start.elapsed().as_millis();
    let routing_ok = matches!(routing_result, Ok(Some(_)));

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "backend": backend,
                "routing": {
                    "reachable": routing_ok,
                    "latency_ms": routing_latency,
                },
            }))?
        );
        return Ok(if backend.reachable && routing_ok {
            exit_codes::SUCCESS
        } else {
            exit_codes::BACKEND_ERROR
        });
    }

    Status::header("Findixi health");

    if backend.reachable {
        Status::success(&format!("Backend reachable ({} ms)", backend.latency_ms));
    } else {
        Status::error(&format!(
            "Backend unreachable: {}",
            backend.error.as_deref().unwrap_or("unknown error")
        ));
    }

    if routing_ok {
        Status::success(&format!("Routing reachable ({} ms)", routing_latency));
    } else {
        match routing_result {
            Ok(None) => Status::warning("Routing reachable but found no route for the probe"),
            Err(e) => Status::error(&format!("Routing unreachable: {}", e)),
            Ok(Some(_)) => unreachable!(),
        }
    }

    if detailed {
        Status::subheader("Configuration");
        println!("  backend: {}", client.config().base_url);
        println!("  routing: {}", routing.base_url());
        println!("  environment: {:?}", client.config().environment);
        println!("  circuit: {:?}", client.circuit_state());
    }

    Ok(if backend.reachable {
        exit_codes::SUCCESS
    } else {
        exit_codes::BACKEND_ERROR
    })
}
