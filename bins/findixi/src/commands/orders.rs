//! `findixi orders` - show or watch a listing's pickup board

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use findixi_cli::output::{format_money, Status};
use findixi_core::error::exit_codes;
use findixi_orders::{AlertLevel, BoardFilter, BoardWatcher, Order, OrderBoard};
use owo_colors::OwoColorize;
use tokio::sync::{mpsc, oneshot};

/// Arguments of `findixi orders`
#[derive(Args, Debug)]
pub struct OrdersArgs {
    /// Listing id whose board to show
    #[arg(short, long)]
    pub listing: i64,

    /// Acting user id (board access is verified when given)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Stage filter: all, sent, preparing, ready
    #[arg(long, default_value = "all")]
    pub stage: String,

    /// Advance this order to its next stage, then show the board
    #[arg(long)]
    pub advance: Option<i64>,

    /// Keep the board live (1 s tick, 15 s poll) until interrupted
    #[arg(short, long)]
    pub watch: bool,
}

/// Run the orders command
pub async fn run(args: OrdersArgs, json: bool) -> Result<i32> {
    let client = super::backend_client()?;
    let api = client.orders();

    if let Some(user) = &args.user {
        if !api.verify_board_access(user, args.listing).await? {
            Status::error("You do not have access to this listing's board.");
            return Ok(exit_codes::AUTH_ERROR);
        }
    }

    let filter = match args.stage.to_lowercase().as_str() {
        "all" => BoardFilter::All,
        "sent" => BoardFilter::Sent,
        "preparing" => BoardFilter::Preparing,
        "ready" => BoardFilter::Ready,
        other => {
            Status::error(&format!("Unknown stage filter: {}", other));
            return Ok(exit_codes::VALIDATION_ERROR);
        }
    };

    let title = api
        .listing_name(args.listing)
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| format!("Listing {}", args.listing));

    let watcher = BoardWatcher::new(api, args.listing);
    let mut board = OrderBoard::new();
    board.set_filter(filter);

    watcher.reload(&mut board).await?;

    if let Some(order_id) = args.advance {
        if watcher.advance_order(&mut board, order_id).await? {
            Status::success(&format!("Order #{} advanced.", order_id));
        } else {
            Status::warning(&format!(
                "Order #{} has no next step (delivered or unknown).",
                order_id
            ));
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&board.filtered())?);
        return Ok(exit_codes::SUCCESS);
    }

    if !args.watch {
        render_board(&title, &board);
        return Ok(exit_codes::SUCCESS);
    }

    // Live mode: ctrl-c resolves the shutdown signal. The push channel
    // stays open but empty here; a realtime transport would feed it.
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let (_event_tx, event_rx) = mpsc::channel(32);

    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = shutdown_tx.send(());
    });

    let mut last_fingerprint = String::new();
    watcher
        .run(&mut board, event_rx, shutdown_rx, |board| {
            let fingerprint: String = board
                .orders()
                .iter()
                .map(|o| format!("{}:{:?};", o.id, o.stage))
                .collect();

            if fingerprint != last_fingerprint {
                last_fingerprint = fingerprint;
                println!();
                render_board(&title, board);
            } else {
                render_status_line(board);
            }
        })
        .await?;

    println!();
    Status::info("Board closed.");
    Ok(exit_codes::SUCCESS)
}

/// Print the full board
fn render_board(title: &str, board: &OrderBoard) {
    let now = Utc::now();
    let counts = board.counts();

    Status::header(&format!("Pickup orders · {}", title));
    println!(
        "  active {}  |  sent {}  |  preparing {}  |  ready {}",
        counts.active().to_string().bold(),
        counts.sent,
        counts.preparing,
        counts.ready
    );

    if board.unaccepted() > 0 {
        Status::warning(&format!(
            "{} order(s) waiting for acceptance!",
            board.unaccepted()
        ));
    }

    for order in board.filtered() {
        render_order(order, board, now);
    }

    if board.filtered().is_empty() {
        println!("  {}", "No orders in this view.".dimmed());
    }
}

/// Print one ticket
fn render_order(order: &Order, board: &OrderBoard, now: chrono::DateTime<Utc>) {
    let alert = findixi_orders::alert_for(
        order.stage,
        order.elapsed_total(now),
        order.elapsed_since_update(now),
    );

    let elapsed = order.elapsed_display(now);
    let elapsed = match alert.level {
        Some(AlertLevel::Red) => format!("{}", elapsed.red().bold()),
        Some(AlertLevel::Yellow) => format!("{}", elapsed.yellow()),
        Some(AlertLevel::Green) => format!("{}", elapsed.green()),
        None => elapsed,
    };

    println!();
    println!(
        "  #{} {} [{}] {}",
        order.id.to_string().bold(),
        order.customer_name.as_deref().unwrap_or("Walk-in"),
        order.stage.label(),
        elapsed
    );

    for line in &order.lines {
        println!(
            "    {} x {}  {}",
            line.qty,
            line.name,
            format_money(line.line_total()).dimmed()
        );
        for group in &line.modifier_groups {
            let options: Vec<String> = group
                .options
                .iter()
                .map(|o| match o.extra_price {
                    Some(extra) => format!("{} (+{})", o.name, format_money(extra)),
                    None => o.name.clone(),
                })
                .collect();
            println!("      {}: {}", group.name.dimmed(), options.join(", ").dimmed());
        }
        if let Some(note) = &line.note {
            println!("      {} {}", "note:".dimmed(), note.dimmed());
        }
    }

    print!("    total {}", format_money(order.total()).bold());
    if let Some(action) = board.transition_for(order.id) {
        println!("  →  next: {}", action.label);
    } else {
        println!();
    }
}

/// Update the single ticking line between full renders
fn render_status_line(board: &OrderBoard) {
    use std::io::Write;

    let now = Utc::now();
    let counts = board.counts();
    let alerts = board.alerts(now);

    let alarm = match alerts.worst().level {
        Some(AlertLevel::Red) => " [OVERDUE]",
        Some(AlertLevel::Yellow) => " [running long]",
        Some(AlertLevel::Green) => " [pickup waiting]",
        None => "",
    };

    print!(
        "\r  {} active · {} sent · {} preparing · {} ready{}   ",
        counts.active(),
        counts.sent,
        counts.preparing,
        counts.ready,
        alarm
    );
    let _ = std::io::stdout().flush();
}
