//! Pickup order board for Findixi merchants
//!
//! Staff-facing board of one listing's pickup orders:
//!
//! - [`Stage`]: the strict linear status chain
//!   (Sent → Preparing → Ready → Delivered)
//! - [`alert_for`]: elapsed-time alert thresholds, recomputed every tick
//! - [`OrderBoard`]: active orders, stage filters, counters, alarms
//! - [`BoardWatcher`]: the live loop (1 s tick, 15 s fallback poll,
//!   coalesced reloads from push events)
//!
//! # Example
//!
//! ```rust,no_run
//! use findixi_api_client::FindixiClient;
//! use findixi_orders::{BoardWatcher, OrderBoard};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = FindixiClient::new()?;
//! let watcher = BoardWatcher::new(client.orders(), 12);
//!
//! let mut board = OrderBoard::new();
//! watcher.reload(&mut board).await?;
//! println!("{} active orders", board.counts().active());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod alert;
mod board;
mod model;
mod status;
mod watch;

pub use alert::{
    alert_for, Alert, AlertLevel, PREPARING_CRITICAL_MINS, PREPARING_WARN_MINS,
    READY_REMINDER_MINS,
};
pub use board::{BoardAlerts, BoardFilter, OrderBoard, StageCounts};
pub use model::{ModifierGroup, ModifierOption, Order, OrderLine};
pub use status::{Stage, StageAction};
pub use watch::{BoardWatcher, ChangeEvent, ReloadCoalescer, WatchConfig};
