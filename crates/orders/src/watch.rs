//! Live board updates
//!
//! Three timers drive a live board, mirroring what the page ran:
//!
//! - a 1-second presentation tick (elapsed clocks, alert recomputation)
//! - a 15-second fallback poll in case the push channel drops events
//! - a ~450 ms coalescing window that folds bursts of change events into
//!   one reload
//!
//! Change events arrive on a plain channel; the push transport that
//! produces them is an external collaborator. Events are filtered by
//! listing id, since the channel may carry changes for every merchant.

use crate::board::OrderBoard;
use crate::model::Order;
use findixi_api_client::{ApiResult, OrdersApi};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// A row-change notification from the push channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Listing the changed order belongs to, when the payload carried it
    pub listing_id: Option<i64>,
}

impl ChangeEvent {
    /// Whether the event concerns the board's listing
    #[must_use]
    pub fn concerns(&self, listing_id: i64) -> bool {
        self.listing_id == Some(listing_id)
    }
}

/// Timer configuration of the watch loop
#[derive(Debug, Clone, Copy)]
pub struct WatchConfig {
    /// Presentation tick period
    pub tick: Duration,
    /// Fallback poll period
    pub poll: Duration,
    /// Coalescing window for change-event reloads
    pub reload_debounce: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            poll: Duration::from_secs(15),
            reload_debounce: Duration::from_millis(450),
        }
    }
}

/// Folds bursts of change events into a single reload deadline.
///
/// Every event pushes the deadline out again; the reload fires once the
/// burst goes quiet for the debounce window.
#[derive(Debug)]
pub struct ReloadCoalescer {
    debounce: Duration,
    deadline: Option<Instant>,
}

impl ReloadCoalescer {
    /// Create a coalescer with the given quiet window
    #[must_use]
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            deadline: None,
        }
    }

    /// Record an event at `now`, (re)arming the deadline
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.debounce);
    }

    /// The armed deadline, when any
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the deadline if it has passed at `now`
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Drives one listing's board against the backend
pub struct BoardWatcher {
    api: OrdersApi,
    listing_id: i64,
    config: WatchConfig,
}

impl BoardWatcher {
    /// Create a watcher for one listing's board
    pub fn new(api: OrdersApi, listing_id: i64) -> Self {
        Self {
            api,
            listing_id,
            config: WatchConfig::default(),
        }
    }

    /// Override the timer configuration
    #[must_use]
    pub fn with_config(mut self, config: WatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Fetch orders and lines and load them into the board
    #[instrument(skip(self, board))]
    pub async fn reload(&self, board: &mut OrderBoard) -> ApiResult<()> {
        let rows = self.api.fetch_for_listing(self.listing_id).await?;

        let order_ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let lines = self.api.lines_for_orders(&order_ids).await?;

        let mut lines_by_order: HashMap<i64, Vec<_>> = HashMap::new();
        for line in lines {
            lines_by_order.entry(line.order_id).or_default().push(line);
        }

        let orders: Vec<Order> = rows
            .into_iter()
            .filter_map(|row| {
                let lines = lines_by_order.remove(&row.id).unwrap_or_default();
                Order::from_rows(row, lines)
            })
            .collect();

        board.set_orders(orders);
        Ok(())
    }

    /// Persist the offered transition for an order, then reload.
    ///
    /// Returns `false` when the order has no offered transition (already
    /// delivered, or gone from the board).
    #[instrument(skip(self, board))]
    pub async fn advance_order(&self, board: &mut OrderBoard, order_id: i64) -> ApiResult<bool> {
        let Some(action) = board.transition_for(order_id) else {
            return Ok(false);
        };

        self.api
            .update_status(self.listing_id, order_id, action.next.wire_value())
            .await?;
        self.reload(board).await?;
        Ok(true)
    }

    /// Run the live loop until `shutdown` fires.
    ///
    /// `on_render` is called after every tick and reload with the
    /// current board. Reload failures are logged and the loop keeps
    /// running on stale data; the next poll retries.
    pub async fn run<F>(
        &self,
        board: &mut OrderBoard,
        mut events: mpsc::Receiver<ChangeEvent>,
        mut shutdown: oneshot::Receiver<()>,
        mut on_render: F,
    ) -> ApiResult<()>
    where
        F: FnMut(&OrderBoard),
    {
        let mut tick = tokio::time::interval(self.config.tick);
        let mut poll = tokio::time::interval(self.config.poll);
        let mut coalescer = ReloadCoalescer::new(self.config.reload_debounce);
        let mut push_open = true;

        // Far-future placeholder while no reload is armed
        let idle = Duration::from_secs(3600);

        self.reload(board).await?;
        on_render(board);

        loop {
            let reload_at = coalescer
                .deadline()
                .unwrap_or_else(|| Instant::now() + idle);

            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Board watcher shutting down");
                    return Ok(());
                }

                _ = tick.tick() => {
                    on_render(board);
                }

                _ = poll.tick() => {
                    if let Err(e) = self.reload(board).await {
                        warn!(error = %e, "Fallback poll failed, keeping stale board");
                    }
                    on_render(board);
                }

                event = events.recv(), if push_open => {
                    match event {
                        Some(event) if event.concerns(self.listing_id) => {
                            coalescer.schedule(Instant::now());
                        }
                        Some(_) => {} // another merchant's order
                        None => {
                            push_open = false;
                            debug!("Push channel closed, poll continues");
                        }
                    }
                }

                _ = tokio::time::sleep_until(reload_at) => {
                    if coalescer.take_due(Instant::now()) {
                        if let Err(e) = self.reload(board).await {
                            warn!(error = %e, "Coalesced reload failed");
                        }
                        on_render(board);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_filtering() {
        let event = ChangeEvent {
            listing_id: Some(12),
        };
        assert!(event.concerns(12));
        assert!(!event.concerns(13));

        let anonymous = ChangeEvent { listing_id: None };
        assert!(!anonymous.concerns(12));
    }

    #[test]
    fn test_coalescer_arms_and_fires() {
        let mut coalescer = ReloadCoalescer::new(Duration::from_millis(450));
        let t0 = Instant::now();

        assert!(!coalescer.take_due(t0));

        coalescer.schedule(t0);
        assert!(!coalescer.take_due(t0 + Duration::from_millis(100)));
        assert!(coalescer.take_due(t0 + Duration::from_millis(450)));

        // Consumed: does not fire twice
        assert!(!coalescer.take_due(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn test_burst_extends_the_window() {
        let mut coalescer = ReloadCoalescer::new(Duration::from_millis(450));
        let t0 = Instant::now();

        coalescer.schedule(t0);
        // A second event 300 ms in pushes the deadline out
        coalescer.schedule(t0 + Duration::from_millis(300));

        assert!(!coalescer.take_due(t0 + Duration::from_millis(460)));
        assert!(coalescer.take_due(t0 + Duration::from_millis(750)));
    }

    #[test]
    fn test_default_config_matches_board_timers() {
        let config = WatchConfig::default();
        assert_eq!(config.tick, Duration::from_secs(1));
        assert_eq!(config.poll, Duration::from_secs(15));
        assert_eq!(config.reload_debounce, Duration::from_millis(450));
    }
}
