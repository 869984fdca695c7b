//! Board state: active orders, stage filters, counters, alarms

use crate::alert::{alert_for, Alert};
use crate::model::Order;
use crate::status::{Stage, StageAction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stage filter selected by tapping a counter box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardFilter {
    /// Every active order
    #[default]
    All,
    /// Waiting for acceptance
    Sent,
    /// In the kitchen
    Preparing,
    /// Waiting for pickup
    Ready,
}

impl BoardFilter {
    fn matches(self, stage: Stage) -> bool {
        match self {
            Self::All => true,
            Self::Sent => stage == Stage::Sent,
            Self::Preparing => stage == Stage::Preparing,
            Self::Ready => stage == Stage::Ready,
        }
    }
}

/// Per-stage counts shown in the header boxes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    /// Orders waiting for acceptance
    pub sent: usize,
    /// Orders being prepared
    pub preparing: usize,
    /// Orders waiting for pickup
    pub ready: usize,
}

impl StageCounts {
    /// Every order still on the board
    #[must_use]
    pub fn active(&self) -> usize {
        self.sent + self.preparing + self.ready
    }
}

/// Aggregated alert state per header box
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardAlerts {
    /// Worst alert across preparing orders
    pub preparing: Alert,
    /// Worst alert across ready orders
    pub ready: Alert,
}

impl BoardAlerts {
    /// Worst alert across all active orders (drives the "active" box)
    #[must_use]
    pub fn worst(&self) -> Alert {
        let mut worst = self.preparing;
        worst.escalate(self.ready);
        worst
    }
}

/// The pickup order board of one listing
#[derive(Debug, Clone, Default)]
pub struct OrderBoard {
    orders: Vec<Order>,
    filter: BoardFilter,
}

impl OrderBoard {
    /// Empty board
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the board's orders with a fresh fetch.
    ///
    /// Delivered (and otherwise inactive) orders drop off here.
    pub fn set_orders(&mut self, orders: Vec<Order>) {
        self.orders = orders
            .into_iter()
            .filter(|order| order.stage.is_active())
            .collect();
    }

    /// Every active order, oldest first as fetched
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Orders passing the selected stage filter
    #[must_use]
    pub fn filtered(&self) -> Vec<&Order> {
        self.orders
            .iter()
            .filter(|order| self.filter.matches(order.stage))
            .collect()
    }

    /// Currently selected filter
    #[must_use]
    pub fn filter(&self) -> BoardFilter {
        self.filter
    }

    /// Select a stage filter
    pub fn set_filter(&mut self, filter: BoardFilter) {
        self.filter = filter;
    }

    /// Per-stage counts
    #[must_use]
    pub fn counts(&self) -> StageCounts {
        let mut counts = StageCounts::default();
        for order in &self.orders {
            match order.stage {
                Stage::Sent => counts.sent += 1,
                Stage::Preparing => counts.preparing += 1,
                Stage::Ready => counts.ready += 1,
                Stage::Delivered => {}
            }
        }
        counts
    }

    /// Number of orders waiting unaccepted (drives the audio alarm)
    #[must_use]
    pub fn unaccepted(&self) -> usize {
        self.orders
            .iter()
            .filter(|order| order.stage == Stage::Sent)
            .count()
    }

    /// Aggregate elapsed-time alerts per header box at `now`
    #[must_use]
    pub fn alerts(&self, now: DateTime<Utc>) -> BoardAlerts {
        let mut alerts = BoardAlerts::default();

        for order in &self.orders {
            let alert = alert_for(
                order.stage,
                order.elapsed_total(now),
                order.elapsed_since_update(now),
            );
            match order.stage {
                Stage::Preparing => alerts.preparing.escalate(alert),
                Stage::Ready => alerts.ready.escalate(alert),
                Stage::Sent | Stage::Delivered => {}
            }
        }

        alerts
    }

    /// The transition to persist for an order, if one is offered.
    ///
    /// This is the only way the board produces a status change, so the
    /// linear chain in [`Stage::next_action`] is enforced by
    /// construction.
    #[must_use]
    pub fn transition_for(&self, order_id: i64) -> Option<StageAction> {
        self.orders
            .iter()
            .find(|order| order.id == order_id)?
            .stage
            .next_action()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use findixi_api_client::OrderRow;
    use serde_json::json;

    fn order(id: i64, status: &str, created: &str, updated: Option<&str>) -> Order {
        let row: OrderRow = serde_json::from_value(json!({
            "id": id,
            "listing_id": 12,
            "status": status,
            "created_at": created,
            "updated_at": updated
        }))
        .unwrap();
        Order::from_rows(row, vec![]).unwrap()
    }

    fn board() -> OrderBoard {
        let mut board = OrderBoard::new();
        board.set_orders(vec![
            order(1, "sent", "2025-06-01T16:00:00Z", None),
            order(2, "preparing", "2025-06-01T15:00:00Z", Some("2025-06-01T15:05:00Z")),
            order(3, "ready", "2025-06-01T14:00:00Z", Some("2025-06-01T15:50:00Z")),
            order(4, "delivered", "2025-06-01T13:00:00Z", None),
            order(5, "paid", "2025-06-01T16:10:00Z", None),
        ]);
        board
    }

    fn at(ts: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_delivered_orders_drop_off() {
        let board = board();
        assert_eq!(board.orders().len(), 4);
        assert!(board.orders().iter().all(|o| o.stage.is_active()));
    }

    #[test]
    fn test_counts() {
        let counts = board().counts();
        assert_eq!(counts.sent, 2);
        assert_eq!(counts.preparing, 1);
        assert_eq!(counts.ready, 1);
        assert_eq!(counts.active(), 4);
    }

    #[test]
    fn test_stage_filters() {
        let mut board = board();

        board.set_filter(BoardFilter::Sent);
        assert_eq!(board.filtered().len(), 2);

        board.set_filter(BoardFilter::Preparing);
        let preparing = board.filtered();
        assert_eq!(preparing.len(), 1);
        assert_eq!(preparing[0].id, 2);

        board.set_filter(BoardFilter::All);
        assert_eq!(board.filtered().len(), 4);
    }

    #[test]
    fn test_unaccepted_counts_sent_variants() {
        assert_eq!(board().unaccepted(), 2);
    }

    #[test]
    fn test_alert_aggregation() {
        let board = board();
        // 16:00: order 2 has been preparing for 60 min (red); order 3
        // became ready 10 min ago (no alert yet)
        let alerts = board.alerts(at("2025-06-01T16:00:00Z"));
        assert_eq!(alerts.preparing.level.map(|l| l.severity()), Some(2));
        assert!(alerts.ready.level.is_none());
        assert_eq!(alerts.worst().level.map(|l| l.severity()), Some(2));
    }

    #[test]
    fn test_transition_follows_the_chain() {
        let board = board();
        assert_eq!(board.transition_for(1).unwrap().next, Stage::Preparing);
        assert_eq!(board.transition_for(2).unwrap().next, Stage::Ready);
        assert_eq!(board.transition_for(3).unwrap().next, Stage::Delivered);
        assert!(board.transition_for(999).is_none());
    }
}
