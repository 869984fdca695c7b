//! Order and line-item models
//!
//! Built from wire rows when the board loads; modifier payloads are
//! normalized into named groups here so rendering never touches raw
//! JSON.

use crate::status::Stage;
use chrono::{DateTime, Utc};
use findixi_api_client::{OrderLineRow, OrderRow};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One pickup order on the board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order id (doubles as the ticket number)
    pub id: i64,
    /// Owning listing
    pub listing_id: Option<i64>,
    /// Reference in the external point-of-sale system, when synced
    pub pos_ref: Option<String>,
    /// Stage parsed from the stored status
    pub stage: Stage,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
    /// Last status change
    pub updated_at: Option<DateTime<Utc>>,
    /// Table label for dine-in tickets
    pub table_label: Option<String>,
    /// Originating channel
    pub source: Option<String>,
    /// Customer display name
    pub customer_name: Option<String>,
    /// Customer contact (phone preferred, email fallback)
    pub customer_contact: Option<String>,
    /// Stored total, when the backend computed one
    pub stored_total: Option<f64>,
    /// Line items
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Build an order from its wire row and line rows.
    ///
    /// Rows with unknown statuses are not orders the board can act on;
    /// they return `None` and are dropped upstream.
    #[must_use]
    pub fn from_rows(row: OrderRow, lines: Vec<OrderLineRow>) -> Option<Self> {
        let stage = Stage::from_wire(row.status.as_deref().unwrap_or_default())?;

        let customer_contact = row.customer_phone.clone().or(row.customer_email.clone());

        Some(Self {
            id: row.id,
            listing_id: row.listing_id,
            pos_ref: row.pos_ref,
            stage,
            created_at: parse_timestamp(row.created_at.as_deref()),
            updated_at: parse_timestamp(row.updated_at.as_deref()),
            table_label: row.table_label,
            source: row.source,
            customer_name: row.customer_name,
            customer_contact,
            stored_total: row.total,
            lines: lines.into_iter().map(OrderLine::from_row).collect(),
        })
    }

    /// Order total: the stored column when present, else the line sum
    #[must_use]
    pub fn total(&self) -> f64 {
        self.stored_total
            .filter(|t| t.is_finite())
            .unwrap_or_else(|| self.lines.iter().map(OrderLine::line_total).sum())
    }

    /// Time since creation at `now`
    #[must_use]
    pub fn elapsed_total(&self, now: DateTime<Utc>) -> Duration {
        elapsed_between(self.created_at, now)
    }

    /// Time since the last status change at `now` (creation when the row
    /// never recorded an update)
    #[must_use]
    pub fn elapsed_since_update(&self, now: DateTime<Utc>) -> Duration {
        elapsed_between(self.updated_at.or(self.created_at), now)
    }

    /// Elapsed time rendered as `HH:MM:SS`
    #[must_use]
    pub fn elapsed_display(&self, now: DateTime<Utc>) -> String {
        let total = self.elapsed_total(now).as_secs();
        format!(
            "{:02}:{:02}:{:02}",
            total / 3600,
            (total % 3600) / 60,
            total % 60
        )
    }
}

fn elapsed_between(from: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
    from.and_then(|from| (now - from).to_std().ok())
        .unwrap_or(Duration::ZERO)
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?;
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// One line item of an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    /// Dish display name
    pub name: String,
    /// Quantity
    pub qty: u32,
    /// Unit price snapshot taken at order time
    pub unit_price: f64,
    /// Modifier selections, grouped
    pub modifier_groups: Vec<ModifierGroup>,
    /// Free-text note from the customer
    pub note: Option<String>,
}

impl OrderLine {
    fn from_row(row: OrderLineRow) -> Self {
        let (modifier_groups, note) = parse_modifiers(row.modifiers.as_ref());
        Self {
            name: row.name,
            qty: row.qty,
            unit_price: row.unit_price,
            modifier_groups,
            note,
        }
    }

    /// Line total (quantity times snapshot price)
    #[must_use]
    pub fn line_total(&self) -> f64 {
        f64::from(self.qty) * self.unit_price
    }
}

/// A named group of modifier selections ("Size", "Extras")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierGroup {
    /// Group name
    pub name: String,
    /// Selected options in the group
    pub options: Vec<ModifierOption>,
}

/// One selected modifier option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierOption {
    /// Option name
    pub name: String,
    /// Surcharge, when any
    pub extra_price: Option<f64>,
}

/// Normalize the stored modifier payload.
///
/// Wire shape: `{"items": [{"group": "...", "name": "...",
/// "extra_price": 1.5}, ...], "note": "..."}`. Anything malformed
/// degrades to no modifiers.
fn parse_modifiers(raw: Option<&serde_json::Value>) -> (Vec<ModifierGroup>, Option<String>) {
    let Some(raw) = raw.filter(|v| v.is_object()) else {
        return (Vec::new(), None);
    };

    let note = raw
        .get("note")
        .and_then(|n| n.as_str())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from);

    let Some(items) = raw.get("items").and_then(|i| i.as_array()) else {
        return (Vec::new(), note);
    };

    // Group order follows first appearance
    let mut groups: Vec<ModifierGroup> = Vec::new();
    for item in items {
        let group_name = item
            .get("group")
            .and_then(|g| g.as_str())
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .unwrap_or("Options")
            .to_string();

        let option = ModifierOption {
            name: item
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or("Option")
                .to_string(),
            extra_price: item
                .get("extra_price")
                .and_then(|p| p.as_f64())
                .filter(|p| *p > 0.0),
        };

        match groups.iter_mut().find(|g| g.name == group_name) {
            Some(group) => group.options.push(option),
            None => groups.push(ModifierGroup {
                name: group_name,
                options: vec![option],
            }),
        }
    }

    (groups, note)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order_row(id: i64, status: &str) -> OrderRow {
        serde_json::from_value(json!({
            "id": id,
            "listing_id": 12,
            "status": status,
            "created_at": "2025-06-01T16:00:00Z",
            "updated_at": "2025-06-01T16:20:00Z"
        }))
        .unwrap()
    }

    fn line_row(order_id: i64, qty: u32, unit_price: f64) -> OrderLineRow {
        serde_json::from_value(json!({
            "order_id": order_id,
            "name": "Tripleta",
            "qty": qty,
            "unit_price": unit_price,
            "modifiers": null
        }))
        .unwrap()
    }

    #[test]
    fn test_from_rows_parses_stage_and_timestamps() {
        let order = Order::from_rows(order_row(7, "preparing"), vec![]).unwrap();
        assert_eq!(order.stage, Stage::Preparing);
        assert!(order.created_at.is_some());
        assert!(order.updated_at.is_some());
    }

    #[test]
    fn test_unknown_status_is_dropped() {
        assert!(Order::from_rows(order_row(7, "refunded"), vec![]).is_none());
    }

    #[test]
    fn test_total_prefers_stored_column() {
        let mut row = order_row(7, "sent");
        row.total = Some(25.0);
        let order = Order::from_rows(row, vec![line_row(7, 2, 9.0)]).unwrap();
        assert!((order.total() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_total_falls_back_to_line_sum() {
        let order = Order::from_rows(
            order_row(7, "sent"),
            vec![line_row(7, 2, 9.0), line_row(7, 1, 4.5)],
        )
        .unwrap();
        assert!((order.total() - 22.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_elapsed_display() {
        let order = Order::from_rows(order_row(7, "sent"), vec![]).unwrap();
        let now = DateTime::parse_from_rfc3339("2025-06-01T17:05:09Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(order.elapsed_display(now), "01:05:09");
    }

    #[test]
    fn test_elapsed_since_update_uses_update_timestamp() {
        let order = Order::from_rows(order_row(7, "ready"), vec![]).unwrap();
        let now = DateTime::parse_from_rfc3339("2025-06-01T16:30:00Z")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(order.elapsed_total(now).as_secs(), 1800);
        assert_eq!(order.elapsed_since_update(now).as_secs(), 600);
    }

    #[test]
    fn test_future_timestamp_clamps_to_zero() {
        let order = Order::from_rows(order_row(7, "sent"), vec![]).unwrap();
        let now = DateTime::parse_from_rfc3339("2025-06-01T15:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(order.elapsed_total(now), Duration::ZERO);
    }

    #[test]
    fn test_modifier_grouping() {
        let modifiers = json!({
            "items": [
                {"group": "Size", "name": "Large", "extra_price": 2.0},
                {"group": "Extras", "name": "Cheese", "extra_price": 1.0},
                {"group": "Size", "name": "Thin crust"},
                {"name": "Napkins"}
            ],
            "note": "ring the bell"
        });

        let (groups, note) = parse_modifiers(Some(&modifiers));

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].name, "Size");
        assert_eq!(groups[0].options.len(), 2);
        assert_eq!(groups[1].name, "Extras");
        assert_eq!(groups[2].name, "Options");
        assert_eq!(note.as_deref(), Some("ring the bell"));
    }

    #[test]
    fn test_zero_surcharge_is_hidden() {
        let modifiers = json!({
            "items": [{"group": "Size", "name": "Regular", "extra_price": 0.0}]
        });
        let (groups, _) = parse_modifiers(Some(&modifiers));
        assert!(groups[0].options[0].extra_price.is_none());
    }

    #[test]
    fn test_malformed_modifiers_degrade() {
        let (groups, note) = parse_modifiers(Some(&json!("not an object")));
        assert!(groups.is_empty());
        assert!(note.is_none());

        let (groups, _) = parse_modifiers(None);
        assert!(groups.is_empty());
    }
}
