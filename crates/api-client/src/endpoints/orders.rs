//! Pickup order board endpoints
//!
//! The orders tables are the oldest part of the backend and carry the most
//! schema drift: the listing foreign key exists as `listing_id` on new
//! rows and `listingId` on old ones, and `updated_at` and the customer
//! columns are missing on some deployments. Every read and write here
//! degrades through reduced column sets before failing.

use crate::client::FindixiClient;
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Pickup order API
#[derive(Clone)]
pub struct OrdersApi {
    client: FindixiClient,
}

/// One fetch attempt shape for the orders table
#[derive(Clone, Copy)]
struct FetchAttempt {
    camel_case_id: bool,
    with_customers: bool,
    with_updated_at: bool,
}

impl FetchAttempt {
    fn id_column(&self) -> &'static str {
        if self.camel_case_id { "listingId" } else { "listing_id" }
    }

    fn select(&self) -> String {
        let mut cols = vec!["id", self.id_column(), "pos_ref", "total", "status", "created_at"];
        if self.with_updated_at {
            cols.push("updated_at");
        }
        cols.extend(["order_type", "table_label", "source"]);
        if self.with_customers {
            cols.extend(["customer_name", "customer_email", "customer_phone"]);
        }
        cols.join(",")
    }
}

impl OrdersApi {
    /// Create a new orders API interface
    pub(crate) fn new(client: FindixiClient) -> Self {
        Self { client }
    }

    /// Fetch every pickup order of a listing, oldest first.
    ///
    /// Walks through reduced column sets while the backend keeps rejecting
    /// columns; any other error aborts immediately.
    pub async fn fetch_for_listing(&self, listing_id: i64) -> ApiResult<Vec<OrderRow>> {
        let attempts = [
            FetchAttempt { camel_case_id: false, with_customers: true, with_updated_at: true },
            FetchAttempt { camel_case_id: false, with_customers: false, with_updated_at: true },
            FetchAttempt { camel_case_id: false, with_customers: true, with_updated_at: false },
            FetchAttempt { camel_case_id: false, with_customers: false, with_updated_at: false },
            FetchAttempt { camel_case_id: true, with_customers: true, with_updated_at: true },
            FetchAttempt { camel_case_id: true, with_customers: false, with_updated_at: true },
            FetchAttempt { camel_case_id: true, with_customers: true, with_updated_at: false },
            FetchAttempt { camel_case_id: true, with_customers: false, with_updated_at: false },
        ];

        let mut last_error: Option<ApiError> = None;

        for attempt in attempts {
            let path = format!(
                "orders?select={}&{}=eq.{}&order_type=eq.pickup&order=created_at.asc",
                attempt.select(),
                attempt.id_column(),
                listing_id
            );

            match self.client.get::<Vec<OrderRow>>(&path).await {
                Ok(rows) => return Ok(rows),
                Err(e) if e.is_missing_column() => {
                    debug!(error = %e, "Order columns rejected, trying reduced set");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| ApiError::api_response(500, "Could not load orders")))
    }

    /// Line items for a set of orders, with dish names resolved.
    pub async fn lines_for_orders(&self, order_ids: &[i64]) -> ApiResult<Vec<OrderLineRow>> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        #[derive(Deserialize)]
        struct ItemRow {
            order_id: i64,
            dish_id: Option<i64>,
            qty: Option<f64>,
            price_snapshot: Option<f64>,
            #[serde(default)]
            modifiers: Option<serde_json::Value>,
        }

        let id_list = join_ids(order_ids.iter());
        let path = format!(
            "order_items?select=order_id,dish_id,qty,price_snapshot,modifiers&order_id=in.({})",
            id_list
        );
        let items: Vec<ItemRow> = self.client.get(&path).await?;

        let dish_ids: BTreeSet<i64> = items.iter().filter_map(|i| i.dish_id).collect();
        let dish_names = self.dish_names(&dish_ids).await;

        Ok(items
            .into_iter()
            .map(|item| {
                let name = item
                    .dish_id
                    .and_then(|id| dish_names.get(&id).cloned())
                    .unwrap_or_else(|| {
                        format!("Dish {}", item.dish_id.unwrap_or_default())
                    });
                let qty = item.qty.unwrap_or(1.0).max(1.0) as u32;
                let unit_price = item.price_snapshot.unwrap_or(0.0);

                OrderLineRow {
                    order_id: item.order_id,
                    name,
                    qty,
                    unit_price,
                    modifiers: item.modifiers,
                }
            })
            .collect())
    }

    /// Resolve dish names, degrading to an empty map on failure
    async fn dish_names(&self, dish_ids: &BTreeSet<i64>) -> HashMap<i64, String> {
        if dish_ids.is_empty() {
            return HashMap::new();
        }

        #[derive(Deserialize)]
        struct DishRow {
            id: i64,
            name: Option<String>,
        }

        let path = format!("dishes?select=id,name&id=in.({})", join_ids(dish_ids.iter()));
        match self.client.get::<Vec<DishRow>>(&path).await {
            Ok(rows) => rows
                .into_iter()
                .filter_map(|row| row.name.map(|name| (row.id, name)))
                .collect(),
            Err(e) => {
                warn!(error = %e, "Could not resolve dish names");
                HashMap::new()
            }
        }
    }

    /// Persist a status transition as a single guarded row update.
    ///
    /// The update is scoped to the listing and the pickup order type so a
    /// stale board can never touch another merchant's rows. Falls back
    /// through the same schema drift as the reads.
    pub async fn update_status(
        &self,
        listing_id: i64,
        order_id: i64,
        status: &str,
    ) -> ApiResult<()> {
        #[derive(Serialize)]
        struct StatusPatch<'a> {
            status: &'a str,
            updated_at: String,
        }

        #[derive(Serialize)]
        struct BareStatusPatch<'a> {
            status: &'a str,
        }

        let patch = StatusPatch {
            status,
            updated_at: chrono::Utc::now().to_rfc3339(),
        };

        for id_column in ["listing_id", "listingId"] {
            let path = format!(
                "orders?id=eq.{}&{}=eq.{}&order_type=eq.pickup",
                order_id, id_column, listing_id
            );

            match self
                .client
                .patch::<serde_json::Value, _>(&path, &patch)
                .await
            {
                Ok(_) => return Ok(()),
                Err(e) if e.is_missing_column() => {
                    let msg = e.to_string().to_lowercase();
                    if msg.contains("updated_at") {
                        // Deployment without the timestamp column: status only
                        let _: serde_json::Value = self
                            .client
                            .patch(&path, &BareStatusPatch { status })
                            .await?;
                        return Ok(());
                    }
                    debug!(error = %e, "Status update rejected, trying other id column");
                }
                Err(e) => return Err(e),
            }
        }

        Err(ApiError::api_response(400, "Could not update order status"))
    }

    /// Check that a user may operate the board of a listing.
    ///
    /// True when a staff relation row exists, or the user owns the listing.
    pub async fn verify_board_access(&self, user_id: &str, listing_id: i64) -> ApiResult<bool> {
        #[derive(Deserialize)]
        struct RelationRow {
            #[allow(dead_code)]
            listing_id: Option<i64>,
        }

        let path = format!(
            "user_listings?select=listing_id&user_id=eq.{}&listing_id=eq.{}&limit=1",
            user_id, listing_id
        );
        let relations: Vec<RelationRow> = self.client.get(&path).await?;
        if !relations.is_empty() {
            return Ok(true);
        }

        #[derive(Deserialize)]
        struct OwnerRow {
            #[allow(dead_code)]
            id: i64,
        }

        let path = format!(
            "listings?select=id&id=eq.{}&owner_user_id=eq.{}&limit=1",
            listing_id, user_id
        );
        let owners: Vec<OwnerRow> = self.client.get(&path).await?;
        Ok(!owners.is_empty())
    }

    /// Display name of a listing, for the board header
    pub async fn listing_name(&self, listing_id: i64) -> ApiResult<Option<String>> {
        #[derive(Deserialize)]
        struct NameRow {
            name: Option<String>,
        }

        let path = format!("listings?select=name&id=eq.{}&limit=1", listing_id);
        let rows: Vec<NameRow> = self.client.get(&path).await?;
        Ok(rows.into_iter().next().and_then(|row| row.name))
    }
}

/// One order row as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRow {
    /// Order id
    pub id: i64,
    /// Listing foreign key (whichever column the row carries)
    #[serde(default, alias = "listingId")]
    pub listing_id: Option<i64>,
    /// Reference id in the point-of-sale system, when synced
    #[serde(default)]
    pub pos_ref: Option<String>,
    /// Order total as stored
    #[serde(default)]
    pub total: Option<f64>,
    /// Raw status string
    pub status: Option<String>,
    /// Creation timestamp (RFC 3339)
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last update timestamp (RFC 3339)
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Order type; the board only shows `pickup`
    #[serde(default)]
    pub order_type: Option<String>,
    /// Table label for dine-in orders
    #[serde(default)]
    pub table_label: Option<String>,
    /// Originating channel, e.g. `app`
    #[serde(default)]
    pub source: Option<String>,
    /// Customer display name
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Customer email
    #[serde(default)]
    pub customer_email: Option<String>,
    /// Customer phone
    #[serde(default)]
    pub customer_phone: Option<String>,
}

/// One order line with the dish name resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineRow {
    /// Owning order id
    pub order_id: i64,
    /// Dish display name
    pub name: String,
    /// Quantity
    pub qty: u32,
    /// Unit price snapshot taken at order time
    pub unit_price: f64,
    /// Raw modifier payload, parsed by the board
    pub modifiers: Option<serde_json::Value>,
}

impl OrderLineRow {
    /// Line total (quantity times snapshot price)
    #[must_use]
    pub fn line_total(&self) -> f64 {
        f64::from(self.qty) * self.unit_price
    }
}

/// Render ids as a PostgREST `in.(..)` list
fn join_ids<'a>(ids: impl Iterator<Item = &'a i64>) -> String {
    ids.map(i64::to_string).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_attempt_selects() {
        let full = FetchAttempt {
            camel_case_id: false,
            with_customers: true,
            with_updated_at: true,
        };
        let select = full.select();
        assert!(select.contains("listing_id"));
        assert!(select.contains("updated_at"));
        assert!(select.contains("customer_phone"));

        let reduced = FetchAttempt {
            camel_case_id: true,
            with_customers: false,
            with_updated_at: false,
        };
        let select = reduced.select();
        assert!(select.contains("listingId"));
        assert!(!select.contains("updated_at"));
        assert!(!select.contains("customer_name"));
    }

    #[test]
    fn test_order_row_accepts_camel_case_listing_id() {
        let json = r#"{"id": 4, "listingId": 12, "status": "sent"}"#;
        let row: OrderRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.listing_id, Some(12));
    }

    #[test]
    fn test_line_total() {
        let line = OrderLineRow {
            order_id: 1,
            name: "Mofongo".to_string(),
            qty: 3,
            unit_price: 12.5,
            modifiers: None,
        };
        assert!((line.line_total() - 37.5).abs() < f64::EPSILON);
    }
}
