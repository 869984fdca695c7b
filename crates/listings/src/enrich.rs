//! Enrichment merges
//!
//! Secondary lookups (branch labels, favorite membership) come back as
//! flat id-keyed data and are merged into the candidate list in place.
//! Merging is idempotent and never removes or reorders listings; if an
//! enrichment source failed upstream, the caller simply merges nothing.

use crate::model::Listing;
use findixi_api_client::BranchRow;
use std::collections::{HashMap, HashSet};

/// Merge branch labels into the list by id.
///
/// A row with a non-empty `branch_name` marks the listing as a branch
/// even when the explicit flag column is missing from the schema.
pub fn merge_branch_labels(listings: &mut [Listing], rows: &[BranchRow]) {
    if rows.is_empty() {
        return;
    }

    let by_id: HashMap<i64, &BranchRow> = rows.iter().map(|row| (row.id, row)).collect();

    for listing in listings.iter_mut() {
        let Some(row) = by_id.get(&listing.id) else {
            continue;
        };

        let label = row
            .branch_name
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty());

        let is_branch = row.is_branch.unwrap_or(label.is_some());
        listing.branch_label = if is_branch {
            label.map(String::from)
        } else {
            None
        };
    }
}

/// Merge favorite membership into the list by id.
pub fn merge_favorites(listings: &mut [Listing], favorite_ids: &HashSet<i64>) {
    for listing in listings.iter_mut() {
        listing.favorite = favorite_ids.contains(&listing.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use findixi_api_client::ListingRow;
    use serde_json::json;

    fn listings() -> Vec<Listing> {
        (1..=3)
            .map(|id| {
                let row: ListingRow = serde_json::from_value(
                    json!({ "id": id, "name": format!("Listing {}", id) }),
                )
                .unwrap();
                Listing::from_row(row, None)
            })
            .collect()
    }

    fn branch_row(id: i64, name: Option<&str>, flag: Option<bool>) -> BranchRow {
        serde_json::from_value(json!({
            "id": id,
            "branch_name": name,
            "is_branch": flag
        }))
        .unwrap()
    }

    #[test]
    fn test_branch_label_merged_by_id() {
        let mut items = listings();
        let rows = vec![branch_row(2, Some("Mayagüez Mall"), Some(true))];

        merge_branch_labels(&mut items, &rows);

        assert!(items[0].branch_label.is_none());
        assert_eq!(items[1].branch_label.as_deref(), Some("Mayagüez Mall"));
        assert!(items[2].branch_label.is_none());
    }

    #[test]
    fn test_label_alone_implies_branch() {
        let mut items = listings();
        // Reduced column set: no is_branch flag came back
        let rows = vec![branch_row(1, Some("Centro"), None)];

        merge_branch_labels(&mut items, &rows);
        assert_eq!(items[0].branch_label.as_deref(), Some("Centro"));
    }

    #[test]
    fn test_explicit_non_branch_clears_label() {
        let mut items = listings();
        let rows = vec![branch_row(1, Some("Stale Label"), Some(false))];

        merge_branch_labels(&mut items, &rows);
        assert!(items[0].branch_label.is_none());
    }

    #[test]
    fn test_empty_rows_leave_list_untouched() {
        let mut items = listings();
        let before: Vec<i64> = items.iter().map(|l| l.id).collect();

        merge_branch_labels(&mut items, &[]);

        let after: Vec<i64> = items.iter().map(|l| l.id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_enrichment_is_idempotent() {
        let mut once = listings();
        let rows = vec![branch_row(2, Some("Plaza"), Some(true))];
        let favorites: HashSet<i64> = [1, 3].into_iter().collect();

        merge_branch_labels(&mut once, &rows);
        merge_favorites(&mut once, &favorites);

        let mut twice = once.clone();
        merge_branch_labels(&mut twice, &rows);
        merge_favorites(&mut twice, &favorites);

        let snapshot_once: Vec<_> = once
            .iter()
            .map(|l| (l.id, l.branch_label.clone(), l.favorite))
            .collect();
        let snapshot_twice: Vec<_> = twice
            .iter()
            .map(|l| (l.id, l.branch_label.clone(), l.favorite))
            .collect();
        assert_eq!(snapshot_once, snapshot_twice);
    }

    #[test]
    fn test_favorites_membership() {
        let mut items = listings();
        let favorites: HashSet<i64> = [2].into_iter().collect();

        merge_favorites(&mut items, &favorites);

        assert!(!items[0].favorite);
        assert!(items[1].favorite);
        assert!(!items[2].favorite);
    }

    #[test]
    fn test_favorites_remerge_clears_stale_marks() {
        let mut items = listings();
        merge_favorites(&mut items, &[1].into_iter().collect());
        assert!(items[0].favorite);

        // User un-favorited listing 1 elsewhere; re-merge reflects it
        merge_favorites(&mut items, &HashSet::new());
        assert!(!items[0].favorite);
    }
}
