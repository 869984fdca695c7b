//! Progressive "load more" pagination
//!
//! The cursor is an offset plus the size of the last fetched page. A
//! further page is only offered when the last fetch came back full: a
//! short page means the server ran out of rows.

use findixi_api_client::SEARCH_PAGE_SIZE;
use serde::{Deserialize, Serialize};

/// Offset cursor over the search RPC
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Offset of the next page
    pub offset: u32,
    /// Row count of the last fetch
    pub last_fetch_count: u32,
}

impl Pagination {
    /// Fresh cursor at the start of the result set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to the first page (filters changed)
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record a fetched page and advance the offset
    pub fn record_fetch(&mut self, fetched: usize, append: bool) {
        let fetched = fetched as u32;
        self.last_fetch_count = fetched;
        if append {
            self.offset += fetched;
        } else {
            self.offset = fetched;
        }
    }

    /// Whether a "load more" control should be offered
    #[must_use]
    pub fn can_load_more(&self) -> bool {
        self.last_fetch_count == SEARCH_PAGE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_page_offers_more() {
        let mut cursor = Pagination::new();
        cursor.record_fetch(SEARCH_PAGE_SIZE as usize, false);
        assert!(cursor.can_load_more());
        assert_eq!(cursor.offset, SEARCH_PAGE_SIZE);
    }

    #[test]
    fn test_short_page_ends_pagination() {
        let mut cursor = Pagination::new();
        cursor.record_fetch(7, false);
        assert!(!cursor.can_load_more());
    }

    #[test]
    fn test_append_advances_offset() {
        let mut cursor = Pagination::new();
        cursor.record_fetch(SEARCH_PAGE_SIZE as usize, false);
        cursor.record_fetch(SEARCH_PAGE_SIZE as usize, true);
        assert_eq!(cursor.offset, SEARCH_PAGE_SIZE * 2);
    }

    #[test]
    fn test_empty_page() {
        let mut cursor = Pagination::new();
        cursor.record_fetch(0, false);
        assert!(!cursor.can_load_more());
        assert_eq!(cursor.offset, 0);
    }

    #[test]
    fn test_reset() {
        let mut cursor = Pagination::new();
        cursor.record_fetch(SEARCH_PAGE_SIZE as usize, false);
        cursor.reset();
        assert_eq!(cursor, Pagination::new());
    }
}
