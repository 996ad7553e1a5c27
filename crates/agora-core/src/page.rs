//! Pagination parameter normalization.
//!
//! Two independent strategies:
//!
//! * **Offset**: the client sends a 1-based `page` and a `size`; both
//!   are clamped server-side before being turned into a 0-based row
//!   offset.  Listings answer with a total count.
//! * **Cursor**: the client sends the last-seen post id; the next page
//!   is everything strictly after it in feed order.  No total is ever
//!   computed, and end-of-feed is signalled by a short page.
//!
//! Raw client values never reach a query: normalization happens here,
//! once, and the store only ever sees the clamped form.

use serde::{Deserialize, Serialize};

/// Hard ceiling on any client-supplied page size.
pub const MAX_PAGE_SIZE: u32 = 100;
/// Default size when the client sends none.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Default size for feed-style listings.
pub const DEFAULT_FEED_PAGE_SIZE: u32 = 20;

/// Raw offset-pagination query parameters, as deserialized from the
/// request.  Both fields are optional; call [`PageRequest::normalize`]
/// before use.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageRequest {
    /// Clamp into a usable [`PageQuery`]: page is 1-based and at least 1,
    /// size is within `[1, MAX_PAGE_SIZE]` and defaults to
    /// `default_size`.
    pub fn normalize(self, default_size: u32) -> PageQuery {
        let page = self.page.unwrap_or(1).max(1);
        let size = self
            .size
            .unwrap_or(default_size)
            .clamp(1, MAX_PAGE_SIZE);
        PageQuery { page, size }
    }
}

/// A normalized offset-pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: u32,
    pub size: u32,
}

impl PageQuery {
    /// 0-based row offset for the underlying query.
    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.size
    }

    pub fn limit(&self) -> u32 {
        self.size
    }
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone, Serialize)]
pub struct PageResult<T> {
    pub total: u64,
    pub items: Vec<T>,
}

/// Raw cursor-pagination query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CursorRequest {
    /// Id of the last item of the previous page.  `None` and values
    /// `<= 0` both mean "first page".
    pub cursor: Option<i64>,
    pub size: Option<u32>,
}

impl CursorRequest {
    pub fn normalize(self) -> CursorQuery {
        let cursor = self.cursor.filter(|c| *c > 0);
        let size = self
            .size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        CursorQuery { cursor, size }
    }
}

/// A normalized cursor-pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorQuery {
    /// `None` means first page.
    pub cursor: Option<i64>,
    pub size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamps() {
        let q = PageRequest::default().normalize(DEFAULT_PAGE_SIZE);
        assert_eq!(q, PageQuery { page: 1, size: 10 });

        let q = PageRequest {
            page: Some(0),
            size: Some(0),
        }
        .normalize(20);
        assert_eq!(q, PageQuery { page: 1, size: 1 });

        let q = PageRequest {
            page: Some(3),
            size: Some(500),
        }
        .normalize(20);
        assert_eq!(
            q,
            PageQuery {
                page: 3,
                size: MAX_PAGE_SIZE
            }
        );
    }

    #[test]
    fn offset_is_zero_based() {
        let q = PageRequest {
            page: Some(1),
            size: Some(20),
        }
        .normalize(10);
        assert_eq!(q.offset(), 0);

        let q = PageRequest {
            page: Some(3),
            size: Some(20),
        }
        .normalize(10);
        assert_eq!(q.offset(), 40);
    }

    #[test]
    fn cursor_normalization() {
        let q = CursorRequest::default().normalize();
        assert_eq!(q.cursor, None);
        assert_eq!(q.size, DEFAULT_PAGE_SIZE);

        // cursor <= 0 means first page, same as absent
        let q = CursorRequest {
            cursor: Some(0),
            size: Some(5),
        }
        .normalize();
        assert_eq!(q.cursor, None);
        assert_eq!(q.size, 5);

        let q = CursorRequest {
            cursor: Some(-3),
            size: None,
        }
        .normalize();
        assert_eq!(q.cursor, None);

        let q = CursorRequest {
            cursor: Some(42),
            size: Some(1000),
        }
        .normalize();
        assert_eq!(q.cursor, Some(42));
        assert_eq!(q.size, MAX_PAGE_SIZE);
    }
}
