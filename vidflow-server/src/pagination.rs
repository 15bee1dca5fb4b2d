//! Pagination utilities for paged listings

use serde::{Deserialize, Serialize};

/// Largest page a client may request
pub const MAX_PAGE_SIZE: i64 = 200;

/// `?page=&limit=` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Sanitized `(page, page_size)`, falling back to `default_size`
    pub fn resolve(&self, default_size: i64) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let size = self
            .limit
            .filter(|l| *l > 0)
            .unwrap_or(default_size)
            .clamp(1, MAX_PAGE_SIZE);
        (page, size)
    }
}

/// Offset for SQL LIMIT/OFFSET
pub fn page_offset(page: i64, page_size: i64) -> i64 {
    (page.max(1) - 1) * page_size
}

/// Pagination metadata returned alongside a page of results
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// Calculate pagination metadata from total results and requested page
///
/// # Examples
/// ```
/// use vidflow_server::pagination::calculate_pagination;
///
/// // 45 total results at 20 per page = 3 pages
/// let p = calculate_pagination(45, 2, 20);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.page, 2);
/// ```
pub fn calculate_pagination(total: i64, page: i64, page_size: i64) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = (total + page_size - 1) / page_size;
    Pagination {
        page: page.max(1),
        limit: page_size,
        total,
        total_pages,
    }
}
