//! Pagination utilities
//!
//! Shared by the events listing and the search results page. The policy is
//! read-only and best-effort: a page number that cannot be parsed falls back
//! to the first page, a page beyond the end falls back to the last page.
//! Pages partition the result sequence, so walking every page in order
//! visits each result exactly once.

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Offset of the first item on the current page
    pub offset: i64,
    /// Items per page
    pub page_length: i64,
}

impl Pagination {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Parse a raw `page` query parameter; anything non-numeric means page 1
pub fn parse_page_param(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(1)
}

/// Calculate pagination metadata from total results and requested page
///
/// Ensures page is within valid bounds [1, total_pages].
pub fn calculate_pagination(total_results: i64, requested_page: i64, page_length: i64) -> Pagination {
    let page_length = page_length.max(1);
    let total_pages = (total_results + page_length - 1) / page_length;
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * page_length;

    Pagination {
        page,
        total_pages,
        offset,
        page_length,
    }
}

/// The slice of an in-memory result sequence covered by a page
pub fn page_slice<'a, T>(items: &'a [T], p: &Pagination) -> &'a [T] {
    let start = (p.offset as usize).min(items.len());
    let end = (start + p.page_length as usize).min(items.len());
    &items[start..end]
}
