//! Page/limit normalisation and pagination metadata

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Raw query parameters as supplied by a client
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A validated page request. `page >= 1` and `1 <= limit <= MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Build a page request, falling back to the defaults for values below 1
    /// and capping the limit at [`MAX_LIMIT`].
    pub fn new(page: i64, limit: i64) -> Self {
        let page = if page < 1 {
            DEFAULT_PAGE
        } else {
            u32::try_from(page).unwrap_or(u32::MAX)
        };
        let limit = if limit < 1 {
            DEFAULT_LIMIT
        } else {
            u32::try_from(limit).unwrap_or(MAX_LIMIT).min(MAX_LIMIT)
        };
        Self { page, limit }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Row offset for SQL `OFFSET`
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        PageRequest::new(
            query.page.unwrap_or(DEFAULT_PAGE as i64),
            query.limit.unwrap_or(DEFAULT_LIMIT as i64),
        )
    }
}

/// Pagination metadata returned next to a page of items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub items_per_page: u32,
    pub total_items: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total_items: i64) -> Self {
        let per_page = request.limit() as i64;
        let total_pages = if total_items <= 0 {
            0
        } else {
            (total_items + per_page - 1) / per_page
        };
        Self {
            current_page: request.page(),
            items_per_page: request.limit(),
            total_items,
            total_pages,
        }
    }
}

/// A page of items together with the total match count
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.request, self.total)
    }
}
