//! Pagination primitives shared across all list endpoints.
//!
//! Listing routes fetch the full filtered set, report its length as the
//! total, and slice out the requested page. There is no cursor pagination.

use serde::{Deserialize, Serialize};

/// Pagination parameters, from query string or JSON body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl Pagination {
    /// Maximum items per page.
    const MAX_PAGE_SIZE: i64 = 100;

    /// Default items per page.
    const DEFAULT_PAGE_SIZE: i64 = 25;

    pub fn limit(&self) -> i64 {
        self.page_size
            .unwrap_or(Self::DEFAULT_PAGE_SIZE)
            .clamp(1, Self::MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        let page = self.page.unwrap_or(1).max(1);
        (page - 1) * self.limit()
    }

    pub fn current_page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Paged result envelope returned by list endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T: Serialize> PagedResult<T> {
    /// Slice one page out of the full filtered result set.
    pub fn paginate(full: Vec<T>, pagination: &Pagination) -> Self {
        let total = full.len() as i64;
        let page_size = pagination.limit();
        let items: Vec<T> = full
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(page_size as usize)
            .collect();
        Self {
            items,
            total,
            page: pagination.current_page(),
            page_size,
            total_pages: (total + page_size - 1) / page_size,
        }
    }
}
