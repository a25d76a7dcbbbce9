//! API models for request and response payloads

use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod recipe;
pub mod user;

/// Default number of items per page
pub const DEFAULT_PAGE_LIMIT: u32 = 6;

/// Upper bound for the `limit` query parameter
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Page/limit query parameters shared by list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    /// Page number (1-based)
    pub page: Option<u32>,
    /// Number of items per page
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) as i64 * self.limit() as i64
    }
}

/// Paginated list response
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub page: u32,
    pub limit: u32,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(query: &PageQuery, count: i64, results: Vec<T>) -> Self {
        Self {
            count,
            page: query.page(),
            limit: query.limit(),
            results,
        }
    }
}
