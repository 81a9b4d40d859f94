//! Pagination window and paginated responses

use serde::Serialize;

use crate::config::PagingConfig;
use crate::core::error::ValidationError;
use crate::core::record::Record;

/// Page number and size, both at least 1
///
/// # Example
/// ```rust,ignore
/// // GET /products?page=2&limit=10
/// let window = PageWindow::from_params(Some("2"), Some("10"), &paging)?;
/// assert_eq!(window.offset(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    page: usize,
    limit: usize,
}

impl PageWindow {
    /// Normalizing constructor: values below 1 become 1
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Read `page` and `limit` parameters
    ///
    /// Absent values take the defaults (page 1, configured limit). Values
    /// below 1 are normalized to 1 and the limit is capped at
    /// `paging.max_limit`. Text that is not an integer is rejected.
    pub fn from_params(
        page: Option<&str>,
        limit: Option<&str>,
        paging: &PagingConfig,
    ) -> Result<Self, ValidationError> {
        let page = match page {
            Some(raw) => parse_count("page", raw)?,
            None => 1,
        };
        let limit = match limit {
            Some(raw) => parse_count("limit", raw)?,
            None => paging.default_limit as i64,
        };

        let window = Self::new(clamp_to_usize(page), clamp_to_usize(limit));
        Ok(Self {
            limit: window.limit.min(paging.max_limit.max(1)),
            ..window
        })
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of matching records skipped before this page
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn parse_count(field: &str, raw: &str) -> Result<i64, ValidationError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::invalid(field, format!("'{}' is not an integer", raw)))
}

fn clamp_to_usize(value: i64) -> usize {
    usize::try_from(value.max(1)).unwrap_or(usize::MAX)
}

/// Listing result: one page of items plus the total matching count
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T = Record> {
    /// The records of this page
    pub items: Vec<T>,

    /// Records matching the filter, regardless of the window
    pub total_count: u64,

    /// Pagination metadata
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Total number of items (after filters)
    pub total: u64,

    /// Total number of pages
    pub total_pages: u64,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(window: PageWindow, total: u64) -> Self {
        let limit = window.limit() as u64;
        let total_pages = if total == 0 { 0 } else { total.div_ceil(limit) };
        let start = window.offset() as u64;

        Self {
            page: window.page(),
            limit: window.limit(),
            total,
            total_pages,
            has_next: start.saturating_add(limit) < total,
            has_prev: window.page() > 1,
        }
    }
}
