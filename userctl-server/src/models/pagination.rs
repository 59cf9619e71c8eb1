//! Pagination types for the user list

use serde::Serialize;

use super::ValidationError;

/// Default items per page
pub const DEFAULT_LIMIT: u32 = 10;

/// Pagination parameters
///
/// `limit` has no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page number (1-indexed)
    pub page: u32,
    /// Items per page
    pub limit: u32,
}

impl Pagination {
    /// Parse raw query values.
    ///
    /// Absent or empty values fall back to the defaults; anything else must
    /// be a positive integer.
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Result<Self, ValidationError> {
        Ok(Self {
            page: parse_positive(page, 1)?,
            limit: parse_positive(limit, DEFAULT_LIMIT)?,
        })
    }

    /// Calculate SQL OFFSET value.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Get LIMIT value.
    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn parse_positive(raw: Option<&str>, default: u32) -> Result<u32, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(s) => match s.parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ValidationError::InvalidPagination),
        },
    }
}

/// One page of results plus the total count across all pages
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    /// Items for current page
    pub items: Vec<T>,
    /// Total count across all pages
    pub total: i64,
    /// Current page number
    pub page: u32,
    /// Items per page
    pub limit: u32,
}

impl<T> Paginated<T> {
    /// Calculate total number of pages (zero when there are no rows).
    pub fn total_pages(&self) -> i64 {
        let limit = i64::from(self.limit.max(1));
        (self.total.max(0) + limit - 1) / limit
    }

    /// Check if there's a next page.
    pub fn has_next(&self) -> bool {
        i64::from(self.page) < self.total_pages()
    }

    /// Check if there's a previous page.
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Summary block serialized next to the items.
    pub fn info(&self) -> PageInfo {
        PageInfo {
            current_page: self.page,
            total_pages: self.total_pages(),
            total_users: self.total,
            has_next: self.has_next(),
            has_prev: self.has_prev(),
        }
    }
}

/// `pagination` object of the list response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: i64,
    pub total_users: i64,
    pub has_next: bool,
    pub has_prev: bool,
}
