//! Shared pagination utilities
//!
//! Skip/take pagination used across every list query. `take` is clamped to
//! 1..=1000 with a default of 50; `has_more` is defined as
//! `skip + take < total`.

use serde::{Deserialize, Serialize};

/// Default page size when `take` is absent
pub const DEFAULT_TAKE: i64 = 50;

/// Largest page a single request may fetch
pub const MAX_TAKE: i64 = 1000;

/// Common pagination request parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct PageRequest {
    /// Number of rows to skip. Defaults to 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<i64>,

    /// Number of rows to return. Defaults to 50, clamped to 1-1000.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take: Option<i64>,
}

impl PageRequest {
    pub fn new(skip: Option<i64>, take: Option<i64>) -> Self {
        Self { skip, take }
    }

    /// Rows to skip, never negative
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    /// Rows to return, clamped to 1-1000
    pub fn take(&self) -> i64 {
        self.take.unwrap_or(DEFAULT_TAKE).clamp(1, MAX_TAKE)
    }
}

/// Pagination metadata for a response page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    pub skip: i64,
    pub take: i64,
    /// Total number of matching rows
    pub total_count: i64,
    /// Whether another page exists after this one
    pub has_more: bool,
}

impl PageInfo {
    /// Build page metadata from the effective skip/take and total count
    pub fn new(skip: i64, take: i64, total_count: i64) -> Self {
        Self {
            skip,
            take,
            total_count,
            has_more: skip + take < total_count,
        }
    }

    pub fn from_request(request: &PageRequest, total_count: i64) -> Self {
        Self::new(request.skip(), request.take(), total_count)
    }
}

/// Wrapper for paginated list responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub page: PageInfo,
}

impl<T> Paged<T> {
    pub fn new(items: Vec<T>, page: PageInfo) -> Self {
        Self { items, page }
    }

    pub fn from_items(items: Vec<T>, request: &PageRequest, total_count: i64) -> Self {
        Self {
            items,
            page: PageInfo::from_request(request, total_count),
        }
    }

    /// Map items to a different type
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults() {
        let request = PageRequest::default();
        assert_eq!(request.skip(), 0);
        assert_eq!(request.take(), 50);
    }

    #[test]
    fn test_page_request_clamping() {
        let request = PageRequest::new(Some(-5), Some(5000));
        assert_eq!(request.skip(), 0);
        assert_eq!(request.take(), 1000);

        let request = PageRequest::new(Some(10), Some(0));
        assert_eq!(request.take(), 1);
    }

    #[test]
    fn test_has_more_mid_page() {
        let info = PageInfo::new(0, 50, 120);
        assert!(info.has_more);
    }

    #[test]
    fn test_has_more_exact_boundary() {
        // skip + take == total means the page ends exactly at the last row
        let info = PageInfo::new(70, 50, 120);
        assert!(!info.has_more);

        let info = PageInfo::new(69, 50, 120);
        assert!(info.has_more);
    }

    #[test]
    fn test_has_more_empty() {
        let info = PageInfo::new(0, 50, 0);
        assert!(!info.has_more);
    }

    #[test]
    fn test_paged_map() {
        let paged = Paged::new(vec![1, 2, 3], PageInfo::new(0, 50, 3));
        let mapped = paged.map(|x| x * 2);
        assert_eq!(mapped.items, vec![2, 4, 6]);
        assert_eq!(mapped.page.total_count, 3);
    }
}
