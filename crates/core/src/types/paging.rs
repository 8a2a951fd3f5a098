//! Offset pagination shared by every listing endpoint.

use serde::{Deserialize, Serialize};

/// Requested page, 1-based.
///
/// Out-of-range values are clamped rather than rejected so listing
/// endpoints never fail on a bad query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    pub page_number: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub const DEFAULT_PAGE_SIZE: i64 = 10;
    pub const MAX_PAGE_SIZE: i64 = 100;

    /// Build a clamped page request.
    #[must_use]
    pub fn new(page_number: i64, page_size: i64) -> Self {
        Self {
            page_number: page_number.max(1),
            page_size: page_size.clamp(1, Self::MAX_PAGE_SIZE),
        }
    }

    /// Re-apply clamping after deserialization.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self::new(self.page_number, self.page_size)
    }

    /// SQL `LIMIT`.
    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.page_size
    }

    /// SQL `OFFSET`.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page_number - 1) * self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub page_number: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> Paged<T> {
    #[must_use]
    pub fn new(items: Vec<T>, page: PageRequest, total_count: i64) -> Self {
        let total_pages = if total_count <= 0 {
            0
        } else {
            (total_count + page.page_size - 1) / page.page_size
        };
        Self {
            items,
            page_number: page.page_number,
            page_size: page.page_size,
            total_count,
            total_pages,
            has_previous_page: page.page_number > 1,
            has_next_page: page.page_number < total_pages,
        }
    }

    /// Transform the items while keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
            has_previous_page: self.has_previous_page,
            has_next_page: self.has_next_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps() {
        let page = PageRequest::new(0, 1000);
        assert_eq!(page.page_number, 1);
        assert_eq!(page.page_size, PageRequest::MAX_PAGE_SIZE);

        let page = PageRequest::new(-3, 0);
        assert_eq!(page.page_number, 1);
        assert_eq!(page.page_size, 1);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(1, 20).offset(), 0);
        assert_eq!(PageRequest::new(3, 20).offset(), 40);
    }

    #[test]
    fn test_paged_metadata() {
        let paged = Paged::new(vec![1, 2, 3], PageRequest::new(2, 3), 7);
        assert_eq!(paged.total_pages, 3);
        assert!(paged.has_previous_page);
        assert!(paged.has_next_page);

        let last = Paged::new(vec![7], PageRequest::new(3, 3), 7);
        assert!(!last.has_next_page);
    }

    #[test]
    fn test_paged_empty() {
        let paged: Paged<i32> = Paged::new(vec![], PageRequest::default(), 0);
        assert_eq!(paged.total_pages, 0);
        assert!(!paged.has_previous_page);
        assert!(!paged.has_next_page);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let paged = Paged::new(vec![1, 2], PageRequest::new(1, 2), 5).map(|n| n * 10);
        assert_eq!(paged.items, vec![10, 20]);
        assert_eq!(paged.total_count, 5);
        assert_eq!(paged.total_pages, 3);
    }
}
