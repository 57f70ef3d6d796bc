//! Pagination primitives shared across all list endpoints.

use serde::{Deserialize, Serialize};

/// Pagination query parameters (`limit` and `offset`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Pagination {
    /// Maximum items per page.
    const MAX_LIMIT: usize = 100;

    /// Default items per page.
    const DEFAULT_LIMIT: usize = 25;

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    /// Apply this window to an already-filtered vector.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset())
            .take(self.limit())
            .collect()
    }
}

/// Paged result envelope returned by list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PagedResult<T: Serialize> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

impl<T: Serialize> PagedResult<T> {
    /// Page a filtered vector, recording the pre-page total.
    pub fn paginate(items: Vec<T>, pagination: &Pagination) -> Self {
        let total = items.len();
        Self {
            items: pagination.slice(items),
            total,
            limit: pagination.limit(),
            offset: pagination.offset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults() {
        let p = Pagination::default();
        assert_eq!(p.limit(), 25);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn pagination_clamps_limit() {
        let p = Pagination {
            limit: Some(500),
            offset: None,
        };
        assert_eq!(p.limit(), 100);
    }

    #[test]
    fn slice_applies_window() {
        let p = Pagination {
            limit: Some(2),
            offset: Some(1),
        };
        assert_eq!(p.slice(vec![1, 2, 3, 4]), vec![2, 3]);
    }

    #[test]
    fn paged_result_records_pre_page_total() {
        let p = Pagination {
            limit: Some(2),
            offset: Some(0),
        };
        let result = PagedResult::paginate(vec![1, 2, 3, 4, 5], &p);
        assert_eq!(result.items, vec![1, 2]);
        assert_eq!(result.total, 5);
    }

    #[test]
    fn offset_past_end_is_empty() {
        let p = Pagination {
            limit: Some(10),
            offset: Some(99),
        };
        let result = PagedResult::paginate(vec![1, 2, 3], &p);
        assert!(result.items.is_empty());
        assert_eq!(result.total, 3);
    }
}
