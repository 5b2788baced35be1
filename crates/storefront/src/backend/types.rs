//! Domain types for the 4Fun backend API.
//!
//! These types provide a clean, ergonomic API separate from the raw JSON
//! payloads, which are repaired by the [`normalize`](super::normalize)
//! boundary before they appear here.

use serde::{Deserialize, Serialize};

use four_fun_core::Product;

/// Pagination metadata returned by list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    /// Total records matching the query.
    pub total: u64,
    /// Current page (1-based).
    pub page: u64,
    /// Page size.
    pub limit: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            total: 0,
            page: 1,
            limit: 10,
            total_pages: 1,
        }
    }
}

/// One page of catalog products.
#[derive(Debug, Clone)]
pub struct ProductPage {
    /// Normalized products on this page.
    pub items: Vec<Product>,
    /// Pagination envelope; defaulted when the backend answers with a
    /// bare array instead of the `{data, meta}` shape.
    pub meta: Meta,
}

/// Query filters for the product listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilters {
    /// 1-based page number.
    pub page: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
    /// Free-text search term.
    pub search: Option<String>,
}

impl ProductFilters {
    /// Render the filters as query-string pairs, omitting unset fields.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(search) = &self.search {
            query.push(("search", search.clone()));
        }
        query
    }

    /// Cache key fragment; filters with the same rendering share a page.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "page={}:limit={}:search={}",
            self.page.unwrap_or(1),
            self.limit.unwrap_or(0),
            self.search.as_deref().unwrap_or("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_render_only_set_fields() {
        let filters = ProductFilters {
            page: Some(2),
            limit: None,
            search: Some("gears".to_string()),
        };
        assert_eq!(
            filters.to_query(),
            vec![("page", "2".to_string()), ("search", "gears".to_string())]
        );
    }

    #[test]
    fn test_default_meta_matches_backend_fallback() {
        let meta = Meta::default();
        assert_eq!(meta.page, 1);
        assert_eq!(meta.limit, 10);
        assert_eq!(meta.total, 0);
    }

    #[test]
    fn test_cache_key_distinguishes_searches() {
        let a = ProductFilters {
            search: Some("gears".to_string()),
            ..Default::default()
        };
        let b = ProductFilters::default();
        assert_ne!(a.cache_key(), b.cache_key());
    }
}
