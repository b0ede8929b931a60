//! `/works` query construction

use serde::{Deserialize, Serialize};

/// User-facing search filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub min_citations: Option<i64>,
}

impl SearchFilters {
    /// Render as an OpenAlex filter expression; clauses are comma-joined (AND).
    ///
    /// Ranges are not cross-checked: an inverted year range goes upstream as is.
    pub fn to_filter_expression(&self) -> Option<String> {
        let mut clauses = Vec::new();

        if let Some(year) = self.year_min {
            clauses.push(format!("publication_year:>={}", year));
        }
        if let Some(year) = self.year_max {
            clauses.push(format!("publication_year:<={}", year));
        }
        if let Some(count) = self.min_citations {
            clauses.push(format!("cited_by_count:>={}", count));
        }

        if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(","))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.year_min.is_none() && self.year_max.is_none() && self.min_citations.is_none()
    }
}

/// Parameters of one `/works` listing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkQuery {
    pub search: Option<String>,
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub per_page: u32,
}

impl WorkQuery {
    /// Full-text search with optional filters
    pub fn search(query: &str, filters: &SearchFilters, page: u32, per_page: u32) -> Self {
        Self {
            search: Some(query.to_string()),
            filter: filters.to_filter_expression(),
            sort: None,
            page: Some(page),
            per_page,
        }
    }

    /// Works citing `id`, most cited first
    pub fn citing(id: &str, limit: u32) -> Self {
        Self {
            search: None,
            filter: Some(format!("cites:{}", id)),
            sort: Some("cited_by_count:desc".to_string()),
            page: None,
            per_page: limit,
        }
    }

    /// Works referenced by `id`
    pub fn referenced_by(id: &str, limit: u32) -> Self {
        Self {
            search: None,
            filter: Some(format!("cited_by:{}", id)),
            sort: None,
            page: None,
            per_page: limit,
        }
    }

    /// Query string pairs in a stable order
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(5);

        if let Some(ref search) = self.search {
            params.push(("search", search.clone()));
        }
        if let Some(ref filter) = self.filter {
            params.push(("filter", filter.clone()));
        }
        if let Some(ref sort) = self.sort {
            params.push(("sort", sort.clone()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        params.push(("per_page", self.per_page.to_string()));

        params
    }
}
