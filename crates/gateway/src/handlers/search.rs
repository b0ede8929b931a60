//! Search handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::{parse_number, QueryParams};
use crate::AppState;
use citegraph_common::{
    errors::{AppError, Result},
    openalex::SearchFilters,
    search::{SearchMeta, Suggestion},
    views::PaperView,
};

/// Shortest query accepted for suggestions
const MIN_SUGGESTION_QUERY: usize = 2;
const DEFAULT_SUGGESTIONS: usize = 5;
const MAX_SUGGESTIONS: usize = 20;

/// Search response
#[derive(Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub filters: SearchFilters,
    pub results: Vec<PaperView>,
    pub meta: SearchMeta,
}

#[derive(Serialize)]
pub struct SuggestionsResponse {
    pub success: bool,
    pub query: String,
    pub suggestions: Vec<Suggestion>,
}

fn required_query(params: &QueryParams) -> Result<String> {
    params
        .get("q")
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::invalid("q", "Query parameter 'q' is required"))
}

/// Search papers upstream; every hit is cached
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<SearchResponse>> {
    let query = required_query(&params)?;

    let filters = SearchFilters {
        year_min: parse_number(&params, "year_min")?,
        year_max: parse_number(&params, "year_max")?,
        min_citations: parse_number(&params, "min_citations")?,
    };

    let page = parse_number::<i64>(&params, "page")?.unwrap_or(1).max(1);
    let default_page_size = state.config.openalex.default_page_size;
    let max_page_size = state.config.openalex.max_page_size as i64;
    let per_page = match parse_number::<i64>(&params, "per_page")? {
        Some(n) if (1..=max_page_size).contains(&n) => n as u32,
        _ => default_page_size,
    };

    tracing::info!(query = %query, page, per_page, "Searching papers");

    let page = u32::try_from(page).unwrap_or(u32::MAX);
    let results = state.search().search(&query, &filters, page, per_page).await?;

    Ok(Json(SearchResponse {
        success: true,
        query,
        filters,
        results: results.results,
        meta: results.meta,
    }))
}

/// Title and author suggestions for type-ahead
pub async fn suggestions(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<SuggestionsResponse>> {
    let query = params.get("q").map(|q| q.trim()).unwrap_or_default().to_string();
    if query.chars().count() < MIN_SUGGESTION_QUERY {
        return Err(AppError::invalid(
            "q",
            format!("Query must be at least {} characters", MIN_SUGGESTION_QUERY),
        ));
    }

    let limit = match parse_number::<i64>(&params, "limit") {
        Ok(Some(n)) if (1..=MAX_SUGGESTIONS as i64).contains(&n) => n as usize,
        _ => DEFAULT_SUGGESTIONS,
    };

    let suggestions = state.search().suggestions(&query, limit).await?;

    Ok(Json(SuggestionsResponse {
        success: true,
        query,
        suggestions,
    }))
}

/// Supported filters and pagination bounds
pub async fn filters(State(state): State<AppState>) -> Json<Value> {
    let openalex = &state.config.openalex;

    Json(json!({
        "success": true,
        "filters": {
            "year_min": {
                "type": "integer",
                "description": "Earliest publication year (inclusive)"
            },
            "year_max": {
                "type": "integer",
                "description": "Latest publication year (inclusive)"
            },
            "min_citations": {
                "type": "integer",
                "description": "Minimum citation count"
            }
        },
        "pagination": {
            "page": { "type": "integer", "default": 1, "min": 1 },
            "per_page": {
                "type": "integer",
                "default": openalex.default_page_size,
                "min": 1,
                "max": openalex.max_page_size
            }
        }
    }))
}
