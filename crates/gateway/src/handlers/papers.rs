//! Paper detail, citation and graph handlers

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{decode_json, parse_flag, parse_number, JsonBody, QueryParams};
use crate::AppState;
use citegraph_common::{
    errors::{AppError, Result},
    graph::{CitationGraph, PaperCitations},
    views::PaperView,
};

#[derive(Serialize)]
pub struct PaperResponse {
    pub success: bool,
    pub paper: PaperView,
}

#[derive(Serialize)]
pub struct CitationsResponse {
    pub success: bool,
    pub data: PaperCitations,
}

#[derive(Serialize)]
pub struct GraphResponse {
    pub success: bool,
    pub graph: CitationGraph,
}

/// Batch lookup request
#[derive(Debug, Deserialize, Validate)]
pub struct BatchRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "paper_ids must contain between 1 and 50 ids"))]
    pub paper_ids: Vec<String>,

    #[serde(default)]
    pub include_abstract: bool,
}

#[derive(Serialize)]
pub struct BatchResponse {
    pub success: bool,
    pub papers: Vec<PaperView>,
    pub not_found: Vec<String>,
    pub total_requested: usize,
    pub total_found: usize,
}

/// Expansion request; both directions default to on
#[derive(Debug, Deserialize)]
pub struct ExpandRequest {
    #[serde(default = "default_true")]
    pub fetch_citing: bool,

    #[serde(default = "default_true")]
    pub fetch_references: bool,
}

impl Default for ExpandRequest {
    fn default() -> Self {
        Self {
            fetch_citing: true,
            fetch_references: true,
        }
    }
}

fn default_true() -> bool { true }

#[derive(Serialize)]
pub struct NewCitations {
    pub citing_papers: Vec<PaperView>,
    pub referenced_papers: Vec<PaperView>,
}

#[derive(Serialize)]
pub struct ExpandResponse {
    pub success: bool,
    pub paper_id: String,
    pub new_citations: NewCitations,
    pub graph: CitationGraph,
}

/// Get a paper, from cache while fresh
pub async fn get_paper(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<QueryParams>,
) -> Result<Json<PaperResponse>> {
    let include_abstract = parse_flag(&params, "include_abstract", true);
    let force_refresh = parse_flag(&params, "force_refresh", false);

    let cache = state.cache();
    let paper = cache.resolve_paper(&id, force_refresh).await?;
    let paper = PaperView::load(cache.repository(), &paper, include_abstract).await?;

    Ok(Json(PaperResponse { success: true, paper }))
}

/// One-hop upstream fetch of citing papers and references
pub async fn get_citations(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<QueryParams>,
) -> Result<Json<CitationsResponse>> {
    let include_references = parse_flag(&params, "include_references", true);

    let data = state.graph().get_paper_citations(&id, include_references).await?;

    Ok(Json(CitationsResponse { success: true, data }))
}

/// Bounded-depth citation graph
pub async fn get_graph(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<QueryParams>,
) -> Result<Json<GraphResponse>> {
    let depth = parse_number::<i64>(&params, "depth").ok().flatten().unwrap_or(1);
    let expand = parse_flag(&params, "expand", false);

    let graph = state.graph().build(&id, depth, expand).await?;

    Ok(Json(GraphResponse { success: true, graph }))
}

/// Fetch a paper's neighbors from upstream and return the refreshed star
pub async fn expand(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ExpandResponse>> {
    let request: ExpandRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ExpandRequest::default()
    } else {
        decode_json(&body)?
    };

    let expanded = state
        .graph()
        .expand(&id, request.fetch_citing, request.fetch_references)
        .await?;

    tracing::info!(
        paper_id = %expanded.paper.id,
        citing = expanded.cited_by.len(),
        references = expanded.references.len(),
        "Paper expanded"
    );

    Ok(Json(ExpandResponse {
        success: true,
        paper_id: expanded.paper.id,
        new_citations: NewCitations {
            citing_papers: expanded.cited_by,
            referenced_papers: expanded.references,
        },
        graph: expanded.citation_graph,
    }))
}

/// Look up several papers at once
pub async fn batch(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<BatchRequest>,
) -> Result<Json<BatchResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("paper_ids".to_string()),
    })?;

    let cache = state.cache();
    let mut papers = Vec::with_capacity(request.paper_ids.len());
    let mut not_found = Vec::new();

    for id in &request.paper_ids {
        match cache.resolve_paper(id, false).await {
            Ok(paper) => {
                papers.push(PaperView::load(cache.repository(), &paper, request.include_abstract).await?);
            }
            Err(AppError::PaperNotFound { .. }) => not_found.push(id.clone()),
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        requested = request.paper_ids.len(),
        found = papers.len(),
        "Batch lookup complete"
    );

    Ok(Json(BatchResponse {
        success: true,
        total_requested: request.paper_ids.len(),
        total_found: papers.len(),
        papers,
        not_found,
    }))
}
