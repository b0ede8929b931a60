//! Reading library handlers (collections and saved papers)

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{user_id, JsonBody, QueryParams};
use crate::AppState;
use citegraph_common::{
    errors::{AppError, Result},
    library::{CollectionView, SavePaper, SavedPaperView, DEFAULT_USER},
};

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

/// Request to create a collection
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCollectionRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "name must be between 1 and 200 characters"))]
    pub name: String,

    pub description: Option<String>,

    #[serde(default = "default_user")]
    pub user_id: String,
}

/// Request to save a paper into a collection
#[derive(Debug, Deserialize)]
pub struct SavePaperRequest {
    #[serde(default)]
    pub paper_id: String,

    pub collection_id: Option<i32>,

    pub notes: Option<String>,

    pub status: Option<String>,

    #[serde(default = "default_user")]
    pub user_id: String,
}

/// Partial update of a saved paper
#[derive(Debug, Deserialize)]
pub struct UpdateSavedPaperRequest {
    pub notes: Option<String>,
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct CollectionsResponse {
    pub success: bool,
    pub collections: Vec<CollectionView>,
}

#[derive(Serialize)]
pub struct CollectionResponse {
    pub success: bool,
    pub collection: CollectionView,
}

#[derive(Serialize)]
pub struct CollectionPapersResponse {
    pub success: bool,
    pub collection: CollectionView,
    pub papers: Vec<SavedPaperView>,
}

#[derive(Serialize)]
pub struct SavedPaperResponse {
    pub success: bool,
    pub saved_paper: SavedPaperView,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// List a user's collections with paper counts
pub async fn list_collections(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<CollectionsResponse>> {
    let collections = state.library().list_collections(&user_id(&params)).await?;

    Ok(Json(CollectionsResponse { success: true, collections }))
}

/// Create a collection
pub async fn create_collection(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateCollectionRequest>,
) -> Result<(StatusCode, Json<CollectionResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("name".to_string()),
    })?;

    let collection = state
        .library()
        .create_collection(&request.user_id, &request.name, request.description)
        .await?;

    Ok((StatusCode::CREATED, Json(CollectionResponse { success: true, collection })))
}

/// Delete a collection and everything saved in it
pub async fn delete_collection(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<QueryParams>,
) -> Result<Json<MessageResponse>> {
    state.library().delete_collection(id, &user_id(&params)).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Collection deleted".to_string(),
    }))
}

/// Collection with its saved papers
pub async fn collection_papers(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<QueryParams>,
) -> Result<Json<CollectionPapersResponse>> {
    let (collection, papers) = state.library().collection_papers(id, &user_id(&params)).await?;

    Ok(Json(CollectionPapersResponse { success: true, collection, papers }))
}

/// Export a collection as BibTeX
pub async fn export_collection(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<QueryParams>,
) -> Result<impl IntoResponse> {
    let format = params
        .get("format")
        .map(|f| f.trim().to_ascii_lowercase())
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| "bibtex".to_string());

    let body = state.library().export(id, &user_id(&params), &format).await?;
    let disposition = format!("attachment; filename=\"collection_{}.bib\"", id);

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// Save a paper into one of the user's collections
pub async fn save_paper(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SavePaperRequest>,
) -> Result<(StatusCode, Json<SavedPaperResponse>)> {
    let collection_id = request.collection_id.ok_or_else(|| AppError::MissingField {
        field: "collection_id".to_string(),
    })?;

    let saved_paper = state
        .library()
        .save_paper(SavePaper {
            user_id: request.user_id,
            collection_id,
            paper_id: request.paper_id,
            notes: request.notes,
            status: request.status,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(SavedPaperResponse { success: true, saved_paper })))
}

/// Update notes and/or reading status
pub async fn update_saved_paper(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<QueryParams>,
    JsonBody(request): JsonBody<UpdateSavedPaperRequest>,
) -> Result<Json<SavedPaperResponse>> {
    let saved_paper = state
        .library()
        .update_saved_paper(id, &user_id(&params), request.notes, request.status.as_deref())
        .await?;

    Ok(Json(SavedPaperResponse { success: true, saved_paper }))
}

/// Remove a saved paper
pub async fn delete_saved_paper(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<QueryParams>,
) -> Result<Json<MessageResponse>> {
    state.library().delete_saved_paper(id, &user_id(&params)).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Saved paper deleted".to_string(),
    }))
}
