//! Author profile handler

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;

use super::{parse_flag, QueryParams};
use crate::AppState;
use citegraph_common::{
    authors::{author_profile, AuthorProfile},
    errors::Result,
};

#[derive(Serialize)]
pub struct AuthorResponse {
    pub success: bool,
    #[serde(flatten)]
    pub profile: AuthorProfile,
}

/// Author with stats, papers by year, top papers and co-authors
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<QueryParams>,
) -> Result<Json<AuthorResponse>> {
    let force_refresh = parse_flag(&params, "force_refresh", false);

    let profile = author_profile(&state.cache(), &id, force_refresh).await?;

    Ok(Json(AuthorResponse { success: true, profile }))
}
