//! Health check and index handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::{json, Value};
use crate::AppState;
use citegraph_common::VERSION;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub database: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// API index with the endpoint map
pub async fn index() -> Json<Value> {
    Json(json!({
        "success": true,
        "name": "Citegraph API",
        "version": VERSION,
        "endpoints": {
            "health": "/health",
            "ready": "/ready",
            "search": "/api/search",
            "suggestions": "/api/search/suggestions",
            "filters": "/api/search/filters",
            "paper": "/api/papers/{id}",
            "citations": "/api/papers/{id}/citations",
            "graph": "/api/papers/{id}/graph",
            "expand": "/api/papers/{id}/expand",
            "batch": "/api/papers/batch",
            "author": "/api/authors/{id}",
            "collections": "/api/library/collections",
            "saved_papers": "/api/library/saved-papers"
        }
    }))
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "Citegraph API is running".to_string(),
        version: VERSION.to_string(),
    })
}

/// Readiness probe - checks all dependencies
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let start = std::time::Instant::now();

    let db_check = match state.db.ping().await {
        Ok(_) => CheckResult {
            status: "up".to_string(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => CheckResult {
            status: "down".to_string(),
            latency_ms: None,
            error: Some(e.to_string()),
        },
    };

    let all_healthy = db_check.status == "up";
    let status = if all_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(ReadyResponse {
            status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
            checks: HealthChecks {
                database: db_check,
            },
        }),
    )
}
