//! Per-request metrics keyed by the matched route template

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use citegraph_common::metrics::RequestMetrics;

/// Record count and latency for every routed request
pub async fn track_requests(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = request.method().to_string();

    let timer = RequestMetrics::start(&method, &endpoint);
    let response = next.run(request).await;
    timer.finish(response.status().as_u16());

    response
}
