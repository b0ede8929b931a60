//! OpenAlex upstream client
//!
//! Every call goes through one process-wide `FixedWindowLimiter` and returns
//! an explicit `UpstreamResult`; callers choose whether to degrade or
//! propagate.

mod abstract_index;
mod mock;
mod query;
mod rate_limit;
mod types;

pub use abstract_index::reconstruct_abstract;
pub use mock::MockWorkSource;
pub use query::{SearchFilters, WorkQuery};
pub use rate_limit::FixedWindowLimiter;
pub use types::*;

use crate::config::OpenAlexConfig;
use crate::errors::Result;
use crate::metrics;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure of one upstream call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("no upstream record at {resource}")]
    NotFound { resource: String },

    #[error("upstream unavailable: {message}")]
    Unavailable { message: String },
}

pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;

/// Reduce `https://openalex.org/W123` (or `W123`) to `W123`
pub fn normalize_id(raw: &str) -> String {
    raw.trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Source of works and authors
#[async_trait]
pub trait WorkSource: Send + Sync {
    /// `GET /works/{id}`
    async fn fetch_work(&self, id: &str) -> UpstreamResult<RawWork>;

    /// `GET /works` with search, filter, sort and paging
    async fn list_works(&self, query: &WorkQuery) -> UpstreamResult<WorksPage>;

    /// `GET /authors/{id}`
    async fn fetch_author(&self, id: &str) -> UpstreamResult<RawAuthorProfile>;
}

/// HTTP client for the OpenAlex REST API
pub struct OpenAlexClient {
    http: reqwest::Client,
    base_url: String,
    limiter: FixedWindowLimiter,
}

impl OpenAlexClient {
    /// Build a client from configuration
    pub fn new(config: &OpenAlexConfig) -> Result<Self> {
        let user_agent = match config.email {
            Some(ref email) => format!("ResearchGraphApp/1.0 (mailto:{})", email),
            None => format!("citegraph/{}", crate::VERSION),
        };

        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            limiter: FixedWindowLimiter::new(config.rate_limit_calls, config.rate_limit_period()),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        params: &[(&'static str, String)],
    ) -> UpstreamResult<T> {
        let waited = self.limiter.acquire().await;
        if !waited.is_zero() {
            metrics::record_rate_limit_wait(waited.as_secs_f64());
        }

        let url = format!("{}{}", self.base_url, path);
        let start = Instant::now();
        let result = self.send(&url, params).await;

        let outcome = match result {
            Ok(_) => "success",
            Err(UpstreamError::NotFound { .. }) => "not_found",
            Err(UpstreamError::Unavailable { .. }) => "error",
        };
        metrics::record_upstream(endpoint, outcome, start.elapsed().as_secs_f64());

        match result {
            Err(UpstreamError::Unavailable { ref message }) => {
                warn!(url = %url, error = %message, "OpenAlex request failed");
            }
            Err(UpstreamError::NotFound { .. }) => {
                debug!(url = %url, "OpenAlex has no such record");
            }
            Ok(_) => {}
        }

        result
    }

    async fn send<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&'static str, String)],
    ) -> UpstreamResult<T> {
        let response = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable { message: format!("request failed: {}", e) })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound { resource: url.to_string() });
        }
        if !status.is_success() {
            return Err(UpstreamError::Unavailable { message: format!("status {}", status) });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| UpstreamError::Unavailable { message: format!("malformed response: {}", e) })
    }
}

#[async_trait]
impl WorkSource for OpenAlexClient {
    async fn fetch_work(&self, id: &str) -> UpstreamResult<RawWork> {
        self.get("work", &format!("/works/{}", id), &[]).await
    }

    async fn list_works(&self, query: &WorkQuery) -> UpstreamResult<WorksPage> {
        self.get("works", "/works", &query.to_params()).await
    }

    async fn fetch_author(&self, id: &str) -> UpstreamResult<RawAuthorProfile> {
        self.get("author", &format!("/authors/{}", id), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_id("https://openalex.org/W2741809807"), "W2741809807");
        assert_eq!(normalize_id("W2741809807"), "W2741809807");
        assert_eq!(normalize_id(" https://openalex.org/A1/ "), "A1");
        assert_eq!(normalize_id(""), "");
    }

    #[test]
    fn test_client_builds_from_defaults() {
        let config = OpenAlexConfig {
            api_url: "https://api.openalex.org/".to_string(),
            email: Some("ops@example.org".to_string()),
            ..OpenAlexConfig::default()
        };
        let client = OpenAlexClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://api.openalex.org");
        assert_eq!(client.limiter.max_calls(), 10);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_unavailable() {
        let config = OpenAlexConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..OpenAlexConfig::default()
        };
        let client = OpenAlexClient::new(&config).unwrap();

        let err = client.fetch_work("W1").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Unavailable { .. }));
    }
}
