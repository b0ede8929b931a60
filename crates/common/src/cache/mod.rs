//! Cache store over the relational database
//!
//! Provides:
//! - Local lookups of papers and authors
//! - Write-through caching of upstream works
//! - TTL-based staleness with refresh on access
//! - Stale-row fallback when a refresh cannot reach upstream

use crate::db::models::{Author, Paper};
use crate::db::Repository;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::openalex::{normalize_id, RawWork, WorkSource};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Paper and author cache backed by a repository and an upstream source
#[derive(Clone)]
pub struct PaperCache {
    repo: Repository,
    source: Arc<dyn WorkSource>,
    ttl: Duration,
}

impl PaperCache {
    /// Create a new cache
    pub fn new(repo: Repository, source: Arc<dyn WorkSource>, ttl: Duration) -> Self {
        Self { repo, source, ttl }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn source(&self) -> &dyn WorkSource {
        self.source.as_ref()
    }

    /// Whether a row cached at `cached_at` is still within the TTL
    pub fn is_fresh(&self, cached_at: DateTime<Utc>) -> bool {
        Utc::now() - cached_at < self.ttl
    }

    /// Cached paper, fresh or not, without touching upstream
    pub async fn get_paper(&self, id: &str) -> Result<Option<Paper>> {
        self.repo.find_paper(&normalize_id(id)).await
    }

    /// Write one upstream work through to the cache
    pub async fn upsert_paper(&self, work: RawWork, include_abstract: bool) -> Result<Paper> {
        let record = work.into_record(include_abstract).ok_or_else(|| AppError::InvalidFormat {
            message: "upstream work has no id".to_string(),
        })?;

        self.repo.upsert_work(&record).await
    }

    /// Like `upsert_paper`, but a failure is logged and yields `None`
    pub async fn cache_work(&self, work: RawWork, include_abstract: bool) -> Option<Paper> {
        let id = work.id.clone().unwrap_or_default();

        match self.upsert_paper(work, include_abstract).await {
            Ok(paper) => Some(paper),
            Err(e) => {
                warn!(work_id = %id, error = %e, "Failed to cache work");
                metrics::record_cache_write_failure("paper");
                None
            }
        }
    }

    /// Cached paper while fresh, otherwise refetched (with abstract).
    ///
    /// A stale row is served when the refetch fails.
    pub async fn resolve_paper(&self, id: &str, force_refresh: bool) -> Result<Paper> {
        let id = normalize_id(id);
        if id.is_empty() {
            return Err(AppError::PaperNotFound { id });
        }

        let cached = self.repo.find_paper(&id).await?;

        if let Some(ref paper) = cached {
            if !force_refresh && self.is_fresh(paper.cached_at) {
                debug!(paper_id = %id, "Paper cache hit");
                metrics::record_cache(true, "paper");
                return Ok(paper.clone());
            }
        }
        metrics::record_cache(false, "paper");

        let refreshed = match self.source.fetch_work(&id).await {
            Ok(work) => match self.cache_work(work, true).await {
                Some(paper) => Some(paper),
                // A concurrent writer may have cached the same work
                None => self.repo.find_paper(&id).await?,
            },
            Err(e) => {
                debug!(paper_id = %id, error = %e, "Paper refetch failed");
                None
            }
        };

        match (refreshed, cached) {
            (Some(paper), _) => Ok(paper),
            (None, Some(stale)) => {
                warn!(paper_id = %id, "Serving stale paper");
                Ok(stale)
            }
            (None, None) => Err(AppError::PaperNotFound { id }),
        }
    }

    /// Cached author while fresh, otherwise refetched from the author endpoint
    pub async fn resolve_author(&self, id: &str, force_refresh: bool) -> Result<Author> {
        let id = normalize_id(id);
        if id.is_empty() {
            return Err(AppError::AuthorNotFound { id });
        }

        let cached = self.repo.find_author(&id).await?;

        if let Some(ref author) = cached {
            if !force_refresh && self.is_fresh(author.cached_at) {
                debug!(author_id = %id, "Author cache hit");
                metrics::record_cache(true, "author");
                return Ok(author.clone());
            }
        }
        metrics::record_cache(false, "author");

        let refreshed = match self.source.fetch_author(&id).await {
            Ok(profile) => match profile.into_record() {
                Some(record) => match self.repo.upsert_author(&record).await {
                    Ok(author) => Some(author),
                    Err(e) => {
                        warn!(author_id = %id, error = %e, "Failed to cache author");
                        metrics::record_cache_write_failure("author");
                        self.repo.find_author(&id).await?
                    }
                },
                None => None,
            },
            Err(e) => {
                debug!(author_id = %id, error = %e, "Author refetch failed");
                None
            }
        };

        match (refreshed, cached) {
            (Some(author), _) => Ok(author),
            (None, Some(stale)) => {
                warn!(author_id = %id, "Serving stale author");
                Ok(stale)
            }
            (None, None) => Err(AppError::AuthorNotFound { id }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::PaperActiveModel;
    use crate::db::DbPool;
    use crate::openalex::{MockWorkSource, RawAuthorProfile, RawSummaryStats};
    use sea_orm::{ActiveModelTrait, Set};

    async fn cache_with(source: MockWorkSource) -> (PaperCache, DbPool, Arc<MockWorkSource>) {
        let pool = DbPool::in_memory().await.unwrap();
        let source = Arc::new(source);
        let cache = PaperCache::new(Repository::new(pool.clone()), source.clone(), Duration::days(30));
        (cache, pool, source)
    }

    async fn age_paper(pool: &DbPool, id: &str, days: i64) {
        PaperActiveModel {
            id: Set(id.to_string()),
            cached_at: Set(Utc::now() - Duration::days(days)),
            ..Default::default()
        }
        .update(pool.write())
        .await
        .unwrap();
    }

    fn source() -> MockWorkSource {
        let work = MockWorkSource::work("W1", "Deep residual learning");
        MockWorkSource::new().with_work(MockWorkSource::with_author_of(work, "A1", "Kaiming He"))
    }

    #[tokio::test]
    async fn test_miss_fetches_and_caches() {
        let (cache, _pool, source) = cache_with(source()).await;

        let paper = cache.resolve_paper("https://openalex.org/W1", false).await.unwrap();
        assert_eq!(paper.id, "W1");
        assert_eq!(source.call_count(), 1);

        let authors = cache.repository().authors_for_paper("W1").await.unwrap();
        assert_eq!(authors[0].display_name, "Kaiming He");
    }

    #[tokio::test]
    async fn test_fresh_hit_skips_upstream() {
        let (cache, _pool, source) = cache_with(source()).await;

        cache.resolve_paper("W1", false).await.unwrap();
        cache.resolve_paper("W1", false).await.unwrap();
        assert_eq!(source.call_count(), 1);

        cache.resolve_paper("W1", true).await.unwrap();
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_stale_row_is_refreshed() {
        let (cache, pool, source) = cache_with(source()).await;

        cache.resolve_paper("W1", false).await.unwrap();
        age_paper(&pool, "W1", 31).await;

        let paper = cache.resolve_paper("W1", false).await.unwrap();
        assert_eq!(source.call_count(), 2);
        assert!(cache.is_fresh(paper.cached_at));
    }

    #[tokio::test]
    async fn test_stale_row_served_when_upstream_down() {
        let (warm, pool, _) = cache_with(source()).await;
        warm.resolve_paper("W1", false).await.unwrap();
        age_paper(&pool, "W1", 45).await;

        let down = PaperCache::new(
            Repository::new(pool.clone()),
            Arc::new(MockWorkSource::new().unavailable()),
            Duration::days(30),
        );

        let paper = down.resolve_paper("W1", false).await.unwrap();
        assert_eq!(paper.id, "W1");
        assert!(!down.is_fresh(paper.cached_at));
    }

    #[tokio::test]
    async fn test_unknown_paper_is_not_found() {
        let (cache, _pool, _) = cache_with(MockWorkSource::new()).await;

        let err = cache.resolve_paper("W404", false).await.unwrap_err();
        assert!(matches!(err, AppError::PaperNotFound { ref id } if id == "W404"));
    }

    #[tokio::test]
    async fn test_upstream_outage_without_cache_is_not_found() {
        let (cache, _pool, _) = cache_with(MockWorkSource::new().unavailable()).await;

        let err = cache.resolve_paper("W1", false).await.unwrap_err();
        assert!(matches!(err, AppError::PaperNotFound { .. }));
    }

    #[tokio::test]
    async fn test_cache_work_without_id_degrades() {
        let (cache, _pool, _) = cache_with(MockWorkSource::new()).await;
        assert!(cache.cache_work(RawWork::default(), false).await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_author_fills_stats() {
        let profile = RawAuthorProfile {
            id: Some("https://openalex.org/A1".to_string()),
            display_name: Some("Kaiming He".to_string()),
            works_count: Some(120),
            cited_by_count: Some(500_000),
            summary_stats: Some(RawSummaryStats { h_index: Some(70) }),
            ..Default::default()
        };
        let (cache, _pool, source) = cache_with(source().with_author(profile)).await;

        // Stub created through the work's authorship first
        cache.resolve_paper("W1", false).await.unwrap();
        let stub = cache.repository().find_author("A1").await.unwrap().unwrap();
        assert!(!cache.is_fresh(stub.cached_at));

        let author = cache.resolve_author("A1", false).await.unwrap();
        assert_eq!(author.h_index, 70);
        assert_eq!(author.works_count, 120);
        assert_eq!(source.call_count(), 2);

        cache.resolve_author("A1", false).await.unwrap();
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_all_resolve() {
        let path = std::env::temp_dir().join(format!(
            "citegraph-cache-{}-{}.db",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let config = crate::config::DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", path.display()),
            max_connections: 8,
            min_connections: 1,
            ..Default::default()
        };
        let pool = DbPool::new(&config).await.unwrap();
        crate::db::migrate(pool.write()).await.unwrap();

        let mut source = MockWorkSource::new();
        for n in 0..10 {
            let work = MockWorkSource::work(&format!("W{}", n), "Shared paper");
            source = source.with_work(MockWorkSource::with_author_of(work, "A1", "Kaiming He"));
        }
        let cache = PaperCache::new(Repository::new(pool.clone()), Arc::new(source), Duration::days(30));

        for n in 0..10 {
            let id = format!("W{}", n);
            let tasks: Vec<_> = (0..4)
                .map(|_| {
                    let cache = cache.clone();
                    let id = id.clone();
                    tokio::spawn(async move { cache.resolve_paper(&id, false).await })
                })
                .collect();

            for task in tasks {
                let paper = task.await.unwrap().unwrap();
                assert_eq!(paper.id, id);
            }
        }

        assert_eq!(cache.repository().papers_for_author("A1").await.unwrap().len(), 10);

        drop(cache);
        drop(pool);
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
