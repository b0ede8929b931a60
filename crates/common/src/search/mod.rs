//! Search facade over the upstream works listing
//!
//! Every result is written through the cache before it is returned, so a
//! search always warms the cache.

use crate::cache::PaperCache;
use crate::config::OpenAlexConfig;
use crate::errors::Result;
use crate::metrics;
use crate::openalex::{SearchFilters, WorkQuery};
use crate::views::PaperView;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub results: Vec<PaperView>,
    pub meta: SearchMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMeta {
    /// Total matches reported upstream
    pub count: i64,
    pub page: u32,
    pub per_page: u32,
}

/// Title or author suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Suggestion {
    Paper { text: String, paper_id: String },
    Author { text: String, author_id: String },
}

impl Suggestion {
    pub fn text(&self) -> &str {
        match self {
            Suggestion::Paper { text, .. } | Suggestion::Author { text, .. } => text,
        }
    }
}

/// Search facade
pub struct SearchService {
    cache: PaperCache,
    max_page_size: u32,
}

impl SearchService {
    pub fn new(cache: PaperCache, config: &OpenAlexConfig) -> Self {
        Self {
            cache,
            max_page_size: config.max_page_size.max(1),
        }
    }

    /// Search upstream and cache every hit.
    ///
    /// `per_page` is clamped to the configured maximum. An upstream failure
    /// yields an empty page.
    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
        page: u32,
        per_page: u32,
    ) -> Result<SearchResults> {
        let page = page.max(1);
        let upstream_per_page = per_page.clamp(1, self.max_page_size);
        let request = WorkQuery::search(query, filters, page, upstream_per_page);

        let (count, works) = match self.cache.source().list_works(&request).await {
            Ok(listing) => (listing.meta.count, listing.results),
            Err(e) => {
                warn!(query = %query, error = %e, "Search failed upstream, returning no results");
                (0, Vec::new())
            }
        };

        let mut papers = Vec::with_capacity(works.len());
        for work in works {
            if let Some(paper) = self.cache.cache_work(work, false).await {
                papers.push(paper);
            }
        }

        let results = PaperView::load_many(self.cache.repository(), &papers, false).await?;
        metrics::record_search(!filters.is_empty(), results.len());

        Ok(SearchResults {
            results,
            meta: SearchMeta { count, page, per_page: upstream_per_page },
        })
    }

    /// Up to `limit` distinct titles and author names from the first page
    pub async fn suggestions(&self, query: &str, limit: usize) -> Result<Vec<Suggestion>> {
        let limit = limit.max(1);
        let page = self
            .search(query, &SearchFilters::default(), 1, limit as u32)
            .await?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut suggestions = Vec::with_capacity(limit);

        'papers: for paper in page.results {
            if !paper.title.is_empty() && seen.insert(paper.title.clone()) {
                suggestions.push(Suggestion::Paper {
                    text: paper.title.clone(),
                    paper_id: paper.id.clone(),
                });
            }

            for author in paper.authors.unwrap_or_default() {
                if suggestions.len() >= limit {
                    break 'papers;
                }
                if !author.display_name.is_empty() && seen.insert(author.display_name.clone()) {
                    suggestions.push(Suggestion::Author {
                        text: author.display_name,
                        author_id: author.id,
                    });
                }
            }

            if suggestions.len() >= limit {
                break;
            }
        }

        suggestions.truncate(limit);
        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DbPool, Repository};
    use crate::openalex::MockWorkSource;
    use chrono::Duration;
    use std::sync::Arc;

    async fn service(source: MockWorkSource) -> (SearchService, PaperCache, Arc<MockWorkSource>) {
        let pool = DbPool::in_memory().await.unwrap();
        let source = Arc::new(source);
        let cache = PaperCache::new(Repository::new(pool), source.clone(), Duration::days(30));
        let config = OpenAlexConfig::default();
        (SearchService::new(cache.clone(), &config), cache, source)
    }

    fn corpus() -> MockWorkSource {
        let mut old = MockWorkSource::work("W1", "Neural networks for pattern recognition");
        old.publication_year = Some(1995);
        old.cited_by_count = Some(30_000);
        let old = MockWorkSource::with_author_of(old, "A1", "Christopher Bishop");

        let mut recent = MockWorkSource::work("W2", "Graph neural networks: a review");
        recent.publication_year = Some(2020);
        recent.cited_by_count = Some(4_000);
        let recent = MockWorkSource::with_author_of(recent, "A2", "Jie Zhou");

        MockWorkSource::new().with_work(old).with_work(recent)
    }

    #[tokio::test]
    async fn test_search_warms_cache() {
        let (service, cache, _) = service(corpus()).await;

        let results = service
            .search("neural networks", &SearchFilters::default(), 1, 20)
            .await
            .unwrap();

        assert_eq!(results.meta.count, 2);
        assert_eq!(results.results.len(), 2);
        assert!(cache.get_paper("W1").await.unwrap().is_some());
        assert!(cache.get_paper("W2").await.unwrap().is_some());
        assert_eq!(results.results[0].authors.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_filters_reach_upstream() {
        let (service, _, source) = service(corpus()).await;
        let filters = SearchFilters { year_min: Some(2015), ..Default::default() };

        let results = service.search("neural", &filters, 1, 20).await.unwrap();
        assert_eq!(results.results.len(), 1);
        assert_eq!(results.results[0].id, "W2");

        let sent = &source.queries()[0];
        assert_eq!(sent.filter.as_deref(), Some("publication_year:>=2015"));
    }

    #[tokio::test]
    async fn test_inverted_year_range_yields_nothing() {
        let (service, _, _) = service(corpus()).await;
        let filters = SearchFilters { year_min: Some(2020), year_max: Some(2019), min_citations: None };

        let results = service.search("neural", &filters, 1, 20).await.unwrap();
        assert!(results.results.is_empty());
        assert_eq!(results.meta.count, 0);
    }

    #[tokio::test]
    async fn test_per_page_is_clamped_upstream() {
        let (service, _, source) = service(corpus()).await;

        let results = service.search("neural", &SearchFilters::default(), 1, 500).await.unwrap();
        assert_eq!(source.queries()[0].per_page, 100);
        assert_eq!(results.meta.per_page, 100);

        let results = service.search("neural", &SearchFilters::default(), 1, 0).await.unwrap();
        assert_eq!(source.queries()[1].per_page, 1);
        assert_eq!(results.meta.per_page, 1);
    }

    #[tokio::test]
    async fn test_upstream_failure_yields_empty_page() {
        let (service, _, _) = service(corpus().unavailable()).await;

        let results = service.search("neural", &SearchFilters::default(), 1, 20).await.unwrap();
        assert!(results.results.is_empty());
    }

    #[tokio::test]
    async fn test_suggestions_mix_titles_and_authors() {
        let (service, _, _) = service(corpus()).await;

        let suggestions = service.suggestions("neural", 3).await.unwrap();
        assert_eq!(suggestions.len(), 3);
        assert!(matches!(suggestions[0], Suggestion::Paper { .. }));
        assert!(matches!(suggestions[1], Suggestion::Author { .. }));

        let json = serde_json::to_value(&suggestions[1]).unwrap();
        assert_eq!(json["type"], "author");
    }
}
