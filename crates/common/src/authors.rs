//! Author profile aggregates over the local cache

use crate::cache::PaperCache;
use crate::errors::Result;
use crate::views::{AuthorView, PaperView};
use serde::Serialize;
use std::collections::BTreeMap;

/// Top cited papers listed per author
pub const TOP_PAPERS_LIMIT: usize = 10;

/// Co-authors listed per author
pub const COAUTHORS_LIMIT: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct Coauthor {
    #[serde(flatten)]
    pub author: AuthorView,
    pub collaboration_count: u64,
}

/// Author with aggregates computed from cached papers
#[derive(Debug, Clone, Serialize)]
pub struct AuthorProfile {
    pub author: AuthorView,
    pub papers_by_year: BTreeMap<i32, usize>,
    pub top_papers: Vec<PaperView>,
    pub coauthors: Vec<Coauthor>,
}

/// Resolve an author and aggregate what the cache knows about them
pub async fn author_profile(cache: &PaperCache, id: &str, force_refresh: bool) -> Result<AuthorProfile> {
    let author = cache.resolve_author(id, force_refresh).await?;
    let repo = cache.repository();

    let mut papers = repo.papers_for_author(&author.id).await?;

    let mut papers_by_year = BTreeMap::new();
    for year in papers.iter().filter_map(|p| p.publication_year) {
        *papers_by_year.entry(year).or_insert(0) += 1;
    }

    papers.sort_by(|a, b| b.citation_count.cmp(&a.citation_count).then_with(|| a.id.cmp(&b.id)));
    let top_papers = papers
        .iter()
        .take(TOP_PAPERS_LIMIT)
        .map(|p| PaperView::new(p, false))
        .collect();

    let coauthors = repo
        .coauthors(&author.id, COAUTHORS_LIMIT)
        .await?
        .into_iter()
        .map(|(a, count)| Coauthor {
            author: AuthorView::new(&a),
            collaboration_count: count,
        })
        .collect();

    Ok(AuthorProfile {
        author: AuthorView::with_stats(&author),
        papers_by_year,
        top_papers,
        coauthors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DbPool, Repository};
    use crate::openalex::MockWorkSource;
    use chrono::Duration;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_profile_aggregates() {
        let mut first = MockWorkSource::work("W1", "Early work");
        first.publication_year = Some(2019);
        first.cited_by_count = Some(5);
        let first = MockWorkSource::with_author_of(first, "A1", "Ada");
        let first = MockWorkSource::with_author_of(first, "A2", "Grace");

        let mut second = MockWorkSource::work("W2", "Famous work");
        second.publication_year = Some(2021);
        second.cited_by_count = Some(500);
        let second = MockWorkSource::with_author_of(second, "A1", "Ada");
        let second = MockWorkSource::with_author_of(second, "A2", "Grace");

        let source = Arc::new(MockWorkSource::new().with_work(first).with_work(second));
        let pool = DbPool::in_memory().await.unwrap();
        let cache = PaperCache::new(Repository::new(pool), source, Duration::days(30));

        cache.resolve_paper("W1", false).await.unwrap();
        cache.resolve_paper("W2", false).await.unwrap();

        // No author endpoint data in the mock: the cached stub is served
        let profile = author_profile(&cache, "A1", false).await.unwrap();

        assert_eq!(profile.author.id, "A1");
        assert_eq!(profile.papers_by_year.get(&2019), Some(&1));
        assert_eq!(profile.papers_by_year.get(&2021), Some(&1));
        assert_eq!(profile.top_papers[0].id, "W2");
        assert_eq!(profile.coauthors.len(), 1);
        assert_eq!(profile.coauthors[0].collaboration_count, 2);
    }

    #[tokio::test]
    async fn test_unknown_author_is_not_found() {
        let source = Arc::new(MockWorkSource::new());
        let pool = DbPool::in_memory().await.unwrap();
        let cache = PaperCache::new(Repository::new(pool), source, Duration::days(30));

        tokio_test::assert_err!(author_profile(&cache, "A404", false).await);
    }
}
