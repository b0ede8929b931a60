//! In-process `WorkSource` for tests

use super::{
    normalize_id, RawAuthor, RawAuthorProfile, RawAuthorship, RawLocation, RawSource, RawWork,
    UpstreamError, UpstreamResult, WorkQuery, WorkSource, WorksMeta, WorksPage,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mock upstream holding a fixed set of works and citation edges.
///
/// Understands the `cites:`, `cited_by:`, `publication_year:` and
/// `cited_by_count:` filters; `search` matches titles case-insensitively.
#[derive(Default)]
pub struct MockWorkSource {
    works: HashMap<String, RawWork>,
    authors: HashMap<String, RawAuthorProfile>,
    /// (citing, cited)
    edges: Vec<(String, String)>,
    unavailable: bool,
    calls: AtomicUsize,
    queries: Mutex<Vec<WorkQuery>>,
}

impl MockWorkSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimal work with an OpenAlex-style URL id
    pub fn work(id: &str, title: &str) -> RawWork {
        RawWork {
            id: Some(format!("https://openalex.org/{}", id)),
            title: Some(title.to_string()),
            publication_year: Some(2020),
            cited_by_count: Some(0),
            primary_location: Some(RawLocation {
                source: Some(RawSource { display_name: Some("Mock Journal".to_string()) }),
                pdf_url: None,
            }),
            ..RawWork::default()
        }
    }

    /// Attach an author stub to a work
    pub fn with_author_of(mut work: RawWork, author_id: &str, name: &str) -> RawWork {
        work.authorships.get_or_insert_with(Vec::new).push(RawAuthorship {
            author: Some(RawAuthor {
                id: Some(format!("https://openalex.org/{}", author_id)),
                display_name: Some(name.to_string()),
                orcid: None,
            }),
            institutions: None,
        });
        work
    }

    pub fn with_work(mut self, work: RawWork) -> Self {
        if let Some(id) = work.work_id() {
            self.works.insert(id, work);
        }
        self
    }

    pub fn with_author(mut self, profile: RawAuthorProfile) -> Self {
        if let Some(id) = profile.id.as_deref().map(normalize_id) {
            self.authors.insert(id, profile);
        }
        self
    }

    /// Record that `citing` cites `cited`
    pub fn with_citation(mut self, citing: &str, cited: &str) -> Self {
        self.edges.push((citing.to_string(), cited.to_string()));
        self
    }

    /// Make every call fail as unavailable
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Number of upstream calls served so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Listing queries received so far
    pub fn queries(&self) -> Vec<WorkQuery> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }

    fn begin(&self) -> UpstreamResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(UpstreamError::Unavailable { message: "mock upstream is down".to_string() });
        }
        Ok(())
    }

    fn matches(&self, id: &str, work: &RawWork, query: &WorkQuery) -> bool {
        if let Some(ref search) = query.search {
            let title = work.title.as_deref().unwrap_or_default().to_lowercase();
            if !title.contains(&search.to_lowercase()) {
                return false;
            }
        }

        let Some(ref filter) = query.filter else {
            return true;
        };

        filter.split(',').all(|clause| {
            if let Some(target) = clause.strip_prefix("cites:") {
                self.edges.iter().any(|(a, b)| a == id && b == target)
            } else if let Some(source) = clause.strip_prefix("cited_by:") {
                self.edges.iter().any(|(a, b)| a == source && b == id)
            } else if let Some(year) = clause.strip_prefix("publication_year:>=") {
                bound(work.publication_year.map(i64::from), year, |v, b| v >= b)
            } else if let Some(year) = clause.strip_prefix("publication_year:<=") {
                bound(work.publication_year.map(i64::from), year, |v, b| v <= b)
            } else if let Some(count) = clause.strip_prefix("cited_by_count:>=") {
                bound(work.cited_by_count, count, |v, b| v >= b)
            } else {
                false
            }
        })
    }
}

fn bound(value: Option<i64>, raw: &str, cmp: impl Fn(i64, i64) -> bool) -> bool {
    match (value, raw.parse::<i64>()) {
        (Some(v), Ok(b)) => cmp(v, b),
        _ => false,
    }
}

#[async_trait]
impl WorkSource for MockWorkSource {
    async fn fetch_work(&self, id: &str) -> UpstreamResult<RawWork> {
        self.begin()?;
        self.works
            .get(id)
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound { resource: format!("/works/{}", id) })
    }

    async fn list_works(&self, query: &WorkQuery) -> UpstreamResult<WorksPage> {
        self.begin()?;
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }

        let mut ids: Vec<&String> = self
            .works
            .iter()
            .filter(|(id, work)| self.matches(id, work, query))
            .map(|(id, _)| id)
            .collect();
        ids.sort();

        if query.sort.as_deref() == Some("cited_by_count:desc") {
            ids.sort_by_key(|id| std::cmp::Reverse(self.works[*id].cited_by_count.unwrap_or(0)));
        }

        let count = ids.len() as i64;
        let per_page = query.per_page.max(1) as usize;
        let page = query.page.unwrap_or(1).max(1) as usize;

        let results = ids
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .map(|id| self.works[id].clone())
            .collect();

        Ok(WorksPage {
            meta: WorksMeta {
                count,
                page: Some(page as i64),
                per_page: Some(per_page as i64),
            },
            results,
        })
    }

    async fn fetch_author(&self, id: &str) -> UpstreamResult<RawAuthorProfile> {
        self.begin()?;
        self.authors
            .get(id)
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound { resource: format!("/authors/{}", id) })
    }
}
