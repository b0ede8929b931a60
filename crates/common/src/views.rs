//! JSON views of cached records

use crate::db::models::{Author, Paper};
use crate::db::Repository;
use crate::errors::Result;
use serde::{Deserialize, Serialize};

/// Author as embedded in paper views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorView {
    pub id: String,
    pub display_name: String,
    pub orcid: Option<String>,
    pub last_known_institution: Option<String>,
    pub openalex_url: Option<String>,
    #[serde(flatten)]
    pub stats: Option<AuthorStatsView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorStatsView {
    pub works_count: i32,
    pub cited_by_count: i32,
    pub h_index: i32,
}

impl AuthorView {
    pub fn new(author: &Author) -> Self {
        Self {
            id: author.id.clone(),
            display_name: author.display_name.clone(),
            orcid: author.orcid.clone(),
            last_known_institution: author.last_known_institution.clone(),
            openalex_url: author.openalex_url.clone(),
            stats: None,
        }
    }

    pub fn with_stats(author: &Author) -> Self {
        Self {
            stats: Some(AuthorStatsView {
                works_count: author.works_count,
                cited_by_count: author.cited_by_count,
                h_index: author.h_index,
            }),
            ..Self::new(author)
        }
    }
}

/// Paper as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperView {
    pub id: String,
    pub title: String,
    pub doi: Option<String>,
    pub publication_year: Option<i32>,
    pub publication_date: Option<String>,
    pub venue: Option<String>,
    pub citation_count: i32,
    pub referenced_works_count: i32,
    pub openalex_url: Option<String>,
    pub pdf_url: Option<String>,
    /// Outer `None` omits the key; inner `None` renders `null`
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<AuthorView>>,
}

impl PaperView {
    /// View without authors
    pub fn new(paper: &Paper, include_abstract: bool) -> Self {
        Self {
            id: paper.id.clone(),
            title: paper.title.clone(),
            doi: paper.doi.clone(),
            publication_year: paper.publication_year,
            publication_date: paper.publication_date.clone(),
            venue: paper.venue.clone(),
            citation_count: paper.citation_count,
            referenced_works_count: paper.referenced_works_count,
            openalex_url: paper.openalex_url.clone(),
            pdf_url: paper.pdf_url.clone(),
            abstract_text: include_abstract.then(|| paper.abstract_text.clone()),
            authors: None,
        }
    }

    pub fn with_authors(paper: &Paper, authors: &[Author], include_abstract: bool) -> Self {
        Self {
            authors: Some(authors.iter().map(AuthorView::new).collect()),
            ..Self::new(paper, include_abstract)
        }
    }

    /// Load authors for one paper and build its view
    pub async fn load(repo: &Repository, paper: &Paper, include_abstract: bool) -> Result<Self> {
        let authors = repo.authors_for_paper(&paper.id).await?;
        Ok(Self::with_authors(paper, &authors, include_abstract))
    }

    /// Views for several papers with authors loaded in one pass, input order kept
    pub async fn load_many(repo: &Repository, papers: &[Paper], include_abstract: bool) -> Result<Vec<Self>> {
        let ids: Vec<String> = papers.iter().map(|p| p.id.clone()).collect();
        let authors = repo.authors_for_papers(&ids).await?;

        Ok(papers
            .iter()
            .map(|paper| {
                let list = authors.get(&paper.id).map(Vec::as_slice).unwrap_or_default();
                Self::with_authors(paper, list, include_abstract)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn paper() -> Paper {
        Paper {
            id: "W1".to_string(),
            title: "On computable numbers".to_string(),
            abstract_text: None,
            doi: Some("10.1112/plms/s2-42.1.230".to_string()),
            publication_year: Some(1937),
            publication_date: None,
            venue: Some("Proceedings of the LMS".to_string()),
            citation_count: 9000,
            referenced_works_count: 4,
            openalex_url: None,
            pdf_url: None,
            cached_at: Utc::now(),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_abstract_key_follows_flag() {
        let without = serde_json::to_value(PaperView::new(&paper(), false)).unwrap();
        assert!(without.get("abstract").is_none());
        assert!(without.get("authors").is_none());

        let with = serde_json::to_value(PaperView::new(&paper(), true)).unwrap();
        assert_eq!(with.get("abstract"), Some(&json!(null)));
    }

    #[test]
    fn test_author_stats_are_flattened() {
        let author = Author {
            id: "A1".to_string(),
            display_name: "Alan Turing".to_string(),
            orcid: None,
            last_known_institution: Some("Princeton".to_string()),
            institution_id: None,
            works_count: 40,
            cited_by_count: 50_000,
            h_index: 25,
            openalex_url: None,
            cached_at: Utc::now(),
            last_updated: Utc::now(),
        };

        let plain = serde_json::to_value(AuthorView::new(&author)).unwrap();
        assert!(plain.get("h_index").is_none());

        let full = serde_json::to_value(AuthorView::with_stats(&author)).unwrap();
        assert_eq!(full["h_index"], json!(25));
        assert_eq!(full["works_count"], json!(40));
    }
}
