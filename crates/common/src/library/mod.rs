//! Reading library: collections, saved papers and export
//!
//! A saved paper only records an id. Its metadata comes from the cached
//! paper when there is one, otherwise from a JSON object stored in the
//! notes, otherwise there is none.

mod bibtex;

pub use bibtex::{render_all, BibEntry};

use crate::db::models::{Author, Collection, Paper, ReadingStatus, SavedPaper};
use crate::db::{NewCollection, Repository, SavedPaperUpdate};
use crate::errors::{AppError, Result};
use crate::views::PaperView;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Owner used when a request names none
pub const DEFAULT_USER: &str = "anonymous";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionView {
    pub id: i32,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub paper_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CollectionView {
    fn new(collection: Collection, paper_count: u64) -> Self {
        Self {
            id: collection.id,
            user_id: collection.user_id,
            name: collection.name,
            description: collection.description,
            paper_count,
            created_at: collection.created_at,
            updated_at: collection.updated_at,
        }
    }
}

/// Metadata recovered from a JSON object in the notes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotesMetadata {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub publication_year: Option<i32>,
    pub venue: Option<String>,
    pub doi: Option<String>,
}

impl NotesMetadata {
    /// Parse notes holding a JSON object; anything else is `None`
    pub fn parse(notes: &str) -> Option<Self> {
        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(notes) else {
            return None;
        };

        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);

        let authors = map
            .get("authors")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|a| match a {
                        Value::String(name) => Some(name.clone()),
                        Value::Object(obj) => obj.get("display_name").and_then(Value::as_str).map(str::to_string),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let publication_year = map
            .get("publication_year")
            .or_else(|| map.get("year"))
            .and_then(|v| match v {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .and_then(|y| i32::try_from(y).ok());

        Some(Self {
            title: text("title"),
            authors,
            publication_year,
            venue: text("venue"),
            doi: text("doi"),
        })
    }
}

/// Where a saved paper's metadata came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SavedPaperDetails {
    Cached(PaperView),
    FromNotes(NotesMetadata),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPaperView {
    pub id: i32,
    pub user_id: String,
    pub collection_id: i32,
    pub paper_id: String,
    pub notes: Option<String>,
    pub status: String,
    pub saved_at: DateTime<Utc>,
    pub paper: Option<SavedPaperDetails>,
}

/// Request to save a paper
#[derive(Debug, Clone)]
pub struct SavePaper {
    pub user_id: String,
    pub collection_id: i32,
    pub paper_id: String,
    pub notes: Option<String>,
    pub status: Option<String>,
}

/// Library operations for one repository
pub struct LibraryService {
    repo: Repository,
}

impl LibraryService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    // ========================================================================
    // Collections
    // ========================================================================

    pub async fn list_collections(&self, user_id: &str) -> Result<Vec<CollectionView>> {
        let collections = self.repo.list_collections(user_id).await?;
        Ok(collections
            .into_iter()
            .map(|(c, count)| CollectionView::new(c, count))
            .collect())
    }

    pub async fn create_collection(
        &self,
        user_id: &str,
        name: &str,
        description: Option<String>,
    ) -> Result<CollectionView> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::invalid("name", "Collection name is required"));
        }

        let collection = self
            .repo
            .create_collection(NewCollection {
                user_id: user_id.to_string(),
                name: name.to_string(),
                description,
            })
            .await?;

        info!(collection_id = collection.id, user_id = %user_id, "Collection created");
        Ok(CollectionView::new(collection, 0))
    }

    /// Delete a collection together with its saved papers
    pub async fn delete_collection(&self, id: i32, user_id: &str) -> Result<()> {
        if !self.repo.delete_collection(id, user_id).await? {
            return Err(AppError::CollectionNotFound { id });
        }
        info!(collection_id = id, user_id = %user_id, "Collection deleted");
        Ok(())
    }

    async fn owned_collection(&self, id: i32, user_id: &str) -> Result<Collection> {
        self.repo
            .find_collection(id, user_id)
            .await?
            .ok_or(AppError::CollectionNotFound { id })
    }

    /// A collection and the views of its saved papers
    pub async fn collection_papers(
        &self,
        id: i32,
        user_id: &str,
    ) -> Result<(CollectionView, Vec<SavedPaperView>)> {
        let collection = self.owned_collection(id, user_id).await?;
        let saved = self.repo.saved_papers_in(id, user_id).await?;

        let mut views = Vec::with_capacity(saved.len());
        for entry in saved {
            views.push(self.saved_view(entry).await?);
        }

        let count = views.len() as u64;
        Ok((CollectionView::new(collection, count), views))
    }

    /// Export a collection; only `bibtex` is supported
    pub async fn export(&self, id: i32, user_id: &str, format: &str) -> Result<String> {
        self.owned_collection(id, user_id).await?;

        if format != "bibtex" {
            return Err(AppError::invalid("format", format!("Unsupported format '{}'", format)));
        }

        let saved = self.repo.saved_papers_in(id, user_id).await?;
        let mut entries = Vec::with_capacity(saved.len());
        for entry in &saved {
            entries.push(self.bib_entry(entry).await?);
        }

        Ok(render_all(&entries))
    }

    // ========================================================================
    // Saved papers
    // ========================================================================

    pub async fn save_paper(&self, request: SavePaper) -> Result<SavedPaperView> {
        let paper_id = request.paper_id.trim();
        if paper_id.is_empty() {
            return Err(AppError::MissingField { field: "paper_id".to_string() });
        }

        let status = parse_status(request.status.as_deref())?.unwrap_or_default();

        self.owned_collection(request.collection_id, &request.user_id).await?;

        if self
            .repo
            .find_saved_duplicate(paper_id, request.collection_id, &request.user_id)
            .await?
            .is_some()
        {
            return Err(AppError::Duplicate {
                message: "Paper already saved in this collection".to_string(),
            });
        }

        let saved = self
            .repo
            .create_saved_paper(&request.user_id, request.collection_id, paper_id, request.notes, status)
            .await?;

        info!(saved_paper_id = saved.id, paper_id = %paper_id, "Paper saved");
        self.saved_view(saved).await
    }

    /// Update notes and/or status; absent fields are left alone
    pub async fn update_saved_paper(
        &self,
        id: i32,
        user_id: &str,
        notes: Option<String>,
        status: Option<&str>,
    ) -> Result<SavedPaperView> {
        let update = SavedPaperUpdate {
            notes,
            status: parse_status(status)?,
        };

        let saved = self
            .repo
            .update_saved_paper(id, user_id, update)
            .await?
            .ok_or(AppError::SavedPaperNotFound { id })?;

        self.saved_view(saved).await
    }

    pub async fn delete_saved_paper(&self, id: i32, user_id: &str) -> Result<()> {
        if !self.repo.delete_saved_paper(id, user_id).await? {
            return Err(AppError::SavedPaperNotFound { id });
        }
        Ok(())
    }

    // ========================================================================
    // Metadata resolution
    // ========================================================================

    async fn cached(&self, paper_id: &str) -> Result<Option<(Paper, Vec<Author>)>> {
        let Some(paper) = self.repo.find_paper(paper_id).await? else {
            return Ok(None);
        };
        let authors = self.repo.authors_for_paper(paper_id).await?;
        Ok(Some((paper, authors)))
    }

    async fn saved_view(&self, saved: SavedPaper) -> Result<SavedPaperView> {
        let paper = match self.cached(&saved.paper_id).await? {
            Some((paper, authors)) => Some(SavedPaperDetails::Cached(PaperView::with_authors(
                &paper, &authors, false,
            ))),
            None => saved
                .notes
                .as_deref()
                .and_then(NotesMetadata::parse)
                .map(SavedPaperDetails::FromNotes),
        };

        Ok(SavedPaperView {
            id: saved.id,
            user_id: saved.user_id,
            collection_id: saved.collection_id,
            paper_id: saved.paper_id,
            notes: saved.notes,
            status: saved.status,
            saved_at: saved.saved_at,
            paper,
        })
    }

    async fn bib_entry(&self, saved: &SavedPaper) -> Result<BibEntry> {
        if let Some((paper, authors)) = self.cached(&saved.paper_id).await? {
            return Ok(BibEntry {
                key: paper.id,
                title: paper.title,
                authors: authors.into_iter().map(|a| a.display_name).collect(),
                year: paper.publication_year,
                venue: paper.venue,
                doi: paper.doi,
            });
        }

        let meta = saved
            .notes
            .as_deref()
            .and_then(NotesMetadata::parse)
            .unwrap_or_default();

        Ok(BibEntry {
            key: saved.paper_id.clone(),
            title: meta.title.unwrap_or_else(|| "Untitled".to_string()),
            authors: meta.authors,
            year: meta.publication_year,
            venue: meta.venue,
            doi: meta.doi,
        })
    }
}

fn parse_status(raw: Option<&str>) -> Result<Option<ReadingStatus>> {
    raw.map(|s| s.parse::<ReadingStatus>())
        .transpose()
        .map_err(|message| AppError::invalid("status", message))
}
