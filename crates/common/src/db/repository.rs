//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling and transaction support.

use crate::db::DbPool;
use crate::db::models::*;
use crate::errors::{AppError, Result};
use crate::openalex::{AuthorRecord, WorkRecord};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DbErr, EntityTrait, Insert, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use std::collections::HashMap;

/// Fields for a new collection
#[derive(Debug, Clone)]
pub struct NewCollection {
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
}

/// Partial update of a saved paper; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct SavedPaperUpdate {
    pub notes: Option<String>,
    pub status: Option<ReadingStatus>,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Paper Operations
    // ========================================================================

    /// Find paper by OpenAlex id
    pub async fn find_paper(&self, id: &str) -> Result<Option<Paper>> {
        PaperEntity::find_by_id(id.to_string())
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find every cached paper among `ids`, in no particular order
    pub async fn find_papers(&self, ids: &[String]) -> Result<Vec<Paper>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        PaperEntity::find()
            .filter(PaperColumn::Id.is_in(ids.iter().cloned()))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Cache one upstream work together with its authors, in one transaction.
    ///
    /// Every row is written with an insert-or-update, so concurrent writers of
    /// the same work converge on the last write instead of failing. The
    /// abstract is only replaced when the record carries one. Authors already
    /// linked to the paper keep their original position.
    pub async fn upsert_work(&self, record: &WorkRecord) -> Result<Paper> {
        let now = Utc::now();
        let txn = self.write_conn().begin().await?;

        let paper = PaperActiveModel {
            id: Set(record.id.clone()),
            title: Set(record.title.clone()),
            abstract_text: Set(record.abstract_text.clone()),
            doi: Set(record.doi.clone()),
            publication_year: Set(record.publication_year),
            publication_date: Set(record.publication_date.clone()),
            venue: Set(record.venue.clone()),
            citation_count: Set(record.citation_count),
            referenced_works_count: Set(record.referenced_works_count),
            openalex_url: Set(record.openalex_url.clone()),
            pdf_url: Set(record.pdf_url.clone()),
            cached_at: Set(now),
            last_updated: Set(now),
        };

        let mut refreshed = vec![
            PaperColumn::Title,
            PaperColumn::Doi,
            PaperColumn::PublicationYear,
            PaperColumn::PublicationDate,
            PaperColumn::Venue,
            PaperColumn::CitationCount,
            PaperColumn::ReferencedWorksCount,
            PaperColumn::OpenalexUrl,
            PaperColumn::PdfUrl,
            PaperColumn::CachedAt,
            PaperColumn::LastUpdated,
        ];
        if record.abstract_text.is_some() {
            refreshed.push(PaperColumn::AbstractText);
        }

        PaperEntity::insert(paper)
            .on_conflict(
                OnConflict::column(PaperColumn::Id)
                    .update_columns(refreshed)
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        for authorship in &record.authorships {
            upsert_author_in(&txn, &authorship.author, now).await?;

            let link = PaperAuthorActiveModel {
                paper_id: Set(record.id.clone()),
                author_id: Set(authorship.author.id.clone()),
                author_position: Set(Some(authorship.position)),
            };
            insert_ignoring_duplicate(
                PaperAuthorEntity::insert(link).on_conflict(
                    OnConflict::columns([PaperAuthorColumn::PaperId, PaperAuthorColumn::AuthorId])
                        .do_nothing()
                        .to_owned(),
                ),
                &txn,
            )
            .await?;
        }

        let paper = PaperEntity::find_by_id(record.id.clone())
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::Internal {
                message: format!("paper {} missing after upsert", record.id),
            })?;

        txn.commit().await?;
        Ok(paper)
    }

    // ========================================================================
    // Author Operations
    // ========================================================================

    /// Find author by OpenAlex id
    pub async fn find_author(&self, id: &str) -> Result<Option<Author>> {
        AuthorEntity::find_by_id(id.to_string())
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Cache a standalone author record
    pub async fn upsert_author(&self, record: &AuthorRecord) -> Result<Author> {
        let txn = self.write_conn().begin().await?;
        upsert_author_in(&txn, record, Utc::now()).await?;

        let author = AuthorEntity::find_by_id(record.id.clone())
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::Internal {
                message: format!("author {} missing after upsert", record.id),
            })?;

        txn.commit().await?;
        Ok(author)
    }

    /// Authors of one paper in authorship order
    pub async fn authors_for_paper(&self, paper_id: &str) -> Result<Vec<Author>> {
        let mut by_paper = self.authors_for_papers(&[paper_id.to_string()]).await?;
        Ok(by_paper.remove(paper_id).unwrap_or_default())
    }

    /// Authors of several papers, each list in authorship order
    pub async fn authors_for_papers(&self, paper_ids: &[String]) -> Result<HashMap<String, Vec<Author>>> {
        let mut result: HashMap<String, Vec<Author>> = HashMap::new();
        if paper_ids.is_empty() {
            return Ok(result);
        }

        let links = PaperAuthorEntity::find()
            .filter(PaperAuthorColumn::PaperId.is_in(paper_ids.iter().cloned()))
            .order_by_asc(PaperAuthorColumn::AuthorPosition)
            .all(self.read_conn())
            .await?;

        let mut author_ids: Vec<String> = links.iter().map(|l| l.author_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();

        let authors: HashMap<String, Author> = AuthorEntity::find()
            .filter(AuthorColumn::Id.is_in(author_ids))
            .all(self.read_conn())
            .await?
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();

        for link in links {
            if let Some(author) = authors.get(&link.author_id) {
                result.entry(link.paper_id).or_default().push(author.clone());
            }
        }

        Ok(result)
    }

    /// Every cached paper the author is linked to
    pub async fn papers_for_author(&self, author_id: &str) -> Result<Vec<Paper>> {
        let paper_ids = self.paper_ids_for_author(author_id).await?;
        self.find_papers(&paper_ids).await
    }

    /// Co-authors ranked by number of shared papers, most frequent first
    pub async fn coauthors(&self, author_id: &str, limit: usize) -> Result<Vec<(Author, u64)>> {
        let paper_ids = self.paper_ids_for_author(author_id).await?;
        if paper_ids.is_empty() {
            return Ok(Vec::new());
        }

        let links = PaperAuthorEntity::find()
            .filter(PaperAuthorColumn::PaperId.is_in(paper_ids))
            .filter(PaperAuthorColumn::AuthorId.ne(author_id))
            .all(self.read_conn())
            .await?;

        let mut counts: HashMap<String, u64> = HashMap::new();
        for link in links {
            *counts.entry(link.author_id).or_default() += 1;
        }

        let authors = AuthorEntity::find()
            .filter(AuthorColumn::Id.is_in(counts.keys().cloned()))
            .all(self.read_conn())
            .await?;

        let mut ranked: Vec<(Author, u64)> = authors
            .into_iter()
            .map(|a| {
                let count = counts.get(&a.id).copied().unwrap_or(0);
                (a, count)
            })
            .collect();

        ranked.sort_by(|(a, ca), (b, cb)| cb.cmp(ca).then_with(|| a.display_name.cmp(&b.display_name)));
        ranked.truncate(limit);

        Ok(ranked)
    }

    async fn paper_ids_for_author(&self, author_id: &str) -> Result<Vec<String>> {
        let ids = PaperAuthorEntity::find()
            .select_only()
            .column(PaperAuthorColumn::PaperId)
            .filter(PaperAuthorColumn::AuthorId.eq(author_id))
            .into_tuple::<String>()
            .all(self.read_conn())
            .await?;

        Ok(ids)
    }

    // ========================================================================
    // Citation Operations
    // ========================================================================

    /// Record that `citing` cites `cited`; an existing edge is returned as is
    pub async fn create_citation(&self, citing: &str, cited: &str) -> Result<Citation> {
        let citation = CitationActiveModel {
            citing_paper_id: Set(citing.to_string()),
            cited_paper_id: Set(cited.to_string()),
            cached_at: Set(Utc::now()),
        };

        insert_ignoring_duplicate(
            CitationEntity::insert(citation).on_conflict(
                OnConflict::columns([CitationColumn::CitingPaperId, CitationColumn::CitedPaperId])
                    .do_nothing()
                    .to_owned(),
            ),
            self.write_conn(),
        )
        .await?;

        CitationEntity::find_by_id((citing.to_string(), cited.to_string()))
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::Internal {
                message: format!("citation {} -> {} missing after insert", citing, cited),
            })
    }

    /// Get citations for a paper (both directions): (outgoing, incoming)
    pub async fn get_citations(&self, paper_id: &str) -> Result<(Vec<Citation>, Vec<Citation>)> {
        let outgoing = CitationEntity::find()
            .filter(CitationColumn::CitingPaperId.eq(paper_id))
            .all(self.read_conn())
            .await?;

        let incoming = CitationEntity::find()
            .filter(CitationColumn::CitedPaperId.eq(paper_id))
            .all(self.read_conn())
            .await?;

        Ok((outgoing, incoming))
    }

    // ========================================================================
    // Collection Operations
    // ========================================================================

    /// Collections of a user with their saved-paper counts
    pub async fn list_collections(&self, user_id: &str) -> Result<Vec<(Collection, u64)>> {
        let collections = CollectionEntity::find()
            .filter(CollectionColumn::UserId.eq(user_id))
            .order_by_asc(CollectionColumn::Id)
            .all(self.read_conn())
            .await?;

        let mut result = Vec::with_capacity(collections.len());
        for collection in collections {
            let count = self.count_saved_papers(collection.id).await?;
            result.push((collection, count));
        }

        Ok(result)
    }

    /// Create a collection
    pub async fn create_collection(&self, new: NewCollection) -> Result<Collection> {
        let now = Utc::now();

        let collection = CollectionActiveModel {
            user_id: Set(new.user_id),
            name: Set(new.name),
            description: Set(new.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        collection.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find a collection owned by `user_id`
    pub async fn find_collection(&self, id: i32, user_id: &str) -> Result<Option<Collection>> {
        CollectionEntity::find_by_id(id)
            .filter(CollectionColumn::UserId.eq(user_id))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Delete a collection and its saved papers
    pub async fn delete_collection(&self, id: i32, user_id: &str) -> Result<bool> {
        let txn = self.write_conn().begin().await?;

        let owned = CollectionEntity::find_by_id(id)
            .filter(CollectionColumn::UserId.eq(user_id))
            .one(&txn)
            .await?;

        if owned.is_none() {
            return Ok(false);
        }

        SavedPaperEntity::delete_many()
            .filter(SavedPaperColumn::CollectionId.eq(id))
            .exec(&txn)
            .await?;

        let result = CollectionEntity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Saved Paper Operations
    // ========================================================================

    /// Number of papers saved into a collection
    pub async fn count_saved_papers(&self, collection_id: i32) -> Result<u64> {
        SavedPaperEntity::find()
            .filter(SavedPaperColumn::CollectionId.eq(collection_id))
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Saved papers of a collection, oldest first
    pub async fn saved_papers_in(&self, collection_id: i32, user_id: &str) -> Result<Vec<SavedPaper>> {
        SavedPaperEntity::find()
            .filter(SavedPaperColumn::CollectionId.eq(collection_id))
            .filter(SavedPaperColumn::UserId.eq(user_id))
            .order_by_asc(SavedPaperColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find a saved paper owned by `user_id`
    pub async fn find_saved_paper(&self, id: i32, user_id: &str) -> Result<Option<SavedPaper>> {
        SavedPaperEntity::find_by_id(id)
            .filter(SavedPaperColumn::UserId.eq(user_id))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find an existing save of the same paper into the same collection
    pub async fn find_saved_duplicate(
        &self,
        paper_id: &str,
        collection_id: i32,
        user_id: &str,
    ) -> Result<Option<SavedPaper>> {
        SavedPaperEntity::find()
            .filter(SavedPaperColumn::PaperId.eq(paper_id))
            .filter(SavedPaperColumn::CollectionId.eq(collection_id))
            .filter(SavedPaperColumn::UserId.eq(user_id))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Save a paper into a collection
    pub async fn create_saved_paper(
        &self,
        user_id: &str,
        collection_id: i32,
        paper_id: &str,
        notes: Option<String>,
        status: ReadingStatus,
    ) -> Result<SavedPaper> {
        let saved = SavedPaperActiveModel {
            user_id: Set(user_id.to_string()),
            collection_id: Set(collection_id),
            paper_id: Set(paper_id.to_string()),
            notes: Set(notes),
            status: Set(status.into()),
            saved_at: Set(Utc::now()),
            ..Default::default()
        };

        saved.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Apply a partial update; `None` when the saved paper is not the user's
    pub async fn update_saved_paper(
        &self,
        id: i32,
        user_id: &str,
        update: SavedPaperUpdate,
    ) -> Result<Option<SavedPaper>> {
        let Some(existing) = SavedPaperEntity::find_by_id(id)
            .filter(SavedPaperColumn::UserId.eq(user_id))
            .one(self.write_conn())
            .await?
        else {
            return Ok(None);
        };

        let mut saved: SavedPaperActiveModel = existing.into();

        if let Some(notes) = update.notes {
            saved.notes = Set(Some(notes));
        }
        if let Some(status) = update.status {
            saved.status = Set(status.into());
        }

        let updated = saved.update(self.write_conn()).await?;
        Ok(Some(updated))
    }

    /// Delete a saved paper owned by `user_id`
    pub async fn delete_saved_paper(&self, id: i32, user_id: &str) -> Result<bool> {
        let result = SavedPaperEntity::delete_many()
            .filter(SavedPaperColumn::Id.eq(id))
            .filter(SavedPaperColumn::UserId.eq(user_id))
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }
}

/// Run an insert whose conflict clause is `DO NOTHING`
async fn insert_ignoring_duplicate<A, C>(insert: Insert<A>, conn: &C) -> Result<()>
where
    A: ActiveModelTrait,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    match insert.exec_without_returning(conn).await {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Insert or refresh an author inside an open transaction.
///
/// A new author only counts as cached once its profile stats are known;
/// stubs from authorship lists carry an epoch `cached_at`.
async fn upsert_author_in<C: ConnectionTrait>(
    conn: &C,
    record: &AuthorRecord,
    now: DateTime<Utc>,
) -> Result<()> {
    let institution = record.institution.as_ref();
    let stats = record.stats.as_ref();

    let author = AuthorActiveModel {
        id: Set(record.id.clone()),
        display_name: Set(record.display_name.clone()),
        orcid: Set(record.orcid.clone()),
        last_known_institution: Set(institution.map(|i| i.name.clone())),
        institution_id: Set(institution.and_then(|i| i.id.clone())),
        works_count: Set(stats.map_or(0, |s| s.works_count)),
        cited_by_count: Set(stats.map_or(0, |s| s.cited_by_count)),
        h_index: Set(stats.map_or(0, |s| s.h_index)),
        openalex_url: Set(record.openalex_url.clone()),
        cached_at: Set(if stats.is_some() { now } else { DateTime::<Utc>::UNIX_EPOCH }),
        last_updated: Set(now),
    };

    let mut refreshed = vec![
        AuthorColumn::DisplayName,
        AuthorColumn::Orcid,
        AuthorColumn::OpenalexUrl,
        AuthorColumn::LastUpdated,
    ];
    if institution.is_some() {
        refreshed.extend([AuthorColumn::LastKnownInstitution, AuthorColumn::InstitutionId]);
    }
    if stats.is_some() {
        refreshed.extend([
            AuthorColumn::WorksCount,
            AuthorColumn::CitedByCount,
            AuthorColumn::HIndex,
            AuthorColumn::CachedAt,
        ]);
    }

    AuthorEntity::insert(author)
        .on_conflict(
            OnConflict::column(AuthorColumn::Id)
                .update_columns(refreshed)
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openalex::{AuthorshipRecord, InstitutionRecord};

    fn author(id: &str, name: &str) -> AuthorRecord {
        AuthorRecord {
            id: id.to_string(),
            display_name: name.to_string(),
            orcid: None,
            openalex_url: Some(format!("https://openalex.org/{}", id)),
            institution: None,
            stats: None,
        }
    }

    fn work(id: &str, authors: &[(&str, &str)]) -> WorkRecord {
        WorkRecord {
            id: id.to_string(),
            title: format!("Paper {}", id),
            doi: Some(format!("10.1000/{}", id.to_lowercase())),
            publication_year: Some(2020),
            publication_date: Some("2020-01-01".to_string()),
            venue: Some("Journal of Tests".to_string()),
            pdf_url: None,
            citation_count: 3,
            referenced_works_count: 2,
            openalex_url: Some(format!("https://openalex.org/{}", id)),
            abstract_text: None,
            authorships: authors
                .iter()
                .enumerate()
                .map(|(i, (aid, name))| AuthorshipRecord {
                    author: author(aid, name),
                    position: i as i32,
                })
                .collect(),
        }
    }

    async fn repo() -> Repository {
        Repository::new(DbPool::in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_upsert_work_creates_paper_and_authors() {
        let repo = repo().await;
        let paper = repo
            .upsert_work(&work("W1", &[("A1", "Ada"), ("A2", "Grace")]))
            .await
            .unwrap();

        assert_eq!(paper.id, "W1");
        assert_eq!(paper.venue.as_deref(), Some("Journal of Tests"));

        let authors = repo.authors_for_paper("W1").await.unwrap();
        let names: Vec<_> = authors.iter().map(|a| a.display_name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Grace"]);
    }

    #[tokio::test]
    async fn test_upsert_work_is_idempotent() {
        let repo = repo().await;
        let record = work("W1", &[("A1", "Ada")]);

        let first = repo.upsert_work(&record).await.unwrap();
        let second = repo.upsert_work(&record).await.unwrap();

        assert_eq!(
            Paper { cached_at: first.cached_at, last_updated: first.last_updated, ..second.clone() },
            first
        );
        assert_eq!(repo.authors_for_paper("W1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_keeps_abstract_when_record_has_none() {
        let repo = repo().await;
        let mut record = work("W1", &[]);
        record.abstract_text = Some("the fox the".to_string());
        repo.upsert_work(&record).await.unwrap();

        record.abstract_text = None;
        record.citation_count = 10;
        let paper = repo.upsert_work(&record).await.unwrap();

        assert_eq!(paper.abstract_text.as_deref(), Some("the fox the"));
        assert_eq!(paper.citation_count, 10);
    }

    #[tokio::test]
    async fn test_upsert_appends_new_authors_only() {
        let repo = repo().await;
        repo.upsert_work(&work("W1", &[("A1", "Ada")])).await.unwrap();
        repo.upsert_work(&work("W1", &[("A1", "Ada"), ("A2", "Grace")])).await.unwrap();

        assert_eq!(repo.authors_for_paper("W1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_institution_is_kept_from_authorship() {
        let repo = repo().await;
        let mut record = work("W1", &[("A1", "Ada")]);
        record.authorships[0].author.institution = Some(InstitutionRecord {
            name: "Analytical Engine Society".to_string(),
            id: Some("I42".to_string()),
        });
        repo.upsert_work(&record).await.unwrap();

        let ada = repo.find_author("A1").await.unwrap().unwrap();
        assert_eq!(ada.last_known_institution.as_deref(), Some("Analytical Engine Society"));
        assert_eq!(ada.institution_id.as_deref(), Some("I42"));
    }

    #[tokio::test]
    async fn test_create_citation_twice_returns_same_edge() {
        let repo = repo().await;
        repo.upsert_work(&work("W1", &[])).await.unwrap();
        repo.upsert_work(&work("W2", &[])).await.unwrap();

        let first = repo.create_citation("W1", "W2").await.unwrap();
        let second = repo.create_citation("W1", "W2").await.unwrap();
        assert_eq!(first, second);

        let (outgoing, incoming) = repo.get_citations("W1").await.unwrap();
        assert_eq!(outgoing.len(), 1);
        assert!(incoming.is_empty());

        let (_, incoming) = repo.get_citations("W2").await.unwrap();
        assert_eq!(incoming.len(), 1);
    }

    #[tokio::test]
    async fn test_self_citation_is_stored() {
        let repo = repo().await;
        repo.upsert_work(&work("W1", &[])).await.unwrap();

        repo.create_citation("W1", "W1").await.unwrap();
        let (outgoing, incoming) = repo.get_citations("W1").await.unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(incoming.len(), 1);
    }

    #[tokio::test]
    async fn test_coauthors_ranked_by_shared_papers() {
        let repo = repo().await;
        repo.upsert_work(&work("W1", &[("A1", "Ada"), ("A2", "Grace")])).await.unwrap();
        repo.upsert_work(&work("W2", &[("A1", "Ada"), ("A2", "Grace"), ("A3", "Alan")])).await.unwrap();

        let coauthors = repo.coauthors("A1", 10).await.unwrap();
        assert_eq!(coauthors.len(), 2);
        assert_eq!(coauthors[0].0.id, "A2");
        assert_eq!(coauthors[0].1, 2);
        assert_eq!(coauthors[1].1, 1);
    }

    #[tokio::test]
    async fn test_delete_collection_cascades_saved_papers() {
        let repo = repo().await;
        let collection = repo
            .create_collection(NewCollection {
                user_id: "u1".to_string(),
                name: "Reading".to_string(),
                description: None,
            })
            .await
            .unwrap();

        repo.create_saved_paper("u1", collection.id, "W1", None, ReadingStatus::ToRead)
            .await
            .unwrap();
        assert_eq!(repo.count_saved_papers(collection.id).await.unwrap(), 1);

        assert!(!repo.delete_collection(collection.id, "someone-else").await.unwrap());
        assert!(repo.delete_collection(collection.id, "u1").await.unwrap());
        assert_eq!(repo.count_saved_papers(collection.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_saved_paper_is_partial() {
        let repo = repo().await;
        let collection = repo
            .create_collection(NewCollection {
                user_id: "u1".to_string(),
                name: "Reading".to_string(),
                description: None,
            })
            .await
            .unwrap();
        let saved = repo
            .create_saved_paper("u1", collection.id, "W1", Some("skim".into()), ReadingStatus::ToRead)
            .await
            .unwrap();

        let updated = repo
            .update_saved_paper(saved.id, "u1", SavedPaperUpdate {
                notes: None,
                status: Some(ReadingStatus::Read),
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.notes.as_deref(), Some("skim"));
        assert_eq!(updated.reading_status(), ReadingStatus::Read);

        let other_user = repo
            .update_saved_paper(saved.id, "u2", SavedPaperUpdate::default())
            .await
            .unwrap();
        assert!(other_user.is_none());
    }
}
