//! OpenAlex wire records and their normalized form
//!
//! Only the fields the cache consumes are modelled. Everything is optional on
//! the wire; defaults are applied once, in `RawWork::into_record` and
//! `RawAuthorProfile::into_record`.

use super::abstract_index::reconstruct_abstract;
use super::normalize_id;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DOI_PREFIX: &str = "https://doi.org/";
const ORCID_PREFIX: &str = "https://orcid.org/";

// ============================================================================
// Wire records
// ============================================================================

/// A work as returned by `/works` and `/works/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawWork {
    pub id: Option<String>,
    pub title: Option<String>,
    pub display_name: Option<String>,
    pub doi: Option<String>,
    pub publication_year: Option<i32>,
    pub publication_date: Option<String>,
    pub cited_by_count: Option<i64>,
    pub referenced_works: Option<Vec<String>>,
    pub abstract_inverted_index: Option<HashMap<String, Vec<usize>>>,
    pub authorships: Option<Vec<RawAuthorship>>,
    pub primary_location: Option<RawLocation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAuthorship {
    pub author: Option<RawAuthor>,
    pub institutions: Option<Vec<RawInstitution>>,
}

/// The author stub embedded in an authorship
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAuthor {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub orcid: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawInstitution {
    pub id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLocation {
    pub source: Option<RawSource>,
    pub pdf_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSource {
    pub display_name: Option<String>,
}

/// A full author record from `/authors/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAuthorProfile {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub orcid: Option<String>,
    pub works_count: Option<i64>,
    pub cited_by_count: Option<i64>,
    pub summary_stats: Option<RawSummaryStats>,
    pub last_known_institution: Option<RawInstitution>,
    pub last_known_institutions: Option<Vec<RawInstitution>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSummaryStats {
    pub h_index: Option<i64>,
}

/// One page of `/works` results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorksPage {
    #[serde(default)]
    pub meta: WorksMeta,
    #[serde(default)]
    pub results: Vec<RawWork>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorksMeta {
    #[serde(default)]
    pub count: i64,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

// ============================================================================
// Normalized records
// ============================================================================

/// A work ready to be written to the cache
#[derive(Debug, Clone, PartialEq)]
pub struct WorkRecord {
    pub id: String,
    pub title: String,
    pub doi: Option<String>,
    pub publication_year: Option<i32>,
    pub publication_date: Option<String>,
    pub venue: Option<String>,
    pub pdf_url: Option<String>,
    pub citation_count: i32,
    pub referenced_works_count: i32,
    pub openalex_url: Option<String>,
    /// `None` leaves any cached abstract in place
    pub abstract_text: Option<String>,
    pub authorships: Vec<AuthorshipRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthorshipRecord {
    pub author: AuthorRecord,
    /// 0-based index in the work's authorship list
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthorRecord {
    pub id: String,
    pub display_name: String,
    pub orcid: Option<String>,
    pub openalex_url: Option<String>,
    pub institution: Option<InstitutionRecord>,
    /// Present only when the record comes from the author endpoint
    pub stats: Option<AuthorStats>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstitutionRecord {
    pub name: String,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorStats {
    pub works_count: i32,
    pub cited_by_count: i32,
    pub h_index: i32,
}

impl RawWork {
    /// Normalized id of this work, if it has one
    pub fn work_id(&self) -> Option<String> {
        self.id.as_deref().map(normalize_id).filter(|id| !id.is_empty())
    }

    /// Normalize into a cache record; `None` when the work has no usable id.
    ///
    /// The abstract is decoded only when `include_abstract` is set.
    pub fn into_record(self, include_abstract: bool) -> Option<WorkRecord> {
        let id = self.work_id()?;

        let title = self
            .title
            .or(self.display_name)
            .unwrap_or_else(|| "Untitled".to_string());

        let (venue, pdf_url) = match self.primary_location {
            Some(location) => (
                location.source.and_then(|s| s.display_name),
                location.pdf_url,
            ),
            None => (None, None),
        };

        let abstract_text = if include_abstract {
            self.abstract_inverted_index.as_ref().and_then(reconstruct_abstract)
        } else {
            None
        };

        let authorships = self
            .authorships
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(position, authorship)| {
                let institution = authorship
                    .institutions
                    .and_then(|list| list.into_iter().next())
                    .and_then(InstitutionRecord::from_raw);
                let author = authorship.author?.into_record(institution)?;
                Some(AuthorshipRecord {
                    author,
                    position: clamp_i32(position as i64),
                })
            })
            .collect();

        Some(WorkRecord {
            id,
            title,
            doi: self.doi.as_deref().map(|doi| strip_prefix(doi, DOI_PREFIX)),
            publication_year: self.publication_year,
            publication_date: self.publication_date,
            venue,
            pdf_url,
            citation_count: clamp_i32(self.cited_by_count.unwrap_or(0)),
            referenced_works_count: clamp_i32(
                self.referenced_works.map(|r| r.len() as i64).unwrap_or(0),
            ),
            openalex_url: self.id,
            abstract_text,
            authorships,
        })
    }
}

impl RawAuthor {
    fn into_record(self, institution: Option<InstitutionRecord>) -> Option<AuthorRecord> {
        let id = self.id.as_deref().map(normalize_id).filter(|id| !id.is_empty())?;

        Some(AuthorRecord {
            id,
            display_name: self.display_name.unwrap_or_else(|| "Unknown Author".to_string()),
            orcid: self.orcid.as_deref().map(|o| strip_prefix(o, ORCID_PREFIX)),
            openalex_url: self.id,
            institution,
            stats: None,
        })
    }
}

impl RawAuthorProfile {
    /// Normalize into a cache record carrying aggregate stats
    pub fn into_record(self) -> Option<AuthorRecord> {
        let institution = self
            .last_known_institutions
            .and_then(|list| list.into_iter().next())
            .or(self.last_known_institution)
            .and_then(InstitutionRecord::from_raw);

        let stats = AuthorStats {
            works_count: clamp_i32(self.works_count.unwrap_or(0)),
            cited_by_count: clamp_i32(self.cited_by_count.unwrap_or(0)),
            h_index: clamp_i32(self.summary_stats.and_then(|s| s.h_index).unwrap_or(0)),
        };

        let author = RawAuthor {
            id: self.id,
            display_name: self.display_name,
            orcid: self.orcid,
        };

        let mut record = author.into_record(institution)?;
        record.stats = Some(stats);
        Some(record)
    }
}

impl InstitutionRecord {
    fn from_raw(raw: RawInstitution) -> Option<Self> {
        Some(Self {
            name: raw.display_name?,
            id: raw.id.as_deref().map(normalize_id).filter(|id| !id.is_empty()),
        })
    }
}

fn strip_prefix(value: &str, prefix: &str) -> String {
    value.strip_prefix(prefix).unwrap_or(value).to_string()
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(0, i32::MAX as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_work() -> RawWork {
        serde_json::from_value(json!({
            "id": "https://openalex.org/W2741809807",
            "title": "The state of OA",
            "doi": "https://doi.org/10.7717/peerj.4375",
            "publication_year": 2018,
            "publication_date": "2018-02-13",
            "cited_by_count": 812,
            "referenced_works": ["https://openalex.org/W1", "https://openalex.org/W2"],
            "abstract_inverted_index": { "the": [0, 2], "fox": [1] },
            "primary_location": {
                "source": { "display_name": "PeerJ" },
                "pdf_url": "https://peerj.com/articles/4375.pdf"
            },
            "authorships": [
                {
                    "author": {
                        "id": "https://openalex.org/A5023888391",
                        "display_name": "Heather Piwowar",
                        "orcid": "https://orcid.org/0000-0003-1613-5981"
                    },
                    "institutions": [
                        { "id": "https://openalex.org/I4210166736", "display_name": "Impactstory" }
                    ]
                },
                { "author": null, "institutions": [] },
                { "author": { "id": "https://openalex.org/A2", "display_name": null } }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_work_normalization() {
        let record = sample_work().into_record(false).unwrap();

        assert_eq!(record.id, "W2741809807");
        assert_eq!(record.doi.as_deref(), Some("10.7717/peerj.4375"));
        assert_eq!(record.venue.as_deref(), Some("PeerJ"));
        assert_eq!(record.pdf_url.as_deref(), Some("https://peerj.com/articles/4375.pdf"));
        assert_eq!(record.citation_count, 812);
        assert_eq!(record.referenced_works_count, 2);
        assert_eq!(record.openalex_url.as_deref(), Some("https://openalex.org/W2741809807"));
        assert!(record.abstract_text.is_none());
    }

    #[test]
    fn test_authorships_keep_their_position() {
        let record = sample_work().into_record(false).unwrap();

        assert_eq!(record.authorships.len(), 2);
        let first = &record.authorships[0];
        assert_eq!(first.position, 0);
        assert_eq!(first.author.id, "A5023888391");
        assert_eq!(first.author.orcid.as_deref(), Some("0000-0003-1613-5981"));
        assert_eq!(
            first.author.institution,
            Some(InstitutionRecord { name: "Impactstory".into(), id: Some("I4210166736".into()) })
        );

        let second = &record.authorships[1];
        assert_eq!(second.position, 2);
        assert_eq!(second.author.display_name, "Unknown Author");
    }

    #[test]
    fn test_abstract_is_decoded_on_request() {
        let record = sample_work().into_record(true).unwrap();
        assert_eq!(record.abstract_text.as_deref(), Some("the fox the"));
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let work: RawWork = serde_json::from_value(json!({ "id": "https://openalex.org/W9" })).unwrap();
        let record = work.into_record(true).unwrap();

        assert_eq!(record.title, "Untitled");
        assert_eq!(record.citation_count, 0);
        assert!(record.venue.is_none());
        assert!(record.authorships.is_empty());
    }

    #[test]
    fn test_work_without_id_is_skipped() {
        let work: RawWork = serde_json::from_value(json!({ "title": "Orphan" })).unwrap();
        assert!(work.into_record(false).is_none());
    }

    #[test]
    fn test_author_profile_normalization() {
        let profile: RawAuthorProfile = serde_json::from_value(json!({
            "id": "https://openalex.org/A5023888391",
            "display_name": "Heather Piwowar",
            "works_count": 63,
            "cited_by_count": 4200,
            "summary_stats": { "h_index": 21 },
            "last_known_institutions": [
                { "id": "https://openalex.org/I1", "display_name": "OurResearch" }
            ]
        }))
        .unwrap();

        let record = profile.into_record().unwrap();
        assert_eq!(record.id, "A5023888391");
        assert_eq!(record.stats, Some(AuthorStats { works_count: 63, cited_by_count: 4200, h_index: 21 }));
        assert_eq!(record.institution.unwrap().name, "OurResearch");
    }
}
