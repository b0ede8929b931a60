//! Paper entity, keyed by the OpenAlex work id (e.g. `W2741809807`)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "papers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(column_type = "Text", indexed)]
    pub title: String,

    /// Reconstructed from the upstream inverted index
    #[sea_orm(column_type = "Text", nullable)]
    pub abstract_text: Option<String>,

    /// Bare DOI, without the `https://doi.org/` prefix
    #[sea_orm(indexed)]
    pub doi: Option<String>,

    #[sea_orm(indexed)]
    pub publication_year: Option<i32>,

    pub publication_date: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub venue: Option<String>,

    #[sea_orm(indexed)]
    pub citation_count: i32,

    pub referenced_works_count: i32,

    pub openalex_url: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub pdf_url: Option<String>,

    pub cached_at: DateTimeUtc,

    pub last_updated: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
