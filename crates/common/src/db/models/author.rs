//! Author entity, keyed by the OpenAlex author id (e.g. `A5023888391`)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "authors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub display_name: String,

    /// Bare ORCID, without the `https://orcid.org/` prefix
    #[sea_orm(unique)]
    pub orcid: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub last_known_institution: Option<String>,

    pub institution_id: Option<String>,

    pub works_count: i32,

    pub cited_by_count: i32,

    pub h_index: i32,

    pub openalex_url: Option<String>,

    pub cached_at: DateTimeUtc,

    pub last_updated: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
