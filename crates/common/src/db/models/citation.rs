//! Citation entity for graph relationships
//!
//! One row per directed (citing, cited) pair. Self-citations are stored like
//! any other edge.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "citations")]
pub struct Model {
    /// Paper that contains the citation
    #[sea_orm(primary_key, auto_increment = false)]
    pub citing_paper_id: String,

    /// Paper that is being cited
    #[sea_orm(primary_key, auto_increment = false, indexed)]
    pub cited_paper_id: String,

    pub cached_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::paper::Entity",
        from = "Column::CitingPaperId",
        to = "super::paper::Column::Id",
        on_delete = "Cascade"
    )]
    CitingPaper,

    #[sea_orm(
        belongs_to = "super::paper::Entity",
        from = "Column::CitedPaperId",
        to = "super::paper::Column::Id",
        on_delete = "Cascade"
    )]
    CitedPaper,
}

impl ActiveModelBehavior for ActiveModel {}
