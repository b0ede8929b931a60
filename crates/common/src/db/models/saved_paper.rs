//! Paper saved into a collection

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reading status of a saved paper
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    #[default]
    ToRead,
    Reading,
    Read,
}

impl ReadingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::ToRead => "to_read",
            ReadingStatus::Reading => "reading",
            ReadingStatus::Read => "read",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "to_read" => Ok(ReadingStatus::ToRead),
            "reading" => Ok(ReadingStatus::Reading),
            "read" => Ok(ReadingStatus::Read),
            other => Err(format!(
                "Unknown status '{}', expected one of to_read, reading, read",
                other
            )),
        }
    }
}

impl From<ReadingStatus> for String {
    fn from(status: ReadingStatus) -> Self {
        status.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "saved_papers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub user_id: String,

    #[sea_orm(indexed)]
    pub collection_id: i32,

    /// OpenAlex work id; the paper does not have to be cached
    #[sea_orm(indexed)]
    pub paper_id: String,

    /// Free-form notes. May carry a JSON object of fallback paper metadata.
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    pub status: String,

    pub saved_at: DateTimeUtc,
}

impl Model {
    /// Stored status, falling back to `to_read` for legacy values
    pub fn reading_status(&self) -> ReadingStatus {
        self.status.parse().unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::collection::Entity",
        from = "Column::CollectionId",
        to = "super::collection::Column::Id",
        on_delete = "Cascade"
    )]
    Collection,
}

impl ActiveModelBehavior for ActiveModel {}
