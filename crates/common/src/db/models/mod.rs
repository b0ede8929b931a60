//! SeaORM entity models
//!
//! Database entities for the citation cache and the reading library

mod author;
mod citation;
mod collection;
mod paper;
mod paper_author;
mod saved_paper;

pub use paper::{
    Entity as PaperEntity,
    Model as Paper,
    ActiveModel as PaperActiveModel,
    Column as PaperColumn,
};

pub use author::{
    Entity as AuthorEntity,
    Model as Author,
    ActiveModel as AuthorActiveModel,
    Column as AuthorColumn,
};

pub use paper_author::{
    Entity as PaperAuthorEntity,
    Model as PaperAuthor,
    ActiveModel as PaperAuthorActiveModel,
    Column as PaperAuthorColumn,
};

pub use citation::{
    Entity as CitationEntity,
    Model as Citation,
    ActiveModel as CitationActiveModel,
    Column as CitationColumn,
};

pub use collection::{
    Entity as CollectionEntity,
    Model as Collection,
    ActiveModel as CollectionActiveModel,
    Column as CollectionColumn,
};

pub use saved_paper::{
    Entity as SavedPaperEntity,
    Model as SavedPaper,
    ActiveModel as SavedPaperActiveModel,
    Column as SavedPaperColumn,
    ReadingStatus,
};
