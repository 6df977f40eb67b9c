use std::path::PathBuf;

use thiserror::Error;

use crate::types::{PageId, SlotId};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("page {page_id} out of range (page_count: {page_count})")]
    OutOfRange { page_id: PageId, page_count: u32 },

    #[error("row needs {needed} bytes but only {available} are available")]
    RowTooLarge { needed: usize, available: usize },

    #[error("duplicate primary key: {key}")]
    DuplicateKey { key: i64 },

    #[error("no live row at page {page_id}, slot {slot_id}")]
    NotFound { page_id: PageId, slot_id: SlotId },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema error: {details}")]
    Schema { details: String },

    #[error("type mismatch for column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("primary key column '{column}' cannot be changed by an update")]
    PkImmutable { column: String },

    #[error("table '{name}' already exists")]
    TableExists { name: String },

    #[error("no such table: '{name}'")]
    NoSuchTable { name: String },

    #[error("data files for table '{name}' are missing")]
    MissingTableFiles { name: String },

    #[error("data directory {path:?} is locked by another process")]
    Locked { path: PathBuf },

    #[error("corrupted page {page_id}: {reason}")]
    CorruptedPage { page_id: PageId, reason: String },

    #[error("lex error at position {pos}: {details}")]
    Lex { pos: usize, details: String },

    #[error("unexpected token: expected {expected}, got {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("{statement} failed: {source}")]
    Execution {
        statement: &'static str,
        #[source]
        source: Box<DatabaseError>,
    },
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
