//! Error types for `visitlog-core`.

use thiserror::Error;

use crate::table::TableName;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store name must not be empty")]
  EmptyStoreName,

  #[error("store already exists: {0}")]
  DuplicateStore(String),

  #[error("store not found: {0}")]
  StoreNotFound(String),

  #[error("rating must be between 0 and 5, got {0}")]
  InvalidRating(i64),

  #[error("no visit id left after {0}")]
  VisitIdExhausted(i64),

  #[error("unknown table: {0:?}")]
  UnknownTable(String),

  /// The table was rewritten by someone else between our read and our write.
  #[error("table {0} changed since it was read; reload and try again")]
  Conflict(TableName),

  #[error("table {table} is unavailable: {source}")]
  Unavailable {
    table:  TableName,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("table store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
