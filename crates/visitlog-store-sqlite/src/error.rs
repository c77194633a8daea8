//! Error type for `visitlog-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A stored row is not a JSON object of string cells.
  #[error("corrupt row {position} in table {table}: {source}")]
  CorruptRow {
    table:    String,
    position: i64,
    #[source]
    source:   serde_json::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
