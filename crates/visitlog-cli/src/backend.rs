//! The table store the UI runs against: the remote server or a local file.

use std::path::PathBuf;

use thiserror::Error;
use visitlog_core::table::{Row, TableName, TableSnapshot, TableStore, WriteOutcome};
use visitlog_store_sqlite::SqliteStore;

use crate::{
  client::{ClientError, HttpTableStore},
  settings::BackendChoice,
};

#[derive(Debug, Error)]
pub enum BackendError {
  #[error(transparent)]
  Remote(#[from] ClientError),

  #[error(transparent)]
  Local(#[from] visitlog_store_sqlite::Error),
}

pub enum Backend {
  Remote(HttpTableStore),
  Local { store: SqliteStore, path: PathBuf },
}

impl Backend {
  pub async fn connect(choice: &BackendChoice) -> Result<Self, BackendError> {
    match choice {
      BackendChoice::Remote(api) => Ok(Self::Remote(HttpTableStore::new(api.clone())?)),
      BackendChoice::Local(path) => Ok(Self::Local {
        store: SqliteStore::open(path).await?,
        path:  path.clone(),
      }),
    }
  }

  /// Short label for the header bar.
  pub fn describe(&self) -> String {
    match self {
      Self::Remote(http) => http.base_url().to_owned(),
      Self::Local { path, .. } => format!("local: {}", path.display()),
    }
  }

  async fn read_table(&self, table: TableName) -> Result<TableSnapshot, BackendError> {
    Ok(match self {
      Self::Remote(http) => http.read(table).await?,
      Self::Local { store, .. } => store.read(table).await?,
    })
  }

  async fn write_table(
    &self,
    table: TableName,
    rows: Vec<Row>,
    if_match: Option<String>,
  ) -> Result<WriteOutcome, BackendError> {
    Ok(match self {
      Self::Remote(http) => http.write(table, rows, if_match).await?,
      Self::Local { store, .. } => store.write(table, rows, if_match).await?,
    })
  }
}

impl TableStore for Backend {
  type Error = BackendError;

  fn read(
    &self,
    table: TableName,
  ) -> impl Future<Output = Result<TableSnapshot, Self::Error>> + Send + '_ {
    self.read_table(table)
  }

  fn write(
    &self,
    table: TableName,
    rows: Vec<Row>,
    if_match: Option<String>,
  ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + '_ {
    self.write_table(table, rows, if_match)
  }
}
