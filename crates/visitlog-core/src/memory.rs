//! In-process [`TableStore`], used by tests and for running the UI without a
//! backend.

use std::{
  collections::{HashMap, HashSet},
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use thiserror::Error;

use crate::table::{
  Row, TableName, TableSnapshot, TableStore, WriteOutcome, compute_etag, etags_match,
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("table {0} is offline")]
  Offline(TableName),
}

#[derive(Default)]
struct Inner {
  tables:  HashMap<TableName, Vec<Row>>,
  offline: HashSet<TableName>,
  reads:   HashMap<TableName, usize>,
  writes:  HashMap<TableName, usize>,
}

/// A table store held entirely in memory.
///
/// Cloning is cheap and clones share the same tables, so a test can keep a
/// handle to inspect or tamper with what a repository wrote.
#[derive(Clone, Default)]
pub struct MemoryTableStore {
  inner: Arc<Mutex<Inner>>,
}

impl MemoryTableStore {
  pub fn new() -> Self { Self::default() }

  /// Seed `table` with `rows`, replacing anything already there.
  pub fn with_rows(self, table: TableName, rows: Vec<Row>) -> Self {
    self.replace(table, rows);
    self
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Current rows of `table`, bypassing the read counter.
  pub fn rows(&self, table: TableName) -> Vec<Row> {
    self.lock().tables.get(&table).cloned().unwrap_or_default()
  }

  /// Overwrite `table` as another client would, without an etag check.
  pub fn replace(&self, table: TableName, rows: Vec<Row>) {
    self.lock().tables.insert(table, rows);
  }

  /// Make reads and writes of `table` fail until switched back.
  pub fn set_offline(&self, table: TableName, offline: bool) {
    let mut inner = self.lock();
    if offline {
      inner.offline.insert(table);
    } else {
      inner.offline.remove(&table);
    }
  }

  /// How many times `table` has been read through the trait.
  pub fn read_count(&self, table: TableName) -> usize {
    self.lock().reads.get(&table).copied().unwrap_or(0)
  }

  /// How many successful writes `table` has received through the trait.
  pub fn write_count(&self, table: TableName) -> usize {
    self.lock().writes.get(&table).copied().unwrap_or(0)
  }
}

impl TableStore for MemoryTableStore {
  type Error = MemoryError;

  async fn read(&self, table: TableName) -> Result<TableSnapshot, MemoryError> {
    let mut inner = self.lock();
    *inner.reads.entry(table).or_default() += 1;
    if inner.offline.contains(&table) {
      return Err(MemoryError::Offline(table));
    }
    let rows = inner.tables.get(&table).cloned().unwrap_or_default();
    Ok(TableSnapshot::new(table, rows))
  }

  async fn write(
    &self,
    table: TableName,
    rows: Vec<Row>,
    if_match: Option<String>,
  ) -> Result<WriteOutcome, MemoryError> {
    let mut inner = self.lock();
    if inner.offline.contains(&table) {
      return Err(MemoryError::Offline(table));
    }

    let current_etag = compute_etag(inner.tables.get(&table).map(Vec::as_slice).unwrap_or_default());
    if let Some(expected) = if_match
      && !etags_match(&expected, &current_etag)
    {
      return Ok(WriteOutcome::Conflict { current_etag });
    }

    let etag = compute_etag(&rows);
    inner.tables.insert(table, rows);
    *inner.writes.entry(table).or_default() += 1;
    Ok(WriteOutcome::Written { etag })
  }
}
