//! [`SqliteStore`]: the SQLite implementation of [`TableStore`].

use std::path::Path;

use tracing::{debug, info, warn};
use visitlog_core::table::{
  Row, TableName, TableSnapshot, TableStore, WriteOutcome, compute_etag, etags_match,
};

use crate::{
  Error, Result,
  encode::{RawRow, decode_rows, encode_row},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A table store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  #[cfg(test)]
  pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection { &self.conn }
}

fn load_raw_rows(conn: &rusqlite::Connection, table: TableName) -> rusqlite::Result<Vec<RawRow>> {
  let mut stmt = conn.prepare(
    "SELECT position, row_json FROM table_rows WHERE table_name = ?1 ORDER BY position",
  )?;
  stmt
    .query_map(rusqlite::params![table.as_str()], |row| {
      Ok(RawRow {
        position: row.get(0)?,
        row_json: row.get(1)?,
      })
    })?
    .collect()
}

// ─── TableStore impl ─────────────────────────────────────────────────────────

impl TableStore for SqliteStore {
  type Error = Error;

  async fn read(&self, table: TableName) -> Result<TableSnapshot> {
    let raws = self
      .conn
      .call(move |conn| Ok(load_raw_rows(conn, table)?))
      .await?;

    let rows = decode_rows(table, raws)?;
    debug!(%table, rows = rows.len(), "read table");
    Ok(TableSnapshot::new(table, rows))
  }

  async fn write(
    &self,
    table: TableName,
    rows: Vec<Row>,
    if_match: Option<String>,
  ) -> Result<WriteOutcome> {
    let encoded = rows.iter().map(encode_row).collect::<Result<Vec<_>>>()?;
    let etag = compute_etag(&rows);
    let count = rows.len();

    // The etag check and the replacement share one transaction, so a
    // concurrent writer cannot slip in between them.
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if let Some(expected) = if_match {
          let current = decode_rows(table, load_raw_rows(&tx, table)?)
            .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
          let current_etag = compute_etag(&current);
          if !etags_match(&expected, &current_etag) {
            return Ok(WriteOutcome::Conflict { current_etag });
          }
        }

        tx.execute(
          "DELETE FROM table_rows WHERE table_name = ?1",
          rusqlite::params![table.as_str()],
        )?;
        {
          let mut insert = tx.prepare(
            "INSERT INTO table_rows (table_name, position, row_json) VALUES (?1, ?2, ?3)",
          )?;
          for (position, row_json) in encoded.iter().enumerate() {
            insert.execute(rusqlite::params![table.as_str(), position as i64, row_json])?;
          }
        }
        tx.commit()?;

        Ok(WriteOutcome::Written { etag })
      })
      .await?;

    match &outcome {
      WriteOutcome::Written { etag } => info!(%table, rows = count, %etag, "table written"),
      WriteOutcome::Conflict { current_etag } => {
        warn!(%table, %current_etag, "write rejected: etag mismatch")
      }
    }
    Ok(outcome)
  }
}
