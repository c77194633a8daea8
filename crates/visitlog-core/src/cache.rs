//! Time-windowed read cache in front of a [`TableStore`].
//!
//! Each table is fetched at most once per window. Mutations never go through
//! the cache; they invalidate it once their write has landed.

use std::{
  collections::HashMap,
  sync::{Arc, PoisonError, RwLock},
};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::table::{Row, TableName, TableStore, normalize_row};

// ─── Read results ────────────────────────────────────────────────────────────

/// Where the rows of a [`TableRead`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStatus {
  /// Fetched from the store by this call.
  Fresh,
  /// Served from the cache.
  Cached { fetched_at: DateTime<Utc> },
  /// The store could not be reached; the rows are empty.
  Unavailable { reason: String },
}

/// The rows of one table plus how they were obtained.
///
/// On failure the rows are empty, so a caller that only wants "whatever data
/// there is" can ignore the status entirely.
#[derive(Debug, Clone)]
pub struct TableRead {
  pub table:  TableName,
  pub rows:   Arc<Vec<Row>>,
  pub status: ReadStatus,
}

impl TableRead {
  pub fn is_available(&self) -> bool {
    !matches!(self.status, ReadStatus::Unavailable { .. })
  }
}

// ─── Cache ───────────────────────────────────────────────────────────────────

struct CachedTable {
  rows:       Arc<Vec<Row>>,
  fetched_at: DateTime<Utc>,
}

/// Per-table memo of the last successful read.
pub struct TableCache {
  /// How long a fetched table is reused before it is read again.
  ttl:     Duration,
  entries: RwLock<HashMap<TableName, CachedTable>>,
}

impl Default for TableCache {
  fn default() -> Self { Self::new(Duration::seconds(Self::DEFAULT_TTL_SECS)) }
}

impl TableCache {
  pub const DEFAULT_TTL_SECS: i64 = 60;

  pub fn new(ttl: Duration) -> Self {
    Self {
      ttl,
      entries: RwLock::new(HashMap::new()),
    }
  }

  pub fn ttl(&self) -> Duration { self.ttl }

  /// Rows of `table`, from the cache if fetched within the window, otherwise
  /// from `store`. Rows are normalised to the table's column set.
  pub async fn get<S: TableStore>(&self, store: &S, table: TableName) -> TableRead {
    self.get_at(store, table, Utc::now()).await
  }

  async fn get_at<S: TableStore>(
    &self,
    store: &S,
    table: TableName,
    now: DateTime<Utc>,
  ) -> TableRead {
    if let Some(hit) = self.lookup(table, now) {
      debug!(%table, "cache hit");
      return hit;
    }

    debug!(%table, "cache miss, reading table");
    match store.read(table).await {
      Ok(snapshot) => {
        let mut rows = snapshot.rows;
        for row in &mut rows {
          normalize_row(table, row);
        }
        let rows = Arc::new(rows);
        self
          .entries
          .write()
          .unwrap_or_else(PoisonError::into_inner)
          .insert(table, CachedTable { rows: rows.clone(), fetched_at: now });
        TableRead { table, rows, status: ReadStatus::Fresh }
      }
      Err(e) => {
        warn!(%table, error = %e, "table read failed, serving empty table");
        TableRead {
          table,
          rows: Arc::new(Vec::new()),
          status: ReadStatus::Unavailable { reason: e.to_string() },
        }
      }
    }
  }

  fn lookup(&self, table: TableName, now: DateTime<Utc>) -> Option<TableRead> {
    let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
    let cached = entries.get(&table)?;
    (now - cached.fetched_at < self.ttl).then(|| TableRead {
      table,
      rows: cached.rows.clone(),
      status: ReadStatus::Cached { fetched_at: cached.fetched_at },
    })
  }

  /// Force the next [`get`](Self::get) of `table` to hit the store.
  pub fn invalidate(&self, table: TableName) {
    self
      .entries
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&table);
  }

  pub fn invalidate_all(&self) {
    self
      .entries
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .clear();
  }
}
