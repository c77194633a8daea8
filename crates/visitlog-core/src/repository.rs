//! [`Repository`]: visits, stores, and employees on top of a [`TableStore`].
//!
//! Reads go through the [`TableCache`]. Every mutation reads its table fresh,
//! edits the raw rows, and writes the whole table back guarded by the etag of
//! that read. Rows a mutation does not touch are written back unchanged.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::{
  Error, Result,
  cache::{ReadStatus, TableCache, TableRead},
  record::{Employee, NewVisit, Store, Visit, VisitId, VisitPatch, parse_int_cell},
  table::{Row, TableName, TableSnapshot, TableStore, WriteOutcome, cell},
};

// ─── Read models ─────────────────────────────────────────────────────────────

/// Decoded records of one table plus how the rows were obtained.
#[derive(Debug, Clone)]
pub struct Listing<T> {
  pub items:  Vec<T>,
  pub status: ReadStatus,
}

impl<T> Listing<T> {
  pub fn is_available(&self) -> bool {
    !matches!(self.status, ReadStatus::Unavailable { .. })
  }
}

/// Everything the store detail screen shows.
#[derive(Debug, Clone)]
pub struct StoreDetail {
  pub store_name:     String,
  /// `None` when visits reference a store that is not in the store table.
  pub store:          Option<Store>,
  /// Newest first; undated visits last.
  pub visits:         Vec<Visit>,
  /// Mean of the rated visits, 0.0 when none are rated.
  pub average_rating: f64,
}

impl StoreDetail {
  pub fn visit_count(&self) -> usize { self.visits.len() }
}

/// What [`Repository::update_store`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreUpsert {
  Updated,
  Inserted,
}

// ─── Repository ──────────────────────────────────────────────────────────────

pub struct Repository<S> {
  store: S,
  cache: TableCache,
}

impl<S: TableStore> Repository<S> {
  pub fn new(store: S) -> Self { Self::with_cache(store, TableCache::default()) }

  pub fn with_cache(store: S, cache: TableCache) -> Self { Self { store, cache } }

  pub fn store(&self) -> &S { &self.store }

  pub fn cache(&self) -> &TableCache { &self.cache }

  // ── Cached reads ──────────────────────────────────────────────────────────

  pub async fn read(&self, table: TableName) -> TableRead {
    self.cache.get(&self.store, table).await
  }

  pub async fn visits(&self) -> Listing<Visit> {
    let read = self.read(TableName::Visits).await;
    Listing {
      items:  read.rows.iter().map(Visit::from_row).collect(),
      status: read.status,
    }
  }

  pub async fn stores(&self) -> Listing<Store> {
    let read = self.read(TableName::Stores).await;
    Listing {
      items:  read.rows.iter().map(Store::from_row).collect(),
      status: read.status,
    }
  }

  /// Employee names: non-blank, unique, sorted.
  pub async fn employees(&self) -> Listing<String> {
    let read = self.read(TableName::Employees).await;
    let mut names: Vec<String> = read
      .rows
      .iter()
      .map(|r| Employee::from_row(r).name)
      .filter(|n| !n.is_empty())
      .collect();
    names.sort();
    names.dedup();
    Listing { items: names, status: read.status }
  }

  pub async fn visit(&self, id: VisitId) -> Option<Visit> {
    self.visits().await.items.into_iter().find(|v| v.id == id)
  }

  pub async fn store_named(&self, name: &str) -> Option<Store> {
    self
      .stores()
      .await
      .items
      .into_iter()
      .find(|s| s.store_name == name)
  }

  /// Visits whose date is exactly `date`, in table order.
  pub async fn visits_on(&self, date: NaiveDate) -> Vec<Visit> {
    let mut visits = self.visits().await.items;
    visits.retain(|v| v.visit_date == Some(date));
    visits
  }

  pub async fn store_detail(&self, name: &str) -> StoreDetail {
    let store = self.store_named(name).await;
    let mut visits = self.visits().await.items;
    visits.retain(|v| v.store_name == name);
    // `None` sorts before `Some`, so reversing puts undated visits last.
    visits.sort_by(|a, b| b.visit_date.cmp(&a.visit_date));

    let rated: Vec<f64> = visits
      .iter()
      .filter(|v| v.rating.is_rated())
      .map(|v| f64::from(v.rating.value()))
      .collect();
    let average_rating = if rated.is_empty() {
      0.0
    } else {
      rated.iter().sum::<f64>() / rated.len() as f64
    };

    StoreDetail {
      store_name: name.to_owned(),
      store,
      visits,
      average_rating,
    }
  }

  // ── Write plumbing ────────────────────────────────────────────────────────

  /// Read `table` bypassing the cache. Failures propagate: a mutation must
  /// never mistake an unreachable table for an empty one.
  async fn fetch(&self, table: TableName) -> Result<TableSnapshot> {
    self
      .store
      .read(table)
      .await
      .map_err(|e| Error::Unavailable { table, source: Box::new(e) })
  }

  /// Write `rows` back over the snapshot they were derived from.
  async fn commit(&self, snapshot: TableSnapshot, rows: Vec<Row>) -> Result<()> {
    let table = snapshot.table;
    let outcome = self
      .store
      .write(table, rows, Some(snapshot.etag))
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;

    match outcome {
      WriteOutcome::Written { .. } => {
        self.cache.invalidate_all();
        Ok(())
      }
      WriteOutcome::Conflict { .. } => {
        warn!(%table, "write rejected, table changed since read");
        Err(Error::Conflict(table))
      }
    }
  }

  // ── Visits ────────────────────────────────────────────────────────────────

  /// Append a visit with the next free id (`max + 1`, or 1 for an empty
  /// table). Fails with [`Error::VisitIdExhausted`] when the largest id is
  /// already `i64::MAX`.
  pub async fn add_visit(&self, new: NewVisit) -> Result<Visit> {
    let snapshot = self.fetch(TableName::Visits).await?;
    let id = match snapshot.rows.iter().map(|r| parse_int_cell(cell(r, "id"))).max() {
      Some(max) => max.checked_add(1).ok_or(Error::VisitIdExhausted(max))?,
      None => 1,
    };

    let row = new.into_row(id);
    let visit = Visit::from_row(&row);
    let mut rows = snapshot.rows.clone();
    rows.push(row);
    self.commit(snapshot, rows).await?;

    info!(id, store = %visit.store_name, "visit added");
    Ok(visit)
  }

  /// Overwrite the fields named in `patch` on the visit with `id`. Returns
  /// `false` without writing when no such visit exists.
  pub async fn update_visit(&self, id: VisitId, patch: &VisitPatch) -> Result<bool> {
    let snapshot = self.fetch(TableName::Visits).await?;
    let Some(index) = snapshot
      .rows
      .iter()
      .position(|r| parse_int_cell(cell(r, "id")) == id)
    else {
      return Ok(false);
    };
    if patch.is_empty() {
      return Ok(true);
    }

    let mut rows = snapshot.rows.clone();
    patch.apply(&mut rows[index]);
    self.commit(snapshot, rows).await?;

    info!(id, "visit updated");
    Ok(true)
  }

  /// Remove every row with `id`; returns how many were removed.
  pub async fn delete_visit(&self, id: VisitId) -> Result<usize> {
    let snapshot = self.fetch(TableName::Visits).await?;
    let rows: Vec<Row> = snapshot
      .rows
      .iter()
      .filter(|r| parse_int_cell(cell(r, "id")) != id)
      .cloned()
      .collect();

    let removed = snapshot.rows.len() - rows.len();
    if removed > 0 {
      self.commit(snapshot, rows).await?;
      info!(id, removed, "visit deleted");
    }
    Ok(removed)
  }

  /// Register any unseen members, then add the visit.
  pub async fn record_visit(&self, new: NewVisit) -> Result<Visit> {
    self.ensure_employees(new.everyone().iter()).await?;
    self.add_visit(new).await
  }

  /// Register any unseen members named by `patch`, then apply it.
  pub async fn revise_visit(&self, id: VisitId, patch: &VisitPatch) -> Result<bool> {
    self.ensure_employees(patch.named_members().iter()).await?;
    self.update_visit(id, patch).await
  }

  // ── Stores ────────────────────────────────────────────────────────────────

  /// Add a store unless one with the same name exists. Returns whether a row
  /// was inserted.
  pub async fn register_store(&self, name: &str, notices: &str, memo: &str) -> Result<bool> {
    let name = name.trim();
    if name.is_empty() {
      return Err(Error::EmptyStoreName);
    }

    let snapshot = self.fetch(TableName::Stores).await?;
    if snapshot.rows.iter().any(|r| cell(r, "store_name") == name) {
      return Ok(false);
    }

    let mut rows = snapshot.rows.clone();
    rows.push(Store::new_row(name, notices, memo));
    self.commit(snapshot, rows).await?;

    info!(store = name, "store registered");
    Ok(true)
  }

  /// Overwrite the notes of the store called `name`, registering it if it
  /// does not exist yet.
  pub async fn update_store(&self, name: &str, notices: &str, memo: &str) -> Result<StoreUpsert> {
    let name = name.trim();
    if name.is_empty() {
      return Err(Error::EmptyStoreName);
    }

    let snapshot = self.fetch(TableName::Stores).await?;
    if !snapshot.rows.iter().any(|r| cell(r, "store_name") == name) {
      return if self.register_store(name, notices, memo).await? {
        Ok(StoreUpsert::Inserted)
      } else {
        // Someone registered it between our two reads.
        Err(Error::Conflict(TableName::Stores))
      };
    }

    let mut rows = snapshot.rows.clone();
    for row in rows.iter_mut().filter(|r| cell(r, "store_name") == name) {
      row.insert("notices".into(), notices.to_owned());
      row.insert("memo".into(), memo.to_owned());
    }
    self.commit(snapshot, rows).await?;

    info!(store = name, "store updated");
    Ok(StoreUpsert::Updated)
  }

  /// Rename a store and relink its visits to the new name. The store keeps
  /// its id. Returns the number of visits relinked.
  ///
  /// The two tables are written one after the other; if the second write
  /// fails the store is renamed but its visits still carry the old name.
  pub async fn rename_store(&self, old: &str, new: &str) -> Result<usize> {
    let new = new.trim();
    if new.is_empty() {
      return Err(Error::EmptyStoreName);
    }

    let stores = self.fetch(TableName::Stores).await?;
    if !stores.rows.iter().any(|r| cell(r, "store_name") == old) {
      return Err(Error::StoreNotFound(old.to_owned()));
    }
    if old == new {
      return Ok(0);
    }
    if stores.rows.iter().any(|r| cell(r, "store_name") == new) {
      return Err(Error::DuplicateStore(new.to_owned()));
    }
    let visits = self.fetch(TableName::Visits).await?;

    let mut store_rows = stores.rows.clone();
    for row in store_rows.iter_mut().filter(|r| cell(r, "store_name") == old) {
      row.insert("store_name".into(), new.to_owned());
    }
    self.commit(stores, store_rows).await?;

    let mut visit_rows = visits.rows.clone();
    let mut relinked = 0;
    for row in visit_rows.iter_mut().filter(|r| cell(r, "store_name") == old) {
      row.insert("store_name".into(), new.to_owned());
      relinked += 1;
    }
    if relinked > 0 {
      self.commit(visits, visit_rows).await?;
    }

    info!(from = old, to = new, relinked, "store renamed");
    Ok(relinked)
  }

  // ── Employees ─────────────────────────────────────────────────────────────

  /// Append every name not yet in the employee table. Returns how many were
  /// added.
  pub async fn ensure_employees<I, N>(&self, names: I) -> Result<usize>
  where
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
  {
    let mut wanted: Vec<String> = Vec::new();
    for name in names {
      let name = name.as_ref().trim();
      if !name.is_empty() && !wanted.iter().any(|w| w == name) {
        wanted.push(name.to_owned());
      }
    }
    if wanted.is_empty() {
      return Ok(0);
    }

    let snapshot = self.fetch(TableName::Employees).await?;
    let fresh: Vec<String> = {
      let known: HashSet<&str> = snapshot
        .rows
        .iter()
        .map(|r| cell(r, "name").trim())
        .collect();
      wanted
        .into_iter()
        .filter(|n| !known.contains(n.as_str()))
        .collect()
    };
    if fresh.is_empty() {
      return Ok(0);
    }

    let mut rows = snapshot.rows.clone();
    rows.extend(fresh.iter().map(|n| Employee::new_row(n)));
    self.commit(snapshot, rows).await?;

    info!(added = fresh.len(), "employees added");
    Ok(fresh.len())
  }
}
