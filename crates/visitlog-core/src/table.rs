//! The `TableStore` trait and the flat-table model it operates on.
//!
//! The backing store knows nothing about visits or stores: it holds three
//! named tables, each a list of rows of string cells, and supports exactly two
//! operations: read a whole table, and replace a whole table. Higher layers
//! ([`crate::repository`], `visitlog-tables`, `visitlog-cli`) depend on this
//! abstraction, not on any concrete backend.

use std::{collections::BTreeMap, fmt, future::Future, str::FromStr};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Error;

// ─── Table names ─────────────────────────────────────────────────────────────

/// One of the three logical tables.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TableName {
  Visits,
  Stores,
  Employees,
}

impl TableName {
  pub const ALL: [TableName; 3] =
    [TableName::Visits, TableName::Stores, TableName::Employees];

  /// The name used on the wire and in storage.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Visits => "visits",
      Self::Stores => "stores",
      Self::Employees => "employees",
    }
  }

  /// The fixed column set of this table.
  pub fn columns(self) -> &'static [Column] {
    match self {
      Self::Visits => VISIT_COLUMNS,
      Self::Stores => STORE_COLUMNS,
      Self::Employees => EMPLOYEE_COLUMNS,
    }
  }
}

impl fmt::Display for TableName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for TableName {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "visits" => Ok(Self::Visits),
      "stores" => Ok(Self::Stores),
      "employees" => Ok(Self::Employees),
      other => Err(Error::UnknownTable(other.to_owned())),
    }
  }
}

// ─── Columns ─────────────────────────────────────────────────────────────────

/// A column and the value a row gets when the column is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
  pub name:    &'static str,
  pub default: &'static str,
}

const fn col(name: &'static str) -> Column { Column { name, default: "" } }

pub const VISIT_COLUMNS: &[Column] = &[
  Column { name: "id", default: "0" },
  col("store_name"),
  col("visit_date"),
  // Legacy; always blank on new writes.
  col("visit_time"),
  col("start_time"),
  col("end_time"),
  Column { name: "rating", default: "0" },
  col("members"),
  col("sv_members"),
  col("count_area"),
  // Legacy; always blank on new writes.
  col("notices"),
  // Legacy; always blank on new writes.
  col("memo"),
  col("record_memo"),
];

pub const STORE_COLUMNS: &[Column] =
  &[col("store_id"), col("store_name"), col("notices"), col("memo")];

pub const EMPLOYEE_COLUMNS: &[Column] = &[col("name")];

// ─── Rows ────────────────────────────────────────────────────────────────────

/// A single row: column name → cell text. Blank cells are empty strings.
pub type Row = BTreeMap<String, String>;

/// Add every missing column of `table` to `row` with its default value.
/// Columns the schema does not know about are left alone.
pub fn normalize_row(table: TableName, row: &mut Row) {
  for column in table.columns() {
    row
      .entry(column.name.to_owned())
      .or_insert_with(|| column.default.to_owned());
  }
}

/// A row of `table` with every column set to its default.
pub fn blank_row(table: TableName) -> Row {
  let mut row = Row::new();
  normalize_row(table, &mut row);
  row
}

/// Read a cell, treating a missing column as blank.
pub fn cell<'a>(row: &'a Row, column: &str) -> &'a str {
  row.get(column).map(String::as_str).unwrap_or_default()
}

// ─── Etags ───────────────────────────────────────────────────────────────────

/// Compute the etag of a table's contents.
///
/// SHA-256 over every cell in row order, quoted per RFC 7232. Two tables have
/// the same etag iff they hold the same rows in the same order.
pub fn compute_etag(rows: &[Row]) -> String {
  let mut hasher = Sha256::new();
  for row in rows {
    for (column, value) in row {
      hasher.update(column.as_bytes());
      hasher.update([0x1f]);
      hasher.update(value.as_bytes());
      hasher.update([0x1e]);
    }
    hasher.update([0x1d]);
  }
  format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// Compare two etags, accepting either quoted or bare forms.
pub fn etags_match(a: &str, b: &str) -> bool {
  a.trim_matches('"') == b.trim_matches('"')
}

// ─── Snapshots and write outcomes ────────────────────────────────────────────

/// The full contents of one table at the moment it was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
  pub table: TableName,
  pub rows:  Vec<Row>,
  /// Pass back as `if_match` to [`TableStore::write`] to detect lost updates.
  pub etag:  String,
}

impl TableSnapshot {
  pub fn new(table: TableName, rows: Vec<Row>) -> Self {
    let etag = compute_etag(&rows);
    Self { table, rows, etag }
  }
}

/// Result of a whole-table write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WriteOutcome {
  /// The table now holds exactly the rows that were written.
  Written { etag: String },
  /// `if_match` did not match; nothing was written.
  Conflict { current_etag: String },
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a table-store backend.
///
/// Writes replace the entire table. There are no row-level operations; callers
/// read, modify, and write back. Passing the etag of the read as `if_match`
/// turns the write into a compare-and-swap.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait TableStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read every row of `table`. A table that was never written reads as empty.
  fn read(
    &self,
    table: TableName,
  ) -> impl Future<Output = Result<TableSnapshot, Self::Error>> + Send + '_;

  /// Replace the contents of `table` with `rows`.
  ///
  /// If `if_match` is set and does not equal the current etag, nothing is
  /// written and [`WriteOutcome::Conflict`] is returned.
  fn write(
    &self,
    table: TableName,
    rows: Vec<Row>,
    if_match: Option<String>,
  ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + '_;
}
