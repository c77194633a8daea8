//! Conversion between table rows and the JSON text stored in `row_json`.

use visitlog_core::table::{Row, TableName};

use crate::{Error, Result};

pub fn encode_row(row: &Row) -> Result<String> { Ok(serde_json::to_string(row)?) }

/// A `table_rows` row as read from SQLite, before decoding.
pub struct RawRow {
  pub position: i64,
  pub row_json: String,
}

impl RawRow {
  pub fn into_row(self, table: TableName) -> Result<Row> {
    serde_json::from_str(&self.row_json).map_err(|source| Error::CorruptRow {
      table: table.to_string(),
      position: self.position,
      source,
    })
  }
}

pub fn decode_rows(table: TableName, raws: Vec<RawRow>) -> Result<Vec<Row>> {
  raws.into_iter().map(|raw| raw.into_row(table)).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rows_survive_json_encoding() {
    let row = Row::from([
      ("store_name".to_owned(), "Ginza \"East\"".to_owned()),
      ("memo".to_owned(), "line one\nline two".to_owned()),
    ]);
    let raw = RawRow { position: 0, row_json: encode_row(&row).unwrap() };
    assert_eq!(raw.into_row(TableName::Stores).unwrap(), row);
  }

  #[test]
  fn non_string_cells_are_corrupt() {
    let raw = RawRow { position: 3, row_json: r#"{"id": 4}"#.to_owned() };
    match raw.into_row(TableName::Visits) {
      Err(Error::CorruptRow { table, position, .. }) => {
        assert_eq!(table, "visits");
        assert_eq!(position, 3);
      }
      other => panic!("expected CorruptRow, got {other:?}"),
    }
  }
}
