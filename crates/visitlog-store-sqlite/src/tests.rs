//! Integration tests for `SqliteStore` against an in-memory database.

use visitlog_core::{
  record::NewVisit,
  repository::Repository,
  table::{Row, TableName, TableStore, WriteOutcome, compute_etag},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn employee(name: &str) -> Row { Row::from([("name".to_owned(), name.to_owned())]) }

// ─── Reads and writes ────────────────────────────────────────────────────────

#[tokio::test]
async fn unwritten_table_reads_empty() {
  let s = store().await;
  let snapshot = s.read(TableName::Visits).await.unwrap();
  assert!(snapshot.rows.is_empty());
  assert_eq!(snapshot.etag, compute_etag(&[]));
}

#[tokio::test]
async fn write_then_read_preserves_row_order() {
  let s = store().await;
  let rows = vec![employee("Sato"), employee("Abe"), employee("Ito")];

  let outcome = s.write(TableName::Employees, rows.clone(), None).await.unwrap();
  let WriteOutcome::Written { etag } = outcome else {
    panic!("unconditional write must land");
  };

  let snapshot = s.read(TableName::Employees).await.unwrap();
  assert_eq!(snapshot.rows, rows);
  assert_eq!(snapshot.etag, etag);
}

#[tokio::test]
async fn write_replaces_whole_table() {
  let s = store().await;
  s.write(TableName::Employees, vec![employee("Sato"), employee("Abe")], None)
    .await
    .unwrap();
  s.write(TableName::Employees, vec![employee("Ito")], None)
    .await
    .unwrap();

  let snapshot = s.read(TableName::Employees).await.unwrap();
  assert_eq!(snapshot.rows, vec![employee("Ito")]);
}

#[tokio::test]
async fn tables_are_independent() {
  let s = store().await;
  s.write(TableName::Employees, vec![employee("Sato")], None)
    .await
    .unwrap();

  assert!(s.read(TableName::Stores).await.unwrap().rows.is_empty());
  assert_eq!(s.read(TableName::Employees).await.unwrap().rows.len(), 1);
}

#[tokio::test]
async fn unknown_columns_are_kept_verbatim() {
  let s = store().await;
  let row = Row::from([
    ("name".to_owned(), "Sato".to_owned()),
    ("nickname".to_owned(), "Sa-chan".to_owned()),
  ]);
  s.write(TableName::Employees, vec![row.clone()], None)
    .await
    .unwrap();
  assert_eq!(s.read(TableName::Employees).await.unwrap().rows, vec![row]);
}

// ─── Etag guard ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn matching_etag_allows_write() {
  let s = store().await;
  let before = s.read(TableName::Employees).await.unwrap();

  let outcome = s
    .write(TableName::Employees, vec![employee("Sato")], Some(before.etag))
    .await
    .unwrap();
  assert!(matches!(outcome, WriteOutcome::Written { .. }));
}

#[tokio::test]
async fn stale_etag_is_rejected_and_table_unchanged() {
  let s = store().await;
  let stale = s.read(TableName::Employees).await.unwrap().etag;
  s.write(TableName::Employees, vec![employee("Sato")], None)
    .await
    .unwrap();
  let current = s.read(TableName::Employees).await.unwrap();

  let outcome = s
    .write(TableName::Employees, vec![employee("Ito")], Some(stale))
    .await
    .unwrap();
  assert_eq!(outcome, WriteOutcome::Conflict { current_etag: current.etag.clone() });
  assert_eq!(s.read(TableName::Employees).await.unwrap(), current);
}

#[tokio::test]
async fn unquoted_etag_matches() {
  let s = store().await;
  let etag = s.read(TableName::Stores).await.unwrap().etag;
  let bare = etag.trim_matches('"').to_owned();

  let outcome = s.write(TableName::Stores, Vec::new(), Some(bare)).await.unwrap();
  assert!(matches!(outcome, WriteOutcome::Written { .. }));
}

// ─── Corruption ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn corrupt_row_json_is_reported() {
  let s = store().await;
  s.connection()
    .call(|conn| {
      conn.execute(
        "INSERT INTO table_rows (table_name, position, row_json) VALUES ('stores', 0, 'not json')",
        [],
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let err = s.read(TableName::Stores).await.unwrap_err();
  assert!(matches!(err, Error::CorruptRow { position: 0, .. }));
}

// ─── Through the repository ──────────────────────────────────────────────────

#[tokio::test]
async fn repository_round_trip_over_sqlite() {
  let repo = Repository::new(store().await);

  let first = repo.add_visit(NewVisit::new("Ginza", None)).await.unwrap();
  let second = repo.add_visit(NewVisit::new("Ueno", None)).await.unwrap();
  assert_eq!((first.id, second.id), (1, 2));

  assert!(repo.register_store("Ginza", "", "").await.unwrap());
  assert!(!repo.register_store("Ginza", "", "").await.unwrap());

  let visits = repo.visits().await;
  assert!(visits.is_available());
  assert_eq!(visits.items.len(), 2);
  assert_eq!(repo.stores().await.items.len(), 1);
}
