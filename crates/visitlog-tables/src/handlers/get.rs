//! `GET /tables/{table}`: the whole table plus its etag.

use axum::{
  Json,
  extract::{Path, State},
  http::header,
  response::{IntoResponse, Response},
};
use visitlog_core::table::TableStore;

use crate::{
  AppState,
  auth::Authenticated,
  error::Error,
  handlers::{etag_value, parse_table},
};

pub async fn handler<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path(name): Path<String>,
) -> Result<Response, Error>
where
  S: TableStore + Clone + 'static,
{
  let table = parse_table(&name)?;
  let snapshot = state
    .store
    .read(table)
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;

  tracing::debug!(%table, rows = snapshot.rows.len(), "serving table");
  let etag = etag_value(&snapshot.etag)?;
  Ok(([(header::ETAG, etag)], Json(snapshot)).into_response())
}
