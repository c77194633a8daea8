//! `PUT /tables/{table}`: replace the whole table, optionally guarded by
//! `If-Match`.

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, header},
  response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use visitlog_core::table::{Row, TableStore, WriteOutcome};

use crate::{
  AppState,
  auth::Authenticated,
  error::Error,
  handlers::{etag_value, parse_table},
};

#[derive(Debug, Deserialize)]
pub struct PutBody {
  pub rows: Vec<Row>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PutResponse {
  pub etag: String,
}

/// The etag a write must match, if any. `If-Match: *` only requires the table
/// to exist, and every table always exists, so it imposes no condition.
fn if_match(headers: &HeaderMap) -> Result<Option<String>, Error> {
  let Some(value) = headers.get(header::IF_MATCH) else {
    return Ok(None);
  };
  let value = value
    .to_str()
    .map_err(|_| Error::BadRequest("If-Match is not valid ASCII".to_string()))?
    .trim();
  Ok((value != "*").then(|| value.to_owned()))
}

pub async fn handler<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path(name): Path<String>,
  headers: HeaderMap,
  Json(body): Json<PutBody>,
) -> Result<Response, Error>
where
  S: TableStore + Clone + 'static,
{
  let table = parse_table(&name)?;
  let expected = if_match(&headers)?;

  let outcome = state
    .store
    .write(table, body.rows, expected)
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;

  match outcome {
    WriteOutcome::Written { etag } => {
      let value = etag_value(&etag)?;
      Ok(([(header::ETAG, value)], Json(PutResponse { etag })).into_response())
    }
    WriteOutcome::Conflict { current_etag } => {
      Err(Error::PreconditionFailed { current_etag })
    }
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(if_match_value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::IF_MATCH, HeaderValue::from_str(if_match_value).unwrap());
    headers
  }

  #[test]
  fn if_match_is_optional() {
    assert_eq!(if_match(&HeaderMap::new()).unwrap(), None);
  }

  #[test]
  fn wildcard_if_match_imposes_nothing() {
    assert_eq!(if_match(&headers("*")).unwrap(), None);
  }

  #[test]
  fn if_match_is_passed_through() {
    assert_eq!(if_match(&headers("\"abc\"")).unwrap(), Some("\"abc\"".to_owned()));
  }
}
