pub mod get;
pub mod options;
pub mod put;

use axum::http::HeaderValue;
use visitlog_core::table::TableName;

use crate::error::Error;

/// Resolve the `{table}` path segment; unknown names are a 404.
pub(super) fn parse_table(name: &str) -> Result<TableName, Error> {
  name
    .parse()
    .map_err(|_| Error::NotFound(format!("no table named {name:?}")))
}

pub(super) fn etag_value(etag: &str) -> Result<HeaderValue, Error> {
  HeaderValue::from_str(etag).map_err(|e| Error::Store(Box::new(e)))
}
