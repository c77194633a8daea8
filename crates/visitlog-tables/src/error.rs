//! Error type and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  /// `If-Match` did not match the table's current etag.
  #[error("precondition failed: table is at {current_etag}")]
  PreconditionFailed { current_etag: String },

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let message = self.to_string();
    match self {
      Error::Unauthorized => {
        let mut res = (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"visitlog\""),
        );
        res
      }
      Error::NotFound(_) => (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response(),
      Error::PreconditionFailed { current_etag } => {
        let body = Json(json!({ "error": message, "current_etag": current_etag }));
        let mut res = (StatusCode::PRECONDITION_FAILED, body).into_response();
        if let Ok(value) = HeaderValue::from_str(&current_etag) {
          res.headers_mut().insert(header::ETAG, value);
        }
        res
      }
      Error::BadRequest(_) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
      }
      Error::Store(e) => {
        tracing::error!(error = %e, "table store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message }))).into_response()
      }
    }
  }
}
