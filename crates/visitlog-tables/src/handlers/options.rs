//! OPTIONS handler; no auth required.

use axum::{
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};

pub async fn handler() -> Response {
  (
    StatusCode::NO_CONTENT,
    [(header::ALLOW, HeaderValue::from_static("OPTIONS, GET, HEAD, PUT"))],
  )
    .into_response()
}
