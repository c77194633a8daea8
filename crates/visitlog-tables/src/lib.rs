//! HTTP table service for the visit log.
//!
//! Exposes an axum [`Router`] serving whole-table reads and etag-guarded
//! whole-table writes, backed by any [`TableStore`].
//!
//! | Method    | Path              | Notes                                   |
//! |-----------|-------------------|-----------------------------------------|
//! | `GET`     | `/tables/{table}` | `{"table","rows","etag"}` + `ETag`      |
//! | `PUT`     | `/tables/{table}` | Body `{"rows":[...]}`; `If-Match` → 412 |
//! | `OPTIONS` | `/tables/{table}` | No auth                                 |

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::{Error, Result};

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use visitlog_core::table::TableStore;

use auth::AuthConfig;

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8686 }

fn default_store_path() -> PathBuf { PathBuf::from("visitlog.db") }

/// Runtime server configuration, deserialised from `config.toml` and
/// `VISITLOG_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: TableStore> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

impl<S: TableStore> AppState<S> {
  pub fn new(store: S, config: &ServerConfig) -> Self {
    Self {
      store: Arc::new(store),
      auth:  Arc::new(AuthConfig {
        username:      config.auth_username.clone(),
        password_hash: config.auth_password_hash.clone(),
      }),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the table service.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: TableStore + Clone + 'static,
{
  Router::new()
    .route(
      "/tables/{table}",
      get(handlers::get::handler::<S>)
        .put(handlers::put::handler::<S>)
        .options(handlers::options::handler),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use visitlog_core::{
    memory::MemoryTableStore,
    table::{Row, TableName, compute_etag},
  };

  use super::*;

  fn make_state(password: &str) -> (AppState<MemoryTableStore>, MemoryTableStore) {
    let store = MemoryTableStore::new();
    let config = ServerConfig {
      host:               default_host(),
      port:               default_port(),
      store_path:         PathBuf::from(":memory:"),
      auth_username:      "user".to_string(),
      auth_password_hash: auth::hash_password(password).unwrap(),
    };
    (AppState::new(store.clone(), &config), store)
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn oneshot_raw(
    state:   AppState<MemoryTableStore>,
    method:  &str,
    uri:     &str,
    headers: Vec<(header::HeaderName, &str)>,
    body:    &str,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    router(state).oneshot(req).await.unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn employee(name: &str) -> Row { Row::from([("name".to_owned(), name.to_owned())]) }

  // ── OPTIONS ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn options_needs_no_auth() {
    let (state, _) = make_state("secret");
    let resp = oneshot_raw(state, "OPTIONS", "/tables/visits", vec![], "").await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let allow = resp.headers().get(header::ALLOW).unwrap().to_str().unwrap();
    assert!(allow.contains("PUT"), "Allow: {allow}");
  }

  // ── GET ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn get_returns_rows_and_etag() {
    let (state, store) = make_state("secret");
    store.replace(TableName::Employees, vec![employee("Sato"), employee("Ito")]);
    let auth = auth_header("user", "secret");

    let resp = oneshot_raw(
      state,
      "GET",
      "/tables/employees",
      vec![(header::AUTHORIZATION, auth.as_str())],
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let expected = compute_etag(&[employee("Sato"), employee("Ito")]);
    let etag = resp.headers().get(header::ETAG).unwrap().to_str().unwrap().to_string();
    assert_eq!(etag, expected);

    let body = json_body(resp).await;
    assert_eq!(body["table"], "employees");
    assert_eq!(body["etag"], expected);
    assert_eq!(body["rows"], json!([{ "name": "Sato" }, { "name": "Ito" }]));
  }

  #[tokio::test]
  async fn unknown_table_returns_404() {
    let (state, _) = make_state("secret");
    let auth = auth_header("user", "secret");
    let resp = oneshot_raw(
      state,
      "GET",
      "/tables/sheets",
      vec![(header::AUTHORIZATION, auth.as_str())],
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn offline_store_returns_500() {
    let (state, store) = make_state("secret");
    store.set_offline(TableName::Visits, true);
    let auth = auth_header("user", "secret");
    let resp = oneshot_raw(
      state,
      "GET",
      "/tables/visits",
      vec![(header::AUTHORIZATION, auth.as_str())],
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  // ── PUT ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn put_replaces_table() {
    let (state, store) = make_state("secret");
    let auth = auth_header("user", "secret");

    let resp = oneshot_raw(
      state,
      "PUT",
      "/tables/employees",
      vec![
        (header::AUTHORIZATION, auth.as_str()),
        (header::CONTENT_TYPE, "application/json"),
      ],
      r#"{"rows":[{"name":"Abe"}]}"#,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key(header::ETAG));

    let body = json_body(resp).await;
    assert_eq!(body["etag"], compute_etag(&[employee("Abe")]));
    assert_eq!(store.rows(TableName::Employees), vec![employee("Abe")]);
  }

  #[tokio::test]
  async fn put_with_current_if_match_succeeds() {
    let (state, store) = make_state("secret");
    store.replace(TableName::Employees, vec![employee("Sato")]);
    let etag = compute_etag(&[employee("Sato")]);
    let auth = auth_header("user", "secret");

    let resp = oneshot_raw(
      state,
      "PUT",
      "/tables/employees",
      vec![
        (header::AUTHORIZATION, auth.as_str()),
        (header::CONTENT_TYPE, "application/json"),
        (header::IF_MATCH, etag.as_str()),
      ],
      r#"{"rows":[{"name":"Sato"},{"name":"Ito"}]}"#,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(store.rows(TableName::Employees).len(), 2);
  }

  #[tokio::test]
  async fn put_with_stale_if_match_returns_412() {
    let (state, store) = make_state("secret");
    store.replace(TableName::Employees, vec![employee("Sato")]);
    let auth = auth_header("user", "secret");

    let resp = oneshot_raw(
      state,
      "PUT",
      "/tables/employees",
      vec![
        (header::AUTHORIZATION, auth.as_str()),
        (header::CONTENT_TYPE, "application/json"),
        (header::IF_MATCH, "\"stale-etag\""),
      ],
      r#"{"rows":[]}"#,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::PRECONDITION_FAILED);

    let current = compute_etag(&[employee("Sato")]);
    assert_eq!(resp.headers().get(header::ETAG).unwrap().to_str().unwrap(), current);
    let body = json_body(resp).await;
    assert_eq!(body["current_etag"], current);
    assert_eq!(store.rows(TableName::Employees), vec![employee("Sato")]);
  }

  #[tokio::test]
  async fn put_with_malformed_body_is_rejected() {
    let (state, store) = make_state("secret");
    let auth = auth_header("user", "secret");
    let resp = oneshot_raw(
      state,
      "PUT",
      "/tables/employees",
      vec![
        (header::AUTHORIZATION, auth.as_str()),
        (header::CONTENT_TYPE, "application/json"),
      ],
      r#"{"rows": "nope"}"#,
    )
    .await;
    assert!(resp.status().is_client_error());
    assert_eq!(store.write_count(TableName::Employees), 0);
  }

  // ── Auth ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unauthenticated_requests_return_401() {
    let (state, store) = make_state("secret");

    let resp = oneshot_raw(state.clone(), "GET", "/tables/visits", vec![], "").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

    let wrong = auth_header("user", "wrong");
    let resp = oneshot_raw(
      state,
      "PUT",
      "/tables/visits",
      vec![
        (header::AUTHORIZATION, wrong.as_str()),
        (header::CONTENT_TYPE, "application/json"),
      ],
      r#"{"rows":[]}"#,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(store.write_count(TableName::Visits), 0);
  }
}
