//! [`TableStore`] over the `visitlog-tables` JSON API.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode, header};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use visitlog_core::table::{Row, TableName, TableSnapshot, TableStore, WriteOutcome};

/// Connection settings for the table server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{method} {url} → {status}: {body}")]
  Status {
    method: Method,
    url:    String,
    status: StatusCode,
    body:   String,
  },
}

#[derive(Serialize)]
struct PutBody<'a> {
  rows: &'a [Row],
}

#[derive(Deserialize)]
struct PutResponse {
  etag: String,
}

#[derive(Deserialize, Default)]
struct ConflictBody {
  #[serde(default)]
  current_etag: String,
}

/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpTableStore {
  client: Client,
  config: ApiConfig,
}

impl HttpTableStore {
  pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  pub fn base_url(&self) -> &str { &self.config.base_url }

  fn url(&self, table: TableName) -> String {
    format!("{}/tables/{}", self.config.base_url.trim_end_matches('/'), table)
  }

  fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
    let req = self.client.request(method, url);
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  async fn status_error(method: Method, url: String, resp: reqwest::Response) -> ClientError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    ClientError::Status { method, url, status, body }
  }

  async fn get_table(&self, table: TableName) -> Result<TableSnapshot, ClientError> {
    let url = self.url(table);
    let resp = self.request(Method::GET, &url).send().await?;
    if !resp.status().is_success() {
      return Err(Self::status_error(Method::GET, url, resp).await);
    }
    Ok(resp.json().await?)
  }

  async fn put_table(
    &self,
    table: TableName,
    rows: Vec<Row>,
    if_match: Option<String>,
  ) -> Result<WriteOutcome, ClientError> {
    let url = self.url(table);
    let mut req = self.request(Method::PUT, &url).json(&PutBody { rows: &rows });
    if let Some(etag) = if_match {
      req = req.header(header::IF_MATCH, etag);
    }
    let resp = req.send().await?;

    if resp.status() == StatusCode::PRECONDITION_FAILED {
      let from_header = resp
        .headers()
        .get(header::ETAG)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
      let current_etag = match from_header {
        Some(etag) => etag,
        None => resp.json::<ConflictBody>().await.unwrap_or_default().current_etag,
      };
      tracing::warn!(%table, "server rejected write, table changed");
      return Ok(WriteOutcome::Conflict { current_etag });
    }
    if !resp.status().is_success() {
      return Err(Self::status_error(Method::PUT, url, resp).await);
    }

    let PutResponse { etag } = resp.json().await?;
    Ok(WriteOutcome::Written { etag })
  }
}

impl TableStore for HttpTableStore {
  type Error = ClientError;

  fn read(
    &self,
    table: TableName,
  ) -> impl Future<Output = Result<TableSnapshot, Self::Error>> + Send + '_ {
    self.get_table(table)
  }

  fn write(
    &self,
    table: TableName,
    rows: Vec<Row>,
    if_match: Option<String>,
  ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + '_ {
    self.put_table(table, rows, if_match)
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use tokio::net::TcpListener;
  use visitlog_core::{memory::MemoryTableStore, table::compute_etag};
  use visitlog_tables::{AppState, ServerConfig, auth::hash_password};

  use super::*;

  fn employee(name: &str) -> Row { Row::from([("name".to_owned(), name.to_owned())]) }

  /// Serve a memory-backed table server on an ephemeral port.
  async fn spawn_server(store: MemoryTableStore) -> String {
    let config = ServerConfig {
      host:               "127.0.0.1".into(),
      port:               0,
      store_path:         PathBuf::from(":memory:"),
      auth_username:      "alice".into(),
      auth_password_hash: hash_password("secret").unwrap(),
    };
    let app = visitlog_tables::router(AppState::new(store, &config));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
  }

  fn client(base_url: String, password: &str) -> HttpTableStore {
    HttpTableStore::new(ApiConfig {
      base_url,
      username: "alice".into(),
      password: password.into(),
    })
    .unwrap()
  }

  #[tokio::test]
  async fn reads_and_writes_through_the_server() {
    let store = MemoryTableStore::new().with_rows(TableName::Employees, vec![employee("Sato")]);
    let http = client(spawn_server(store.clone()).await, "secret");

    let snapshot = http.read(TableName::Employees).await.unwrap();
    assert_eq!(snapshot.rows, vec![employee("Sato")]);
    assert_eq!(snapshot.etag, compute_etag(&[employee("Sato")]));

    let rows = vec![employee("Sato"), employee("Ito")];
    let outcome = http
      .write(TableName::Employees, rows.clone(), Some(snapshot.etag))
      .await
      .unwrap();
    assert_eq!(outcome, WriteOutcome::Written { etag: compute_etag(&rows) });
    assert_eq!(store.rows(TableName::Employees), rows);
  }

  #[tokio::test]
  async fn stale_write_reports_conflict() {
    let store = MemoryTableStore::new().with_rows(TableName::Employees, vec![employee("Sato")]);
    let http = client(spawn_server(store.clone()).await, "secret");

    let outcome = http
      .write(TableName::Employees, Vec::new(), Some("\"stale\"".into()))
      .await
      .unwrap();
    assert_eq!(
      outcome,
      WriteOutcome::Conflict { current_etag: compute_etag(&[employee("Sato")]) }
    );
    assert_eq!(store.rows(TableName::Employees), vec![employee("Sato")]);
  }

  #[tokio::test]
  async fn bad_credentials_surface_as_status_error() {
    let http = client(spawn_server(MemoryTableStore::new()).await, "wrong");
    let err = http.read(TableName::Visits).await.unwrap_err();
    assert!(
      matches!(err, ClientError::Status { status: StatusCode::UNAUTHORIZED, .. }),
      "{err}"
    );
  }

  #[tokio::test]
  async fn repository_works_over_http() {
    use visitlog_core::{record::NewVisit, repository::Repository};

    let store = MemoryTableStore::new();
    let repo = Repository::new(client(spawn_server(store.clone()).await, "secret"));

    let visit = repo.add_visit(NewVisit::new("Ginza", None)).await.unwrap();
    assert_eq!(visit.id, 1);
    assert_eq!(store.rows(TableName::Visits).len(), 1);
    assert_eq!(repo.visits().await.items.len(), 1);
  }
}
