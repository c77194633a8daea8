//! Command-line flags, the optional TOML config file, and how they combine.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use crate::client::ApiConfig;

pub const DEFAULT_URL: &str = "http://localhost:8686";
pub const DEFAULT_LOG_FILE: &str = "visitlog.log";

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug, Default)]
#[command(name = "visitlog", about = "Terminal UI for the store visit log")]
pub struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Base URL of the table server.
  #[arg(long, env = "VISITLOG_URL")]
  pub url: Option<String>,

  /// Table server username.
  #[arg(long, env = "VISITLOG_USER")]
  pub user: Option<String>,

  /// Table server password (plaintext).
  #[arg(long, env = "VISITLOG_PASSWORD")]
  pub password: Option<String>,

  /// Use a local SQLite file instead of the table server.
  #[arg(long, value_name = "FILE")]
  pub db: Option<PathBuf>,

  /// Where to write the log (the terminal is taken by the UI).
  #[arg(long, value_name = "FILE")]
  pub log_file: Option<PathBuf>,

  /// Seconds a fetched table is reused before it is read again.
  #[arg(long, value_name = "SECS")]
  pub cache_ttl: Option<u32>,
}

// ─── Config file ─────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
#[serde(default)]
pub struct ConfigFile {
  pub url:       String,
  pub username:  String,
  pub password:  String,
  pub db:        Option<PathBuf>,
  pub log_file:  Option<PathBuf>,
  pub cache_ttl: Option<u32>,
}

impl ConfigFile {
  pub fn load(path: &std::path::Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")
  }
}

// ─── Resolved settings ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendChoice {
  Remote(ApiConfig),
  Local(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  pub backend:        BackendChoice,
  pub log_file:       PathBuf,
  pub cache_ttl_secs: i64,
}

fn non_empty(s: &str) -> Option<String> { (!s.is_empty()).then(|| s.to_owned()) }

impl Settings {
  /// CLI flags override the config file, which overrides defaults. A local
  /// database from either source wins over any server settings.
  pub fn resolve(args: Args, file: ConfigFile) -> Self {
    let backend = match args.db.or(file.db) {
      Some(path) => BackendChoice::Local(path),
      None => BackendChoice::Remote(ApiConfig {
        base_url: args
          .url
          .or_else(|| non_empty(&file.url))
          .unwrap_or_else(|| DEFAULT_URL.to_string()),
        username: args.user.or_else(|| non_empty(&file.username)).unwrap_or_default(),
        password: args.password.or_else(|| non_empty(&file.password)).unwrap_or_default(),
      }),
    };

    Self {
      backend,
      log_file: args
        .log_file
        .or(file.log_file)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
      cache_ttl_secs: args
        .cache_ttl
        .or(file.cache_ttl)
        .map_or(visitlog_core::cache::TableCache::DEFAULT_TTL_SECS, i64::from),
    }
  }
}
