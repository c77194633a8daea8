//! `visitlog`: terminal UI for the store visit log.
//!
//! # Usage
//!
//! ```text
//! visitlog --url http://localhost:8686 --user alice --password secret
//! visitlog --db ~/visits.db
//! visitlog --config ~/.config/visitlog/config.toml
//! ```

mod app;
mod backend;
mod client;
mod form;
mod settings;
mod ui;

use std::{io, path::Path, time::Duration};

use anyhow::{Context, Result};
use app::App;
use backend::Backend;
use clap::Parser;
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use settings::{Args, ConfigFile, Settings};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use visitlog_core::{cache::TableCache, repository::Repository, table::TableStore};

// ─── Logging ─────────────────────────────────────────────────────────────────

/// The terminal belongs to the UI, so logs go to a file. The returned guard
/// must live until exit so buffered lines are flushed.
fn init_logging(log_file: &Path) -> Result<WorkerGuard> {
  let file = std::fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(log_file)
    .with_context(|| format!("opening log file {}", log_file.display()))?;
  let (writer, guard) = tracing_appender::non_blocking(file);

  tracing_subscriber::fmt()
    .with_writer(writer)
    .with_ansi(false)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  Ok(guard)
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let file_cfg = match &args.config {
    Some(path) => ConfigFile::load(path)?,
    None => ConfigFile::default(),
  };
  let settings = Settings::resolve(args, file_cfg);
  let _guard = init_logging(&settings.log_file)?;

  let backend = Backend::connect(&settings.backend)
    .await
    .context("connecting to the table store")?;
  let label = backend.describe();
  tracing::info!(backend = %label, ttl_secs = settings.cache_ttl_secs, "starting");

  let cache = TableCache::new(chrono::Duration::seconds(settings.cache_ttl_secs));
  let repo = Repository::with_cache(backend, cache);
  let mut app = App::new(repo, label, chrono::Local::now().date_naive());
  app.refresh().await;

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let mut terminal = Terminal::new(CrosstermBackend::new(stdout)).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  if let Err(e) = &run_result {
    tracing::error!(error = %e, "exiting on error");
  }
  run_result
}

// ─── Event loop ──────────────────────────────────────────────────────────────

async fn run_event_loop<S: TableStore>(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<S>,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    // Windows reports key releases too.
    if let Some(Event::Key(key)) = maybe_event
      && key.kind == KeyEventKind::Press
      && !app.handle_key(key).await?
    {
      break;
    }
  }

  Ok(())
}
