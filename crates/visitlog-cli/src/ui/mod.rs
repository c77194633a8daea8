//! TUI rendering: header, the active screen, and the status bar.

pub mod calendar;
pub mod register;
pub mod stores;
pub mod visit_form;

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};
use visitlog_core::{
  navigation::{Screen, Tab},
  table::TableStore,
};

use crate::app::App;

// ─── Root draw ───────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<S: TableStore>(f: &mut Frame, app: &App<S>) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);
}

/// A `width` x `height` rectangle centred in `area`.
pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect {
    x: area.x + (area.width - width) / 2,
    y: area.y + (area.height - height) / 2,
    width,
    height,
  }
}

pub(crate) fn dim() -> Style { Style::default().fg(Color::DarkGray) }

pub(crate) fn highlight() -> Style {
  Style::default()
    .bg(Color::Blue)
    .fg(Color::White)
    .add_modifier(Modifier::BOLD)
}

/// `★★★☆☆`, or a dim dash when unrated.
pub(crate) fn stars(rating: u8) -> Span<'static> {
  if rating == 0 {
    return Span::styled("-----", dim());
  }
  let filled = usize::from(rating.min(5));
  Span::styled(
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled)),
    Style::default().fg(Color::Yellow),
  )
}

// ─── Header ──────────────────────────────────────────────────────────────────

fn draw_header<S: TableStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let mut spans = vec![Span::styled(
    " visitlog ",
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
  )];
  for (i, tab) in Tab::ALL.iter().enumerate() {
    let label = format!(" F{} {} ", i + 1, tab.title());
    let style = if *tab == app.nav.tab() {
      Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::Gray)
    };
    spans.push(Span::styled(label, style));
  }

  let right = format!("{}  {} ", app.backend, app.today.format("%Y-%m-%d"));
  let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
  let pad = usize::from(area.width)
    .saturating_sub(used)
    .saturating_sub(right.chars().count());
  spans.push(Span::raw(" ".repeat(pad)));
  spans.push(Span::styled(right, Style::default().fg(Color::Gray)));

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(Line::from(spans)), inner);
}

// ─── Body ────────────────────────────────────────────────────────────────────

fn draw_body<S: TableStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  match app.nav.screen() {
    Screen::Month(_) => calendar::draw_month(f, area, app),
    Screen::Day(date) => calendar::draw_day(f, area, app, date),
    Screen::StoreDetail { editing, .. } => {
      stores::draw_detail(f, area, app);
      if editing.is_some()
        && let Some(form) = &app.visit_form
      {
        visit_form::draw(f, area, form, &app.employees, "Edit visit");
      }
    }
    Screen::AddVisit { store, .. } => {
      stores::draw_detail(f, area, app);
      if let Some(form) = &app.visit_form {
        visit_form::draw(f, area, form, &app.employees, &format!("New visit: {store}"));
      }
    }
    Screen::StoreList => stores::draw_list(f, area, app),
    Screen::Register => register::draw(f, area, app),
  }

  if let Some(form) = &app.store_form {
    register::draw_store_form(f, centered(area, 60, 9), form, " Store details ");
  }
}

// ─── Status bar ──────────────────────────────────────────────────────────────

fn draw_status<S: TableStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let (mode_label, hints) = if app.visit_form.is_some() || app.store_form.is_some() {
    ("FORM", "Tab/↑↓ field  → complete name  Enter save  Esc cancel")
  } else if app.query_active {
    ("SEARCH", "Type to filter  Enter done  Esc clear")
  } else {
    match app.nav.screen() {
      Screen::Month(_) => ("MONTH", "hjkl/arrows day  p/n month  t today  Enter open  r reload  q quit"),
      Screen::Day(_) => ("DAY", "↑↓ select  Enter store  Esc back"),
      Screen::StoreDetail { .. } | Screen::AddVisit { .. } => {
        ("STORE", "↑↓ select  e edit  a add  dd delete  i details  Esc back")
      }
      Screen::StoreList => ("STORES", "/ search  1/2/3 scopes  Enter open  q quit"),
      Screen::Register => ("REGISTER", "Tab field  Enter register  Esc clear  F1/F2 tabs"),
    }
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );

  let mut spans = vec![mode_span];
  if !app.offline.is_empty() {
    spans.push(Span::styled(
      format!(" offline: {} ", app.offline.join("; ")),
      Style::default().fg(Color::White).bg(Color::Red),
    ));
  }
  let status = if app.status_msg.is_empty() { hints } else { app.status_msg.as_str() };
  spans.push(Span::styled(format!("  {status}"), dim()));

  f.render_widget(
    Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black)),
    area,
  );
}
