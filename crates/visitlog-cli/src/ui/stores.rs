//! Store list with search, and the store detail pane.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use visitlog_core::{
  record::{Visit, encode_date},
  table::TableStore,
};

use super::{dim, highlight, stars};
use crate::app::App;

// ─── List ────────────────────────────────────────────────────────────────────

fn scope_span(key: char, label: &str, on: bool) -> Span<'static> {
  let style = if on {
    Style::default().fg(Color::Black).bg(Color::Green)
  } else {
    dim()
  };
  Span::styled(format!(" {key} {label} "), style)
}

pub fn draw_list<S: TableStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(3), Constraint::Min(0)])
    .split(area);

  let query = if app.query_active {
    format!("/{}_", app.query)
  } else if app.query.is_empty() {
    "/ to search".to_owned()
  } else {
    format!("/{}", app.query)
  };
  let query_style = if app.query_active || !app.query.is_empty() {
    Style::default().fg(Color::Yellow)
  } else {
    dim()
  };
  let search_line = Line::from(vec![
    Span::styled(format!("{query:<30}"), query_style),
    scope_span('1', "name", app.scopes.store_name),
    Span::raw(" "),
    scope_span('2', "members", app.scopes.members),
    Span::raw(" "),
    scope_span('3', "notes", app.scopes.notes),
  ]);
  f.render_widget(
    Paragraph::new(search_line).block(
      Block::default()
        .title(" Search ")
        .borders(Borders::ALL)
        .border_style(dim()),
    ),
    rows[0],
  );

  let results = app.search_results();
  let block = Block::default()
    .title(format!(" Stores ({}/{}) ", results.len(), app.stores.len()))
    .borders(Borders::ALL)
    .border_style(dim());

  let items: Vec<ListItem> = results
    .iter()
    .map(|name| {
      let count = app.visits.iter().filter(|v| &v.store_name == name).count();
      ListItem::new(Line::from(vec![
        Span::raw(format!("{name:<30}")),
        Span::styled(format!("{count} visits"), dim()),
      ]))
    })
    .collect();

  let mut state = ListState::default();
  state.select((!results.is_empty()).then_some(app.list_cursor));
  f.render_stateful_widget(
    List::new(items).block(block).highlight_style(highlight()),
    rows[1],
    &mut state,
  );
}

// ─── Detail ──────────────────────────────────────────────────────────────────

fn label(text: &str) -> Span<'static> {
  Span::styled(
    format!("{text:<9}"),
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
  )
}

fn visit_item(visit: &Visit) -> ListItem<'static> {
  let mut lines = vec![Line::from(vec![
    Span::styled(
      format!("#{:<4} {:<11}", visit.id, encode_date(visit.visit_date)),
      Style::default().add_modifier(Modifier::BOLD),
    ),
    Span::raw(format!("{:<15}", visit.time_range_label().unwrap_or_default())),
    stars(visit.rating.value()),
  ])];

  let mut people = Vec::new();
  if !visit.sv_members.is_empty() {
    people.push(label("SV"));
    people.push(Span::raw(format!("{}  ", visit.sv_members.to_cell())));
  }
  if !visit.members.is_empty() {
    people.push(label("Members"));
    people.push(Span::raw(visit.members.to_cell()));
  }
  if !people.is_empty() {
    lines.push(Line::from(people));
  }
  if !visit.count_area.is_empty() {
    lines.push(Line::from(vec![label("Area"), Span::raw(visit.count_area.clone())]));
  }
  if !visit.record_memo.is_empty() {
    lines.push(Line::from(vec![label("Memo"), Span::raw(visit.record_memo.clone())]));
  }
  ListItem::new(lines)
}

pub fn draw_detail<S: TableStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let Some(detail) = &app.detail else {
    f.render_widget(Paragraph::new("Loading…").style(dim()), area);
    return;
  };

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(6), Constraint::Min(0)])
    .split(area);

  let (notices, memo) = detail
    .store
    .as_ref()
    .map_or(("", ""), |s| (s.notices.as_str(), s.memo.as_str()));
  let mut summary = vec![
    Line::from(vec![
      label("Visits"),
      Span::raw(format!("{}   ", detail.visit_count())),
      label("Average"),
      Span::raw(format!("{:.1}", detail.average_rating)),
    ]),
    Line::from(vec![label("Notices"), Span::raw(notices.to_owned())]),
    Line::from(vec![label("Memo"), Span::raw(memo.to_owned())]),
  ];
  if detail.store.is_none() {
    summary.push(Line::from(Span::styled(
      "Not in the store table; press i to add details.",
      Style::default().fg(Color::Yellow),
    )));
  }
  f.render_widget(
    Paragraph::new(summary).wrap(Wrap { trim: true }).block(
      Block::default()
        .title(format!(" {} ", detail.store_name))
        .borders(Borders::ALL)
        .border_style(dim()),
    ),
    rows[0],
  );

  let block = Block::default()
    .title(" History ")
    .borders(Borders::ALL)
    .border_style(dim());
  if detail.visits.is_empty() {
    let inner = block.inner(rows[1]);
    f.render_widget(block, rows[1]);
    f.render_widget(Paragraph::new("No visits yet. Press a to add one.").style(dim()), inner);
    return;
  }

  let items: Vec<ListItem> = detail.visits.iter().map(visit_item).collect();
  let mut state = ListState::default();
  state.select(Some(app.visit_cursor));
  f.render_stateful_widget(
    List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::DarkGray))
      .highlight_symbol("▌"),
    rows[1],
    &mut state,
  );
}
