//! Calendar tab: the month as a list of days, and a single day's visits.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use visitlog_core::{
  calendar::{CalendarDay, DayKind},
  holiday::HolidayCalendar,
  table::TableStore,
};

use super::{dim, highlight, stars};
use crate::app::App;

fn day_style(day: &CalendarDay) -> Style {
  let style = match day.kind {
    DayKind::Sunday | DayKind::Holiday => Style::default().fg(Color::Red),
    DayKind::Saturday => Style::default().fg(Color::Blue),
    DayKind::Weekday => Style::default(),
  };
  if day.is_today {
    style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
  } else {
    style
  }
}

/// Each store visited on `day`, once, in name order.
fn visited_stores(day: &CalendarDay) -> Vec<&str> {
  day
    .visits
    .iter()
    .map(|v| v.store_name.as_str())
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect()
}

fn day_line(day: &CalendarDay) -> Line<'static> {
  let mut spans = vec![Span::styled(
    format!("{:>2} {}", day.day(), day.weekday),
    day_style(day),
  )];

  if !day.visits.is_empty() {
    let stores = visited_stores(day);
    spans.push(Span::styled(
      format!("  ● {:<2}", day.visits.len()),
      Style::default().fg(Color::Green),
    ));
    spans.push(Span::raw(stores.join(", ")));
  }
  if let Some(name) = day.holiday {
    spans.push(Span::styled(format!("  {name}"), Style::default().fg(Color::Red)));
  }
  Line::from(spans)
}

pub fn draw_month<S: TableStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let grid = app.month_grid();
  let visit_total: usize = grid.days.iter().map(|d| d.visits.len()).sum();

  let block = Block::default()
    .title(format!(" {}  ({visit_total} visits) ", grid.cursor))
    .borders(Borders::ALL)
    .border_style(dim());

  let items: Vec<ListItem> = grid.days.iter().map(|d| ListItem::new(day_line(d))).collect();

  let mut state = ListState::default();
  if grid.cursor.contains(app.day_cursor) {
    state.select(Some(app.day_cursor.day0() as usize));
  }

  f.render_stateful_widget(
    List::new(items).block(block).highlight_style(highlight()),
    area,
    &mut state,
  );
}

pub fn draw_day<S: TableStore>(f: &mut Frame, area: Rect, app: &App<S>, date: NaiveDate) {
  let holiday = app
    .holidays
    .holiday_name(date)
    .map(|n| format!(" {n} "))
    .unwrap_or_default();
  let block = Block::default()
    .title(format!(" {} {}{holiday}", date.format("%Y-%m-%d"), date.weekday()))
    .borders(Borders::ALL)
    .border_style(dim());

  if app.day_visits.is_empty() {
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(Paragraph::new("No visits on this day.").style(dim()), inner);
    return;
  }

  let items: Vec<ListItem> = app
    .day_visits
    .iter()
    .map(|v| {
      ListItem::new(Line::from(vec![
        Span::styled(
          format!("{:<20}", v.store_name),
          Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("{:<15}", v.time_range_label().unwrap_or_default())),
        stars(v.rating.value()),
        Span::raw(format!("  {}", v.everyone().to_cell())),
      ]))
    })
    .collect();

  let mut state = ListState::default();
  state.select(Some(app.day_list_cursor));
  f.render_stateful_widget(
    List::new(items).block(block).highlight_style(highlight()),
    area,
    &mut state,
  );
}

#[cfg(test)]
mod tests {
  use visitlog_core::{
    calendar::{MonthCursor, month_grid},
    holiday::NoHolidays,
    record::Visit,
    table::{Row, TableName, blank_row},
  };

  use super::*;

  fn visit(store: &str, date: &str) -> Visit {
    let mut row: Row = blank_row(TableName::Visits);
    row.insert("store_name".into(), store.into());
    row.insert("visit_date".into(), date.into());
    Visit::from_row(&row)
  }

  #[test]
  fn stores_are_listed_once_per_day() {
    let visits = vec![
      visit("Ueno", "2024-03-05"),
      visit("Ginza", "2024-03-05"),
      visit("Ueno", "2024-03-05"),
      visit("Ginza", "2024-03-05"),
    ];
    let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let grid = month_grid(MonthCursor::new(2024, 3).unwrap(), &visits, &NoHolidays, today);

    let day = grid.day(5).unwrap();
    assert_eq!(day.visits.len(), 4);
    assert_eq!(visited_stores(day), vec!["Ginza", "Ueno"]);
    assert!(visited_stores(grid.day(6).unwrap()).is_empty());
  }
}
