//! Register tab, plus the store details form it shares with the detail pane.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph},
};
use visitlog_core::table::TableStore;

use super::dim;
use crate::{
  app::App,
  form::{StoreField, StoreForm},
};

pub fn draw_store_form(f: &mut Frame, area: Rect, form: &StoreForm, title: &str) {
  let lines: Vec<Line> = StoreField::ALL
    .iter()
    .map(|&field| {
      let focused = field == form.focus;
      let style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
      } else {
        Style::default().fg(Color::Cyan)
      };
      let value = form.field(field);
      Line::from(vec![
        Span::styled(if focused { "> " } else { "  " }, style),
        Span::styled(format!("{:<12}", field.label()), style),
        Span::raw(if focused { format!("{value}_") } else { value.to_owned() }),
      ])
    })
    .collect();

  f.render_widget(Clear, area);
  f.render_widget(
    Paragraph::new(lines).block(
      Block::default()
        .title(title.to_owned())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan)),
    ),
    area,
  );
}

pub fn draw<S: TableStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(5), Constraint::Length(2), Constraint::Min(0)])
    .split(area);

  draw_store_form(f, rows[0], &app.register, " Register a store ");

  let note = match &app.pending_existing {
    Some(name) => Line::from(Span::styled(
      format!(" {name} already exists. Enter opens it; keep typing to change the name."),
      Style::default().fg(Color::Yellow),
    )),
    None => Line::from(Span::styled(" Enter registers the store.", dim())),
  };
  f.render_widget(Paragraph::new(note), rows[1]);
}
