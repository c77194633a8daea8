//! Visit entry form, drawn as a popup over the store detail.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph},
};

use super::{centered, dim};
use crate::form::{VisitField, VisitForm};

pub fn draw(f: &mut Frame, area: Rect, form: &VisitForm, employees: &[String], title: &str) {
  let area = centered(area, 64, VisitField::ALL.len() as u16 + 5);

  let mut lines: Vec<Line> = VisitField::ALL
    .iter()
    .map(|&field| {
      let focused = field == form.focus;
      let label_style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
      } else {
        Style::default().fg(Color::Cyan)
      };
      let value = form.field(field);
      let value = if focused { format!("{value}_") } else { value.to_owned() };
      Line::from(vec![
        Span::styled(if focused { "> " } else { "  " }, label_style),
        Span::styled(format!("{:<9}", field.label()), label_style),
        Span::raw(value),
      ])
    })
    .collect();

  lines.push(Line::from(""));
  let suggestions = form.suggestions(employees);
  lines.push(if suggestions.is_empty() {
    Line::from(Span::styled("Date YYYY-MM-DD  times HH:MM  rating 1-5 or blank", dim()))
  } else {
    Line::from(vec![
      Span::styled("→ ", Style::default().fg(Color::Green)),
      Span::raw(suggestions.join("  ")),
    ])
  });

  f.render_widget(Clear, area);
  f.render_widget(
    Paragraph::new(lines).block(
      Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan)),
    ),
    area,
  );
}
