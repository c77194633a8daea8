//! Editable text forms: visit entry and store details.
//!
//! Every field is edited as plain text and only parsed on save, so a typo
//! never loses what the user already typed.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use visitlog_core::record::{
  MemberSet, NewVisit, Rating, Store, Visit, VisitPatch, encode_date, encode_time,
  parse_date_cell, parse_time_cell,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
  #[error("invalid date {0:?} (expected YYYY-MM-DD)")]
  InvalidDate(String),

  #[error("invalid time {0:?} (expected HH:MM)")]
  InvalidTime(String),

  #[error("invalid rating {0:?} (expected 1-5, or blank)")]
  InvalidRating(String),
}

// ─── Visit form ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitField {
  Date,
  Start,
  End,
  Rating,
  Supervisors,
  Members,
  Area,
  Memo,
}

impl VisitField {
  pub const ALL: [VisitField; 8] = [
    VisitField::Date,
    VisitField::Start,
    VisitField::End,
    VisitField::Rating,
    VisitField::Supervisors,
    VisitField::Members,
    VisitField::Area,
    VisitField::Memo,
  ];

  pub fn label(self) -> &'static str {
    match self {
      Self::Date => "Date",
      Self::Start => "Start",
      Self::End => "End",
      Self::Rating => "Rating",
      Self::Supervisors => "SV",
      Self::Members => "Members",
      Self::Area => "Area",
      Self::Memo => "Memo",
    }
  }

  pub fn takes_names(self) -> bool { matches!(self, Self::Supervisors | Self::Members) }

  fn position(self) -> usize { Self::ALL.iter().position(|f| *f == self).unwrap_or(0) }

  fn next(self) -> Self { Self::ALL[(self.position() + 1) % Self::ALL.len()] }

  fn prev(self) -> Self { Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()] }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitForm {
  pub date:    String,
  pub start:   String,
  pub end:     String,
  pub rating:  String,
  pub sv:      String,
  pub members: String,
  pub area:    String,
  pub memo:    String,
  pub focus:   VisitField,
}

/// Rating a new visit starts with.
const DEFAULT_RATING: &str = "3";

fn names_text(set: &MemberSet) -> String { set.iter().collect::<Vec<_>>().join(", ") }

impl VisitForm {
  pub fn blank(date: NaiveDate) -> Self {
    Self {
      date:    encode_date(Some(date)),
      start:   String::new(),
      end:     String::new(),
      rating:  DEFAULT_RATING.to_owned(),
      sv:      String::new(),
      members: String::new(),
      area:    String::new(),
      memo:    String::new(),
      focus:   VisitField::Date,
    }
  }

  pub fn from_visit(visit: &Visit) -> Self {
    Self {
      date:    encode_date(visit.visit_date),
      start:   encode_time(visit.start_time),
      end:     encode_time(visit.end_time),
      rating:  if visit.rating.is_rated() {
        visit.rating.value().to_string()
      } else {
        String::new()
      },
      sv:      names_text(&visit.sv_members),
      members: names_text(&visit.members),
      area:    visit.count_area.clone(),
      memo:    visit.record_memo.clone(),
      focus:   VisitField::Date,
    }
  }

  pub fn field(&self, field: VisitField) -> &str {
    match field {
      VisitField::Date => &self.date,
      VisitField::Start => &self.start,
      VisitField::End => &self.end,
      VisitField::Rating => &self.rating,
      VisitField::Supervisors => &self.sv,
      VisitField::Members => &self.members,
      VisitField::Area => &self.area,
      VisitField::Memo => &self.memo,
    }
  }

  fn focused_mut(&mut self) -> &mut String {
    match self.focus {
      VisitField::Date => &mut self.date,
      VisitField::Start => &mut self.start,
      VisitField::End => &mut self.end,
      VisitField::Rating => &mut self.rating,
      VisitField::Supervisors => &mut self.sv,
      VisitField::Members => &mut self.members,
      VisitField::Area => &mut self.area,
      VisitField::Memo => &mut self.memo,
    }
  }

  pub fn focus_next(&mut self) { self.focus = self.focus.next(); }

  pub fn focus_prev(&mut self) { self.focus = self.focus.prev(); }

  pub fn input(&mut self, c: char) { self.focused_mut().push(c); }

  pub fn backspace(&mut self) { self.focused_mut().pop(); }

  /// Known employees matching the name being typed in a member field.
  pub fn suggestions<'a>(&self, employees: &'a [String]) -> Vec<&'a str> {
    if !self.focus.takes_names() {
      return Vec::new();
    }
    let text = self.field(self.focus);
    let partial = text.rsplit(',').next().unwrap_or_default().trim().to_lowercase();
    if partial.is_empty() {
      return Vec::new();
    }
    let typed = MemberSet::parse(text);
    employees
      .iter()
      .map(String::as_str)
      .filter(|e| e.to_lowercase().starts_with(&partial) && !typed.contains(e))
      .collect()
  }

  /// Replace the name being typed with `name`.
  pub fn complete(&mut self, name: &str) {
    let text = self.focused_mut();
    let kept = text.rfind(',').map_or("", |i| &text[..=i]).to_owned();
    *text = if kept.is_empty() { format!("{name}, ") } else { format!("{kept} {name}, ") };
  }

  fn parse_date(&self) -> Result<Option<NaiveDate>, FormError> {
    let s = self.date.trim();
    if s.is_empty() {
      return Ok(None);
    }
    parse_date_cell(s)
      .map(Some)
      .ok_or_else(|| FormError::InvalidDate(s.to_owned()))
  }

  fn parse_time(s: &str) -> Result<Option<NaiveTime>, FormError> {
    let s = s.trim();
    if s.is_empty() {
      return Ok(None);
    }
    parse_time_cell(s)
      .map(Some)
      .ok_or_else(|| FormError::InvalidTime(s.to_owned()))
  }

  fn parse_rating(&self) -> Result<Rating, FormError> {
    let s = self.rating.trim();
    if s.is_empty() {
      return Ok(Rating::UNRATED);
    }
    s.parse::<u8>()
      .ok()
      .filter(|v| *v > 0)
      .and_then(|v| Rating::new(v).ok())
      .ok_or_else(|| FormError::InvalidRating(s.to_owned()))
  }

  pub fn to_new_visit(&self, store_name: &str) -> Result<NewVisit, FormError> {
    Ok(NewVisit {
      store_name:  store_name.to_owned(),
      visit_date:  self.parse_date()?,
      start_time:  Self::parse_time(&self.start)?,
      end_time:    Self::parse_time(&self.end)?,
      rating:      self.parse_rating()?,
      members:     MemberSet::parse(&self.members),
      sv_members:  MemberSet::parse(&self.sv),
      count_area:  self.area.trim().to_owned(),
      record_memo: self.memo.clone(),
    })
  }

  /// Only the fields that differ from `original`.
  pub fn to_patch(&self, original: &Visit) -> Result<VisitPatch, FormError> {
    fn changed<T: PartialEq>(new: T, old: &T) -> Option<T> { (new != *old).then_some(new) }

    let parsed = self.to_new_visit(&original.store_name)?;
    Ok(VisitPatch {
      visit_date:  changed(parsed.visit_date, &original.visit_date),
      start_time:  changed(parsed.start_time, &original.start_time),
      end_time:    changed(parsed.end_time, &original.end_time),
      rating:      changed(parsed.rating, &original.rating),
      members:     changed(parsed.members, &original.members),
      sv_members:  changed(parsed.sv_members, &original.sv_members),
      count_area:  changed(parsed.count_area, &original.count_area),
      record_memo: changed(parsed.record_memo, &original.record_memo),
    })
  }
}

// ─── Store form ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreField {
  #[default]
  Name,
  Notices,
  Memo,
}

impl StoreField {
  pub const ALL: [StoreField; 3] = [StoreField::Name, StoreField::Notices, StoreField::Memo];

  pub fn label(self) -> &'static str {
    match self {
      Self::Name => "Store name",
      Self::Notices => "Notices",
      Self::Memo => "Memo",
    }
  }
}

/// Name and notes of a store; used both to register a new store and to edit
/// an existing one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreForm {
  pub name:    String,
  pub notices: String,
  pub memo:    String,
  pub focus:   StoreField,
}

impl StoreForm {
  pub fn for_store(name: &str, store: Option<&Store>) -> Self {
    Self {
      name:    name.to_owned(),
      notices: store.map(|s| s.notices.clone()).unwrap_or_default(),
      memo:    store.map(|s| s.memo.clone()).unwrap_or_default(),
      focus:   StoreField::Name,
    }
  }

  pub fn field(&self, field: StoreField) -> &str {
    match field {
      StoreField::Name => &self.name,
      StoreField::Notices => &self.notices,
      StoreField::Memo => &self.memo,
    }
  }

  fn focused_mut(&mut self) -> &mut String {
    match self.focus {
      StoreField::Name => &mut self.name,
      StoreField::Notices => &mut self.notices,
      StoreField::Memo => &mut self.memo,
    }
  }

  pub fn focus_next(&mut self) {
    self.focus = match self.focus {
      StoreField::Name => StoreField::Notices,
      StoreField::Notices => StoreField::Memo,
      StoreField::Memo => StoreField::Name,
    };
  }

  pub fn focus_prev(&mut self) {
    self.focus = match self.focus {
      StoreField::Name => StoreField::Memo,
      StoreField::Notices => StoreField::Name,
      StoreField::Memo => StoreField::Notices,
    };
  }

  pub fn input(&mut self, c: char) { self.focused_mut().push(c); }

  pub fn backspace(&mut self) { self.focused_mut().pop(); }
}

#[cfg(test)]
mod tests {
  use visitlog_core::table::{Row, TableName, blank_row};

  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  fn visit() -> Visit {
    let mut row: Row = blank_row(TableName::Visits);
    for (k, v) in [
      ("id", "7"),
      ("store_name", "Ginza"),
      ("visit_date", "2024-03-05"),
      ("start_time", "10:00"),
      ("rating", "4"),
      ("members", "Ito, Sato"),
      ("sv_members", "Abe"),
      ("record_memo", "busy"),
    ] {
      row.insert(k.into(), v.into());
    }
    Visit::from_row(&row)
  }

  fn type_text(form: &mut VisitForm, text: &str) { text.chars().for_each(|c| form.input(c)); }

  #[test]
  fn blank_form_defaults() {
    let form = VisitForm::blank(date(2024, 3, 5));
    assert_eq!(form.date, "2024-03-05");
    assert_eq!(form.rating, "3");

    let new = form.to_new_visit("Ginza").unwrap();
    assert_eq!(new.visit_date, Some(date(2024, 3, 5)));
    assert_eq!(new.rating.value(), 3);
    assert!(new.members.is_empty());
  }

  #[test]
  fn typed_fields_parse() {
    let mut form = VisitForm::blank(date(2024, 3, 5));
    form.focus = VisitField::Start;
    type_text(&mut form, "9:30");
    form.focus_next();
    type_text(&mut form, "11:00");
    form.focus_next();
    form.backspace();
    type_text(&mut form, "5");
    form.focus = VisitField::Members;
    type_text(&mut form, "Sato,  Ito ,Sato");

    let new = form.to_new_visit("Ginza").unwrap();
    assert_eq!(new.start_time, NaiveTime::from_hms_opt(9, 30, 0));
    assert_eq!(new.end_time, NaiveTime::from_hms_opt(11, 0, 0));
    assert_eq!(new.rating.value(), 5);
    assert_eq!(new.members.to_cell(), MemberSet::from_names(["Ito", "Sato"]).to_cell());
  }

  #[test]
  fn blank_rating_means_unrated() {
    let mut form = VisitForm::blank(date(2024, 3, 5));
    form.rating.clear();
    assert_eq!(form.to_new_visit("Ginza").unwrap().rating, Rating::UNRATED);
  }

  #[test]
  fn invalid_input_is_reported() {
    let mut form = VisitForm::blank(date(2024, 3, 5));
    form.date = "March 5".into();
    assert_eq!(form.to_new_visit("Ginza"), Err(FormError::InvalidDate("March 5".into())));

    let mut form = VisitForm::blank(date(2024, 3, 5));
    form.end = "25:99".into();
    assert!(matches!(form.to_new_visit("Ginza"), Err(FormError::InvalidTime(_))));

    for bad in ["0", "6", "x"] {
      let mut form = VisitForm::blank(date(2024, 3, 5));
      form.rating = bad.into();
      assert!(matches!(form.to_new_visit("Ginza"), Err(FormError::InvalidRating(_))), "{bad}");
    }
  }

  #[test]
  fn unchanged_form_yields_empty_patch() {
    let original = visit();
    let form = VisitForm::from_visit(&original);
    assert!(form.to_patch(&original).unwrap().is_empty());
  }

  #[test]
  fn patch_holds_only_changed_fields() {
    let original = visit();
    let mut form = VisitForm::from_visit(&original);
    form.rating = "2".into();
    form.start.clear();
    form.members = "Ito".into();

    let patch = form.to_patch(&original).unwrap();
    assert_eq!(patch.rating, Some(Rating::new(2).unwrap()));
    assert_eq!(patch.start_time, Some(None));
    assert_eq!(patch.members, Some(MemberSet::from_names(["Ito"])));
    assert_eq!(patch.visit_date, None);
    assert_eq!(patch.sv_members, None);
    assert_eq!(patch.record_memo, None);
  }

  #[test]
  fn member_suggestions_complete_the_last_name() {
    let employees = vec!["Abe".to_owned(), "Ito".to_owned(), "Itou".to_owned(), "Sato".to_owned()];
    let mut form = VisitForm::blank(date(2024, 3, 5));
    assert!(form.suggestions(&employees).is_empty(), "date field takes no names");

    form.focus = VisitField::Members;
    type_text(&mut form, "Abe, it");
    assert_eq!(form.suggestions(&employees), vec!["Ito", "Itou"]);

    form.complete("Ito");
    assert_eq!(form.members, "Abe, Ito, ");
    type_text(&mut form, "I");
    assert_eq!(form.suggestions(&employees), vec!["Itou"]);
  }

  #[test]
  fn store_form_cycles_fields() {
    let mut form = StoreForm::default();
    "Ginza".chars().for_each(|c| form.input(c));
    form.focus_next();
    "closed Mondays".chars().for_each(|c| form.input(c));
    form.focus_prev();
    form.backspace();

    assert_eq!(form.name, "Ginz");
    assert_eq!(form.field(StoreField::Notices), "closed Mondays");
    assert_eq!(form.focus, StoreField::Name);
  }
}
