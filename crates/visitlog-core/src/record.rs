//! Typed records decoded from table rows.
//!
//! Decoding is lenient: the backing tables are hand-editable, so a malformed
//! cell decodes to its "empty" value instead of failing the whole read.
//! Encoding only ever touches the cells a caller asks to change, so rows
//! written back by the repository keep whatever they held before.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  table::{Row, TableName, blank_row, cell},
};

pub type VisitId = i64;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

// ─── Cell codecs ─────────────────────────────────────────────────────────────

/// Parse an integer cell. Spreadsheets hand back `"3"`, `"3.0"`, or junk;
/// junk decodes as 0.
pub fn parse_int_cell(s: &str) -> i64 {
  let s = s.trim();
  s.parse::<i64>()
    .ok()
    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
    .unwrap_or(0)
}

/// Parse a `YYYY-MM-DD` cell. Anything else, a trailing time included, is
/// undated.
pub fn parse_date_cell(s: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// Parse an `HH:MM` (or `HH:MM:SS`) cell.
pub fn parse_time_cell(s: &str) -> Option<NaiveTime> {
  let s = s.trim();
  NaiveTime::parse_from_str(s, TIME_FORMAT)
    .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
    .ok()
}

pub fn encode_date(d: Option<NaiveDate>) -> String {
  d.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default()
}

pub fn encode_time(t: Option<NaiveTime>) -> String {
  t.map(|t| t.format(TIME_FORMAT).to_string()).unwrap_or_default()
}

// ─── Rating ──────────────────────────────────────────────────────────────────

/// A 1–5 star rating, or 0 for "unrated".
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
  pub const UNRATED: Rating = Rating(0);
  pub const MAX: u8 = 5;

  pub fn new(value: u8) -> Result<Self> {
    if value <= Self::MAX {
      Ok(Self(value))
    } else {
      Err(Error::InvalidRating(value.into()))
    }
  }

  pub fn value(self) -> u8 { self.0 }

  pub fn is_rated(self) -> bool { self.0 > 0 }

  /// Out-of-range cells decode as unrated.
  fn from_cell(s: &str) -> Self {
    u8::try_from(parse_int_cell(s))
      .ok()
      .and_then(|v| Self::new(v).ok())
      .unwrap_or(Self::UNRATED)
  }
}

impl TryFrom<u8> for Rating {
  type Error = Error;

  fn try_from(value: u8) -> Result<Self> { Self::new(value) }
}

impl From<Rating> for u8 {
  fn from(r: Rating) -> u8 { r.0 }
}

// ─── Member sets ─────────────────────────────────────────────────────────────

/// A set of employee names stored as one comma-joined cell.
///
/// Names are trimmed, blanks dropped, duplicates collapsed. Iteration order is
/// alphabetical; the stored cell carries no ordering meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSet(BTreeSet<String>);

impl MemberSet {
  pub fn parse(cell: &str) -> Self { Self::from_names(cell.split(',')) }

  pub fn from_names<I, S>(names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    Self(
      names
        .into_iter()
        .map(|n| n.as_ref().trim().to_owned())
        .filter(|n| !n.is_empty())
        .collect(),
    )
  }

  pub fn to_cell(&self) -> String {
    self.0.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> { self.0.iter().map(String::as_str) }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn contains(&self, name: &str) -> bool { self.0.contains(name) }

  pub fn union(&self, other: &MemberSet) -> MemberSet {
    Self(self.0.union(&other.0).cloned().collect())
  }
}

// ─── Visit ───────────────────────────────────────────────────────────────────

/// Columns kept only so old sheets keep working. New writes leave them blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyVisitFields {
  pub visit_time: String,
  pub notices:    String,
  pub memo:       String,
}

/// One occurrence of staff visiting a store on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
  pub id:          VisitId,
  /// References [`Store::store_name`]. Not enforced; orphans are tolerated.
  pub store_name:  String,
  pub visit_date:  Option<NaiveDate>,
  pub start_time:  Option<NaiveTime>,
  pub end_time:    Option<NaiveTime>,
  pub rating:      Rating,
  pub members:     MemberSet,
  /// The `members` cell exactly as stored. Member search matches against it.
  pub members_raw: String,
  /// Supervisors present on the visit.
  pub sv_members:  MemberSet,
  /// Free-text assignment label, e.g. "1F floor".
  pub count_area:  String,
  pub record_memo: String,
  pub legacy:      LegacyVisitFields,
}

impl Visit {
  pub fn from_row(row: &Row) -> Self {
    Self {
      id:          parse_int_cell(cell(row, "id")),
      store_name:  cell(row, "store_name").to_owned(),
      visit_date:  parse_date_cell(cell(row, "visit_date")),
      start_time:  parse_time_cell(cell(row, "start_time")),
      end_time:    parse_time_cell(cell(row, "end_time")),
      rating:      Rating::from_cell(cell(row, "rating")),
      members:     MemberSet::parse(cell(row, "members")),
      members_raw: cell(row, "members").to_owned(),
      sv_members:  MemberSet::parse(cell(row, "sv_members")),
      count_area:  cell(row, "count_area").to_owned(),
      record_memo: cell(row, "record_memo").to_owned(),
      legacy:      LegacyVisitFields {
        visit_time: cell(row, "visit_time").to_owned(),
        notices:    cell(row, "notices").to_owned(),
        memo:       cell(row, "memo").to_owned(),
      },
    }
  }

  /// `"10:00 ~ 12:30"`, `"10:00 ~ "`, or `None` when neither time is set.
  pub fn time_range_label(&self) -> Option<String> {
    if self.start_time.is_none() && self.end_time.is_none() {
      return None;
    }
    Some(format!(
      "{} ~ {}",
      encode_time(self.start_time),
      encode_time(self.end_time)
    ))
  }

  /// Everyone on the visit, supervisors included.
  pub fn everyone(&self) -> MemberSet { self.members.union(&self.sv_members) }
}

/// Input to [`crate::repository::Repository::add_visit`]. The id is always
/// assigned by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVisit {
  pub store_name:  String,
  pub visit_date:  Option<NaiveDate>,
  pub start_time:  Option<NaiveTime>,
  pub end_time:    Option<NaiveTime>,
  pub rating:      Rating,
  pub members:     MemberSet,
  pub sv_members:  MemberSet,
  pub count_area:  String,
  pub record_memo: String,
}

impl NewVisit {
  /// Convenience constructor with every optional field empty.
  pub fn new(store_name: impl Into<String>, visit_date: Option<NaiveDate>) -> Self {
    Self {
      store_name: store_name.into(),
      visit_date,
      start_time: None,
      end_time: None,
      rating: Rating::UNRATED,
      members: MemberSet::default(),
      sv_members: MemberSet::default(),
      count_area: String::new(),
      record_memo: String::new(),
    }
  }

  /// Everyone on the visit, supervisors included.
  pub fn everyone(&self) -> MemberSet { self.members.union(&self.sv_members) }

  pub(crate) fn into_row(self, id: VisitId) -> Row {
    let mut row = blank_row(TableName::Visits);
    row.insert("id".into(), id.to_string());
    row.insert("store_name".into(), self.store_name);
    VisitPatch {
      visit_date:  Some(self.visit_date),
      start_time:  Some(self.start_time),
      end_time:    Some(self.end_time),
      rating:      Some(self.rating),
      members:     Some(self.members),
      sv_members:  Some(self.sv_members),
      count_area:  Some(self.count_area),
      record_memo: Some(self.record_memo),
    }
    .apply(&mut row);
    row
  }
}

/// A partial update to a visit. `None` leaves the field untouched; for the
/// nullable fields `Some(None)` clears the cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitPatch {
  pub visit_date:  Option<Option<NaiveDate>>,
  pub start_time:  Option<Option<NaiveTime>>,
  pub end_time:    Option<Option<NaiveTime>>,
  pub rating:      Option<Rating>,
  pub members:     Option<MemberSet>,
  pub sv_members:  Option<MemberSet>,
  pub count_area:  Option<String>,
  pub record_memo: Option<String>,
}

impl VisitPatch {
  pub fn is_empty(&self) -> bool { *self == Self::default() }

  /// Overwrite the named cells of `row`; every other cell is left as-is.
  pub fn apply(&self, row: &mut Row) {
    let mut set = |column: &str, value: String| {
      row.insert(column.to_owned(), value);
    };
    if let Some(d) = self.visit_date {
      set("visit_date", encode_date(d));
    }
    if let Some(t) = self.start_time {
      set("start_time", encode_time(t));
    }
    if let Some(t) = self.end_time {
      set("end_time", encode_time(t));
    }
    if let Some(r) = self.rating {
      set("rating", r.value().to_string());
    }
    if let Some(m) = &self.members {
      set("members", m.to_cell());
    }
    if let Some(m) = &self.sv_members {
      set("sv_members", m.to_cell());
    }
    if let Some(a) = &self.count_area {
      set("count_area", a.clone());
    }
    if let Some(m) = &self.record_memo {
      set("record_memo", m.clone());
    }
  }

  /// Names the patch would put on the visit.
  pub fn named_members(&self) -> MemberSet {
    let none = MemberSet::default();
    self
      .members
      .as_ref()
      .unwrap_or(&none)
      .union(self.sv_members.as_ref().unwrap_or(&none))
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A place that can be visited. The name is the key visits refer to; the id
/// is stable across renames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
  /// Absent on rows written before stable ids existed.
  pub store_id:   Option<Uuid>,
  pub store_name: String,
  pub notices:    String,
  pub memo:       String,
}

impl Store {
  pub fn from_row(row: &Row) -> Self {
    Self {
      store_id:   Uuid::parse_str(cell(row, "store_id").trim()).ok(),
      store_name: cell(row, "store_name").to_owned(),
      notices:    cell(row, "notices").to_owned(),
      memo:       cell(row, "memo").to_owned(),
    }
  }

  pub(crate) fn new_row(name: &str, notices: &str, memo: &str) -> Row {
    let mut row = blank_row(TableName::Stores);
    row.insert("store_id".into(), Uuid::new_v4().hyphenated().to_string());
    row.insert("store_name".into(), name.to_owned());
    row.insert("notices".into(), notices.to_owned());
    row.insert("memo".into(), memo.to_owned());
    row
  }
}

// ─── Employee ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
  pub name: String,
}

impl Employee {
  pub fn from_row(row: &Row) -> Self { Self { name: cell(row, "name").trim().to_owned() } }

  pub(crate) fn new_row(name: &str) -> Row {
    let mut row = blank_row(TableName::Employees);
    row.insert("name".into(), name.to_owned());
    row
  }
}
