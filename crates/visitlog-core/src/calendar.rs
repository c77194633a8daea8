//! Month grid computation for the calendar tab.

use std::{collections::HashMap, fmt};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::{holiday::HolidayCalendar, record::Visit};

// ─── Month cursor ────────────────────────────────────────────────────────────

/// A calendar month. `month` is always in `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthCursor {
  pub year:  i32,
  pub month: u32,
}

impl MonthCursor {
  /// `None` if `month` is outside `1..=12`.
  pub fn new(year: i32, month: u32) -> Option<Self> {
    (1..=12).contains(&month).then_some(Self { year, month })
  }

  pub fn from_date(date: NaiveDate) -> Self {
    Self { year: date.year(), month: date.month() }
  }

  /// Move by `months`, carrying into the year: shifting December by one gives
  /// January of the next year, shifting January by minus one gives December
  /// of the previous year.
  pub fn shift(self, months: i32) -> Self {
    let index = self.year * 12 + (self.month as i32 - 1) + months;
    Self {
      year:  index.div_euclid(12),
      month: index.rem_euclid(12) as u32 + 1,
    }
  }

  pub fn next(self) -> Self { self.shift(1) }

  pub fn prev(self) -> Self { self.shift(-1) }

  pub fn first_day(self) -> Option<NaiveDate> { NaiveDate::from_ymd_opt(self.year, self.month, 1) }

  pub fn days_in_month(self) -> u32 { days_in_month(self.year, self.month) }

  pub fn contains(self, date: NaiveDate) -> bool {
    date.year() == self.year && date.month() == self.month
  }
}

impl fmt::Display for MonthCursor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:04}-{:02}", self.year, self.month)
  }
}

/// Number of days in `month` of `year`; 0 for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
  let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
    return 0;
  };
  let next = MonthCursor { year, month }.next();
  NaiveDate::from_ymd_opt(next.year, next.month, 1)
    .map(|n| (n - first).num_days() as u32)
    .unwrap_or(31)
}

// ─── Grid ────────────────────────────────────────────────────────────────────

/// How a day is coloured. Weekend wins over holiday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayKind {
  Weekday,
  Saturday,
  Sunday,
  Holiday,
}

impl DayKind {
  pub fn classify<H: HolidayCalendar + ?Sized>(date: NaiveDate, holidays: &H) -> Self {
    match date.weekday() {
      Weekday::Sun => Self::Sunday,
      Weekday::Sat => Self::Saturday,
      _ if holidays.is_holiday(date) => Self::Holiday,
      _ => Self::Weekday,
    }
  }
}

#[derive(Debug, Clone)]
pub struct CalendarDay {
  pub date:     NaiveDate,
  pub weekday:  Weekday,
  pub kind:     DayKind,
  /// Set whenever the date is a holiday, even if it falls on a weekend.
  pub holiday:  Option<&'static str>,
  pub is_today: bool,
  pub visits:   Vec<Visit>,
}

impl CalendarDay {
  pub fn day(&self) -> u32 { self.date.day() }
}

#[derive(Debug, Clone)]
pub struct MonthGrid {
  pub cursor: MonthCursor,
  pub days:   Vec<CalendarDay>,
}

impl MonthGrid {
  pub fn day(&self, day: u32) -> Option<&CalendarDay> {
    self.days.get(usize::try_from(day).ok()?.checked_sub(1)?)
  }
}

/// Lay out `cursor`'s month, attaching each visit to the day it falls on.
/// Visits outside the month or without a date are ignored.
pub fn month_grid<H: HolidayCalendar + ?Sized>(
  cursor: MonthCursor,
  visits: &[Visit],
  holidays: &H,
  today: NaiveDate,
) -> MonthGrid {
  let mut by_date: HashMap<NaiveDate, Vec<Visit>> = HashMap::new();
  for visit in visits {
    if let Some(date) = visit.visit_date
      && cursor.contains(date)
    {
      by_date.entry(date).or_default().push(visit.clone());
    }
  }

  let days = (1..=cursor.days_in_month())
    .filter_map(|d| NaiveDate::from_ymd_opt(cursor.year, cursor.month, d))
    .map(|date| CalendarDay {
      date,
      weekday: date.weekday(),
      kind: DayKind::classify(date, holidays),
      holiday: holidays.holiday_name(date),
      is_today: date == today,
      visits: by_date.remove(&date).unwrap_or_default(),
    })
    .collect();

  MonthGrid { cursor, days }
}
