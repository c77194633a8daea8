//! Public-holiday calendars used to colour the month view.

use chrono::{Datelike, NaiveDate, Weekday};

/// Looks up whether a date is a public holiday.
pub trait HolidayCalendar {
  /// The holiday's name, or `None` on ordinary days.
  fn holiday_name(&self, date: NaiveDate) -> Option<&'static str>;

  fn is_holiday(&self, date: NaiveDate) -> bool { self.holiday_name(date).is_some() }
}

/// A calendar with no holidays at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHolidays;

impl HolidayCalendar for NoHolidays {
  fn holiday_name(&self, _date: NaiveDate) -> Option<&'static str> { None }
}

/// National holidays of Japan.
///
/// Covers the rules in force from 1980 through 2099: fixed-date holidays, the
/// Happy Monday moves, the equinoxes (astronomical approximation valid for
/// 1980–2099), the 2019 accession days, the 2020/2021 Olympic moves,
/// substitute holidays, and citizens' holidays. Equinoxes outside that range
/// are not reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct JapaneseHolidays;

impl HolidayCalendar for JapaneseHolidays {
  fn holiday_name(&self, date: NaiveDate) -> Option<&'static str> {
    named_holiday(date).or_else(|| {
      if is_substitute_holiday(date) {
        Some("Substitute Holiday")
      } else if is_citizens_holiday(date) {
        Some("Citizens' Holiday")
      } else {
        None
      }
    })
  }
}

fn nth_monday(year: i32, month: u32, n: u8) -> Option<u32> {
  NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Mon, n).map(|d| d.day())
}

fn equinox_day(year: i32, base: f64) -> Option<u32> {
  if !(1980..=2099).contains(&year) {
    return None;
  }
  let y = f64::from(year - 1980);
  Some((base + 0.242194 * y - (y / 4.0).floor()).floor() as u32)
}

fn vernal_equinox(year: i32) -> Option<u32> { equinox_day(year, 20.8431) }

fn autumnal_equinox(year: i32) -> Option<u32> { equinox_day(year, 23.2488) }

/// Holidays defined directly by law, before substitute and citizens' rules.
fn named_holiday(date: NaiveDate) -> Option<&'static str> {
  let (y, m, d) = (date.year(), date.month(), date.day());
  let is = |day: Option<u32>| day == Some(d);

  match m {
    1 if d == 1 => Some("New Year's Day"),
    1 if (y >= 2000 && is(nth_monday(y, 1, 2))) || (y < 2000 && d == 15) => {
      Some("Coming of Age Day")
    }
    2 if d == 11 && y >= 1967 => Some("National Foundation Day"),
    2 if d == 23 && y >= 2020 => Some("Emperor's Birthday"),
    2 if y == 1989 && d == 24 => Some("State Funeral of Emperor Showa"),
    3 if is(vernal_equinox(y)) => Some("Vernal Equinox Day"),
    4 if d == 29 => Some(match y {
      ..=1988 => "Emperor's Birthday",
      1989..=2006 => "Greenery Day",
      _ => "Showa Day",
    }),
    5 if y == 2019 && d == 1 => Some("Enthronement Day"),
    5 if d == 3 => Some("Constitution Memorial Day"),
    5 if d == 4 && y >= 2007 => Some("Greenery Day"),
    5 if d == 5 => Some("Children's Day"),
    6 if y == 1993 && d == 9 => Some("Wedding of Crown Prince Naruhito"),
    7 if is(marine_day(y)) => Some("Marine Day"),
    7 if (y == 2020 && d == 24) || (y == 2021 && d == 23) => Some("Sports Day"),
    8 if is(mountain_day(y)) => Some("Mountain Day"),
    9 if (y < 2003 && d == 15) || (y >= 2003 && is(nth_monday(y, 9, 3))) => {
      Some("Respect for the Aged Day")
    }
    9 if is(autumnal_equinox(y)) => Some("Autumnal Equinox Day"),
    10 if (y < 2000 && d == 10) || ((2000..=2019).contains(&y) && is(nth_monday(y, 10, 2))) => {
      Some("Health and Sports Day")
    }
    10 if y >= 2022 && is(nth_monday(y, 10, 2)) => Some("Sports Day"),
    10 if y == 2019 && d == 22 => Some("Enthronement Ceremony Day"),
    11 if d == 3 => Some("Culture Day"),
    11 if d == 23 => Some("Labour Thanksgiving Day"),
    11 if y == 1990 && d == 12 => Some("Enthronement Ceremony Day"),
    12 if d == 23 && (1989..=2018).contains(&y) => Some("Emperor's Birthday"),
    _ => None,
  }
}

fn marine_day(year: i32) -> Option<u32> {
  match year {
    ..=1995 => None,
    1996..=2002 => Some(20),
    2020 => Some(23),
    2021 => Some(22),
    _ => nth_monday(year, 7, 3),
  }
}

fn mountain_day(year: i32) -> Option<u32> {
  match year {
    ..=2015 => None,
    2020 => Some(10),
    2021 => Some(8),
    _ => Some(11),
  }
}

/// A day off granted because a holiday fell on a Sunday.
///
/// Since 2007 it is the first following day that is not itself a holiday;
/// before that it was only ever the Monday right after.
fn is_substitute_holiday(date: NaiveDate) -> bool {
  let Some(start) = NaiveDate::from_ymd_opt(1973, 4, 12) else {
    return false;
  };
  if date < start || named_holiday(date).is_some() {
    return false;
  }

  if date.year() < 2007 {
    return date.weekday() == Weekday::Mon
      && date.pred_opt().is_some_and(|p| named_holiday(p).is_some());
  }

  let mut prev = date.pred_opt();
  while let Some(p) = prev {
    if named_holiday(p).is_none() {
      break;
    }
    if p.weekday() == Weekday::Sun {
      return true;
    }
    prev = p.pred_opt();
  }
  false
}

/// An ordinary weekday sandwiched between two holidays.
fn is_citizens_holiday(date: NaiveDate) -> bool {
  date.year() >= 1988
    && date.weekday() != Weekday::Sun
    && named_holiday(date).is_none()
    && date.pred_opt().is_some_and(|p| named_holiday(p).is_some())
    && date.succ_opt().is_some_and(|n| named_holiday(n).is_some())
}
