//! Which screen the user is looking at, and how actions move between screens.
//!
//! Each tab keeps its own view state, so switching tabs and back returns to
//! where the user left off. [`Navigation::screen`] is the one place that
//! decides what gets rendered.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{calendar::MonthCursor, record::VisitId};

// ─── Tabs ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tab {
  Calendar,
  Search,
  Register,
}

impl Tab {
  pub const ALL: [Tab; 3] = [Tab::Calendar, Tab::Search, Tab::Register];

  pub fn title(self) -> &'static str {
    match self {
      Tab::Calendar => "Calendar",
      Tab::Search => "Stores",
      Tab::Register => "Register",
    }
  }

  pub fn index(self) -> usize {
    match self {
      Tab::Calendar => 0,
      Tab::Search => 1,
      Tab::Register => 2,
    }
  }

  pub fn next(self) -> Self { Self::ALL[(self.index() + 1) % Self::ALL.len()] }

  pub fn prev(self) -> Self { Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()] }
}

impl fmt::Display for Tab {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.title()) }
}

// ─── Per-tab views ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalendarView {
  #[default]
  Month,
  Day(NaiveDate),
  Store {
    date:    NaiveDate,
    store:   String,
    editing: Option<VisitId>,
  },
  AddVisit {
    date:  NaiveDate,
    store: String,
  },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchView {
  #[default]
  List,
  Store {
    store:   String,
    editing: Option<VisitId>,
  },
  AddVisit {
    store: String,
  },
}

/// The screen to render, flattened across tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen<'a> {
  Month(MonthCursor),
  Day(NaiveDate),
  StoreDetail {
    store:   &'a str,
    editing: Option<VisitId>,
  },
  /// `date` is the day the new visit defaults to; `None` means today.
  AddVisit {
    store: &'a str,
    date:  Option<NaiveDate>,
  },
  StoreList,
  Register,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavAction {
  SelectTab(Tab),
  PrevMonth,
  NextMonth,
  OpenDay(NaiveDate),
  OpenStore(String),
  EditVisit(VisitId),
  CloseEdit,
  AddVisit,
  Back,
  /// A new store was registered; show it.
  StoreRegistered(String),
  /// Registration hit an existing store; show that one instead.
  ShowExisting(String),
  /// A store was renamed; views showing it follow the new name.
  StoreRenamed { from: String, to: String },
}

// ─── State machine ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
  tab:      Tab,
  cursor:   MonthCursor,
  calendar: CalendarView,
  search:   SearchView,
}

impl Navigation {
  /// Start on the calendar tab, showing the month containing `today`.
  pub fn new(today: NaiveDate) -> Self {
    Self {
      tab:      Tab::Calendar,
      cursor:   MonthCursor::from_date(today),
      calendar: CalendarView::Month,
      search:   SearchView::List,
    }
  }

  pub fn tab(&self) -> Tab { self.tab }

  pub fn cursor(&self) -> MonthCursor { self.cursor }

  pub fn calendar_view(&self) -> &CalendarView { &self.calendar }

  pub fn search_view(&self) -> &SearchView { &self.search }

  /// Apply `action`. Returns `false` if it does not apply to the current
  /// screen, in which case nothing changes.
  pub fn apply(&mut self, action: NavAction) -> bool {
    match action {
      NavAction::SelectTab(tab) => {
        self.tab = tab;
        true
      }
      NavAction::StoreRegistered(store) | NavAction::ShowExisting(store) => {
        if self.tab != Tab::Register {
          return false;
        }
        self.tab = Tab::Search;
        self.search = SearchView::Store { store, editing: None };
        true
      }
      NavAction::StoreRenamed { from, to } => self.rename(&from, &to),
      action => match self.tab {
        Tab::Calendar => self.apply_calendar(action),
        Tab::Search => self.apply_search(action),
        Tab::Register => false,
      },
    }
  }

  fn apply_calendar(&mut self, action: NavAction) -> bool {
    let next = match (&self.calendar, action) {
      (CalendarView::Month, NavAction::PrevMonth) => {
        self.cursor = self.cursor.prev();
        return true;
      }
      (CalendarView::Month, NavAction::NextMonth) => {
        self.cursor = self.cursor.next();
        return true;
      }
      (CalendarView::Month, NavAction::OpenDay(date)) => {
        self.cursor = MonthCursor::from_date(date);
        CalendarView::Day(date)
      }
      (CalendarView::Day(_), NavAction::Back) => CalendarView::Month,
      (CalendarView::Day(date), NavAction::OpenStore(store)) => {
        CalendarView::Store { date: *date, store, editing: None }
      }
      (CalendarView::Store { date, .. }, NavAction::Back) => CalendarView::Day(*date),
      (CalendarView::Store { date, store, .. }, NavAction::EditVisit(id)) => {
        CalendarView::Store { date: *date, store: store.clone(), editing: Some(id) }
      }
      (CalendarView::Store { date, store, editing: Some(_) }, NavAction::CloseEdit) => {
        CalendarView::Store { date: *date, store: store.clone(), editing: None }
      }
      (CalendarView::Store { date, store, .. }, NavAction::AddVisit) => {
        CalendarView::AddVisit { date: *date, store: store.clone() }
      }
      (CalendarView::AddVisit { date, store }, NavAction::Back) => {
        CalendarView::Store { date: *date, store: store.clone(), editing: None }
      }
      _ => return false,
    };
    self.calendar = next;
    true
  }

  fn apply_search(&mut self, action: NavAction) -> bool {
    let next = match (&self.search, action) {
      (SearchView::List, NavAction::OpenStore(store)) => SearchView::Store { store, editing: None },
      (SearchView::Store { .. }, NavAction::Back) => SearchView::List,
      (SearchView::Store { store, .. }, NavAction::EditVisit(id)) => {
        SearchView::Store { store: store.clone(), editing: Some(id) }
      }
      (SearchView::Store { store, editing: Some(_) }, NavAction::CloseEdit) => {
        SearchView::Store { store: store.clone(), editing: None }
      }
      (SearchView::Store { store, .. }, NavAction::AddVisit) => {
        SearchView::AddVisit { store: store.clone() }
      }
      (SearchView::AddVisit { store }, NavAction::Back) => {
        SearchView::Store { store: store.clone(), editing: None }
      }
      _ => return false,
    };
    self.search = next;
    true
  }

  fn rename(&mut self, from: &str, to: &str) -> bool {
    let mut changed = false;
    let mut follow = |store: &mut String| {
      if store == from {
        *store = to.to_owned();
        changed = true;
      }
    };
    match &mut self.calendar {
      CalendarView::Store { store, .. } | CalendarView::AddVisit { store, .. } => follow(store),
      CalendarView::Month | CalendarView::Day(_) => {}
    }
    match &mut self.search {
      SearchView::Store { store, .. } | SearchView::AddVisit { store } => follow(store),
      SearchView::List => {}
    }
    changed
  }

  /// The screen of the active tab.
  pub fn screen(&self) -> Screen<'_> {
    match self.tab {
      Tab::Calendar => match &self.calendar {
        CalendarView::Month => Screen::Month(self.cursor),
        CalendarView::Day(date) => Screen::Day(*date),
        CalendarView::Store { store, editing, .. } => {
          Screen::StoreDetail { store, editing: *editing }
        }
        CalendarView::AddVisit { date, store } => Screen::AddVisit { store, date: Some(*date) },
      },
      Tab::Search => match &self.search {
        SearchView::List => Screen::StoreList,
        SearchView::Store { store, editing } => Screen::StoreDetail { store, editing: *editing },
        SearchView::AddVisit { store } => Screen::AddVisit { store, date: None },
      },
      Tab::Register => Screen::Register,
    }
  }

  /// The store the active screen is about, if any.
  pub fn selected_store(&self) -> Option<&str> {
    match self.screen() {
      Screen::StoreDetail { store, .. } | Screen::AddVisit { store, .. } => Some(store),
      _ => None,
    }
  }

  /// The visit being edited on the active screen, if any.
  pub fn editing(&self) -> Option<VisitId> {
    match self.screen() {
      Screen::StoreDetail { editing, .. } => editing,
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  fn nav() -> Navigation { Navigation::new(date(2024, 3, 15)) }

  #[test]
  fn starts_on_current_month() {
    let nav = nav();
    assert_eq!(nav.tab(), Tab::Calendar);
    assert_eq!(nav.screen(), Screen::Month(MonthCursor::new(2024, 3).unwrap()));
    assert_eq!(nav.selected_store(), None);
  }

  #[test]
  fn month_paging_wraps() {
    let mut nav = Navigation::new(date(2024, 1, 10));
    assert!(nav.apply(NavAction::PrevMonth));
    assert_eq!(nav.cursor(), MonthCursor::new(2023, 12).unwrap());
    assert!(nav.apply(NavAction::NextMonth));
    assert!(nav.apply(NavAction::NextMonth));
    assert_eq!(nav.cursor(), MonthCursor::new(2024, 2).unwrap());
  }

  #[test]
  fn calendar_drill_down_and_back() {
    let mut nav = nav();
    let day = date(2024, 3, 5);

    assert!(nav.apply(NavAction::OpenDay(day)));
    assert_eq!(nav.screen(), Screen::Day(day));
    assert!(!nav.apply(NavAction::NextMonth));

    assert!(nav.apply(NavAction::OpenStore("Ginza".into())));
    assert_eq!(nav.screen(), Screen::StoreDetail { store: "Ginza", editing: None });

    assert!(nav.apply(NavAction::EditVisit(7)));
    assert_eq!(nav.editing(), Some(7));
    assert!(nav.apply(NavAction::CloseEdit));
    assert_eq!(nav.editing(), None);
    assert!(!nav.apply(NavAction::CloseEdit));

    assert!(nav.apply(NavAction::AddVisit));
    assert_eq!(nav.screen(), Screen::AddVisit { store: "Ginza", date: Some(day) });
    assert_eq!(nav.selected_store(), Some("Ginza"));

    assert!(nav.apply(NavAction::Back));
    assert_eq!(nav.screen(), Screen::StoreDetail { store: "Ginza", editing: None });
    assert!(nav.apply(NavAction::Back));
    assert_eq!(nav.screen(), Screen::Day(day));
    assert!(nav.apply(NavAction::Back));
    assert_eq!(nav.screen(), Screen::Month(MonthCursor::new(2024, 3).unwrap()));
    assert!(!nav.apply(NavAction::Back));
  }

  #[test]
  fn back_from_store_clears_edit_state() {
    let mut nav = nav();
    nav.apply(NavAction::OpenDay(date(2024, 3, 5)));
    nav.apply(NavAction::OpenStore("Ginza".into()));
    nav.apply(NavAction::EditVisit(3));
    nav.apply(NavAction::Back);
    nav.apply(NavAction::OpenStore("Ginza".into()));
    assert_eq!(nav.editing(), None);
  }

  #[test]
  fn search_flow() {
    let mut nav = nav();
    nav.apply(NavAction::SelectTab(Tab::Search));
    assert_eq!(nav.screen(), Screen::StoreList);

    assert!(nav.apply(NavAction::OpenStore("Ueno".into())));
    assert!(nav.apply(NavAction::AddVisit));
    assert_eq!(nav.screen(), Screen::AddVisit { store: "Ueno", date: None });
    assert!(nav.apply(NavAction::Back));
    assert!(nav.apply(NavAction::Back));
    assert_eq!(nav.screen(), Screen::StoreList);
  }

  #[test]
  fn tabs_keep_their_own_state() {
    let mut nav = nav();
    nav.apply(NavAction::OpenDay(date(2024, 3, 5)));
    nav.apply(NavAction::OpenStore("Ginza".into()));

    nav.apply(NavAction::SelectTab(Tab::Search));
    nav.apply(NavAction::OpenStore("Ueno".into()));
    assert_eq!(nav.selected_store(), Some("Ueno"));

    nav.apply(NavAction::SelectTab(Tab::Calendar));
    assert_eq!(nav.selected_store(), Some("Ginza"));
  }

  #[test]
  fn registration_jumps_to_search_detail() {
    let mut nav = nav();
    assert!(!nav.apply(NavAction::StoreRegistered("Ikebukuro".into())));

    nav.apply(NavAction::SelectTab(Tab::Register));
    assert_eq!(nav.screen(), Screen::Register);
    assert!(!nav.apply(NavAction::Back));

    assert!(nav.apply(NavAction::StoreRegistered("Ikebukuro".into())));
    assert_eq!(nav.tab(), Tab::Search);
    assert_eq!(nav.screen(), Screen::StoreDetail { store: "Ikebukuro", editing: None });

    nav.apply(NavAction::SelectTab(Tab::Register));
    assert!(nav.apply(NavAction::ShowExisting("Ginza".into())));
    assert_eq!(nav.selected_store(), Some("Ginza"));
  }

  #[test]
  fn rename_follows_open_views() {
    let mut nav = nav();
    nav.apply(NavAction::OpenDay(date(2024, 3, 5)));
    nav.apply(NavAction::OpenStore("Ginza".into()));
    nav.apply(NavAction::SelectTab(Tab::Search));
    nav.apply(NavAction::OpenStore("Ginza".into()));

    assert!(nav.apply(NavAction::StoreRenamed { from: "Ginza".into(), to: "Ginza 2".into() }));
    assert_eq!(nav.selected_store(), Some("Ginza 2"));
    nav.apply(NavAction::SelectTab(Tab::Calendar));
    assert_eq!(nav.selected_store(), Some("Ginza 2"));

    assert!(!nav.apply(NavAction::StoreRenamed { from: "Ueno".into(), to: "X".into() }));
  }

  #[test]
  fn tab_cycling() {
    assert_eq!(Tab::Calendar.next(), Tab::Search);
    assert_eq!(Tab::Register.next(), Tab::Calendar);
    assert_eq!(Tab::Calendar.prev(), Tab::Register);
  }
}
