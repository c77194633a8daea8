//! Application state and key dispatch.
//!
//! Which screen is showing lives in [`Navigation`]; `App` holds the data the
//! screens draw from plus the cursors and forms the keys act on. Every key
//! either moves a cursor, edits a form, applies a [`NavAction`], or calls the
//! [`Repository`], after which the data is refreshed.

use chrono::{Datelike, Duration, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use visitlog_core::{
  Error as CoreError,
  cache::ReadStatus,
  calendar::{MonthCursor, MonthGrid, days_in_month, month_grid},
  holiday::JapaneseHolidays,
  navigation::{NavAction, Navigation, Screen, Tab},
  record::{Store, Visit, VisitId},
  repository::{Repository, StoreDetail},
  search::{SearchScopes, search_stores},
  table::TableStore,
};

use crate::form::{FormError, StoreForm, VisitForm};

// ─── App ─────────────────────────────────────────────────────────────────────

pub struct App<S> {
  pub nav:      Navigation,
  pub repo:     Repository<S>,
  /// Where the tables live, for the header.
  pub backend:  String,
  pub today:    NaiveDate,
  pub holidays: JapaneseHolidays,

  // Data as of the last refresh.
  pub visits:     Vec<Visit>,
  pub stores:     Vec<Store>,
  pub employees:  Vec<String>,
  /// `"<table>: <reason>"` for every table that could not be read.
  pub offline:    Vec<String>,
  pub detail:     Option<StoreDetail>,
  pub day_visits: Vec<Visit>,

  // Cursors.
  pub day_cursor:      NaiveDate,
  pub day_list_cursor: usize,
  pub visit_cursor:    usize,
  pub list_cursor:     usize,

  // Store search.
  pub query:        String,
  pub query_active: bool,
  pub scopes:       SearchScopes,

  // Forms.
  pub visit_form: Option<VisitForm>,
  pub store_form: Option<StoreForm>,
  pub register:   StoreForm,

  /// Registration hit this existing store; Enter again opens it.
  pub pending_existing: Option<String>,
  /// `d` was pressed once on this visit.
  pub pending_delete:   Option<VisitId>,

  pub status_msg: String,
}

impl<S: TableStore> App<S> {
  pub fn new(repo: Repository<S>, backend: String, today: NaiveDate) -> Self {
    Self {
      nav: Navigation::new(today),
      repo,
      backend,
      today,
      holidays: JapaneseHolidays,
      visits: Vec::new(),
      stores: Vec::new(),
      employees: Vec::new(),
      offline: Vec::new(),
      detail: None,
      day_visits: Vec::new(),
      day_cursor: today,
      day_list_cursor: 0,
      visit_cursor: 0,
      list_cursor: 0,
      query: String::new(),
      query_active: false,
      scopes: SearchScopes::default(),
      visit_form: None,
      store_form: None,
      register: StoreForm::default(),
      pending_existing: None,
      pending_delete: None,
      status_msg: String::new(),
    }
  }

  // ── Data ──────────────────────────────────────────────────────────────────

  /// Re-read everything the current screen shows. Reads go through the
  /// cache, so this is cheap within the cache window.
  pub async fn refresh(&mut self) {
    let visits = self.repo.visits().await;
    let stores = self.repo.stores().await;
    let employees = self.repo.employees().await;

    self.offline = [
      ("visits", &visits.status),
      ("stores", &stores.status),
      ("employees", &employees.status),
    ]
    .into_iter()
    .filter_map(|(table, status)| match status {
      ReadStatus::Unavailable { reason } => Some(format!("{table}: {reason}")),
      _ => None,
    })
    .collect();

    self.visits = visits.items;
    self.stores = stores.items;
    self.employees = employees.items;

    let selected = self.nav.selected_store().map(str::to_owned);
    self.detail = match selected {
      Some(name) => Some(self.repo.store_detail(&name).await),
      None => None,
    };
    self.day_visits = match self.nav.screen() {
      Screen::Day(date) => self.repo.visits_on(date).await,
      _ => Vec::new(),
    };

    self.clamp_cursors();
  }

  /// Drop the cache and re-read.
  pub async fn reload(&mut self) {
    self.repo.cache().invalidate_all();
    self.refresh().await;
  }

  fn clamp_cursors(&mut self) {
    let clamp = |cursor: &mut usize, len: usize| *cursor = (*cursor).min(len.saturating_sub(1));
    clamp(&mut self.day_list_cursor, self.day_visits.len());
    clamp(&mut self.visit_cursor, self.detail.as_ref().map_or(0, |d| d.visits.len()));
    let results = self.search_results().len();
    clamp(&mut self.list_cursor, results);
  }

  pub fn month_grid(&self) -> MonthGrid {
    month_grid(self.nav.cursor(), &self.visits, &self.holidays, self.today)
  }

  pub fn search_results(&self) -> Vec<String> {
    search_stores(&self.query, self.scopes, &self.stores, &self.visits)
  }

  pub fn selected_visit(&self) -> Option<&Visit> {
    self.detail.as_ref()?.visits.get(self.visit_cursor)
  }

  /// Whether keystrokes are going into a text field.
  pub fn is_typing(&self) -> bool {
    self.query_active
      || self.visit_form.is_some()
      || self.store_form.is_some()
      || self.nav.tab() == Tab::Register
  }

  /// Report a failed repository call on the status bar.
  fn report(&mut self, err: CoreError) {
    if let CoreError::Conflict(table) = &err {
      tracing::warn!(%table, "write conflict, reloading");
      self.repo.cache().invalidate_all();
    } else {
      tracing::error!(error = %err, "repository call failed");
    }
    self.status_msg = format!("Error: {err}");
  }

  async fn navigate(&mut self, action: NavAction) {
    if self.nav.apply(action) {
      self.pending_delete = None;
      self.refresh().await;
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }
    if key.code != KeyCode::Char('d') {
      self.pending_delete = None;
    }

    if self.query_active {
      self.handle_query_key(key);
      return Ok(true);
    }
    if self.visit_form.is_some() {
      self.handle_visit_form_key(key).await;
      return Ok(true);
    }
    if self.store_form.is_some() {
      self.handle_store_form_key(key).await;
      return Ok(true);
    }

    // Tab switching.
    let target = match key.code {
      KeyCode::F(n @ 1..=3) => Tab::ALL.get(usize::from(n) - 1).copied(),
      KeyCode::Tab if !self.is_typing() => Some(self.nav.tab().next()),
      KeyCode::BackTab if !self.is_typing() => Some(self.nav.tab().prev()),
      _ => None,
    };
    if let Some(tab) = target {
      self.status_msg.clear();
      self.navigate(NavAction::SelectTab(tab)).await;
      return Ok(true);
    }

    if !self.is_typing() {
      match key.code {
        KeyCode::Char('q') => return Ok(false),
        KeyCode::Char('r') => {
          self.reload().await;
          self.status_msg = "Reloaded".into();
          return Ok(true);
        }
        _ => {}
      }
    }

    match self.nav.screen() {
      Screen::Month(_) => self.handle_month_key(key).await,
      Screen::Day(_) => self.handle_day_key(key).await,
      Screen::StoreDetail { .. } => self.handle_detail_key(key).await,
      Screen::StoreList => self.handle_list_key(key).await,
      Screen::Register => self.handle_register_key(key).await,
      // The visit form is always open on this screen; nothing to do.
      Screen::AddVisit { .. } => {}
    }
    Ok(true)
  }

  // ── Calendar ──────────────────────────────────────────────────────────────

  async fn handle_month_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Left | KeyCode::Char('h') => self.move_day(-1).await,
      KeyCode::Right | KeyCode::Char('l') => self.move_day(1).await,
      KeyCode::Up | KeyCode::Char('k') => self.move_day(-7).await,
      KeyCode::Down | KeyCode::Char('j') => self.move_day(7).await,
      KeyCode::PageUp | KeyCode::Char('p') => self.shift_month(NavAction::PrevMonth),
      KeyCode::PageDown | KeyCode::Char('n') => self.shift_month(NavAction::NextMonth),
      KeyCode::Char('t') => {
        self.day_cursor = self.today;
        self.follow_day_cursor();
      }
      KeyCode::Enter => {
        self.day_list_cursor = 0;
        self.navigate(NavAction::OpenDay(self.day_cursor)).await;
      }
      _ => {}
    }
  }

  async fn move_day(&mut self, days: i64) {
    if let Some(date) = self.day_cursor.checked_add_signed(Duration::days(days)) {
      self.day_cursor = date;
      self.follow_day_cursor();
    }
  }

  /// Keep the month cursor on the month containing the selected day.
  fn follow_day_cursor(&mut self) {
    let target = MonthCursor::from_date(self.day_cursor);
    while self.nav.cursor() < target && self.nav.apply(NavAction::NextMonth) {}
    while self.nav.cursor() > target && self.nav.apply(NavAction::PrevMonth) {}
  }

  /// Change month, keeping the day of month where possible.
  fn shift_month(&mut self, action: NavAction) {
    if !self.nav.apply(action) {
      return;
    }
    let cursor = self.nav.cursor();
    let day = self.day_cursor.day().min(days_in_month(cursor.year, cursor.month));
    if let Some(date) = NaiveDate::from_ymd_opt(cursor.year, cursor.month, day) {
      self.day_cursor = date;
    }
  }

  async fn handle_day_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Up | KeyCode::Char('k') => {
        self.day_list_cursor = self.day_list_cursor.saturating_sub(1);
      }
      KeyCode::Down | KeyCode::Char('j') => {
        if self.day_list_cursor + 1 < self.day_visits.len() {
          self.day_list_cursor += 1;
        }
      }
      KeyCode::Enter | KeyCode::Char('l') => {
        if let Some(store) = self.day_visits.get(self.day_list_cursor).map(|v| v.store_name.clone())
        {
          self.visit_cursor = 0;
          self.navigate(NavAction::OpenStore(store)).await;
        }
      }
      KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') => {
        self.navigate(NavAction::Back).await;
      }
      _ => {}
    }
  }

  // ── Store detail ──────────────────────────────────────────────────────────

  async fn handle_detail_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Up | KeyCode::Char('k') => {
        self.visit_cursor = self.visit_cursor.saturating_sub(1);
      }
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.detail.as_ref().map_or(0, |d| d.visits.len());
        if self.visit_cursor + 1 < len {
          self.visit_cursor += 1;
        }
      }
      KeyCode::Enter | KeyCode::Char('e') => {
        if let Some(visit) = self.selected_visit() {
          let (id, form) = (visit.id, VisitForm::from_visit(visit));
          if self.nav.apply(NavAction::EditVisit(id)) {
            self.visit_form = Some(form);
          }
        }
      }
      KeyCode::Char('a') => {
        if self.nav.apply(NavAction::AddVisit) {
          let date = match self.nav.screen() {
            Screen::AddVisit { date: Some(d), .. } => d,
            _ => self.today,
          };
          self.visit_form = Some(VisitForm::blank(date));
        }
      }
      KeyCode::Char('d') => self.delete_selected().await,
      KeyCode::Char('i') => {
        if let Some(detail) = &self.detail {
          self.store_form = Some(StoreForm::for_store(&detail.store_name, detail.store.as_ref()));
        }
      }
      KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') => {
        self.navigate(NavAction::Back).await;
      }
      _ => {}
    }
  }

  async fn delete_selected(&mut self) {
    let Some(id) = self.selected_visit().map(|v| v.id) else {
      return;
    };
    if self.pending_delete != Some(id) {
      self.pending_delete = Some(id);
      self.status_msg = format!("Press d again to delete visit #{id}");
      return;
    }
    self.pending_delete = None;
    match self.repo.delete_visit(id).await {
      Ok(removed) => {
        self.status_msg = format!("Deleted {removed} visit(s)");
        self.refresh().await;
      }
      Err(e) => self.report(e),
    }
  }

  // ── Visit form ────────────────────────────────────────────────────────────

  async fn handle_visit_form_key(&mut self, key: KeyEvent) {
    let Some(form) = self.visit_form.as_mut() else {
      return;
    };
    match key.code {
      KeyCode::Tab | KeyCode::Down => form.focus_next(),
      KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
      KeyCode::Backspace => form.backspace(),
      KeyCode::Right => {
        if let Some(name) = form.suggestions(&self.employees).first().map(|s| (*s).to_owned()) {
          form.complete(&name);
        }
      }
      KeyCode::Char(c) => form.input(c),
      KeyCode::Esc => self.close_visit_form().await,
      KeyCode::Enter => self.save_visit_form().await,
      _ => {}
    }
  }

  async fn close_visit_form(&mut self) {
    self.visit_form = None;
    let action = if self.nav.editing().is_some() {
      NavAction::CloseEdit
    } else {
      NavAction::Back
    };
    self.navigate(action).await;
  }

  async fn save_visit_form(&mut self) {
    let Some(form) = self.visit_form.clone() else {
      return;
    };
    let adding = match self.nav.screen() {
      Screen::AddVisit { store, .. } => Some(store.to_owned()),
      _ => None,
    };
    let saved = match (adding, self.nav.editing()) {
      (Some(store), _) => match form.to_new_visit(&store) {
        Ok(new) => self.repo.record_visit(new).await.map(|v| format!("Added visit #{}", v.id)),
        Err(e) => return self.form_error(e),
      },
      (None, Some(id)) => {
        let original = self
          .detail
          .as_ref()
          .and_then(|d| d.visits.iter().find(|v| v.id == id))
          .cloned();
        let Some(original) = original else {
          self.status_msg = format!("Visit #{id} no longer exists");
          return;
        };
        match form.to_patch(&original) {
          Ok(patch) => self.repo.revise_visit(id, &patch).await.map(|found| {
            if found {
              format!("Saved visit #{id}")
            } else {
              format!("Visit #{id} not found")
            }
          }),
          Err(e) => return self.form_error(e),
        }
      }
      (None, None) => return,
    };

    match saved {
      Ok(msg) => {
        self.status_msg = msg;
        self.close_visit_form().await;
      }
      Err(e) => self.report(e),
    }
  }

  fn form_error(&mut self, err: FormError) { self.status_msg = format!("Invalid input: {err}"); }

  // ── Store info form ───────────────────────────────────────────────────────

  async fn handle_store_form_key(&mut self, key: KeyEvent) {
    let Some(form) = self.store_form.as_mut() else {
      return;
    };
    match key.code {
      KeyCode::Tab | KeyCode::Down => form.focus_next(),
      KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
      KeyCode::Backspace => form.backspace(),
      KeyCode::Char(c) => form.input(c),
      KeyCode::Esc => self.store_form = None,
      KeyCode::Enter => self.save_store_form().await,
      _ => {}
    }
  }

  async fn save_store_form(&mut self) {
    let (Some(form), Some(current)) = (
      self.store_form.clone(),
      self.detail.as_ref().map(|d| d.store_name.clone()),
    ) else {
      return;
    };
    let name = form.name.trim().to_owned();

    let mut msg = "Store saved".to_owned();
    if name != current {
      match self.repo.rename_store(&current, &name).await {
        Ok(relinked) => {
          self.nav.apply(NavAction::StoreRenamed { from: current, to: name.clone() });
          msg = format!("Renamed to {name}; {relinked} visit(s) relinked");
        }
        Err(e) => return self.report(e),
      }
    }

    match self.repo.update_store(&name, &form.notices, &form.memo).await {
      Ok(_) => {
        self.status_msg = msg;
        self.store_form = None;
        self.refresh().await;
      }
      Err(e) => self.report(e),
    }
  }

  // ── Store list ────────────────────────────────────────────────────────────

  fn handle_query_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.query_active = false;
        self.query.clear();
      }
      KeyCode::Enter => self.query_active = false,
      KeyCode::Backspace => {
        self.query.pop();
      }
      KeyCode::Char(c) => self.query.push(c),
      _ => return,
    }
    self.list_cursor = 0;
  }

  async fn handle_list_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('/') => {
        self.query_active = true;
        self.list_cursor = 0;
      }
      KeyCode::Char('1') => self.scopes.store_name = !self.scopes.store_name,
      KeyCode::Char('2') => self.scopes.members = !self.scopes.members,
      KeyCode::Char('3') => self.scopes.notes = !self.scopes.notes,
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }
      KeyCode::Down | KeyCode::Char('j') => {
        if self.list_cursor + 1 < self.search_results().len() {
          self.list_cursor += 1;
        }
      }
      KeyCode::Esc => {
        self.query.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter | KeyCode::Char('l') => {
        if let Some(store) = self.search_results().into_iter().nth(self.list_cursor) {
          self.visit_cursor = 0;
          self.navigate(NavAction::OpenStore(store)).await;
        }
      }
      _ => {}
    }
    self.clamp_cursors();
  }

  // ── Register ──────────────────────────────────────────────────────────────

  async fn handle_register_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Tab | KeyCode::Down => self.register.focus_next(),
      KeyCode::BackTab | KeyCode::Up => self.register.focus_prev(),
      KeyCode::Backspace => {
        self.register.backspace();
        self.pending_existing = None;
      }
      KeyCode::Char(c) => {
        self.register.input(c);
        self.pending_existing = None;
      }
      KeyCode::Esc => {
        self.register = StoreForm::default();
        self.pending_existing = None;
      }
      KeyCode::Enter => self.submit_registration().await,
      _ => {}
    }
  }

  async fn submit_registration(&mut self) {
    if let Some(existing) = self.pending_existing.take() {
      self.register = StoreForm::default();
      self.visit_cursor = 0;
      self.navigate(NavAction::ShowExisting(existing)).await;
      return;
    }

    let name = self.register.name.trim().to_owned();
    let form = &self.register;
    match self.repo.register_store(&name, &form.notices, &form.memo).await {
      Ok(true) => {
        self.status_msg = format!("Registered {name}");
        self.register = StoreForm::default();
        self.visit_cursor = 0;
        self.navigate(NavAction::StoreRegistered(name)).await;
      }
      Ok(false) => {
        self.status_msg = format!("{name} is already registered; press Enter to open it");
        self.pending_existing = Some(name);
      }
      Err(CoreError::EmptyStoreName) => self.status_msg = "Enter a store name".into(),
      Err(e) => self.report(e),
    }
  }
}

#[cfg(test)]
mod tests {
  use visitlog_core::{
    memory::MemoryTableStore,
    record::NewVisit,
    table::{Row, TableName},
  };

  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  fn key(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

  async fn press(app: &mut App<MemoryTableStore>, codes: &[KeyCode]) -> bool {
    let mut cont = true;
    for code in codes {
      cont = app.handle_key(key(*code)).await.unwrap();
    }
    cont
  }

  async fn type_text(app: &mut App<MemoryTableStore>, text: &str) {
    for c in text.chars() {
      app.handle_key(key(KeyCode::Char(c))).await.unwrap();
    }
  }

  /// Two visits to Ginza on 2024-03-05 and 03-12, one to Ueno on 03-05;
  /// today is 2024-03-05.
  async fn setup() -> (App<MemoryTableStore>, MemoryTableStore) {
    let store = MemoryTableStore::new();
    let repo = Repository::new(store.clone());
    for (name, day, members) in
      [("Ginza", 5, "Sato"), ("Ueno", 5, "Ito"), ("Ginza", 12, "Smith")]
    {
      let mut new = NewVisit::new(name, Some(date(2024, 3, day)));
      new.members = visitlog_core::record::MemberSet::parse(members);
      repo.record_visit(new).await.unwrap();
    }
    repo.register_store("Ginza", "", "").await.unwrap();
    repo.register_store("Ueno", "", "").await.unwrap();

    let mut app = App::new(repo, "memory".into(), date(2024, 3, 5));
    app.refresh().await;
    (app, store)
  }

  #[tokio::test]
  async fn starts_on_month_with_data_loaded() {
    let (app, _) = setup().await;
    assert_eq!(app.nav.screen(), Screen::Month(MonthCursor::new(2024, 3).unwrap()));
    assert_eq!(app.visits.len(), 3);
    assert_eq!(app.employees, vec!["Ito", "Sato", "Smith"]);
    assert!(app.offline.is_empty());
    assert_eq!(app.month_grid().day(5).unwrap().visits.len(), 2);
  }

  #[tokio::test]
  async fn quit_keys() {
    let (mut app, _) = setup().await;
    assert!(!press(&mut app, &[KeyCode::Char('q')]).await);

    let (mut app, _) = setup().await;
    let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
    assert!(!app.handle_key(ctrl_c).await.unwrap());
  }

  #[tokio::test]
  async fn day_cursor_carries_month() {
    let (mut app, _) = setup().await;
    // 2024-03-05 + 4 weeks = 04-02.
    press(&mut app, &[KeyCode::Down; 4]).await;
    assert_eq!(app.day_cursor, date(2024, 4, 2));
    assert_eq!(app.nav.cursor(), MonthCursor::new(2024, 4).unwrap());

    press(&mut app, &[KeyCode::Char('p'), KeyCode::Char('p')]).await;
    assert_eq!(app.nav.cursor(), MonthCursor::new(2024, 2).unwrap());
    assert_eq!(app.day_cursor, date(2024, 2, 2));

    press(&mut app, &[KeyCode::Char('t')]).await;
    assert_eq!(app.nav.cursor(), MonthCursor::new(2024, 3).unwrap());
  }

  #[tokio::test]
  async fn month_to_day_to_store_and_back() {
    let (mut app, _) = setup().await;

    press(&mut app, &[KeyCode::Enter]).await;
    assert_eq!(app.nav.screen(), Screen::Day(date(2024, 3, 5)));
    assert_eq!(app.day_visits.len(), 2);

    press(&mut app, &[KeyCode::Down, KeyCode::Enter]).await;
    assert_eq!(app.nav.selected_store(), Some("Ueno"));
    let detail = app.detail.as_ref().unwrap();
    assert_eq!(detail.visit_count(), 1);

    press(&mut app, &[KeyCode::Esc]).await;
    assert_eq!(app.nav.screen(), Screen::Day(date(2024, 3, 5)));
    press(&mut app, &[KeyCode::Esc]).await;
    assert!(matches!(app.nav.screen(), Screen::Month(_)));
  }

  #[tokio::test]
  async fn add_visit_from_calendar_defaults_to_selected_day() {
    let (mut app, store) = setup().await;
    press(&mut app, &[KeyCode::Enter, KeyCode::Enter, KeyCode::Char('a')]).await;
    assert!(matches!(app.nav.screen(), Screen::AddVisit { store: "Ginza", .. }));
    assert_eq!(app.visit_form.as_ref().unwrap().date, "2024-03-05");

    // Date, Start, End, Rating, SV, Members.
    press(&mut app, &[KeyCode::Tab; 5]).await;
    type_text(&mut app, "Abe").await;
    press(&mut app, &[KeyCode::Enter]).await;

    assert!(app.visit_form.is_none());
    assert!(matches!(app.nav.screen(), Screen::StoreDetail { store: "Ginza", editing: None }));
    assert_eq!(store.rows(TableName::Visits).len(), 4);
    assert!(app.employees.contains(&"Abe".to_owned()), "new member registered");
    assert_eq!(app.detail.as_ref().unwrap().visit_count(), 3);
  }

  #[tokio::test]
  async fn invalid_form_input_writes_nothing() {
    let (mut app, store) = setup().await;
    press(&mut app, &[KeyCode::Enter, KeyCode::Enter, KeyCode::Char('a')]).await;
    let writes = store.write_count(TableName::Visits);

    press(&mut app, &[KeyCode::Tab, KeyCode::Tab, KeyCode::Tab]).await;
    type_text(&mut app, "9").await;
    press(&mut app, &[KeyCode::Enter]).await;

    assert!(app.status_msg.starts_with("Invalid input"), "{}", app.status_msg);
    assert!(app.visit_form.is_some());
    assert_eq!(store.write_count(TableName::Visits), writes);
  }

  #[tokio::test]
  async fn edit_visit_saves_changed_fields() {
    let (mut app, store) = setup().await;
    press(&mut app, &[KeyCode::Enter, KeyCode::Enter]).await;
    // Newest first: the 03-12 visit is selected.
    assert_eq!(app.selected_visit().unwrap().id, 3);

    press(&mut app, &[KeyCode::Char('e')]).await;
    assert_eq!(app.nav.editing(), Some(3));
    press(&mut app, &[KeyCode::Tab, KeyCode::Tab, KeyCode::Tab]).await;
    press(&mut app, &[KeyCode::Backspace]).await;
    type_text(&mut app, "5").await;
    press(&mut app, &[KeyCode::Enter]).await;

    assert_eq!(app.nav.editing(), None);
    let rows = store.rows(TableName::Visits);
    let edited: &Row = rows.iter().find(|r| r["id"] == "3").unwrap();
    assert_eq!(edited["rating"], "5");
    assert_eq!(edited["members"], "Smith");
  }

  #[tokio::test]
  async fn delete_needs_two_presses() {
    let (mut app, store) = setup().await;
    press(&mut app, &[KeyCode::Enter, KeyCode::Enter, KeyCode::Char('d')]).await;
    assert_eq!(store.rows(TableName::Visits).len(), 3);
    assert_eq!(app.pending_delete, Some(3));

    press(&mut app, &[KeyCode::Down, KeyCode::Char('d')]).await;
    assert_eq!(app.pending_delete, Some(1), "moving away re-arms");
    press(&mut app, &[KeyCode::Char('d')]).await;

    let ids: Vec<_> = store.rows(TableName::Visits).iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec!["2", "3"]);
    assert_eq!(app.detail.as_ref().unwrap().visit_count(), 1);
  }

  #[tokio::test]
  async fn rename_store_follows_the_view() {
    let (mut app, store) = setup().await;
    press(&mut app, &[KeyCode::Enter, KeyCode::Enter, KeyCode::Char('i')]).await;
    type_text(&mut app, " East").await;
    press(&mut app, &[KeyCode::Enter]).await;

    assert!(app.store_form.is_none());
    assert_eq!(app.nav.selected_store(), Some("Ginza East"));
    assert_eq!(app.detail.as_ref().unwrap().visit_count(), 2);
    assert!(
      store
        .rows(TableName::Stores)
        .iter()
        .any(|r| r["store_name"] == "Ginza East")
    );
  }

  #[tokio::test]
  async fn store_search_by_member() {
    let (mut app, _) = setup().await;
    press(&mut app, &[KeyCode::F(2)]).await;
    assert_eq!(app.nav.screen(), Screen::StoreList);
    assert_eq!(app.search_results(), vec!["Ginza", "Ueno"]);

    press(&mut app, &[KeyCode::Char('/')]).await;
    type_text(&mut app, "smith").await;
    press(&mut app, &[KeyCode::Enter]).await;
    assert!(app.search_results().is_empty(), "store-name scope only");

    press(&mut app, &[KeyCode::Char('2')]).await;
    assert_eq!(app.search_results(), vec!["Ginza"]);

    press(&mut app, &[KeyCode::Enter]).await;
    assert!(matches!(app.nav.screen(), Screen::StoreDetail { store: "Ginza", .. }));
  }

  #[tokio::test]
  async fn register_new_and_existing_store() {
    let (mut app, store) = setup().await;
    press(&mut app, &[KeyCode::F(3)]).await;

    press(&mut app, &[KeyCode::Enter]).await;
    assert_eq!(app.status_msg, "Enter a store name");

    type_text(&mut app, "Shibuya").await;
    press(&mut app, &[KeyCode::Enter]).await;
    assert_eq!(app.nav.tab(), Tab::Search);
    assert!(matches!(app.nav.screen(), Screen::StoreDetail { store: "Shibuya", .. }));
    assert_eq!(store.rows(TableName::Stores).len(), 3);

    press(&mut app, &[KeyCode::F(3)]).await;
    type_text(&mut app, "Ueno").await;
    press(&mut app, &[KeyCode::Enter]).await;
    assert_eq!(app.pending_existing.as_deref(), Some("Ueno"));
    assert_eq!(app.nav.tab(), Tab::Register);

    press(&mut app, &[KeyCode::Enter]).await;
    assert!(matches!(app.nav.screen(), Screen::StoreDetail { store: "Ueno", .. }));
    assert_eq!(store.rows(TableName::Stores).len(), 3);
  }

  #[tokio::test]
  async fn unreachable_tables_are_reported_not_fatal() {
    let (mut app, store) = setup().await;
    store.set_offline(TableName::Visits, true);
    press(&mut app, &[KeyCode::Char('r')]).await;

    assert_eq!(app.offline.len(), 1);
    assert!(app.offline[0].starts_with("visits"));
    assert!(app.visits.is_empty());

    press(&mut app, &[KeyCode::F(2), KeyCode::Enter, KeyCode::Char('a'), KeyCode::Enter]).await;
    assert!(app.status_msg.starts_with("Error"), "{}", app.status_msg);
  }
}
