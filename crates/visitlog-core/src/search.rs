//! Store search across names, visit members and store notes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::record::{Store, Visit};

/// Which fields a query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchScopes {
  pub store_name: bool,
  /// The raw `members` cell of any visit to the store. Supervisors are not
  /// searched.
  pub members:    bool,
  /// The store's notices and memo.
  pub notes:      bool,
}

impl Default for SearchScopes {
  fn default() -> Self { Self { store_name: true, members: false, notes: false } }
}

impl SearchScopes {
  pub fn any(&self) -> bool { self.store_name || self.members || self.notes }
}

/// Names of stores matching `query`, sorted and without duplicates.
///
/// An empty (or all-whitespace) query lists every store. Stores are named by
/// both the stores table and the visits that refer to them, so a store only
/// known from its visits can still be found by member.
pub fn search_stores(
  query: &str,
  scopes: SearchScopes,
  stores: &[Store],
  visits: &[Visit],
) -> Vec<String> {
  let query = query.trim().to_lowercase();
  let matches = |text: &str| text.to_lowercase().contains(&query);

  let mut found = BTreeSet::new();

  if query.is_empty() {
    found.extend(stores.iter().map(|s| s.store_name.as_str()));
  } else {
    if scopes.store_name {
      found.extend(stores.iter().map(|s| s.store_name.as_str()).filter(|n| matches(n)));
    }
    if scopes.members {
      found.extend(
        visits
          .iter()
          .filter(|v| matches(&v.members_raw))
          .map(|v| v.store_name.as_str()),
      );
    }
    if scopes.notes {
      found.extend(
        stores
          .iter()
          .filter(|s| matches(&s.notices) || matches(&s.memo))
          .map(|s| s.store_name.as_str()),
      );
    }
  }

  found
    .into_iter()
    .filter(|n| !n.trim().is_empty())
    .map(str::to_owned)
    .collect()
}
