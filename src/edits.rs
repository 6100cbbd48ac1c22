//! The edit overlay: per-item span overrides kept apart from the loaded document.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::ItemKey;
use crate::ranges::Edit;
use crate::util::parse_int_text;

/// What `set_edit` did with the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOutcome {
  Stored(Edit),
  /// Input was not numeric; any previous edit for the item was dropped.
  Cleared,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EditStore {
  edits: BTreeMap<ItemKey, Edit>,
}

impl EditStore {
  pub fn get(&self, key: &ItemKey) -> Option<&Edit> {
    self.edits.get(key)
  }

  /// Store an override from raw user input. Both bounds must parse as integers,
  /// otherwise the item reverts to its original span.
  pub fn set_edit(&mut self, key: ItemKey, start: &str, stop: &str) -> EditOutcome {
    match (parse_int_text(start), parse_int_text(stop)) {
      (Some(start), Some(stop)) => {
        let edit = Edit { start, stop };
        self.edits.insert(key, edit);
        EditOutcome::Stored(edit)
      }
      _ => {
        self.edits.remove(&key);
        EditOutcome::Cleared
      }
    }
  }

  /// Drop the override for `key`. Returns whether one existed.
  pub fn reset(&mut self, key: &ItemKey) -> bool {
    self.edits.remove(key).is_some()
  }

  pub fn clear(&mut self) {
    self.edits.clear();
  }

  pub fn len(&self) -> usize {
    self.edits.len()
  }

  pub fn is_empty(&self) -> bool {
    self.edits.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&ItemKey, &Edit)> {
    self.edits.iter()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn numeric_input_is_stored() {
    let mut store = EditStore::default();
    let out = store.set_edit(ItemKey::from("q1"), "4", " 9 ");
    assert_eq!(out, EditOutcome::Stored(Edit { start: 4, stop: 9 }));
    assert_eq!(store.get(&ItemKey::from("q1")), Some(&Edit { start: 4, stop: 9 }));
  }

  #[test]
  fn invalid_values_are_stored_as_typed() {
    // Validity is a status concern; the store only cares that input is numeric.
    let mut store = EditStore::default();
    assert_eq!(store.set_edit(ItemKey::from("q1"), "-3", "-7"), EditOutcome::Stored(Edit { start: -3, stop: -7 }));
  }

  #[test]
  fn non_numeric_input_reverts_to_original() {
    let mut store = EditStore::default();
    store.set_edit(ItemKey::from("q1"), "4", "9");
    let out = store.set_edit(ItemKey::from("q1"), "4", "nine");
    assert_eq!(out, EditOutcome::Cleared);
    assert!(store.get(&ItemKey::from("q1")).is_none());
    assert!(store.is_empty());
  }

  #[test]
  fn reset_removes_only_that_item() {
    let mut store = EditStore::default();
    store.set_edit(ItemKey::from("q1"), "1", "2");
    store.set_edit(ItemKey::from("q2"), "3", "4");
    assert!(store.reset(&ItemKey::from("q1")));
    assert!(!store.reset(&ItemKey::from("q1")));
    assert_eq!(store.len(), 1);
    assert_eq!(store.iter().next().map(|(k, _)| k.as_str()), Some("q2"));
  }
}
