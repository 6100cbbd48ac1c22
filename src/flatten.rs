//! Item flattening: every item of a passage in one list, ordered by display number.

use crate::domain::{Group, Item, Passage};

/// An item together with the group it came from.
#[derive(Clone, Copy, Debug)]
pub struct FlatItem<'a> {
  pub item: &'a Item,
  pub group: &'a Group,
  /// Position in document order, before sorting. Used as the final tie-break.
  pub encounter: usize,
}

impl<'a> FlatItem<'a> {
  pub fn group_key(&self) -> &'a str {
    &self.group.key
  }

  pub fn group_type(&self) -> Option<&'a str> {
    self.group.kind.as_deref()
  }
}

/// Flatten all groups of `passage`, sorted ascending by `number`.
/// Items without a number go last. The sort is stable, so ties keep document order.
pub fn flatten_passage(passage: &Passage) -> Vec<FlatItem<'_>> {
  let mut out: Vec<FlatItem<'_>> = passage
    .groups
    .iter()
    .flat_map(|group| group.items.iter().map(move |item| (group, item)))
    .enumerate()
    .map(|(encounter, (group, item))| FlatItem { item, group, encounter })
    .collect();
  out.sort_by_key(|f| number_order(f.item.number));
  out
}

/// Items that pass the group filter (`None` = everything).
pub fn visible<'a, 'b>(
  items: &'b [FlatItem<'a>],
  group_filter: Option<&'b str>,
) -> impl Iterator<Item = &'b FlatItem<'a>> + 'b {
  items
    .iter()
    .filter(move |f| group_filter.map_or(true, |g| f.group_key() == g))
}

/// Sort key placing numbered items first, ascending.
pub fn number_order(number: Option<i64>) -> (bool, i64) {
  (number.is_none(), number.unwrap_or(0))
}
