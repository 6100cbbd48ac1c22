//! Domain models: the reading document tree (passages → groups → items → answers).
//!
//! The typed tree is a lenient projection of the uploaded JSON. Building it never
//! fails: absent or wrong-typed fields become `None` (or empty collections). The raw
//! JSON is kept separately by the loader and is what export writes back.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::{lenient_i64, lenient_string};

/// Identity of an item inside one passage.
/// The item's own `item_id` when it has one, otherwise its position (`g{group}.i{item}`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKey(String);

impl ItemKey {
  pub fn new(key: impl Into<String>) -> Self {
    Self(key.into())
  }

  pub fn positional(group_index: usize, item_index: usize) -> Self {
    Self(format!("g{}.i{}", group_index, item_index))
  }

  /// Key for a raw item value found at the given position.
  pub fn for_raw_item(item: &Value, group_index: usize, item_index: usize) -> Self {
    match present(item, "item_id").and_then(lenient_string) {
      Some(id) => Self(id),
      None => Self::positional(group_index, item_index),
    }
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ItemKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for ItemKey {
  fn from(s: &str) -> Self {
    Self(s.to_string())
  }
}

/// Where the answer is grounded in the passage text. Indices are char offsets, `[start, stop)`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Answer {
  #[serde(rename = "type")]
  pub kind: Option<String>,
  pub value: Option<Value>,
  pub start_index: Option<i64>,
  pub stop_index: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Item {
  pub key: ItemKey,
  pub item_id: Option<String>,
  /// Display number; drives sort order.
  pub number: Option<i64>,
  pub prompt: Option<String>,
  pub image_url: Option<String>,
  pub answer: Option<Answer>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Group {
  /// `group_id` when present, otherwise `g{index}`. Used by the group filter.
  pub key: String,
  pub group_id: Option<String>,
  #[serde(rename = "type")]
  pub kind: Option<String>,
  pub items: Vec<Item>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Passage {
  pub passage_id: Option<String>,
  pub title: Option<String>,
  pub text: String,
  pub groups: Vec<Group>,
}

impl Passage {
  /// Length of the text in chars; the bound every span is checked against.
  pub fn text_len(&self) -> usize {
    self.text.chars().count()
  }

  pub fn find_item(&self, key: &ItemKey) -> Option<&Item> {
    self.groups.iter().flat_map(|g| g.items.iter()).find(|it| &it.key == key)
  }

  pub fn has_group(&self, group_key: &str) -> bool {
    self.groups.iter().any(|g| g.key == group_key)
  }

  pub fn item_count(&self) -> usize {
    self.groups.iter().map(|g| g.items.len()).sum()
  }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Document {
  pub passages: Vec<Passage>,
}

impl Document {
  /// Project arbitrary JSON onto the passage tree.
  pub fn from_value(root: &Value) -> Self {
    let passages = array(root, "passages").iter().map(passage_from_value).collect();
    Self { passages }
  }
}

fn passage_from_value(v: &Value) -> Passage {
  Passage {
    passage_id: present(v, "passage_id").and_then(lenient_string),
    title: present(v, "title").and_then(lenient_string),
    text: present(v, "text").and_then(Value::as_str).unwrap_or_default().to_string(),
    groups: array(v, "groups")
      .iter()
      .enumerate()
      .map(|(gi, g)| group_from_value(g, gi))
      .collect(),
  }
}

fn group_from_value(v: &Value, group_index: usize) -> Group {
  let group_id = present(v, "group_id").and_then(lenient_string);
  Group {
    key: group_id.clone().unwrap_or_else(|| format!("g{}", group_index)),
    group_id,
    kind: present(v, "type").and_then(lenient_string),
    items: array(v, "items")
      .iter()
      .enumerate()
      .map(|(ii, it)| item_from_value(it, group_index, ii))
      .collect(),
  }
}

fn item_from_value(v: &Value, group_index: usize, item_index: usize) -> Item {
  Item {
    key: ItemKey::for_raw_item(v, group_index, item_index),
    item_id: present(v, "item_id").and_then(lenient_string),
    number: present(v, "number").and_then(lenient_i64),
    prompt: present(v, "prompt").and_then(Value::as_str).map(str::to_string),
    image_url: present(v, "image_url").and_then(Value::as_str).map(str::to_string),
    answer: present(v, "answer").filter(|a| a.is_object()).map(answer_from_value),
  }
}

fn answer_from_value(v: &Value) -> Answer {
  Answer {
    kind: present(v, "type").and_then(lenient_string),
    value: present(v, "value").cloned(),
    start_index: present(v, "start_index").and_then(lenient_i64),
    stop_index: present(v, "stop_index").and_then(lenient_i64),
  }
}

/// Field lookup that treats JSON `null` the same as absent.
fn present<'a>(v: &'a Value, name: &str) -> Option<&'a Value> {
  v.get(name).filter(|x| !x.is_null())
}

fn array<'a>(v: &'a Value, name: &str) -> &'a [Value] {
  v.get(name).and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}
