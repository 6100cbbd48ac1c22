//! Passage report: everything a client needs to render the checker for one session.
//!
//! Built fresh from a `Session` after every action; it owns no state.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::config::HighlightConfig;
use crate::domain::{ItemKey, Passage};
use crate::edits::EditStore;
use crate::flatten::{flatten_passage, visible, FlatItem};
use crate::partition::{partition, Segment, Span};
use crate::ranges::{classify, clamp, original, resolve, RangeStatus, Severity, SpanBounds};
use crate::session::{Phase, Session};
use crate::util::{char_slice, ellipsize};

#[derive(Clone, Debug, Serialize)]
pub struct PassageReport {
  pub phase: Phase,
  pub source: Option<String>,
  pub passages: Vec<PassageSummary>,
  pub passage_index: Option<usize>,
  pub passage: Option<PassageDetail>,
  pub pending_edits: usize,
  pub exports: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct PassageSummary {
  pub index: usize,
  pub passage_id: Option<String>,
  pub title: Option<String>,
  pub item_count: usize,
  /// Items whose span is not `ok` (warnings included).
  pub flagged_count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct GroupSummary {
  pub key: String,
  pub group_id: Option<String>,
  #[serde(rename = "type")]
  pub kind: Option<String>,
  pub item_count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct ItemRow {
  pub key: ItemKey,
  pub number: Option<i64>,
  pub prompt: Option<String>,
  pub image_url: Option<String>,
  pub group_key: String,
  pub group_type: Option<String>,
  pub answer_type: Option<String>,
  pub answer_value: Option<Value>,
  pub original: SpanBounds,
  pub effective: SpanBounds,
  pub edited: bool,
  pub visible: bool,
  pub status: RangeStatus,
  pub status_label: &'static str,
  pub severity: Severity,
  /// Text under the clamped effective span.
  pub excerpt: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PassageDetail {
  pub passage_id: Option<String>,
  pub title: Option<String>,
  pub text_len: usize,
  pub groups: Vec<GroupSummary>,
  pub group_filter: Option<String>,
  pub active_item: Option<ItemKey>,
  pub items: Vec<ItemRow>,
  pub segments: Vec<Segment>,
  pub status_counts: BTreeMap<RangeStatus, usize>,
}

pub fn build_report(session: &Session, cfg: &HighlightConfig) -> PassageReport {
  let Some(doc) = session.document() else {
    return PassageReport {
      phase: session.phase(),
      source: None,
      passages: Vec::new(),
      passage_index: None,
      passage: None,
      pending_edits: 0,
      exports: session.exports(),
    };
  };

  let empty = EditStore::default();
  let passages = doc
    .document()
    .passages
    .iter()
    .enumerate()
    .map(|(index, p)| {
      let edits = if index == session.passage_index() { session.edits() } else { &empty };
      PassageSummary {
        index,
        passage_id: p.passage_id.clone(),
        title: p.title.clone(),
        item_count: p.item_count(),
        flagged_count: flagged_count(p, edits),
      }
    })
    .collect();

  let passage = session.passage().map(|p| passage_detail(session, p, cfg));

  PassageReport {
    phase: session.phase(),
    source: doc.source().map(str::to_string),
    passages,
    passage_index: passage.as_ref().map(|_| session.passage_index()),
    passage,
    pending_edits: session.edits().len(),
    exports: session.exports(),
  }
}

fn flagged_count(p: &Passage, edits: &EditStore) -> usize {
  let len = p.text_len();
  p.groups
    .iter()
    .flat_map(|g| g.items.iter())
    .filter(|it| !classify(resolve(it, edits.get(&it.key)), len).is_ok())
    .count()
}

fn passage_detail(session: &Session, p: &Passage, cfg: &HighlightConfig) -> PassageDetail {
  let len = p.text_len();
  let filter = session.group_filter();
  let flat = flatten_passage(p);

  let items: Vec<ItemRow> = flat
    .iter()
    .map(|f| item_row(f, session.edits(), &p.text, len, filter, cfg.excerpt_chars))
    .collect();

  let spans: Vec<Span> = visible(&flat, filter)
    .filter_map(|f| {
      let (start, stop) = resolve(f.item, session.edits().get(&f.item.key)).pair()?;
      Some(Span { key: f.item.key.clone(), number: f.item.number, start, stop })
    })
    .collect();
  let segments = partition(&p.text, &spans, session.active_item(), cfg.priority);

  let mut status_counts = BTreeMap::new();
  for row in &items {
    *status_counts.entry(row.status).or_insert(0) += 1;
  }

  PassageDetail {
    passage_id: p.passage_id.clone(),
    title: p.title.clone(),
    text_len: len,
    groups: p
      .groups
      .iter()
      .map(|g| GroupSummary {
        key: g.key.clone(),
        group_id: g.group_id.clone(),
        kind: g.kind.clone(),
        item_count: g.items.len(),
      })
      .collect(),
    group_filter: filter.map(str::to_string),
    active_item: session.active_item().cloned(),
    items,
    segments,
    status_counts,
  }
}

fn item_row(
  f: &FlatItem<'_>,
  edits: &EditStore,
  text: &str,
  len: usize,
  filter: Option<&str>,
  excerpt_chars: usize,
) -> ItemRow {
  let edit = edits.get(&f.item.key);
  let effective = resolve(f.item, edit);
  let status = classify(effective, len);
  let excerpt = effective
    .pair()
    .and_then(|(a, b)| clamp(a, b, len))
    .map(|(a, b)| ellipsize(char_slice(text, a, b), excerpt_chars));
  let answer = f.item.answer.as_ref();

  ItemRow {
    key: f.item.key.clone(),
    number: f.item.number,
    prompt: f.item.prompt.clone(),
    image_url: f.item.image_url.clone(),
    group_key: f.group_key().to_string(),
    group_type: f.group_type().map(str::to_string),
    answer_type: answer.and_then(|a| a.kind.clone()),
    answer_value: answer.and_then(|a| a.value.clone()),
    original: original(f.item),
    effective,
    edited: edit.is_some(),
    visible: filter.map_or(true, |g| f.group_key() == g),
    status,
    status_label: status.label(),
    severity: status.severity(),
    excerpt,
  }
}
