//! Interval partitioning of a passage text for highlighting.
//!
//! Every distinct span start/stop (after clamping) plus `0` and the text length
//! becomes a boundary. Each pair of consecutive boundaries is one segment, and a
//! segment is covered by every span that contains it entirely. Segments tile the
//! text exactly: concatenating them in order gives the text back.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::HighlightPriority;
use crate::domain::ItemKey;
use crate::flatten::number_order;
use crate::ranges::clamp;
use crate::util::char_offsets;

/// One item's effective span as input to the partitioner. Offsets are char positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
  pub key: ItemKey,
  pub number: Option<i64>,
  pub start: i64,
  pub stop: i64,
}

/// A maximal run of text between two consecutive boundaries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Segment {
  pub start: usize,
  pub stop: usize,
  pub text: String,
  /// Covering items, highest highlight priority first.
  pub covering: Vec<ItemKey>,
  /// The item the segment is highlighted for; `None` renders as plain text.
  pub primary: Option<ItemKey>,
}

struct Clamped<'a> {
  span: &'a Span,
  start: usize,
  stop: usize,
}

/// Partition `text` by the given spans.
///
/// Spans are clamped to the text; a span that is empty after clamping adds no
/// boundary and covers nothing. Overlaps are ordered by `priority`: with
/// `ActiveThenNumber` the active item leads, then ascending number (unnumbered
/// last), then input order.
pub fn partition(
  text: &str,
  spans: &[Span],
  active: Option<&ItemKey>,
  priority: HighlightPriority,
) -> Vec<Segment> {
  let offsets = char_offsets(text);
  let len = offsets.len() - 1;

  let mut clamped: Vec<(usize, Clamped<'_>)> = spans
    .iter()
    .enumerate()
    .filter_map(|(order, span)| {
      clamp(span.start, span.stop, len).map(|(start, stop)| (order, Clamped { span, start, stop }))
    })
    .collect();
  clamped.sort_by_key(|(order, c)| {
    let is_active = priority == HighlightPriority::ActiveThenNumber && active == Some(&c.span.key);
    (!is_active, number_order(c.span.number), *order)
  });

  let mut bounds = BTreeSet::from([0, len]);
  for (_, c) in &clamped {
    bounds.insert(c.start);
    bounds.insert(c.stop);
  }
  let bounds: Vec<usize> = bounds.into_iter().collect();

  bounds
    .windows(2)
    .map(|w| {
      let (a, b) = (w[0], w[1]);
      let covering: Vec<ItemKey> = clamped
        .iter()
        .filter(|(_, c)| c.start <= a && c.stop >= b)
        .map(|(_, c)| c.span.key.clone())
        .collect();
      Segment {
        start: a,
        stop: b,
        text: text[offsets[a]..offsets[b]].to_string(),
        primary: covering.first().cloned(),
        covering,
      }
    })
    .collect()
}
