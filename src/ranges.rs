//! Range resolution and validity classification.
//!
//! The effective span of an item is its pending edit when one exists, otherwise
//! the span stored on its answer. Neither source is ever modified here.

use serde::{Deserialize, Serialize};

use crate::domain::Item;

/// A pending override of an item's span. Both bounds are always present.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
  pub start: i64,
  pub stop: i64,
}

/// A possibly incomplete span.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SpanBounds {
  pub start: Option<i64>,
  pub stop: Option<i64>,
}

impl SpanBounds {
  /// Both bounds, when both are present.
  pub fn pair(&self) -> Option<(i64, i64)> {
    Some((self.start?, self.stop?))
  }
}

/// The span as stored in the document.
pub fn original(item: &Item) -> SpanBounds {
  item
    .answer
    .as_ref()
    .map(|a| SpanBounds { start: a.start_index, stop: a.stop_index })
    .unwrap_or_default()
}

/// The span used for display and checking: the edit if present, else the original.
pub fn resolve(item: &Item, edit: Option<&Edit>) -> SpanBounds {
  match edit {
    Some(e) => SpanBounds { start: Some(e.start), stop: Some(e.stop) },
    None => original(item),
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
  Ok,
  Warning,
  Error,
}

/// Validity of a span against its passage text, checked in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStatus {
  Missing,
  Negative,
  StopNotAfterStart,
  StartOutOfBounds,
  StopOutOfBounds,
  Ok,
}

impl RangeStatus {
  /// Badge text shown next to the item.
  pub fn label(self) -> &'static str {
    match self {
      RangeStatus::Missing => "missing",
      RangeStatus::Negative => "negative",
      RangeStatus::StopNotAfterStart => "stop<=start",
      RangeStatus::StartOutOfBounds => "start>=text length",
      RangeStatus::StopOutOfBounds => "stop>text length",
      RangeStatus::Ok => "ok",
    }
  }

  /// A stop past the end is still usable after clamping, so it only warns.
  pub fn severity(self) -> Severity {
    match self {
      RangeStatus::Ok => Severity::Ok,
      RangeStatus::StopOutOfBounds => Severity::Warning,
      _ => Severity::Error,
    }
  }

  pub fn is_ok(self) -> bool {
    self == RangeStatus::Ok
  }
}

pub fn classify(span: SpanBounds, text_len: usize) -> RangeStatus {
  let Some((start, stop)) = span.pair() else {
    return RangeStatus::Missing;
  };
  let len = i64::try_from(text_len).unwrap_or(i64::MAX);
  if start < 0 || stop < 0 {
    RangeStatus::Negative
  } else if stop <= start {
    RangeStatus::StopNotAfterStart
  } else if start >= len {
    RangeStatus::StartOutOfBounds
  } else if stop > len {
    RangeStatus::StopOutOfBounds
  } else {
    RangeStatus::Ok
  }
}

/// Clamp `[start, stop)` into `[0, text_len]`. `None` if nothing is left.
pub fn clamp(start: i64, stop: i64, text_len: usize) -> Option<(usize, usize)> {
  let bound = |v: i64| -> usize {
    if v <= 0 {
      0
    } else {
      usize::try_from(v).map_or(text_len, |u| u.min(text_len))
    }
  };
  let (a, b) = (bound(start), bound(stop));
  (a < b).then_some((a, b))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Answer, ItemKey};

  fn item(start: Option<i64>, stop: Option<i64>) -> Item {
    Item {
      key: ItemKey::from("q"),
      item_id: Some("q".into()),
      number: Some(1),
      prompt: None,
      image_url: None,
      answer: Some(Answer { kind: None, value: None, start_index: start, stop_index: stop }),
    }
  }

  fn span(start: i64, stop: i64) -> SpanBounds {
    SpanBounds { start: Some(start), stop: Some(stop) }
  }

  #[test]
  fn edit_wins_over_original_without_touching_it() {
    let it = item(Some(1), Some(4));
    let e = Edit { start: 2, stop: 9 };
    assert_eq!(resolve(&it, Some(&e)), span(2, 9));
    assert_eq!(resolve(&it, None), span(1, 4));
    assert_eq!(it.answer.as_ref().and_then(|a| a.start_index), Some(1));
  }

  #[test]
  fn absent_answer_resolves_to_missing() {
    let mut it = item(None, None);
    it.answer = None;
    let r = resolve(&it, None);
    assert_eq!(r.pair(), None);
    assert_eq!(classify(r, 10), RangeStatus::Missing);
  }

  #[test]
  fn classification_follows_precedence() {
    assert_eq!(classify(SpanBounds { start: Some(3), stop: None }, 10), RangeStatus::Missing);
    // negative beats inverted
    assert_eq!(classify(span(-1, -5), 10), RangeStatus::Negative);
    assert_eq!(classify(span(2, -1), 10), RangeStatus::Negative);
    assert_eq!(classify(span(5, 5), 10), RangeStatus::StopNotAfterStart);
    assert_eq!(classify(span(12, 11), 10), RangeStatus::StopNotAfterStart);
    assert_eq!(classify(span(10, 12), 10), RangeStatus::StartOutOfBounds);
    assert_eq!(classify(span(8, 12), 10), RangeStatus::StopOutOfBounds);
    assert_eq!(classify(span(0, 10), 10), RangeStatus::Ok);
  }

  #[test]
  fn severities() {
    assert_eq!(RangeStatus::StopOutOfBounds.severity(), Severity::Warning);
    assert_eq!(RangeStatus::StartOutOfBounds.severity(), Severity::Error);
    assert_eq!(RangeStatus::Ok.severity(), Severity::Ok);
    assert_eq!(RangeStatus::StopNotAfterStart.label(), "stop<=start");
  }

  #[test]
  fn clamp_stays_within_text() {
    assert_eq!(clamp(-5, 3, 10), Some((0, 3)));
    assert_eq!(clamp(8, 50, 10), Some((8, 10)));
    assert_eq!(clamp(5, 5, 10), None);
    assert_eq!(clamp(7, 2, 10), None);
    assert_eq!(clamp(12, 20, 10), None);
    assert_eq!(clamp(i64::MIN, i64::MAX, 10), Some((0, 10)));
    assert_eq!(clamp(0, 4, 0), None);
  }
}
