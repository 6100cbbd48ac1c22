//! Small utility helpers used across modules.

use serde_json::Value;

/// Byte offset of every char start in `text`, followed by `text.len()`.
/// `offsets[i]` is where char `i` begins, so the table has `char_count + 1` entries.
pub fn char_offsets(text: &str) -> Vec<usize> {
  let mut out: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
  out.push(text.len());
  out
}

/// Substring by char positions `[start, stop)`. Positions past the end are clamped.
pub fn char_slice(text: &str, start: usize, stop: usize) -> &str {
  let offsets = char_offsets(text);
  let last = offsets.len() - 1;
  let a = offsets[start.min(last)];
  let b = offsets[stop.min(last).max(start.min(last))];
  &text[a..b]
}

/// Shorten `s` to at most `max_chars` chars, marking the cut with an ellipsis.
pub fn ellipsize(s: &str, max_chars: usize) -> String {
  if s.chars().count() <= max_chars {
    return s.to_string();
  }
  let mut out: String = s.chars().take(max_chars).collect();
  out.push('…');
  out
}

/// Parse user-typed text as an integer offset.
/// Accepts plain integers and integral decimals ("12", " 12 ", "12.0"); anything else is `None`.
pub fn parse_int_text(s: &str) -> Option<i64> {
  let t = s.trim();
  if t.is_empty() {
    return None;
  }
  if let Ok(i) = t.parse::<i64>() {
    return Some(i);
  }
  t.parse::<f64>().ok().and_then(integral_f64)
}

/// Read an integer out of loosely typed JSON: integers, integral floats and numeric strings.
pub fn lenient_i64(v: &Value) -> Option<i64> {
  match v {
    Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral_f64)),
    Value::String(s) => parse_int_text(s),
    _ => None,
  }
}

/// Read an identifier-like string: JSON strings as-is, numbers via their JSON text.
pub fn lenient_string(v: &Value) -> Option<String> {
  match v {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

fn integral_f64(f: f64) -> Option<i64> {
  // 2^53: beyond this an f64 no longer maps onto distinct integers.
  if f.is_finite() && f.fract() == 0.0 && f.abs() <= 9_007_199_254_740_992.0 {
    Some(f as i64)
  } else {
    None
  }
}
