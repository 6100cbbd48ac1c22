//! Export: merge the edit overlay into a copy of the loaded document.
//!
//! Only `start_index` / `stop_index` of edited items in the selected passage are
//! written; every other byte of structure comes from the original upload.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::config::ExportConfig;
use crate::domain::ItemKey;
use crate::edits::EditStore;
use crate::error::CheckerError;
use crate::loader::LoadedDocument;

/// A ready-to-download patched document.
#[derive(Clone, Debug)]
pub struct ExportArtifact {
  pub file_name: String,
  pub document: Value,
  /// Pretty-printed `document`.
  pub body: String,
  pub patched_items: usize,
}

/// Copy `raw` and write every stored edit of passage `passage_index` into it.
/// Returns the patched copy and how many items were written.
pub fn patch_document(raw: &Value, passage_index: usize, edits: &EditStore) -> (Value, usize) {
  let mut out = raw.clone();
  if edits.is_empty() {
    return (out, 0);
  }

  let Some(passage) = out
    .get_mut("passages")
    .and_then(Value::as_array_mut)
    .and_then(|ps| ps.get_mut(passage_index))
  else {
    return (out, 0);
  };
  let Some(groups) = passage.get_mut("groups").and_then(Value::as_array_mut) else {
    return (out, 0);
  };

  let mut patched = 0;
  let mut matched = BTreeSet::new();
  for (gi, group) in groups.iter_mut().enumerate() {
    let Some(items) = group.get_mut("items").and_then(Value::as_array_mut) else {
      continue;
    };
    for (ii, item) in items.iter_mut().enumerate() {
      let key = ItemKey::for_raw_item(item, gi, ii);
      let Some(edit) = edits.get(&key) else {
        continue;
      };
      matched.insert(key.clone());
      let Some(fields) = item.as_object_mut() else {
        continue;
      };
      match fields.get_mut("answer") {
        Some(Value::Object(answer)) => {
          answer.insert("start_index".into(), json!(edit.start));
          answer.insert("stop_index".into(), json!(edit.stop));
        }
        None | Some(Value::Null) => {
          fields.insert("answer".into(), json!({ "start_index": edit.start, "stop_index": edit.stop }));
        }
        Some(other) => {
          warn!(target: "export", item = %key, kind = json_kind(other), "Skipping edit: answer is not an object");
          continue;
        }
      }
      patched += 1;
    }
  }

  let unmatched = edits.iter().filter(|(k, _)| !matched.contains(*k)).count();
  if unmatched > 0 {
    warn!(target: "export", unmatched, "Edits with no matching item in passage were not written");
  }
  (out, patched)
}

/// Pretty-print with `indent` spaces per level.
pub fn render(document: &Value, indent: usize) -> Result<String, CheckerError> {
  let pad = " ".repeat(indent);
  let formatter = serde_json::ser::PrettyFormatter::with_indent(pad.as_bytes());
  let mut buf = Vec::new();
  let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
  document.serialize(&mut ser).map_err(CheckerError::Render)?;
  Ok(String::from_utf8(buf)?)
}

/// `{prefix}{passage_id}.json`, with the id reduced to file-name-safe characters.
pub fn file_name_for(passage_id: Option<&str>, cfg: &ExportConfig) -> String {
  let stem: String = passage_id
    .unwrap_or_default()
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
    .collect();
  let stem = if stem.trim_matches(|c| c == '.' || c == '_').is_empty() {
    cfg.fallback_stem.clone()
  } else {
    stem
  };
  format!("{}{}.json", cfg.file_prefix, stem)
}

#[instrument(level = "info", skip(doc, edits, cfg), fields(edits = edits.len()))]
pub fn export_document(
  doc: &LoadedDocument,
  passage_index: usize,
  edits: &EditStore,
  cfg: &ExportConfig,
) -> Result<ExportArtifact, CheckerError> {
  let (document, patched_items) = patch_document(doc.raw(), passage_index, edits);
  let body = render(&document, cfg.indent)?;
  let passage_id = doc
    .document()
    .passages
    .get(passage_index)
    .and_then(|p| p.passage_id.as_deref());
  let file_name = file_name_for(passage_id, cfg);
  info!(target: "export", %file_name, patched_items, bytes = body.len(), "Export rendered");
  Ok(ExportArtifact { file_name, document, body, patched_items })
}

fn json_kind(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "bool",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}
