//! Document loading: raw upload bytes → parsed JSON + typed passage tree.
//!
//! Parsing is all-or-nothing. A failed load returns an error and leaves the
//! caller's current state alone.

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::domain::Document;
use crate::error::CheckerError;

/// A successfully loaded document. Immutable once built; export works on a copy of `raw`.
#[derive(Clone, Debug)]
pub struct LoadedDocument {
  raw: Value,
  document: Document,
  source: Option<String>,
}

impl LoadedDocument {
  /// Build from an already parsed JSON value.
  pub fn from_value(raw: Value, source: Option<String>) -> Self {
    let document = Document::from_value(&raw);
    Self { raw, document, source }
  }

  /// The uploaded JSON exactly as parsed.
  pub fn raw(&self) -> &Value {
    &self.raw
  }

  pub fn document(&self) -> &Document {
    &self.document
  }

  /// File name or other label the upload came from, if the client supplied one.
  pub fn source(&self) -> Option<&str> {
    self.source.as_deref()
  }
}

/// Parse uploaded bytes. Anything that is valid JSON loads; shape problems only
/// show up later as empty passages or missing-answer statuses.
#[instrument(level = "info", skip(bytes), fields(bytes = bytes.len(), source = source.unwrap_or("-")))]
pub fn load_document(bytes: &[u8], source: Option<&str>) -> Result<LoadedDocument, CheckerError> {
  let raw: Value = serde_json::from_slice(bytes).map_err(|e| {
    warn!(
      target: "index_checker",
      bytes = bytes.len(),
      line = e.line(),
      column = e.column(),
      category = ?e.classify(),
      "Rejected upload: not valid JSON"
    );
    CheckerError::Parse(e)
  })?;

  if raw.get("passages").and_then(Value::as_array).is_none() {
    debug!(target: "index_checker", "Upload has no `passages` array; loading as empty document");
  }

  let loaded = LoadedDocument::from_value(raw, source.map(str::to_string));
  let passages = loaded.document.passages.len();
  let items: usize = loaded.document.passages.iter().map(|p| p.item_count()).sum();
  info!(target: "index_checker", passages, items, "Document loaded");
  Ok(loaded)
}
