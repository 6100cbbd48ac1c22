//! Error types for the index checker core.
//!
//! Range problems are never errors here; they are reported as statuses.

use thiserror::Error;

use crate::domain::ItemKey;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CheckerError {
  #[error("document is not valid JSON: {0}")]
  Parse(#[source] serde_json::Error),
  #[error("no document loaded")]
  NoDocument,
  #[error("passage index {index} out of range ({count} passages)")]
  PassageOutOfRange { index: usize, count: usize },
  #[error("unknown item in current passage: {0}")]
  UnknownItem(ItemKey),
  #[error("unknown group in current passage: {0}")]
  UnknownGroup(String),
  #[error("failed to render export: {0}")]
  Render(#[source] serde_json::Error),
  #[error("export is not valid UTF-8")]
  Encoding(#[from] std::string::FromUtf8Error),
}

impl CheckerError {
  /// Stable machine-readable code used on the wire.
  pub fn code(&self) -> &'static str {
    match self {
      CheckerError::Parse(_) => "parse_error",
      CheckerError::NoDocument => "no_document",
      CheckerError::PassageOutOfRange { .. } => "passage_out_of_range",
      CheckerError::UnknownItem(_) => "unknown_item",
      CheckerError::UnknownGroup(_) => "unknown_group",
      CheckerError::Render(_) | CheckerError::Encoding(_) => "export_failed",
    }
  }
}
