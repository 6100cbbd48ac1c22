//! Editing session: an immutable value advanced by discrete user actions.
//!
//! `Session::apply` never mutates `self`; it returns the next session or an
//! error, and on error the caller simply keeps the session it had.
//!
//! Lifecycle: `Empty → Loaded ⇄ Editing`. Loading a document or switching
//! passage returns to `Loaded` with the edit overlay cleared. Exporting does not
//! clear edits.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::config::ExportConfig;
use crate::domain::{ItemKey, Passage};
use crate::edits::{EditOutcome, EditStore};
use crate::error::CheckerError;
use crate::export::{export_document, ExportArtifact};
use crate::loader::{load_document, LoadedDocument};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Empty,
  Loaded,
  Editing,
}

/// A user action. Offsets in `SetEdit` are raw text as typed.
#[derive(Clone, Debug)]
pub enum Action {
  LoadDocument { bytes: Vec<u8>, source: Option<String> },
  LoadValue { document: Value, source: Option<String> },
  SelectPassage(usize),
  SetEdit { item: ItemKey, start: String, stop: String },
  ResetEdit(ItemKey),
  ResetAllEdits,
  SelectItem(Option<ItemKey>),
  FilterGroup(Option<String>),
}

impl Action {
  pub fn name(&self) -> &'static str {
    match self {
      Action::LoadDocument { .. } => "load_document",
      Action::LoadValue { .. } => "load_value",
      Action::SelectPassage(_) => "select_passage",
      Action::SetEdit { .. } => "set_edit",
      Action::ResetEdit(_) => "reset_edit",
      Action::ResetAllEdits => "reset_all_edits",
      Action::SelectItem(_) => "select_item",
      Action::FilterGroup(_) => "filter_group",
    }
  }
}

#[derive(Clone, Debug, Default)]
pub struct Session {
  document: Option<Arc<LoadedDocument>>,
  passage_index: usize,
  edits: EditStore,
  active_item: Option<ItemKey>,
  group_filter: Option<String>,
  exports: u32,
}

impl Session {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn phase(&self) -> Phase {
    match (&self.document, self.edits.is_empty()) {
      (None, _) => Phase::Empty,
      (Some(_), true) => Phase::Loaded,
      (Some(_), false) => Phase::Editing,
    }
  }

  pub fn document(&self) -> Option<&LoadedDocument> {
    self.document.as_deref()
  }

  pub fn passage_index(&self) -> usize {
    self.passage_index
  }

  /// The selected passage, if a document with at least one passage is loaded.
  pub fn passage(&self) -> Option<&Passage> {
    self.document()?.document().passages.get(self.passage_index)
  }

  pub fn edits(&self) -> &EditStore {
    &self.edits
  }

  pub fn active_item(&self) -> Option<&ItemKey> {
    self.active_item.as_ref()
  }

  pub fn group_filter(&self) -> Option<&str> {
    self.group_filter.as_deref()
  }

  /// How many exports this session has produced.
  pub fn exports(&self) -> u32 {
    self.exports
  }

  #[instrument(level = "debug", skip_all, fields(action = action.name()))]
  pub fn apply(&self, action: Action) -> Result<Session, CheckerError> {
    match action {
      Action::LoadDocument { bytes, source } => {
        let loaded = load_document(&bytes, source.as_deref())?;
        Ok(Self::loaded(loaded))
      }
      Action::LoadValue { document, source } => {
        Ok(Self::loaded(LoadedDocument::from_value(document, source)))
      }
      Action::SelectPassage(index) => {
        let doc = self.document.as_ref().ok_or(CheckerError::NoDocument)?;
        let count = doc.document().passages.len();
        if index >= count {
          return Err(CheckerError::PassageOutOfRange { index, count });
        }
        if !self.edits.is_empty() {
          info!(target: "session", discarded = self.edits.len(), "Passage switch discards pending edits");
        }
        Ok(Session {
          document: Some(doc.clone()),
          passage_index: index,
          exports: self.exports,
          ..Session::default()
        })
      }
      Action::SetEdit { item, start, stop } => {
        self.require_item(&item)?;
        let mut next = self.clone();
        match next.edits.set_edit(item.clone(), &start, &stop) {
          EditOutcome::Stored(e) => debug!(target: "session", %item, start = e.start, stop = e.stop, "Edit stored"),
          EditOutcome::Cleared => debug!(target: "session", %item, "Non-numeric edit input; reverted to original"),
        }
        Ok(next)
      }
      Action::ResetEdit(item) => {
        self.require_item(&item)?;
        let mut next = self.clone();
        next.edits.reset(&item);
        Ok(next)
      }
      Action::ResetAllEdits => {
        self.require_document()?;
        let mut next = self.clone();
        next.edits.clear();
        Ok(next)
      }
      Action::SelectItem(item) => {
        if let Some(key) = &item {
          self.require_item(key)?;
        } else {
          self.require_document()?;
        }
        Ok(Session { active_item: item, ..self.clone() })
      }
      Action::FilterGroup(group) => {
        let passage = self.require_document()?;
        if let Some(g) = &group {
          if !passage.is_some_and(|p| p.has_group(g)) {
            return Err(CheckerError::UnknownGroup(g.clone()));
          }
        }
        Ok(Session { group_filter: group, ..self.clone() })
      }
    }
  }

  /// Render the patched document. Edits stay in place; the returned session
  /// only differs in its export count.
  pub fn export(&self, cfg: &ExportConfig) -> Result<(Session, ExportArtifact), CheckerError> {
    let doc = self.document().ok_or(CheckerError::NoDocument)?;
    let artifact = export_document(doc, self.passage_index, &self.edits, cfg)?;
    let next = Session { exports: self.exports + 1, ..self.clone() };
    Ok((next, artifact))
  }

  fn loaded(doc: LoadedDocument) -> Session {
    Session { document: Some(Arc::new(doc)), ..Session::default() }
  }

  fn require_document(&self) -> Result<Option<&Passage>, CheckerError> {
    if self.document.is_none() {
      return Err(CheckerError::NoDocument);
    }
    Ok(self.passage())
  }

  fn require_item(&self, key: &ItemKey) -> Result<(), CheckerError> {
    let passage = self.require_document()?;
    match passage.and_then(|p| p.find_item(key)) {
      Some(_) => Ok(()),
      None => Err(CheckerError::UnknownItem(key.clone())),
    }
  }
}
