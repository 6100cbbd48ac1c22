//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - applying an action to a session and rendering the fresh report
//!   - exporting a session's patched document
//!   - the same two operations against sessions held in `AppState`

use tracing::{info, instrument, warn};

use crate::config::CheckerConfig;
use crate::error::CheckerError;
use crate::export::ExportArtifact;
use crate::report::{build_report, PassageReport};
use crate::routes::error::ApiError;
use crate::session::{Action, Session};
use crate::state::AppState;

/// Apply one action and report on the resulting session.
pub fn step(session: &Session, action: Action, cfg: &CheckerConfig) -> Result<(Session, PassageReport), CheckerError> {
  let next = session.apply(action)?;
  let report = build_report(&next, &cfg.highlight);
  Ok((next, report))
}

pub fn export_step(session: &Session, cfg: &CheckerConfig) -> Result<(Session, ExportArtifact), CheckerError> {
  session.export(&cfg.export)
}

#[instrument(level = "info", skip(state, action), fields(%session_id, action = action.name()))]
pub async fn apply_action(state: &AppState, session_id: &str, action: Action) -> Result<PassageReport, ApiError> {
  let cfg = state.config.clone();
  let result = state
    .update(session_id, |s| step(s, action, &cfg))
    .await
    .ok_or_else(|| ApiError::session_not_found(session_id))?;
  match result {
    Ok(report) => {
      info!(target: "session", %session_id, phase = ?report.phase, pending_edits = report.pending_edits, "Action applied");
      Ok(report)
    }
    Err(e) => {
      warn!(target: "session", %session_id, code = e.code(), error = %e, "Action rejected");
      Err(e.into())
    }
  }
}

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn session_report(state: &AppState, session_id: &str) -> Result<PassageReport, ApiError> {
  let session = state
    .get_session(session_id)
    .await
    .ok_or_else(|| ApiError::session_not_found(session_id))?;
  Ok(build_report(&session, &state.config.highlight))
}

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn export_session(state: &AppState, session_id: &str) -> Result<ExportArtifact, ApiError> {
  let cfg = state.config.clone();
  let artifact = state
    .update(session_id, |s| export_step(s, &cfg))
    .await
    .ok_or_else(|| ApiError::session_not_found(session_id))??;
  info!(target: "session", %session_id, file_name = %artifact.file_name, patched = artifact.patched_items, "Session exported");
  Ok(artifact)
}
