//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs the session id plus basic result info.

use std::sync::Arc;

use axum::{
  body::Bytes,
  extract::{rejection::BytesRejection, Path, Query, State},
  http::{header, StatusCode},
  response::IntoResponse,
  Json,
};
use tracing::{debug, info, instrument};

use crate::domain::ItemKey;
use crate::logic::{apply_action, export_session, session_report};
use crate::protocol::*;
use crate::report::PassageReport;
use crate::routes::error::{ApiError, ApiJson};
use crate::session::Action;
use crate::state::AppState;

type ReportResult = Result<Json<PassageReport>, ApiError>;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let session_id = state.create_session().await;
  (StatusCode::CREATED, Json(SessionCreatedOut { session_id }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_session(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ReportResult {
  Ok(Json(session_report(&state, &id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<HealthOut>, ApiError> {
  if state.remove_session(&id).await {
    info!(target: "session", %id, "Session closed");
    Ok(Json(HealthOut { ok: true }))
  } else {
    Err(ApiError::session_not_found(&id))
  }
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_document(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Query(q): Query<DocumentQuery>,
  body: Result<Bytes, BytesRejection>,
) -> ReportResult {
  let body = body?;
  debug!(target: "index_checker", %id, bytes = body.len(), "Document upload received");
  let action = Action::LoadDocument { bytes: body.to_vec(), source: q.source };
  Ok(Json(apply_action(&state, &id, action).await?))
}

#[instrument(level = "info", skip(state), fields(index = body.index))]
pub async fn http_post_passage(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  ApiJson(body): ApiJson<PassageIn>,
) -> ReportResult {
  Ok(Json(apply_action(&state, &id, Action::SelectPassage(body.index)).await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_put_edit(
  State(state): State<Arc<AppState>>,
  Path((id, item)): Path<(String, String)>,
  ApiJson(body): ApiJson<EditIn>,
) -> ReportResult {
  let action = Action::SetEdit {
    item: ItemKey::new(item),
    start: edit_input_text(&body.start),
    stop: edit_input_text(&body.stop),
  };
  Ok(Json(apply_action(&state, &id, action).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_edit(
  State(state): State<Arc<AppState>>,
  Path((id, item)): Path<(String, String)>,
) -> ReportResult {
  Ok(Json(apply_action(&state, &id, Action::ResetEdit(ItemKey::new(item))).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_all_edits(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ReportResult {
  Ok(Json(apply_action(&state, &id, Action::ResetAllEdits).await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_select(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  ApiJson(body): ApiJson<SelectIn>,
) -> ReportResult {
  let action = Action::SelectItem(body.item.map(ItemKey::new));
  Ok(Json(apply_action(&state, &id, action).await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_filter(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  ApiJson(body): ApiJson<FilterIn>,
) -> ReportResult {
  Ok(Json(apply_action(&state, &id, Action::FilterGroup(body.group_id)).await?))
}

/// Patched document as a file download.
#[instrument(level = "info", skip(state))]
pub async fn http_get_export(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  let artifact = export_session(&state, &id).await?;
  let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
  Ok((
    [
      (header::CONTENT_TYPE, "application/json".to_string()),
      (header::CONTENT_DISPOSITION, disposition),
    ],
    artifact.body,
  ))
}
