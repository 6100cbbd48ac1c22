//! Error responses: `{"ok": false, "error": {"code", "message"}}` with a fitting status.

use axum::{
  extract::{
    rejection::{BytesRejection, JsonRejection},
    FromRequest,
  },
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;

use crate::error::CheckerError;

#[derive(Debug)]
pub struct ApiError {
  pub status: StatusCode,
  pub code: &'static str,
  pub message: String,
}

impl ApiError {
  pub fn session_not_found(id: &str) -> Self {
    Self {
      status: StatusCode::NOT_FOUND,
      code: "session_not_found",
      message: format!("unknown session: {}", id),
    }
  }
}

/// `Json` extractor whose rejections come back in the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl ApiError {
  /// Extractor rejections: an over-limit body keeps 413, everything else is a 400.
  fn rejected(status: StatusCode, message: String) -> Self {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
      Self { status, code: "payload_too_large", message }
    } else {
      Self { status: StatusCode::BAD_REQUEST, code: "invalid_body", message }
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self {
    Self::rejected(r.status(), r.body_text())
  }
}

impl From<BytesRejection> for ApiError {
  fn from(r: BytesRejection) -> Self {
    Self::rejected(r.status(), r.body_text())
  }
}

impl From<CheckerError> for ApiError {
  fn from(e: CheckerError) -> Self {
    let status = match &e {
      CheckerError::Parse(_) | CheckerError::PassageOutOfRange { .. } => StatusCode::BAD_REQUEST,
      CheckerError::UnknownItem(_) | CheckerError::UnknownGroup(_) => StatusCode::NOT_FOUND,
      CheckerError::NoDocument => StatusCode::CONFLICT,
      CheckerError::Render(_) | CheckerError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    Self { status, code: e.code(), message: e.to_string() }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let body = json!({
      "ok": false,
      "error": { "code": self.code, "message": self.message },
    });
    (self.status, Json(body)).into_response()
  }
}
