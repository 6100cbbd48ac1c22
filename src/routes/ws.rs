//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.
//!
//! A connection owns a private session that lives exactly as long as the socket;
//! it is never shared with other connections or stored in `AppState`.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::config::CheckerConfig;
use crate::domain::ItemKey;
use crate::logic::{export_step, step};
use crate::protocol::{edit_input_text, ClientWsMessage, ServerWsMessage};
use crate::report::build_report;
use crate::session::{Action, Session};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "index_checker", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "index_checker", "WebSocket connected");
  let mut session = Session::new();
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "index_checker", kind = message_kind(&incoming), "WS received");
            let (next, reply) = handle_client_ws(incoming, &session, &state.config);
            session = next;
            reply
          }
          Err(e) => ServerWsMessage::Error { code: "invalid_message".into(), message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "code": "serialization", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "index_checker", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "index_checker", exports = session.exports(), "WebSocket disconnected");
}

/// Returns the session to keep plus the reply. Failed actions keep `session` as it was.
pub fn handle_client_ws(msg: ClientWsMessage, session: &Session, cfg: &CheckerConfig) -> (Session, ServerWsMessage) {
  let action = match msg {
    ClientWsMessage::Ping => return (session.clone(), ServerWsMessage::Pong),
    ClientWsMessage::Report => {
      let report = build_report(session, &cfg.highlight);
      return (session.clone(), ServerWsMessage::Report { report });
    }
    ClientWsMessage::Export => {
      return match export_step(session, cfg) {
        Ok((next, art)) => (
          next,
          ServerWsMessage::Export { file_name: art.file_name, patched_items: art.patched_items, document: art.document },
        ),
        Err(e) => (session.clone(), ServerWsMessage::Error { code: e.code().into(), message: e.to_string() }),
      };
    }
    ClientWsMessage::LoadDocument { document, source } => Action::LoadValue { document, source },
    ClientWsMessage::SelectPassage { index } => Action::SelectPassage(index),
    ClientWsMessage::SetEdit { item, start, stop } => Action::SetEdit {
      item: ItemKey::new(item),
      start: edit_input_text(&start),
      stop: edit_input_text(&stop),
    },
    ClientWsMessage::ResetEdit { item } => Action::ResetEdit(ItemKey::new(item)),
    ClientWsMessage::ResetAllEdits => Action::ResetAllEdits,
    ClientWsMessage::SelectItem { item } => Action::SelectItem(item.map(ItemKey::new)),
    ClientWsMessage::FilterGroup { group_id } => Action::FilterGroup(group_id),
  };

  match step(session, action, cfg) {
    Ok((next, report)) => (next, ServerWsMessage::Report { report }),
    Err(e) => {
      info!(target: "session", code = e.code(), error = %e, "WS action rejected");
      (session.clone(), ServerWsMessage::Error { code: e.code().into(), message: e.to_string() })
    }
  }
}

fn message_kind(m: &ClientWsMessage) -> &'static str {
  match m {
    ClientWsMessage::Ping => "ping",
    ClientWsMessage::LoadDocument { .. } => "load_document",
    ClientWsMessage::SelectPassage { .. } => "select_passage",
    ClientWsMessage::SetEdit { .. } => "set_edit",
    ClientWsMessage::ResetEdit { .. } => "reset_edit",
    ClientWsMessage::ResetAllEdits => "reset_all_edits",
    ClientWsMessage::SelectItem { .. } => "select_item",
    ClientWsMessage::FilterGroup { .. } => "filter_group",
    ClientWsMessage::Report => "report",
    ClientWsMessage::Export => "export",
  }
}
