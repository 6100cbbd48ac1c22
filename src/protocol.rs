//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::report::PassageReport;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    LoadDocument {
        document: Value,
        #[serde(default)]
        source: Option<String>,
    },
    SelectPassage {
        index: usize,
    },
    SetEdit {
        item: String,
        start: Value,
        stop: Value,
    },
    ResetEdit {
        item: String,
    },
    ResetAllEdits,
    SelectItem {
        #[serde(default)]
        item: Option<String>,
    },
    FilterGroup {
        #[serde(default)]
        group_id: Option<String>,
    },
    Report,
    Export,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Report {
        report: PassageReport,
    },
    Export {
        file_name: String,
        patched_items: usize,
        document: Value,
    },
    Error {
        code: String,
        message: String,
    },
}

/// Edit bounds arrive as whatever the input box held: a number, a string, or nothing.
/// Normalize to text so the edit store applies one parsing rule to all of them.
pub fn edit_input_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct SessionCreatedOut {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    /// Original file name, echoed back in reports.
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PassageIn {
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct EditIn {
    #[serde(default)]
    pub start: Value,
    #[serde(default)]
    pub stop: Value,
}

#[derive(Debug, Deserialize)]
pub struct SelectIn {
    #[serde(default)]
    pub item: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FilterIn {
    #[serde(default)]
    pub group_id: Option<String>,
}
