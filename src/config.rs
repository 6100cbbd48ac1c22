//! Loading service configuration from TOML.
//!
//! Every section and field is optional; see the `Default` impls for fallbacks.
//!
//! ```toml
//! [server]
//! static_dir = "./static"
//! max_upload_bytes = 8388608
//! session_limit = 256
//!
//! [export]
//! file_prefix = "patched_"
//! fallback_stem = "passage"
//! indent = 2
//!
//! [highlight]
//! priority = "active_then_number"   # or "number"
//! excerpt_chars = 80
//! ```

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct CheckerConfig {
  pub server: ServerConfig,
  pub export: ExportConfig,
  pub highlight: HighlightConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  /// Directory served as the SPA fallback.
  pub static_dir: String,
  /// Upper bound for a document upload body.
  pub max_upload_bytes: usize,
  /// Sessions kept in memory before the oldest is evicted.
  pub session_limit: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      static_dir: "./static".into(),
      max_upload_bytes: 8 * 1024 * 1024,
      session_limit: 256,
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
  pub file_prefix: String,
  /// File stem used when the passage has no usable id.
  pub fallback_stem: String,
  /// Spaces per indentation level in the exported JSON.
  pub indent: usize,
}

impl Default for ExportConfig {
  fn default() -> Self {
    Self {
      file_prefix: "patched_".into(),
      fallback_stem: "passage".into(),
      indent: 2,
    }
  }
}

/// Which item owns a highlight when spans overlap.
#[derive(Clone, Copy, Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HighlightPriority {
  /// Selected item first, then lowest item number, then encounter order.
  #[default]
  ActiveThenNumber,
  /// Lowest item number, then encounter order; selection does not matter.
  Number,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
  pub priority: HighlightPriority,
  /// Max chars of span text echoed back per item.
  pub excerpt_chars: usize,
}

impl Default for HighlightConfig {
  fn default() -> Self {
    Self { priority: HighlightPriority::default(), excerpt_chars: 80 }
  }
}

pub fn parse_config(s: &str) -> Result<CheckerConfig, toml::de::Error> {
  toml::from_str::<CheckerConfig>(s)
}

/// Attempt to load `CheckerConfig` from CHECKER_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<CheckerConfig> {
  let path = std::env::var("CHECKER_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "index_checker", %path, "Loaded checker config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "index_checker", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "index_checker", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
