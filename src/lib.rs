//! Index Checker · passage/answer span alignment service
//!
//! Loads a reading-test document (passages → groups → items → answer spans),
//! reports which spans are broken, partitions the passage text into highlight
//! segments, keeps span edits in an overlay and exports the patched document.

pub mod config;
pub mod domain;
pub mod edits;
pub mod error;
pub mod export;
pub mod flatten;
pub mod loader;
pub mod logic;
pub mod partition;
pub mod protocol;
pub mod ranges;
pub mod report;
pub mod routes;
pub mod session;
pub mod state;
pub mod telemetry;
pub mod util;
