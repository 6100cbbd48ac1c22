//! Application state: configuration plus the in-memory session store.
//!
//! Sessions live only in memory. Every update runs under the store's write lock,
//! so concurrent requests against one session are applied one after another and
//! never overwrite each other with stale values.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::{load_config_from_env, CheckerConfig};
use crate::session::Session;

#[derive(Default)]
struct SessionStore {
    by_id: HashMap<String, Session>,
    /// Creation order, oldest first; drives eviction.
    order: VecDeque<String>,
}

#[derive(Clone)]
pub struct AppState {
    sessions: Arc<RwLock<SessionStore>>,
    pub config: Arc<CheckerConfig>,
}

impl AppState {
    /// Build state from env: load config (or defaults).
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let config = load_config_from_env().unwrap_or_default();
        Self::with_config(config)
    }

    pub fn with_config(config: CheckerConfig) -> Self {
        info!(
            target: "index_checker",
            session_limit = config.server.session_limit,
            max_upload_bytes = config.server.max_upload_bytes,
            priority = ?config.highlight.priority,
            "Checker state initialized"
        );
        Self {
            sessions: Arc::new(RwLock::new(SessionStore::default())),
            config: Arc::new(config),
        }
    }

    /// Open a fresh empty session, evicting the oldest one if the store is full.
    #[instrument(level = "debug", skip(self))]
    pub async fn create_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let limit = self.config.server.session_limit.max(1);
        let mut store = self.sessions.write().await;
        while store.by_id.len() >= limit {
            let Some(oldest) = store.order.pop_front() else { break };
            if store.by_id.remove(&oldest).is_some() {
                warn!(target: "session", evicted = %oldest, "Session limit reached; evicted oldest session");
            }
        }
        store.by_id.insert(id.clone(), Session::new());
        store.order.push_back(id.clone());
        info!(target: "session", %id, open = store.by_id.len(), "Session created");
        id
    }

    /// Snapshot of a session by id.
    pub async fn get_session(&self, id: &str) -> Option<Session> {
        self.sessions.read().await.by_id.get(id).cloned()
    }

    pub async fn remove_session(&self, id: &str) -> bool {
        let mut store = self.sessions.write().await;
        store.order.retain(|s| s != id);
        store.by_id.remove(id).is_some()
    }

    /// Compute the next session from the current one and store it.
    /// `None` when the session does not exist. On `Err` the stored session is kept.
    pub async fn update<T, E>(
        &self,
        id: &str,
        step: impl FnOnce(&Session) -> Result<(Session, T), E>,
    ) -> Option<Result<T, E>> {
        let mut store = self.sessions.write().await;
        let result = {
            let current = store.by_id.get(id)?;
            step(current)
        };
        Some(result.map(|(next, out)| {
            store.by_id.insert(id.to_string(), next);
            out
        }))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_config(CheckerConfig::default())
    }
}
