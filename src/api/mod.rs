pub mod models;
pub mod routes;

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;
use uuid::Uuid;

use crate::chat::ChatSession;
use crate::config::AppConfig;
use crate::llm::LlmProvider;

/// Largest timeout `chrono::Duration::seconds` accepts.
const MAX_IDLE_SECS: u64 = (i64::MAX / 1_000) as u64;

pub type SharedSession = Arc<tokio::sync::Mutex<ChatSession>>;

pub struct SessionEntry {
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub session: SharedSession,
}

/// In-memory sessions for the HTTP shell, one per browser/client. A session
/// processes one interaction at a time; its lock is held for the whole call.
///
/// Sessions leave on DELETE or, once idle for `server.session_idle_secs`,
/// at the next sweep. Sweeps run whenever a session is created.
pub struct SessionRegistry {
    config: AppConfig,
    llm: Arc<dyn LlmProvider>,
    idle_timeout: Duration,
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new(config: AppConfig, llm: Arc<dyn LlmProvider>) -> Self {
        let idle_secs = config.server.session_idle_secs.min(MAX_IDLE_SECS);
        Self {
            idle_timeout: Duration::seconds(idle_secs as i64),
            config,
            llm,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<Uuid, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create(&self) -> (Uuid, DateTime<Utc>, SharedSession) {
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        self.evict_idle(created_at);

        let session = Arc::new(tokio::sync::Mutex::new(ChatSession::from_config(
            &self.config,
            self.llm.clone(),
        )));
        self.sessions().insert(
            id,
            SessionEntry {
                created_at,
                last_active: created_at,
                session: session.clone(),
            },
        );
        (id, created_at, session)
    }

    /// Looks a session up and marks it active.
    pub fn get(&self, id: Uuid) -> Option<(DateTime<Utc>, SharedSession)> {
        let mut sessions = self.sessions();
        let entry = sessions.get_mut(&id)?;
        entry.last_active = Utc::now();
        Some((entry.created_at, entry.session.clone()))
    }

    /// Drops sessions idle since before `now - idle_timeout`. Requests already
    /// holding a session keep it until they finish.
    pub fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions();
        let before = sessions.len();
        sessions.retain(|_, entry| now.signed_duration_since(entry.last_active) <= self.idle_timeout);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {} idle session(s)", evicted);
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.sessions().remove(&id).is_some()
    }
}
