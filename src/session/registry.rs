//! Workbench session registry.
//!
//! A workbench session is created per index-page load and identified by a
//! generated numeric `sid`. The registry supports concurrent creation,
//! lookup by `sid`, and lookup by username (one user may hold several
//! concurrent sessions across tabs and devices). A background sweeper
//! reclaims sessions idle past a configured threshold; lookups of a swept
//! `sid` simply return `None`.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use rand::Rng;
use serde::Serialize;

/// Ephemeral application session bound to one HTTP session.
#[derive(Debug, Clone, Serialize)]
pub struct WorkbenchSession {
    /// Generated numeric identifier.
    pub sid: String,
    /// Owning username.
    pub username: String,
    /// Identifier of the originating HTTP session. Not rendered into pages.
    #[serde(skip)]
    pub http_session_id: String,
    /// Creation time, unix seconds.
    pub created_at: u64,
    /// Last-activity time, unix seconds.
    pub last_active_at: u64,
    /// Serialized editor state, updated by the session subsystem.
    pub content: String,
}

/// Concurrent registry of live workbench sessions, keyed by `sid`.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, WorkbenchSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a session for `username`, bound to the given
    /// HTTP session. The `sid` is drawn from a CSPRNG; the registry guards
    /// against the (vanishingly unlikely) collision by re-drawing.
    pub fn create(&self, http_session_id: &str, username: &str) -> WorkbenchSession {
        loop {
            let sid = rand::thread_rng().gen::<u64>().to_string();
            let entry = self.sessions.entry(sid.clone());
            if let dashmap::mapref::entry::Entry::Vacant(vacant) = entry {
                let now = now_unix();
                let session = WorkbenchSession {
                    sid,
                    username: username.to_string(),
                    http_session_id: http_session_id.to_string(),
                    created_at: now,
                    last_active_at: now,
                    content: String::new(),
                };
                vacant.insert(session.clone());
                return session;
            }
        }
    }

    /// Look up a session by identifier.
    pub fn get(&self, sid: &str) -> Option<WorkbenchSession> {
        self.sessions.get(sid).map(|s| s.clone())
    }

    /// All live sessions owned by a username.
    pub fn by_username(&self, username: &str) -> Vec<WorkbenchSession> {
        self.sessions
            .iter()
            .filter(|s| s.username == username)
            .map(|s| s.clone())
            .collect()
    }

    /// Record activity on a session.
    pub fn touch(&self, sid: &str) {
        if let Some(mut session) = self.sessions.get_mut(sid) {
            session.last_active_at = now_unix();
        }
    }

    /// Replace a session's saved editor state. Returns false when the
    /// session is gone.
    pub fn update_content(&self, sid: &str, content: &str) -> bool {
        match self.sessions.get_mut(sid) {
            Some(mut session) => {
                session.content = content.to_string();
                session.last_active_at = now_unix();
                true
            }
            None => false,
        }
    }

    /// Remove a session.
    pub fn remove(&self, sid: &str) -> Option<WorkbenchSession> {
        self.sessions.remove(sid).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle longer than `idle_max`; returns how many went.
    pub fn sweep(&self, idle_max: Duration) -> usize {
        let cutoff = now_unix().saturating_sub(idle_max.as_secs());
        let before = self.sessions.len();
        self.sessions.retain(|sid, session| {
            let keep = session.last_active_at >= cutoff;
            if !keep {
                tracing::info!(sid = %sid, username = %session.username, "reclaiming idle workbench session");
            }
            keep
        });
        before - self.sessions.len()
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Periodically reclaim idle sessions.
pub fn spawn_sweeper(
    registry: Arc<SessionRegistry>,
    interval: Duration,
    idle_max: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately
        loop {
            ticker.tick().await;
            let swept = registry.sweep(idle_max);
            if swept > 0 {
                tracing::info!(swept, remaining = registry.len(), "session sweep complete");
            }
        }
    })
}

/// Periodically log registry statistics (the `--stat` flag).
pub fn spawn_reporter(
    registry: Arc<SessionRegistry>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            tracing::info!(sessions = registry.len(), "session statistics");
        }
    })
}
