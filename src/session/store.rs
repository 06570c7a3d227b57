//! Cookie-bound HTTP session store.

use std::time::SystemTime;

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use dashmap::DashMap;
use uuid::Uuid;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "atelier-session";

#[derive(Debug, Clone)]
struct HttpSessionRecord {
    username: String,
    #[allow(dead_code)]
    created_at: SystemTime,
}

/// Outcome of resolving a request's session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSession {
    /// The cookie referenced a live session.
    Existing { id: String, username: String },
    /// No cookie, or a cookie pointing at nothing; the caller decides
    /// whether that means a redirect to login.
    New,
}

/// In-process store of HTTP sessions, keyed by cookie value.
///
/// Concurrent by construction; every request task may resolve and create
/// sessions simultaneously.
#[derive(Default)]
pub struct HttpSessionStore {
    records: DashMap<String, HttpSessionRecord>,
}

impl HttpSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a session for an authenticated username and return its id.
    /// Called by the login subsystem after credential verification.
    pub fn create(&self, username: &str) -> String {
        let id = Uuid::new_v4().to_string();
        self.records.insert(
            id.clone(),
            HttpSessionRecord {
                username: username.to_string(),
                created_at: SystemTime::now(),
            },
        );
        id
    }

    /// Resolve the session referenced by the request's cookie, if any.
    pub fn resolve(&self, headers: &HeaderMap) -> ResolvedSession {
        let Some(id) = cookie_value(headers, SESSION_COOKIE) else {
            return ResolvedSession::New;
        };
        match self.records.get(&id) {
            Some(record) => ResolvedSession::Existing {
                id,
                username: record.username.clone(),
            },
            None => ResolvedSession::New,
        }
    }

    /// Drop a session (logout).
    pub fn remove(&self, id: &str) {
        self.records.remove(id);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Extract a cookie value from the `Cookie` header(s).
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            if let Some((key, val)) = pair.split_once('=') {
                if key.trim() == name {
                    return Some(val.trim().to_string());
                }
            }
        }
    }
    None
}
