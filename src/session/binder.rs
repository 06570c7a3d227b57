//! Session-binding protocol used by the page handlers.
//!
//! Every authenticated page starts here: resolve the HTTP session from the
//! request cookie, redirect to login when there is none (or when the session
//! points at a user the configuration no longer knows), otherwise refresh
//! the cookie's expiry and hand the handler an authenticated identity. Only
//! the index page additionally opens a new workbench session.

use std::sync::Arc;

use axum::http::header::LOCATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::config::{ServerConfig, User};
use crate::session::registry::{SessionRegistry, WorkbenchSession};
use crate::session::store::{HttpSessionStore, ResolvedSession, SESSION_COOKIE};

/// Identity of an authenticated page request, plus the refreshed session
/// cookie the response must carry.
#[derive(Debug, Clone)]
pub struct AuthedRequest {
    pub http_session_id: String,
    pub username: String,
    pub user: User,
    pub locale: String,
    /// `Set-Cookie` value extending the session to the configured max-age,
    /// scoped to the context root.
    pub set_cookie: String,
}

/// Binds HTTP sessions to page requests and workbench sessions.
pub struct SessionBinder {
    config: Arc<ServerConfig>,
    http_sessions: Arc<HttpSessionStore>,
    registry: Arc<SessionRegistry>,
}

impl SessionBinder {
    pub fn new(
        config: Arc<ServerConfig>,
        http_sessions: Arc<HttpSessionStore>,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            config,
            http_sessions,
            registry,
        }
    }

    /// Resolve and refresh the request's HTTP session.
    ///
    /// `Err` carries the ready-made redirect to `<context-root>/login`; no
    /// workbench session is created and no further model fields should be
    /// computed by the caller.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthedRequest, Response> {
        let (id, username) = match self.http_sessions.resolve(headers) {
            ResolvedSession::Existing { id, username } => (id, username),
            ResolvedSession::New => return Err(self.redirect_to_login()),
        };

        let Some(user) = self.config.user(&username) else {
            // Stale session data: the session outlived the user record.
            tracing::warn!(username = %username, "no user record for session, redirecting to login");
            return Err(self.redirect_to_login());
        };

        let set_cookie = format!(
            "{SESSION_COOKIE}={id}; Max-Age={}; Path={}; HttpOnly",
            self.config.http_session_max_age,
            self.config.cookie_path(),
        );

        Ok(AuthedRequest {
            http_session_id: id,
            username,
            locale: user.locale.clone(),
            user: user.clone(),
            set_cookie,
        })
    }

    /// Open a fresh workbench session for an authenticated index request.
    pub fn open_session(&self, auth: &AuthedRequest) -> WorkbenchSession {
        self.registry.create(&auth.http_session_id, &auth.username)
    }

    fn redirect_to_login(&self) -> Response {
        (StatusCode::FOUND, [(LOCATION, self.config.login_url())]).into_response()
    }
}
