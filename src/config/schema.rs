//! Configuration schema definitions.
//!
//! All types derive Serde traits; the full configuration is also serialized
//! into the page render models (the `conf` key), so fields here are part of
//! the template-visible surface.

use serde::{Deserialize, Serialize};

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address, e.g. "127.0.0.1:7070". Externally visible host if no
    /// override is set.
    pub server: String,

    /// Host serving static assets; empty means same as `server`.
    pub static_server: String,

    /// Context root: URL path prefix under which all routes are mounted.
    /// Empty, or "/"-prefixed without a trailing slash (e.g. "/ide").
    pub context: String,

    /// Base address the browser uses for WebSocket channels opened by the
    /// IDE subsystems; handed to templates verbatim.
    pub channel: String,

    /// HTTP session cookie max-age in seconds.
    pub http_session_max_age: u64,

    /// Workbench sessions idle longer than this are reclaimed by the
    /// background sweeper.
    pub session_idle_max_secs: u64,

    /// Interval between sweeper runs.
    pub session_sweep_interval_secs: u64,

    /// Interval between statistics reports when `--stat` is set.
    pub stat_report_interval_secs: u64,

    /// Directory holding page templates (`*.hbs`).
    pub views_dir: String,

    /// Directory holding locale catalogs (`*.json`).
    pub locales_dir: String,

    /// Directory holding static assets.
    pub static_dir: String,

    /// Locale used when a user's locale has no catalog.
    pub default_locale: String,

    /// Editor color themes offered in the index page.
    pub editor_themes: Vec<String>,

    /// Whether the server runs inside a container.
    pub docker: bool,

    /// Registered users.
    pub users: Vec<User>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: "127.0.0.1:7070".to_string(),
            static_server: String::new(),
            context: String::new(),
            channel: "ws://127.0.0.1:7070".to_string(),
            http_session_max_age: 86_400,
            session_idle_max_secs: 30 * 60,
            session_sweep_interval_secs: 60,
            stat_report_interval_secs: 600,
            views_dir: "views".to_string(),
            locales_dir: "locales".to_string(),
            static_dir: "static".to_string(),
            default_locale: "en_US".to_string(),
            editor_themes: vec!["default".to_string(), "lesser-dark".to_string()],
            docker: false,
            users: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Look up a registered user by name.
    pub fn user(&self, name: &str) -> Option<&User> {
        self.users.iter().find(|u| u.name == name)
    }

    /// Cookie path scope: the context root when non-empty, otherwise "/".
    pub fn cookie_path(&self) -> &str {
        if self.context.is_empty() {
            "/"
        } else {
            &self.context
        }
    }

    /// Login URL under the context root; target of every unauthenticated
    /// redirect.
    pub fn login_url(&self) -> String {
        format!("{}/login", self.context)
    }
}

/// A registered user. Read-only here; account management belongs to the
/// session subsystem.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    /// Unique login name.
    pub name: String,

    /// Preferred locale, e.g. "en_US".
    #[serde(default = "default_user_locale")]
    pub locale: String,

    /// Absolute path of the user's workspace directory.
    pub workspace: String,

    /// Serialized editor state from the user's latest workbench session.
    #[serde(default)]
    pub latest_session_content: String,
}

fn default_user_locale() -> String {
    "en_US".to_string()
}
