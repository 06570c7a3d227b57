//! Shared harness for the integration tests: fixture directories, a running
//! server on an ephemeral port, and a client that does not follow redirects
//! or negotiate compression on its own.

// Each test binary uses a different subset of the harness.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use atelier::config::{ServerConfig, User};
use atelier::{AppState, HttpServer};
use axum::Router;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub struct TestApp {
    pub addr: SocketAddr,
    pub state: Arc<AppState>,
    // Keeps the fixture directories alive for the test's lifetime.
    pub dir: TempDir,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Log a user in the way the login subsystem would, returning the
    /// `Cookie` header value for subsequent requests.
    pub fn login(&self, username: &str) -> String {
        let id = self.state.http_sessions.create(username);
        format!("atelier-session={id}")
    }

    pub fn locales_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("locales")
    }
}

/// Routes merged into the server the way the IDE subsystems register
/// theirs, built against the shared state before the server starts.
pub type ExtraRoutes = Box<dyn FnOnce(&Arc<AppState>) -> Router>;

/// Start a server over fresh fixture directories. Each name in `usernames`
/// becomes a registered `en_US` user with a workspace directory under the
/// fixture root.
pub async fn spawn(context: &str, usernames: &[&str], extra: Option<ExtraRoutes>) -> TestApp {
    let users: Vec<(&str, &str)> = usernames.iter().map(|name| (*name, "en_US")).collect();
    spawn_localized(context, &users, extra).await
}

/// Like [`spawn`], with an explicit locale per user.
pub async fn spawn_localized(
    context: &str,
    usernames: &[(&str, &str)],
    extra: Option<ExtraRoutes>,
) -> TestApp {
    let dir = tempfile::tempdir().expect("create fixture dir");

    let views = dir.path().join("views");
    std::fs::create_dir(&views).expect("create views dir");
    std::fs::write(
        views.join("index.hbs"),
        "index sid={{session.sid}};user={{user.name}};locale={{locale}};\
         greeting={{i18n.greeting}};ver={{ver}};sep={{pathSeparator}};\
         latest={{latestSessionContent}};themes={{#each editorThemes}}{{this}},{{/each}}",
    )
    .expect("write index template");
    std::fs::write(
        views.join("start.hbs"),
        "start user={{username}};ws={{workspace}};\
         session={{#if session}}{{session.sid}}{{else}}none{{/if}}",
    )
    .expect("write start template");
    std::fs::write(
        views.join("about.hbs"),
        "about ver={{ver}};os={{os}};arch={{arch}};greeting={{i18n.greeting}}",
    )
    .expect("write about template");
    std::fs::write(
        views.join("keyboard_shortcuts.hbs"),
        "shortcuts locale={{locale}}",
    )
    .expect("write shortcuts template");
    std::fs::write(views.join("login.hbs"), "login greeting={{i18n.greeting}}")
        .expect("write login template");

    let locales = dir.path().join("locales");
    std::fs::create_dir(&locales).expect("create locales dir");
    std::fs::write(locales.join("en_US.json"), r#"{"greeting": "Hello"}"#)
        .expect("write en_US catalog");
    std::fs::write(locales.join("zh_CN.json"), r#"{"greeting": "你好"}"#)
        .expect("write zh_CN catalog");

    let statics = dir.path().join("static");
    std::fs::create_dir(&statics).expect("create static dir");
    std::fs::write(statics.join("atelier.css"), "body { margin: 0; }")
        .expect("write static asset");

    let users = usernames
        .iter()
        .map(|(name, locale)| {
            let workspace = dir.path().join("workspaces").join(name);
            std::fs::create_dir_all(&workspace).expect("create workspace dir");
            User {
                name: name.to_string(),
                locale: locale.to_string(),
                workspace: workspace.to_string_lossy().into_owned(),
                latest_session_content: String::new(),
            }
        })
        .collect();

    let config = ServerConfig {
        context: context.to_string(),
        views_dir: views.to_string_lossy().into_owned(),
        locales_dir: locales.to_string_lossy().into_owned(),
        static_dir: statics.to_string_lossy().into_owned(),
        users,
        ..ServerConfig::default()
    };

    let state = AppState::new(config).expect("build app state");
    state.catalog.reload().expect("load locale catalogs");

    let mut server = HttpServer::new(state.clone());
    if let Some(build) = extra {
        server = server.merge(build(&state));
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        server.run(listener).await.expect("server run");
    });

    TestApp { addr, state, dir }
}

/// Client that leaves redirects and content negotiation to the tests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("build client")
}

/// Pull `key=<value>;` out of a rendered fixture template body.
pub fn field<'a>(body: &'a str, key: &str) -> &'a str {
    let start = body
        .find(&format!("{key}="))
        .unwrap_or_else(|| panic!("no field {key} in body: {body}"))
        + key.len()
        + 1;
    let rest = &body[start..];
    &rest[..rest.find(';').unwrap_or(rest.len())]
}
