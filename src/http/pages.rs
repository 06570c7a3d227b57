//! Page handlers: index, start, about, keyboard shortcuts, login.
//!
//! Every handler except login goes through the session binder first; the
//! handlers themselves only assemble the render model and hand it to the
//! template seam. Render failures surface as a 500 carrying the error text.

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderValue, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};

use crate::http::middleware::{handler, BoxedHandler};
use crate::http::server::AppState;
use crate::render::Model;
use crate::session::AuthedRequest;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Index page: authenticates, opens a fresh workbench session, renders the
/// IDE shell.
pub fn index(state: Arc<AppState>) -> BoxedHandler {
    handler(move |req: Request<Body>| {
        let state = state.clone();
        async move {
            let auth = match state.binder.authenticate(req.headers()) {
                Ok(auth) => auth,
                Err(redirect) => return redirect,
            };

            let session = state.binder.open_session(&auth);
            let open = state.registry.by_username(&auth.username).len();
            tracing::debug!(username = %auth.username, sessions = open, "workbench session opened");

            let mut model = base_model(&state, &auth);
            model.insert("session".to_string(), to_json(&session));
            model.insert(
                "latestSessionContent".to_string(),
                json!(auth.user.latest_session_content),
            );
            model.insert("user".to_string(), to_json(&auth.user));
            model.insert(
                "pathSeparator".to_string(),
                json!(std::path::MAIN_SEPARATOR.to_string()),
            );
            model.insert("ver".to_string(), json!(VERSION));
            model.insert(
                "editorThemes".to_string(),
                json!(state.config.editor_themes),
            );

            render_page(&state, "index", &model, Some(&auth.set_cookie))
        }
    })
}

/// Start page: requires an existing workbench session named by the `sid`
/// query parameter. A missing parameter is a caller error answered with an
/// explicit 400; an unknown `sid` is logged and rendered with a null
/// session, which the templates treat defensively.
pub fn start(state: Arc<AppState>) -> BoxedHandler {
    handler(move |req: Request<Body>| {
        let state = state.clone();
        async move {
            let auth = match state.binder.authenticate(req.headers()) {
                Ok(auth) => auth,
                Err(redirect) => return redirect,
            };

            let Some(sid) = query_param(req.uri(), "sid") else {
                tracing::warn!(username = %auth.username, "start page requested without sid");
                return (
                    StatusCode::BAD_REQUEST,
                    "missing required query parameter: sid",
                )
                    .into_response();
            };

            // A revisit counts as activity against the sweeper.
            state.registry.touch(&sid);
            let session = state.registry.get(&sid);
            if session.is_none() {
                tracing::error!(sid = %sid, "workbench session not found");
            }

            let mut model = base_model(&state, &auth);
            model.insert("username".to_string(), json!(auth.username));
            model.insert("workspace".to_string(), json!(auth.user.workspace));
            model.insert("ver".to_string(), json!(VERSION));
            model.insert(
                "session".to_string(),
                session.as_ref().map(to_json).unwrap_or(Value::Null),
            );

            render_page(&state, "start", &model, Some(&auth.set_cookie))
        }
    })
}

/// About page.
pub fn about(state: Arc<AppState>) -> BoxedHandler {
    handler(move |req: Request<Body>| {
        let state = state.clone();
        async move {
            let auth = match state.binder.authenticate(req.headers()) {
                Ok(auth) => auth,
                Err(redirect) => return redirect,
            };

            let mut model = base_model(&state, &auth);
            model.insert("ver".to_string(), json!(VERSION));
            model.insert("os".to_string(), json!(std::env::consts::OS));
            model.insert("arch".to_string(), json!(std::env::consts::ARCH));

            render_page(&state, "about", &model, Some(&auth.set_cookie))
        }
    })
}

/// Keyboard shortcuts reference page.
pub fn keyboard_shortcuts(state: Arc<AppState>) -> BoxedHandler {
    handler(move |req: Request<Body>| {
        let state = state.clone();
        async move {
            let auth = match state.binder.authenticate(req.headers()) {
                Ok(auth) => auth,
                Err(redirect) => return redirect,
            };
            let model = base_model(&state, &auth);
            render_page(&state, "keyboard_shortcuts", &model, Some(&auth.set_cookie))
        }
    })
}

/// Login page. Render-only: credential verification belongs to the session
/// subsystem, but the redirect target has to exist here.
pub fn login(state: Arc<AppState>) -> BoxedHandler {
    handler(move |_req: Request<Body>| {
        let state = state.clone();
        async move {
            let locale = &state.config.default_locale;
            let mut model = Model::new();
            model.insert("conf".to_string(), to_json(state.config.as_ref()));
            model.insert("i18n".to_string(), to_json(&*state.catalog.messages(locale)));
            model.insert("locale".to_string(), json!(locale));
            render_page(&state, "login", &model, None)
        }
    })
}

/// Model fields common to every authenticated page: configuration,
/// localized strings for the user's locale, and the locale itself.
fn base_model(state: &AppState, auth: &AuthedRequest) -> Model {
    let mut model = Model::new();
    model.insert("conf".to_string(), to_json(state.config.as_ref()));
    model.insert(
        "i18n".to_string(),
        to_json(&*state.catalog.messages(&auth.locale)),
    );
    model.insert("locale".to_string(), json!(auth.locale));
    model
}

fn render_page(
    state: &AppState,
    template: &str,
    model: &Model,
    set_cookie: Option<&str>,
) -> Response {
    let html = match state.renderer.render(template, model) {
        Ok(html) => html,
        Err(e) => {
            tracing::error!(template = %template, error = %e, "template render failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    let mut response = Response::new(Body::from(html));
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    if let Some(cookie) = set_cookie {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                response.headers_mut().insert(SET_COOKIE, value);
            }
            Err(e) => tracing::error!(error = %e, "dropping malformed session cookie"),
        }
    }
    response
}

/// First value of a query parameter, percent-decoded.
fn query_param(uri: &Uri, name: &str) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
