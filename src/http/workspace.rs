//! Per-user workspace file serving.
//!
//! One wildcard route serves `/workspace/{user}/{path}` for every configured
//! user, resolving the user's workspace directory at request time. Users
//! added by a configuration reload are servable without re-registering
//! routes.

use std::path::{Component, Path};
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::middleware::{handler, BoxedHandler};
use crate::http::server::AppState;

pub fn workspace(state: Arc<AppState>) -> BoxedHandler {
    handler(move |req: Request<Body>| {
        let state = state.clone();
        async move {
            let path = req.uri().path();
            let path = path
                .strip_prefix(state.config.context.as_str())
                .unwrap_or(path);
            let Some(rest) = path.strip_prefix("/workspace/") else {
                return StatusCode::NOT_FOUND.into_response();
            };
            let Some((username, file_path)) = rest.split_once('/') else {
                return StatusCode::NOT_FOUND.into_response();
            };

            // Reject traversal out of the workspace root.
            let relative = Path::new(file_path);
            if relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
            {
                return (StatusCode::BAD_REQUEST, "invalid workspace path").into_response();
            }

            let Some(user) = state.config.user(username) else {
                tracing::warn!(username = %username, "workspace request for unknown user");
                return StatusCode::NOT_FOUND.into_response();
            };

            let full = Path::new(&user.workspace).join(relative);
            match tokio::fs::read(&full).await {
                Ok(bytes) => {
                    let mime = mime_guess::from_path(&full).first_or_octet_stream();
                    let mut response = Response::new(Body::from(bytes));
                    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
                        response.headers_mut().insert(CONTENT_TYPE, value);
                    }
                    response
                }
                Err(e) => {
                    tracing::debug!(path = %full.display(), error = %e, "workspace file not readable");
                    StatusCode::NOT_FOUND.into_response()
                }
            }
        }
    })
}
