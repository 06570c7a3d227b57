//! HTTP server setup.
//!
//! # Responsibilities
//! - Build shared application state from the loaded configuration
//! - Register the page routes through the two pipeline entry points
//! - Serve static assets and per-user workspace files
//! - Offer the `merge` seam the IDE subsystems register their endpoints on
//! - Bind the server to a listener and serve with graceful shutdown

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::routing::{any, MethodRouter};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::http::middleware::{BoxedHandler, ChainBuilder};
use crate::http::{pages, workspace};
use crate::i18n::Catalog;
use crate::render::{HandlebarsRenderer, Render, RenderError};
use crate::session::{HttpSessionStore, SessionBinder, SessionRegistry};

/// Shared state every handler and stage hangs off.
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub catalog: Arc<Catalog>,
    pub http_sessions: Arc<HttpSessionStore>,
    pub registry: Arc<SessionRegistry>,
    pub renderer: Arc<dyn Render>,
    pub binder: SessionBinder,
}

impl AppState {
    /// Wire up the collaborator subsystems from configuration.
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, RenderError> {
        let config = Arc::new(config);
        let catalog = Arc::new(Catalog::new(&config.locales_dir, &config.default_locale));
        let http_sessions = Arc::new(HttpSessionStore::new());
        let registry = Arc::new(SessionRegistry::new());
        let renderer: Arc<dyn Render> =
            Arc::new(HandlebarsRenderer::from_dir(Path::new(&config.views_dir))?);
        let binder = SessionBinder::new(config.clone(), http_sessions.clone(), registry.clone());

        Ok(Arc::new(Self {
            config,
            catalog,
            http_sessions,
            registry,
            renderer,
            binder,
        }))
    }
}

/// Adapt a composed pipeline into a routable service.
pub fn into_service(chain: BoxedHandler) -> MethodRouter {
    any(move |req: Request<Body>| {
        let chain = chain.clone();
        async move { chain(req).await }
    })
}

/// The development environment's HTTP server.
pub struct HttpServer {
    router: Router,
    config: Arc<ServerConfig>,
}

impl HttpServer {
    /// Create a server with the page, static, and workspace routes
    /// registered under the configured context root.
    pub fn new(state: Arc<AppState>) -> Self {
        let config = state.config.clone();
        let router = Self::build_router(&state);
        Self { router, config }
    }

    fn build_router(state: &Arc<AppState>) -> Router {
        let chains = ChainBuilder::new(state.catalog.clone());
        let ctx = state.config.context.clone();
        let index_path = if ctx.is_empty() {
            "/".to_string()
        } else {
            format!("{ctx}/")
        };

        Router::new()
            // IDE pages; index is the only compressing route, everything
            // else goes through the plain pipeline.
            .route(
                &index_path,
                into_service(chains.compressing(pages::index(state.clone()))),
            )
            .route(
                &format!("{ctx}/start"),
                into_service(chains.plain(pages::start(state.clone()))),
            )
            .route(
                &format!("{ctx}/about"),
                into_service(chains.plain(pages::about(state.clone()))),
            )
            .route(
                &format!("{ctx}/keyboard_shortcuts"),
                into_service(chains.plain(pages::keyboard_shortcuts(state.clone()))),
            )
            .route(
                &format!("{ctx}/login"),
                into_service(chains.plain(pages::login(state.clone()))),
            )
            // Per-user workspaces, resolved per request.
            .route(
                &format!("{ctx}/workspace/{{user}}/{{*path}}"),
                into_service(chains.plain(workspace::workspace(state.clone()))),
            )
            // Static resources.
            .nest_service(
                &format!("{ctx}/static"),
                ServeDir::new(&state.config.static_dir),
            )
            .route_service(
                "/favicon.ico",
                ServeFile::new(Path::new(&state.config.static_dir).join("favicon.ico")),
            )
            .layer(TraceLayer::new_for_http())
    }

    /// Merge routes registered by the IDE subsystems (editor, file tree,
    /// shell, output, notifications). Subsystems compose their handlers
    /// through their own [`ChainBuilder`] before handing routes over.
    pub fn merge(mut self, other: Router) -> Self {
        self.router = self.router.merge(other);
        self
    }

    /// Serve until shutdown is signalled.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            context = %self.config.context,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        return;
    }
    tracing::info!("Shutdown signal received");
}
