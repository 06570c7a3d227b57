//! Atelier: browser-accessible, multi-user development environment server.
//!
//! This crate is the request-handling bootstrap: it accepts HTTP requests,
//! runs them through a fixed middleware pipeline (localization refresh,
//! latency logging, optional gzip negotiation, panic containment), binds the
//! cookie-backed HTTP session to an application-level workbench session, and
//! dispatches to the page handlers. The IDE subsystems themselves (editor,
//! file tree, shell, build output, notifications) register their endpoints
//! through the same pipeline via [`http::HttpServer::merge`].

pub mod config;
pub mod http;
pub mod i18n;
pub mod render;
pub mod session;

pub use config::ServerConfig;
pub use http::{AppState, HttpServer};
