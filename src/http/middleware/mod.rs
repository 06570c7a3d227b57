//! Request-processing pipeline.
//!
//! Handlers share one shape (request in, response out), and the four stages
//! in [`stages`] each wrap a handler in another handler of the same shape.
//! [`chain`] declares the two fixed stage orderings every route is
//! registered through.

pub mod chain;
pub mod stages;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;

pub use chain::{ChainBuilder, Stage, COMPRESSING_STAGES, PLAIN_STAGES};

/// Boxed future a handler resolves to.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// A composable request handler. Stages take one and return one.
pub type BoxedHandler = Arc<dyn Fn(Request<Body>) -> HandlerFuture + Send + Sync>;

/// Box an async closure into a [`BoxedHandler`].
pub fn handler<F, Fut>(f: F) -> BoxedHandler
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req| Box::pin(f(req)))
}
