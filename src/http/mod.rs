//! HTTP layer: the middleware pipeline, the compressing writer, page
//! handlers, and server assembly.

pub mod compress;
pub mod middleware;
pub mod pages;
pub mod server;
pub mod sniff;
pub mod workspace;

pub use middleware::{BoxedHandler, ChainBuilder};
pub use server::{into_service, AppState, HttpServer};
