//! Session management.
//!
//! Two layers, mirroring the protocol the page handlers bind through:
//!
//! - [`store::HttpSessionStore`]: cookie-bound HTTP sessions carrying the
//!   authenticated username (authentication itself is owned by the login
//!   subsystem; this store only persists the result).
//! - [`registry::SessionRegistry`]: ephemeral workbench sessions layered on
//!   top of an HTTP session, one per page load, identified by a generated
//!   numeric `sid` and reclaimed by a background sweeper when idle.

pub mod binder;
pub mod registry;
pub mod store;

pub use binder::{AuthedRequest, SessionBinder};
pub use registry::{SessionRegistry, WorkbenchSession};
pub use store::{HttpSessionStore, ResolvedSession, SESSION_COOKIE};
