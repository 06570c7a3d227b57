//! Configuration management.
//!
//! Submodules:
//! - `schema`: configuration structure definitions
//! - `loader`: loading and CLI-override application
//! - `validation`: semantic validation beyond deserialization

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{is_temp_cwd, load_config, ConfigError, Overrides};
pub use schema::{ServerConfig, User};
