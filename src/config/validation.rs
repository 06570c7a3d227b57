//! Semantic validation of loaded configuration.

use std::collections::HashSet;

use crate::config::schema::ServerConfig;

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("server bind address is empty")]
    EmptyServer,
    #[error("context root '{0}' must start with '/' and not end with '/'")]
    BadContext(String),
    #[error("duplicate user '{0}'")]
    DuplicateUser(String),
    #[error("user '{0}' has an empty workspace path")]
    EmptyWorkspace(String),
    #[error("http_session_max_age must be positive")]
    ZeroSessionMaxAge,
}

/// Check invariants the schema types cannot express. Returns every failure,
/// not just the first.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.is_empty() {
        errors.push(ValidationError::EmptyServer);
    }

    if !config.context.is_empty()
        && (!config.context.starts_with('/') || config.context.ends_with('/'))
    {
        errors.push(ValidationError::BadContext(config.context.clone()));
    }

    if config.http_session_max_age == 0 {
        errors.push(ValidationError::ZeroSessionMaxAge);
    }

    let mut seen = HashSet::new();
    for user in &config.users {
        if !seen.insert(user.name.as_str()) {
            errors.push(ValidationError::DuplicateUser(user.name.clone()));
        }
        if user.workspace.is_empty() {
            errors.push(ValidationError::EmptyWorkspace(user.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
