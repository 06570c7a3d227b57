//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Command-line overrides applied on top of the loaded file, mirroring the
/// process entry flags.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub ip: Option<String>,
    pub port: Option<u16>,
    pub server: Option<String>,
    pub static_server: Option<String>,
    pub context: Option<String>,
    pub channel: Option<String>,
    pub docker: bool,
}

impl Overrides {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(server) = &self.server {
            config.server = server.clone();
        } else {
            // --ip / --port rewrite the corresponding half of the bind
            // address.
            let (host, port) = config
                .server
                .rsplit_once(':')
                .map(|(h, p)| (h.to_string(), p.to_string()))
                .unwrap_or_else(|| (config.server.clone(), "7070".to_string()));
            let host = self.ip.clone().unwrap_or(host);
            let port = self.port.map(|p| p.to_string()).unwrap_or(port);
            config.server = format!("{host}:{port}");
        }
        if let Some(static_server) = &self.static_server {
            config.static_server = static_server.clone();
        }
        if let Some(context) = &self.context {
            config.context = context.clone();
        }
        if let Some(channel) = &self.channel {
            config.channel = channel.clone();
        }
        if self.docker {
            config.docker = true;
        }
    }
}

/// Whether a working directory sits under the OS temp directory. Workspaces
/// placed there vanish on reboot, so startup refuses such a location.
pub fn is_temp_cwd(cwd: &Path) -> bool {
    cwd.starts_with(std::env::temp_dir())
}

/// Load a configuration file, apply CLI overrides, and validate the result.
pub fn load_config(path: &Path, overrides: &Overrides) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: ServerConfig = toml::from_str(&content)?;

    overrides.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
