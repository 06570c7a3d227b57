//! Template rendering seam.
//!
//! Page handlers assemble a [`Model`] and hand it to a [`Render`]
//! implementation together with a template name. Rendering itself is a
//! collaborator concern; the default implementation wraps a handlebars
//! registry sourced from the views directory.

use std::path::Path;

use handlebars::{DirectorySourceOptions, Handlebars};

/// Render model: symbolic key to arbitrary JSON value, assembled per
/// handler and consumed opaquely by the template engine.
pub type Model = serde_json::Map<String, serde_json::Value>;

/// Error type for template resolution and rendering.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template registry setup failed: {0}")]
    Setup(#[from] handlebars::TemplateError),
    #[error("render failed: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Narrow interface the page handlers render through.
pub trait Render: Send + Sync {
    /// Render the named template against the model.
    fn render(&self, template: &str, model: &Model) -> Result<String, RenderError>;
}

/// Handlebars-backed renderer over a directory of `.hbs` files; template
/// names are file stems.
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    /// Register every template under `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, RenderError> {
        let mut registry = Handlebars::new();
        registry.register_templates_directory(dir, DirectorySourceOptions::default())?;
        Ok(Self { registry })
    }
}

impl Render for HandlebarsRenderer {
    fn render(&self, template: &str, model: &Model) -> Result<String, RenderError> {
        Ok(self.registry.render(template, model)?)
    }
}
