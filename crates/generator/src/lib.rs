//! Locust script generation
//!
//! This crate renders a [`LoadTestModel`] into a Python Locust script and
//! handles placing that script safely on disk.

pub mod output;
mod templates;

pub use output::{default_filename, resolve_output_path, validate_filename, write_script};
pub use templates::{escape_py_comment, escape_py_str, py_ident, py_literal};

use openapi2locust_common::{
    AuthKind, CredentialLocation, GenerationConfig, GeneratorError, LoadTestModel, Result,
};
use tera::Tera;
use tracing::debug;

/// Script renderer
///
/// Holds the loaded template; rendering is pure and performs no I/O.
pub struct LocustRenderer {
    tera: Tera,
}

impl LocustRenderer {
    /// Create a renderer with the embedded template
    pub fn new() -> Result<Self> {
        let tera = templates::load_templates()?;
        Ok(Self { tera })
    }

    /// Render the script text for `model`
    pub fn render(&self, model: &LoadTestModel, config: &GenerationConfig) -> Result<String> {
        let context = self.create_context(model, config);
        let script = self
            .tera
            .render(templates::LOCUSTFILE_TEMPLATE, &context)
            .map_err(|e| GeneratorError::Render(format!("Template error: {:?}", e)))?;

        debug!(
            bytes = script.len(),
            tasks = model.endpoints.len(),
            "Rendered locust script"
        );
        Ok(script)
    }

    /// Create template context from the model and configuration
    fn create_context(&self, model: &LoadTestModel, config: &GenerationConfig) -> tera::Context {
        let mut context = tera::Context::new();
        context.insert("model", model);
        context.insert("generator_version", env!("CARGO_PKG_VERSION"));
        context.insert("min_wait", &config.min_wait);
        context.insert("max_wait", &config.max_wait);
        context.insert("security_headers", &config.active_security_headers());
        context.insert(
            "include_test_data_helpers",
            &config.template.include_test_data_helpers,
        );

        let auth_kind = model.auth.as_ref().map(|auth| &auth.kind);
        context.insert("auth_label", &auth_kind.map(AuthKind::label));
        context.insert(
            "needs_base64",
            &matches!(auth_kind, Some(AuthKind::Basic)),
        );

        let query_api_key = match auth_kind {
            Some(AuthKind::ApiKey {
                param_name,
                location: CredentialLocation::Query,
            }) => Some(param_name.as_str()),
            _ => None,
        };
        context.insert("query_api_key", &query_api_key);

        context
    }
}

/// Render a model with a fresh renderer (convenience function)
pub fn render_script(model: &LoadTestModel, config: &GenerationConfig) -> Result<String> {
    LocustRenderer::new()?.render(model, config)
}
