//! Common types and utilities for openapi2locust
//!
//! This crate contains the error taxonomy, the generation configuration and
//! the renderer-ready load-test model shared by the parser, generator and
//! CLI components.

pub mod config;
mod model;

pub use config::{
    ConfigOverride, FakerConfig, FakerOverride, GenerationConfig, TemplateOverride,
    TemplateToggles,
};
pub use model::*;

use thiserror::Error;

/// Errors that can occur while generating a load-test script
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// The input document is not well-formed YAML/JSON
    #[error("Spec parse error: {0}")]
    SpecParse(String),

    /// The document parsed but is not a usable OpenAPI 3 document
    #[error("Spec validation error: {0}")]
    SpecValidation(String),

    /// A `$ref` could not be followed
    #[error("Schema resolution error: {0}")]
    SchemaResolution(String),

    /// The configuration override is malformed or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Template rendering failed
    #[error("Render error: {0}")]
    Render(String),

    /// The requested output filename is unsafe or malformed
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;
