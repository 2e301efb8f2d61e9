//! OpenAPI parsing for load-test generation
//!
//! This crate turns an OpenAPI 3 document into the renderer-ready
//! [`LoadTestModel`](openapi2locust_common::LoadTestModel):
//!
//! - [`openapi`] loads and validates the document and resolves `$ref`s
//! - [`auth`] picks the security scheme the script sets up
//! - [`synthesizer`] builds sample payloads from schemas
//! - [`endpoints`] assembles one task descriptor per operation
//!
//! ## Usage
//! ```rust,ignore
//! use openapi2locust_common::GenerationConfig;
//! use openapi2locust_parser::parse_file;
//!
//! let model = parse_file("petstore.yaml", &GenerationConfig::default())?;
//! println!("{} tasks", model.endpoints.len());
//! ```

pub mod auth;
pub mod endpoints;
pub mod faker;
pub mod naming;
pub mod openapi;
pub mod synthesizer;

pub use auth::AuthAnalyzer;
pub use endpoints::EndpointBuilder;
pub use faker::{FakeData, LocaleFaker};
pub use openapi::OpenApiParser;
pub use synthesizer::DataSynthesizer;

use openapi2locust_common::{GenerationConfig, LoadTestModel, Result};
use std::path::Path;

/// Load a document from disk and build its load-test model
pub fn parse_file<P: AsRef<Path>>(path: P, config: &GenerationConfig) -> Result<LoadTestModel> {
    OpenApiParser::from_file(path)?.build_model(config)
}
