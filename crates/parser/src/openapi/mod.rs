//! OpenAPI 3 specification loading
//!
//! Parses OpenAPI 3.x documents (YAML or JSON) into a raw tree plus a typed
//! model, validates the minimal shape, and resolves `$ref` pointers into the
//! `components` section.
//!
//! ## Usage
//! ```rust,ignore
//! use openapi2locust_parser::openapi::OpenApiParser;
//!
//! let parser = OpenApiParser::from_file("petstore.yaml")?;
//! let model = parser.build_model(&GenerationConfig::default())?;
//! ```

mod parser;
mod resolver;
mod summary;
mod types;

pub use parser::{validate_document, OpenApiParser, SpecFormat, DEFAULT_BASE_URL};
pub use resolver::{component_name, Component};
pub use summary::{OperationSummary, ServerSummary, SpecSummary};
pub use types::*;
