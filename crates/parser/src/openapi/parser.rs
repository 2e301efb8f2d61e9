//! OpenAPI spec file loader and validator

use super::types::OpenApiSpec;
use crate::endpoints::EndpointBuilder;
use openapi2locust_common::{GenerationConfig, GeneratorError, LoadTestModel, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Base URL used when the document declares no usable server
pub const DEFAULT_BASE_URL: &str = "http://localhost";

/// Serialization format of a spec document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Json,
    Yaml,
}

impl SpecFormat {
    /// `.json` files are JSON, everything else is treated as YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SpecFormat::Json,
            _ => SpecFormat::Yaml,
        }
    }
}

/// OpenAPI specification parser
///
/// Holds both the raw document tree and its typed form. Construction fails
/// unless the document is well-formed and has the minimal OpenAPI 3 shape.
#[derive(Debug, Clone)]
pub struct OpenApiParser {
    /// Raw document, used for pointer lookups during validation
    document: serde_json::Value,

    /// Typed view of the document
    spec: OpenApiSpec,

    /// File name of the source (e.g. "petstore.yaml")
    source_name: String,
}

impl OpenApiParser {
    /// Load an OpenAPI spec from a YAML or JSON file
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = OpenApiParser::from_file("petstore.yaml")?;
    /// println!("{} operations", parser.spec().operation_count());
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            GeneratorError::SpecParse(format!(
                "Failed to read OpenAPI file {}: {}",
                path.display(),
                e
            ))
        })?;

        let source_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("openapi")
            .to_string();

        Self::parse_str(&content, SpecFormat::from_path(path), &source_name)
    }

    /// Parse an OpenAPI spec from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Self::parse_str(json, SpecFormat::Json, "openapi.json")
    }

    /// Parse an OpenAPI spec from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::parse_str(yaml, SpecFormat::Yaml, "openapi.yaml")
    }

    /// Parse and validate a document in the given format
    pub fn parse_str(content: &str, format: SpecFormat, source_name: &str) -> Result<Self> {
        let document: serde_json::Value = match format {
            SpecFormat::Json => serde_json::from_str(content).map_err(|e| {
                GeneratorError::SpecParse(format!("Failed to parse OpenAPI JSON: {}", e))
            })?,
            SpecFormat::Yaml => serde_yaml::from_str(content).map_err(|e| {
                GeneratorError::SpecParse(format!("Failed to parse OpenAPI YAML: {}", e))
            })?,
        };

        validate_document(&document)?;

        let spec: OpenApiSpec = serde_json::from_value(document.clone()).map_err(|e| {
            GeneratorError::SpecValidation(format!("Invalid OpenAPI structure: {}", e))
        })?;

        debug!(
            source = source_name,
            paths = spec.paths.len(),
            operations = spec.operation_count(),
            "Loaded OpenAPI document"
        );

        Ok(Self {
            document,
            spec,
            source_name: source_name.to_string(),
        })
    }

    /// Get reference to the typed OpenAPI spec
    pub fn spec(&self) -> &OpenApiSpec {
        &self.spec
    }

    /// Get reference to the raw document tree
    pub fn document(&self) -> &serde_json::Value {
        &self.document
    }

    /// File name of the source document
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Base URL from the first server, defaulting to [`DEFAULT_BASE_URL`]
    ///
    /// Relative server URLs are anchored at the default host; anything that
    /// is not plain http(s) is dropped.
    pub fn base_url(&self) -> String {
        let Some(server) = self.spec.servers.first() else {
            return DEFAULT_BASE_URL.to_string();
        };

        let url = server.expanded_url();
        let url = url.trim_end_matches('/');

        if url.starts_with("http://") || url.starts_with("https://") {
            if url.contains(['{', '}']) || url.chars().any(char::is_control) {
                warn!("Server URL {} has unresolved placeholders, using default", url);
                return DEFAULT_BASE_URL.to_string();
            }
            url.to_string()
        } else if url.starts_with('/') || url.is_empty() {
            format!("{}{}", DEFAULT_BASE_URL, url)
        } else {
            warn!("Unsupported server URL {}, using {}", url, DEFAULT_BASE_URL);
            DEFAULT_BASE_URL.to_string()
        }
    }

    /// Build the renderer-ready model for this document
    pub fn build_model(&self, config: &GenerationConfig) -> Result<LoadTestModel> {
        EndpointBuilder::new(self, config).build()
    }
}

/// Check the minimal OpenAPI 3 shape on the raw tree
pub fn validate_document(document: &serde_json::Value) -> Result<()> {
    let root = document.as_object().ok_or_else(|| {
        GeneratorError::SpecValidation("OpenAPI document must be a mapping".to_string())
    })?;

    let version = root
        .get("openapi")
        .ok_or_else(|| {
            GeneratorError::SpecValidation("Missing required field 'openapi'".to_string())
        })?
        .as_str()
        .ok_or_else(|| {
            GeneratorError::SpecValidation("Field 'openapi' must be a string".to_string())
        })?;

    if !version.starts_with("3.") {
        return Err(GeneratorError::SpecValidation(format!(
            "Unsupported OpenAPI version: {}. Only 3.x documents are supported.",
            version
        )));
    }

    let paths = root
        .get("paths")
        .ok_or_else(|| {
            GeneratorError::SpecValidation("Missing required field 'paths'".to_string())
        })?
        .as_object()
        .ok_or_else(|| {
            GeneratorError::SpecValidation("Field 'paths' must be a mapping".to_string())
        })?;

    if let Some(bad) = paths.keys().find(|path| !path.starts_with('/')) {
        return Err(GeneratorError::SpecValidation(format!(
            "Path '{}' must start with '/'",
            bad
        )));
    }

    if let Some(components) = root.get("components") {
        let mut references = Vec::new();
        collect_references(components, &mut references);

        for reference in references {
            let target = reference
                .strip_prefix('#')
                .filter(|pointer| pointer.starts_with('/'))
                .and_then(|pointer| document.pointer(pointer));
            if target.is_none() {
                return Err(GeneratorError::SpecValidation(format!(
                    "Unresolvable reference in components: {}",
                    reference
                )));
            }
        }
    }

    Ok(())
}

/// Gather every `$ref` string below `value`
fn collect_references<'a>(value: &'a serde_json::Value, out: &mut Vec<&'a str>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                match (key.as_str(), child) {
                    ("$ref", serde_json::Value::String(reference)) => out.push(reference),
                    _ => collect_references(child, out),
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        _ => {}
    }
}
