//! OpenAPI 3 type definitions
//!
//! Simplified representation covering what load-test generation needs.
//! Maps are `IndexMap` so paths, properties and responses keep document order.

use indexmap::IndexMap;
use openapi2locust_common::HttpMethod;
use serde::{Deserialize, Serialize};

/// Either an inline object or a `$ref` to one under `components`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    /// Reference (e.g. `#/components/schemas/Pet`)
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },

    /// Inline definition
    Item(T),
}

impl<T> RefOr<T> {
    /// The reference string, if this is a `$ref`
    pub fn reference(&self) -> Option<&str> {
        match self {
            RefOr::Ref { reference } => Some(reference),
            RefOr::Item(_) => None,
        }
    }
}

/// Security requirement: scheme name -> scopes
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// OpenAPI document root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiSpec {
    /// OpenAPI version (e.g., "3.0.0")
    pub openapi: String,

    /// API metadata
    #[serde(default)]
    pub info: Info,

    /// Servers
    #[serde(default)]
    pub servers: Vec<Server>,

    /// API paths (endpoints)
    pub paths: IndexMap<String, PathItem>,

    /// Reusable components
    #[serde(default)]
    pub components: Option<Components>,

    /// Global security requirements
    #[serde(default)]
    pub security: Option<Vec<SecurityRequirement>>,
}

/// API information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub url: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Substitutions for `{name}` placeholders in `url`
    #[serde(default)]
    pub variables: IndexMap<String, ServerVariable>,
}

/// Server URL template variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerVariable {
    pub default: String,

    #[serde(rename = "enum")]
    #[serde(default)]
    pub enum_values: Vec<String>,
}

impl Server {
    /// URL with every declared variable replaced by its default
    pub fn expanded_url(&self) -> String {
        self.variables
            .iter()
            .fold(self.url.clone(), |url, (name, variable)| {
                url.replace(&format!("{{{}}}", name), &variable.default)
            })
    }
}

/// Path item (operations for a path)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub get: Option<Operation>,

    #[serde(default)]
    pub post: Option<Operation>,

    #[serde(default)]
    pub put: Option<Operation>,

    #[serde(default)]
    pub patch: Option<Operation>,

    #[serde(default)]
    pub delete: Option<Operation>,

    #[serde(default)]
    pub head: Option<Operation>,

    #[serde(default)]
    pub options: Option<Operation>,

    #[serde(default)]
    pub trace: Option<Operation>,

    /// Parameters shared by every operation on this path
    #[serde(default)]
    pub parameters: Vec<RefOr<Parameter>>,
}

impl PathItem {
    /// Operation declared for `method`, if any
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
        }
    }

    /// Declared operations in visiting order
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        HttpMethod::ALL
            .into_iter()
            .filter_map(move |method| self.operation(method).map(|op| (method, op)))
    }
}

/// HTTP operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId")]
    #[serde(default)]
    pub operation_id: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub deprecated: bool,

    #[serde(default)]
    pub parameters: Vec<RefOr<Parameter>>,

    #[serde(rename = "requestBody")]
    #[serde(default)]
    pub request_body: Option<RefOr<RequestBody>>,

    /// Status code (or `default`, `2XX`) -> response
    #[serde(default)]
    pub responses: IndexMap<String, RefOr<Response>>,

    /// Overrides the global requirements when present (`[]` opts out)
    #[serde(default)]
    pub security: Option<Vec<SecurityRequirement>>,
}

/// Parameter location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

/// Parameter definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParameterLocation,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub schema: Option<RefOr<Schema>>,

    #[serde(default)]
    pub example: Option<serde_json::Value>,
}

/// Request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub content: IndexMap<String, MediaType>,

    #[serde(default)]
    pub required: bool,
}

/// Response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

/// Media type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(default)]
    pub schema: Option<RefOr<Schema>>,

    #[serde(default)]
    pub example: Option<serde_json::Value>,
}

/// Schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Type: string, number, integer, boolean, array, object
    ///
    /// OpenAPI 3.1 type lists (`[string, "null"]`) collapse to their first
    /// non-null entry.
    #[serde(rename = "type")]
    #[serde(default, deserialize_with = "deserialize_schema_type")]
    pub schema_type: Option<String>,

    /// Format (e.g., int32, email, date-time)
    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub example: Option<serde_json::Value>,

    #[serde(default)]
    pub default: Option<serde_json::Value>,

    #[serde(rename = "enum")]
    #[serde(default)]
    pub enum_values: Vec<serde_json::Value>,

    /// Properties (for object type)
    #[serde(default)]
    pub properties: IndexMap<String, RefOr<Schema>>,

    #[serde(default)]
    pub required: Vec<String>,

    /// Items schema (for array type)
    #[serde(default)]
    pub items: Option<Box<RefOr<Schema>>>,

    #[serde(rename = "allOf")]
    #[serde(default)]
    pub all_of: Vec<RefOr<Schema>>,

    #[serde(rename = "oneOf")]
    #[serde(default)]
    pub one_of: Vec<RefOr<Schema>>,

    #[serde(rename = "anyOf")]
    #[serde(default)]
    pub any_of: Vec<RefOr<Schema>>,

    #[serde(default)]
    pub minimum: Option<f64>,

    #[serde(default)]
    pub maximum: Option<f64>,

    #[serde(rename = "minLength")]
    #[serde(default)]
    pub min_length: Option<usize>,

    #[serde(rename = "maxLength")]
    #[serde(default)]
    pub max_length: Option<usize>,

    #[serde(default)]
    pub nullable: bool,
}

/// Reusable components
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, RefOr<Schema>>,

    #[serde(default)]
    pub parameters: IndexMap<String, RefOr<Parameter>>,

    #[serde(rename = "requestBodies")]
    #[serde(default)]
    pub request_bodies: IndexMap<String, RefOr<RequestBody>>,

    #[serde(default)]
    pub responses: IndexMap<String, RefOr<Response>>,

    /// Kept untyped so one malformed scheme cannot fail the whole document
    #[serde(rename = "securitySchemes")]
    #[serde(default)]
    pub security_schemes: IndexMap<String, serde_json::Value>,
}

fn deserialize_schema_type<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TypeField {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<TypeField>::deserialize(deserializer)? {
        Some(TypeField::One(t)) => Some(t),
        Some(TypeField::Many(types)) => types.into_iter().find(|t| t != "null"),
        None => None,
    })
}

impl OpenApiSpec {
    /// Security schemes declared under `components`
    pub fn security_schemes(&self) -> Option<&IndexMap<String, serde_json::Value>> {
        self.components.as_ref().map(|c| &c.security_schemes)
    }

    /// Number of (path, method) pairs
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(|item| item.operations().count()).sum()
    }
}
