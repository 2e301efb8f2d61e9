//! Renderer-ready load-test model
//!
//! The parser builds these types from an OpenAPI document; the generator
//! feeds them into the script template. They are plain data and implement
//! `Serialize` so tera can walk them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP methods an OpenAPI path item can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    /// All methods, in the order operations are visited within a path item
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Trace,
    ];

    /// Upper-case wire name (e.g. "GET")
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a request body sample is sent by the generated script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyEncoding {
    /// `json=` keyword
    Json,
    /// `data=` keyword, form-encoded
    Form,
    /// `files=` keyword, one part per field
    Multipart,
    /// Any other media type, sent as-is
    Raw,
}

/// Sample request body for one endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBodySample {
    /// Media type the sample was built for
    pub content_type: String,
    pub encoding: BodyEncoding,
    /// The synthesized (or example) payload
    pub value: serde_json::Value,
    /// Multipart fields sent as file uploads (`format: binary`)
    #[serde(default)]
    pub file_fields: Vec<String>,
}

/// Status codes a task accepts as success
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusExpectation {
    /// Sorted, de-duplicated numeric codes from `responses`
    pub codes: Vec<u16>,
    /// Set when the document only declares non-numeric keys (`default`, `2XX`)
    pub wildcard: bool,
}

/// Shape check applied to a successful response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseValidation {
    /// Body must be a JSON object carrying these keys
    Object { required: Vec<String> },
    /// Body must be a JSON array
    Array,
    /// Body must parse as JSON
    Json,
}

/// Normalized, renderer-ready representation of one operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// Python method name, unique within the run
    pub task_name: String,
    pub method: HttpMethod,
    /// Path template as written in the document (e.g. `/users/{id}`)
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub deprecated: bool,
    /// Path parameter name -> stringified sample
    pub path_params: IndexMap<String, String>,
    /// Required query parameter name -> sample
    pub query_params: IndexMap<String, serde_json::Value>,
    /// Required header name -> sample
    pub headers: IndexMap<String, String>,
    /// Required cookie name -> sample
    pub cookies: IndexMap<String, String>,
    pub request_body: Option<RequestBodySample>,
    pub expected_status: StatusExpectation,
    pub response_validation: Option<ResponseValidation>,
    pub weight: u32,
    /// Whether the selected auth scheme covers this operation
    pub uses_auth: bool,
}

impl EndpointDescriptor {
    /// Stats label used by the load-testing framework (e.g. `GET /users/{id}`)
    pub fn display_name(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Where an API key travels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialLocation {
    Header,
    Query,
    Cookie,
}

/// Supported authentication scheme kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum AuthKind {
    ApiKey {
        /// Header, query parameter or cookie name
        param_name: String,
        location: CredentialLocation,
    },
    Bearer {
        bearer_format: Option<String>,
    },
    Basic,
    #[serde(rename = "oauth2")]
    OAuth2 {
        token_url: Option<String>,
        scopes: Vec<String>,
    },
    #[serde(rename = "openid_connect")]
    OpenIdConnect {
        discovery_url: Option<String>,
    },
}

impl AuthKind {
    /// Lower value wins when several schemes are in use
    pub fn precedence(&self) -> u8 {
        match self {
            AuthKind::ApiKey { .. } => 0,
            AuthKind::Bearer { .. } => 1,
            AuthKind::Basic => 2,
            AuthKind::OAuth2 { .. } => 3,
            AuthKind::OpenIdConnect { .. } => 4,
        }
    }

    /// Short human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            AuthKind::ApiKey { .. } => "API key",
            AuthKind::Bearer { .. } => "HTTP bearer",
            AuthKind::Basic => "HTTP basic",
            AuthKind::OAuth2 { .. } => "OAuth2",
            AuthKind::OpenIdConnect { .. } => "OpenID Connect",
        }
    }
}

/// A declared scheme that was not picked for setup code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnselectedScheme {
    pub name: String,
    pub kind: String,
}

/// Normalized authentication setup for the generated script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthDescriptor {
    /// Name under `components.securitySchemes`
    pub scheme_name: String,
    pub kind: AuthKind,
    /// Environment variables the generated script reads
    pub env_vars: Vec<String>,
    /// Setup instructions, one line each
    pub instructions: Vec<String>,
    pub unselected: Vec<UnselectedScheme>,
}

/// An operation that could not be turned into a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEndpoint {
    pub method: HttpMethod,
    pub path: String,
    pub reason: String,
}

/// Aggregate model handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadTestModel {
    /// `info.title`
    pub title: String,
    /// `info.version`
    pub version: String,
    pub description: Option<String>,
    pub base_url: String,
    /// Python class name of the generated `HttpUser`
    pub class_name: String,
    /// File name of the source document
    pub source_name: String,
    pub auth: Option<AuthDescriptor>,
    pub endpoints: Vec<EndpointDescriptor>,
    #[serde(default)]
    pub skipped: Vec<SkippedEndpoint>,
}

impl LoadTestModel {
    /// Look up an endpoint by its generated task name
    pub fn endpoint(&self, task_name: &str) -> Option<&EndpointDescriptor> {
        self.endpoints.iter().find(|e| e.task_name == task_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_serializes_upper_case() {
        let json = serde_json::to_string(&HttpMethod::Delete).unwrap();
        assert_eq!(json, "\"DELETE\"");
        assert_eq!(HttpMethod::Options.to_string(), "OPTIONS");
    }

    #[test]
    fn test_auth_precedence_order() {
        let api_key = AuthKind::ApiKey {
            param_name: "X-API-Key".to_string(),
            location: CredentialLocation::Header,
        };
        let bearer = AuthKind::Bearer { bearer_format: None };
        let oidc = AuthKind::OpenIdConnect { discovery_url: None };

        assert!(api_key.precedence() < bearer.precedence());
        assert!(bearer.precedence() < AuthKind::Basic.precedence());
        assert!(AuthKind::Basic.precedence() < oidc.precedence());
    }

    #[test]
    fn test_auth_kind_tagging() {
        let kind = AuthKind::OAuth2 {
            token_url: None,
            scopes: vec!["read".to_string()],
        };
        let value = serde_json::to_value(&kind).unwrap();
        assert_eq!(value["scheme"], "oauth2");
        assert_eq!(value["scopes"][0], "read");
    }

    #[test]
    fn test_response_validation_tagging() {
        let rule = ResponseValidation::Object {
            required: vec!["id".to_string()],
        };
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["kind"], "object");
    }
}
