//! Security scheme analysis
//!
//! Picks the one scheme the generated script sets up, and works out which
//! operations it covers.

use crate::naming::env_var_prefix;
use crate::openapi::{OpenApiSpec, Operation, SecurityRequirement};
use indexmap::IndexSet;
use openapi2locust_common::{AuthDescriptor, AuthKind, CredentialLocation, UnselectedScheme};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static SCHEME_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.-]{0,49}$").expect("Invalid regex"));

/// OAuth2 flows in the order a token URL is looked up
const OAUTH2_FLOWS: [&str; 4] = ["clientCredentials", "password", "authorizationCode", "implicit"];

/// Selects and describes the authentication setup for one document
pub struct AuthAnalyzer<'a> {
    spec: &'a OpenApiSpec,
}

impl<'a> AuthAnalyzer<'a> {
    pub fn new(spec: &'a OpenApiSpec) -> Self {
        Self { spec }
    }

    /// Choose the highest-precedence referenced scheme
    ///
    /// Returns `None` when nothing usable is both declared and referenced.
    pub fn analyze(&self) -> Option<AuthDescriptor> {
        let declared = self.spec.security_schemes()?;
        let referenced = self.referenced_schemes();

        let mut candidates: Vec<(usize, &String, AuthKind)> = Vec::new();
        let mut unselected = Vec::new();

        for (index, (name, definition)) in declared.iter().enumerate() {
            let Some(kind) = parse_scheme(name, definition) else {
                unselected.push(UnselectedScheme {
                    name: name.clone(),
                    kind: raw_type(definition),
                });
                continue;
            };

            if referenced.contains(name.as_str()) {
                candidates.push((index, name, kind));
            } else {
                debug!("Security scheme {} is declared but never required", name);
                unselected.push(UnselectedScheme {
                    name: name.clone(),
                    kind: kind.label().to_string(),
                });
            }
        }

        // Stable sort keeps declaration order among equal precedence
        candidates.sort_by_key(|(index, _, kind)| (kind.precedence(), *index));
        let mut candidates = candidates.into_iter();
        let (_, scheme_name, kind) = candidates.next()?;

        for (_, name, other) in candidates {
            unselected.push(UnselectedScheme {
                name: name.clone(),
                kind: other.label().to_string(),
            });
        }
        // Report the leftovers in declaration order
        unselected.sort_by_key(|scheme| declared.get_index_of(&scheme.name));

        let env_vars = env_vars(scheme_name, &kind);
        let instructions = instructions(&kind, &env_vars);

        info!("Using {} authentication from scheme {}", kind.label(), scheme_name);

        Some(AuthDescriptor {
            scheme_name: scheme_name.clone(),
            kind,
            env_vars,
            instructions,
            unselected,
        })
    }

    /// Whether `scheme_name` is part of the effective requirements of `operation`
    ///
    /// Operation-level `security` replaces the global list; `security: []`
    /// opts the operation out entirely.
    pub fn applies_to(&self, scheme_name: &str, operation: &Operation) -> bool {
        let requirements = operation
            .security
            .as_ref()
            .or(self.spec.security.as_ref());

        requirements.is_some_and(|requirements| {
            requirements
                .iter()
                .any(|requirement| requirement.contains_key(scheme_name))
        })
    }

    /// Scheme names referenced by global or operation requirements
    fn referenced_schemes(&self) -> IndexSet<&'a str> {
        let spec = self.spec;
        let global = spec.security.iter().flatten();
        let per_operation = spec
            .paths
            .values()
            .flat_map(|item| item.operations())
            .filter_map(|(_, op)| op.security.as_ref())
            .flatten();

        global
            .chain(per_operation)
            .flat_map(|requirement: &'a SecurityRequirement| requirement.keys())
            .map(String::as_str)
            .collect()
    }
}

/// Parse one `securitySchemes` entry, warning on anything unusable
fn parse_scheme(name: &str, definition: &Value) -> Option<AuthKind> {
    if !SCHEME_NAME_RE.is_match(name) {
        warn!("Skipping security scheme with invalid name {:?}", name);
        return None;
    }

    let Some(scheme_type) = definition.get("type").and_then(Value::as_str) else {
        warn!("Security scheme {} has no type, skipping", name);
        return None;
    };

    match scheme_type {
        "apiKey" => {
            let param_name = definition
                .get("name")
                .and_then(Value::as_str)
                .filter(|n| !n.trim().is_empty() && !n.chars().any(char::is_control));
            let location = match definition.get("in").and_then(Value::as_str) {
                Some("header") => Some(CredentialLocation::Header),
                Some("query") => Some(CredentialLocation::Query),
                Some("cookie") => Some(CredentialLocation::Cookie),
                _ => None,
            };

            match (param_name, location) {
                (Some(param_name), Some(location)) => Some(AuthKind::ApiKey {
                    param_name: param_name.to_string(),
                    location,
                }),
                _ => {
                    warn!("API key scheme {} needs a valid name and location", name);
                    None
                }
            }
        }
        "http" => {
            let scheme = definition
                .get("scheme")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_ascii_lowercase();
            match scheme.as_str() {
                "bearer" => Some(AuthKind::Bearer {
                    bearer_format: definition
                        .get("bearerFormat")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                }),
                "basic" => Some(AuthKind::Basic),
                other => {
                    warn!("Unsupported HTTP auth scheme {:?} in {}", other, name);
                    None
                }
            }
        }
        "oauth2" => {
            let flows = definition.get("flows");
            let flow_list: Vec<&Value> = OAUTH2_FLOWS
                .iter()
                .filter_map(|flow| flows.and_then(|f| f.get(*flow)))
                .collect();

            let token_url = flow_list
                .iter()
                .find_map(|flow| flow.get("tokenUrl").and_then(Value::as_str))
                .map(str::to_string);
            let scopes = flow_list
                .iter()
                .find_map(|flow| flow.get("scopes").and_then(Value::as_object))
                .map(|scopes| scopes.keys().cloned().collect())
                .unwrap_or_default();

            Some(AuthKind::OAuth2 { token_url, scopes })
        }
        "openIdConnect" => Some(AuthKind::OpenIdConnect {
            discovery_url: definition
                .get("openIdConnectUrl")
                .and_then(Value::as_str)
                .map(str::to_string),
        }),
        other => {
            warn!("Unsupported security scheme type {:?} in {}", other, name);
            None
        }
    }
}

fn raw_type(definition: &Value) -> String {
    definition
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}

/// Environment variables the generated script reads for `kind`
fn env_vars(scheme_name: &str, kind: &AuthKind) -> Vec<String> {
    let prefix = env_var_prefix(scheme_name);
    let suffixes: &[&str] = match kind {
        AuthKind::ApiKey { .. } => &["API_KEY"],
        AuthKind::Bearer { .. } => &["TOKEN"],
        AuthKind::Basic => &["USERNAME", "PASSWORD"],
        AuthKind::OAuth2 { .. } => &["ACCESS_TOKEN"],
        AuthKind::OpenIdConnect { .. } => &["ID_TOKEN"],
    };

    suffixes
        .iter()
        .map(|suffix| format!("{}_{}", prefix, suffix))
        .collect()
}

fn instructions(kind: &AuthKind, env_vars: &[String]) -> Vec<String> {
    let mut lines: Vec<String> = match kind {
        AuthKind::ApiKey { param_name, location } => {
            let place = match location {
                CredentialLocation::Header => "header",
                CredentialLocation::Query => "query parameter",
                CredentialLocation::Cookie => "cookie",
            };
            vec![format!(
                "export {}=<your API key>  (sent as {} {})",
                env_vars[0], place, param_name
            )]
        }
        AuthKind::Bearer { bearer_format } => {
            let token = bearer_format.as_deref().unwrap_or("bearer");
            vec![format!("export {}=<your {} token>", env_vars[0], token)]
        }
        AuthKind::Basic => env_vars
            .iter()
            .zip(["username", "password"])
            .map(|(var, what)| format!("export {}=<your {}>", var, what))
            .collect(),
        AuthKind::OAuth2 { .. } => vec![format!("export {}=<your access token>", env_vars[0])],
        AuthKind::OpenIdConnect { .. } => vec![format!("export {}=<your ID token>", env_vars[0])],
    };

    match kind {
        AuthKind::OAuth2 {
            token_url: Some(url),
            scopes,
        } => {
            lines.push(format!("Obtain the token from {}", url));
            if !scopes.is_empty() {
                lines.push(format!("Scopes: {}", scopes.join(", ")));
            }
        }
        AuthKind::OpenIdConnect {
            discovery_url: Some(url),
        } => lines.push(format!("Discovery document: {}", url)),
        _ => {}
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(value: Value) -> OpenApiSpec {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_api_key_beats_bearer() {
        let spec = spec(json!({
            "openapi": "3.0.0",
            "paths": {},
            "security": [{"bearerAuth": []}, {"apiKey": []}],
            "components": {"securitySchemes": {
                "bearerAuth": {"type": "http", "scheme": "bearer", "bearerFormat": "JWT"},
                "apiKey": {"type": "apiKey", "in": "header", "name": "X-API-Key"}
            }}
        }));

        let auth = AuthAnalyzer::new(&spec).analyze().unwrap();
        assert_eq!(auth.scheme_name, "apiKey");
        assert_eq!(auth.env_vars, vec!["API_KEY_API_KEY"]);
        assert_eq!(auth.unselected.len(), 1);
        assert_eq!(auth.unselected[0].name, "bearerAuth");
    }

    #[test]
    fn test_unreferenced_schemes_are_not_selected() {
        let spec = spec(json!({
            "openapi": "3.0.0",
            "paths": {},
            "components": {"securitySchemes": {
                "basicAuth": {"type": "http", "scheme": "basic"}
            }}
        }));

        assert!(AuthAnalyzer::new(&spec).analyze().is_none());
    }

    #[test]
    fn test_operation_level_reference_counts() {
        let spec = spec(json!({
            "openapi": "3.0.0",
            "paths": {"/me": {"get": {"security": [{"basicAuth": []}], "responses": {}}}},
            "components": {"securitySchemes": {
                "basicAuth": {"type": "http", "scheme": "basic"}
            }}
        }));

        let auth = AuthAnalyzer::new(&spec).analyze().unwrap();
        assert_eq!(auth.kind, AuthKind::Basic);
        assert_eq!(auth.env_vars, vec!["BASIC_AUTH_USERNAME", "BASIC_AUTH_PASSWORD"]);
        assert_eq!(auth.instructions.len(), 2);
    }

    #[test]
    fn test_invalid_and_unsupported_schemes_skipped() {
        let spec = spec(json!({
            "openapi": "3.0.0",
            "paths": {},
            "security": [{"bad name!": []}, {"digest": []}, {"mtls": []}, {"oidc": []}],
            "components": {"securitySchemes": {
                "bad name!": {"type": "http", "scheme": "bearer"},
                "digest": {"type": "http", "scheme": "digest"},
                "mtls": {"type": "mutualTLS"},
                "oidc": {"type": "openIdConnect", "openIdConnectUrl": "https://id.example.com/.well-known/openid-configuration"}
            }}
        }));

        let auth = AuthAnalyzer::new(&spec).analyze().unwrap();
        assert_eq!(auth.scheme_name, "oidc");
        assert_eq!(auth.env_vars, vec!["OIDC_ID_TOKEN"]);
        let skipped: Vec<&str> = auth.unselected.iter().map(|s| s.kind.as_str()).collect();
        assert_eq!(skipped, vec!["http", "http", "mutualTLS"]);
    }

    #[test]
    fn test_oauth2_token_url_and_scopes() {
        let spec = spec(json!({
            "openapi": "3.0.0",
            "paths": {},
            "security": [{"oauth": ["read"]}],
            "components": {"securitySchemes": {
                "oauth": {"type": "oauth2", "flows": {"clientCredentials": {
                    "tokenUrl": "https://auth.example.com/token",
                    "scopes": {"read": "Read access", "write": "Write access"}
                }}}
            }}
        }));

        let auth = AuthAnalyzer::new(&spec).analyze().unwrap();
        assert_eq!(
            auth.kind,
            AuthKind::OAuth2 {
                token_url: Some("https://auth.example.com/token".to_string()),
                scopes: vec!["read".to_string(), "write".to_string()],
            }
        );
        assert!(auth.instructions[1].contains("https://auth.example.com/token"));
    }

    #[test]
    fn test_ties_broken_by_declaration_order() {
        let spec = spec(json!({
            "openapi": "3.0.0",
            "paths": {},
            "security": [{"second": []}, {"first": []}],
            "components": {"securitySchemes": {
                "first": {"type": "http", "scheme": "bearer"},
                "second": {"type": "http", "scheme": "Bearer"}
            }}
        }));

        let auth = AuthAnalyzer::new(&spec).analyze().unwrap();
        assert_eq!(auth.scheme_name, "first");
        assert_eq!(auth.env_vars, vec!["FIRST_TOKEN"]);
    }

    #[test]
    fn test_applies_to_respects_opt_out() {
        let spec = spec(json!({
            "openapi": "3.0.0",
            "paths": {},
            "security": [{"key": []}]
        }));
        let analyzer = AuthAnalyzer::new(&spec);

        let inherits: Operation = serde_json::from_value(json!({})).unwrap();
        let opted_out: Operation = serde_json::from_value(json!({"security": []})).unwrap();
        let other: Operation =
            serde_json::from_value(json!({"security": [{"other": []}]})).unwrap();

        assert!(analyzer.applies_to("key", &inherits));
        assert!(!analyzer.applies_to("key", &opted_out));
        assert!(!analyzer.applies_to("key", &other));
    }
}
