//! Document overview used by the `info` and `endpoints` commands

use super::parser::OpenApiParser;
use openapi2locust_common::HttpMethod;
use std::collections::BTreeMap;

/// One (path, method) pair as declared in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSummary {
    pub method: HttpMethod,
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
}

/// Server entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSummary {
    pub url: String,
    pub description: Option<String>,
}

/// High-level facts about a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSummary {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
    pub servers: Vec<ServerSummary>,
    pub operations: Vec<OperationSummary>,
    /// Declared security schemes: name -> `type` field (or "unknown")
    pub security_schemes: Vec<(String, String)>,
}

impl SpecSummary {
    /// Operation counts per method, ordered by method
    pub fn method_counts(&self) -> BTreeMap<HttpMethod, usize> {
        let mut counts = BTreeMap::new();
        for op in &self.operations {
            *counts.entry(op.method).or_insert(0) += 1;
        }
        counts
    }
}

impl OpenApiParser {
    /// Summarize title, servers, operations and security schemes
    pub fn summary(&self) -> SpecSummary {
        let spec = self.spec();

        let servers = spec
            .servers
            .iter()
            .map(|server| ServerSummary {
                url: server.url.clone(),
                description: server.description.clone(),
            })
            .collect();

        let operations = spec
            .paths
            .iter()
            .flat_map(|(path, item)| {
                item.operations().map(move |(method, op)| OperationSummary {
                    method,
                    path: path.clone(),
                    operation_id: op.operation_id.clone(),
                    summary: op.summary.clone().or_else(|| item.summary.clone()),
                })
            })
            .collect();

        let security_schemes = spec
            .security_schemes()
            .map(|schemes| {
                schemes
                    .iter()
                    .map(|(name, scheme)| {
                        let kind = scheme
                            .get("type")
                            .and_then(|t| t.as_str())
                            .unwrap_or("unknown");
                        (name.clone(), kind.to_string())
                    })
                    .collect()
            })
            .unwrap_or_default();

        SpecSummary {
            title: spec.info.title.clone(),
            version: spec.info.version.clone(),
            description: spec.info.description.clone(),
            servers,
            operations,
            security_schemes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_methods() {
        let parser = OpenApiParser::from_yaml(
            r#"
openapi: 3.0.0
info:
  title: Pets
  version: "2.1"
servers:
  - url: https://pets.example.com
    description: production
paths:
  /pets:
    get:
      summary: List pets
      responses:
        '200': {description: ok}
    post:
      responses:
        '201': {description: created}
  /pets/{id}:
    get:
      responses:
        '200': {description: ok}
components:
  securitySchemes:
    key:
      type: apiKey
      in: header
      name: X-Key
"#,
        )
        .unwrap();

        let summary = parser.summary();
        assert_eq!(summary.title, "Pets");
        assert_eq!(summary.version, "2.1");
        assert_eq!(summary.servers[0].description.as_deref(), Some("production"));
        assert_eq!(summary.operations.len(), 3);
        assert_eq!(summary.operations[0].summary.as_deref(), Some("List pets"));

        let counts = summary.method_counts();
        assert_eq!(counts[&HttpMethod::Get], 2);
        assert_eq!(counts[&HttpMethod::Post], 1);

        assert_eq!(
            summary.security_schemes,
            vec![("key".to_string(), "apiKey".to_string())]
        );
    }
}
