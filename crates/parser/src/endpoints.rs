//! Operation to task conversion
//!
//! Walks every (path, method) pair in document order and builds the
//! renderer-ready [`EndpointDescriptor`]s. A reference that cannot be followed
//! only costs the affected endpoint; the rest of the run carries on.

use crate::auth::AuthAnalyzer;
use crate::faker::LocaleFaker;
use crate::naming::{class_name, task_name, NameRegistry};
use crate::openapi::{
    OpenApiParser, OpenApiSpec, Operation, Parameter, ParameterLocation, PathItem, RefOr,
    RequestBody, Response, Schema,
};
use crate::synthesizer::{DataSynthesizer, DEFAULT_MAX_DEPTH};
use indexmap::IndexMap;
use openapi2locust_common::{
    AuthDescriptor, BodyEncoding, EndpointDescriptor, GenerationConfig, GeneratorError,
    HttpMethod, LoadTestModel, RequestBodySample, ResponseValidation, Result, SkippedEndpoint,
    StatusExpectation,
};
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static PATH_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("Invalid regex"));

/// Header parameters owned by the auth setup and body encoding
const RESERVED_HEADERS: [&str; 2] = ["authorization", "content-type"];

/// Builds the [`LoadTestModel`] for one parsed document
pub struct EndpointBuilder<'a> {
    parser: &'a OpenApiParser,
    config: &'a GenerationConfig,
    synthesizer: DataSynthesizer<'a, LocaleFaker>,
    auth: AuthAnalyzer<'a>,
}

impl<'a> EndpointBuilder<'a> {
    pub fn new(parser: &'a OpenApiParser, config: &'a GenerationConfig) -> Self {
        let spec = parser.spec();
        Self {
            parser,
            config,
            synthesizer: DataSynthesizer::new(spec, LocaleFaker::new(&config.data_faker.locale)),
            auth: AuthAnalyzer::new(spec),
        }
    }

    fn spec(&self) -> &'a OpenApiSpec {
        self.parser.spec()
    }

    /// Build every endpoint, recording the ones that had to be skipped
    pub fn build(self) -> Result<LoadTestModel> {
        let spec = self.spec();
        let auth = self.auth.analyze();

        let mut registry = NameRegistry::new();
        let mut endpoints = Vec::new();
        let mut skipped = Vec::new();

        for (path, item) in &spec.paths {
            for (method, operation) in item.operations() {
                match self.endpoint(path, item, method, operation, auth.as_ref()) {
                    Ok(mut endpoint) => {
                        endpoint.task_name = registry.claim(&task_name(method, path));
                        debug!(
                            task = %endpoint.task_name,
                            weight = endpoint.weight,
                            "Built endpoint {} {}",
                            method,
                            path
                        );
                        endpoints.push(endpoint);
                    }
                    Err(GeneratorError::SchemaResolution(reason)) => {
                        warn!("Skipping {} {}: {}", method, path, reason);
                        skipped.push(SkippedEndpoint {
                            method,
                            path: path.clone(),
                            reason,
                        });
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        if endpoints.is_empty() {
            warn!("No endpoints could be generated from {}", self.parser.source_name());
        }
        info!(
            endpoints = endpoints.len(),
            skipped = skipped.len(),
            "Built load-test model"
        );

        Ok(LoadTestModel {
            title: spec.info.title.clone(),
            version: spec.info.version.clone(),
            description: spec.info.description.clone(),
            base_url: self.parser.base_url(),
            class_name: class_name(&spec.info.title),
            source_name: self.parser.source_name().to_string(),
            auth,
            endpoints,
            skipped,
        })
    }

    fn endpoint(
        &self,
        path: &str,
        item: &'a PathItem,
        method: HttpMethod,
        operation: &'a Operation,
        auth: Option<&AuthDescriptor>,
    ) -> Result<EndpointDescriptor> {
        let parameters = self.merged_parameters(item, operation)?;

        let mut path_params = IndexMap::new();
        for capture in PATH_PARAM_RE.captures_iter(path) {
            let name = &capture[1];
            let value = match parameters.get(&(name.to_string(), ParameterLocation::Path)) {
                Some(param) => self.parameter_value(param)?,
                None => Value::Null,
            };
            path_params.insert(name.to_string(), self.stringify(name, value));
        }

        let mut query_params = IndexMap::new();
        let mut headers = IndexMap::new();
        let mut cookies = IndexMap::new();

        for ((name, location), param) in &parameters {
            if !param.required {
                continue;
            }
            match location {
                ParameterLocation::Path => {}
                ParameterLocation::Query => {
                    query_params.insert(name.clone(), self.parameter_value(param)?);
                }
                ParameterLocation::Header => {
                    if RESERVED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                        debug!("Header parameter {} on {} {} left to setup code", name, method, path);
                        continue;
                    }
                    let value = self.parameter_value(param)?;
                    headers.insert(name.clone(), self.stringify(name, value));
                }
                ParameterLocation::Cookie => {
                    let value = self.parameter_value(param)?;
                    cookies.insert(name.clone(), self.stringify(name, value));
                }
            }
        }

        let request_body = match &operation.request_body {
            Some(body) => self.request_body(body)?,
            None => None,
        };

        let response_validation = if self.config.template.add_response_validation {
            self.response_validation(&operation.responses)?
        } else {
            None
        };

        Ok(EndpointDescriptor {
            task_name: String::new(),
            method,
            path: path.to_string(),
            operation_id: operation.operation_id.clone(),
            summary: operation.summary.clone().or_else(|| item.summary.clone()),
            description: operation
                .description
                .clone()
                .or_else(|| item.description.clone()),
            tags: operation.tags.clone(),
            deprecated: operation.deprecated,
            path_params,
            query_params,
            headers,
            cookies,
            request_body,
            expected_status: expected_status(&operation.responses),
            response_validation,
            weight: self.config.weight_for(method),
            uses_auth: auth.is_some_and(|a| self.auth.applies_to(&a.scheme_name, operation)),
        })
    }

    /// Path-level parameters overridden by operation-level ones (name + location)
    fn merged_parameters(
        &self,
        item: &'a PathItem,
        operation: &'a Operation,
    ) -> Result<IndexMap<(String, ParameterLocation), &'a Parameter>> {
        let spec = self.spec();
        let mut merged = IndexMap::new();

        for param in item.parameters.iter().chain(&operation.parameters) {
            let param = spec.resolve(param)?;
            merged.insert((param.name.clone(), param.location), param);
        }

        Ok(merged)
    }

    fn parameter_value(&self, param: &Parameter) -> Result<Value> {
        if let Some(example) = &param.example {
            return Ok(example.clone());
        }
        match &param.schema {
            Some(schema) => self.synthesizer.sample_named(schema, &param.name),
            None => Ok(Value::String(self.synthesizer.sample_for_name(&param.name))),
        }
    }

    /// Render a sample as the string sent on the wire
    fn stringify(&self, name: &str, value: Value) -> String {
        match value {
            Value::String(s) => s,
            Value::Null => self.synthesizer.sample_for_name(name),
            other => other.to_string(),
        }
    }

    fn request_body(
        &self,
        body: &RefOr<RequestBody>,
    ) -> Result<Option<RequestBodySample>> {
        let body = self.spec().resolve(body)?;

        let preferred = [BodyEncoding::Json, BodyEncoding::Form, BodyEncoding::Multipart]
            .into_iter()
            .find_map(|wanted| {
                body.content
                    .iter()
                    .find(|(content_type, _)| body_encoding(content_type) == wanted)
            })
            .or_else(|| body.content.first());

        let Some((content_type, media)) = preferred else {
            return Ok(None);
        };
        let encoding = body_encoding(content_type);

        let value = match (&media.example, &media.schema) {
            (Some(example), _) => example.clone(),
            (None, Some(schema)) => self.synthesizer.sample(schema)?,
            (None, None) if encoding == BodyEncoding::Raw => Value::String(String::new()),
            (None, None) => json!({}),
        };

        let file_fields = match (&media.schema, encoding) {
            (Some(schema), BodyEncoding::Multipart) => self.binary_fields(schema)?,
            _ => Vec::new(),
        };

        Ok(Some(RequestBodySample {
            content_type: content_type.clone(),
            encoding,
            value,
            file_fields,
        }))
    }

    /// Top-level properties declared as `format: binary`
    fn binary_fields(&self, schema: &RefOr<Schema>) -> Result<Vec<String>> {
        let spec = self.spec();
        let schema: &Schema = spec.resolve(schema)?;

        let mut fields = Vec::new();
        for (name, property) in &schema.properties {
            let property: &Schema = spec.resolve(property)?;
            if property.format.as_deref() == Some("binary") {
                fields.push(name.clone());
            }
        }
        Ok(fields)
    }

    /// Shape rule from the first 2xx response carrying a JSON schema
    fn response_validation(
        &self,
        responses: &IndexMap<String, RefOr<Response>>,
    ) -> Result<Option<ResponseValidation>> {
        let spec = self.spec();

        for (status, response) in responses {
            let is_success = status
                .parse::<u16>()
                .is_ok_and(|code| (200..300).contains(&code));
            if !is_success {
                continue;
            }

            let response = spec.resolve(response)?;
            let schema = response
                .content
                .iter()
                .find(|(content_type, _)| body_encoding(content_type) == BodyEncoding::Json)
                .and_then(|(_, media)| media.schema.as_ref());

            if let Some(schema) = schema {
                let schema: &Schema = spec.resolve(schema)?;
                return Ok(Some(self.validation_for(schema, 0)?));
            }
        }

        Ok(None)
    }

    /// `allOf` compositions validate as an object with every part's required keys
    fn validation_for(&self, schema: &Schema, depth: usize) -> Result<ResponseValidation> {
        if schema.all_of.is_empty() || depth >= DEFAULT_MAX_DEPTH {
            return Ok(shape_rule(schema));
        }

        let mut required: Vec<String> = Vec::new();
        for part in &schema.all_of {
            let part = self.spec().resolve(part)?;
            if let ResponseValidation::Object { required: keys } =
                self.validation_for(part, depth + 1)?
            {
                required.extend(keys);
            }
        }
        required.extend(schema.required.iter().cloned());

        let mut seen = HashSet::new();
        required.retain(|key| seen.insert(key.clone()));

        Ok(ResponseValidation::Object { required })
    }
}

fn shape_rule(schema: &Schema) -> ResponseValidation {
    match schema.schema_type.as_deref() {
        Some("array") => ResponseValidation::Array,
        Some("object") => ResponseValidation::Object {
            required: schema.required.clone(),
        },
        None if !schema.properties.is_empty() => ResponseValidation::Object {
            required: schema.required.clone(),
        },
        None if schema.items.is_some() => ResponseValidation::Array,
        _ => ResponseValidation::Json,
    }
}

fn body_encoding(content_type: &str) -> BodyEncoding {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence == "application/json" || essence.ends_with("+json") {
        BodyEncoding::Json
    } else if essence == "application/x-www-form-urlencoded" {
        BodyEncoding::Form
    } else if essence == "multipart/form-data" {
        BodyEncoding::Multipart
    } else {
        BodyEncoding::Raw
    }
}

/// Sorted numeric response codes; wildcard when there are none
pub fn expected_status(responses: &IndexMap<String, RefOr<Response>>) -> StatusExpectation {
    let mut codes: Vec<u16> = responses
        .keys()
        .filter_map(|key| key.trim().parse::<u16>().ok())
        .filter(|code| (100..=599).contains(code))
        .collect();
    codes.sort_unstable();
    codes.dedup();

    let wildcard = codes.is_empty();
    StatusExpectation { codes, wildcard }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responses(keys: &[&str]) -> IndexMap<String, RefOr<Response>> {
        keys.iter()
            .map(|key| (key.to_string(), RefOr::Item(Response::default())))
            .collect()
    }

    #[test]
    fn test_expected_status_sorted_and_deduplicated() {
        let status = expected_status(&responses(&["404", "200", "201", "default"]));
        assert_eq!(status.codes, vec![200, 201, 404]);
        assert!(!status.wildcard);
    }

    #[test]
    fn test_expected_status_wildcard() {
        let status = expected_status(&responses(&["default"]));
        assert!(status.codes.is_empty());
        assert!(status.wildcard);

        let status = expected_status(&responses(&["2XX"]));
        assert!(status.wildcard);

        assert!(expected_status(&IndexMap::new()).wildcard);
    }

    #[test]
    fn test_body_encoding() {
        assert_eq!(body_encoding("application/json; charset=utf-8"), BodyEncoding::Json);
        assert_eq!(body_encoding("application/problem+json"), BodyEncoding::Json);
        assert_eq!(
            body_encoding("application/x-www-form-urlencoded"),
            BodyEncoding::Form
        );
        assert_eq!(body_encoding("multipart/form-data"), BodyEncoding::Multipart);
        assert_eq!(body_encoding("text/plain"), BodyEncoding::Raw);
    }

    #[test]
    fn test_validation_rule_from_schema() {
        let object: Schema = serde_json::from_value(json!({
            "type": "object",
            "required": ["id"],
            "properties": {"id": {"type": "integer"}}
        }))
        .unwrap();
        assert_eq!(
            shape_rule(&object),
            ResponseValidation::Object {
                required: vec!["id".to_string()]
            }
        );

        let array: Schema = serde_json::from_value(json!({"items": {"type": "string"}})).unwrap();
        assert_eq!(shape_rule(&array), ResponseValidation::Array);

        let scalar: Schema = serde_json::from_value(json!({"type": "string"})).unwrap();
        assert_eq!(shape_rule(&scalar), ResponseValidation::Json);
    }
}
