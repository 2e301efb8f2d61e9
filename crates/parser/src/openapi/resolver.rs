//! `$ref` resolution over the `components` arena
//!
//! Only local references (`#/components/<section>/<name>`) are supported.
//! Chains of references are followed with a visited list so a ref-to-ref
//! cycle is reported instead of looping.

use super::types::{Components, OpenApiSpec, Parameter, RefOr, RequestBody, Response, Schema};
use indexmap::IndexMap;
use openapi2locust_common::{GeneratorError, Result};

/// A type that lives in a named section of `components`
pub trait Component: Sized {
    /// Section name as it appears in the pointer (e.g. "schemas")
    const SECTION: &'static str;

    fn section(components: &Components) -> &IndexMap<String, RefOr<Self>>;
}

impl Component for Schema {
    const SECTION: &'static str = "schemas";

    fn section(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        &components.schemas
    }
}

impl Component for Parameter {
    const SECTION: &'static str = "parameters";

    fn section(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        &components.parameters
    }
}

impl Component for RequestBody {
    const SECTION: &'static str = "requestBodies";

    fn section(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        &components.request_bodies
    }
}

impl Component for Response {
    const SECTION: &'static str = "responses";

    fn section(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        &components.responses
    }
}

impl OpenApiSpec {
    /// Follow `item` until an inline definition is reached
    pub fn resolve<'a, T: Component>(&'a self, item: &'a RefOr<T>) -> Result<&'a T> {
        let mut current = item;
        let mut visited: Vec<&str> = Vec::new();

        loop {
            match current {
                RefOr::Item(value) => return Ok(value),
                RefOr::Ref { reference } => {
                    if visited.contains(&reference.as_str()) {
                        return Err(GeneratorError::SchemaResolution(format!(
                            "Reference cycle through {}",
                            reference
                        )));
                    }
                    visited.push(reference.as_str());
                    current = self.lookup::<T>(reference)?;
                }
            }
        }
    }

    /// Look up one reference without following further references
    pub fn lookup<T: Component>(&self, reference: &str) -> Result<&RefOr<T>> {
        let name = component_name(reference, T::SECTION)?;
        self.components
            .as_ref()
            .and_then(|components| T::section(components).get(&name))
            .ok_or_else(|| {
                GeneratorError::SchemaResolution(format!("Unresolved reference: {}", reference))
            })
    }

    /// Resolve a schema reference by its pointer string
    pub fn resolve_schema_ref(&self, reference: &str) -> Result<&Schema> {
        let item = self.lookup::<Schema>(reference)?;
        self.resolve(item)
    }
}

/// Extract the component name from `#/components/<section>/<name>`
pub fn component_name(reference: &str, section: &str) -> Result<String> {
    let prefix = format!("#/components/{}/", section);
    let encoded = reference.strip_prefix(&prefix).ok_or_else(|| {
        if reference.starts_with('#') {
            GeneratorError::SchemaResolution(format!(
                "Reference {} does not point into components/{}",
                reference, section
            ))
        } else {
            GeneratorError::SchemaResolution(format!(
                "External reference not supported: {}",
                reference
            ))
        }
    })?;

    if encoded.is_empty() || encoded.contains('/') {
        return Err(GeneratorError::SchemaResolution(format!(
            "Malformed reference: {}",
            reference
        )));
    }

    // JSON pointer unescaping; order matters
    Ok(encoded.replace("~1", "/").replace("~0", "~"))
}
