//! Sample value synthesis from schema fragments
//!
//! Produces one deterministic `serde_json::Value` per schema. Priority is
//! `example`, then the first `enum` entry, then `default`, then a value built
//! from `type`/`format` and the property name.

use crate::faker::{FakeData, LocaleFaker};
use crate::naming::to_snake_case;
use crate::openapi::{OpenApiSpec, RefOr, Schema};
use openapi2locust_common::Result;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Nesting bound for objects, arrays and composites
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Base64 of "sample data"
const SAMPLE_BYTES: &str = "c2FtcGxlIGRhdGE=";

/// Builds sample payloads for schemas of one document
pub struct DataSynthesizer<'a, F = LocaleFaker> {
    spec: &'a OpenApiSpec,
    faker: F,
    max_depth: usize,
}

/// Traversal state for one top-level sample
#[derive(Default)]
struct Walk {
    depth: usize,
    /// References currently being expanded
    stack: Vec<String>,
}

impl<'a, F: FakeData> DataSynthesizer<'a, F> {
    pub fn new(spec: &'a OpenApiSpec, faker: F) -> Self {
        Self {
            spec,
            faker,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sample for a schema or schema reference
    pub fn sample(&self, schema: &RefOr<Schema>) -> Result<Value> {
        self.generate(schema, None, &mut Walk::default())
    }

    /// Sample for a named property or parameter; the name steers string values
    pub fn sample_named(&self, schema: &RefOr<Schema>, name: &str) -> Result<Value> {
        self.generate(schema, Some(name), &mut Walk::default())
    }

    /// Sample for an inline schema
    pub fn sample_schema(&self, schema: &Schema, name: Option<&str>) -> Result<Value> {
        self.schema_value(schema, name, &mut Walk::default())
    }

    /// String sample driven only by a name (parameters without a schema)
    pub fn sample_for_name(&self, name: &str) -> String {
        self.string_for_hint(Some(name))
    }

    fn generate(&self, item: &RefOr<Schema>, hint: Option<&str>, walk: &mut Walk) -> Result<Value> {
        match item {
            RefOr::Item(schema) => self.schema_value(schema, hint, walk),
            RefOr::Ref { reference } => {
                if walk.stack.iter().any(|r| r == reference) {
                    debug!("Recursive reference {} cut off", reference);
                    return Ok(Value::Null);
                }

                let schema = self.spec.resolve(item)?;
                walk.stack.push(reference.clone());
                let value = self.schema_value(schema, hint, walk);
                walk.stack.pop();
                value
            }
        }
    }

    fn schema_value(&self, schema: &Schema, hint: Option<&str>, walk: &mut Walk) -> Result<Value> {
        if let Some(example) = &schema.example {
            return Ok(example.clone());
        }
        if let Some(first) = schema.enum_values.first() {
            return Ok(first.clone());
        }
        if let Some(default) = &schema.default {
            return Ok(default.clone());
        }

        if walk.depth >= self.max_depth {
            debug!(depth = walk.depth, "Sample depth bound reached");
            return Ok(Value::Null);
        }

        if !schema.all_of.is_empty() {
            return self.nested(walk, |this, walk| this.merge_all_of(schema, hint, walk));
        }
        if let Some(branch) = schema.one_of.first().or_else(|| schema.any_of.first()) {
            return self.nested(walk, |this, walk| this.generate(branch, hint, walk));
        }

        match inferred_type(schema, hint) {
            Some("object") => self.nested(walk, |this, walk| this.object_value(schema, walk)),
            Some("array") => self.nested(walk, |this, walk| this.array_value(schema, walk)),
            Some("integer") => Ok(json!(integer_in_range(schema))),
            Some("number") => Ok(json!(number_in_range(schema))),
            Some("boolean") => Ok(Value::Bool(true)),
            Some("string") => Ok(Value::String(self.string_value(schema, hint))),
            _ => Ok(Value::Null),
        }
    }

    fn nested<T>(&self, walk: &mut Walk, f: impl FnOnce(&Self, &mut Walk) -> Result<T>) -> Result<T> {
        walk.depth += 1;
        let result = f(self, walk);
        walk.depth -= 1;
        result
    }

    fn object_value(&self, schema: &Schema, walk: &mut Walk) -> Result<Value> {
        let mut object = Map::new();

        let required = schema
            .required
            .iter()
            .filter_map(|name| schema.properties.get_key_value(name));
        let optional = schema
            .properties
            .iter()
            .filter(|(name, _)| !schema.required.contains(name));

        for (name, property) in required.chain(optional) {
            let value = self.generate(property, Some(name), walk)?;
            object.insert(name.clone(), value);
        }

        Ok(Value::Object(object))
    }

    fn array_value(&self, schema: &Schema, walk: &mut Walk) -> Result<Value> {
        let Some(items) = &schema.items else {
            return Ok(json!([]));
        };

        match self.generate(items, None, walk)? {
            // A cut-off recursive item becomes an empty list
            Value::Null => Ok(json!([])),
            item => Ok(json!([item])),
        }
    }

    fn merge_all_of(&self, schema: &Schema, hint: Option<&str>, walk: &mut Walk) -> Result<Value> {
        let mut merged = Map::new();
        let mut fallback = None;

        for part in &schema.all_of {
            match self.generate(part, hint, walk)? {
                Value::Object(fields) => merged.extend(fields),
                Value::Null => {}
                other => {
                    fallback.get_or_insert(other);
                }
            }
        }

        if !schema.properties.is_empty() {
            if let Value::Object(fields) = self.object_value(schema, walk)? {
                merged.extend(fields);
            }
        }

        match fallback {
            Some(value) if merged.is_empty() => Ok(value),
            _ => Ok(Value::Object(merged)),
        }
    }

    fn string_value(&self, schema: &Schema, hint: Option<&str>) -> String {
        let value = match schema.format.as_deref() {
            Some("email") => self.faker.email(),
            Some("uri") | Some("url") | Some("uri-reference") => self.faker.url(),
            Some("uuid") => self.faker.uuid(),
            Some("date") => self.faker.date(),
            Some("date-time") => self.faker.date_time(),
            Some("time") => self.faker.time(),
            Some("password") => self.faker.password(),
            Some("byte") => SAMPLE_BYTES.to_string(),
            Some("binary") => "sample file content".to_string(),
            Some("hostname") => host_of(&self.faker.url()),
            Some("ipv4") => "192.0.2.10".to_string(),
            Some("ipv6") => "2001:db8::10".to_string(),
            _ => self.string_for_hint(hint),
        };

        fit_length(value, schema.min_length, schema.max_length)
    }

    fn string_for_hint(&self, hint: Option<&str>) -> String {
        let Some(hint) = hint else {
            return self.faker.word();
        };
        let name = to_snake_case(hint);
        let has = |needle: &str| name.contains(needle);

        if has("email") {
            self.faker.email()
        } else if has("first_name") || name == "given_name" {
            self.faker.first_name()
        } else if has("last_name") || has("surname") || name == "family_name" {
            self.faker.last_name()
        } else if has("username") || has("login") {
            self.faker.first_name().to_lowercase()
        } else if has("password") {
            self.faker.password()
        } else if has("phone") || has("mobile") {
            self.faker.phone_number()
        } else if has("city") {
            self.faker.city()
        } else if has("address") || has("street") {
            self.faker.street_address()
        } else if has("zip") || has("postal") || has("postcode") {
            self.faker.postal_code()
        } else if has("country") {
            self.faker.country_code()
        } else if has("company") || has("organization") {
            self.faker.company()
        } else if has("url") || has("website") || has("link") || has("uri") {
            self.faker.url()
        } else if has("uuid") || has("guid") {
            self.faker.uuid()
        } else if name == "id" || name.ends_with("_id") {
            "1".to_string()
        } else if has("date") || name == "birthday" {
            self.faker.date()
        } else if name.ends_with("_at") || has("timestamp") || has("time") {
            self.faker.date_time()
        } else if has("name") || name == "title" {
            self.faker.full_name()
        } else if has("description") || has("comment") || has("message") || has("text") {
            self.faker.sentence()
        } else {
            self.faker.word()
        }
    }
}

/// Declared type, or one inferred from the schema's shape
fn inferred_type<'s>(schema: &'s Schema, hint: Option<&str>) -> Option<&'s str> {
    if let Some(t) = schema.schema_type.as_deref() {
        return Some(t);
    }
    if !schema.properties.is_empty() {
        Some("object")
    } else if schema.items.is_some() {
        Some("array")
    } else if schema.format.is_some() || hint.is_some() || schema.min_length.is_some() {
        Some("string")
    } else {
        None
    }
}

fn integer_in_range(schema: &Schema) -> i64 {
    let mut value = 1.0_f64;
    if let Some(min) = schema.minimum {
        value = value.max(min.ceil());
    }
    if let Some(max) = schema.maximum {
        value = value.min(max.floor());
    }
    value as i64
}

fn number_in_range(schema: &Schema) -> f64 {
    let mut value = 1.5_f64;
    if let Some(min) = schema.minimum {
        value = value.max(min);
    }
    if let Some(max) = schema.maximum {
        value = value.min(max);
    }
    value
}

fn fit_length(mut value: String, min: Option<usize>, max: Option<usize>) -> String {
    if let Some(max) = max {
        if value.chars().count() > max {
            value = value.chars().take(max).collect();
        }
    }
    if let Some(min) = min {
        let len = value.chars().count();
        if len < min {
            value.push_str(&"x".repeat(min - len));
        }
    }
    value
}

fn host_of(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    without_scheme
        .split(['/', ':'])
        .next()
        .unwrap_or(without_scheme)
        .to_string()
}
