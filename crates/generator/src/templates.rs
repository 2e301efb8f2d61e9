//! Template loading and Python escaping filters
//!
//! Every document-controlled string passes through one of these filters
//! before it lands in the generated script.

use openapi2locust_common::{GeneratorError, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

/// Name of the embedded script template
pub const LOCUSTFILE_TEMPLATE: &str = "locustfile.py";

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Load the script template with the Python filters registered
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.register_filter("py_str", py_str_filter);
    tera.register_filter("py_comment", py_comment_filter);
    tera.register_filter("py_literal", py_literal_filter);
    tera.register_filter("py_text", py_text_filter);
    tera.register_filter("py_ident", py_ident_filter);
    tera.register_filter("py_multipart", py_multipart_filter);

    // No autoescape: the name has no .html/.xml suffix
    tera.add_raw_template(
        LOCUSTFILE_TEMPLATE,
        include_str!("../templates/locustfile.py.tera"),
    )
    .map_err(|e| {
        GeneratorError::Render(format!("Failed to load {} template: {}", LOCUSTFILE_TEMPLATE, e))
    })?;

    Ok(tera)
}

/// Body of a double-quoted Python string: control characters dropped
pub fn escape_py_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// Text safe to place after `#`
pub fn escape_py_comment(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Python source for a JSON value
pub fn py_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote_py(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(py_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{}: {}", quote_py(key), py_literal(value)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Valid Python identifier derived from `s`
pub fn py_ident(s: &str) -> String {
    let mut ident: String = s
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if PYTHON_KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

/// `files=` dict for a multipart body
///
/// Plain fields become `(None, text)` parts; names in `file_fields` are sent
/// as uploads named after the field. A non-object sample is one upload
/// called `file`.
pub fn py_multipart(value: &Value, file_fields: &[String]) -> String {
    let part = |name: &str, value: &Value| {
        let filename = if file_fields.iter().any(|f| f == name) {
            quote_py(name)
        } else {
            "None".to_string()
        };
        format!("{}: ({}, {})", quote_py(name), filename, quote_py(&part_text(value)))
    };

    match value {
        Value::Object(map) => {
            let parts: Vec<String> = map.iter().map(|(name, value)| part(name, value)).collect();
            format!("{{{}}}", parts.join(", "))
        }
        other => format!("{{\"file\": (\"file\", {})}}", quote_py(&part_text(other))),
    }
}

/// Text of one multipart part; nested values are sent as JSON
fn part_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Double-quoted literal with control characters escaped rather than dropped
fn quote_py(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn expect_str<'v>(value: &'v Value, filter: &str) -> tera::Result<&'v str> {
    value
        .as_str()
        .ok_or_else(|| tera::Error::msg(format!("{} filter expects a string", filter)))
}

fn py_str_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(escape_py_str(expect_str(value, "py_str")?)))
}

fn py_comment_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = match value {
        Value::String(s) => escape_py_comment(s),
        Value::Null => String::new(),
        other => escape_py_comment(&other.to_string()),
    };
    Ok(Value::String(text))
}

fn py_literal_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(py_literal(value)))
}

/// String literal for a raw request body; non-strings are sent as JSON text
fn py_text_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Ok(Value::String(quote_py(&text)))
}

fn py_multipart_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let file_fields: Vec<String> = match args.get("files") {
        Some(files) => serde_json::from_value(files.clone())
            .map_err(|e| tera::Error::msg(format!("py_multipart files must be strings: {}", e)))?,
        None => Vec::new(),
    };
    Ok(Value::String(py_multipart(value, &file_fields)))
}

fn py_ident_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(py_ident(expect_str(value, "py_ident")?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape_py_str() {
        assert_eq!(escape_py_str(r#"say "hi"\now"#), r#"say \"hi\"\\now"#);
        assert_eq!(escape_py_str("line\nbreak\t"), "linebreak");
    }

    #[test]
    fn test_escape_py_comment() {
        assert_eq!(
            escape_py_comment("first\nimport os; os.system('x')"),
            "first import os; os.system('x')"
        );
        assert_eq!(escape_py_comment("\r\n"), "");
    }

    #[test]
    fn test_py_literal() {
        let value = json!({
            "name": "O\"Brien",
            "tags": ["a", 1, 2.5, true, false, null],
            "nested": {"note": "two\nlines"}
        });
        assert_eq!(
            py_literal(&value),
            r#"{"name": "O\"Brien", "tags": ["a", 1, 2.5, True, False, None], "nested": {"note": "two\nlines"}}"#
        );
        assert_eq!(py_literal(&json!({})), "{}");
    }

    #[test]
    fn test_py_ident() {
        assert_eq!(py_ident("get_users"), "get_users");
        assert_eq!(py_ident("1st"), "_1st");
        assert_eq!(py_ident("class"), "class_");
        assert_eq!(py_ident("a-b c"), "a_b_c");
        assert_eq!(py_ident(""), "_");
    }

    #[test]
    fn test_py_multipart() {
        let value = json!({"file": "sample file content", "count": 2, "note": null});
        assert_eq!(
            py_multipart(&value, &["file".to_string()]),
            r#"{"file": ("file", "sample file content"), "count": (None, "2"), "note": (None, "")}"#
        );
        assert_eq!(
            py_multipart(&json!("raw"), &[]),
            r#"{"file": ("file", "raw")}"#
        );
    }

    #[test]
    fn test_templates_load() {
        let tera = load_templates().unwrap();
        assert!(tera.get_template_names().any(|n| n == LOCUSTFILE_TEMPLATE));
    }

    #[test]
    fn test_filter_rejects_non_string() {
        let result = py_str_filter(&json!(5), &HashMap::new());
        assert!(result.is_err());
    }
}
