//! Identifier derivation for generated code
//!
//! Task method names, the user class name and environment variable names
//! are all derived from document text and must come out as valid Python /
//! shell identifiers.

use openapi2locust_common::HttpMethod;
use std::collections::HashSet;

/// Convert PascalCase, camelCase or separated words to snake_case
///
/// Any character that is not ASCII alphanumeric acts as a word separator.
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() {
            // Add underscore before uppercase if:
            // 1. Not at the start
            // 2. Previous char is lowercase or digit
            // 3. OR next char is lowercase (handles HTTPServer -> http_server)
            let should_add_underscore = i > 0
                && (chars[i - 1].is_ascii_lowercase()
                    || chars[i - 1].is_ascii_digit()
                    || (i + 1 < chars.len() && chars[i + 1].is_ascii_lowercase()));

            if should_add_underscore && !result.ends_with('_') {
                result.push('_');
            }
            result.push(ch.to_ascii_lowercase());
        } else if ch.is_ascii_alphanumeric() {
            result.push(ch);
        } else if !result.is_empty() && !result.ends_with('_') {
            result.push('_');
        }
    }

    // Clean up multiple consecutive underscores
    while result.contains("__") {
        result = result.replace("__", "_");
    }

    // Strip leading and trailing underscores
    result.trim_matches('_').to_string()
}

/// Base task name for an operation: `GET /users/{userId}` -> `get_users_user_id`
pub fn task_name(method: HttpMethod, path: &str) -> String {
    let segments: Vec<String> = path
        .split('/')
        .map(|segment| to_snake_case(&segment.replace(['{', '}'], "")))
        .filter(|segment| !segment.is_empty())
        .collect();

    let method = method.as_str().to_ascii_lowercase();
    if segments.is_empty() {
        format!("{}_root", method)
    } else {
        format!("{}_{}", method, segments.join("_"))
    }
}

/// Hands out names that are unique within one generation run
#[derive(Debug, Default)]
pub struct NameRegistry {
    used: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `base`, or `base_2`, `base_3`, ... when already taken
    pub fn claim(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }

        let mut suffix = 2;
        loop {
            let candidate = format!("{}_{}", base, suffix);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

/// Python class name for the generated user: `Test API` -> `TestAPIUser`
pub fn class_name(title: &str) -> String {
    let words: Vec<String> = title
        .split(|c: char| !c.is_ascii_alphanumeric() && !c.is_whitespace())
        .collect::<Vec<_>>()
        .join("")
        .split_whitespace()
        .map(|word| {
            if word.eq_ignore_ascii_case("api") {
                "API".to_string()
            } else {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => {
                        first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                    }
                    None => String::new(),
                }
            }
        })
        .collect();

    let mut name = words.concat();
    if name.is_empty() {
        return "APIUser".to_string();
    }
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        name = format!("API{}", name);
    }
    if !name.ends_with("User") {
        name.push_str("User");
    }
    name
}

/// Environment variable prefix for a security scheme: `bearerAuth` -> `BEARER_AUTH`
pub fn env_var_prefix(scheme_name: &str) -> String {
    let snake = to_snake_case(scheme_name).to_ascii_uppercase();
    if snake.is_empty() {
        "AUTH".to_string()
    } else if snake.starts_with(|c: char| c.is_ascii_digit()) {
        format!("AUTH_{}", snake)
    } else {
        snake
    }
}
