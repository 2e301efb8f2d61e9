//! Generation configuration
//!
//! Built-in defaults overlaid by an optional user file (YAML or JSON). The
//! override is a partial mirror of [`GenerationConfig`]: every field is
//! optional, nested maps are merged key by key, and the merged result is
//! validated before any generation work starts.

use crate::{GeneratorError, HttpMethod, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Weight used when the configuration has no entry for a method
pub const FALLBACK_WEIGHT: u32 = 1;

/// Effective configuration for one generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Directory the script is written to
    pub output_dir: PathBuf,
    /// Lower bound of the wait time between tasks, in seconds
    pub min_wait: u64,
    /// Upper bound of the wait time between tasks, in seconds
    pub max_wait: u64,
    /// Task weight per upper-case HTTP method
    pub default_weight: IndexMap<String, u32>,
    /// Whether `security_headers` are sent with every request
    pub include_security_headers: bool,
    pub security_headers: IndexMap<String, String>,
    pub data_faker: FakerConfig,
    pub template: TemplateToggles,
}

/// Sample-data settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FakerConfig {
    /// Locale used for names, cities, phone numbers (e.g. "en_US")
    pub locale: String,
}

/// Switches for optional parts of the generated script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateToggles {
    /// Emit a body-shape check after the status-code check
    pub add_response_validation: bool,
    /// Emit random test-data helper methods on the user class
    pub include_test_data_helpers: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let default_weight = [
            ("GET", 10),
            ("POST", 3),
            ("PUT", 2),
            ("PATCH", 2),
            ("DELETE", 1),
            ("HEAD", 1),
            ("OPTIONS", 1),
        ]
        .into_iter()
        .map(|(method, weight)| (method.to_string(), weight))
        .collect();

        let security_headers = [
            ("X-Content-Type-Options", "nosniff"),
            ("X-Frame-Options", "DENY"),
            ("X-XSS-Protection", "1; mode=block"),
            ("Referrer-Policy", "strict-origin-when-cross-origin"),
            ("Cache-Control", "no-cache, no-store, must-revalidate"),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

        Self {
            output_dir: PathBuf::from("."),
            min_wait: 1,
            max_wait: 3,
            default_weight,
            include_security_headers: true,
            security_headers,
            data_faker: FakerConfig {
                locale: "en_US".to_string(),
            },
            template: TemplateToggles {
                add_response_validation: true,
                include_test_data_helpers: true,
            },
        }
    }
}

/// Partial configuration read from a user file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverride {
    pub output_dir: Option<PathBuf>,
    pub min_wait: Option<u64>,
    pub max_wait: Option<u64>,
    pub default_weight: Option<IndexMap<String, u32>>,
    pub include_security_headers: Option<bool>,
    pub security_headers: Option<IndexMap<String, String>>,
    pub data_faker: Option<FakerOverride>,
    pub template: Option<TemplateOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FakerOverride {
    pub locale: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateOverride {
    pub add_response_validation: Option<bool>,
    pub include_test_data_helpers: Option<bool>,
}

impl ConfigOverride {
    /// Load an override from a `.yaml`, `.yml` or `.json` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GeneratorError::Config(format!(
                "Failed to read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            Some("json") => Self::from_json(&content),
            other => Err(GeneratorError::Config(format!(
                "Unsupported configuration file format: {}",
                other.map(|ext| format!(".{}", ext)).unwrap_or_else(|| {
                    "(no extension)".to_string()
                })
            ))),
        }
    }

    /// Parse an override from YAML text; an empty document is an empty override
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| GeneratorError::Config(format!("Invalid YAML configuration: {}", e)))
    }

    /// Parse an override from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| GeneratorError::Config(format!("Invalid JSON configuration: {}", e)))
    }
}

impl GenerationConfig {
    /// Defaults merged with the file at `path`, validated
    pub fn load(path: &Path) -> Result<Self> {
        let overrides = ConfigOverride::load(path)?;
        let config = Self::default().merged(overrides);
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Defaults, or defaults merged with `path` when given
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Overlay `overrides` on top of `self`
    ///
    /// Scalars are replaced; weight and header maps are merged per key so a
    /// user file only needs to list what it changes.
    pub fn merged(mut self, overrides: ConfigOverride) -> Self {
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
        if let Some(min) = overrides.min_wait {
            self.min_wait = min;
        }
        if let Some(max) = overrides.max_wait {
            self.max_wait = max;
        }
        if let Some(weights) = overrides.default_weight {
            for (method, weight) in weights {
                self.default_weight
                    .insert(method.trim().to_ascii_uppercase(), weight);
            }
        }
        if let Some(include) = overrides.include_security_headers {
            self.include_security_headers = include;
        }
        if let Some(headers) = overrides.security_headers {
            self.security_headers.extend(headers);
        }
        if let Some(locale) = overrides.data_faker.and_then(|f| f.locale) {
            self.data_faker.locale = locale;
        }
        if let Some(template) = overrides.template {
            if let Some(flag) = template.add_response_validation {
                self.template.add_response_validation = flag;
            }
            if let Some(flag) = template.include_test_data_helpers {
                self.template.include_test_data_helpers = flag;
            }
        }
        debug!(config = ?self, "Merged configuration");
        self
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.min_wait > self.max_wait {
            errors.push(format!(
                "min_wait ({}) cannot be greater than max_wait ({})",
                self.min_wait, self.max_wait
            ));
        }

        if self.output_dir.as_os_str().is_empty() {
            errors.push("output_dir must not be empty".to_string());
        }

        for method in self.default_weight.keys() {
            if !HttpMethod::ALL.iter().any(|m| m.as_str() == method) {
                errors.push(format!("Unknown HTTP method in default_weight: {}", method));
            }
        }

        for (name, value) in &self.security_headers {
            if name.trim().is_empty() || !name.chars().all(is_header_name_char) {
                errors.push(format!("Invalid security header name: {:?}", name));
            }
            if value.chars().any(char::is_control) {
                errors.push(format!(
                    "Security header {} contains control characters",
                    name
                ));
            }
        }

        if self.data_faker.locale.trim().is_empty() {
            errors.push("data_faker.locale must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(GeneratorError::Config(format!(
                "Configuration validation failed: {}",
                errors.join("; ")
            )))
        }
    }

    /// Task weight for `method`, falling back to [`FALLBACK_WEIGHT`]
    pub fn weight_for(&self, method: HttpMethod) -> u32 {
        self.default_weight
            .get(method.as_str())
            .copied()
            .unwrap_or(FALLBACK_WEIGHT)
    }

    /// Headers to send with every request, empty when disabled
    pub fn active_security_headers(&self) -> IndexMap<String, String> {
        if self.include_security_headers {
            self.security_headers.clone()
        } else {
            IndexMap::new()
        }
    }

    /// Serialize as YAML, usable as a starting configuration file
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// RFC 7230 token characters
fn is_header_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.min_wait, 1);
        assert_eq!(config.max_wait, 3);
        assert_eq!(config.weight_for(HttpMethod::Get), 10);
        assert_eq!(config.weight_for(HttpMethod::Post), 3);
        assert_eq!(config.weight_for(HttpMethod::Delete), 1);
        assert_eq!(config.data_faker.locale, "en_US");
        assert!(config.template.add_response_validation);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unlisted_method_falls_back() {
        let config = GenerationConfig::default();
        assert_eq!(config.weight_for(HttpMethod::Trace), FALLBACK_WEIGHT);
    }

    #[test]
    fn test_merge_keeps_unlisted_keys() {
        let overrides = ConfigOverride::from_yaml(
            r#"
min_wait: 2
max_wait: 5
default_weight:
  get: 20
security_headers:
  X-Test: "yes"
template:
  include_test_data_helpers: false
"#,
        )
        .unwrap();

        let config = GenerationConfig::default().merged(overrides);
        assert_eq!(config.min_wait, 2);
        assert_eq!(config.max_wait, 5);
        assert_eq!(config.weight_for(HttpMethod::Get), 20);
        assert_eq!(config.weight_for(HttpMethod::Post), 3);
        assert_eq!(config.security_headers["X-Test"], "yes");
        assert_eq!(config.security_headers["X-Frame-Options"], "DENY");
        assert!(!config.template.include_test_data_helpers);
        assert!(config.template.add_response_validation);
    }

    #[test]
    fn test_validate_rejects_inverted_wait() {
        let overrides = ConfigOverride::from_json(r#"{"min_wait": 10, "max_wait": 2}"#).unwrap();
        let config = GenerationConfig::default().merged(overrides);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_wait"));
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let result = ConfigOverride::from_yaml("wait_min: 3\n");
        assert!(matches!(result, Err(GeneratorError::Config(_))));
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        let overrides = ConfigOverride::from_yaml("default_weight:\n  FETCH: 4\n").unwrap();
        let config = GenerationConfig::default().merged(overrides);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_header_injection_is_rejected() {
        let overrides =
            ConfigOverride::from_json(r#"{"security_headers": {"X-Bad": "a\r\nb"}}"#).unwrap();
        let config = GenerationConfig::default().merged(overrides);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disabled_security_headers() {
        let overrides = ConfigOverride::from_yaml("include_security_headers: false\n").unwrap();
        let config = GenerationConfig::default().merged(overrides);
        assert!(config.active_security_headers().is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "data_faker:\n  locale: de_DE").unwrap();

        let config = GenerationConfig::load(file.path()).unwrap();
        assert_eq!(config.data_faker.locale, "de_DE");
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let file = Builder::new().suffix(".toml").tempfile().unwrap();
        let result = GenerationConfig::load(file.path());
        assert!(matches!(result, Err(GeneratorError::Config(_))));
    }

    #[test]
    fn test_empty_yaml_is_empty_override() {
        assert_eq!(
            ConfigOverride::from_yaml("   \n").unwrap(),
            ConfigOverride::default()
        );
    }

    #[test]
    fn test_yaml_round_trip_of_defaults() {
        let yaml = GenerationConfig::default().to_yaml().unwrap();
        assert!(yaml.contains("min_wait: 1"));
        assert!(yaml.contains("locale: en_US"));
    }
}
