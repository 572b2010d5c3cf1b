use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default deadline for writing an error response
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported config file extension: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Exception filter configuration, fixed for the lifetime of the filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Include stack, details, method and user agent; disables sanitization
    pub is_development: bool,
    /// Redact credentials and personal data from messages in production
    pub enable_sanitization: bool,
    /// Report each error to the rate limit tracker
    pub enable_rate_limit_tracking: bool,
    /// Report each error to the metrics collector
    pub enable_metrics: bool,
    /// Replacement `error` text per status code
    #[serde(deserialize_with = "status_keys::deserialize")]
    pub custom_error_messages: HashMap<u16, String>,
    /// Deadline for writing the response body
    pub write_timeout_ms: u64,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            is_development: false,
            enable_sanitization: true,
            enable_rate_limit_tracking: false,
            enable_metrics: false,
            custom_error_messages: HashMap::new(),
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
        }
    }
}

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verbose, unredacted errors
    pub fn development() -> Self {
        Self::new().with_development(true)
    }

    pub fn production() -> Self {
        Self::new().with_development(false).with_sanitization(true)
    }

    pub fn with_development(mut self, enabled: bool) -> Self {
        self.is_development = enabled;
        self
    }

    pub fn with_sanitization(mut self, enabled: bool) -> Self {
        self.enable_sanitization = enabled;
        self
    }

    pub fn with_rate_limit_tracking(mut self, enabled: bool) -> Self {
        self.enable_rate_limit_tracking = enabled;
        self
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.enable_metrics = enabled;
        self
    }

    pub fn with_custom_error_message(mut self, status: u16, message: impl Into<String>) -> Self {
        self.custom_error_messages.insert(status, message.into());
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Whether redaction applies: enabled and not in development
    pub fn sanitization_active(&self) -> bool {
        self.enable_sanitization && !self.is_development
    }

    /// Load options from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            is_development: std::env::var("APP_ENV")
                .map(|env| env.eq_ignore_ascii_case("development"))
                .unwrap_or(defaults.is_development),
            enable_sanitization: env_flag("ERROR_SANITIZATION")
                .unwrap_or(defaults.enable_sanitization),
            enable_rate_limit_tracking: env_flag("ERROR_RATE_LIMIT_TRACKING")
                .unwrap_or(defaults.enable_rate_limit_tracking),
            enable_metrics: env_flag("ERROR_METRICS").unwrap_or(defaults.enable_metrics),
            custom_error_messages: defaults.custom_error_messages,
            write_timeout_ms: std::env::var("ERROR_WRITE_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.write_timeout_ms),
        }
    }

    /// Load options from a `.toml`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let options: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&contents)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(
                    other.unwrap_or_default().to_string(),
                ))
            }
        };
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.write_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "write_timeout_ms must be greater than 0".to_string(),
            ));
        }

        for (status, message) in &self.custom_error_messages {
            if !(400..=599).contains(status) {
                return Err(ConfigError::Invalid(format!(
                    "custom error message for {status} must target a 4xx or 5xx status"
                )));
            }
            if message.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "custom error message for {status} cannot be empty"
                )));
            }
        }

        Ok(())
    }
}

/// Status-code map keys arrive as strings in TOML and JSON, as integers in YAML
mod status_keys {
    use std::collections::HashMap;
    use std::fmt;

    use serde::de::{self, Deserializer, Visitor};
    use serde::Deserialize;

    #[derive(PartialEq, Eq, Hash)]
    struct StatusKey(u16);

    impl<'de> Deserialize<'de> for StatusKey {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            struct StatusKeyVisitor;

            impl Visitor<'_> for StatusKeyVisitor {
                type Value = StatusKey;

                fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    f.write_str("an HTTP status code")
                }

                fn visit_u64<E: de::Error>(self, value: u64) -> Result<StatusKey, E> {
                    u16::try_from(value)
                        .map(StatusKey)
                        .map_err(|_| E::custom(format!("status code out of range: {value}")))
                }

                fn visit_i64<E: de::Error>(self, value: i64) -> Result<StatusKey, E> {
                    u16::try_from(value)
                        .map(StatusKey)
                        .map_err(|_| E::custom(format!("status code out of range: {value}")))
                }

                fn visit_str<E: de::Error>(self, value: &str) -> Result<StatusKey, E> {
                    value
                        .trim()
                        .parse()
                        .map(StatusKey)
                        .map_err(|_| E::custom(format!("invalid status code: {value}")))
                }
            }

            deserializer.deserialize_any(StatusKeyVisitor)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<HashMap<u16, String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = HashMap::<StatusKey, String>::deserialize(deserializer)?;
        Ok(raw.into_iter().map(|(key, message)| (key.0, message)).collect())
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .and_then(|value| match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}
