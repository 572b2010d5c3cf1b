use once_cell::sync::Lazy;
use regex::Regex;

use super::config::FilterOptions;
use crate::domain::FieldErrors;

/// Replacement for every redacted fragment
pub const REDACTED: &str = "[REDACTED]";

/// Redaction patterns, applied in order
static REDACTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)password[=:]\s*[^\s&]+",
        r"(?i)token[=:]\s*[^\s&]+",
        r"(?i)key[=:]\s*[^\s&]+",
        r"(?i)secret[=:]\s*[^\s&]+",
        r"(?i)api[_-]?key[=:]\s*[^\s&]+",
        r"(?i)authorization:\s*(?:(?:bearer|basic)\s+)?[^\s&]+",
        r"(?i)bearer\s+[^\s&]+",
        // Card numbers, optionally grouped by space or dash
        r"\b\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{4}\b",
        // SSN
        r"\b\d{3}-\d{2}-\d{4}\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("Invalid redaction pattern"))
    .collect()
});

/// Redacts credentials and personal data from error text
///
/// Only active in production with sanitization enabled; otherwise every
/// method returns its input unchanged.
#[derive(Debug, Clone, Copy)]
pub struct ErrorSanitizer {
    active: bool,
}

impl ErrorSanitizer {
    pub fn new(options: &FilterOptions) -> Self {
        Self {
            active: options.sanitization_active(),
        }
    }

    /// Sanitizer that always redacts
    pub fn enabled() -> Self {
        Self { active: true }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn sanitize(&self, text: &str) -> String {
        if self.active {
            Self::redact(text)
        } else {
            text.to_string()
        }
    }

    pub fn sanitize_pair(&self, message: &str, stack: Option<&str>) -> (String, Option<String>) {
        (self.sanitize(message), stack.map(|s| self.sanitize(s)))
    }

    pub fn sanitize_all(&self, messages: Vec<String>) -> Vec<String> {
        if !self.active {
            return messages;
        }
        messages.iter().map(|m| Self::redact(m)).collect()
    }

    /// Sanitize every constraint message, keeping field and constraint names
    pub fn sanitize_field_errors(&self, mut field_errors: FieldErrors) -> FieldErrors {
        if self.active {
            for message in field_errors.values_mut().flat_map(|c| c.values_mut()) {
                *message = Self::redact(message);
            }
        }
        field_errors
    }

    /// Apply the full redaction table regardless of configuration
    pub fn redact(text: &str) -> String {
        REDACTION_PATTERNS
            .iter()
            .fold(text.to_string(), |acc, pattern| {
                pattern.replace_all(&acc, REDACTED).into_owned()
            })
    }
}
