//! Field-level validation failures
//!
//! [`ValidationException`] carries the ordered list of invalid fields
//! produced by the validation layer and exposes the derived views the
//! exception filter renders: a flat message list, messages grouped by field
//! and the first message.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// Messages grouped by field, then by constraint name
pub type FieldErrors = BTreeMap<String, BTreeMap<String, String>>;

/// One invalid field with the constraints it violated
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrorItem {
    pub property: String,
    /// (constraint name, message) in insertion order
    pub constraints: Vec<(String, String)>,
    pub value: Option<Value>,
}

impl ValidationErrorItem {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            constraints: Vec::new(),
            value: None,
        }
    }

    pub fn with_constraint(mut self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.constraints.push((name.into(), message.into()));
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.constraints.iter().map(|(_, message)| message.as_str())
    }
}

/// Typed carrier of field-level validation failures
#[derive(Debug, Clone, Error)]
#[error("Validation failed")]
pub struct ValidationException {
    items: Vec<ValidationErrorItem>,
}

impl ValidationException {
    pub const STATUS: StatusCode = StatusCode::BAD_REQUEST;

    pub fn new(items: Vec<ValidationErrorItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ValidationErrorItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every constraint message, fields in order, constraints in insertion order
    pub fn messages(&self) -> Vec<String> {
        self.items
            .iter()
            .flat_map(|item| item.messages().map(str::to_string))
            .collect()
    }

    pub fn field_errors(&self) -> FieldErrors {
        let mut grouped = FieldErrors::new();
        for item in &self.items {
            let constraints = grouped.entry(item.property.clone()).or_default();
            for (name, message) in &item.constraints {
                constraints.insert(name.clone(), message.clone());
            }
        }
        grouped
    }

    pub fn first_message(&self) -> Option<&str> {
        self.items.iter().flat_map(|item| item.messages()).next()
    }
}

impl From<ValidationErrors> for ValidationException {
    fn from(errors: ValidationErrors) -> Self {
        let mut items = Vec::new();
        collect_items(&errors, None, &mut items);
        Self::new(items)
    }
}

/// Flatten validator errors into items, nested fields as `parent.child` or `list[0].child`
fn collect_items(
    errors: &ValidationErrors,
    prefix: Option<&str>,
    items: &mut Vec<ValidationErrorItem>,
) {
    // Field order from the validator is a hash map; sort for stable output
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let property = match prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.to_string(),
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                items.push(field_item(&property, field_errors));
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_items(nested, Some(property.as_str()), items);
            }
            ValidationErrorsKind::List(entries) => {
                for (index, nested) in entries {
                    let entry = format!("{property}[{index}]");
                    collect_items(nested, Some(entry.as_str()), items);
                }
            }
        }
    }
}

fn field_item(property: &str, field_errors: &[ValidationError]) -> ValidationErrorItem {
    let mut item = ValidationErrorItem::new(property);
    for error in field_errors {
        let code = error.code.to_string();
        let message = error
            .message
            .as_ref()
            .map(|cow| cow.to_string())
            .unwrap_or_else(|| format!("{property} failed the {code} constraint"));
        if item.value.is_none() {
            item.value = error.params.get("value").cloned();
        }
        item = item.with_constraint(code, message);
    }
    item
}
