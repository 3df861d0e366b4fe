//! Field-level errors and the coercions applied to raw request bodies

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::ValidationErrors;

/// One failed check, keyed by the JSON field name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    #[schema(example = "price")]
    pub field: String,
    #[schema(example = "price must not be negative")]
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn required(field: &str) -> Self {
        Self::new(field, format!("{field} is required"))
    }

    pub fn cast(field: &str, expected: &str, value: &Value) -> Self {
        Self::new(field, format!("Cast to {expected} failed for value {value}"))
    }
}

/// `true` for null, `""`, `[]` and `{}`.
///
/// Numbers and booleans always carry information, so `0` and `false` are kept.
pub fn is_considerably_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Flatten validator output into [`FieldError`]s named after the JSON fields.
pub fn from_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            let name = camel_case(field);
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{name} is invalid ({})", err.code));
                FieldError::new(name.clone(), message)
            })
        })
        .collect();

    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

pub(crate) fn cast_string(field: &str, value: Value) -> Result<String, FieldError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(FieldError::cast(field, "String", &other)),
    }
}

pub(crate) fn cast_number(field: &str, value: Value) -> Result<f64, FieldError> {
    let parsed = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| FieldError::cast(field, "Number", &value))
}

pub(crate) fn cast_integer(field: &str, value: Value) -> Result<i64, FieldError> {
    let parsed = match &value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| FieldError::cast(field, "Integer", &value))
}

pub(crate) fn cast_uuid(field: &str, value: Value) -> Result<Uuid, FieldError> {
    let parsed = match &value {
        Value::String(s) => Uuid::parse_str(s.trim()).ok(),
        _ => None,
    };

    parsed.ok_or_else(|| FieldError::cast(field, "UUID", &value))
}
