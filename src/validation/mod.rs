//! Declarative request validation.
//!
//! A [`Schema`] describes the expected shape of the body and query parts of a
//! request. The synchronous pass ([`Schema::check`]) validates every declared
//! field eagerly, strips unknown fields, coerces values, and aggregates all
//! field errors into a single 400. Reference fields are only *collected*
//! here; confirming they exist in the store is a separate async pass in
//! [`exists::run_reference_checks`], so shape checking stays pure.
//!
//! Path identifiers are covered by [`crate::types::RecordId::parse`] in the
//! handlers.

pub mod exists;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::types::RecordId;

use exists::ModelToken;

#[derive(Debug, Clone)]
pub enum FieldKind {
    /// UTF-8 text with inclusive length bounds.
    Text { min: usize, max: usize },
    /// Loose email shape check (local@domain with a dotted domain).
    Email,
    /// 64-bit integer with inclusive bounds. String digits are coerced.
    Integer { min: i64, max: i64 },
    /// One of a fixed set of string values.
    Enumeration(&'static [&'static str]),
    /// 24-hex record id referencing another collection. Values that do not
    /// match the id pattern fail here, before any store lookup.
    Reference(ModelToken),
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: &'static str,
    pub required: bool,
    pub kind: FieldKind,
}

impl FieldRule {
    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            required: true,
            kind,
        }
    }

    pub fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            required: false,
            kind,
        }
    }
}

/// Declarative request shape: rules per request part.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    body: Vec<FieldRule>,
    query: Vec<FieldRule>,
}

impl Schema {
    pub fn body(rules: Vec<FieldRule>) -> Self {
        Self {
            body: rules,
            query: Vec::new(),
        }
    }

    pub fn query(rules: Vec<FieldRule>) -> Self {
        Self {
            body: Vec::new(),
            query: rules,
        }
    }

    pub fn with_query(mut self, rules: Vec<FieldRule>) -> Self {
        self.query = rules;
        self
    }

    /// Synchronous validation pass. Checks all declared parts eagerly and
    /// aggregates every field error into one message.
    pub fn check(&self, body: &Value, query: &Value) -> Result<Sanitized, ApiError> {
        let mut errors = Vec::new();
        let mut references = Vec::new();

        let body_values = check_part(&self.body, body, &mut errors, &mut references);
        let query_values = check_part(&self.query, query, &mut errors, &mut references);

        if errors.is_empty() {
            Ok(Sanitized {
                body: body_values,
                query: query_values,
                references,
            })
        } else {
            Err(ApiError::validation(errors.join(", ")))
        }
    }
}

fn check_part(
    rules: &[FieldRule],
    input: &Value,
    errors: &mut Vec<String>,
    references: &mut Vec<ReferenceCheck>,
) -> Map<String, Value> {
    let empty = Map::new();
    let input = match input {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => {
            if !rules.is_empty() {
                errors.push("request part must be an object".to_string());
            }
            &empty
        }
    };

    let mut out = Map::new();
    for rule in rules {
        let value = match input.get(rule.name) {
            Some(Value::Null) | None => {
                if rule.required {
                    errors.push(format!("{} is required", rule.name));
                }
                continue;
            }
            Some(value) => value,
        };

        match check_field(rule, value, references) {
            Ok(coerced) => {
                out.insert(rule.name.to_string(), coerced);
            }
            Err(message) => errors.push(message),
        }
    }
    // Unknown fields are stripped: only declared fields make it into `out`.
    out
}

fn check_field(
    rule: &FieldRule,
    value: &Value,
    references: &mut Vec<ReferenceCheck>,
) -> Result<Value, String> {
    match &rule.kind {
        FieldKind::Text { min, max } => {
            let s = value
                .as_str()
                .ok_or_else(|| format!("{} must be a string", rule.name))?;
            let len = s.chars().count();
            if len < *min || len > *max {
                return Err(format!(
                    "{} must be between {} and {} characters",
                    rule.name, min, max
                ));
            }
            Ok(Value::String(s.to_string()))
        }
        FieldKind::Email => {
            let s = value
                .as_str()
                .ok_or_else(|| format!("{} must be a string", rule.name))?;
            if !is_valid_email(s) {
                return Err(format!("{} must be a valid email", rule.name));
            }
            Ok(Value::String(s.to_lowercase()))
        }
        FieldKind::Integer { min, max } => {
            let n = match value {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.parse::<i64>().ok(),
                _ => None,
            }
            .ok_or_else(|| format!("{} must be an integer", rule.name))?;
            if n < *min || n > *max {
                return Err(format!(
                    "{} must be between {} and {}",
                    rule.name, min, max
                ));
            }
            Ok(Value::from(n))
        }
        FieldKind::Enumeration(allowed) => {
            let s = value
                .as_str()
                .ok_or_else(|| format!("{} must be a string", rule.name))?;
            if !allowed.contains(&s) {
                return Err(format!(
                    "{} must be one of: {}",
                    rule.name,
                    allowed.join(", ")
                ));
            }
            Ok(Value::String(s.to_string()))
        }
        FieldKind::Reference(model) => {
            let s = value
                .as_str()
                .ok_or_else(|| format!("{} must be a string", rule.name))?;
            // Fail fast on the id pattern; no lookup is attempted for a
            // malformed value.
            let id = RecordId::parse(s)
                .map_err(|_| format!("{} must be a valid record id", rule.name))?;
            references.push(ReferenceCheck {
                model: *model,
                field: rule.name,
                id,
            });
            Ok(Value::String(s.to_string()))
        }
    }
}

fn is_valid_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// A reference field awaiting an existence check.
#[derive(Debug, Clone)]
pub struct ReferenceCheck {
    pub model: ModelToken,
    pub field: &'static str,
    pub id: RecordId,
}

/// Output of a successful sync pass: coerced values with unknown fields
/// stripped, plus the collected reference checks.
#[derive(Debug)]
pub struct Sanitized {
    body: Map<String, Value>,
    query: Map<String, Value>,
    references: Vec<ReferenceCheck>,
}

impl Sanitized {
    pub fn references(&self) -> &[ReferenceCheck] {
        &self.references
    }

    pub fn query_i64(&self, name: &str) -> Option<i64> {
        self.query.get(name).and_then(Value::as_i64)
    }

    /// Deserialize the sanitized body into a typed request struct.
    pub fn into_body<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        serde_json::from_value(Value::Object(self.body))
            .map_err(|e| ApiError::internal(anyhow::anyhow!("sanitized body mismatch: {}", e)))
    }
}
