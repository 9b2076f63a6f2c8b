//! Document validation against a `$jsonSchema` descriptor
//!
//! Validation semantics:
//! - Every field in `required` is present
//! - Every declared field that is present has the declared bsonType
//! - Numeric fields lie within `minimum`/`maximum` (inclusive)
//! - String fields satisfy `minLength` and `pattern`
//! - Values are members of `enum` when one is declared
//! - A present `null` never satisfies a declared bsonType
//! - Undeclared fields are permitted
//!
//! All violations are collected; validation does not stop at the first.

use regex::bytes::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::errors::{SchemaError, SchemaResult, ValidationDetails};
use super::types::{compile_pattern, BsonType, CollectionSchema, FieldDef};

/// Outcome of validating one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Violations in detection order
    pub violations: Vec<ValidationDetails>,
}

impl ValidationResult {
    /// Result with no violations
    pub fn valid() -> Self {
        Self::default()
    }

    /// Returns true if the document conforms
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Converts into a rejection error for the given collection
    pub fn into_result(self, collection: &str) -> SchemaResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(SchemaError::schema_rejected(collection, self.violations))
        }
    }

    fn push(&mut self, details: ValidationDetails) {
        self.violations.push(details);
    }
}

/// Validates a document against a descriptor.
///
/// Usable without any store. A descriptor whose pattern does not compile
/// yields a violation on that field rather than a panic.
pub fn validate(document: &Value, schema: &CollectionSchema) -> ValidationResult {
    match SchemaValidator::compile(schema) {
        Ok(validator) => validator.validate(document),
        Err(e) => ValidationResult {
            violations: vec![ValidationDetails::new("$schema", "well-formed descriptor", e.message())],
        },
    }
}

/// A descriptor with its patterns compiled once.
///
/// Validator does not mutate documents and is deterministic.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    schema: CollectionSchema,
    patterns: BTreeMap<String, Regex>,
}

impl SchemaValidator {
    /// Compiles a descriptor.
    ///
    /// # Errors
    ///
    /// Returns `CONFIGURATION_ERROR` if the descriptor is malformed.
    pub fn compile(schema: &CollectionSchema) -> SchemaResult<Self> {
        schema
            .validate_structure()
            .map_err(|e| SchemaError::malformed_descriptor("$jsonSchema", e))?;

        let mut patterns = BTreeMap::new();
        for (name, def) in &schema.properties {
            if let Some(pattern) = &def.pattern {
                let regex = compile_pattern(pattern)
                    .map_err(|e| SchemaError::malformed_descriptor("$jsonSchema", e.to_string()))?;
                patterns.insert(name.clone(), regex);
            }
        }

        Ok(Self {
            schema: schema.clone(),
            patterns,
        })
    }

    /// Returns the descriptor this validator enforces
    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    /// Validates a document, collecting every violation.
    pub fn validate(&self, document: &Value) -> ValidationResult {
        let mut result = ValidationResult::valid();

        let obj = match document.as_object() {
            Some(obj) => obj,
            None => {
                result.push(ValidationDetails::type_mismatch(
                    "$root",
                    "object",
                    json_type_name(document),
                ));
                return result;
            }
        };

        for name in &self.schema.required {
            if !obj.contains_key(name) {
                result.push(ValidationDetails::missing_field(name));
            }
        }

        for (name, def) in &self.schema.properties {
            if let Some(value) = obj.get(name) {
                self.validate_field(name, def, value, &mut result);
            }
        }

        result
    }

    /// Validates a document and converts violations into a rejection.
    pub fn check(&self, collection: &str, document: &Value) -> SchemaResult<()> {
        self.validate(document).into_result(collection)
    }

    fn validate_field(&self, name: &str, def: &FieldDef, value: &Value, result: &mut ValidationResult) {
        if value.is_null() {
            result.push(ValidationDetails::null_value(name));
            return;
        }

        if !type_matches(def.bson_type, value) {
            result.push(ValidationDetails::type_mismatch(
                name,
                def.bson_type.type_name(),
                json_type_name(value),
            ));
            return;
        }

        if let Some(n) = value.as_f64() {
            if let Some(min) = def.minimum {
                if n < min {
                    result.push(ValidationDetails::new(name, format!("value >= {}", min), n.to_string()));
                }
            }
            if let Some(max) = def.maximum {
                if n > max {
                    result.push(ValidationDetails::new(name, format!("value <= {}", max), n.to_string()));
                }
            }
        }

        if let Some(s) = value.as_str() {
            if let Some(min_length) = def.min_length {
                let len = s.chars().count();
                if len < min_length {
                    result.push(ValidationDetails::new(
                        name,
                        format!("length >= {}", min_length),
                        format!("length {}", len),
                    ));
                }
            }
            if let Some(regex) = self.patterns.get(name) {
                if !regex.is_match(s.as_bytes()) {
                    result.push(ValidationDetails::new(
                        name,
                        format!("match for pattern '{}'", regex.as_str()),
                        format!("'{}'", s),
                    ));
                }
            }
        }

        if let Some(allowed) = &def.enum_values {
            if !allowed.contains(value) {
                let expected = allowed
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                result.push(ValidationDetails::new(name, format!("one of [{}]", expected), value.to_string()));
            }
        }
    }
}

fn type_matches(expected: BsonType, value: &Value) -> bool {
    match expected {
        BsonType::String => value.is_string(),
        // Integers are accepted where a double is declared
        BsonType::Double => value.is_number(),
        BsonType::Int => value
            .as_i64()
            .map_or(false, |n| i32::try_from(n).is_ok()),
        BsonType::Long => value.is_i64(),
        BsonType::Bool => value.is_boolean(),
        BsonType::Object => value.is_object(),
        BsonType::Array => value.is_array(),
    }
}

/// Returns the type name of a JSON value for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "int"
            } else {
                "double"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
