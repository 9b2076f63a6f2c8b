//! Validator descriptor types
//!
//! The descriptor is the `$jsonSchema` subset the collections use:
//! - bsonType: string, double, int, long, bool, object, array
//! - required: list of field names that must be present
//! - properties: per-field type and constraints
//!
//! Undeclared fields are permitted. Descriptors deserialize directly
//! from the document database's command text.

use regex::bytes::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Compiles a `pattern` constraint.
///
/// Classes are ASCII-only, as in the document database: `\d` matches
/// `0-9` and nothing else. Non-ASCII literals still match their UTF-8 bytes.
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).unicode(false).build()
}

/// Supported BSON types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BsonType {
    /// UTF-8 string
    String,
    /// 64-bit floating point (integers accepted)
    Double,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// Boolean
    Bool,
    /// Embedded document
    Object,
    /// Array of any values
    Array,
}

impl BsonType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            BsonType::String => "string",
            BsonType::Double => "double",
            BsonType::Int => "int",
            BsonType::Long => "long",
            BsonType::Bool => "bool",
            BsonType::Object => "object",
            BsonType::Array => "array",
        }
    }
}

/// Property definition inside `properties`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    /// Declared type
    pub bson_type: BsonType,
    /// Inclusive numeric lower bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Inclusive numeric upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// Minimum string length in characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Regular expression the string must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Allowed values
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldDef {
    /// Creates an unconstrained field of the given type
    pub fn of_type(bson_type: BsonType) -> Self {
        Self {
            bson_type,
            minimum: None,
            maximum: None,
            min_length: None,
            pattern: None,
            enum_values: None,
            description: None,
        }
    }

    pub fn string() -> Self {
        Self::of_type(BsonType::String)
    }

    pub fn double() -> Self {
        Self::of_type(BsonType::Double)
    }

    pub fn int() -> Self {
        Self::of_type(BsonType::Int)
    }

    /// Sets an inclusive numeric range
    pub fn with_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Restricts the field to an enumerated set of strings
    pub fn with_enum<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(|v| Value::String(v.into())).collect());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A `$jsonSchema` descriptor for one collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSchema {
    /// Root type; only `object` is meaningful for documents
    pub bson_type: BsonType,
    /// Fields that must be present
    #[serde(default)]
    pub required: Vec<String>,
    /// Declared fields
    #[serde(default)]
    pub properties: BTreeMap<String, FieldDef>,
}

impl CollectionSchema {
    /// Creates an empty object schema
    pub fn new() -> Self {
        Self {
            bson_type: BsonType::Object,
            required: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Declares a required field
    pub fn required_field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, def);
        self
    }

    /// Declares an optional field
    pub fn optional_field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.properties.insert(name.into(), def);
        self
    }

    /// Validates the descriptor itself (not a document)
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.bson_type != BsonType::Object {
            return Err(format!(
                "root bsonType must be 'object', got '{}'",
                self.bson_type.type_name()
            ));
        }

        for (name, def) in &self.properties {
            if let (Some(min), Some(max)) = (def.minimum, def.maximum) {
                if min > max {
                    return Err(format!("field '{}': minimum {} exceeds maximum {}", name, min, max));
                }
            }
            if let Some(pattern) = &def.pattern {
                compile_pattern(pattern)
                    .map_err(|e| format!("field '{}': invalid pattern: {}", name, e))?;
            }
        }

        Ok(())
    }
}

impl Default for CollectionSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// Which writes the validator applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// No validation
    Off,
    /// Inserts, and updates to documents that already conform
    Moderate,
    /// Every insert and update
    #[default]
    Strict,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationLevel::Off => "off",
            ValidationLevel::Moderate => "moderate",
            ValidationLevel::Strict => "strict",
        }
    }

    /// Parses the command-text spelling
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "off" => Some(ValidationLevel::Off),
            "moderate" => Some(ValidationLevel::Moderate),
            "strict" => Some(ValidationLevel::Strict),
            _ => None,
        }
    }
}

/// What happens to a non-conforming write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationAction {
    /// Reject the write
    #[default]
    Error,
    /// Accept the write and log the violations
    Warn,
}

impl ValidationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationAction::Error => "error",
            ValidationAction::Warn => "warn",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "error" => Some(ValidationAction::Error),
            "warn" => Some(ValidationAction::Warn),
            _ => None,
        }
    }
}

/// A descriptor together with its enforcement settings
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionValidator {
    pub schema: CollectionSchema,
    pub level: ValidationLevel,
    pub action: ValidationAction,
}

impl CollectionValidator {
    /// Strict, rejecting validator
    pub fn strict(schema: CollectionSchema) -> Self {
        Self {
            schema,
            level: ValidationLevel::Strict,
            action: ValidationAction::Error,
        }
    }

    pub fn with_level(mut self, level: ValidationLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_action(mut self, action: ValidationAction) -> Self {
        self.action = action;
        self
    }
}
