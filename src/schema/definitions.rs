//! Validator definitions for the `restaurants` and `inspections` collections
//! and the `collMod` command that installs them.

use serde_json::{json, Value};

use super::errors::{SchemaError, SchemaResult};
use super::types::{CollectionSchema, CollectionValidator, FieldDef, ValidationAction, ValidationLevel};

pub const RESTAURANTS: &str = "restaurants";
pub const INSPECTIONS: &str = "inspections";

/// Inspection outcomes accepted by the `inspections` validator
pub const INSPECTION_RESULTS: [&str; 3] = ["Pass", "Fail", "Violation Issued"];

/// `Mon D[D] YYYY`, e.g. `Jul 31 2022`
pub const INSPECTION_DATE_PATTERN: &str =
    r"^(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec) \d{1,2} \d{4}$";

/// Descriptor for `restaurants`.
///
/// `URL` is read by the reports but intentionally left undeclared.
pub fn restaurants_schema() -> CollectionSchema {
    CollectionSchema::new()
        .required_field(
            "name",
            FieldDef::string()
                .with_min_length(1)
                .with_description("Restaurant name, required."),
        )
        .required_field(
            "type_of_food",
            FieldDef::string()
                .with_min_length(1)
                .with_description("Cuisine category, required."),
        )
        .optional_field(
            "rating",
            FieldDef::double()
                .with_range(0.0, 10.0)
                .with_description("Restaurant rating between 0 and 10."),
        )
        .optional_field(
            "address",
            FieldDef::string().with_description("Restaurant address."),
        )
}

/// Descriptor for `inspections`.
pub fn inspections_schema() -> CollectionSchema {
    CollectionSchema::new()
        .required_field(
            "restaurant_id",
            FieldDef::string().with_description("Must reference a restaurant."),
        )
        .required_field(
            "date",
            FieldDef::string()
                .with_pattern(INSPECTION_DATE_PATTERN)
                .with_description("Date formatted as 'Mon DD YYYY' (e.g. 'Jul 31 2022')."),
        )
        .required_field(
            "result",
            FieldDef::string()
                .with_enum(INSPECTION_RESULTS)
                .with_description("Must be 'Pass', 'Fail' or 'Violation Issued'."),
        )
        .optional_field(
            "certificate_number",
            FieldDef::int().with_description("Inspection certificate number."),
        )
}

/// A `collMod` command installing a validator on a collection
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorCommand {
    pub collection: String,
    pub validator: CollectionValidator,
}

impl ValidatorCommand {
    pub fn new(collection: impl Into<String>, validator: CollectionValidator) -> Self {
        Self {
            collection: collection.into(),
            validator,
        }
    }

    /// Strict validator command for `restaurants`
    pub fn restaurants() -> Self {
        Self::new(RESTAURANTS, CollectionValidator::strict(restaurants_schema()))
    }

    /// Strict validator command for `inspections`
    pub fn inspections() -> Self {
        Self::new(INSPECTIONS, CollectionValidator::strict(inspections_schema()))
    }

    /// Both collection validators, in installation order
    pub fn defaults() -> Vec<Self> {
        vec![Self::restaurants(), Self::inspections()]
    }

    /// Renders the database command document.
    pub fn to_command(&self) -> Value {
        json!({
            "collMod": self.collection,
            "validator": { "$jsonSchema": self.validator.schema },
            "validationLevel": self.validator.level.as_str(),
            "validationAction": self.validator.action.as_str(),
        })
    }

    /// Parses a command document.
    ///
    /// `validationLevel` and `validationAction` are read at the top level or,
    /// failing that, inside `validator`. Both default to strict/error.
    pub fn from_command(command: &Value) -> SchemaResult<Self> {
        let collection = command
            .get("collMod")
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaError::malformed_descriptor("collMod", "missing collection name"))?;

        let validator = command
            .get("validator")
            .ok_or_else(|| SchemaError::malformed_descriptor(collection, "missing 'validator'"))?;

        let raw_schema = validator
            .get("$jsonSchema")
            .ok_or_else(|| SchemaError::malformed_descriptor(collection, "missing '$jsonSchema'"))?;

        let schema: CollectionSchema = serde_json::from_value(raw_schema.clone())
            .map_err(|e| SchemaError::malformed_descriptor(collection, e.to_string()))?;

        schema
            .validate_structure()
            .map_err(|e| SchemaError::malformed_descriptor(collection, e))?;

        let setting = |key: &str| {
            command
                .get(key)
                .or_else(|| validator.get(key))
                .and_then(Value::as_str)
        };

        let level = match setting("validationLevel") {
            None => ValidationLevel::default(),
            Some(s) => ValidationLevel::parse(s).ok_or_else(|| {
                SchemaError::malformed_descriptor(collection, format!("unknown validationLevel '{}'", s))
            })?,
        };

        let action = match setting("validationAction") {
            None => ValidationAction::default(),
            Some(s) => ValidationAction::parse(s).ok_or_else(|| {
                SchemaError::malformed_descriptor(collection, format!("unknown validationAction '{}'", s))
            })?,
        };

        Ok(Self::new(
            collection,
            CollectionValidator {
                schema,
                level,
                action,
            },
        ))
    }
}
