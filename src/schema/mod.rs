//! Schema validators for inspectdb
//!
//! Validators are `$jsonSchema` descriptors installed per collection and
//! enforced at write time by the document store.
//!
//! # Design Principles
//!
//! - Validation is pure: `validate(document, schema)` needs no store
//! - Required fields, types, ranges, patterns and enums are checked
//! - Undeclared fields are permitted
//! - Every violation is reported, not only the first
//! - Deterministic validation

mod definitions;
mod errors;
mod loader;
mod types;
mod validator;

pub use definitions::{
    inspections_schema, restaurants_schema, ValidatorCommand, INSPECTIONS, INSPECTION_DATE_PATTERN,
    INSPECTION_RESULTS, RESTAURANTS,
};
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity, ValidationDetails};
pub use loader::ValidatorLoader;
pub use types::{BsonType, CollectionSchema, CollectionValidator, FieldDef, ValidationAction, ValidationLevel};
pub use validator::{validate, SchemaValidator, ValidationResult};
