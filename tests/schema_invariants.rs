//! Schema Invariant Tests
//!
//! Tests for validator invariants:
//! - Validation is deterministic
//! - Required fields must be present
//! - Declared types, ranges, patterns and enums are enforced
//! - Undeclared fields are allowed
//! - Every violation is reported

use inspectdb::schema::{
    inspections_schema, restaurants_schema, validate, CollectionSchema, FieldDef, SchemaValidator,
    ValidatorCommand, INSPECTION_RESULTS,
};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn restaurant_validator() -> SchemaValidator {
    SchemaValidator::compile(&restaurants_schema()).unwrap()
}

fn inspection_validator() -> SchemaValidator {
    SchemaValidator::compile(&inspections_schema()).unwrap()
}

fn violated_fields(validator: &SchemaValidator, doc: &Value) -> Vec<String> {
    validator
        .validate(doc)
        .violations
        .into_iter()
        .map(|v| v.field)
        .collect()
}

// =============================================================================
// Determinism Tests
// =============================================================================

/// Same document validates the same way every time.
#[test]
fn test_validation_is_deterministic() {
    let validator = restaurant_validator();
    let good = json!({"name": "Golden Dragon", "type_of_food": "Chinese"});
    let bad = json!({"name": "Golden Dragon"});

    for _ in 0..100 {
        assert!(validator.validate(&good).is_valid());
        assert!(!validator.validate(&bad).is_valid());
    }
}

/// The free function and a compiled validator agree.
#[test]
fn test_pure_validation_matches_compiled() {
    let doc = json!({"restaurant_id": "abc", "date": "Feb 30 2021", "result": "Fail"});
    assert_eq!(
        validate(&doc, &inspections_schema()),
        inspection_validator().validate(&doc)
    );
}

// =============================================================================
// Restaurant Tests
// =============================================================================

/// Accepted iff name and type_of_food are non-empty strings and rating, when
/// present, lies in [0, 10].
#[test]
fn test_restaurant_acceptance_property() {
    let validator = restaurant_validator();
    let names = [json!("Golden Dragon"), json!(""), json!(7), Value::Null];
    let foods = [json!("Chinese"), json!(""), json!(["Thai"])];
    let ratings = [None, Some(json!(0)), Some(json!(10.0)), Some(json!(-0.5)), Some(json!(10.5)), Some(json!("5"))];

    for name in &names {
        for food in &foods {
            for rating in &ratings {
                let mut doc = json!({"name": name, "type_of_food": food});
                if let Some(rating) = rating {
                    doc["rating"] = rating.clone();
                }

                let expected = name.as_str().map_or(false, |s| !s.is_empty())
                    && food.as_str().map_or(false, |s| !s.is_empty())
                    && rating
                        .as_ref()
                        .map_or(true, |r| r.as_f64().map_or(false, |n| (0.0..=10.0).contains(&n)));

                assert_eq!(validator.validate(&doc).is_valid(), expected, "document {}", doc);
            }
        }
    }
}

/// Missing required fields are each reported.
#[test]
fn test_missing_required_fields_all_reported() {
    let fields = violated_fields(&restaurant_validator(), &json!({"rating": 4.5}));
    assert_eq!(fields, vec!["name", "type_of_food"]);
}

/// URL and other undeclared fields never cause a rejection.
#[test]
fn test_undeclared_fields_allowed() {
    let doc = json!({
        "name": "Golden Dragon",
        "type_of_food": "Chinese",
        "URL": 42,
        "postcode": "AB1 2CD"
    });
    assert!(restaurant_validator().validate(&doc).is_valid());
}

/// A non-object document is a single root violation.
#[test]
fn test_non_object_document() {
    let fields = violated_fields(&restaurant_validator(), &json!(["name"]));
    assert_eq!(fields, vec!["$root"]);
}

// =============================================================================
// Inspection Tests
// =============================================================================

/// Accepted iff restaurant_id, date and result are present and valid.
#[test]
fn test_inspection_acceptance_property() {
    let validator = inspection_validator();
    let ids = [Some(json!("64b0c0ffee")), Some(json!(12)), None];
    let dates = [
        Some(json!("Jan 5 2020")),
        Some(json!("Jul 31 2022")),
        Some(json!("2022-07-31")),
        Some(json!("July 31 2022")),
        Some(json!("Jul \u{663}\u{661} \u{662}\u{660}\u{662}\u{662}")),
        Some(json!("Jul \u{ff13}\u{ff11} 2022")),
        None,
    ];
    let results = [
        Some(json!("Pass")),
        Some(json!("Violation Issued")),
        Some(json!("pass")),
        Some(json!("Closed")),
        None,
    ];

    for id in &ids {
        for date in &dates {
            for result in &results {
                let mut doc = json!({});
                for (key, value) in [("restaurant_id", id), ("date", date), ("result", result)] {
                    if let Some(value) = value {
                        doc[key] = value.clone();
                    }
                }

                let expected = id.as_ref().map_or(false, Value::is_string)
                    && matches!(date.as_ref().and_then(Value::as_str), Some("Jan 5 2020" | "Jul 31 2022"))
                    && result
                        .as_ref()
                        .and_then(Value::as_str)
                        .map_or(false, |r| INSPECTION_RESULTS.contains(&r));

                assert_eq!(validator.validate(&doc).is_valid(), expected, "document {}", doc);
            }
        }
    }
}

/// certificate_number must fit a 32-bit integer.
#[test]
fn test_certificate_number_is_int() {
    let validator = inspection_validator();
    let base = json!({"restaurant_id": "abc", "date": "Mar 3 2023", "result": "Pass"});

    for (number, ok) in [(json!(12345), true), (json!(1.5), false), (json!(4_294_967_296_i64), false)] {
        let mut doc = base.clone();
        doc["certificate_number"] = number;
        assert_eq!(validator.validate(&doc).is_valid(), ok, "document {}", doc);
    }
}

/// A date that matches the shape but not the calendar is still accepted.
#[test]
fn test_date_pattern_is_shape_only() {
    let doc = json!({"restaurant_id": "abc", "date": "Feb 31 2021", "result": "Fail"});
    assert!(inspection_validator().validate(&doc).is_valid());
}

// =============================================================================
// Descriptor Tests
// =============================================================================

/// The rendered command parses back to the same validator.
#[test]
fn test_command_text_parses_back() {
    for command in ValidatorCommand::defaults() {
        let text = command.to_command();
        assert_eq!(ValidatorCommand::from_command(&text).unwrap(), command);
    }
}

/// The restaurants command carries the expected $jsonSchema.
#[test]
fn test_restaurants_command_shape() {
    let command = ValidatorCommand::restaurants().to_command();
    assert_eq!(command["collMod"], json!("restaurants"));
    assert_eq!(command["validationLevel"], json!("strict"));
    assert_eq!(command["validationAction"], json!("error"));

    let schema = &command["validator"]["$jsonSchema"];
    assert_eq!(schema["bsonType"], json!("object"));
    assert_eq!(schema["required"], json!(["name", "type_of_food"]));
    assert_eq!(schema["properties"]["rating"]["minimum"], json!(0.0));
    assert_eq!(schema["properties"]["rating"]["maximum"], json!(10.0));
}

/// A descriptor whose range is inverted is malformed.
#[test]
fn test_inverted_range_is_malformed() {
    let command = json!({
        "collMod": "restaurants",
        "validator": {"$jsonSchema": {
            "bsonType": "object",
            "required": ["name"],
            "properties": {
                "name": {"bsonType": "string"},
                "rating": {"bsonType": "double", "minimum": 10, "maximum": 0}
            }
        }}
    });
    let err = ValidatorCommand::from_command(&command).unwrap_err();
    assert_eq!(err.code().code(), "CONFIGURATION_ERROR");
}

/// Hand-built schemas validate the same way as the built-in ones.
#[test]
fn test_custom_schema() {
    let schema = CollectionSchema::new()
        .required_field("name", FieldDef::string().with_min_length(3))
        .optional_field("stars", FieldDef::int().with_range(1.0, 5.0));
    let validator = SchemaValidator::compile(&schema).unwrap();

    assert!(validator.validate(&json!({"name": "Bao"})).is_valid());
    assert_eq!(violated_fields(&validator, &json!({"name": "Bo", "stars": 6})), vec!["name", "stars"]);
}
