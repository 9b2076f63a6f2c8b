//! Store Validation Tests
//!
//! Write-time enforcement of installed validators:
//! - strict/error rejects and leaves the collection unchanged
//! - warn accepts non-conforming writes
//! - off skips validation
//! - moderate exempts updates to documents that already failed
//! - re-installing an identical validator changes nothing

use inspectdb::model::{Inspection, InspectionResult, Restaurant};
use inspectdb::pipeline::CollectionSource;
use inspectdb::schema::{
    restaurants_schema, CollectionValidator, ValidationAction, ValidationLevel, ValidatorCommand,
    INSPECTIONS, RESTAURANTS,
};
use inspectdb::store::{DocumentStore, ObjectId, StoreError};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn validated_store() -> DocumentStore {
    let mut store = DocumentStore::with_collections([RESTAURANTS, INSPECTIONS]);
    for command in ValidatorCommand::defaults() {
        store.apply_command(&command).unwrap();
    }
    store
}

fn store_with(level: ValidationLevel, action: ValidationAction) -> DocumentStore {
    let mut store = DocumentStore::with_collections([RESTAURANTS]);
    store
        .install_validator(
            RESTAURANTS,
            CollectionValidator::strict(restaurants_schema())
                .with_level(level)
                .with_action(action),
        )
        .unwrap();
    store
}

fn out_of_range() -> Value {
    json!({"name": "Nowhere", "type_of_food": "Thai", "rating": 11})
}

// =============================================================================
// Installation Tests
// =============================================================================

/// Installing on a collection that does not exist is a configuration error.
#[test]
fn test_install_on_missing_collection() {
    let mut store = DocumentStore::new();
    let err = store
        .install_validator(RESTAURANTS, CollectionValidator::strict(restaurants_schema()))
        .unwrap_err();
    assert_eq!(err.code(), "CONFIGURATION_ERROR");
    assert!(!store.has_collection(RESTAURANTS));
}

/// Installing the same validator twice leaves acceptance unchanged.
#[test]
fn test_reinstall_is_idempotent() {
    let mut store = validated_store();
    let before = store.validator(RESTAURANTS).cloned();

    store.apply_command(&ValidatorCommand::restaurants()).unwrap();
    assert_eq!(store.validator(RESTAURANTS).cloned(), before);

    assert!(store.insert(RESTAURANTS, out_of_range()).is_err());
    assert!(store
        .insert(RESTAURANTS, json!({"name": "A", "type_of_food": "Thai", "rating": 10}))
        .is_ok());
    assert_eq!(store.count(RESTAURANTS), 1);
}

/// A new validator does not re-check documents already stored.
#[test]
fn test_install_does_not_recheck_existing() {
    let mut store = DocumentStore::with_collections([RESTAURANTS]);
    store.insert(RESTAURANTS, out_of_range()).unwrap();

    store
        .install_validator(RESTAURANTS, CollectionValidator::strict(restaurants_schema()))
        .unwrap();
    assert_eq!(store.count(RESTAURANTS), 1);
}

// =============================================================================
// Level and Action Tests
// =============================================================================

/// Strict/error rejects and leaves the collection unchanged.
#[test]
fn test_strict_error_rejects() {
    let mut store = validated_store();
    let err = store.insert(RESTAURANTS, out_of_range()).unwrap_err();

    assert!(err.is_rejection());
    match err {
        StoreError::Schema(e) => {
            assert_eq!(e.collection(), Some(RESTAURANTS));
            assert_eq!(e.details()[0].field, "rating");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(store.count(RESTAURANTS), 0);
}

/// Warn accepts the document.
#[test]
fn test_warn_accepts() {
    let mut store = store_with(ValidationLevel::Strict, ValidationAction::Warn);
    store.insert(RESTAURANTS, out_of_range()).unwrap();
    assert_eq!(store.count(RESTAURANTS), 1);
}

/// Off never validates.
#[test]
fn test_off_skips_validation() {
    let mut store = store_with(ValidationLevel::Off, ValidationAction::Error);
    store.insert(RESTAURANTS, json!({"rating": "great"})).unwrap();
    assert_eq!(store.count(RESTAURANTS), 1);
}

/// Moderate checks inserts and updates of conforming documents only.
#[test]
fn test_moderate_exempts_nonconforming_updates() {
    let mut store = DocumentStore::with_collections([RESTAURANTS]);
    let legacy = store.insert(RESTAURANTS, out_of_range()).unwrap();
    let good = store
        .insert(RESTAURANTS, json!({"name": "A", "type_of_food": "Thai"}))
        .unwrap();

    store
        .install_validator(
            RESTAURANTS,
            CollectionValidator::strict(restaurants_schema()).with_level(ValidationLevel::Moderate),
        )
        .unwrap();

    assert!(store.insert(RESTAURANTS, out_of_range()).is_err());
    store
        .replace(RESTAURANTS, &legacy, json!({"name": "Nowhere", "type_of_food": "Thai", "rating": 12}))
        .unwrap();
    assert!(store
        .replace(RESTAURANTS, &good, json!({"name": "", "type_of_food": "Thai"}))
        .is_err());
    assert_eq!(store.get(RESTAURANTS, &good).unwrap()["name"], json!("A"));
}

/// Strict checks every replacement.
#[test]
fn test_strict_checks_replacements() {
    let mut store = validated_store();
    let id = store
        .insert(RESTAURANTS, json!({"name": "A", "type_of_food": "Thai"}))
        .unwrap();

    assert!(store.replace(RESTAURANTS, &id, out_of_range()).is_err());
    store
        .replace(RESTAURANTS, &id, json!({"name": "A", "type_of_food": "Thai", "rating": 7.5}))
        .unwrap();
    assert_eq!(store.get(RESTAURANTS, &id).unwrap()["rating"], json!(7.5));
}

// =============================================================================
// Document Tests
// =============================================================================

/// Typed records insert through the validators.
#[test]
fn test_typed_records() {
    let mut store = validated_store();
    let id = store
        .insert_record(
            RESTAURANTS,
            &Restaurant::new("Golden Dragon", "Chinese")
                .with_rating(4.5)
                .with_url("http://example.com/golden-dragon"),
        )
        .unwrap();

    store
        .insert_record(INSPECTIONS, &Inspection::of(&id, "Jul 31 2022", InspectionResult::ViolationIssued))
        .unwrap();

    let stored: Inspection = serde_json::from_value(store.documents(INSPECTIONS)[0].clone()).unwrap();
    assert_eq!(stored.restaurant_id, id.to_hex());
    assert_eq!(stored.result, InspectionResult::ViolationIssued);
}

/// An inspection with an unknown result is rejected.
#[test]
fn test_inspection_result_enum() {
    let mut store = validated_store();
    let err = store
        .insert(
            INSPECTIONS,
            json!({"restaurant_id": ObjectId::new().to_hex(), "date": "Jan 5 2020", "result": "Closed"}),
        )
        .unwrap_err();
    assert_eq!(err.code(), "SCHEMA_REJECTED");
}

/// `_id` values are unique per collection.
#[test]
fn test_duplicate_id() {
    let mut store = validated_store();
    let id = ObjectId::new();
    let doc = json!({"_id": id.to_value(), "name": "A", "type_of_food": "Thai"});

    store.insert(RESTAURANTS, doc.clone()).unwrap();
    let err = store.insert(RESTAURANTS, doc).unwrap_err();
    assert_eq!(err.code(), "DUPLICATE_KEY");
}
