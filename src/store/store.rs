//! In-memory document store with per-collection validators
//!
//! Write path:
//! 1. Resolve the collection (inserts create it on first use)
//! 2. Resolve or assign `_id`
//! 3. Check the installed validator per its level and action
//! 4. Store the document
//!
//! A rejected write leaves the collection unchanged.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use super::errors::{StoreError, StoreResult};
use super::object_id::ObjectId;
use crate::observability::{log_event_with_fields, Event};
use crate::pipeline::CollectionSource;
use crate::schema::{
    CollectionValidator, SchemaError, SchemaValidator, ValidationAction, ValidationLevel, ValidationResult,
    ValidatorCommand,
};

/// An installed validator with its compiled form
#[derive(Debug, Clone)]
struct InstalledValidator {
    config: CollectionValidator,
    compiled: SchemaValidator,
}

#[derive(Debug, Clone, Default)]
struct Collection {
    documents: Vec<Value>,
    /// `_id` -> slot in `documents`
    index: HashMap<ObjectId, usize>,
    validator: Option<InstalledValidator>,
}

impl Collection {
    fn position(&self, id: &ObjectId) -> Option<usize> {
        self.index.get(id).copied()
    }

    fn push(&mut self, id: ObjectId, document: Value) {
        self.index.insert(id, self.documents.len());
        self.documents.push(document);
    }
}

/// Whether a validator check is for a new document or a replacement
enum WriteKind<'a> {
    Insert,
    Replace { previous: &'a Value },
}

/// In-memory document store
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    collections: BTreeMap<String, Collection>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with the named (empty) collections
    pub fn with_collections<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut store = Self::new();
        for name in names {
            store.create_collection(name);
        }
        store
    }

    /// Creates an empty collection. Returns false if it already existed.
    pub fn create_collection(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.collections.contains_key(&name) {
            return false;
        }
        self.collections.insert(name, Collection::default());
        true
    }

    pub fn has_collection(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    pub fn collection_names(&self) -> Vec<&str> {
        self.collections.keys().map(String::as_str).collect()
    }

    /// Installs or replaces the validator on an existing collection.
    ///
    /// Existing documents are not re-checked. Installing an identical
    /// validator again leaves the store unchanged.
    pub fn install_validator(&mut self, collection: &str, validator: CollectionValidator) -> StoreResult<()> {
        let entry = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| SchemaError::collection_not_found(collection))?;

        let compiled = SchemaValidator::compile(&validator.schema)?;

        log_event_with_fields(
            Event::ValidatorInstalled,
            &[
                ("collection", collection),
                ("level", validator.level.as_str()),
                ("action", validator.action.as_str()),
            ],
        );

        entry.validator = Some(InstalledValidator {
            config: validator,
            compiled,
        });
        Ok(())
    }

    /// Installs a validator from a `collMod` command
    pub fn apply_command(&mut self, command: &ValidatorCommand) -> StoreResult<()> {
        self.install_validator(&command.collection, command.validator.clone())
    }

    /// Installed validator settings, if any
    pub fn validator(&self, collection: &str) -> Option<&CollectionValidator> {
        self.collections
            .get(collection)
            .and_then(|c| c.validator.as_ref())
            .map(|v| &v.config)
    }

    /// Inserts a document, assigning `_id` when absent.
    pub fn insert(&mut self, collection: &str, document: Value) -> StoreResult<ObjectId> {
        let Value::Object(fields) = document else {
            return Err(StoreError::InvalidDocument(format!(
                "expected a JSON object for {}",
                collection
            )));
        };

        let (id, document) = with_object_id(fields)?;
        let entry = self.collections.entry(collection.to_string()).or_default();

        if entry.position(&id).is_some() {
            return Err(StoreError::DuplicateKey {
                collection: collection.to_string(),
                id: id.to_hex(),
            });
        }

        check_write(collection, entry.validator.as_ref(), &document, WriteKind::Insert)?;
        entry.push(id, document);
        Ok(id)
    }

    /// Serializes and inserts a typed record
    pub fn insert_record<T: Serialize>(&mut self, collection: &str, record: &T) -> StoreResult<ObjectId> {
        let document = serde_json::to_value(record).map_err(|e| StoreError::InvalidDocument(e.to_string()))?;
        self.insert(collection, document)
    }

    /// Replaces the document with the given `_id`.
    ///
    /// The replacement keeps `id`; a different `_id` in the body is an error.
    pub fn replace(&mut self, collection: &str, id: &ObjectId, document: Value) -> StoreResult<()> {
        let not_found = || StoreError::DocumentNotFound {
            collection: collection.to_string(),
            id: id.to_hex(),
        };

        let Value::Object(mut fields) = document else {
            return Err(StoreError::InvalidDocument(format!(
                "expected a JSON object for {}",
                collection
            )));
        };
        match fields.get("_id") {
            None => {
                fields.insert("_id".to_string(), id.to_value());
            }
            Some(existing) if ObjectId::from_value(existing).as_ref() == Some(id) => {}
            Some(_) => {
                return Err(StoreError::InvalidDocument(
                    "replacement may not change _id".to_string(),
                ))
            }
        }
        let (_, document) = with_object_id(fields)?;

        let entry = self.collections.get_mut(collection).ok_or_else(not_found)?;
        let slot = entry.position(id).ok_or_else(not_found)?;

        check_write(
            collection,
            entry.validator.as_ref(),
            &document,
            WriteKind::Replace {
                previous: &entry.documents[slot],
            },
        )?;
        entry.documents[slot] = document;
        Ok(())
    }

    /// Document with the given `_id`
    pub fn get(&self, collection: &str, id: &ObjectId) -> Option<&Value> {
        let entry = self.collections.get(collection)?;
        entry.position(id).map(|slot| &entry.documents[slot])
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, |c| c.documents.len())
    }
}

impl CollectionSource for DocumentStore {
    fn documents(&self, collection: &str) -> &[Value] {
        self.collections
            .get(collection)
            .map(|c| c.documents.as_slice())
            .unwrap_or(&[])
    }
}

/// Ensures `_id` is an ObjectId and the first field
fn with_object_id(mut fields: Map<String, Value>) -> StoreResult<(ObjectId, Value)> {
    let id = match fields.remove("_id") {
        None => ObjectId::new(),
        Some(raw) => ObjectId::from_value(&raw).ok_or_else(|| {
            StoreError::InvalidDocument(format!("_id must be an ObjectId, got {}", raw))
        })?,
    };

    let mut ordered = Map::new();
    ordered.insert("_id".to_string(), id.to_value());
    ordered.extend(fields);
    Ok((id, Value::Object(ordered)))
}

/// Applies the validator's level and action to one write
fn check_write(
    collection: &str,
    validator: Option<&InstalledValidator>,
    document: &Value,
    kind: WriteKind<'_>,
) -> StoreResult<()> {
    let Some(validator) = validator else {
        return Ok(());
    };

    let result = match (validator.config.level, kind) {
        (ValidationLevel::Off, _) => return Ok(()),
        (ValidationLevel::Moderate, WriteKind::Replace { previous })
            if !validator.compiled.validate(previous).is_valid() =>
        {
            return Ok(())
        }
        _ => validator.compiled.validate(document),
    };

    if result.is_valid() {
        return Ok(());
    }

    let summary = summarize(&result);
    match validator.config.action {
        ValidationAction::Warn => {
            log_event_with_fields(
                Event::ValidationWarning,
                &[("collection", collection), ("violations", summary.as_str())],
            );
            Ok(())
        }
        ValidationAction::Error => {
            log_event_with_fields(
                Event::DocumentRejected,
                &[("collection", collection), ("violations", summary.as_str())],
            );
            Err(SchemaError::schema_rejected(collection, result.violations).into())
        }
    }
}

fn summarize(result: &ValidationResult) -> String {
    result
        .violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
