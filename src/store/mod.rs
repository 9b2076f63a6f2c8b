//! In-memory document store
//!
//! Holds the `restaurants` and `inspections` collections, enforces installed
//! validators on insert and replace, and serves documents to the pipeline
//! evaluator through `CollectionSource`.

mod errors;
mod object_id;
#[allow(clippy::module_inception)]
mod store;

pub use errors::{StoreError, StoreResult};
pub use object_id::ObjectId;
pub use store::DocumentStore;
