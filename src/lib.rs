//! inspectdb - schema validators and a query catalog for restaurant
//! inspection documents
//!
//! Two collections, `restaurants` and `inspections`, are guarded by
//! `$jsonSchema` validators and read through a fixed catalog of find and
//! aggregation queries executed by an in-memory pipeline engine.

pub mod catalog;
pub mod cli;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod schema;
pub mod store;
