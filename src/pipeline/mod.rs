//! Query and aggregation evaluator for inspectdb
//!
//! Evaluates `find` filters and aggregation pipelines over in-memory
//! documents with the document database's semantics:
//! - `$match`, `$group`, `$sort`, `$project`, `$addFields`, `$unwind`,
//!   `$lookup` (equality and correlated forms), `$limit`
//! - Expressions: field paths, `$$` variables, literals, `$toString`,
//!   `$size`, `$slice`, `$divide`, `$multiply`, `$eq`, object construction
//!
//! Every query and pipeline renders back to command syntax via `render()`.

mod errors;
mod executor;
mod expr;
mod filters;
mod result;
mod sorter;
mod stage;
mod values;

pub use errors::{QueryError, QueryResult};
pub use executor::{CollectionSource, PipelineExecutor};
pub use expr::{Expr, Variables};
pub use filters::{Filter, FilterOp, Predicate, PredicateFilter};
pub use result::ExecutionResult;
pub use sorter::{ResultSorter, SortDirection, SortSpec};
pub use stage::{Accumulator, Lookup, Pipeline, ProjectField, Stage};
pub use values::{as_object_id, compare_values, values_equal, OID_KEY};
