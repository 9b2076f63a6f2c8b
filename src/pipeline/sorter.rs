//! Result sorting for `find` and `$sort`
//!
//! Multi-key and stable: documents tied on every key keep their input order.

use serde_json::{Map, Value};
use std::cmp::Ordering;

use super::values::{compare_values, resolve_path};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Command-syntax value: 1 or -1
    pub fn as_i64(self) -> i64 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    /// Dotted field path
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Renders a key list as `{field: 1|-1, ..}`
    pub fn render(specs: &[SortSpec]) -> Value {
        let mut out = Map::new();
        for spec in specs {
            out.insert(spec.field.clone(), Value::from(spec.direction.as_i64()));
        }
        Value::Object(out)
    }
}

/// Sorts result documents
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts documents by the keys in priority order.
    pub fn sort(documents: &mut [Value], specs: &[SortSpec]) {
        if specs.is_empty() {
            return;
        }
        documents.sort_by(|a, b| Self::compare(a, b, specs));
    }

    fn compare(a: &Value, b: &Value, specs: &[SortSpec]) -> Ordering {
        for spec in specs {
            let a_val = resolve_path(a, &spec.field);
            let b_val = resolve_path(b, &spec.field);
            let ordering = compare_values(a_val.as_ref(), b_val.as_ref());
            let ordering = match spec.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}
