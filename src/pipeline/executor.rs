//! Pipeline executor
//!
//! Runs `find` queries and aggregation pipelines over any `CollectionSource`.
//!
//! Execution flow:
//! 1. Read every document of the source collection (unknown collection = empty)
//! 2. Apply stages in order, each consuming the previous stage's output
//! 3. Return documents in final order
//!
//! Any stage error aborts the run; no partial results are returned.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use super::errors::{QueryError, QueryResult};
use super::expr::{Expr, Variables};
use super::filters::{Filter, FilterOp, Predicate, PredicateFilter};
use super::result::ExecutionResult;
use super::sorter::{ResultSorter, SortSpec};
use super::stage::{Accumulator, Lookup, Pipeline, ProjectField, Stage};
use super::values::{float_value, group_key, resolve_path, Num};

/// Trait for reading the documents of a named collection
pub trait CollectionSource {
    /// All documents in insertion order; empty for an unknown collection
    fn documents(&self, collection: &str) -> &[Value];
}

impl CollectionSource for BTreeMap<String, Vec<Value>> {
    fn documents(&self, collection: &str) -> &[Value] {
        self.get(collection).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl CollectionSource for HashMap<String, Vec<Value>> {
    fn documents(&self, collection: &str) -> &[Value] {
        self.get(collection).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Executes queries against a collection source
pub struct PipelineExecutor<'a, S: CollectionSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: CollectionSource + ?Sized> PipelineExecutor<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Runs `find(filter).sort(sort)` on a collection.
    pub fn find(&self, collection: &str, filter: &Filter, sort: &[SortSpec]) -> QueryResult<ExecutionResult> {
        let docs = self.source.documents(collection);
        let mut matched = select(docs, filter, &Variables::new())?;
        ResultSorter::sort(&mut matched, sort);

        Ok(ExecutionResult::new(matched, docs.len()))
    }

    /// Runs an aggregation pipeline on a collection.
    pub fn aggregate(&self, collection: &str, pipeline: &Pipeline) -> QueryResult<ExecutionResult> {
        let docs = self.source.documents(collection);
        let output = self.run_over(docs, pipeline.stages(), &Variables::new())?;
        Ok(ExecutionResult::new(output, docs.len()))
    }

    /// Runs stages over borrowed input; a leading `$match` selects before cloning.
    fn run_over(&self, docs: &[Value], stages: &[Stage], vars: &Variables) -> QueryResult<Vec<Value>> {
        match stages.split_first() {
            Some((Stage::Match(filter), rest)) => self.run_stages(select(docs, filter, vars)?, rest, vars),
            _ => self.run_stages(docs.to_vec(), stages, vars),
        }
    }

    fn run_stages(&self, mut docs: Vec<Value>, stages: &[Stage], vars: &Variables) -> QueryResult<Vec<Value>> {
        for stage in stages {
            docs = self.run_stage(docs, stage, vars)?;
        }
        Ok(docs)
    }

    fn run_stage(&self, docs: Vec<Value>, stage: &Stage, vars: &Variables) -> QueryResult<Vec<Value>> {
        match stage {
            Stage::Match(filter) => {
                let mut out = Vec::with_capacity(docs.len());
                for doc in docs {
                    if filter.matches(&doc, vars)? {
                        out.push(doc);
                    }
                }
                Ok(out)
            }
            Stage::Group { id, accumulators } => group(docs, id, accumulators, vars),
            Stage::Sort(specs) => {
                let mut docs = docs;
                ResultSorter::sort(&mut docs, specs);
                Ok(docs)
            }
            Stage::Project(fields) => docs.iter().map(|doc| project(doc, fields, vars)).collect(),
            Stage::AddFields(fields) => docs.into_iter().map(|doc| add_fields(doc, fields, vars)).collect(),
            Stage::Unwind(field) => unwind(docs, field),
            Stage::Lookup(lookup) => docs.into_iter().map(|doc| self.lookup(doc, lookup, vars)).collect(),
            Stage::Limit(n) => {
                if *n <= 0 {
                    return Err(QueryError::invalid_stage("$limit", format!("limit must be positive, got {}", n)));
                }
                let mut docs = docs;
                docs.truncate(usize::try_from(*n).unwrap_or(usize::MAX));
                Ok(docs)
            }
        }
    }

    fn lookup(&self, mut doc: Value, lookup: &Lookup, vars: &Variables) -> QueryResult<Value> {
        let matched = match lookup {
            Lookup::Equality {
                from,
                local_field,
                foreign_field,
                ..
            } => {
                let local = resolve_path(&doc, local_field).unwrap_or(Value::Null);
                let predicate = match local {
                    Value::Array(items) => Predicate::new(foreign_field.as_str(), FilterOp::In(items)),
                    other => Predicate::eq(foreign_field.as_str(), other),
                };
                self.source
                    .documents(from)
                    .iter()
                    .filter(|foreign| PredicateFilter::matches_predicate(foreign, &predicate))
                    .cloned()
                    .collect()
            }
            Lookup::Correlated {
                from,
                let_vars,
                pipeline,
                ..
            } => {
                let mut bound = vars.clone();
                for (name, expr) in let_vars {
                    let value = expr.eval(&doc, vars)?.unwrap_or(Value::Null);
                    bound = bound.with(name.as_str(), value);
                }
                self.run_over(self.source.documents(from), pipeline.stages(), &bound)?
            }
        };

        set_field("$lookup", &mut doc, lookup.as_field(), Some(Value::Array(matched)))?;
        Ok(doc)
    }
}

/// Clones only the documents that satisfy `filter`
fn select(docs: &[Value], filter: &Filter, vars: &Variables) -> QueryResult<Vec<Value>> {
    let mut out = Vec::new();
    for doc in docs {
        if filter.matches(doc, vars)? {
            out.push(doc.clone());
        }
    }
    Ok(out)
}

/// Running state of one accumulator within one group
enum AccState {
    Sum(Num),
    Avg { total: f64, count: usize },
    Push(Vec<Value>),
}

impl AccState {
    fn new(acc: &Accumulator) -> Self {
        match acc {
            Accumulator::Sum(_) => AccState::Sum(Num::Int(0)),
            Accumulator::Avg(_) => AccState::Avg { total: 0.0, count: 0 },
            Accumulator::Push(_) => AccState::Push(Vec::new()),
        }
    }

    fn feed(&mut self, value: Option<Value>) {
        match self {
            AccState::Sum(sum) => {
                if let Some(n) = value.as_ref().and_then(Num::from_value) {
                    *sum = sum.add(n);
                }
            }
            AccState::Avg { total, count } => {
                if let Some(n) = value.as_ref().and_then(Num::from_value) {
                    *total += n.as_f64();
                    *count += 1;
                }
            }
            AccState::Push(items) => {
                if let Some(v) = value {
                    items.push(v);
                }
            }
        }
    }

    fn finish(self) -> Value {
        match self {
            AccState::Sum(sum) => sum.into_value(),
            AccState::Avg { count: 0, .. } => Value::Null,
            AccState::Avg { total, count } => float_value(total / count as f64),
            AccState::Push(items) => Value::Array(items),
        }
    }
}

fn accumulator_expr(acc: &Accumulator) -> &Expr {
    match acc {
        Accumulator::Sum(e) | Accumulator::Avg(e) | Accumulator::Push(e) => e,
    }
}

/// `$group`: groups are emitted in first-appearance order
fn group(
    docs: Vec<Value>,
    id: &Expr,
    accumulators: &[(String, Accumulator)],
    vars: &Variables,
) -> QueryResult<Vec<Value>> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(Value, Vec<AccState>)> = Vec::new();

    for doc in &docs {
        let key = id.eval(doc, vars)?.unwrap_or(Value::Null);
        let canonical = group_key(&key);
        let slot = match index.get(&canonical) {
            Some(&slot) => slot,
            None => {
                index.insert(canonical, groups.len());
                groups.push((key, accumulators.iter().map(|(_, acc)| AccState::new(acc)).collect()));
                groups.len() - 1
            }
        };

        let states = &mut groups[slot].1;
        for ((_, acc), state) in accumulators.iter().zip(states.iter_mut()) {
            state.feed(accumulator_expr(acc).eval(doc, vars)?);
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, states)| {
            let mut out = Map::new();
            out.insert("_id".to_string(), key);
            for ((name, _), state) in accumulators.iter().zip(states) {
                out.insert(name.clone(), state.finish());
            }
            Value::Object(out)
        })
        .collect())
}

fn check_field_name(stage: &'static str, name: &str) -> QueryResult<()> {
    if name.is_empty() || name.contains('.') || name.starts_with('$') {
        return Err(QueryError::invalid_stage(stage, format!("unsupported field name '{}'", name)));
    }
    Ok(())
}

/// Sets (or removes, for `None`) a top-level field
fn set_field(stage: &'static str, doc: &mut Value, name: &str, value: Option<Value>) -> QueryResult<()> {
    check_field_name(stage, name)?;
    let Value::Object(map) = doc else {
        return Err(QueryError::invalid_stage(stage, "input is not a document"));
    };
    match value {
        Some(v) => {
            map.insert(name.to_string(), v);
        }
        None => {
            map.remove(name);
        }
    }
    Ok(())
}

/// `$project`: inclusion (with computed fields) or exclusion.
///
/// `_id` is kept by inclusion projections unless explicitly excluded;
/// included fields keep document order and computed fields follow.
fn project(doc: &Value, fields: &[(String, ProjectField)], vars: &Variables) -> QueryResult<Value> {
    for (name, _) in fields {
        check_field_name("$project", name)?;
    }

    let excludes_other = fields
        .iter()
        .any(|(name, f)| name != "_id" && *f == ProjectField::Exclude);
    let includes_any = fields
        .iter()
        .any(|(name, f)| name != "_id" && *f != ProjectField::Exclude);
    if excludes_other && includes_any {
        return Err(QueryError::invalid_stage("$project", "cannot mix inclusion and exclusion"));
    }

    let empty = Map::new();
    let source = doc.as_object().unwrap_or(&empty);
    let spec_for = |name: &str| fields.iter().find(|(n, _)| n == name).map(|(_, f)| f);

    if !includes_any {
        let mut out = source.clone();
        for (name, _) in fields.iter().filter(|(_, f)| *f == ProjectField::Exclude) {
            out.remove(name);
        }
        return Ok(Value::Object(out));
    }

    let mut out = Map::new();
    match spec_for("_id") {
        Some(ProjectField::Exclude) => {}
        Some(ProjectField::Computed(expr)) => {
            if let Some(v) = expr.eval(doc, vars)? {
                out.insert("_id".to_string(), v);
            }
        }
        Some(ProjectField::Include) | None => {
            if let Some(id) = source.get("_id") {
                out.insert("_id".to_string(), id.clone());
            }
        }
    }

    for (name, value) in source {
        if name != "_id" && spec_for(name) == Some(&ProjectField::Include) {
            out.insert(name.clone(), value.clone());
        }
    }

    for (name, field) in fields.iter().filter(|(name, _)| name != "_id") {
        if let ProjectField::Computed(expr) = field {
            if let Some(v) = expr.eval(doc, vars)? {
                out.insert(name.clone(), v);
            }
        }
    }

    Ok(Value::Object(out))
}

/// `$addFields`: every expression sees the input document
fn add_fields(doc: Value, fields: &[(String, Expr)], vars: &Variables) -> QueryResult<Value> {
    let mut values = Vec::with_capacity(fields.len());
    for (name, expr) in fields {
        values.push((name, expr.eval(&doc, vars)?));
    }

    let mut out = doc;
    for (name, value) in values {
        set_field("$addFields", &mut out, name, value)?;
    }
    Ok(out)
}

/// `$unwind`: missing, null and empty arrays produce no output
fn unwind(docs: Vec<Value>, field: &str) -> QueryResult<Vec<Value>> {
    check_field_name("$unwind", field)?;

    let mut out = Vec::new();
    for doc in docs {
        let items = match doc.get(field) {
            None | Some(Value::Null) => continue,
            Some(Value::Array(items)) => items.clone(),
            Some(other) => vec![other.clone()],
        };
        for item in items {
            let mut copy = doc.clone();
            set_field("$unwind", &mut copy, field, Some(item))?;
            out.push(copy);
        }
    }
    Ok(out)
}
