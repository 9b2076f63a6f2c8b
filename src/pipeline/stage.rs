//! Aggregation stages and pipelines
//!
//! A `Pipeline` is an ordered list of stages. Every stage renders to the
//! database's command syntax so a pipeline built here can be sent to a real
//! store unchanged.

use serde_json::{json, Map, Value};

use super::expr::Expr;
use super::filters::Filter;
use super::sorter::SortSpec;

/// `$group` accumulators
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    /// `$sum`; integer while every input is an integer
    Sum(Expr),
    /// `$avg`; non-numeric inputs skipped, null when none remain
    Avg(Expr),
    /// `$push`; missing values skipped
    Push(Expr),
}

impl Accumulator {
    fn render(&self) -> Value {
        match self {
            Accumulator::Sum(e) => json!({ "$sum": e.render() }),
            Accumulator::Avg(e) => json!({ "$avg": e.render() }),
            Accumulator::Push(e) => json!({ "$push": e.render() }),
        }
    }
}

/// One `$project` entry
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectField {
    Include,
    Exclude,
    Computed(Expr),
}

impl ProjectField {
    fn render(&self) -> Value {
        match self {
            ProjectField::Include => json!(1),
            ProjectField::Exclude => json!(0),
            // A bare number or bool would read as include/exclude
            ProjectField::Computed(Expr::Literal(v)) if v.is_number() || v.is_boolean() => {
                json!({ "$literal": v })
            }
            ProjectField::Computed(e) => e.render(),
        }
    }
}

/// `$lookup` forms
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// `localField` equals `foreignField`
    Equality {
        from: String,
        local_field: String,
        foreign_field: String,
        as_field: String,
    },
    /// `let` bindings evaluated per input document, then a sub-pipeline
    /// over the foreign collection
    Correlated {
        from: String,
        let_vars: Vec<(String, Expr)>,
        pipeline: Pipeline,
        as_field: String,
    },
}

impl Lookup {
    pub fn as_field(&self) -> &str {
        match self {
            Lookup::Equality { as_field, .. } | Lookup::Correlated { as_field, .. } => as_field,
        }
    }

    fn render(&self) -> Value {
        match self {
            Lookup::Equality {
                from,
                local_field,
                foreign_field,
                as_field,
            } => json!({
                "from": from,
                "localField": local_field,
                "foreignField": foreign_field,
                "as": as_field,
            }),
            Lookup::Correlated {
                from,
                let_vars,
                pipeline,
                as_field,
            } => {
                let bindings: Map<String, Value> = let_vars
                    .iter()
                    .map(|(name, expr)| (name.clone(), expr.render()))
                    .collect();
                json!({
                    "from": from,
                    "let": bindings,
                    "pipeline": pipeline.render(),
                    "as": as_field,
                })
            }
        }
    }
}

/// A pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Filter),
    Group {
        id: Expr,
        accumulators: Vec<(String, Accumulator)>,
    },
    Sort(Vec<SortSpec>),
    Project(Vec<(String, ProjectField)>),
    AddFields(Vec<(String, Expr)>),
    /// Top-level array field name, without the `$` prefix
    Unwind(String),
    Lookup(Lookup),
    Limit(i64),
}

impl Stage {
    /// Stage operator name, e.g. `$group`
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Match(_) => "$match",
            Stage::Group { .. } => "$group",
            Stage::Sort(_) => "$sort",
            Stage::Project(_) => "$project",
            Stage::AddFields(_) => "$addFields",
            Stage::Unwind(_) => "$unwind",
            Stage::Lookup(_) => "$lookup",
            Stage::Limit(_) => "$limit",
        }
    }

    pub fn render(&self) -> Value {
        let body = match self {
            Stage::Match(filter) => filter.render(),
            Stage::Group { id, accumulators } => {
                let mut out = Map::new();
                out.insert("_id".to_string(), id.render());
                for (name, acc) in accumulators {
                    out.insert(name.clone(), acc.render());
                }
                Value::Object(out)
            }
            Stage::Sort(specs) => SortSpec::render(specs),
            Stage::Project(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, field)| (name.clone(), field.render()))
                    .collect(),
            ),
            Stage::AddFields(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, expr)| (name.clone(), expr.render()))
                    .collect(),
            ),
            Stage::Unwind(field) => Value::String(format!("${}", field)),
            Stage::Lookup(lookup) => lookup.render(),
            Stage::Limit(n) => Value::from(*n),
        };
        json!({ self.name(): body })
    }
}

/// An ordered list of stages
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn match_on(self, filter: Filter) -> Self {
        self.stage(Stage::Match(filter))
    }

    pub fn group<I, S>(self, id: Expr, accumulators: I) -> Self
    where
        I: IntoIterator<Item = (S, Accumulator)>,
        S: Into<String>,
    {
        self.stage(Stage::Group {
            id,
            accumulators: accumulators.into_iter().map(|(k, a)| (k.into(), a)).collect(),
        })
    }

    pub fn sort(self, specs: Vec<SortSpec>) -> Self {
        self.stage(Stage::Sort(specs))
    }

    pub fn project<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = (S, ProjectField)>,
        S: Into<String>,
    {
        self.stage(Stage::Project(
            fields.into_iter().map(|(k, f)| (k.into(), f)).collect(),
        ))
    }

    pub fn add_fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Expr)>,
        S: Into<String>,
    {
        self.stage(Stage::AddFields(
            fields.into_iter().map(|(k, e)| (k.into(), e)).collect(),
        ))
    }

    pub fn unwind(self, field: impl Into<String>) -> Self {
        self.stage(Stage::Unwind(field.into()))
    }

    pub fn lookup(self, lookup: Lookup) -> Self {
        self.stage(Stage::Lookup(lookup))
    }

    pub fn limit(self, n: i64) -> Self {
        self.stage(Stage::Limit(n))
    }

    /// Renders the stage array
    pub fn render(&self) -> Value {
        Value::Array(self.stages.iter().map(Stage::render).collect())
    }
}
