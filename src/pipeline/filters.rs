//! Predicate filtering for `find` and `$match`
//!
//! - All predicates must hold (AND semantics)
//! - Dotted paths traverse arrays; any candidate value may satisfy a predicate
//! - `$ne` holds only if no candidate equals the value (missing included)
//! - Comparisons only hold within one type bracket
//! - `$expr` evaluates an aggregation expression for truthiness

use serde_json::{json, Map, Value};
use std::cmp::Ordering;

use super::errors::QueryResult;
use super::expr::{Expr, Variables};
use super::values::{compare_values, path_candidates, same_bracket, values_equal};

/// Filter operation types
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// field = value
    Eq(Value),
    /// field != value
    Ne(Value),
    /// field > value
    Gt(Value),
    /// field >= value
    Gte(Value),
    /// field < value
    Lt(Value),
    /// field <= value
    Lte(Value),
    /// field in [values]
    In(Vec<Value>),
}

impl FilterOp {
    /// Returns the operator name in command syntax
    pub fn op_name(&self) -> &'static str {
        match self {
            FilterOp::Eq(_) => "$eq",
            FilterOp::Ne(_) => "$ne",
            FilterOp::Gt(_) => "$gt",
            FilterOp::Gte(_) => "$gte",
            FilterOp::Lt(_) => "$lt",
            FilterOp::Lte(_) => "$lte",
            FilterOp::In(_) => "$in",
        }
    }

    fn operand(&self) -> Value {
        match self {
            FilterOp::Eq(v)
            | FilterOp::Ne(v)
            | FilterOp::Gt(v)
            | FilterOp::Gte(v)
            | FilterOp::Lt(v)
            | FilterOp::Lte(v) => v.clone(),
            FilterOp::In(values) => Value::Array(values.clone()),
        }
    }
}

/// A single predicate (field + operation)
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Dotted field path
    pub field: String,
    /// Filter operation
    pub op: FilterOp,
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: FilterOp) -> Self {
        Self {
            field: field.into(),
            op,
        }
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Eq(value))
    }

    pub fn ne(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Ne(value))
    }

    pub fn gt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Gt(value))
    }

    pub fn gte(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Gte(value))
    }

    pub fn lt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Lt(value))
    }

    pub fn lte(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Lte(value))
    }

    pub fn in_list(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(field, FilterOp::In(values))
    }
}

/// Evaluates predicates against documents
pub struct PredicateFilter;

impl PredicateFilter {
    /// Checks if a document matches all predicates
    pub fn matches(document: &Value, predicates: &[Predicate]) -> bool {
        predicates.iter().all(|pred| Self::matches_predicate(document, pred))
    }

    /// Checks if a document matches a single predicate
    pub fn matches_predicate(document: &Value, predicate: &Predicate) -> bool {
        let candidates = path_candidates(document, &predicate.field);

        match &predicate.op {
            FilterOp::Eq(expected) => Self::eq_match(&candidates, expected),
            FilterOp::Ne(expected) => !Self::eq_match(&candidates, expected),
            FilterOp::Gt(bound) => Self::cmp_match(&candidates, bound, |o| o == Ordering::Greater),
            FilterOp::Gte(bound) => Self::cmp_match(&candidates, bound, |o| o != Ordering::Less),
            FilterOp::Lt(bound) => Self::cmp_match(&candidates, bound, |o| o == Ordering::Less),
            FilterOp::Lte(bound) => Self::cmp_match(&candidates, bound, |o| o != Ordering::Greater),
            FilterOp::In(values) => values.iter().any(|v| Self::eq_match(&candidates, v)),
        }
    }

    /// Equality; a null operand also matches a missing field
    fn eq_match(candidates: &[&Value], expected: &Value) -> bool {
        if expected.is_null() && candidates.is_empty() {
            return true;
        }
        candidates.iter().any(|c| values_equal(c, expected))
    }

    fn cmp_match(candidates: &[&Value], bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
        candidates
            .iter()
            .filter(|c| same_bracket(c, bound))
            .any(|c| accept(compare_values(Some(c), Some(bound))))
    }
}

/// A `find` filter or `$match` stage: predicates plus an optional `$expr`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    pub predicates: Vec<Predicate>,
    pub expr: Option<Expr>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a predicate
    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Sets the `$expr` clause
    pub fn with_expr(mut self, expr: Expr) -> Self {
        self.expr = Some(expr);
        self
    }

    /// Checks a document against every clause
    pub fn matches(&self, document: &Value, vars: &Variables) -> QueryResult<bool> {
        if let Some(expr) = &self.expr {
            if !is_truthy(expr.eval(document, vars)?.as_ref()) {
                return Ok(false);
            }
        }
        Ok(PredicateFilter::matches(document, &self.predicates))
    }

    /// Renders the filter document in command syntax.
    ///
    /// Plain equality uses the short `{field: value}` form; several
    /// operators on one field share one operator document.
    pub fn render(&self) -> Value {
        let mut out = Map::new();
        if let Some(expr) = &self.expr {
            out.insert("$expr".to_string(), expr.render());
        }
        for pred in &self.predicates {
            let short_eq = matches!(&pred.op, FilterOp::Eq(v) if !v.is_object());
            let existing = out.get_mut(&pred.field);
            match (existing, short_eq) {
                (None, true) => {
                    out.insert(pred.field.clone(), pred.op.operand());
                }
                (None, false) => {
                    out.insert(pred.field.clone(), json!({ pred.op.op_name(): pred.op.operand() }));
                }
                (Some(Value::Object(ops)), _) => {
                    ops.insert(pred.op.op_name().to_string(), pred.op.operand());
                }
                (Some(slot), _) => {
                    let previous = slot.take();
                    *slot = json!({ "$eq": previous, pred.op.op_name(): pred.op.operand() });
                }
            }
        }
        Value::Object(out)
    }
}

/// Truthiness of an expression result: missing, null, false and zero are false
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_match() {
        let doc = json!({"type_of_food": "Chinese"});
        assert!(PredicateFilter::matches(&doc, &[Predicate::eq("type_of_food", json!("Chinese"))]));
        assert!(!PredicateFilter::matches(&doc, &[Predicate::eq("type_of_food", json!("chinese"))]));
    }

    #[test]
    fn test_no_string_number_coercion() {
        let doc = json!({"value": 123});
        assert!(!PredicateFilter::matches(&doc, &[Predicate::eq("value", json!("123"))]));
        assert!(PredicateFilter::matches(&doc, &[Predicate::eq("value", json!(123.0))]));
    }

    #[test]
    fn test_gt_is_strict_and_skips_missing() {
        let pred = Predicate::gt("rating", json!(4));
        assert!(PredicateFilter::matches(&json!({"rating": 4.5}), &[pred.clone()]));
        assert!(!PredicateFilter::matches(&json!({"rating": 4}), &[pred.clone()]));
        assert!(!PredicateFilter::matches(&json!({"name": "x"}), &[pred.clone()]));
        assert!(!PredicateFilter::matches(&json!({"rating": "5"}), &[pred]));
    }

    #[test]
    fn test_ne_over_array_of_documents() {
        let pred = Predicate::ne("history.result", json!("Fail"));
        let clean = json!({"history": [{"result": "Pass"}, {"result": "Violation Issued"}]});
        let failed = json!({"history": [{"result": "Pass"}, {"result": "Fail"}]});
        let empty = json!({"history": []});

        assert!(PredicateFilter::matches(&clean, &[pred.clone()]));
        assert!(!PredicateFilter::matches(&failed, &[pred.clone()]));
        assert!(PredicateFilter::matches(&empty, &[pred]));
    }

    #[test]
    fn test_in_list() {
        let pred = Predicate::in_list("result", vec![json!("Fail"), json!("Violation Issued")]);
        assert!(PredicateFilter::matches(&json!({"result": "Fail"}), &[pred.clone()]));
        assert!(!PredicateFilter::matches(&json!({"result": "Pass"}), &[pred]));
    }

    #[test]
    fn test_eq_null_matches_missing() {
        let pred = Predicate::eq("address", Value::Null);
        assert!(PredicateFilter::matches(&json!({}), &[pred.clone()]));
        assert!(!PredicateFilter::matches(&json!({"address": "x"}), &[pred]));
    }

    #[test]
    fn test_filter_with_expr_and_vars() {
        let filter = Filter::new()
            .with_expr(Expr::eq(Expr::field("restaurant_id"), Expr::var("rid")))
            .with(Predicate::in_list("result", vec![json!("Fail")]));
        let vars = Variables::new().with("rid", json!("r1"));

        assert!(filter.matches(&json!({"restaurant_id": "r1", "result": "Fail"}), &vars).unwrap());
        assert!(!filter.matches(&json!({"restaurant_id": "r2", "result": "Fail"}), &vars).unwrap());
        assert!(!filter.matches(&json!({"restaurant_id": "r1", "result": "Pass"}), &vars).unwrap());
    }

    #[test]
    fn test_render_short_and_operator_forms() {
        let filter = Filter::new()
            .with(Predicate::eq("result", json!("Violation Issued")))
            .with(Predicate::gt("rating", json!(4)));
        assert_eq!(filter.render(), json!({"result": "Violation Issued", "rating": {"$gt": 4}}));
    }

    #[test]
    fn test_render_merges_operators_on_one_field() {
        let filter = Filter::new()
            .with(Predicate::gte("rating", json!(2)))
            .with(Predicate::lt("rating", json!(8)));
        assert_eq!(filter.render(), json!({"rating": {"$gte": 2, "$lt": 8}}));
    }
}
