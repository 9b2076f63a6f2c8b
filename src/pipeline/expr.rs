//! Aggregation expressions
//!
//! Evaluation yields `Ok(None)` for a missing value, which is distinct from
//! an explicit null: `$push` and computed fields skip missing values, and
//! `$eq` treats missing and null as different.

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use super::errors::{QueryError, QueryResult};
use super::values::{convert_to_string, resolve_path, type_name, values_equal, Num};

/// Variables bound by `$lookup`'s `let`
#[derive(Debug, Clone, Default)]
pub struct Variables {
    bindings: BTreeMap<String, Value>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with one more binding
    pub fn with(&self, name: impl Into<String>, value: Value) -> Self {
        let mut next = self.clone();
        next.bindings.insert(name.into(), value);
        next
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }
}

/// An aggregation expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `"$a.b"`
    Field(String),
    /// `"$$name"` or `"$$name.path"`; `ROOT`/`CURRENT` is the input document
    Variable(String),
    /// Constant value
    Literal(Value),
    /// `{$toString: e}`
    ToString(Box<Expr>),
    /// `{$size: e}`
    Size(Box<Expr>),
    /// `{$slice: [e, n]}`
    Slice(Box<Expr>, i64),
    /// `{$divide: [a, b]}`
    Divide(Box<Expr>, Box<Expr>),
    /// `{$multiply: [..]}`
    Multiply(Vec<Expr>),
    /// `{$eq: [a, b]}`
    Eq(Box<Expr>, Box<Expr>),
    /// `{k: e, ..}`
    Object(Vec<(String, Expr)>),
}

impl Expr {
    pub fn field(path: impl Into<String>) -> Self {
        Expr::Field(path.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn lit(value: Value) -> Self {
        Expr::Literal(value)
    }

    pub fn string_of(inner: Expr) -> Self {
        Expr::ToString(Box::new(inner))
    }

    pub fn size(inner: Expr) -> Self {
        Expr::Size(Box::new(inner))
    }

    pub fn slice(inner: Expr, n: i64) -> Self {
        Expr::Slice(Box::new(inner), n)
    }

    pub fn divide(dividend: Expr, divisor: Expr) -> Self {
        Expr::Divide(Box::new(dividend), Box::new(divisor))
    }

    pub fn multiply(factors: Vec<Expr>) -> Self {
        Expr::Multiply(factors)
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Expr::Eq(Box::new(left), Box::new(right))
    }

    /// Object construction from `(name, expr)` pairs
    pub fn object<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Expr)>,
        S: Into<String>,
    {
        Expr::Object(fields.into_iter().map(|(k, e)| (k.into(), e)).collect())
    }

    /// Evaluates against a document. `Ok(None)` is a missing value.
    pub fn eval(&self, doc: &Value, vars: &Variables) -> QueryResult<Option<Value>> {
        match self {
            Expr::Field(path) => Ok(resolve_path(doc, path)),
            Expr::Variable(name) => eval_variable(name, doc, vars),
            Expr::Literal(value) => Ok(Some(value.clone())),
            Expr::ToString(inner) => {
                let value = inner.eval(doc, vars)?;
                convert_to_string(value.as_ref()).map(Some)
            }
            Expr::Size(inner) => match inner.eval(doc, vars)? {
                Some(Value::Array(items)) => Ok(Some(Value::from(items.len() as i64))),
                other => Err(QueryError::type_mismatch("$size", "array", type_name(other.as_ref()))),
            },
            Expr::Slice(inner, n) => match inner.eval(doc, vars)? {
                None | Some(Value::Null) => Ok(Some(Value::Null)),
                Some(Value::Array(items)) => Ok(Some(Value::Array(slice_items(items, *n)))),
                Some(other) => Err(QueryError::type_mismatch("$slice", "array", type_name(Some(&other)))),
            },
            Expr::Divide(dividend, divisor) => {
                let (Some(a), Some(b)) = (
                    numeric_operand("$divide", dividend.eval(doc, vars)?)?,
                    numeric_operand("$divide", divisor.eval(doc, vars)?)?,
                ) else {
                    return Ok(Some(Value::Null));
                };
                if b.as_f64() == 0.0 {
                    return Err(QueryError::DivideByZero);
                }
                Ok(Some(Num::Float(a.as_f64() / b.as_f64()).into_value()))
            }
            Expr::Multiply(factors) => {
                let mut product = Num::Int(1);
                for factor in factors {
                    match numeric_operand("$multiply", factor.eval(doc, vars)?)? {
                        Some(n) => product = product.mul(n),
                        None => return Ok(Some(Value::Null)),
                    }
                }
                Ok(Some(product.into_value()))
            }
            Expr::Eq(left, right) => {
                let equal = match (left.eval(doc, vars)?, right.eval(doc, vars)?) {
                    (None, None) => true,
                    (Some(a), Some(b)) => values_equal(&a, &b),
                    _ => false,
                };
                Ok(Some(Value::Bool(equal)))
            }
            Expr::Object(fields) => {
                let mut out = Map::new();
                for (name, expr) in fields {
                    if let Some(value) = expr.eval(doc, vars)? {
                        out.insert(name.clone(), value);
                    }
                }
                Ok(Some(Value::Object(out)))
            }
        }
    }

    /// Renders the expression in the database's command syntax
    pub fn render(&self) -> Value {
        match self {
            Expr::Field(path) => Value::String(format!("${}", path)),
            Expr::Variable(name) => Value::String(format!("$${}", name)),
            Expr::Literal(value) => match value {
                Value::String(s) if s.starts_with('$') => json!({ "$literal": s }),
                Value::Object(_) | Value::Array(_) => json!({ "$literal": value }),
                other => other.clone(),
            },
            Expr::ToString(inner) => json!({ "$toString": inner.render() }),
            Expr::Size(inner) => json!({ "$size": inner.render() }),
            Expr::Slice(inner, n) => json!({ "$slice": [inner.render(), n] }),
            Expr::Divide(a, b) => json!({ "$divide": [a.render(), b.render()] }),
            Expr::Multiply(factors) => {
                json!({ "$multiply": factors.iter().map(Expr::render).collect::<Vec<_>>() })
            }
            Expr::Eq(a, b) => json!({ "$eq": [a.render(), b.render()] }),
            Expr::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, expr)| (name.clone(), expr.render()))
                    .collect(),
            ),
        }
    }
}

fn eval_variable(name: &str, doc: &Value, vars: &Variables) -> QueryResult<Option<Value>> {
    let (head, rest) = match name.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (name, None),
    };

    let base = match head {
        "ROOT" | "CURRENT" => doc,
        _ => vars
            .get(head)
            .ok_or_else(|| QueryError::UnknownVariable(head.to_string()))?,
    };

    Ok(match rest {
        Some(path) => resolve_path(base, path),
        None => Some(base.clone()),
    })
}

/// Numeric operand; null and missing yield `None`
fn numeric_operand(operator: &'static str, value: Option<Value>) -> QueryResult<Option<Num>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => Num::from_value(&v)
            .map(Some)
            .ok_or_else(|| QueryError::type_mismatch(operator, "number", type_name(Some(&v)))),
    }
}

fn slice_items(items: Vec<Value>, n: i64) -> Vec<Value> {
    let len = items.len();
    if n >= 0 {
        let take = (n as usize).min(len);
        items.into_iter().take(take).collect()
    } else {
        let take = (n.unsigned_abs() as usize).min(len);
        items.into_iter().skip(len - take).collect()
    }
}
