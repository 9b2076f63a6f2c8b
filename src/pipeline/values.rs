//! Value semantics shared by filters, expressions, sorting and grouping
//!
//! Follows the document database:
//! - Cross-type order: missing/null < numbers < strings < objects < arrays
//!   < ObjectId < booleans
//! - Numbers compare by value regardless of integer/float representation
//! - Dotted paths traverse arrays of embedded documents

use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

use super::errors::{QueryError, QueryResult};

/// Extended-JSON key for ObjectId values
pub const OID_KEY: &str = "$oid";

/// Returns the hex string if the value is an extended-JSON ObjectId
pub fn as_object_id(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get(OID_KEY).and_then(Value::as_str),
        _ => None,
    }
}

/// Type name used in error messages
pub fn type_name(value: Option<&Value>) -> &'static str {
    match value {
        None => "missing",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "bool",
        Some(Value::Number(n)) if n.is_f64() => "double",
        Some(Value::Number(_)) => "int",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(v @ Value::Object(_)) if as_object_id(v).is_some() => "objectId",
        Some(Value::Object(_)) => "object",
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(v @ Value::Object(_)) if as_object_id(v).is_some() => 7,
        Some(Value::Object(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Bool(_)) => 8,
    }
}

/// Returns true if both values fall in the same comparison bracket
pub fn same_bracket(a: &Value, b: &Value) -> bool {
    type_rank(Some(a)) == type_rank(Some(b))
}

/// Total order over optional values.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (rank_a, rank_b) = (type_rank(a), type_rank(b));
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => compare_numbers(x, y),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Array(x)), Some(Value::Array(y))) => {
            for (ex, ey) in x.iter().zip(y.iter()) {
                let ord = compare_values(Some(ex), Some(ey));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Some(x @ Value::Object(_)), Some(y @ Value::Object(_))) => {
            if let (Some(ox), Some(oy)) = (as_object_id(x), as_object_id(y)) {
                return ox.cmp(oy);
            }
            compare_objects(x.as_object(), y.as_object())
        }
        _ => Ordering::Equal,
    }
}

fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a.cmp(&b);
    }
    let a = x.as_f64().unwrap_or(f64::NAN);
    let b = y.as_f64().unwrap_or(f64::NAN);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn compare_objects(x: Option<&Map<String, Value>>, y: Option<&Map<String, Value>>) -> Ordering {
    let (Some(x), Some(y)) = (x, y) else {
        return Ordering::Equal;
    };
    for ((kx, vx), (ky, vy)) in x.iter().zip(y.iter()) {
        let ord = kx.cmp(ky).then_with(|| compare_values(Some(vx), Some(vy)));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    x.len().cmp(&y.len())
}

/// Equality with numeric coercion between integers and floats
pub fn values_equal(a: &Value, b: &Value) -> bool {
    compare_values(Some(a), Some(b)) == Ordering::Equal
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('.').collect()
}

/// Resolves a dotted path the way expressions do.
///
/// An array met along the path is mapped over its embedded documents;
/// elements lacking the field are skipped. `None` means missing.
pub fn resolve_path(value: &Value, path: &str) -> Option<Value> {
    resolve_segments(value, &split_path(path))
}

fn resolve_segments(value: &Value, segments: &[&str]) -> Option<Value> {
    let Some((head, rest)) = segments.split_first() else {
        return Some(value.clone());
    };
    match value {
        Value::Object(map) => map.get(*head).and_then(|v| resolve_segments(v, rest)),
        Value::Array(items) => Some(Value::Array(
            items
                .iter()
                .filter(|item| item.is_object())
                .filter_map(|item| resolve_segments(item, segments))
                .collect(),
        )),
        _ => None,
    }
}

/// Collects every value a query predicate on `path` may match.
///
/// A terminal array contributes itself and each of its elements, so a
/// predicate matches when the array or any element satisfies it. An empty
/// result means the field is missing.
pub fn path_candidates<'a>(value: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut out = Vec::new();
    collect_candidates(value, &split_path(path), &mut out);
    out
}

fn collect_candidates<'a>(value: &'a Value, segments: &[&str], out: &mut Vec<&'a Value>) {
    let Some((head, rest)) = segments.split_first() else {
        out.push(value);
        if let Value::Array(items) = value {
            out.extend(items.iter());
        }
        return;
    };
    match value {
        Value::Object(map) => {
            if let Some(v) = map.get(*head) {
                collect_candidates(v, rest, out);
            }
        }
        Value::Array(items) => {
            for item in items.iter().filter(|item| item.is_object()) {
                collect_candidates(item, segments, out);
            }
        }
        _ => {}
    }
}

/// `$toString` conversion. Null and missing convert to null.
pub fn convert_to_string(value: Option<&Value>) -> QueryResult<Value> {
    let Some(value) = value else {
        return Ok(Value::Null);
    };
    let converted = match value {
        Value::Null => return Ok(Value::Null),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            (None, Some(f)) => f.to_string(),
            (None, None) => n.to_string(),
        },
        Value::Object(_) => match as_object_id(value) {
            Some(oid) => oid.to_string(),
            None => return Err(QueryError::type_mismatch("$toString", "convertible value", "object")),
        },
        Value::Array(_) => return Err(QueryError::type_mismatch("$toString", "convertible value", "array")),
    };
    Ok(Value::String(converted))
}

/// A numeric operand, keeping integers exact while possible
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    pub fn from_value(value: &Value) -> Option<Self> {
        let Value::Number(n) = value else {
            return None;
        };
        match n.as_i64() {
            Some(i) => Some(Num::Int(i)),
            None => n.as_f64().map(Num::Float),
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    pub fn add(self, other: Num) -> Num {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_add(b)
                .map_or(Num::Float(a as f64 + b as f64), Num::Int),
            (a, b) => Num::Float(a.as_f64() + b.as_f64()),
        }
    }

    pub fn mul(self, other: Num) -> Num {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_mul(b)
                .map_or(Num::Float(a as f64 * b as f64), Num::Int),
            (a, b) => Num::Float(a.as_f64() * b.as_f64()),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Num::Int(i) => Value::from(i),
            Num::Float(f) => float_value(f),
        }
    }
}

/// Wraps a float; non-finite values become null
pub fn float_value(f: f64) -> Value {
    Number::from_f64(f).map_or(Value::Null, Value::Number)
}

/// Canonical string for grouping, so `5` and `5.0` share a group
pub fn group_key(value: &Value) -> String {
    fn normalize(value: &Value) -> Value {
        match value {
            Value::Number(n) => n.as_f64().map_or(Value::Null, float_value),
            Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
            Value::Object(map) => Value::Object(map.iter().map(|(k, v)| (k.clone(), normalize(v))).collect()),
            other => other.clone(),
        }
    }
    normalize(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_compare_by_value() {
        assert!(values_equal(&json!(5), &json!(5.0)));
        assert_eq!(compare_values(Some(&json!(3)), Some(&json!(3.5))), Ordering::Less);
    }

    #[test]
    fn test_cross_type_order() {
        let ordered = [json!(null), json!(1), json!("a"), json!({"k": 1}), json!([1]), json!({"$oid": "00"}), json!(false)];
        for pair in ordered.windows(2) {
            assert_eq!(compare_values(Some(&pair[0]), Some(&pair[1])), Ordering::Less, "{:?}", pair);
        }
        assert_eq!(compare_values(None, Some(&json!(null))), Ordering::Equal);
    }

    #[test]
    fn test_resolve_path_maps_over_arrays() {
        let doc = json!({"results": [{"result": "Pass"}, {"other": 1}, {"result": "Fail"}]});
        assert_eq!(resolve_path(&doc, "results.result"), Some(json!(["Pass", "Fail"])));
        assert_eq!(resolve_path(&doc, "missing"), None);
    }

    #[test]
    fn test_path_candidates_include_array_elements() {
        let doc = json!({"history": [{"result": "Pass"}, {"result": "Fail"}], "tags": ["a", "b"]});
        let results = path_candidates(&doc, "history.result");
        assert_eq!(results, vec![&json!("Pass"), &json!("Fail")]);

        let tags = path_candidates(&doc, "tags");
        assert_eq!(tags.len(), 3);
        assert!(path_candidates(&doc, "nope").is_empty());
    }

    #[test]
    fn test_to_string_conversion() {
        let oid = json!({"$oid": "5f1a2b3c4d5e6f7081920a1b"});
        assert_eq!(convert_to_string(Some(&oid)).unwrap(), json!("5f1a2b3c4d5e6f7081920a1b"));
        assert_eq!(convert_to_string(Some(&json!(5.0))).unwrap(), json!("5"));
        assert_eq!(convert_to_string(Some(&json!(4.5))).unwrap(), json!("4.5"));
        assert_eq!(convert_to_string(None).unwrap(), Value::Null);
        assert!(convert_to_string(Some(&json!({"a": 1}))).is_err());
    }

    #[test]
    fn test_num_arithmetic_keeps_integers() {
        assert_eq!(Num::Int(2).add(Num::Int(3)), Num::Int(5));
        assert_eq!(Num::Int(2).mul(Num::Float(0.5)), Num::Float(1.0));
        assert_eq!(Num::Int(i64::MAX).add(Num::Int(1)).as_f64(), i64::MAX as f64 + 1.0);
    }

    #[test]
    fn test_group_key_normalizes_numbers() {
        assert_eq!(group_key(&json!(5)), group_key(&json!(5.0)));
        assert_ne!(group_key(&json!("5")), group_key(&json!(5)));
    }
}
