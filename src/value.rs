//! Generic value tree: facet payloads (enum members, defaults, examples) and
//! the instance data validated at runtime.
use std::fmt;

use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};
use ordered_float::OrderedFloat;

#[derive(Clone, Debug)]
pub enum Scalar {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    /// Integers beyond 64 bits, as handed over by a lossless decoder.
    BigInt(BigInt),
    Float(OrderedFloat<f64>),
    Str(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Object(IndexMap<String, Value>),
    Array(Vec<Value>),
}

// ------------------------------ Scalars ----------------------------------- //

impl Scalar {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Scalar::Int(_) | Scalar::Uint(_) | Scalar::BigInt(_) | Scalar::Float(_))
    }

    /// Exact integer view; floats only when they carry no fraction.
    pub fn as_bigint(&self) -> Option<BigInt> {
        match self {
            Scalar::Int(i) => Some(BigInt::from(*i)),
            Scalar::Uint(u) => Some(BigInt::from(*u)),
            Scalar::BigInt(b) => Some(b.clone()),
            Scalar::Float(f) if f.0.is_finite() && f.0.fract() == 0.0 => BigInt::from_f64(f.0),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Uint(u) => Some(*u as f64),
            Scalar::BigInt(b) => b.to_f64(),
            Scalar::Float(f) => Some(f.0),
            _ => None,
        }
    }
}

// Numbers compare by value across representations: 5 == 5u == 5.0.
impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Nil, Scalar::Nil) => true,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Str(a), Scalar::Str(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a == b,
            (a, b) if a.is_numeric() && b.is_numeric() => match (a.as_bigint(), b.as_bigint()) {
                (Some(x), Some(y)) => x == y,
                (None, None) => false,
                // one side integral, the other fractional
                _ => false,
            },
            _ => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Nil => write!(f, "nil"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Uint(u) => write!(f, "{u}"),
            Scalar::BigInt(b) => write!(f, "{b}"),
            Scalar::Float(x) => write!(f, "{}", x.0),
            Scalar::Str(s) => write!(f, "{s:?}"),
        }
    }
}

// ------------------------------- Values ----------------------------------- //

impl Value {
    pub fn nil() -> Self { Value::Scalar(Scalar::Nil) }
    pub fn string(s: impl Into<String>) -> Self { Value::Scalar(Scalar::Str(s.into())) }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self { Value::Scalar(s) => Some(s), _ => None }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self { Value::Scalar(Scalar::Str(s)) => Some(s), _ => None }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self { Value::Scalar(Scalar::Bool(b)) => Some(*b), _ => None }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self { Value::Object(m) => Some(m), _ => None }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self { Value::Array(xs) => Some(xs), _ => None }
    }

    pub fn is_nil(&self) -> bool { matches!(self, Value::Scalar(Scalar::Nil)) }

    /// Short noun for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Scalar(Scalar::Nil) => "nil",
            Value::Scalar(Scalar::Bool(_)) => "boolean",
            Value::Scalar(Scalar::Int(_) | Scalar::Uint(_) | Scalar::BigInt(_)) => "integer",
            Value::Scalar(Scalar::Float(_)) => "number",
            Value::Scalar(Scalar::Str(_)) => "string",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Scalar(Scalar::Nil) => J::Null,
            Value::Scalar(Scalar::Bool(b)) => J::Bool(*b),
            Value::Scalar(Scalar::Int(i)) => J::from(*i),
            Value::Scalar(Scalar::Uint(u)) => J::from(*u),
            // no lossless JSON number for these without arbitrary_precision
            Value::Scalar(Scalar::BigInt(b)) => J::String(b.to_string()),
            Value::Scalar(Scalar::Float(f)) => serde_json::Number::from_f64(f.0).map(J::Number).unwrap_or(J::Null),
            Value::Scalar(Scalar::Str(s)) => J::String(s.clone()),
            Value::Object(m) => J::Object(m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
            Value::Array(xs) => J::Array(xs.iter().map(Value::to_json).collect()),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        use serde_json::Value as J;
        match v {
            J::Null => Value::nil(),
            J::Bool(b) => Value::Scalar(Scalar::Bool(*b)),
            J::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Scalar(Scalar::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Value::Scalar(Scalar::Uint(u))
                } else {
                    Value::Scalar(Scalar::Float(OrderedFloat(n.as_f64().unwrap_or(f64::NAN))))
                }
            }
            J::String(s) => Value::string(s.clone()),
            J::Array(xs) => Value::Array(xs.iter().map(Value::from).collect()),
            J::Object(m) => Value::Object(m.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self { Value::from(&v) }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => write!(f, "{s}"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

/// `[a, b, c]` rendering for enum listings in error messages.
pub fn display_list(values: &[Value]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_keep_their_representation() {
        assert!(matches!(Value::from(json!(-3)), Value::Scalar(Scalar::Int(-3))));
        assert!(matches!(Value::from(json!(u64::MAX)), Value::Scalar(Scalar::Uint(u64::MAX))));
        assert!(matches!(Value::from(json!(1.5)), Value::Scalar(Scalar::Float(_))));
    }

    #[test]
    fn numeric_equality_crosses_representations() {
        assert_eq!(Value::from(json!(5)), Value::from(json!(5.0)));
        assert_eq!(Value::Scalar(Scalar::Uint(7)), Value::Scalar(Scalar::BigInt(BigInt::from(7))));
        assert_ne!(Value::from(json!(5)), Value::from(json!(5.5)));
        assert_ne!(Value::from(json!(1)), Value::from(json!(true)));
        assert_ne!(Value::from(json!("1")), Value::from(json!(1)));
    }

    #[test]
    fn objects_preserve_key_order() {
        let v = Value::from(json!({"z": 1, "a": 2, "m": 3}));
        let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
        assert_eq!(v.to_json(), json!({"z": 1, "a": 2, "m": 3}));
    }

    #[test]
    fn display_list_renders_strings_quoted() {
        let xs = vec![Value::string("a"), Value::from(json!(2))];
        assert_eq!(display_list(&xs), "[\"a\", 2]");
    }
}
