//! Reusable facet bundles shared across type kinds.
//!
//! Every bundle follows the same three-step protocol:
//! - `check`: self-consistency of the declared facets,
//! - `inherit`: narrow a child bundle against its parent's (returns a new one),
//! - validation helpers used by the shape variants.
//!
//! Unset members inherit the parent's value verbatim.
pub mod enumeration;
pub mod file;
pub mod format;
pub mod length;
pub mod numeric;
pub mod string;
pub mod union;

use std::fmt::Display;

use num_bigint::BigInt;

use crate::error::{Location, Result, ShapeError};
use crate::value::{Scalar, Value};

pub use enumeration::{is_compatible_enum, EnumFacets};
pub use file::FileFacets;
pub use format::FormatFacets;
pub use length::LengthFacets;
pub use numeric::{IntegerFacets, NumberFacets};
pub use string::{Pattern, StringFacets};
pub use union::UnionFacets;

// ------------------------------ Narrowing --------------------------------- //

/// Lower bound: the child may only raise it.
pub(crate) fn narrow_min<T>(facet: &str, parent: &Option<T>, child: &Option<T>, location: &Location) -> Result<Option<T>>
where
    T: PartialOrd + Display + Clone,
{
    match (parent, child) {
        (Some(p), Some(c)) if c < p => Err(ShapeError::narrowing(location, facet, p, c)),
        (_, Some(c)) => Ok(Some(c.clone())),
        (p, None) => Ok(p.clone()),
    }
}

/// Upper bound: the child may only lower it.
pub(crate) fn narrow_max<T>(facet: &str, parent: &Option<T>, child: &Option<T>, location: &Location) -> Result<Option<T>>
where
    T: PartialOrd + Display + Clone,
{
    match (parent, child) {
        (Some(p), Some(c)) if c > p => Err(ShapeError::narrowing(location, facet, p, c)),
        (_, Some(c)) => Ok(Some(c.clone())),
        (p, None) => Ok(p.clone()),
    }
}

/// `min ≤ max` when both are set.
pub(crate) fn check_range<T>(min_facet: &str, min: &Option<T>, max_facet: &str, max: &Option<T>, location: &Location) -> Result<()>
where
    T: PartialOrd + Display,
{
    match (min, max) {
        (Some(lo), Some(hi)) if lo > hi => Err(ShapeError::inconsistent(
            location,
            min_facet,
            format!("{min_facet} ({lo}) is greater than {max_facet} ({hi})"),
        )),
        _ => Ok(()),
    }
}

// ------------------------------- Parsing ---------------------------------- //

fn expected(location: &Location, facet: &str, what: &str, found: &Value) -> ShapeError {
    ShapeError::structural(location, facet, format!("expected {what}, found {}", found.kind_name()))
}

pub(crate) fn expect_u64(value: &Value, facet: &str, location: &Location) -> Result<u64> {
    match value.as_scalar().and_then(Scalar::as_bigint) {
        Some(n) => u64::try_from(n).map_err(|_| expected(location, facet, "a non-negative integer", value)),
        None => Err(expected(location, facet, "a non-negative integer", value)),
    }
}

pub(crate) fn expect_bigint(value: &Value, facet: &str, location: &Location) -> Result<BigInt> {
    value
        .as_scalar()
        .and_then(Scalar::as_bigint)
        .ok_or_else(|| expected(location, facet, "an integer", value))
}

pub(crate) fn expect_f64(value: &Value, facet: &str, location: &Location) -> Result<f64> {
    value
        .as_scalar()
        .and_then(Scalar::as_f64)
        .ok_or_else(|| expected(location, facet, "a number", value))
}

pub(crate) fn expect_str<'v>(value: &'v Value, facet: &str, location: &Location) -> Result<&'v str> {
    value.as_str().ok_or_else(|| expected(location, facet, "a string", value))
}

pub(crate) fn expect_bool(value: &Value, facet: &str, location: &Location) -> Result<bool> {
    value.as_bool().ok_or_else(|| expected(location, facet, "a boolean", value))
}

/// A sequence, or a lone scalar promoted to a one-element sequence (RAML
/// lets `enum: a` and `fileTypes: image/png` stand for one-item lists).
pub(crate) fn expect_list(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(xs) => xs.clone(),
        other => vec![other.clone()],
    }
}

pub(crate) fn expect_str_list(value: &Value, facet: &str, location: &Location) -> Result<Vec<String>> {
    expect_list(value)
        .iter()
        .map(|v| expect_str(v, facet, location).map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn narrow_min_rejects_lower_child() {
        let loc = Location::default();
        assert!(narrow_min("minimum", &Some(100), &Some(80), &loc).is_err());
        assert_eq!(narrow_min("minimum", &Some(100), &Some(120), &loc).unwrap(), Some(120));
        assert_eq!(narrow_min("minimum", &Some(100), &None, &loc).unwrap(), Some(100));
        assert_eq!(narrow_min::<i32>("minimum", &None, &None, &loc).unwrap(), None);
    }

    #[test]
    fn narrow_max_rejects_higher_child() {
        let loc = Location::default();
        let err = narrow_max("maxLength", &Some(10u64), &Some(11), &loc).unwrap_err();
        assert!(matches!(err, ShapeError::ConstraintNarrowing { ref facet, .. } if facet == "maxLength"));
        assert_eq!(narrow_max("maxLength", &None, &Some(11u64), &loc).unwrap(), Some(11));
    }

    #[test]
    fn parsing_helpers_report_structural_errors() {
        let loc = Location::default();
        assert_eq!(expect_u64(&Value::from(json!(3)), "minLength", &loc).unwrap(), 3);
        assert!(expect_u64(&Value::from(json!(-3)), "minLength", &loc).is_err());
        assert!(expect_u64(&Value::from(json!("3")), "minLength", &loc).is_err());
        assert_eq!(expect_str_list(&Value::from(json!("image/png")), "fileTypes", &loc).unwrap(), ["image/png"]);
        assert!(expect_bool(&Value::from(json!(1)), "uniqueItems", &loc).is_err());
    }
}
