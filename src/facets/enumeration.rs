use crate::error::{Location, Result, ShapeError};
use crate::value::{display_list, Value};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnumFacets {
    pub values: Option<Vec<Value>>,
}

/// True iff every member of `child` is present in `parent`.
///
/// Order-independent and value-based. An empty child is always compatible;
/// an empty parent admits nothing else.
pub fn is_compatible_enum(parent: &[Value], child: &[Value]) -> bool {
    child.iter().all(|c| parent.contains(c))
}

impl EnumFacets {
    pub fn new(values: Vec<Value>) -> Self { Self { values: Some(values) } }

    /// Members must satisfy the owning kind's intrinsic type.
    pub fn check(&self, location: &Location, intrinsic: impl Fn(&Value) -> bool, kind: &str) -> Result<()> {
        for member in self.values.iter().flatten() {
            if !intrinsic(member) {
                return Err(ShapeError::inconsistent(
                    location,
                    "enum",
                    format!("member {member} is not a {kind} value"),
                ));
            }
        }
        Ok(())
    }

    pub fn inherit(&self, parent: &Self, location: &Location) -> Result<Self> {
        match (&parent.values, &self.values) {
            (Some(p), Some(c)) if c.is_empty() => Ok(Self { values: Some(p.clone()) }),
            (Some(p), Some(c)) if !is_compatible_enum(p, c) => Err(ShapeError::narrowing(
                location,
                "enum",
                display_list(p),
                display_list(c),
            )),
            (_, Some(c)) => Ok(Self { values: Some(c.clone()) }),
            (p, None) => Ok(Self { values: p.clone() }),
        }
    }

    pub fn validate(&self, value: &Value, path: &str, location: &Location) -> Result<()> {
        match &self.values {
            Some(allowed) if !allowed.contains(value) => Err(ShapeError::violation(
                location,
                path,
                "enum",
                format!("{value} is not one of {}", display_list(allowed)),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn vals(j: serde_json::Value) -> Vec<Value> {
        j.as_array().unwrap().iter().map(Value::from).collect()
    }

    #[test]
    fn subset_is_compatible_regardless_of_order() {
        assert!(is_compatible_enum(&vals(json!(["a", "b", "c"])), &vals(json!(["c", "a"]))));
        assert!(!is_compatible_enum(&vals(json!(["a", "b"])), &vals(json!(["a", "z"]))));
        assert!(is_compatible_enum(&vals(json!([])), &vals(json!([]))));
        assert!(!is_compatible_enum(&vals(json!([])), &vals(json!([1]))));
    }

    #[test]
    fn inherit_keeps_parent_when_child_unset_or_empty() {
        let loc = Location::default();
        let parent = EnumFacets::new(vals(json!([1, 2, 3])));
        assert_eq!(EnumFacets::default().inherit(&parent, &loc).unwrap(), parent);
        assert_eq!(EnumFacets::new(vec![]).inherit(&parent, &loc).unwrap(), parent);
        let child = EnumFacets::new(vals(json!([2])));
        assert_eq!(child.inherit(&parent, &loc).unwrap(), child);
        assert!(EnumFacets::new(vals(json!([4]))).inherit(&parent, &loc).is_err());
    }

    #[test]
    fn validate_names_allowed_set() {
        let f = EnumFacets::new(vals(json!(["on", "off"])));
        let err = f.validate(&Value::string("dim"), "$.mode", &Location::default()).unwrap_err();
        assert!(err.to_string().contains(r#"["on", "off"]"#), "{err}");
        assert!(f.validate(&Value::string("on"), "", &Location::default()).is_ok());
    }

    proptest! {
        #[test]
        fn compatibility_matches_subset(parent in prop::collection::vec(0i64..8, 0..6), child in prop::collection::vec(0i64..8, 0..6)) {
            let p: Vec<Value> = parent.iter().map(|i| Value::from(json!(i))).collect();
            let c: Vec<Value> = child.iter().map(|i| Value::from(json!(i))).collect();
            let expected = child.iter().all(|x| parent.contains(x));
            prop_assert_eq!(is_compatible_enum(&p, &c), expected);
            if !child.is_empty() && parent.is_empty() {
                prop_assert!(!is_compatible_enum(&p, &c));
            }
        }
    }
}
