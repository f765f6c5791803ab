use crate::base::ShapeRef;
use crate::error::{Location, Result, ShapeError};
use crate::facets::{check_range, narrow_max, narrow_min};
use crate::kind::TypeKind;
use crate::value::Value;

use super::ValidateCx;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArrayShape {
    pub items: Option<ShapeRef>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: Option<bool>,
}

impl ArrayShape {
    pub fn check(&self, location: &Location) -> Result<()> {
        check_range("minItems", &self.min_items, "maxItems", &self.max_items, location)
    }

    /// Count and uniqueness facets; `items` has already been resolved by the
    /// caller (it may need a fresh inherited handle).
    pub fn inherit(&self, parent: &Self, items: Option<ShapeRef>, location: &Location) -> Result<Self> {
        if parent.unique_items == Some(true) && self.unique_items == Some(false) {
            return Err(ShapeError::narrowing(location, "uniqueItems", true, false));
        }
        Ok(Self {
            items,
            min_items: narrow_min("minItems", &parent.min_items, &self.min_items, location)?,
            max_items: narrow_max("maxItems", &parent.max_items, &self.max_items, location)?,
            unique_items: self.unique_items.or(parent.unique_items),
        })
    }

    pub fn validate(&self, cx: &ValidateCx<'_>, value: &Value, path: &str) -> Result<()> {
        let Value::Array(xs) = value else {
            return Err(cx.mismatch(path, TypeKind::Array, value));
        };
        let len = xs.len() as u64;
        if let Some(min) = self.min_items {
            if len < min {
                return Err(ShapeError::violation(cx.location(), path, "minItems", format!("{len} items, at least {min} required")));
            }
        }
        if let Some(max) = self.max_items {
            if len > max {
                return Err(ShapeError::violation(cx.location(), path, "maxItems", format!("{len} items, at most {max} allowed")));
            }
        }
        if self.unique_items == Some(true) {
            for (i, x) in xs.iter().enumerate() {
                if let Some(j) = xs[..i].iter().position(|y| y == x) {
                    return Err(ShapeError::violation(cx.location(), path, "uniqueItems", format!("items {j} and {i} are equal")));
                }
            }
        }
        if let Some(items) = self.items {
            for (i, x) in xs.iter().enumerate() {
                cx.arena.validate(items, x, &format!("{path}[{i}]"))?;
            }
        }
        Ok(())
    }
}
