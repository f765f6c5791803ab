use crate::error::{Location, Result};
use crate::facets::EnumFacets;
use crate::kind::TypeKind;
use crate::value::{Scalar, Value};

use super::{has_intrinsic_type, ValidateCx};

pub(crate) fn validate_nil(cx: &ValidateCx<'_>, value: &Value, path: &str) -> Result<()> {
    if value.is_nil() { Ok(()) } else { Err(cx.mismatch(path, TypeKind::Nil, value)) }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BooleanShape {
    pub enumeration: EnumFacets,
}

impl BooleanShape {
    pub fn check(&self, location: &Location) -> Result<()> {
        self.enumeration.check(location, |v| has_intrinsic_type(TypeKind::Boolean, v), "boolean")
    }

    pub fn inherit(&self, parent: &Self, location: &Location) -> Result<Self> {
        Ok(Self { enumeration: self.enumeration.inherit(&parent.enumeration, location)? })
    }

    /// Only real booleans: `"true"` is a string.
    pub fn validate(&self, cx: &ValidateCx<'_>, value: &Value, path: &str) -> Result<()> {
        match value {
            Value::Scalar(Scalar::Bool(_)) => self.enumeration.validate(value, path, cx.location()),
            other => Err(cx.mismatch(path, TypeKind::Boolean, other)),
        }
    }
}
