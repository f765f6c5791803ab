use crate::error::{Location, Result};
use crate::facets::{EnumFacets, StringFacets};
use crate::kind::TypeKind;
use crate::value::{Scalar, Value};

use super::{has_intrinsic_type, ValidateCx};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StringShape {
    pub enumeration: EnumFacets,
    pub facets: StringFacets,
}

impl StringShape {
    pub fn check(&self, location: &Location) -> Result<()> {
        self.facets.check(location)?;
        self.enumeration.check(location, |v| has_intrinsic_type(TypeKind::String, v), "string")
    }

    pub fn inherit(&self, parent: &Self, location: &Location) -> Result<Self> {
        Ok(Self {
            enumeration: self.enumeration.inherit(&parent.enumeration, location)?,
            facets: self.facets.inherit(&parent.facets, location)?,
        })
    }

    pub fn validate(&self, cx: &ValidateCx<'_>, value: &Value, path: &str) -> Result<()> {
        let Value::Scalar(Scalar::Str(s)) = value else {
            return Err(cx.mismatch(path, TypeKind::String, value));
        };
        self.enumeration.validate(value, path, cx.location())?;
        self.facets.validate(s, path, cx.location())
    }
}
