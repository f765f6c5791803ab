use crate::error::{Location, Result};
use crate::facets::{EnumFacets, FormatFacets, IntegerFacets, NumberFacets};
use crate::kind::TypeKind;
use crate::value::{Scalar, Value};

use super::{has_intrinsic_type, ValidateCx};

// ------------------------------- Integer ---------------------------------- //

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntegerShape {
    pub enumeration: EnumFacets,
    pub format: FormatFacets,
    pub facets: IntegerFacets,
}

impl IntegerShape {
    pub fn check(&self, location: &Location) -> Result<()> {
        self.format.check(TypeKind::Integer, location)?;
        self.facets.check(location)?;
        self.enumeration.check(location, |v| has_intrinsic_type(TypeKind::Integer, v), "integer")
    }

    pub fn inherit(&self, parent: &Self, location: &Location) -> Result<Self> {
        Ok(Self {
            enumeration: self.enumeration.inherit(&parent.enumeration, location)?,
            format: self.format.inherit(&parent.format, location)?,
            facets: self.facets.inherit(&parent.facets, location)?,
        })
    }

    /// Signed, unsigned, big and integral float representations are all
    /// integers; booleans and numeric strings are not.
    pub fn validate(&self, cx: &ValidateCx<'_>, value: &Value, path: &str) -> Result<()> {
        let n = match value {
            Value::Scalar(s @ (Scalar::Int(_) | Scalar::Uint(_) | Scalar::BigInt(_) | Scalar::Float(_))) => s.as_bigint(),
            _ => None,
        };
        let Some(n) = n else {
            return Err(cx.mismatch(path, TypeKind::Integer, value));
        };
        self.enumeration.validate(value, path, cx.location())?;
        self.facets.validate(&n, self.format.as_deref(), path, cx.location())
    }
}

// ------------------------------- Number ----------------------------------- //

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NumberShape {
    pub enumeration: EnumFacets,
    pub format: FormatFacets,
    pub facets: NumberFacets,
}

impl NumberShape {
    pub fn check(&self, location: &Location) -> Result<()> {
        self.format.check(TypeKind::Number, location)?;
        self.facets.check(location)?;
        self.enumeration.check(location, |v| has_intrinsic_type(TypeKind::Number, v), "number")
    }

    pub fn inherit(&self, parent: &Self, location: &Location) -> Result<Self> {
        Ok(Self {
            enumeration: self.enumeration.inherit(&parent.enumeration, location)?,
            format: self.format.inherit(&parent.format, location)?,
            facets: self.facets.inherit(&parent.facets, location)?,
        })
    }

    pub fn validate(&self, cx: &ValidateCx<'_>, value: &Value, path: &str) -> Result<()> {
        let Some(n) = value.as_scalar().filter(|s| s.is_numeric()).and_then(Scalar::as_f64) else {
            return Err(cx.mismatch(path, TypeKind::Number, value));
        };
        self.enumeration.validate(value, path, cx.location())?;
        self.facets.validate(n, self.format.as_deref(), path, cx.location())
    }
}
