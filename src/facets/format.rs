use crate::error::{Location, Result, ShapeError};
use crate::kind::TypeKind;

// ------------------------------- Policy ----------------------------------- //

pub const INTEGER_FORMATS: &[&str] = &["int", "int8", "int16", "int32", "int64", "long"];
pub const NUMBER_FORMATS: &[&str] = &["int", "int8", "int16", "int32", "int64", "long", "float", "double"];
pub const DATETIME_FORMATS: &[&str] = &["rfc3339", "rfc2616"];

pub fn whitelist(kind: TypeKind) -> &'static [&'static str] {
    match kind {
        TypeKind::Integer => INTEGER_FORMATS,
        TypeKind::Number => NUMBER_FORMATS,
        TypeKind::DateTime => DATETIME_FORMATS,
        _ => &[],
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormatFacets {
    pub format: Option<String>,
}

impl FormatFacets {
    pub fn new(format: impl Into<String>) -> Self { Self { format: Some(format.into()) } }

    pub fn as_deref(&self) -> Option<&str> { self.format.as_deref() }

    pub fn check(&self, kind: TypeKind, location: &Location) -> Result<()> {
        match &self.format {
            Some(f) if !whitelist(kind).contains(&f.as_str()) => Err(ShapeError::inconsistent(
                location,
                "format",
                format!("`{f}` is not a {kind} format (expected one of {})", whitelist(kind).join(", ")),
            )),
            _ => Ok(()),
        }
    }

    /// Formats are not ordered: both sides must agree textually.
    pub fn inherit(&self, parent: &Self, location: &Location) -> Result<Self> {
        match (&parent.format, &self.format) {
            (Some(p), Some(c)) if p != c => Err(ShapeError::narrowing(location, "format", p, c)),
            (_, Some(c)) => Ok(Self::new(c.clone())),
            (p, None) => Ok(Self { format: p.clone() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_is_per_kind() {
        let loc = Location::default();
        assert!(FormatFacets::new("int32").check(TypeKind::Integer, &loc).is_ok());
        assert!(FormatFacets::new("float").check(TypeKind::Integer, &loc).is_err());
        assert!(FormatFacets::new("float").check(TypeKind::Number, &loc).is_ok());
        assert!(FormatFacets::new("rfc2616").check(TypeKind::DateTime, &loc).is_ok());
        assert!(FormatFacets::new("iso8601").check(TypeKind::DateTime, &loc).is_err());
        assert!(FormatFacets::default().check(TypeKind::Integer, &loc).is_ok());
    }

    #[test]
    fn inherit_requires_identical_text() {
        let loc = Location::default();
        let parent = FormatFacets::new("int32");
        assert_eq!(FormatFacets::default().inherit(&parent, &loc).unwrap(), parent);
        assert!(FormatFacets::new("int64").inherit(&parent, &loc).is_err());
        assert_eq!(FormatFacets::new("int64").inherit(&FormatFacets::default(), &loc).unwrap().as_deref(), Some("int64"));
    }
}
