//! Error taxonomy for type construction, inheritance and instance validation.
//!
//! Every variant carries the source [`Location`] of the declaration that
//! produced it and a facet, field or instance path naming what went wrong.
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::kind::TypeKind;

pub type Result<T, E = ShapeError> = std::result::Result<T, E>;

// ------------------------------ Location ---------------------------------- //

/// Where a declaration came from. Produced by the document decoder, carried
/// through every shape built from it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub source: Option<Arc<str>>,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(source: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self { source: Some(source.into()), line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = self.source.as_deref().unwrap_or("<input>");
        if self.line == 0 {
            write!(f, "{source}")
        } else {
            write!(f, "{source}:{}:{}", self.line, self.column)
        }
    }
}

// ------------------------------- Errors ----------------------------------- //

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// Malformed input: a mapping/sequence/scalar was required and something
    /// else was given.
    #[error("{location}: `{field}`: {detail}")]
    Structural {
        location: Location,
        field: String,
        detail: String,
    },

    #[error("{location}: unknown facet `{facet}` for {kind} type")]
    UnknownFacet {
        location: Location,
        facet: String,
        kind: TypeKind,
    },

    #[error("{location}: conflicting facets [{}] imply different kinds ({})", .facets.join(", "), join_kinds(.kinds))]
    ConflictingFacets {
        location: Location,
        facets: Vec<String>,
        kinds: Vec<TypeKind>,
    },

    /// Internally contradictory facets, reported by `check`.
    #[error("{location}: invalid `{facet}`: {detail}")]
    SelfConsistency {
        location: Location,
        facet: String,
        detail: String,
    },

    #[error("{location}: type mismatch at `{field}`: expected {expected}, found {found}")]
    TypeMismatch {
        location: Location,
        field: String,
        expected: String,
        found: String,
    },

    /// A child declaration relaxes a bound its parent sets.
    #[error("{location}: `{facet}` cannot be widened by inheritance: parent {parent}, child {child}")]
    ConstraintNarrowing {
        location: Location,
        facet: String,
        parent: String,
        child: String,
    },

    /// An instance breaks a facet of its type.
    #[error("{location}: `{path}` violates `{facet}`: {detail}")]
    ConstraintViolation {
        location: Location,
        path: String,
        facet: String,
        detail: String,
    },

    #[error("{location}: unresolved type reference `{name}`")]
    UnresolvedReference { location: Location, name: String },

    #[error("{location}: cyclic inheritance between [{}]", .names.join(", "))]
    CyclicInheritance { location: Location, names: Vec<String> },

    /// A registered hook rejected a shape.
    #[error("{location}: hook `{event}` rejected `{name}`: {detail}")]
    Hook {
        location: Location,
        event: String,
        name: String,
        detail: String,
    },

    #[error("type resolution cancelled")]
    Cancelled,
}

impl ShapeError {
    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::Structural { location, .. }
            | Self::UnknownFacet { location, .. }
            | Self::ConflictingFacets { location, .. }
            | Self::SelfConsistency { location, .. }
            | Self::TypeMismatch { location, .. }
            | Self::ConstraintNarrowing { location, .. }
            | Self::ConstraintViolation { location, .. }
            | Self::UnresolvedReference { location, .. }
            | Self::CyclicInheritance { location, .. }
            | Self::Hook { location, .. } => Some(location),
            Self::Cancelled => None,
        }
    }

    /// Variant name, for fixtures and summaries.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Structural { .. } => "Structural",
            Self::UnknownFacet { .. } => "UnknownFacet",
            Self::ConflictingFacets { .. } => "ConflictingFacets",
            Self::SelfConsistency { .. } => "SelfConsistency",
            Self::TypeMismatch { .. } => "TypeMismatch",
            Self::ConstraintNarrowing { .. } => "ConstraintNarrowing",
            Self::ConstraintViolation { .. } => "ConstraintViolation",
            Self::UnresolvedReference { .. } => "UnresolvedReference",
            Self::CyclicInheritance { .. } => "CyclicInheritance",
            Self::Hook { .. } => "Hook",
            Self::Cancelled => "Cancelled",
        }
    }

    pub(crate) fn structural(location: &Location, field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Structural { location: location.clone(), field: field.into(), detail: detail.into() }
    }

    pub(crate) fn inconsistent(location: &Location, facet: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::SelfConsistency { location: location.clone(), facet: facet.into(), detail: detail.into() }
    }

    pub(crate) fn mismatch(
        location: &Location,
        field: impl Into<String>,
        expected: impl fmt::Display,
        found: impl fmt::Display,
    ) -> Self {
        Self::TypeMismatch {
            location: location.clone(),
            field: field.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub(crate) fn narrowing(
        location: &Location,
        facet: impl Into<String>,
        parent: impl fmt::Display,
        child: impl fmt::Display,
    ) -> Self {
        Self::ConstraintNarrowing {
            location: location.clone(),
            facet: facet.into(),
            parent: parent.to_string(),
            child: child.to_string(),
        }
    }

    pub(crate) fn violation(
        location: &Location,
        path: &str,
        facet: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::ConstraintViolation {
            location: location.clone(),
            path: display_path(path),
            facet: facet.into(),
            detail: detail.into(),
        }
    }
}

/// Instance paths start empty at the root; show them as `$`.
pub(crate) fn display_path(path: &str) -> String {
    if path.is_empty() { "$".to_string() } else { path.to_string() }
}

fn join_kinds(kinds: &[TypeKind]) -> String {
    kinds.iter().map(|k| k.label()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_display_with_and_without_position() {
        assert_eq!(Location::default().to_string(), "<input>");
        assert_eq!(Location::new("api.raml", 3, 7).to_string(), "api.raml:3:7");
        assert_eq!(Location::new("api.raml", 0, 0).to_string(), "api.raml");
    }

    #[test]
    fn conflicting_facets_message_names_facets_and_kinds() {
        let err = ShapeError::ConflictingFacets {
            location: Location::default(),
            facets: vec!["minItems".into(), "maxLength".into()],
            kinds: vec![TypeKind::Array, TypeKind::String],
        };
        let msg = err.to_string();
        assert!(msg.contains("minItems, maxLength"), "{msg}");
        assert!(msg.contains("array, string"), "{msg}");
    }

    #[test]
    fn violation_at_root_is_dollar() {
        let err = ShapeError::violation(&Location::default(), "", "minimum", "too small");
        assert!(err.to_string().contains("`$` violates `minimum`"));
        assert!(ShapeError::Cancelled.location().is_none());
        assert_eq!(err.category(), "ConstraintViolation");
    }
}
