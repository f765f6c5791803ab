//! Type kinds and kind identification from declared facet names.
use std::fmt;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::error::{Location, Result, ShapeError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeKind {
    Any,
    Nil,
    Boolean,
    String,
    Integer,
    Number,
    DateTime,
    DateTimeOnly,
    DateOnly,
    TimeOnly,
    File,
    Array,
    Object,
    Union,
    RawSchema,
    Unresolved,
}

impl TypeKind {
    pub const BUILTIN: [TypeKind; 14] = [
        TypeKind::Any,
        TypeKind::Nil,
        TypeKind::Boolean,
        TypeKind::String,
        TypeKind::Integer,
        TypeKind::Number,
        TypeKind::DateTime,
        TypeKind::DateTimeOnly,
        TypeKind::DateOnly,
        TypeKind::TimeOnly,
        TypeKind::File,
        TypeKind::Array,
        TypeKind::Object,
        TypeKind::Union,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TypeKind::Any => "any",
            TypeKind::Nil => "nil",
            TypeKind::Boolean => "boolean",
            TypeKind::String => "string",
            TypeKind::Integer => "integer",
            TypeKind::Number => "number",
            TypeKind::DateTime => "datetime",
            TypeKind::DateTimeOnly => "datetime-only",
            TypeKind::DateOnly => "date-only",
            TypeKind::TimeOnly => "time-only",
            TypeKind::File => "file",
            TypeKind::Array => "array",
            TypeKind::Object => "object",
            TypeKind::Union => "union",
            TypeKind::RawSchema => "schema",
            TypeKind::Unresolved => "unresolved",
        }
    }

    /// Builtin kind for a type name; user type names yield `None`.
    pub fn from_label(label: &str) -> Option<TypeKind> {
        TypeKind::BUILTIN.into_iter().find(|k| k.label() == label)
    }

    /// Kinds whose instances are numbers.
    pub fn is_numeric(self) -> bool {
        matches!(self, TypeKind::Integer | TypeKind::Number)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ------------------------------- Policy ----------------------------------- //

/// Facets that imply a kind when no explicit `type` is given. Facets shared
/// across kinds (`enum`, `format`, ...) are absent on purpose: they imply
/// nothing on their own.
static FACET_KINDS: Lazy<IndexMap<&'static str, TypeKind>> = Lazy::new(|| {
    IndexMap::from([
        ("minLength", TypeKind::String),
        ("maxLength", TypeKind::String),
        ("pattern", TypeKind::String),
        ("minimum", TypeKind::Number),
        ("maximum", TypeKind::Number),
        ("multipleOf", TypeKind::Number),
        ("minProperties", TypeKind::Object),
        ("maxProperties", TypeKind::Object),
        ("properties", TypeKind::Object),
        ("additionalProperties", TypeKind::Object),
        ("discriminator", TypeKind::Object),
        ("discriminatorValue", TypeKind::Object),
        ("minItems", TypeKind::Array),
        ("maxItems", TypeKind::Array),
        ("uniqueItems", TypeKind::Array),
        ("items", TypeKind::Array),
        ("fileTypes", TypeKind::File),
        ("anyOf", TypeKind::Union),
    ])
});

/// Kind implied by a single facet name, if any.
pub fn facet_kind(facet: &str) -> Option<TypeKind> {
    FACET_KINDS.get(facet).copied()
}

/// True when `label` is inline JSON schema text rather than a type name.
pub fn is_raw_schema(label: &str) -> bool {
    let t = label.trim();
    t.starts_with('{')
        && t.ends_with('}')
        && matches!(serde_json::from_str::<serde_json::Value>(t), Ok(serde_json::Value::Object(_)))
}

// ---------------------------- Identification ------------------------------ //

/// Pick the kind of a declaration from its explicit `type` label and its
/// facet names (in declaration order).
///
/// An explicit builtin label wins outright. JSON object text is a raw
/// schema. Otherwise the facets vote: none → `string`; `file` beats a
/// co-occurring `string`; anything else spanning two kinds is a conflict.
pub fn identify<'a, I>(explicit: Option<&str>, facets: I, location: &Location) -> Result<TypeKind>
where
    I: IntoIterator<Item = &'a str>,
{
    if let Some(label) = explicit.map(str::trim).filter(|l| !l.is_empty()) {
        if is_raw_schema(label) {
            return Ok(TypeKind::RawSchema);
        }
        return TypeKind::from_label(label).ok_or_else(|| {
            ShapeError::structural(location, "type", format!("`{label}` is not a builtin type"))
        });
    }

    let mut seen: Vec<(&str, TypeKind)> = Vec::new();
    let mut kinds: Vec<TypeKind> = Vec::new();
    for facet in facets {
        if let Some(kind) = facet_kind(facet) {
            seen.push((facet, kind));
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
    }
    if kinds.contains(&TypeKind::File) {
        kinds.retain(|k| *k != TypeKind::String);
    }

    match kinds.as_slice() {
        [] => Ok(TypeKind::String),
        [kind] => Ok(*kind),
        _ => {
            let facets = seen
                .iter()
                .filter(|(_, k)| kinds.contains(k))
                .map(|(f, _)| f.to_string())
                .collect();
            Err(ShapeError::ConflictingFacets { location: location.clone(), facets, kinds })
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn infer(facets: &[&str]) -> Result<TypeKind> {
        identify(None, facets.iter().copied(), &Location::default())
    }

    #[test]
    fn item_facets_infer_array() {
        assert_eq!(infer(&["minItems", "maxItems"]).unwrap(), TypeKind::Array);
    }

    #[test]
    fn file_wins_over_string() {
        assert_eq!(infer(&["minLength", "fileTypes"]).unwrap(), TypeKind::File);
        assert_eq!(infer(&["fileTypes", "maxLength", "pattern"]).unwrap(), TypeKind::File);
    }

    #[test]
    fn mixed_kinds_conflict_in_declaration_order() {
        match infer(&["minItems", "description", "maxLength"]) {
            Err(ShapeError::ConflictingFacets { facets, kinds, .. }) => {
                assert_eq!(facets, ["minItems", "maxLength"]);
                assert_eq!(kinds, [TypeKind::Array, TypeKind::String]);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn no_facets_default_to_string() {
        assert_eq!(infer(&[]).unwrap(), TypeKind::String);
        assert_eq!(infer(&["enum", "description"]).unwrap(), TypeKind::String);
        let explicit = identify(Some("   "), ["minimum"], &Location::default()).unwrap();
        assert_eq!(explicit, TypeKind::Number);
    }

    #[test]
    fn explicit_type_wins_outright() {
        let k = identify(Some("integer"), ["minLength"], &Location::default()).unwrap();
        assert_eq!(k, TypeKind::Integer);
        let k = identify(Some("datetime-only"), [], &Location::default()).unwrap();
        assert_eq!(k, TypeKind::DateTimeOnly);
    }

    #[test]
    fn json_object_text_is_raw_schema() {
        let k = identify(Some(r#"{"type": "object"}"#), [], &Location::default()).unwrap();
        assert_eq!(k, TypeKind::RawSchema);
        assert!(!is_raw_schema("{not json}"));
    }

    #[test]
    fn unknown_explicit_label_is_structural() {
        let err = identify(Some("Person"), [], &Location::default()).unwrap_err();
        assert!(matches!(err, ShapeError::Structural { .. }));
    }
}
