//! Concrete shapes: one variant per type kind.
//!
//! `Shape` is a closed enum so that every dispatch site (validate, check,
//! inherit, clone) handles every kind. Nested types (array items, object
//! properties, union branches) are [`ShapeRef`] handles into the arena.
pub mod array;
pub mod file;
pub mod numeric;
pub mod object;
pub mod scalar;
pub mod string;
pub mod temporal;
pub mod union;

use crate::arena::ShapeArena;
use crate::base::{BaseShape, ShapeRef};
use crate::error::{display_path, Location, Result, ShapeError};
use crate::facets::UnionFacets;
use crate::kind::TypeKind;
use crate::value::Value;

pub use array::ArrayShape;
pub use file::FileShape;
pub use numeric::{IntegerShape, NumberShape};
pub use object::{ObjectShape, Property};
pub use scalar::BooleanShape;
pub use string::StringShape;
pub use temporal::DateTimeShape;

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Any,
    Nil,
    Boolean(BooleanShape),
    String(StringShape),
    Integer(IntegerShape),
    Number(NumberShape),
    DateTime(DateTimeShape),
    DateTimeOnly,
    DateOnly,
    TimeOnly,
    File(FileShape),
    Array(ArrayShape),
    Object(ObjectShape),
    Union(UnionFacets),
    /// Inline JSON schema text. Opaque; validates like `any`.
    RawSchema(String),
    /// Named placeholder awaiting its declaration.
    Unresolved(String),
}

/// What a shape needs while validating: the arena for nested handles and its
/// own envelope for naming and locations.
pub struct ValidateCx<'a> {
    pub arena: &'a ShapeArena,
    pub base: &'a BaseShape,
}

impl ValidateCx<'_> {
    pub fn location(&self) -> &Location { &self.base.location }

    pub(crate) fn mismatch(&self, path: &str, expected: impl std::fmt::Display, found: &Value) -> ShapeError {
        ShapeError::mismatch(self.location(), display_path(path), expected, found.kind_name())
    }
}

impl Shape {
    pub fn kind(&self) -> TypeKind {
        match self {
            Shape::Any => TypeKind::Any,
            Shape::Nil => TypeKind::Nil,
            Shape::Boolean(_) => TypeKind::Boolean,
            Shape::String(_) => TypeKind::String,
            Shape::Integer(_) => TypeKind::Integer,
            Shape::Number(_) => TypeKind::Number,
            Shape::DateTime(_) => TypeKind::DateTime,
            Shape::DateTimeOnly => TypeKind::DateTimeOnly,
            Shape::DateOnly => TypeKind::DateOnly,
            Shape::TimeOnly => TypeKind::TimeOnly,
            Shape::File(_) => TypeKind::File,
            Shape::Array(_) => TypeKind::Array,
            Shape::Object(_) => TypeKind::Object,
            Shape::Union(_) => TypeKind::Union,
            Shape::RawSchema(_) => TypeKind::RawSchema,
            Shape::Unresolved(_) => TypeKind::Unresolved,
        }
    }

    /// A facet-less shape of `kind`.
    pub fn empty(kind: TypeKind) -> Shape {
        match kind {
            TypeKind::Any => Shape::Any,
            TypeKind::Nil => Shape::Nil,
            TypeKind::Boolean => Shape::Boolean(BooleanShape::default()),
            TypeKind::String => Shape::String(StringShape::default()),
            TypeKind::Integer => Shape::Integer(IntegerShape::default()),
            TypeKind::Number => Shape::Number(NumberShape::default()),
            TypeKind::DateTime => Shape::DateTime(DateTimeShape::default()),
            TypeKind::DateTimeOnly => Shape::DateTimeOnly,
            TypeKind::DateOnly => Shape::DateOnly,
            TypeKind::TimeOnly => Shape::TimeOnly,
            TypeKind::File => Shape::File(FileShape::default()),
            TypeKind::Array => Shape::Array(ArrayShape::default()),
            TypeKind::Object => Shape::Object(ObjectShape::default()),
            TypeKind::Union => Shape::Union(UnionFacets::default()),
            TypeKind::RawSchema => Shape::RawSchema(String::new()),
            TypeKind::Unresolved => Shape::Unresolved(String::new()),
        }
    }

    /// Nested handles in a fixed order (`remap` visits them in the same order).
    pub fn refs(&self) -> Vec<ShapeRef> {
        match self {
            Shape::Array(a) => a.items.into_iter().collect(),
            Shape::Object(o) => o.properties.values().map(|p| p.shape).collect(),
            Shape::Union(u) => u.any_of.clone(),
            _ => Vec::new(),
        }
    }

    /// Same shape with every nested handle passed through `f`.
    pub fn remap(&self, f: &mut dyn FnMut(ShapeRef) -> ShapeRef) -> Shape {
        match self {
            Shape::Array(a) => Shape::Array(ArrayShape { items: a.items.map(|r| f(r)), ..a.clone() }),
            Shape::Object(o) => {
                let mut out = o.clone();
                for p in out.properties.values_mut() {
                    p.shape = f(p.shape);
                }
                Shape::Object(out)
            }
            Shape::Union(u) => Shape::Union(UnionFacets { any_of: u.any_of.iter().map(|r| f(*r)).collect() }),
            other => other.clone(),
        }
    }

    /// Self-consistency of the shape's own facets, independent of data.
    pub fn check(&self, location: &Location) -> Result<()> {
        match self {
            Shape::Any | Shape::Nil | Shape::RawSchema(_) => Ok(()),
            Shape::DateTimeOnly | Shape::DateOnly | Shape::TimeOnly => Ok(()),
            Shape::Boolean(s) => s.check(location),
            Shape::String(s) => s.check(location),
            Shape::Integer(s) => s.check(location),
            Shape::Number(s) => s.check(location),
            Shape::DateTime(s) => s.check(location),
            Shape::File(s) => s.check(location),
            Shape::Array(s) => s.check(location),
            Shape::Object(s) => s.check(location),
            Shape::Union(s) => s.check(location),
            Shape::Unresolved(name) => Err(ShapeError::UnresolvedReference { location: location.clone(), name: name.clone() }),
        }
    }

    pub fn validate(&self, cx: &ValidateCx<'_>, value: &Value, path: &str) -> Result<()> {
        match self {
            Shape::Any | Shape::RawSchema(_) => Ok(()),
            Shape::Nil => scalar::validate_nil(cx, value, path),
            Shape::Boolean(s) => s.validate(cx, value, path),
            Shape::String(s) => s.validate(cx, value, path),
            Shape::Integer(s) => s.validate(cx, value, path),
            Shape::Number(s) => s.validate(cx, value, path),
            Shape::DateTime(s) => s.validate(cx, value, path),
            Shape::DateTimeOnly => temporal::validate_layout(cx, TypeKind::DateTimeOnly, value, path),
            Shape::DateOnly => temporal::validate_layout(cx, TypeKind::DateOnly, value, path),
            Shape::TimeOnly => temporal::validate_layout(cx, TypeKind::TimeOnly, value, path),
            Shape::File(s) => s.validate(cx, value, path),
            Shape::Array(s) => s.validate(cx, value, path),
            Shape::Object(s) => s.validate(cx, value, path),
            Shape::Union(s) => union::validate(s, cx, value, path),
            Shape::Unresolved(name) => Err(ShapeError::UnresolvedReference { location: cx.location().clone(), name: name.clone() }),
        }
    }
}

/// Whether `value` has the intrinsic type of `kind`, ignoring facets. Used
/// to vet enum members.
pub fn has_intrinsic_type(kind: TypeKind, value: &Value) -> bool {
    use crate::value::Scalar;
    match (kind, value) {
        (TypeKind::Any | TypeKind::RawSchema, _) => true,
        (TypeKind::Nil, v) => v.is_nil(),
        (TypeKind::Boolean, Value::Scalar(Scalar::Bool(_))) => true,
        (TypeKind::String, Value::Scalar(Scalar::Str(_))) => true,
        (TypeKind::Integer, Value::Scalar(s)) => s.as_bigint().is_some(),
        (TypeKind::Number, Value::Scalar(s)) => s.is_numeric(),
        (TypeKind::DateTime | TypeKind::DateTimeOnly | TypeKind::DateOnly | TypeKind::TimeOnly | TypeKind::File, Value::Scalar(Scalar::Str(_))) => true,
        (TypeKind::Array, Value::Array(_)) => true,
        (TypeKind::Object, Value::Object(_)) => true,
        _ => false,
    }
}
