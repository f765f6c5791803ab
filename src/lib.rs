//! RAML 1.0 data types: shapes, facets, inheritance and instance validation.
//!
//! A session owns a [`ShapeArena`]. Declarations are built into it with
//! [`ShapeArena::build`] (or resolved as a whole named library through
//! [`TypeLibrary`]), narrowed with [`ShapeArena::inherit`] and used to
//! [`ShapeArena::validate`] instance data.
pub mod arena;
pub mod base;
pub mod builder;
pub mod document;
pub mod error;
pub mod expr;
pub mod facets;
pub mod hooks;
mod inherit;
pub mod kind;
pub mod library;
pub mod shape;
pub mod value;

pub use arena::ShapeArena;
pub use base::{BaseShape, InheritedSamples, Samples, ShapeId, ShapeRef};
pub use builder::{BuildOptions, Builder, TypeDecl};
pub use document::TypeDocument;
pub use error::{Location, Result, ShapeError};
pub use expr::{Builtins, NameScope, TypeExpr};
pub use hooks::{HookEvent, Hooks};
pub use kind::TypeKind;
pub use library::TypeLibrary;
pub use shape::Shape;
pub use value::{Scalar, Value};
