//! Turning declarations into shapes.
//!
//! A declaration is a kind label (possibly absent), facets in declaration
//! order and already-resolved parents. The builder picks the kind, decodes
//! facets into an empty shape of that kind, folds the parents in, then
//! checks the result.
use std::sync::Arc;

use indexmap::IndexMap;

use crate::arena::ShapeArena;
use crate::base::{BaseShape, Samples, ShapeRef};
use crate::error::{Location, Result, ShapeError};
use crate::expr::{Builtins, NameScope, TypeExpr};
use crate::facets::{
    expect_bigint, expect_bool, expect_f64, expect_list, expect_str, expect_str_list, expect_u64, EnumFacets,
    FormatFacets, Pattern,
};
use crate::hooks::HookEvent;
use crate::kind::{self, TypeKind};
use crate::shape::{Property, Shape};
use crate::value::{Scalar, Value};

// ------------------------------- Policy ----------------------------------- //

/// Facets every kind accepts; a custom facet may not reuse these names.
const COMMON_FACETS: &[&str] = &[
    "displayName",
    "description",
    "example",
    "examples",
    "default",
    "required",
    "facets",
    "enum",
    "format",
];

// ------------------------------- Types ------------------------------------ //

#[derive(Clone, Debug, Default)]
pub struct TypeDecl {
    pub name: String,
    /// Builtin kind label or JSON schema text. `None` lets the parents and
    /// the facets decide.
    pub kind: Option<String>,
    pub facets: Vec<(String, Value)>,
    pub parents: Vec<ShapeRef>,
    pub location: Location,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self { name: name.into(), location, ..Default::default() }
    }

    pub fn kind(mut self, label: impl Into<String>) -> Self {
        self.kind = Some(label.into());
        self
    }

    pub fn facet(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.facets.push((name.into(), value.into()));
        self
    }

    pub fn parent(mut self, parent: ShapeRef) -> Self {
        self.parents.push(parent);
        self
    }
}

#[derive(Clone, Debug)]
pub struct BuildOptions {
    /// Validate `example`, `examples`, `default` and custom facet values
    /// against their types once built.
    pub check_examples: bool,
    /// Skip facets neither the kind nor a parent's `facets` declares
    /// instead of failing.
    pub allow_unknown_facets: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { check_examples: true, allow_unknown_facets: false }
    }
}

pub struct Builder<'a> {
    arena: &'a mut ShapeArena,
    scope: &'a mut dyn NameScope,
    options: BuildOptions,
}

// --------------------------- Implementation ------------------------------- //

impl ShapeArena {
    /// Build a declaration that only refers to builtin types.
    pub fn build(&mut self, decl: TypeDecl, options: &BuildOptions) -> Result<ShapeRef> {
        let mut scope = Builtins;
        Builder::new(self, &mut scope, options).build(decl)
    }

    /// Build a declaration given as a raw value (`{type: ..., minLength: ...}`
    /// or a type expression) that only refers to builtin types.
    pub fn declare(&mut self, name: &str, value: &Value, location: &Location, options: &BuildOptions) -> Result<ShapeRef> {
        let mut scope = Builtins;
        Builder::new(self, &mut scope, options).build_named(name, value, location)
    }
}

impl<'a> Builder<'a> {
    pub fn new(arena: &'a mut ShapeArena, scope: &'a mut dyn NameScope, options: &BuildOptions) -> Self {
        Self { arena, scope, options: options.clone() }
    }

    pub fn build(&mut self, decl: TypeDecl) -> Result<ShapeRef> {
        let TypeDecl { name, kind, facets, parents, location } = decl;
        let kind_label = kind.as_deref().map(str::trim).filter(|l| !l.is_empty());
        let kind = self.pick_kind(kind_label, &facets, &parents, &location)?;
        tracing::debug!(name = %name, %kind, parents = parents.len(), "build type");

        let mut shape = match (kind, kind_label) {
            (TypeKind::RawSchema, Some(text)) => Shape::RawSchema(text.to_string()),
            (kind, _) => Shape::empty(kind),
        };
        let id = self.arena.next_id();
        let mut base = BaseShape::new(id, name, Shape::Any, location.clone());
        base.type_label = match kind_label {
            Some(label) if kind != TypeKind::RawSchema => label.to_string(),
            _ if !parents.is_empty() => {
                let labels: Vec<&str> = parents.iter().map(|p| self.arena[*p].label()).collect();
                labels.join(", ")
            }
            _ => kind.label().to_string(),
        };

        let mut declared: IndexMap<String, ShapeRef> = IndexMap::new();
        for parent in &parents {
            declared.extend(self.arena[*parent].custom_facets.iter().map(|(k, v)| (k.clone(), *v)));
        }

        let mut samples = Samples::default();
        for (facet, value) in &facets {
            if self.common_facet(&mut base, &mut samples, &mut shape, facet, value)? {
                continue;
            }
            if self.kind_facet(&mut shape, facet, value, &location)? {
                continue;
            }
            if declared.contains_key(facet) {
                base.facet_values.insert(facet.clone(), value.clone());
                continue;
            }
            if self.options.allow_unknown_facets {
                tracing::debug!(facet = %facet, %kind, "skipping unknown facet");
                continue;
            }
            return Err(ShapeError::UnknownFacet { location, facet: facet.clone(), kind });
        }
        base.samples = Arc::new(samples);
        base.shape = Arc::new(shape);
        base.inherits = parents.clone();

        self.arena.hooks().fire(HookEvent::AfterBuild, &base)?;
        let own = self.arena.insert(base);
        let out = if parents.is_empty() { own } else { self.arena.inherit_all(own, &parents)? };
        self.arena.check(out)?;
        if self.options.check_examples {
            self.arena.check_values(out)?;
        }
        Ok(out)
    }

    /// A declaration value of a named type: always a new shape, even when
    /// the value is only a type expression.
    pub fn build_named(&mut self, name: &str, value: &Value, location: &Location) -> Result<ShapeRef> {
        let decl = match value {
            Value::Object(map) => self.decl_from_map(name, map, location)?,
            other => {
                let mut decl = TypeDecl::new(name, location.clone());
                self.declared_type(&mut decl, other, location)?;
                decl
            }
        };
        self.build(decl)
    }

    /// A nested type position (`items`, property values, `anyOf` members,
    /// custom facet definitions). Bare expressions and `{type: X}` are
    /// references; anything carrying facets is an inline declaration.
    pub fn build_value(&mut self, name: &str, value: &Value, location: &Location) -> Result<ShapeRef> {
        match value {
            Value::Scalar(Scalar::Str(expr)) => self.resolve_expr(expr, location),
            Value::Scalar(Scalar::Nil) => self.build(TypeDecl::new(name, location.clone())),
            Value::Object(map) => match (reference_of(map), annotated_reference_of(map)) {
                (Some(expr), _) => self.resolve_expr(expr, location),
                (None, Some(expr)) => self.annotated_reference(name, expr, map, location),
                (None, None) => {
                    let decl = self.decl_from_map(name, map, location)?;
                    self.build(decl)
                }
            },
            other => Err(ShapeError::structural(
                location,
                if name.is_empty() { "type" } else { name },
                format!("expected a type expression or declaration, found {}", other.kind_name()),
            )),
        }
    }

    /// `{type: X, description: ...}`: a reference carrying its own metadata.
    /// While `X` is still a placeholder (a type mentioning itself) the result
    /// is a forward reference rather than a subtype.
    fn annotated_reference(
        &mut self,
        name: &str,
        expr: &str,
        map: &IndexMap<String, Value>,
        location: &Location,
    ) -> Result<ShapeRef> {
        let target = self.resolve_expr(expr, location)?;
        let metadata = map.iter().filter(|(k, _)| !matches!(k.as_str(), "type" | "schema"));
        if !self.arena.is_unresolved(target) {
            let mut decl = TypeDecl::new(name, location.clone()).parent(target);
            decl.facets = metadata.map(|(k, v)| (k.clone(), v.clone())).collect();
            return self.build(decl);
        }

        let label = self.arena[target].label().to_string();
        let id = self.arena.next_id();
        let mut base = BaseShape::new(id, name, Shape::Unresolved(label.clone()), location.clone());
        base.type_label = label;
        base.alias_of = Some(target);
        let (mut samples, mut scratch) = (Samples::default(), Shape::Any);
        for (facet, value) in metadata {
            self.common_facet(&mut base, &mut samples, &mut scratch, facet, value)?;
        }
        tracing::debug!(referenced = %base.type_label, "forward reference");
        self.arena.hooks().fire(HookEvent::AfterBuild, &base)?;
        Ok(self.arena.insert(base))
    }

    fn resolve_expr(&mut self, expr: &str, location: &Location) -> Result<ShapeRef> {
        if kind::is_raw_schema(expr) {
            return Ok(self.arena.insert_shape("", Shape::RawSchema(expr.trim().to_string()), location));
        }
        TypeExpr::parse(expr, location)?.lower(self.arena, self.scope, location)
    }

    fn decl_from_map(&mut self, name: &str, map: &IndexMap<String, Value>, location: &Location) -> Result<TypeDecl> {
        let mut decl = TypeDecl::new(name, location.clone());
        for (key, value) in map {
            match key.as_str() {
                "type" | "schema" => self.declared_type(&mut decl, value, location)?,
                _ => decl.facets.push((key.clone(), value.clone())),
            }
        }
        Ok(decl)
    }

    /// `type:` as a builtin label, schema text, an expression naming the
    /// parent, a list of parents, or an inline parent declaration.
    fn declared_type(&mut self, decl: &mut TypeDecl, value: &Value, location: &Location) -> Result<()> {
        match value {
            Value::Scalar(Scalar::Nil) => {}
            Value::Scalar(Scalar::Str(s)) => {
                let s = s.trim();
                if s.is_empty() {
                } else if TypeKind::from_label(s).is_some() || kind::is_raw_schema(s) {
                    decl.kind = Some(s.to_string());
                } else {
                    decl.parents.push(self.resolve_expr(s, location)?);
                }
            }
            Value::Array(parents) => {
                for parent in parents {
                    let expr = expect_str(parent, "type", location)?;
                    decl.parents.push(self.resolve_expr(expr, location)?);
                }
            }
            Value::Object(_) => decl.parents.push(self.build_value("", value, location)?),
            other => {
                return Err(ShapeError::structural(
                    location,
                    "type",
                    format!("expected a type expression, found {}", other.kind_name()),
                ));
            }
        }
        Ok(())
    }

    /// Kind of a declaration without an explicit label: the first concrete
    /// parent's kind, unless the parents are unions (or `any`) and the facets
    /// imply something narrower.
    fn pick_kind(
        &self,
        explicit: Option<&str>,
        facets: &[(String, Value)],
        parents: &[ShapeRef],
        location: &Location,
    ) -> Result<TypeKind> {
        let names = || facets.iter().map(|(f, _)| f.as_str());
        if explicit.is_some() {
            return kind::identify(explicit, names(), location);
        }
        let implied = names().any(|f| kind::facet_kind(f).is_some());
        let inherited = parents.iter().map(|p| self.arena[*p].kind()).find(|k| *k != TypeKind::Any);
        match inherited {
            Some(TypeKind::Union) if implied => kind::identify(None, names(), location),
            Some(k) => Ok(k),
            None if parents.is_empty() || implied => kind::identify(None, names(), location),
            None => Ok(TypeKind::Any),
        }
    }

    fn common_facet(
        &mut self,
        base: &mut BaseShape,
        samples: &mut Samples,
        shape: &mut Shape,
        facet: &str,
        value: &Value,
    ) -> Result<bool> {
        let location = base.location.clone();
        match facet {
            "displayName" => base.display_name = Some(expect_str(value, facet, &location)?.to_string()),
            "description" => base.description = Some(expect_str(value, facet, &location)?.to_string()),
            "example" => samples.example = Some(value.clone()),
            "examples" => match value {
                Value::Object(named) => samples.examples = named.clone(),
                other => {
                    return Err(ShapeError::structural(
                        &location,
                        facet,
                        format!("expected a mapping of named examples, found {}", other.kind_name()),
                    ));
                }
            },
            "default" => samples.default = Some(value.clone()),
            "required" => base.required = expect_bool(value, facet, &location)?,
            "facets" => {
                let Value::Object(defs) = value else {
                    return Err(ShapeError::structural(&location, facet, "expected a mapping of facet declarations"));
                };
                for (key, def) in defs {
                    let name = key.strip_suffix('?').unwrap_or(key);
                    if COMMON_FACETS.contains(&name) || kind::facet_kind(name).is_some() {
                        return Err(ShapeError::inconsistent(&location, "facets", format!("`{name}` redefines a builtin facet")));
                    }
                    let def = self.build_value("", def, &location)?;
                    base.custom_facets.insert(name.to_string(), def);
                }
            }
            "enum" => return enum_facet(shape, value),
            "format" => return format_facet(shape, value, &location),
            annotation if is_annotation(annotation) => {
                base.annotations.insert(annotation[1..annotation.len() - 1].to_string(), value.clone());
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn kind_facet(&mut self, shape: &mut Shape, facet: &str, value: &Value, location: &Location) -> Result<bool> {
        match (shape, facet) {
            (Shape::String(s), "minLength") => s.facets.length.min_length = Some(expect_u64(value, facet, location)?),
            (Shape::String(s), "maxLength") => s.facets.length.max_length = Some(expect_u64(value, facet, location)?),
            (Shape::String(s), "pattern") => {
                s.facets.pattern = Some(Pattern::new(expect_str(value, facet, location)?, location)?);
            }
            (Shape::Integer(s), "minimum") => s.facets.minimum = Some(expect_bigint(value, facet, location)?),
            (Shape::Integer(s), "maximum") => s.facets.maximum = Some(expect_bigint(value, facet, location)?),
            (Shape::Integer(s), "multipleOf") => s.facets.multiple_of = Some(expect_bigint(value, facet, location)?),
            (Shape::Number(s), "minimum") => s.facets.minimum = Some(expect_f64(value, facet, location)?),
            (Shape::Number(s), "maximum") => s.facets.maximum = Some(expect_f64(value, facet, location)?),
            (Shape::Number(s), "multipleOf") => s.facets.multiple_of = Some(expect_f64(value, facet, location)?),
            (Shape::File(s), "minLength") => s.length.min_length = Some(expect_u64(value, facet, location)?),
            (Shape::File(s), "maxLength") => s.length.max_length = Some(expect_u64(value, facet, location)?),
            (Shape::File(s), "fileTypes") => s.file_types.file_types = Some(expect_str_list(value, facet, location)?),
            (Shape::Array(s), "items") => s.items = Some(self.build_value("", value, location)?),
            (Shape::Array(s), "minItems") => s.min_items = Some(expect_u64(value, facet, location)?),
            (Shape::Array(s), "maxItems") => s.max_items = Some(expect_u64(value, facet, location)?),
            (Shape::Array(s), "uniqueItems") => s.unique_items = Some(expect_bool(value, facet, location)?),
            (Shape::Object(s), "properties") => s.properties = self.properties(value, location)?,
            (Shape::Object(s), "minProperties") => s.min_properties = Some(expect_u64(value, facet, location)?),
            (Shape::Object(s), "maxProperties") => s.max_properties = Some(expect_u64(value, facet, location)?),
            (Shape::Object(s), "additionalProperties") => {
                s.additional_properties = Some(expect_bool(value, facet, location)?);
            }
            (Shape::Object(s), "discriminator") => s.discriminator = Some(expect_str(value, facet, location)?.to_string()),
            (Shape::Object(s), "discriminatorValue") => s.discriminator_value = Some(value.clone()),
            (Shape::Union(s), "anyOf") => {
                s.any_of = expect_list(value)
                    .iter()
                    .map(|branch| self.build_value("", branch, location))
                    .collect::<Result<_>>()?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// `name?` marks an optional property, `/regex/` a pattern property; an
    /// explicit `required` in the declaration wins over both.
    fn properties(&mut self, value: &Value, location: &Location) -> Result<IndexMap<String, Property>> {
        let Value::Object(map) = value else {
            return Err(ShapeError::structural(location, "properties", format!("expected a mapping, found {}", value.kind_name())));
        };
        let mut out = IndexMap::with_capacity(map.len());
        for (key, decl) in map {
            let (name, pattern, mut required) = match key.strip_prefix('/').and_then(|k| k.strip_suffix('/')) {
                Some(rx) if key.len() > 1 => (key.clone(), Some(Pattern::unanchored(rx, location)?), false),
                _ => match key.strip_suffix('?') {
                    Some(optional) => (optional.to_string(), None, false),
                    None => (key.clone(), None, true),
                },
            };
            if let Some(explicit) = decl.as_object().and_then(|m| m.get("required")) {
                required = expect_bool(explicit, "required", location)?;
            }
            let shape = self.build_value("", decl, location)?;
            out.insert(name.clone(), Property { name, shape, required, pattern });
        }
        Ok(out)
    }
}

/// `{type: X}` (optionally with `required`) only names another type.
fn reference_of(map: &IndexMap<String, Value>) -> Option<&str> {
    let only_refs = map.keys().all(|k| matches!(k.as_str(), "type" | "schema" | "required"));
    match map.get("type").or_else(|| map.get("schema")) {
        Some(Value::Scalar(Scalar::Str(expr))) if only_refs => Some(expr.as_str()),
        _ => None,
    }
}

/// `{type: X}` plus facets that describe without constraining. `X` must
/// name a user type; builtin labels and schema text stay declarations.
fn annotated_reference_of(map: &IndexMap<String, Value>) -> Option<&str> {
    let descriptive = map.keys().all(|k| matches!(k.as_str(), "type" | "schema") || is_metadata_facet(k));
    match map.get("type").or_else(|| map.get("schema")) {
        Some(Value::Scalar(Scalar::Str(expr)))
            if descriptive && TypeKind::from_label(expr.trim()).is_none() && !kind::is_raw_schema(expr) =>
        {
            Some(expr.as_str())
        }
        _ => None,
    }
}

/// Facets that describe a type without narrowing what it accepts.
pub(crate) fn is_metadata_facet(facet: &str) -> bool {
    matches!(facet, "displayName" | "description" | "required") || is_annotation(facet)
}

fn is_annotation(facet: &str) -> bool {
    facet.len() > 2 && facet.starts_with('(') && facet.ends_with(')')
}

fn enum_facet(shape: &mut Shape, value: &Value) -> Result<bool> {
    let members = EnumFacets::new(expect_list(value));
    match shape {
        Shape::Boolean(s) => s.enumeration = members,
        Shape::String(s) => s.enumeration = members,
        Shape::Integer(s) => s.enumeration = members,
        Shape::Number(s) => s.enumeration = members,
        _ => return Ok(false),
    }
    Ok(true)
}

fn format_facet(shape: &mut Shape, value: &Value, location: &Location) -> Result<bool> {
    let format = FormatFacets::new(expect_str(value, "format", location)?);
    match shape {
        Shape::Integer(s) => s.format = format,
        Shape::Number(s) => s.format = format,
        Shape::DateTime(s) => s.format = format,
        _ => return Ok(false),
    }
    Ok(true)
}
