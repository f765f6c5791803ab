//! Named type libraries: the two-phase resolution pass.
//!
//! Every declared name first gets an `Unresolved` placeholder, so
//! declarations may refer to each other (and to themselves) in any order.
//! Declarations are then built from a FIFO queue; one whose parents are
//! still placeholders goes to the back. A full rotation without progress
//! means the remaining declarations inherit from each other in a cycle.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;

use crate::arena::ShapeArena;
use crate::base::ShapeRef;
use crate::builder::{is_metadata_facet, BuildOptions, Builder};
use crate::error::{Location, Result, ShapeError};
use crate::expr::{builtin, NameScope, TypeExpr};
use crate::kind::{self, TypeKind};
use crate::value::{Scalar, Value};

#[derive(Debug)]
pub struct TypeLibrary {
    arena: ShapeArena,
    names: IndexMap<String, ShapeRef>,
}

/// Declared names first; builtins otherwise.
struct LibraryScope<'n> {
    names: &'n IndexMap<String, ShapeRef>,
}

impl NameScope for LibraryScope<'_> {
    fn lookup(&mut self, arena: &mut ShapeArena, name: &str, location: &Location) -> Result<ShapeRef> {
        if let Some(r) = builtin(arena, name, location) {
            return Ok(r);
        }
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| ShapeError::UnresolvedReference { location: location.clone(), name: name.to_string() })
    }
}

impl TypeLibrary {
    pub fn build(types: &IndexMap<String, Value>, source: &str, options: &BuildOptions) -> Result<Self> {
        Self::build_in(ShapeArena::new(), types, source, options, None)
    }

    /// Resolve `types` into `arena` (which may carry registered hooks).
    /// `cancel` is polled between declarations.
    pub fn build_in(
        mut arena: ShapeArena,
        types: &IndexMap<String, Value>,
        source: &str,
        options: &BuildOptions,
        cancel: Option<&AtomicBool>,
    ) -> Result<Self> {
        let names: IndexMap<String, ShapeRef> = types
            .keys()
            .map(|name| (name.clone(), arena.placeholder(name, &decl_location(source, name))))
            .collect();

        // examples may mention types not bound yet; they are checked at the end
        let deferred = BuildOptions { check_examples: false, ..options.clone() };
        let mut queue: VecDeque<(&String, &Value)> = types.iter().collect();
        let mut stalled = 0;
        while let Some((name, decl)) = queue.pop_front() {
            if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                tracing::debug!(remaining = queue.len() + 1, "type resolution cancelled");
                return Err(ShapeError::Cancelled);
            }
            let pending: Vec<String> = dependencies(decl)
                .into_iter()
                .filter(|d| names.get(d.as_str()).is_some_and(|r| arena.is_unresolved(*r)))
                .collect();
            if !pending.is_empty() {
                tracing::trace!(name = %name, waiting_on = ?pending, "requeue");
                queue.push_back((name, decl));
                stalled += 1;
                if stalled > queue.len() {
                    let mut cycle: Vec<String> = queue.iter().map(|(n, _)| n.to_string()).collect();
                    cycle.sort();
                    return Err(ShapeError::CyclicInheritance { location: decl_location(source, name), names: cycle });
                }
                continue;
            }
            stalled = 0;

            let slot = names[name.as_str()];
            let built = match alias_target(decl) {
                Some(target) if names.contains_key(target) => arena.alias_to(names[target], name.as_str()),
                _ => {
                    let mut scope = LibraryScope { names: &names };
                    Builder::new(&mut arena, &mut scope, &deferred).build_named(name, decl, &decl_location(source, name))?
                }
            };
            let mut base = arena[built].clone();
            base.name = name.clone();
            arena.bind(slot, base)?;
        }

        let library = Self { arena, names };
        if options.check_examples {
            for r in library.names.values() {
                library.arena.check_values(*r)?;
            }
        }
        tracing::debug!(types = library.names.len(), slots = library.arena.len(), "library resolved");
        Ok(library)
    }

    pub fn lookup(&self, name: &str) -> Option<ShapeRef> { self.names.get(name).copied() }

    pub fn names(&self) -> impl Iterator<Item = &str> { self.names.keys().map(String::as_str) }

    pub fn arena(&self) -> &ShapeArena { &self.arena }

    pub fn arena_mut(&mut self) -> &mut ShapeArena { &mut self.arena }

    /// Validate `value` against the named type.
    pub fn validate(&self, name: &str, value: &Value) -> Result<()> {
        let r = self.lookup(name).ok_or_else(|| ShapeError::UnresolvedReference {
            location: Location::default(),
            name: name.to_string(),
        })?;
        self.arena.validate(r, value, "")
    }
}

fn decl_location(source: &str, name: &str) -> Location {
    Location::new(format!("{source}#/types/{name}"), 0, 0)
}

// ----------------------------- Dependencies ------------------------------- //

/// `Alias: Target` (or `{type: Target}`) with a single user type name.
fn alias_target(decl: &Value) -> Option<&str> {
    let expr = match decl {
        Value::Scalar(Scalar::Str(s)) => s.as_str(),
        Value::Object(map) if map.len() == 1 => map.get("type")?.as_str()?,
        _ => return None,
    };
    let expr = expr.trim();
    let plain = !expr.is_empty() && expr.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'));
    (plain && TypeKind::from_label(expr).is_none()).then_some(expr)
}

/// Names a top-level declaration inherits from, directly or through inline
/// declarations nested in it. Plain references (array items, property
/// types without facets) are not dependencies.
fn dependencies(decl: &Value) -> Vec<String> {
    let mut out = Vec::new();
    match decl {
        Value::Scalar(Scalar::Str(expr)) => type_heads(expr, &mut out),
        Value::Array(exprs) => exprs.iter().filter_map(Value::as_str).for_each(|e| type_heads(e, &mut out)),
        Value::Object(map) => inline_dependencies(map, &mut out),
        _ => {}
    }
    out
}

fn inline_dependencies(map: &IndexMap<String, Value>, out: &mut Vec<String>) {
    for key in ["type", "schema"] {
        match map.get(key) {
            Some(Value::Object(inner)) => inline_dependencies(inner, out),
            Some(other) => out.extend(dependencies(other)),
            None => {}
        }
    }
    if let Some(Value::Object(props)) = map.get("properties") {
        props.values().for_each(|v| nested_dependencies(v, out));
    }
    if let Some(Value::Object(defs)) = map.get("facets") {
        defs.values().for_each(|v| nested_dependencies(v, out));
    }
    if let Some(items) = map.get("items") {
        nested_dependencies(items, out);
    }
    if let Some(any_of) = map.get("anyOf") {
        crate::facets::expect_list(any_of).iter().for_each(|v| nested_dependencies(v, out));
    }
}

/// Nested positions only depend on a name they narrow. A reference that
/// merely describes (`{type: Node, description: ...}`) may point at a type
/// still being declared.
fn nested_dependencies(value: &Value, out: &mut Vec<String>) {
    let Value::Object(inner) = value else {
        return;
    };
    let descriptive = inner.keys().all(|k| matches!(k.as_str(), "type" | "schema") || is_metadata_facet(k));
    match inner.get("type").or_else(|| inner.get("schema")) {
        Some(Value::Scalar(Scalar::Str(_))) if descriptive => {}
        _ => inline_dependencies(inner, out),
    }
}

fn type_heads(expr: &str, out: &mut Vec<String>) {
    if kind::is_raw_schema(expr) {
        return;
    }
    // malformed expressions surface as errors when the declaration is built
    if let Ok(parsed) = TypeExpr::parse(expr, &Location::default()) {
        out.extend(parsed.heads().into_iter().filter(|n| TypeKind::from_label(n).is_none()).map(str::to_string));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;
    use serde_json::json;

    fn types(j: serde_json::Value) -> IndexMap<String, Value> {
        j.as_object().unwrap().iter().map(|(k, v)| (k.clone(), Value::from(v))).collect()
    }

    fn library(j: serde_json::Value) -> Result<TypeLibrary> {
        TypeLibrary::build(&types(j), "lib.json", &BuildOptions::default())
    }

    #[test]
    fn forward_references_resolve_in_any_order() {
        let lib = library(json!({
            "Manager": {"type": "Employee", "properties": {"reports": "Employee[]"}},
            "Employee": {"type": "Person", "properties": {"salary": {"type": "number", "minimum": 0}}},
            "Person": {"properties": {"name": "string"}}
        }))
        .unwrap();
        let ok = Value::from(json!({"name": "Grace", "salary": 10, "reports": [{"name": "Alan", "salary": 5}]}));
        lib.validate("Manager", &ok).unwrap();
        let bad = Value::from(json!({"name": "Grace", "salary": 10, "reports": [{"salary": 5}]}));
        assert!(lib.validate("Manager", &bad).is_err());
        assert_eq!(lib.names().collect::<Vec<_>>(), ["Manager", "Employee", "Person"]);
    }

    #[test]
    fn recursive_types_validate_finite_instances() {
        let lib = library(json!({
            "Tree": {"properties": {"value": "integer", "children?": "Tree[]"}},
            "Comment": {"properties": {"text": "string", "parent?": "Comment | nil"}}
        }))
        .unwrap();
        lib.validate("Tree", &Value::from(json!({"value": 1, "children": [{"value": 2, "children": []}, {"value": 3}]}))).unwrap();
        assert!(lib.validate("Tree", &Value::from(json!({"value": 1, "children": [{"value": "two"}]}))).is_err());
        lib.validate("Comment", &Value::from(json!({"text": "re", "parent": {"text": "op", "parent": null}}))).unwrap();
    }

    #[test]
    fn described_self_references_resolve() {
        let lib = library(json!({
            "Node": {"properties": {"value": "string", "next?": {"type": "Node", "description": "following node"}}},
            "Strict": {"type": "Node", "properties": {"next?": {"type": "Strict", "(audit)": true}}},
            "Forest": {"properties": {"trees": {"type": "Node", "displayName": "Trees"}}}
        }))
        .unwrap();
        let chain = Value::from(json!({"value": "a", "next": {"value": "b", "next": {"value": "c"}}}));
        lib.validate("Node", &chain).unwrap();
        lib.validate("Strict", &chain).unwrap();
        let broken = lib.validate("Node", &Value::from(json!({"value": "a", "next": {"value": 2}}))).unwrap_err();
        assert!(matches!(broken, ShapeError::TypeMismatch { ref field, .. } if field == "next.value"));
        lib.validate("Forest", &Value::from(json!({"trees": {"value": "root"}}))).unwrap();

        let node = lib.lookup("Node").unwrap();
        let arena = lib.arena();
        let Shape::Object(object) = &*arena[node].shape else { panic!("Node is not an object") };
        let next = object.properties["next"].shape;
        assert_eq!(arena[next].description.as_deref(), Some("following node"));
        assert!(!object.properties["next"].required);
        assert_eq!(arena.target(next), node);
    }

    #[test]
    fn examples_of_a_parent_are_not_checked_against_the_child() {
        let lib = library(json!({
            "Name": {"type": "string", "example": "Alexander"},
            "Short": {"type": "Name", "maxLength": 3}
        }))
        .unwrap();
        let short = lib.lookup("Short").unwrap();
        assert_eq!(lib.arena()[short].samples.example, Some(Value::string("Alexander")));
        lib.validate("Short", &Value::string("Al")).unwrap();

        let err = library(json!({
            "Name": {"type": "string", "example": "Alexander"},
            "Short": {"type": "Name", "maxLength": 3, "example": "Alexandra"}
        }))
        .unwrap_err();
        assert!(matches!(err, ShapeError::ConstraintViolation { ref path, ref facet, .. } if path == "example" && facet == "maxLength"));
    }

    #[test]
    fn merged_nested_facets_are_checked() {
        let err = library(json!({
            "Parent": {"properties": {"a": {"type": "string", "maxLength": 3}}},
            "Child": {"type": "Parent", "properties": {"a": {"minLength": 5}}}
        }))
        .unwrap_err();
        assert!(matches!(err, ShapeError::SelfConsistency { ref facet, .. } if facet == "minLength"));

        let err = library(json!({
            "Codes": {"type": "array", "items": {"type": "string", "maxLength": 2}},
            "LongCodes": {"type": "Codes", "items": {"minLength": 4}}
        }))
        .unwrap_err();
        assert!(matches!(err, ShapeError::SelfConsistency { .. }));
    }

    #[test]
    fn cyclic_inheritance_is_reported() {
        let err = library(json!({
            "A": {"type": "B", "minLength": 1},
            "B": {"type": "A"},
            "C": "string"
        }))
        .unwrap_err();
        match err {
            ShapeError::CyclicInheritance { names, .. } => assert_eq!(names, ["A", "B"]),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(library(json!({"Self": {"type": "Self"}})), Err(ShapeError::CyclicInheritance { .. })));
    }

    #[test]
    fn aliases_share_their_target() {
        let lib = library(json!({"Email": {"type": "string", "pattern": "[^@]+@[^@]+"}, "Contact": "Email"})).unwrap();
        let (email, contact) = (lib.lookup("Email").unwrap(), lib.lookup("Contact").unwrap());
        let arena = lib.arena();
        assert!(std::sync::Arc::ptr_eq(&arena[email].shape, &arena[contact].shape));
        assert_eq!(arena[contact].name, "Contact");
        assert_eq!(arena[contact].alias_of, Some(email));
        assert!(lib.validate("Contact", &Value::string("a@b")).is_ok());
        assert!(lib.validate("Contact", &Value::string("nope")).is_err());
    }

    #[test]
    fn unknown_references_fail() {
        let err = library(json!({"Team": {"properties": {"lead": "Ghost"}}})).unwrap_err();
        assert!(matches!(err, ShapeError::UnresolvedReference { ref name, .. } if name == "Ghost"));
    }

    #[test]
    fn discriminated_union() {
        let lib = library(json!({
            "Pet": "Cat | Dog",
            "Animal": {"properties": {"kind": "string"}, "discriminator": "kind"},
            "Cat": {"type": "Animal", "properties": {"purrs": "boolean"}},
            "Dog": {"type": "Animal", "discriminatorValue": "dog", "properties": {"barks": "boolean"}}
        }))
        .unwrap();
        lib.validate("Pet", &Value::from(json!({"kind": "Cat", "purrs": true}))).unwrap();
        lib.validate("Pet", &Value::from(json!({"kind": "dog", "barks": true}))).unwrap();
        assert!(lib.validate("Pet", &Value::from(json!({"kind": "Dog", "barks": true}))).is_err());
        let pet = lib.lookup("Pet").unwrap();
        assert!(matches!(&*lib.arena()[pet].shape, Shape::Union(u) if u.any_of.len() == 2));
    }

    #[test]
    fn examples_may_use_later_types() {
        let lib = library(json!({
            "Order": {"properties": {"item": "Item"}, "example": {"item": {"sku": "A-1"}}},
            "Item": {"properties": {"sku": {"pattern": "[A-Z]-[0-9]+"}}}
        }));
        assert!(lib.is_ok());
        let err = library(json!({
            "Order": {"properties": {"item": "Item"}, "example": {"item": {"sku": "a1"}}},
            "Item": {"properties": {"sku": {"pattern": "[A-Z]-[0-9]+"}}}
        }))
        .unwrap_err();
        assert!(matches!(err, ShapeError::ConstraintViolation { ref path, .. } if path == "example.item.sku"));
    }

    #[test]
    fn cancellation_stops_the_pass() {
        let cancel = AtomicBool::new(true);
        let err = TypeLibrary::build_in(ShapeArena::new(), &types(json!({"A": "string"})), "lib.json", &BuildOptions::default(), Some(&cancel))
            .unwrap_err();
        assert_eq!(err, ShapeError::Cancelled);
    }

    #[test]
    fn dependencies_ignore_plain_references() {
        let decl = Value::from(json!({
            "type": "Base | Other[]",
            "properties": {
                "a": "Ref",
                "b": {"type": "Narrowed", "minLength": 2},
                "c": {"type": "Plain"},
                "d": {"type": "Described", "description": "only metadata", "required": false}
            },
            "items": {"type": {"type": "Deep"}, "maxItems": 3}
        }));
        assert_eq!(dependencies(&decl), ["Base", "Narrowed", "Deep"]);
        assert_eq!(alias_target(&Value::string("Person")), Some("Person"));
        assert_eq!(alias_target(&Value::string("string")), None);
        assert_eq!(alias_target(&Value::string("Person[]")), None);
    }
}
