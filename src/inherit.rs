//! Inheritance resolver: narrowing a child shape against its parents.
//!
//! Inheritance never mutates either side. Each step produces a fresh slot
//! holding the recombined envelope and a new payload.
use indexmap::IndexMap;

use crate::arena::ShapeArena;
use crate::base::ShapeRef;
use crate::error::{Location, Result, ShapeError};
use crate::facets::UnionFacets;
use crate::hooks::HookEvent;
use crate::kind::TypeKind;
use crate::shape::{ObjectShape, Property, Shape};

/// (child, parent) pairs currently being resolved. Items and properties of
/// recursive types lead back to a pair already on the stack.
type InProgress = Vec<(ShapeRef, ShapeRef)>;

impl ShapeArena {
    /// Left fold over `parents` in declaration order: each step's output is
    /// the next step's child.
    pub fn inherit_all(&mut self, child: ShapeRef, parents: &[ShapeRef]) -> Result<ShapeRef> {
        parents.iter().try_fold(child, |acc, parent| self.inherit(acc, *parent))
    }

    pub fn inherit(&mut self, child: ShapeRef, parent: ShapeRef) -> Result<ShapeRef> {
        let mut stack = InProgress::new();
        self.inherit_with(child, parent, &mut stack)
    }

    fn inherit_with(&mut self, child: ShapeRef, parent: ShapeRef, stack: &mut InProgress) -> Result<ShapeRef> {
        let c = self[child].clone();
        let p = self[parent].clone();
        tracing::debug!(child = c.label(), parent = p.label(), "inherit");
        self.hooks().fire(HookEvent::BeforeInherit, &c)?;

        stack.push((child, parent));
        let shape = self.inherit_shape(child, parent, stack);
        stack.pop();

        let id = self.next_id();
        let out = c.recombine(&p, id, shape?);
        self.hooks().fire(HookEvent::AfterInherit, &out)?;
        // nested items and properties never reach the builder's check
        let slot = self.insert(out);
        self.check(slot)?;
        Ok(slot)
    }

    fn inherit_shape(&mut self, child: ShapeRef, parent: ShapeRef, stack: &mut InProgress) -> Result<Shape> {
        let c = self[self.target(child)].shape.clone();
        let p = self[self.target(parent)].shape.clone();
        let location = self[child].location.clone();
        match (&*c, &*p) {
            (_, Shape::Unresolved(name)) | (Shape::Unresolved(name), _) => {
                Err(ShapeError::UnresolvedReference { location, name: name.clone() })
            }
            (shape, Shape::Any) => Ok(shape.clone()),
            // `type: A | B` with nothing but metadata: the union itself
            (Shape::Union(cu), Shape::Union(pu)) if cu.any_of.is_empty() => Ok(Shape::Union(pu.clone())),
            (Shape::Union(cu), _) => {
                let mut any_of = Vec::with_capacity(cu.any_of.len());
                for branch in &cu.any_of {
                    any_of.push(self.inherit_with(*branch, parent, stack)?);
                }
                Ok(Shape::Union(UnionFacets { any_of }))
            }
            (shape, Shape::Union(pu)) => self.inherit_from_union(child, shape.kind(), pu, &location, stack),
            (cs, ps) if cs.kind() != ps.kind() => Err(ShapeError::mismatch(
                &location,
                "type",
                format!("{} (cannot inherit from different type)", ps.kind()),
                cs.kind(),
            )),
            (cs, ps) => self.inherit_payload(cs, ps, &location, stack),
        }
    }

    /// Inherit the child against every parent branch of its own kind. One
    /// survivor yields its result, several yield a union of all results.
    fn inherit_from_union(
        &mut self,
        child: ShapeRef,
        kind: TypeKind,
        parent: &UnionFacets,
        location: &Location,
        stack: &mut InProgress,
    ) -> Result<Shape> {
        let compatible: Vec<ShapeRef> = parent
            .any_of
            .iter()
            .copied()
            .filter(|b| {
                let k = self[self.target(*b)].kind();
                k == kind || k == TypeKind::Any
            })
            .collect();
        let mut results = Vec::with_capacity(compatible.len());
        for branch in compatible {
            results.push(self.inherit_with(child, branch, stack)?);
        }
        match results.as_slice() {
            [] => {
                let labels: Vec<&str> = parent.any_of.iter().map(|b| self[*b].label()).collect();
                Err(ShapeError::mismatch(
                    location,
                    "type",
                    format!("one of [{}] (cannot inherit from different type)", labels.join(", ")),
                    kind,
                ))
            }
            [only] => Ok((*self[*only].shape).clone()),
            _ => {
                tracing::debug!(branches = results.len(), "child matches several union branches");
                Ok(Shape::Union(UnionFacets { any_of: results }))
            }
        }
    }

    fn inherit_payload(&mut self, child: &Shape, parent: &Shape, location: &Location, stack: &mut InProgress) -> Result<Shape> {
        let shape = match (child, parent) {
            (Shape::Boolean(c), Shape::Boolean(p)) => Shape::Boolean(c.inherit(p, location)?),
            (Shape::String(c), Shape::String(p)) => Shape::String(c.inherit(p, location)?),
            (Shape::Integer(c), Shape::Integer(p)) => Shape::Integer(c.inherit(p, location)?),
            (Shape::Number(c), Shape::Number(p)) => Shape::Number(c.inherit(p, location)?),
            (Shape::DateTime(c), Shape::DateTime(p)) => Shape::DateTime(c.inherit(p, location)?),
            (Shape::File(c), Shape::File(p)) => Shape::File(c.inherit(p, location)?),
            (Shape::Array(c), Shape::Array(p)) => {
                let items = match (c.items, p.items) {
                    (Some(ci), Some(pi)) => Some(self.inherit_nested(ci, pi, stack)?),
                    (ci, pi) => ci.or(pi),
                };
                Shape::Array(c.inherit(p, items, location)?)
            }
            (Shape::Object(c), Shape::Object(p)) => {
                let properties = self.inherit_properties(c, p, location, stack)?;
                Shape::Object(c.inherit(p, properties, location)?)
            }
            (Shape::RawSchema(c), Shape::RawSchema(p)) => Shape::RawSchema(if c.is_empty() { p.clone() } else { c.clone() }),
            (Shape::Any, Shape::Any)
            | (Shape::Nil, Shape::Nil)
            | (Shape::DateTimeOnly, Shape::DateTimeOnly)
            | (Shape::DateOnly, Shape::DateOnly)
            | (Shape::TimeOnly, Shape::TimeOnly) => child.clone(),
            (c, p) => {
                return Err(ShapeError::mismatch(location, "type", p.kind(), c.kind()));
            }
        };
        Ok(shape)
    }

    /// Parent properties first in their order, the child's own appended.
    /// A property both sides declare inherits recursively and may not go
    /// from required to optional.
    fn inherit_properties(
        &mut self,
        child: &ObjectShape,
        parent: &ObjectShape,
        location: &Location,
        stack: &mut InProgress,
    ) -> Result<IndexMap<String, Property>> {
        let mut out = IndexMap::with_capacity(parent.properties.len() + child.properties.len());
        for (key, pp) in &parent.properties {
            let Some(cp) = child.properties.get(key) else {
                out.insert(key.clone(), pp.clone());
                continue;
            };
            if pp.required && !cp.required {
                return Err(ShapeError::narrowing(location, format!("properties.{key}.required"), true, false));
            }
            let shape = self.inherit_nested(cp.shape, pp.shape, stack)?;
            out.insert(key.clone(), Property { shape, ..cp.clone() });
        }
        for (key, cp) in &child.properties {
            if !out.contains_key(key) {
                out.insert(key.clone(), cp.clone());
            }
        }
        Ok(out)
    }

    /// Items and properties: the child's handle is kept as is when both
    /// sides are the same slot, when either side is still a placeholder
    /// (a type referring to itself while being declared), or when the pair
    /// is already being resolved further up.
    fn inherit_nested(&mut self, child: ShapeRef, parent: ShapeRef, stack: &mut InProgress) -> Result<ShapeRef> {
        if self.target(child) == self.target(parent)
            || self.is_unresolved(child)
            || self.is_unresolved(parent)
            || stack.contains(&(child, parent))
        {
            return Ok(child);
        }
        self.inherit_with(child, parent, stack)
    }
}
