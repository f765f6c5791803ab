//! Per-session shape registry.
//!
//! Every reference between shapes (parents, items, properties, union
//! branches, alias targets, custom facet definitions) is a [`ShapeRef`] into
//! one `ShapeArena`. The arena also owns the identity counter and the hook
//! registry, so independent sessions never share state.
use std::collections::{HashMap, HashSet};
use std::ops::Index;

use crate::base::{BaseShape, ShapeId, ShapeRef};
use crate::error::{Location, Result, ShapeError};
use crate::hooks::{HookEvent, Hooks};
use crate::shape::{Shape, ValidateCx};
use crate::value::Value;

#[derive(Debug)]
pub struct ShapeArena {
    slots: Vec<BaseShape>,
    last_id: u64,
    hooks: Hooks,
}

impl Default for ShapeArena {
    fn default() -> Self { Self::new() }
}

impl Index<ShapeRef> for ShapeArena {
    type Output = BaseShape;
    fn index(&self, r: ShapeRef) -> &BaseShape { &self.slots[r.0] }
}

// ---------------------------- Registration -------------------------------- //

impl ShapeArena {
    pub fn new() -> Self {
        Self { slots: Vec::new(), last_id: 0, hooks: Hooks::default() }
    }

    /// Next session-unique identity. Strictly increasing, starting at 1.
    pub fn next_id(&mut self) -> ShapeId {
        self.last_id += 1;
        ShapeId(self.last_id)
    }

    pub fn insert(&mut self, base: BaseShape) -> ShapeRef {
        self.slots.push(base);
        ShapeRef(self.slots.len() - 1)
    }

    /// Convenience for anonymous or builtin shapes: fresh id, given payload.
    pub fn insert_shape(&mut self, name: impl Into<String>, shape: Shape, location: &Location) -> ShapeRef {
        let id = self.next_id();
        self.insert(BaseShape::new(id, name, shape, location.clone()))
    }

    /// Panics when `r` belongs to another arena.
    pub fn get(&self, r: ShapeRef) -> &BaseShape { &self[r] }

    pub fn len(&self) -> usize { self.slots.len() }

    pub fn is_empty(&self) -> bool { self.slots.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (ShapeRef, &BaseShape)> {
        self.slots.iter().enumerate().map(|(i, b)| (ShapeRef(i), b))
    }

    /// Slot for a named type whose declaration has not been built yet.
    pub fn placeholder(&mut self, name: &str, location: &Location) -> ShapeRef {
        self.insert_shape(name, Shape::Unresolved(name.to_string()), location)
    }

    /// True while `r` (or the type a forward reference points at) has no
    /// declaration bound.
    pub fn is_unresolved(&self, r: ShapeRef) -> bool {
        matches!(*self[self.target(r)].shape, Shape::Unresolved(_))
    }

    /// The slot whose payload `r` stands for. A reference built while its
    /// target was still a placeholder forwards to that target.
    pub fn target(&self, r: ShapeRef) -> ShapeRef {
        let mut r = r;
        for _ in 0..self.slots.len() {
            match (&*self[r].shape, self[r].alias_of) {
                (Shape::Unresolved(_), Some(next)) => r = next,
                _ => break,
            }
        }
        r
    }

    /// Fill a placeholder slot. The slot keeps its identity; every handle
    /// already pointing at it sees the bound shape from now on.
    pub fn bind(&mut self, slot: ShapeRef, mut base: BaseShape) -> Result<()> {
        let current = &self.slots[slot.0];
        if !matches!(*current.shape, Shape::Unresolved(_)) {
            return Err(ShapeError::structural(
                &base.location,
                current.label(),
                "type is already bound",
            ));
        }
        tracing::debug!(name = %base.name, slot = slot.0, id = %current.id, "binding placeholder");
        base.id = current.id;
        self.slots[slot.0] = base;
        Ok(())
    }

    pub fn hooks(&self) -> &Hooks { &self.hooks }

    pub fn register_hook<F>(&mut self, event: HookEvent, hook: F)
    where
        F: Fn(&BaseShape) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.hooks.register(event, hook);
    }
}

// ----------------------------- Validation --------------------------------- //

impl ShapeArena {
    /// Validate an instance against the shape behind `r`. `path` is the
    /// instance path of `value` (empty at the root).
    pub fn validate(&self, r: ShapeRef, value: &Value, path: &str) -> Result<()> {
        let base = &self[self.target(r)];
        let cx = ValidateCx { arena: self, base };
        base.shape.validate(&cx, value, path)
    }

    /// Self-consistency of the shape's own facets.
    pub fn check(&self, r: ShapeRef) -> Result<()> {
        let base = &self[self.target(r)];
        base.shape.check(&base.location)
    }

    /// Examples, default and custom facet values must conform to their types.
    /// Needs every referenced type bound.
    pub fn check_values(&self, r: ShapeRef) -> Result<()> {
        let base = &self[r];
        for (label, sample) in base.samples.declared() {
            self.validate(r, sample, &label)?;
        }
        for (facet, value) in &base.facet_values {
            if let Some(def) = base.custom_facets.get(facet) {
                self.validate(*def, value, facet)?;
            }
        }
        Ok(())
    }
}

// ------------------------- Clone, alias, equality ------------------------- //

impl ShapeArena {
    /// Deep copy of the graph reachable from `r`. Identities are kept unless
    /// `renew` is set. Cycles map onto the copy's own cycles.
    pub fn clone_shape(&mut self, r: ShapeRef, renew: bool) -> Result<ShapeRef> {
        let mut visited = HashMap::new();
        self.clone_with(r, &mut visited, renew)
    }

    /// `visited` maps source slots to their copies; a hit returns the copy
    /// without recursing.
    pub fn clone_with(&mut self, r: ShapeRef, visited: &mut HashMap<ShapeRef, ShapeRef>, renew: bool) -> Result<ShapeRef> {
        if let Some(done) = visited.get(&r) {
            return Ok(*done);
        }
        let source = self[r].clone();
        let id = if renew { self.next_id() } else { source.id };
        let slot = self.insert(BaseShape::new(
            id,
            source.name.clone(),
            Shape::Unresolved(source.name.clone()),
            source.location.clone(),
        ));
        visited.insert(r, slot);

        let mut copy = source.clone();
        copy.id = id;
        copy.inherits = source
            .inherits
            .iter()
            .map(|p| self.clone_with(*p, visited, renew))
            .collect::<Result<_>>()?;
        copy.alias_of = source.alias_of.map(|a| self.clone_with(a, visited, renew)).transpose()?;
        for def in copy.custom_facets.values_mut() {
            *def = self.clone_with(*def, visited, renew)?;
        }
        let mut nested = HashMap::new();
        for n in source.shape.refs() {
            let c = self.clone_with(n, visited, renew)?;
            nested.insert(n, c);
        }
        copy.shape = std::sync::Arc::new(source.shape.remap(&mut |n| nested.get(&n).copied().unwrap_or(n)));

        self.hooks.fire(HookEvent::AfterClone, &copy)?;
        self.slots[slot.0] = copy;
        Ok(slot)
    }

    /// A new envelope named `name` sharing the source's payload and samples.
    /// It has its own identity and no parents, so later inheritance treats
    /// it as a distinct type.
    pub fn alias_to(&mut self, source: ShapeRef, name: impl Into<String>) -> ShapeRef {
        let id = self.next_id();
        let src = &self[source];
        let mut alias = src.clone();
        alias.id = id;
        alias.name = name.into();
        alias.type_label = src.label().to_string();
        alias.inherits = Vec::new();
        alias.alias_of = Some(source);
        tracing::debug!(alias = %alias.name, source = src.label(), "alias");
        self.insert(alias)
    }

    /// Same names, metadata, facets and graph topology. Identities are
    /// ignored; cycles are followed once per pair.
    pub fn structurally_equal(&self, a: ShapeRef, b: ShapeRef) -> bool {
        let mut seen = HashSet::new();
        self.equal_with(a, b, &mut seen)
    }

    fn equal_with(&self, a: ShapeRef, b: ShapeRef, seen: &mut HashSet<(ShapeRef, ShapeRef)>) -> bool {
        if a == b || !seen.insert((a, b)) {
            return true;
        }
        let (x, y) = (&self[a], &self[b]);
        let erase = |s: &Shape| s.remap(&mut |_| ShapeRef(0));
        let same_envelope = x.name == y.name
            && x.display_name == y.display_name
            && x.description == y.description
            && x.type_label == y.type_label
            && x.required == y.required
            && x.samples == y.samples
            && x.alias_of.is_some() == y.alias_of.is_some()
            && x.inherits.len() == y.inherits.len()
            && x.custom_facets.keys().eq(y.custom_facets.keys())
            && x.facet_values == y.facet_values
            && x.annotations == y.annotations;
        if !same_envelope || erase(&x.shape) != erase(&y.shape) {
            return false;
        }
        x.refs().into_iter().zip(y.refs()).all(|(p, q)| self.equal_with(p, q, seen))
    }
}
