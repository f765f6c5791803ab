//! The envelope every concrete shape lives in: identity, naming, parents,
//! examples and custom facets.
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::Location;
use crate::kind::TypeKind;
use crate::shape::Shape;
use crate::value::Value;

/// Handle to a shape: an index into the owning [`ShapeArena`](crate::arena::ShapeArena).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeRef(pub(crate) usize);

impl ShapeRef {
    pub fn index(self) -> usize { self.0 }
}

/// Session-unique identity, assigned once at construction. Clones keep it
/// unless renewal is requested, so two handles with the same id are "the
/// same type" for reference-equality purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub u64);

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

/// Example data attached to a type. Shared by reference between a type and
/// its aliases.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Samples {
    pub example: Option<Value>,
    pub examples: IndexMap<String, Value>,
    pub default: Option<Value>,
    /// Members taken over from a parent. They conform to the parent, not
    /// necessarily to a narrower child.
    pub inherited: InheritedSamples,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InheritedSamples {
    pub example: bool,
    pub examples: bool,
    pub default: bool,
}

impl Samples {
    pub fn is_empty(&self) -> bool {
        self.example.is_none() && self.examples.is_empty() && self.default.is_none()
    }

    /// Every value attached to the type, with a label for messages.
    pub fn iter(&self) -> impl Iterator<Item = (String, &Value)> {
        let single = self.example.iter().map(|v| ("example".to_string(), v));
        let named = self.examples.iter().map(|(k, v)| (format!("examples.{k}"), v));
        let default = self.default.iter().map(|v| ("default".to_string(), v));
        single.chain(named).chain(default)
    }

    /// Values the type declared itself; these must conform to it.
    pub fn declared(&self) -> impl Iterator<Item = (String, &Value)> {
        let single = self.example.iter().filter(|_| !self.inherited.example).map(|v| ("example".to_string(), v));
        let named = self
            .examples
            .iter()
            .filter(|_| !self.inherited.examples)
            .map(|(k, v)| (format!("examples.{k}"), v));
        let default = self.default.iter().filter(|_| !self.inherited.default).map(|v| ("default".to_string(), v));
        single.chain(named).chain(default)
    }

    /// Member by member, the child's own value wins and the parent's fills
    /// the gap.
    pub fn inherit(&self, parent: &Samples) -> Samples {
        let mut out = self.clone();
        if out.example.is_none() && parent.example.is_some() {
            out.example = parent.example.clone();
            out.inherited.example = true;
        }
        if out.examples.is_empty() && !parent.examples.is_empty() {
            out.examples = parent.examples.clone();
            out.inherited.examples = true;
        }
        if out.default.is_none() && parent.default.is_some() {
            out.default = parent.default.clone();
            out.inherited.default = true;
        }
        out
    }
}

#[derive(Clone, Debug)]
pub struct BaseShape {
    pub id: ShapeId,
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    /// The `type` label as declared (a builtin kind or a parent's name).
    pub type_label: String,
    pub samples: Arc<Samples>,
    pub required: bool,
    /// Declared parents; order is precedence.
    pub inherits: Vec<ShapeRef>,
    pub alias_of: Option<ShapeRef>,
    /// `facets:` declarations: extension points for subtypes.
    pub custom_facets: IndexMap<String, ShapeRef>,
    /// Values given for custom facets declared by a parent.
    pub facet_values: IndexMap<String, Value>,
    /// `(name)` annotations.
    pub annotations: IndexMap<String, Value>,
    pub location: Location,
    pub shape: Arc<Shape>,
}

impl BaseShape {
    pub fn new(id: ShapeId, name: impl Into<String>, shape: Shape, location: Location) -> Self {
        let type_label = shape.kind().label().to_string();
        Self {
            id,
            name: name.into(),
            display_name: None,
            description: None,
            type_label,
            samples: Arc::new(Samples::default()),
            required: true,
            inherits: Vec::new(),
            alias_of: None,
            custom_facets: IndexMap::new(),
            facet_values: IndexMap::new(),
            annotations: IndexMap::new(),
            location,
            shape: Arc::new(shape),
        }
    }

    pub fn kind(&self) -> TypeKind { self.shape.kind() }

    /// Name for messages; anonymous inline shapes fall back to their kind.
    pub fn label(&self) -> &str {
        if self.name.is_empty() { self.shape.kind().label() } else { &self.name }
    }

    /// Envelope of an inheritance result: the child's own metadata wins,
    /// the parent's fills the gaps, keyed maps merge with the child winning.
    pub fn recombine(&self, parent: &BaseShape, id: ShapeId, shape: Shape) -> BaseShape {
        let samples = if parent.samples.is_empty() {
            self.samples.clone()
        } else {
            Arc::new(self.samples.inherit(&parent.samples))
        };
        BaseShape {
            id,
            name: self.name.clone(),
            display_name: self.display_name.clone().or_else(|| parent.display_name.clone()),
            description: self.description.clone().or_else(|| parent.description.clone()),
            type_label: self.type_label.clone(),
            samples,
            required: self.required,
            inherits: self.inherits.clone(),
            alias_of: self.alias_of,
            custom_facets: merge_keyed(&parent.custom_facets, &self.custom_facets),
            facet_values: merge_keyed(&parent.facet_values, &self.facet_values),
            annotations: merge_keyed(&parent.annotations, &self.annotations),
            location: self.location.clone(),
            shape: Arc::new(shape),
        }
    }

    /// Every handle this envelope points at, shape payload included.
    pub fn refs(&self) -> Vec<ShapeRef> {
        let mut out = self.inherits.clone();
        out.extend(self.alias_of);
        out.extend(self.custom_facets.values().copied());
        out.extend(self.shape.refs());
        out
    }
}

/// Parent entries first (keeping their order), child entries override in
/// place or append.
pub(crate) fn merge_keyed<V: Clone>(parent: &IndexMap<String, V>, child: &IndexMap<String, V>) -> IndexMap<String, V> {
    let mut out = parent.clone();
    for (k, v) in child {
        out.insert(k.clone(), v.clone());
    }
    out
}
