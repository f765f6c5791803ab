//! Typed callback registry owned by a session.
//!
//! Callbacks observe shapes at fixed points of the pipeline and may reject
//! them; a rejection surfaces as [`ShapeError::Hook`].
use std::fmt;

use indexmap::IndexMap;

use crate::base::BaseShape;
use crate::error::{Result, ShapeError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// A declaration has been turned into a shape (before parents are applied).
    AfterBuild,
    /// About to inherit; receives the child.
    BeforeInherit,
    /// Receives the inheritance result.
    AfterInherit,
    /// Receives each freshly cloned envelope.
    AfterClone,
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HookEvent::AfterBuild => "after-build",
            HookEvent::BeforeInherit => "before-inherit",
            HookEvent::AfterInherit => "after-inherit",
            HookEvent::AfterClone => "after-clone",
        };
        f.write_str(s)
    }
}

pub type Hook = Box<dyn Fn(&BaseShape) -> std::result::Result<(), String> + Send + Sync>;

#[derive(Default)]
pub struct Hooks {
    by_event: IndexMap<HookEvent, Vec<Hook>>,
}

impl Hooks {
    pub fn register<F>(&mut self, event: HookEvent, hook: F)
    where
        F: Fn(&BaseShape) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.by_event.entry(event).or_default().push(Box::new(hook));
    }

    /// Runs the callbacks for `event` in registration order; the first
    /// rejection stops the run.
    pub fn fire(&self, event: HookEvent, shape: &BaseShape) -> Result<()> {
        for hook in self.by_event.get(&event).into_iter().flatten() {
            hook(shape).map_err(|detail| ShapeError::Hook {
                location: shape.location.clone(),
                event: event.to_string(),
                name: shape.label().to_string(),
                detail,
            })?;
        }
        Ok(())
    }

    pub fn len(&self, event: HookEvent) -> usize {
        self.by_event.get(&event).map_or(0, Vec::len)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.by_event.iter().map(|(k, v)| (k, v.len()))).finish()
    }
}
