use crate::base::ShapeRef;
use crate::error::{Location, Result, ShapeError};

/// Branches of a union, in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnionFacets {
    pub any_of: Vec<ShapeRef>,
}

impl UnionFacets {
    pub fn check(&self, location: &Location) -> Result<()> {
        if self.any_of.is_empty() {
            return Err(ShapeError::inconsistent(location, "anyOf", "a union needs at least one member"));
        }
        Ok(())
    }
}
