use crate::error::{Location, Result, ShapeError};

use super::{check_range, narrow_max, narrow_min};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LengthFacets {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
}

impl LengthFacets {
    pub fn check(&self, location: &Location) -> Result<()> {
        check_range("minLength", &self.min_length, "maxLength", &self.max_length, location)
    }

    pub fn inherit(&self, parent: &Self, location: &Location) -> Result<Self> {
        Ok(Self {
            min_length: narrow_min("minLength", &parent.min_length, &self.min_length, location)?,
            max_length: narrow_max("maxLength", &parent.max_length, &self.max_length, location)?,
        })
    }

    /// `len` is whatever the owning kind measures (chars for strings, bytes for files).
    pub fn validate(&self, len: u64, path: &str, location: &Location) -> Result<()> {
        if let Some(min) = self.min_length {
            if len < min {
                return Err(ShapeError::violation(location, path, "minLength", format!("length {len} is less than {min}")));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(ShapeError::violation(location, path, "maxLength", format!("length {len} is greater than {max}")));
            }
        }
        Ok(())
    }
}
