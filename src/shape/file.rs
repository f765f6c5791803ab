use crate::error::{Location, Result};
use crate::facets::{FileFacets, LengthFacets};
use crate::kind::TypeKind;
use crate::value::Value;

use super::ValidateCx;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileShape {
    pub length: LengthFacets,
    pub file_types: FileFacets,
}

impl FileShape {
    pub fn check(&self, location: &Location) -> Result<()> {
        self.length.check(location)?;
        self.file_types.check(location)
    }

    pub fn inherit(&self, parent: &Self, location: &Location) -> Result<Self> {
        Ok(Self {
            length: self.length.inherit(&parent.length, location)?,
            file_types: self.file_types.inherit(&parent.file_types, location)?,
        })
    }

    /// The instance stands for the file contents; bounds are in bytes and
    /// `fileTypes` is not enforced here.
    pub fn validate(&self, cx: &ValidateCx<'_>, value: &Value, path: &str) -> Result<()> {
        let Some(s) = value.as_str() else {
            return Err(cx.mismatch(path, TypeKind::File, value));
        };
        self.length.validate(s.len() as u64, path, cx.location())
    }
}
