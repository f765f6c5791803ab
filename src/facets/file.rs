use crate::error::{Location, Result, ShapeError};

/// Accepted mime types. Carried on the shape for consumers; instances are
/// never sniffed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileFacets {
    pub file_types: Option<Vec<String>>,
}

impl FileFacets {
    pub fn check(&self, location: &Location) -> Result<()> {
        for t in self.file_types.iter().flatten() {
            if !looks_like_mime(t) {
                return Err(ShapeError::inconsistent(location, "fileTypes", format!("`{t}` is not a mime type")));
            }
        }
        Ok(())
    }

    /// Declared lists must intersect; the result keeps the child's order.
    pub fn inherit(&self, parent: &Self, location: &Location) -> Result<Self> {
        match (&parent.file_types, &self.file_types) {
            (Some(p), Some(c)) => {
                let common: Vec<String> = c.iter().filter(|t| accepts(p, t)).cloned().collect();
                if common.is_empty() {
                    return Err(ShapeError::narrowing(location, "fileTypes", p.join(", "), c.join(", ")));
                }
                Ok(Self { file_types: Some(common) })
            }
            (p, None) => Ok(Self { file_types: p.clone() }),
            (None, c) => Ok(Self { file_types: c.clone() }),
        }
    }
}

fn looks_like_mime(t: &str) -> bool {
    matches!(t.split_once('/'), Some((a, b)) if !a.is_empty() && !b.is_empty())
}

/// `image/*` in the parent admits `image/png` in the child.
fn accepts(parent: &[String], child: &str) -> bool {
    parent.iter().any(|p| {
        p == child
            || p == "*/*"
            || matches!((p.strip_suffix("/*"), child.split_once('/')), (Some(major), Some((cm, _))) if major == cm)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(xs: &[&str]) -> FileFacets {
        FileFacets { file_types: Some(xs.iter().map(|s| s.to_string()).collect()) }
    }

    #[test]
    fn disjoint_lists_are_rejected() {
        let loc = Location::default();
        let parent = types(&["image/png", "image/jpeg"]);
        assert!(types(&["application/pdf"]).inherit(&parent, &loc).is_err());
        let merged = types(&["application/pdf", "image/png"]).inherit(&parent, &loc).unwrap();
        assert_eq!(merged, types(&["image/png"]));
    }

    #[test]
    fn wildcard_parent_admits_subtypes() {
        let loc = Location::default();
        let merged = types(&["image/gif"]).inherit(&types(&["image/*"]), &loc).unwrap();
        assert_eq!(merged, types(&["image/gif"]));
        assert_eq!(FileFacets::default().inherit(&types(&["*/*"]), &loc).unwrap(), types(&["*/*"]));
    }

    #[test]
    fn check_rejects_non_mime_strings() {
        assert!(types(&["png"]).check(&Location::default()).is_err());
        assert!(types(&["image/png"]).check(&Location::default()).is_ok());
    }
}
