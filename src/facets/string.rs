use regex::Regex;

use crate::error::{Location, Result, ShapeError};

use super::LengthFacets;

/// A `pattern` facet. The declared source is kept for messages and equality;
/// matching is always end-to-end.
#[derive(Clone, Debug)]
pub struct Pattern {
    pub source: String,
    compiled: Regex,
}

impl Pattern {
    pub fn new(source: impl Into<String>, location: &Location) -> Result<Self> {
        let source = source.into();
        let compiled = Regex::new(&format!("^(?:{source})$"))
            .map_err(|e| ShapeError::inconsistent(location, "pattern", format!("`{source}` does not compile: {e}")))?;
        Ok(Self { source, compiled })
    }

    /// Matches anywhere in the subject, as pattern property keys (`/^x-/`) do.
    pub fn unanchored(source: impl Into<String>, location: &Location) -> Result<Self> {
        let source = source.into();
        let compiled = Regex::new(&source)
            .map_err(|e| ShapeError::inconsistent(location, "properties", format!("`/{source}/` does not compile: {e}")))?;
        Ok(Self { source, compiled })
    }

    pub fn is_match(&self, s: &str) -> bool { self.compiled.is_match(s) }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool { self.source == other.source }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StringFacets {
    pub length: LengthFacets,
    pub pattern: Option<Pattern>,
}

impl StringFacets {
    pub fn check(&self, location: &Location) -> Result<()> {
        self.length.check(location)
    }

    /// Patterns can't be compared for narrowness; the child's replaces the parent's.
    pub fn inherit(&self, parent: &Self, location: &Location) -> Result<Self> {
        Ok(Self {
            length: self.length.inherit(&parent.length, location)?,
            pattern: self.pattern.clone().or_else(|| parent.pattern.clone()),
        })
    }

    pub fn validate(&self, s: &str, path: &str, location: &Location) -> Result<()> {
        self.length.validate(s.chars().count() as u64, path, location)?;
        if let Some(p) = &self.pattern {
            if !p.is_match(s) {
                return Err(ShapeError::violation(location, path, "pattern", format!("{s:?} does not match /{}/", p.source)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn with_pattern(p: &str) -> StringFacets {
        StringFacets { pattern: Some(Pattern::new(p, &Location::default()).unwrap()), ..Default::default() }
    }

    #[test]
    fn pattern_matches_end_to_end() {
        let f = with_pattern("[a-z]+");
        let loc = Location::default();
        assert!(f.validate("abc", "", &loc).is_ok());
        assert!(f.validate("abc1", "", &loc).is_err());
        assert!(f.validate("1abc", "", &loc).is_err());
        // alternation must not escape the anchors
        let alt = with_pattern("a|b");
        assert!(alt.validate("ab", "", &loc).is_err());
        assert!(alt.validate("b", "", &loc).is_ok());
    }

    #[test]
    fn bad_pattern_is_self_consistency_error() {
        let err = Pattern::new("([a-z", &Location::default()).unwrap_err();
        assert!(matches!(err, ShapeError::SelfConsistency { ref facet, .. } if facet == "pattern"));
    }

    #[test]
    fn length_counts_chars_not_bytes() {
        let f = StringFacets { length: LengthFacets { min_length: None, max_length: Some(3) }, pattern: None };
        assert!(f.validate("äöü", "", &Location::default()).is_ok());
    }

    #[test]
    fn child_pattern_replaces_parent() {
        let loc = Location::default();
        let merged = with_pattern("[0-9]+").inherit(&with_pattern("[a-z]+"), &loc).unwrap();
        assert_eq!(merged.pattern.unwrap().source, "[0-9]+");
        let inherited = StringFacets::default().inherit(&with_pattern("[a-z]+"), &loc).unwrap();
        assert_eq!(inherited.pattern.unwrap().source, "[a-z]+");
    }

    proptest! {
        #[test]
        fn digits_pattern_fails_iff_not_all_digits(s in "[0-9a-c]{0,6}") {
            let f = with_pattern("[0-9]+");
            let expected = !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
            prop_assert_eq!(f.validate(&s, "", &Location::default()).is_ok(), expected);
        }
    }
}
