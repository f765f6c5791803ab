//! Date and time kinds. Instances are strings parsed with a kind-specific
//! layout; `datetime` picks its layout from `format` and accepts either
//! when none is set.
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Location, Result, ShapeError};
use crate::facets::FormatFacets;
use crate::kind::TypeKind;
use crate::value::Value;

use super::ValidateCx;

// ------------------------------- Policy ----------------------------------- //

const RFC2616_LAYOUT: &str = "%a, %d %b %Y %H:%M:%S GMT";
const DATETIME_ONLY_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_ONLY_LAYOUT: &str = "%Y-%m-%d";
const TIME_ONLY_LAYOUT: &str = "%H:%M:%S%.f";

pub fn parses_rfc3339(s: &str) -> bool { DateTime::parse_from_rfc3339(s).is_ok() }

pub fn parses_rfc2616(s: &str) -> bool { NaiveDateTime::parse_from_str(s, RFC2616_LAYOUT).is_ok() }

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DateTimeShape {
    pub format: FormatFacets,
}

impl DateTimeShape {
    pub fn check(&self, location: &Location) -> Result<()> {
        self.format.check(TypeKind::DateTime, location)
    }

    pub fn inherit(&self, parent: &Self, location: &Location) -> Result<Self> {
        Ok(Self { format: self.format.inherit(&parent.format, location)? })
    }

    pub fn validate(&self, cx: &ValidateCx<'_>, value: &Value, path: &str) -> Result<()> {
        let Some(s) = value.as_str() else {
            return Err(cx.mismatch(path, TypeKind::DateTime, value));
        };
        let (ok, layout) = match self.format.as_deref() {
            Some("rfc2616") => (parses_rfc2616(s), "rfc2616"),
            Some("rfc3339") => (parses_rfc3339(s), "rfc3339"),
            _ => (parses_rfc3339(s) || parses_rfc2616(s), "rfc3339 or rfc2616"),
        };
        if ok {
            Ok(())
        } else {
            Err(ShapeError::violation(cx.location(), path, "format", format!("{s:?} is not a {layout} datetime")))
        }
    }
}

pub(crate) fn validate_layout(cx: &ValidateCx<'_>, kind: TypeKind, value: &Value, path: &str) -> Result<()> {
    let Some(s) = value.as_str() else {
        return Err(cx.mismatch(path, kind, value));
    };
    let ok = match kind {
        TypeKind::DateTimeOnly => NaiveDateTime::parse_from_str(s, DATETIME_ONLY_LAYOUT).is_ok(),
        TypeKind::DateOnly => NaiveDate::parse_from_str(s, DATE_ONLY_LAYOUT).is_ok(),
        TypeKind::TimeOnly => NaiveTime::parse_from_str(s, TIME_ONLY_LAYOUT).is_ok(),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(ShapeError::violation(cx.location(), path, "type", format!("{s:?} is not a valid {kind}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_accept_their_samples() {
        assert!(parses_rfc3339("2021-01-01T00:00:00Z"));
        assert!(parses_rfc3339("2016-02-28T16:41:41.090+01:00"));
        assert!(!parses_rfc3339("invalid"));
        assert!(parses_rfc2616("Sun, 06 Nov 1994 08:49:37 GMT"));
        assert!(!parses_rfc2616("2021-01-01T00:00:00Z"));
        assert!(NaiveDateTime::parse_from_str("2015-07-04T21:00:00", DATETIME_ONLY_LAYOUT).is_ok());
        assert!(NaiveTime::parse_from_str("12:30:00", TIME_ONLY_LAYOUT).is_ok());
        assert!(NaiveDate::parse_from_str("2015-05-23", DATE_ONLY_LAYOUT).is_ok());
    }
}
