//! Range facets. Integers are unbounded in RAML, so integer bounds are
//! arbitrary-precision; `number` bounds are f64. A `format` narrows the
//! accepted width but never changes the comparison representation.
use num_bigint::BigInt;
use num_traits::{FromPrimitive, Signed, Zero};

use crate::error::{Location, Result, ShapeError};

use super::{check_range, narrow_max, narrow_min};

// ------------------------------- Policy ----------------------------------- //

/// Inclusive range of an integer format.
pub fn integer_width(format: &str) -> Option<(BigInt, BigInt)> {
    let (lo, hi): (i64, i64) = match format {
        "int8" => (i8::MIN.into(), i8::MAX.into()),
        "int16" => (i16::MIN.into(), i16::MAX.into()),
        "int" | "int32" => (i32::MIN.into(), i32::MAX.into()),
        "int64" | "long" => (i64::MIN, i64::MAX),
        _ => return None,
    };
    Some((BigInt::from(lo), BigInt::from(hi)))
}

const FLOAT_TOLERANCE: f64 = 1e-9;

// ------------------------------- Integer ---------------------------------- //

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntegerFacets {
    pub minimum: Option<BigInt>,
    pub maximum: Option<BigInt>,
    pub multiple_of: Option<BigInt>,
}

impl IntegerFacets {
    pub fn check(&self, location: &Location) -> Result<()> {
        check_range("minimum", &self.minimum, "maximum", &self.maximum, location)?;
        match &self.multiple_of {
            Some(m) if !m.is_positive() => Err(ShapeError::inconsistent(location, "multipleOf", format!("{m} is not positive"))),
            _ => Ok(()),
        }
    }

    pub fn inherit(&self, parent: &Self, location: &Location) -> Result<Self> {
        let multiple_of = match (&parent.multiple_of, &self.multiple_of) {
            (Some(p), Some(c)) if p.is_positive() && !(c % p).is_zero() => {
                return Err(ShapeError::narrowing(location, "multipleOf", p, c));
            }
            (_, Some(c)) => Some(c.clone()),
            (p, None) => p.clone(),
        };
        Ok(Self {
            minimum: narrow_min("minimum", &parent.minimum, &self.minimum, location)?,
            maximum: narrow_max("maximum", &parent.maximum, &self.maximum, location)?,
            multiple_of,
        })
    }

    pub fn validate(&self, n: &BigInt, format: Option<&str>, path: &str, location: &Location) -> Result<()> {
        if let Some((lo, hi)) = format.and_then(integer_width) {
            if *n < lo || *n > hi {
                return Err(ShapeError::violation(location, path, "format", format!("{n} does not fit {}", format.unwrap_or_default())));
            }
        }
        if let Some(min) = &self.minimum {
            if n < min {
                return Err(ShapeError::violation(location, path, "minimum", format!("{n} is less than {min}")));
            }
        }
        if let Some(max) = &self.maximum {
            if n > max {
                return Err(ShapeError::violation(location, path, "maximum", format!("{n} is greater than {max}")));
            }
        }
        if let Some(m) = &self.multiple_of {
            if m.is_positive() && !(n % m).is_zero() {
                return Err(ShapeError::violation(location, path, "multipleOf", format!("{n} is not a multiple of {m}")));
            }
        }
        Ok(())
    }
}

// ------------------------------- Number ----------------------------------- //

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NumberFacets {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub multiple_of: Option<f64>,
}

fn is_multiple(n: f64, m: f64) -> bool {
    let q = n / m;
    (q - q.round()).abs() <= FLOAT_TOLERANCE * q.abs().max(1.0)
}

impl NumberFacets {
    pub fn check(&self, location: &Location) -> Result<()> {
        check_range("minimum", &self.minimum, "maximum", &self.maximum, location)?;
        match self.multiple_of {
            Some(m) if !(m > 0.0 && m.is_finite()) => Err(ShapeError::inconsistent(location, "multipleOf", format!("{m} is not positive"))),
            _ => Ok(()),
        }
    }

    pub fn inherit(&self, parent: &Self, location: &Location) -> Result<Self> {
        let multiple_of = match (parent.multiple_of, self.multiple_of) {
            (Some(p), Some(c)) if p > 0.0 && !is_multiple(c, p) => {
                return Err(ShapeError::narrowing(location, "multipleOf", p, c));
            }
            (_, Some(c)) => Some(c),
            (p, None) => p,
        };
        Ok(Self {
            minimum: narrow_min("minimum", &parent.minimum, &self.minimum, location)?,
            maximum: narrow_max("maximum", &parent.maximum, &self.maximum, location)?,
            multiple_of,
        })
    }

    pub fn validate(&self, n: f64, format: Option<&str>, path: &str, location: &Location) -> Result<()> {
        match format {
            Some("float") if n.is_finite() && n.abs() > f32::MAX as f64 => {
                return Err(ShapeError::violation(location, path, "format", format!("{n} does not fit float")));
            }
            Some(f) => {
                if let Some((lo, hi)) = integer_width(f) {
                    let fits = n.fract() == 0.0
                        && BigInt::from_f64(n).is_some_and(|b| b >= lo && b <= hi);
                    if !fits {
                        return Err(ShapeError::violation(location, path, "format", format!("{n} does not fit {f}")));
                    }
                }
            }
            None => {}
        }
        if let Some(min) = self.minimum {
            if n < min {
                return Err(ShapeError::violation(location, path, "minimum", format!("{n} is less than {min}")));
            }
        }
        if let Some(max) = self.maximum {
            if n > max {
                return Err(ShapeError::violation(location, path, "maximum", format!("{n} is greater than {max}")));
            }
        }
        if let Some(m) = self.multiple_of {
            if m > 0.0 && !is_multiple(n, m) {
                return Err(ShapeError::violation(location, path, "multipleOf", format!("{n} is not a multiple of {m}")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn int_range(min: Option<i64>, max: Option<i64>) -> IntegerFacets {
        IntegerFacets { minimum: min.map(BigInt::from), maximum: max.map(BigInt::from), multiple_of: None }
    }

    #[test]
    fn integer_minimum_example() {
        let loc = Location::default();
        let f = int_range(Some(100), None);
        assert!(f.validate(&BigInt::from(5), None, "", &loc).is_err());
        assert!(f.validate(&BigInt::from(150), None, "", &loc).is_ok());
    }

    #[test]
    fn integer_bounds_are_unbounded_width() {
        let loc = Location::default();
        let huge: BigInt = "123456789012345678901234567890".parse().unwrap();
        let f = IntegerFacets { minimum: Some(huge.clone()), ..Default::default() };
        assert!(f.validate(&(huge.clone() + 1), None, "", &loc).is_ok());
        assert!(f.validate(&BigInt::from(i64::MAX), None, "", &loc).is_err());
        assert!(f.validate(&(huge + 1), Some("int64"), "", &loc).is_err());
    }

    #[test]
    fn integer_format_narrows_width() {
        let loc = Location::default();
        let f = IntegerFacets::default();
        assert!(f.validate(&BigInt::from(127), Some("int8"), "", &loc).is_ok());
        assert!(f.validate(&BigInt::from(128), Some("int8"), "", &loc).is_err());
        assert!(f.validate(&BigInt::from(-32768), Some("int16"), "", &loc).is_ok());
    }

    #[test]
    fn minimum_narrowing_example() {
        let loc = Location::default();
        let parent = int_range(Some(100), None);
        assert!(int_range(Some(80), None).inherit(&parent, &loc).is_err());
        let merged = int_range(Some(120), None).inherit(&parent, &loc).unwrap();
        assert_eq!(merged.minimum, Some(BigInt::from(120)));
    }

    #[test]
    fn multiple_of_must_refine_parent() {
        let loc = Location::default();
        let parent = IntegerFacets { multiple_of: Some(BigInt::from(4)), ..Default::default() };
        let ok = IntegerFacets { multiple_of: Some(BigInt::from(8)), ..Default::default() };
        let bad = IntegerFacets { multiple_of: Some(BigInt::from(6)), ..Default::default() };
        assert!(ok.inherit(&parent, &loc).is_ok());
        assert!(bad.inherit(&parent, &loc).is_err());
        assert!(IntegerFacets { multiple_of: Some(BigInt::from(0)), ..Default::default() }.check(&loc).is_err());
    }

    #[test]
    fn number_facets_use_floats() {
        let loc = Location::default();
        let f = NumberFacets { minimum: Some(0.5), maximum: Some(2.5), multiple_of: Some(0.5) };
        assert!(f.check(&loc).is_ok());
        assert!(f.validate(1.5, None, "", &loc).is_ok());
        assert!(f.validate(1.2, None, "", &loc).is_err());
        assert!(f.validate(3.0, None, "", &loc).is_err());
        assert!(NumberFacets::default().validate(1e39, Some("float"), "", &loc).is_err());
        assert!(NumberFacets::default().validate(1e39, Some("double"), "", &loc).is_ok());
        assert!(NumberFacets::default().validate(3.5, Some("int32"), "", &loc).is_err());
    }

    #[test]
    fn number_inverted_range_fails_check() {
        let f = NumberFacets { minimum: Some(3.0), maximum: Some(1.0), multiple_of: None };
        assert!(matches!(f.check(&Location::default()), Err(ShapeError::SelfConsistency { .. })));
    }

    proptest! {
        #[test]
        fn minimum_fails_iff_below(m in -1000i64..1000, v in -1000i64..1000) {
            let f = int_range(Some(m), None);
            let res = f.validate(&BigInt::from(v), None, "", &Location::default());
            prop_assert_eq!(res.is_err(), v < m);
        }

        #[test]
        fn maximum_fails_iff_above(m in -1000i64..1000, v in -1000i64..1000) {
            let f = int_range(None, Some(m));
            let res = f.validate(&BigInt::from(v), None, "", &Location::default());
            prop_assert_eq!(res.is_err(), v > m);
        }

        #[test]
        fn minimum_narrowing_fails_iff_child_lower(p in -1000i64..1000, c in -1000i64..1000) {
            let res = int_range(Some(c), None).inherit(&int_range(Some(p), None), &Location::default());
            prop_assert_eq!(res.is_err(), c < p);
        }
    }
}
