use indexmap::IndexMap;

use crate::base::ShapeRef;
use crate::error::{Location, Result, ShapeError};
use crate::facets::{check_range, narrow_max, narrow_min, Pattern};
use crate::kind::TypeKind;
use crate::value::Value;

use super::ValidateCx;

#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub name: String,
    pub shape: ShapeRef,
    pub required: bool,
    /// Set for `/regex/` keys: the property applies to every undeclared
    /// instance key the regex matches.
    pub pattern: Option<Pattern>,
}

impl Property {
    pub fn new(name: impl Into<String>, shape: ShapeRef, required: bool) -> Self {
        Self { name: name.into(), shape, required, pattern: None }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectShape {
    pub properties: IndexMap<String, Property>,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    pub additional_properties: Option<bool>,
    pub discriminator: Option<String>,
    /// Defaults to the type's own name; never inherited.
    pub discriminator_value: Option<Value>,
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() { key.to_string() } else { format!("{path}.{key}") }
}

impl ObjectShape {
    pub fn check(&self, location: &Location) -> Result<()> {
        check_range("minProperties", &self.min_properties, "maxProperties", &self.max_properties, location)?;
        match (&self.discriminator, &self.discriminator_value) {
            (None, Some(_)) => Err(ShapeError::inconsistent(location, "discriminatorValue", "set without a discriminator")),
            (Some(d), _) if !self.properties.contains_key(d) => Err(ShapeError::inconsistent(
                location,
                "discriminator",
                format!("`{d}` is not a declared property"),
            )),
            _ => Ok(()),
        }
    }

    /// Count, openness and discriminator facets; `properties` comes merged
    /// from the caller.
    pub fn inherit(&self, parent: &Self, properties: IndexMap<String, Property>, location: &Location) -> Result<Self> {
        if parent.additional_properties == Some(false) && self.additional_properties == Some(true) {
            return Err(ShapeError::narrowing(location, "additionalProperties", false, true));
        }
        Ok(Self {
            properties,
            min_properties: narrow_min("minProperties", &parent.min_properties, &self.min_properties, location)?,
            max_properties: narrow_max("maxProperties", &parent.max_properties, &self.max_properties, location)?,
            additional_properties: self.additional_properties.or(parent.additional_properties),
            discriminator: self.discriminator.clone().or_else(|| parent.discriminator.clone()),
            discriminator_value: self.discriminator_value.clone(),
        })
    }

    pub fn validate(&self, cx: &ValidateCx<'_>, value: &Value, path: &str) -> Result<()> {
        let Value::Object(map) = value else {
            return Err(cx.mismatch(path, TypeKind::Object, value));
        };
        let count = map.len() as u64;
        if let Some(min) = self.min_properties {
            if count < min {
                return Err(ShapeError::violation(cx.location(), path, "minProperties", format!("{count} properties, at least {min} required")));
            }
        }
        if let Some(max) = self.max_properties {
            if count > max {
                return Err(ShapeError::violation(cx.location(), path, "maxProperties", format!("{count} properties, at most {max} allowed")));
            }
        }

        if let Some(key) = &self.discriminator {
            let expected = self.discriminator_value.clone().unwrap_or_else(|| Value::string(cx.base.name.clone()));
            match map.get(key) {
                Some(found) if *found == expected => {}
                Some(found) => {
                    return Err(ShapeError::violation(
                        cx.location(),
                        &join_path(path, key),
                        "discriminatorValue",
                        format!("expected {expected}, found {found}"),
                    ));
                }
                None => {
                    return Err(ShapeError::violation(cx.location(), path, "discriminator", format!("missing `{key}`")));
                }
            }
        }

        let declared = self.properties.values().filter(|p| p.pattern.is_none());
        for prop in declared {
            match map.get(&prop.name) {
                Some(v) => cx.arena.validate(prop.shape, v, &join_path(path, &prop.name))?,
                None if prop.required => {
                    return Err(ShapeError::violation(cx.location(), path, "required", format!("missing property `{}`", prop.name)));
                }
                None => {}
            }
        }

        for (key, v) in map {
            if self.properties.get(key).is_some_and(|p| p.pattern.is_none()) {
                continue;
            }
            let by_pattern = self.properties.values().find(|p| p.pattern.as_ref().is_some_and(|rx| rx.is_match(key)));
            match by_pattern {
                Some(prop) => cx.arena.validate(prop.shape, v, &join_path(path, key))?,
                None if self.additional_properties == Some(false) => {
                    return Err(ShapeError::violation(cx.location(), path, "additionalProperties", format!("unexpected property `{key}`")));
                }
                None => {}
            }
        }
        Ok(())
    }
}
