//! Type documents: JSON files of the form `{"types": {"Name": <declaration>}}`.
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Location, Result, ShapeError};
use crate::value::Value;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDocument {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub types: IndexMap<String, serde_json::Value>,
}

impl TypeDocument {
    pub fn parse(src: &str, source: &str) -> Result<Self> {
        from_str_with_path(src, source)
    }

    /// Declarations as shape values, in document order.
    pub fn types(&self) -> IndexMap<String, Value> {
        self.types.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect()
    }

    /// Append another document's declarations. Names must stay unique.
    pub fn merge(&mut self, other: TypeDocument, source: &str) -> Result<()> {
        for (name, decl) in other.types {
            if self.types.contains_key(&name) {
                return Err(ShapeError::structural(&Location::new(source, 0, 0), format!("types.{name}"), "declared twice"));
            }
            self.types.insert(name, decl);
        }
        Ok(())
    }
}

/// Deserialize with the JSON path of the failure in the error.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str, source: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        let inner = err.into_inner();
        let location = Location::new(source, inner.line() as u32, inner.column() as u32);
        ShapeError::structural(&location, path, inner.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_name_the_json_path() {
        let err = TypeDocument::parse(r#"{"types": {"A": "string"}, "title": 3}"#, "doc.json").unwrap_err();
        match err {
            ShapeError::Structural { field, location, .. } => {
                assert_eq!(field, "title");
                assert_eq!(location.source.as_deref(), Some("doc.json"));
                assert_eq!(location.line, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(TypeDocument::parse(r#"{"typos": {}}"#, "doc.json").is_err());
    }

    #[test]
    fn documents_merge_in_order_without_duplicates() {
        let mut a = TypeDocument::parse(r#"{"types": {"B": "string", "A": "integer"}}"#, "a.json").unwrap();
        let b = TypeDocument::parse(r#"{"types": {"C": "A"}}"#, "b.json").unwrap();
        a.merge(b, "b.json").unwrap();
        let names: Vec<String> = a.types().keys().cloned().collect();
        assert_eq!(names, ["B", "A", "C"]);
        let again = TypeDocument::parse(r#"{"types": {"A": "nil"}}"#, "c.json").unwrap();
        assert!(a.merge(again, "c.json").is_err());
    }
}
