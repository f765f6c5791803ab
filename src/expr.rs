//! Type expressions: `Name`, `T[]`, `A | B` and parentheses.
use std::iter::Peekable;
use std::str::CharIndices;

use crate::arena::ShapeArena;
use crate::base::ShapeRef;
use crate::error::{Location, Result, ShapeError};
use crate::facets::UnionFacets;
use crate::kind::TypeKind;
use crate::shape::{ArrayShape, Shape};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeExpr {
    Named(String),
    Array(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
}

/// Maps type names to handles while lowering expressions.
pub trait NameScope {
    fn lookup(&mut self, arena: &mut ShapeArena, name: &str, location: &Location) -> Result<ShapeRef>;
}

/// Scope with nothing but the builtin kinds. Each lookup yields a fresh
/// facet-less shape, so later narrowing never touches a shared slot.
#[derive(Clone, Copy, Debug, Default)]
pub struct Builtins;

impl NameScope for Builtins {
    fn lookup(&mut self, arena: &mut ShapeArena, name: &str, location: &Location) -> Result<ShapeRef> {
        builtin(arena, name, location)
            .ok_or_else(|| ShapeError::UnresolvedReference { location: location.clone(), name: name.to_string() })
    }
}

pub fn builtin(arena: &mut ShapeArena, name: &str, location: &Location) -> Option<ShapeRef> {
    let kind = TypeKind::from_label(name)?;
    Some(arena.insert_shape("", Shape::empty(kind), location))
}

impl TypeExpr {
    pub fn parse(src: &str, location: &Location) -> Result<TypeExpr> {
        let mut parser = Parser { src, chars: src.char_indices().peekable(), location };
        let expr = parser.union()?;
        parser.skip_ws();
        match parser.chars.peek().copied() {
            None => Ok(expr),
            Some((i, c)) => Err(parser.error(format!("unexpected `{c}` at offset {i}"))),
        }
    }

    /// Names whose shapes must be bound before a declaration of this
    /// expression can inherit from it. Array items are only referenced.
    pub fn heads(&self) -> Vec<&str> {
        match self {
            TypeExpr::Named(n) => vec![n.as_str()],
            TypeExpr::Array(_) => Vec::new(),
            TypeExpr::Union(xs) => xs.iter().flat_map(TypeExpr::heads).collect(),
        }
    }

    pub fn lower(&self, arena: &mut ShapeArena, scope: &mut dyn NameScope, location: &Location) -> Result<ShapeRef> {
        match self {
            TypeExpr::Named(name) => scope.lookup(arena, name, location),
            TypeExpr::Array(inner) => {
                let items = inner.lower(arena, scope, location)?;
                Ok(arena.insert_shape("", Shape::Array(ArrayShape { items: Some(items), ..Default::default() }), location))
            }
            TypeExpr::Union(branches) => {
                let any_of = branches
                    .iter()
                    .map(|b| b.lower(arena, scope, location))
                    .collect::<Result<Vec<_>>>()?;
                Ok(arena.insert_shape("", Shape::Union(UnionFacets { any_of }), location))
            }
        }
    }
}

// ------------------------------- Parser ----------------------------------- //

struct Parser<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
    location: &'a Location,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

impl Parser<'_> {
    fn error(&self, detail: String) -> ShapeError {
        ShapeError::structural(self.location, "type", format!("{detail} in `{}`", self.src))
    }

    fn skip_ws(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn union(&mut self) -> Result<TypeExpr> {
        let mut branches = vec![self.postfix()?];
        loop {
            self.skip_ws();
            if self.chars.next_if(|(_, c)| *c == '|').is_none() {
                break;
            }
            branches.push(self.postfix()?);
        }
        Ok(if branches.len() == 1 { branches.remove(0) } else { TypeExpr::Union(branches) })
    }

    fn postfix(&mut self) -> Result<TypeExpr> {
        let mut expr = self.primary()?;
        loop {
            self.skip_ws();
            if self.chars.next_if(|(_, c)| *c == '[').is_none() {
                return Ok(expr);
            }
            self.skip_ws();
            if self.chars.next_if(|(_, c)| *c == ']').is_none() {
                return Err(self.error("expected `]`".into()));
            }
            expr = TypeExpr::Array(Box::new(expr));
        }
    }

    fn primary(&mut self) -> Result<TypeExpr> {
        self.skip_ws();
        match self.chars.peek().copied() {
            Some((_, '(')) => {
                self.chars.next();
                let inner = self.union()?;
                self.skip_ws();
                match self.chars.next() {
                    Some((_, ')')) => Ok(inner),
                    _ => Err(self.error("expected `)`".into())),
                }
            }
            Some((start, c)) if is_name_char(c) => {
                let mut end = start;
                while let Some((i, c)) = self.chars.next_if(|(_, c)| is_name_char(*c)) {
                    end = i + c.len_utf8();
                }
                Ok(TypeExpr::Named(self.src[start..end].to_string()))
            }
            Some((i, c)) => Err(self.error(format!("unexpected `{c}` at offset {i}"))),
            None => Err(self.error("expected a type name".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use serde_json::json;

    fn parse(s: &str) -> Result<TypeExpr> { TypeExpr::parse(s, &Location::default()) }

    fn named(s: &str) -> TypeExpr { TypeExpr::Named(s.into()) }

    #[test]
    fn parses_unions_arrays_and_groups() {
        assert_eq!(parse("Person").unwrap(), named("Person"));
        assert_eq!(parse("string[]").unwrap(), TypeExpr::Array(Box::new(named("string"))));
        assert_eq!(parse("Cat | Dog").unwrap(), TypeExpr::Union(vec![named("Cat"), named("Dog")]));
        assert_eq!(
            parse("(Cat | Dog)[][]").unwrap(),
            TypeExpr::Array(Box::new(TypeExpr::Array(Box::new(TypeExpr::Union(vec![named("Cat"), named("Dog")])))))
        );
        assert_eq!(parse(" lib.Person [ ] ").unwrap(), TypeExpr::Array(Box::new(named("lib.Person"))));
        assert_eq!(parse("datetime-only").unwrap(), named("datetime-only"));
    }

    #[test]
    fn malformed_expressions_are_structural() {
        for src in ["", "A |", "(A", "A[", "A B", "A & B"] {
            assert!(matches!(parse(src), Err(ShapeError::Structural { .. })), "{src}");
        }
    }

    #[test]
    fn heads_skip_array_items() {
        assert_eq!(parse("A | B[] | (C | D)").unwrap().heads(), ["A", "C", "D"]);
        assert!(parse("Node[]").unwrap().heads().is_empty());
    }

    #[test]
    fn lowering_builds_fresh_builtin_shapes() {
        let mut arena = ShapeArena::new();
        let loc = Location::default();
        let r = parse("(string | nil)[]").unwrap().lower(&mut arena, &mut Builtins, &loc).unwrap();
        assert_eq!(arena[r].kind(), TypeKind::Array);
        arena.validate(r, &Value::from(json!(["a", null])), "").unwrap();
        assert!(arena.validate(r, &Value::from(json!([1])), "").is_err());

        let err = parse("Person").unwrap().lower(&mut arena, &mut Builtins, &loc).unwrap_err();
        assert!(matches!(err, ShapeError::UnresolvedReference { .. }));
    }
}
