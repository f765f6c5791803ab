use crate::error::{Result, ShapeError};
use crate::facets::UnionFacets;
use crate::value::Value;

use super::ValidateCx;

/// First matching branch wins; the error lists every branch tried.
pub(crate) fn validate(union: &UnionFacets, cx: &ValidateCx<'_>, value: &Value, path: &str) -> Result<()> {
    let mut tried = Vec::with_capacity(union.any_of.len());
    for branch in &union.any_of {
        match cx.arena.validate(*branch, value, path) {
            Ok(()) => return Ok(()),
            Err(e) => {
                let label = cx.arena.get(cx.arena.target(*branch)).label();
                tracing::trace!(branch = label, error = %e, "union branch rejected");
                tried.push(label.to_string());
            }
        }
    }
    Err(ShapeError::violation(
        cx.location(),
        path,
        "anyOf",
        format!("{} value matches none of [{}]", value.kind_name(), tried.join(", ")),
    ))
}
