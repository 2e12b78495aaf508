//! Rule expansion: class-valued rules to glyph-level rules.

mod combinator;
mod contextual;
mod reorder;
mod sibling;

pub use contextual::expand_contextual;
pub use reorder::{expand_reorder, MAX_REORDER_EXPANSION};
pub use sibling::{expand_ligature, expand_one_to_many, expand_simple};

use crate::types::{
    ContextualRule, ExpandedContextualRule, ExpandedReorderRule, GenerateError,
    GlyphClassRegistry, ReorderRule, TempGlyphArena,
};

/// Expand every contextual rule, in source order.
///
/// # Errors
///
/// Fails on the first rule that does not expand.
pub fn expand_all_contextual(
    rules: &[ContextualRule],
    registry: &GlyphClassRegistry,
    arena: &mut TempGlyphArena,
) -> Result<Vec<ExpandedContextualRule>, GenerateError> {
    let mut expanded = Vec::new();
    for rule in rules {
        expanded.extend(expand_contextual(rule, registry, arena)?);
    }
    log::debug!(
        "expanded {} contextual rules into {} glyph-level rules ({} temporary glyphs)",
        rules.len(),
        expanded.len(),
        arena.len()
    );
    Ok(expanded)
}

/// Expand every reorder rule, in source order.
///
/// # Errors
///
/// Fails on the first rule that does not expand.
pub fn expand_all_reorder(
    rules: &[ReorderRule],
    registry: &GlyphClassRegistry,
) -> Result<Vec<ExpandedReorderRule>, GenerateError> {
    let mut expanded = Vec::new();
    for rule in rules {
        expanded.extend(expand_reorder(rule, registry)?);
    }
    log::debug!(
        "expanded {} reorder rules into {} glyph windows",
        rules.len(),
        expanded.len()
    );
    Ok(expanded)
}
