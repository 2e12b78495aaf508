use crate::types::{
    detect_pattern, ExpandedReorderRule, GenerateError, GlyphClassRegistry, ReorderRule,
};

use super::combinator::lockstep_len;

/// Upper bound on the glyph windows a single reorder rule may expand to.
pub const MAX_REORDER_EXPANSION: usize = 100;

/// Expand a reorder rule into glyph-level windows and classify each one.
///
/// Both sides advance in lock-step: the i-th window takes the i-th glyph of
/// every position. Paired positions must resolve to the same number of
/// glyphs, and so must every position of the rule.
///
/// # Errors
///
/// Returns [`GenerateError::InvalidRule`] for mismatched sides, undefined
/// classes, more than [`MAX_REORDER_EXPANSION`] windows, or a window whose
/// permutation is not a supported verb.
pub fn expand_reorder(
    rule: &ReorderRule,
    registry: &GlyphClassRegistry,
) -> Result<Vec<ExpandedReorderRule>, GenerateError> {
    let line = rule.source_line;
    if rule.before.len() != rule.after.len() {
        return Err(GenerateError::invalid(
            line,
            format!(
                "reorder sides have different element counts ({} vs {})",
                rule.before.len(),
                rule.after.len()
            ),
        ));
    }
    if !(2..=4).contains(&rule.before.len()) {
        return Err(GenerateError::invalid(
            line,
            format!(
                "reorder patterns must have 2 to 4 elements, got {}",
                rule.before.len()
            ),
        ));
    }

    let before = registry.resolve_all(&rule.before, line)?;
    let after = registry.resolve_all(&rule.after, line)?;

    for (i, (b, a)) in before.iter().zip(&after).enumerate() {
        if b.len() != a.len() {
            return Err(GenerateError::invalid(
                line,
                format!(
                    "position {} pairs '{}' with '{}' of different sizes ({} vs {})",
                    i + 1,
                    rule.before[i],
                    rule.after[i],
                    b.len(),
                    a.len()
                ),
            ));
        }
    }

    let count = lockstep_len(before.iter().map(Vec::len)).map_err(|(x, y)| {
        GenerateError::invalid(
            line,
            format!(
                "elements '{}' and '{}' must expand to the same size ({} vs {})",
                rule.before[x],
                rule.before[y],
                before[x].len(),
                before[y].len()
            ),
        )
    })?;
    if count > MAX_REORDER_EXPANSION {
        return Err(GenerateError::invalid(
            line,
            format!("expands to {count} combinations (limit {MAX_REORDER_EXPANSION})"),
        ));
    }

    (0..count)
        .map(|i| {
            let b: Vec<String> = before.iter().map(|p| p[i].clone()).collect();
            let a: Vec<String> = after.iter().map(|p| p[i].clone()).collect();
            let pattern = detect_pattern(&b, &a, line)?;
            let expanded = ExpandedReorderRule {
                before: b,
                after: a,
                pattern,
                source_line: line,
            };
            log::trace!("line {line}: {expanded}");
            Ok(expanded)
        })
        .collect()
}
