//! Expansion of the non-contextual rule kinds.

use crate::types::{GenerateError, GlyphClassRegistry, LigatureRule, OneToManyRule, SimpleRule};

use super::combinator::{broadcast_len, column};

/// Expand `target -> replacement` in lock-step.
///
/// # Errors
///
/// Returns [`GenerateError::InvalidRule`] when the two sides resolve to
/// different sizes or name an undefined class.
pub fn expand_simple(
    rule: &SimpleRule,
    registry: &GlyphClassRegistry,
) -> Result<Vec<(String, String)>, GenerateError> {
    let line = rule.source_line;
    let targets = registry.resolve(&rule.target, line)?;
    let replacements = registry.resolve(&rule.replacement, line)?;
    if targets.len() != replacements.len() {
        return Err(GenerateError::invalid(
            line,
            format!(
                "'{}' and '{}' differ in size ({} vs {})",
                rule.target,
                rule.replacement,
                targets.len(),
                replacements.len()
            ),
        ));
    }
    Ok(targets.into_iter().zip(replacements).collect())
}

/// Expand a ligature into `(ligature, components)` entries.
///
/// Class-valued positions advance together; single glyphs repeat.
///
/// # Errors
///
/// Returns [`GenerateError::InvalidRule`] for fewer than two components or
/// class-valued positions of different sizes.
pub fn expand_ligature(
    rule: &LigatureRule,
    registry: &GlyphClassRegistry,
) -> Result<Vec<(String, Vec<String>)>, GenerateError> {
    let line = rule.source_line;
    if rule.components.len() < 2 {
        return Err(GenerateError::invalid(
            line,
            format!("ligature '{}' needs at least two components", rule.ligature),
        ));
    }
    let ligatures = registry.resolve(&rule.ligature, line)?;
    let components = registry.resolve_all(&rule.components, line)?;
    let count = broadcast_len(
        std::iter::once(ligatures.len()).chain(components.iter().map(Vec::len)),
    )
    .map_err(|(a, b)| size_error(line, "ligature", a, b))?;

    Ok((0..count)
        .map(|i| {
            let ligature = column(std::slice::from_ref(&ligatures), i).remove(0);
            (ligature, column(&components, i))
        })
        .collect())
}

/// Expand `source > t1 t2 ...` into `(source, targets)` entries.
///
/// # Errors
///
/// Returns [`GenerateError::InvalidRule`] for an empty target list or
/// class-valued positions of different sizes.
pub fn expand_one_to_many(
    rule: &OneToManyRule,
    registry: &GlyphClassRegistry,
) -> Result<Vec<(String, Vec<String>)>, GenerateError> {
    let line = rule.source_line;
    if rule.targets.is_empty() {
        return Err(GenerateError::invalid(
            line,
            format!("'{}' expands to nothing", rule.source),
        ));
    }
    let sources = registry.resolve(&rule.source, line)?;
    let targets = registry.resolve_all(&rule.targets, line)?;
    let count = broadcast_len(std::iter::once(sources.len()).chain(targets.iter().map(Vec::len)))
        .map_err(|(a, b)| size_error(line, "one-to-many", a, b))?;

    Ok((0..count)
        .map(|i| {
            let source = column(std::slice::from_ref(&sources), i).remove(0);
            (source, column(&targets, i))
        })
        .collect())
}

fn size_error(line: usize, what: &str, a: usize, b: usize) -> GenerateError {
    GenerateError::invalid(
        line,
        format!("{what} classes must have matching sizes ({a} vs {b})"),
    )
}
