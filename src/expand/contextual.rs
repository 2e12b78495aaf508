use std::collections::HashSet;

use crate::types::{
    ContextType, ContextualRule, ExpandedContext, ExpandedContextualRule, GenerateError,
    GlyphClassRegistry, RuleElement, SubstitutionPair, TempGlyphArena, TempPurpose,
};

use super::combinator::{cartesian_product, lockstep_len};

/// Expand a contextual rule into glyph-level rules.
///
/// `after`/`before`/`between` contexts expand as a cartesian product over
/// their positions, crossed with every target index. A `when` rule with a
/// single substitution is decomposed into before/after rules (plus a
/// cleanup rule when the target is interior); with several substitutions
/// it stays a `when` rule per pattern combination and needs multi-pass
/// synthesis.
///
/// # Errors
///
/// Returns [`GenerateError::InvalidRule`] for undefined classes, class size
/// mismatches, or a `when` target that does not occur in its pattern.
pub fn expand_contextual(
    rule: &ContextualRule,
    registry: &GlyphClassRegistry,
    arena: &mut TempGlyphArena,
) -> Result<Vec<ExpandedContextualRule>, GenerateError> {
    let line = rule.source_line;
    if rule.substitutions.is_empty() {
        return Err(GenerateError::invalid(line, "rule has no substitutions"));
    }

    let expanded = match &rule.context {
        ContextType::After(pattern) => {
            expand_adjacent(rule, pattern, registry, ExpandedContext::After)?
        }
        ContextType::Before(pattern) => {
            expand_adjacent(rule, pattern, registry, ExpandedContext::Before)?
        }
        ContextType::Between { first, second } => expand_between(rule, first, second, registry)?,
        ContextType::When(pattern) => expand_when(rule, pattern, registry, arena)?,
    };

    for e in &expanded {
        log::trace!("line {line}: {e}");
    }
    Ok(expanded)
}

/// Resolve a pair and check both sides have the same number of glyphs.
fn resolve_pair(
    pair: &SubstitutionPair,
    registry: &GlyphClassRegistry,
    line: usize,
) -> Result<(Vec<String>, Vec<String>), GenerateError> {
    let targets = registry.resolve(&pair.target, line)?;
    let replacements = registry.resolve(&pair.replacement, line)?;
    if targets.len() != replacements.len() {
        return Err(GenerateError::invalid(
            line,
            format!(
                "target and replacement sizes differ in '{pair}' ({} vs {})",
                targets.len(),
                replacements.len()
            ),
        ));
    }
    Ok((targets, replacements))
}

fn require_pattern(
    pattern: &[RuleElement],
    what: &str,
    line: usize,
) -> Result<(), GenerateError> {
    if pattern.is_empty() {
        return Err(GenerateError::invalid(
            line,
            format!("{what} context needs at least one element"),
        ));
    }
    Ok(())
}

fn expand_adjacent(
    rule: &ContextualRule,
    pattern: &[RuleElement],
    registry: &GlyphClassRegistry,
    make: fn(Vec<String>) -> ExpandedContext,
) -> Result<Vec<ExpandedContextualRule>, GenerateError> {
    let line = rule.source_line;
    require_pattern(pattern, rule.context.kind(), line)?;
    let contexts = cartesian_product(&registry.resolve_all(pattern, line)?);

    let mut out = Vec::new();
    for pair in &rule.substitutions {
        let (targets, replacements) = resolve_pair(pair, registry, line)?;
        for context in &contexts {
            for (target, replacement) in targets.iter().zip(&replacements) {
                out.push(ExpandedContextualRule::single(
                    make(context.clone()),
                    target,
                    replacement,
                    line,
                ));
            }
        }
    }
    Ok(out)
}

fn expand_between(
    rule: &ContextualRule,
    first: &[RuleElement],
    second: &[RuleElement],
    registry: &GlyphClassRegistry,
) -> Result<Vec<ExpandedContextualRule>, GenerateError> {
    let line = rule.source_line;
    require_pattern(first, "between (first)", line)?;
    require_pattern(second, "between (second)", line)?;
    let firsts = cartesian_product(&registry.resolve_all(first, line)?);
    let seconds = cartesian_product(&registry.resolve_all(second, line)?);

    let mut out = Vec::new();
    for pair in &rule.substitutions {
        let (targets, replacements) = resolve_pair(pair, registry, line)?;
        for f in &firsts {
            for s in &seconds {
                for (target, replacement) in targets.iter().zip(&replacements) {
                    out.push(ExpandedContextualRule::single(
                        ExpandedContext::Between {
                            first: f.clone(),
                            second: s.clone(),
                        },
                        target,
                        replacement,
                        line,
                    ));
                }
            }
        }
    }
    Ok(out)
}

fn expand_when(
    rule: &ContextualRule,
    pattern: &[RuleElement],
    registry: &GlyphClassRegistry,
    arena: &mut TempGlyphArena,
) -> Result<Vec<ExpandedContextualRule>, GenerateError> {
    let line = rule.source_line;
    if pattern.len() < 2 {
        return Err(GenerateError::invalid(
            line,
            "when pattern needs at least two elements",
        ));
    }

    let positions = registry.resolve_all(pattern, line)?;
    let size = lockstep_len(positions.iter().map(Vec::len)).map_err(|(a, b)| {
        GenerateError::invalid(
            line,
            format!(
                "when pattern elements '{}' and '{}' differ in size ({} vs {})",
                pattern[a],
                pattern[b],
                positions[a].len(),
                positions[b].len()
            ),
        )
    })?;

    let mut pairs = Vec::with_capacity(rule.substitutions.len());
    for pair in &rule.substitutions {
        let (targets, replacements) = resolve_pair(pair, registry, line)?;
        if targets.len() != size {
            return Err(GenerateError::invalid(
                line,
                format!(
                    "substitution '{pair}' does not match the pattern size ({} vs {size})",
                    targets.len()
                ),
            ));
        }
        pairs.push((targets, replacements));
    }

    if let [(targets, replacements)] = pairs.as_slice() {
        decompose(rule, &positions, targets, replacements, arena)
    } else {
        Ok((0..size)
            .map(|k| ExpandedContextualRule {
                context: ExpandedContext::When(positions.iter().map(|p| p[k].clone()).collect()),
                substitutions: pairs
                    .iter()
                    .map(|(t, r)| (t[k].clone(), r[k].clone()))
                    .collect(),
                source_line: line,
                rule_group_id: None,
            })
            .collect())
    }
}

/// Rewrite a single-substitution `when` rule as before/after rules.
///
/// An interior target becomes three rules sharing one group id: an `after`
/// rule turning the target into a temporary glyph, a `before` rule turning
/// the temporary glyph into the replacement, and a cleanup rule restoring
/// the target when the trailing context never shows up.
fn decompose(
    rule: &ContextualRule,
    positions: &[Vec<String>],
    targets: &[String],
    replacements: &[String],
    arena: &mut TempGlyphArena,
) -> Result<Vec<ExpandedContextualRule>, GenerateError> {
    let line = rule.source_line;
    let target_set: HashSet<&str> = targets.iter().map(String::as_str).collect();
    let position = positions
        .iter()
        .position(|glyphs| glyphs.iter().any(|g| target_set.contains(g.as_str())))
        .ok_or_else(|| {
            GenerateError::invalid(
                line,
                format!(
                    "target '{}' does not occur in the when pattern",
                    rule.substitutions[0].target
                ),
            )
        })?;
    let last = positions.len() - 1;
    let group = format!("decomposed_{line}");

    let mut out = Vec::new();
    for (k, (target, replacement)) in targets.iter().zip(replacements).enumerate() {
        let column: Vec<String> = positions.iter().map(|p| p[k].clone()).collect();
        if position == 0 {
            out.push(ExpandedContextualRule::single(
                ExpandedContext::Before(column[1..].to_vec()),
                target,
                replacement,
                line,
            ));
        } else if position == last {
            out.push(ExpandedContextualRule::single(
                ExpandedContext::After(column[..last].to_vec()),
                target,
                replacement,
                line,
            ));
        } else {
            let temp = arena
                .allocate(TempPurpose::Decomposed, line, k, 0)?
                .to_string();
            out.push(
                ExpandedContextualRule::single(
                    ExpandedContext::After(column[..position].to_vec()),
                    target,
                    &temp,
                    line,
                )
                .in_group(&group),
            );
            out.push(
                ExpandedContextualRule::single(
                    ExpandedContext::Before(column[position + 1..].to_vec()),
                    &temp,
                    replacement,
                    line,
                )
                .in_group(&group),
            );
            out.push(
                ExpandedContextualRule::single(
                    ExpandedContext::Cleanup(temp.clone()),
                    &temp,
                    target,
                    line,
                )
                .in_group(&group),
            );
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{class, glyph, pair, GlyphClass};

    fn registry() -> GlyphClassRegistry {
        GlyphClassRegistry::from_classes(&[
            GlyphClass::new("ctx", ["c1", "c2"]),
            GlyphClass::new("tgt", ["t1", "t2", "t3"]),
            GlyphClass::new("repl", ["r1", "r2", "r3"]),
            GlyphClass::new("two", ["t1", "t2"]),
            GlyphClass::new("mid", ["m1", "m2"]),
            GlyphClass::new("mid_alt", ["m1.alt", "m2.alt"]),
            GlyphClass::new("lead", ["l1", "l2"]),
            GlyphClass::new("tail", ["e1", "e2"]),
        ])
        .unwrap()
    }

    fn expand(rule: &ContextualRule) -> Result<Vec<ExpandedContextualRule>, GenerateError> {
        expand_contextual(rule, &registry(), &mut TempGlyphArena::default())
    }

    #[test]
    fn after_class_context_is_product_times_targets() {
        let rule = ContextualRule::new(
            ContextType::After(vec![class("ctx")]),
            vec![pair(class("tgt"), class("repl"))],
            1,
        );
        let expanded = expand(&rule).unwrap();
        assert_eq!(expanded.len(), 6);
        assert_eq!(expanded[0].context, ExpandedContext::After(vec!["c1".into()]));
        assert_eq!(expanded[0].substitutions, [("t1".into(), "r1".into())]);
        assert_eq!(expanded[5].context, ExpandedContext::After(vec!["c2".into()]));
        assert_eq!(expanded[5].substitutions, [("t3".into(), "r3".into())]);
    }

    #[test]
    fn after_size_mismatch_cites_sizes() {
        let rule = ContextualRule::new(
            ContextType::After(vec![class("ctx")]),
            vec![pair(class("two"), class("repl"))],
            5,
        );
        let err = expand(&rule).unwrap_err();
        assert_eq!(err.line(), Some(5));
        assert!(err.to_string().contains("(2 vs 3)"), "{err}");
    }

    #[test]
    fn multi_position_before_context() {
        let rule = ContextualRule::new(
            ContextType::Before(vec![class("ctx"), class("lead")]),
            vec![pair(glyph("x"), glyph("x.alt"))],
            1,
        );
        let expanded = expand(&rule).unwrap();
        assert_eq!(expanded.len(), 4);
        assert!(expanded
            .iter()
            .all(|e| matches!(&e.context, ExpandedContext::Before(p) if p.len() == 2)));
    }

    #[test]
    fn between_crosses_both_sides() {
        let rule = ContextualRule::new(
            ContextType::Between {
                first: vec![class("ctx")],
                second: vec![class("lead")],
            },
            vec![pair(class("two"), class("mid"))],
            1,
        );
        assert_eq!(expand(&rule).unwrap().len(), 2 * 2 * 2);
    }

    #[test]
    fn undefined_class_reported() {
        let rule = ContextualRule::new(
            ContextType::After(vec![class("nope")]),
            vec![pair(glyph("a"), glyph("b"))],
            3,
        );
        assert_eq!(
            expand(&rule).unwrap_err(),
            GenerateError::undefined_class("nope", 3)
        );
    }

    #[test]
    fn empty_context_rejected() {
        let rule = ContextualRule::new(
            ContextType::After(vec![]),
            vec![pair(glyph("a"), glyph("b"))],
            1,
        );
        assert!(expand(&rule).is_err());
    }

    #[test]
    fn when_interior_target_decomposes_into_three() {
        let rule = ContextualRule::new(
            ContextType::When(vec![glyph("a"), glyph("t"), glyph("c")]),
            vec![pair(glyph("t"), glyph("r"))],
            2,
        );
        let expanded = expand(&rule).unwrap();
        assert_eq!(expanded.len(), 3);
        assert_eq!(expanded[0].context, ExpandedContext::After(vec!["a".into()]));
        assert_eq!(expanded[0].substitutions, [("t".into(), "65000".into())]);
        assert_eq!(expanded[1].context, ExpandedContext::Before(vec!["c".into()]));
        assert_eq!(expanded[1].substitutions, [("65000".into(), "r".into())]);
        assert_eq!(expanded[2].context, ExpandedContext::Cleanup("65000".into()));
        assert_eq!(expanded[2].substitutions, [("65000".into(), "t".into())]);
        assert!(expanded
            .iter()
            .all(|e| e.rule_group_id.as_deref() == Some("decomposed_2")));
    }

    #[test]
    fn when_leading_target_becomes_before() {
        let rule = ContextualRule::new(
            ContextType::When(vec![class("mid"), class("tail")]),
            vec![pair(class("mid"), class("mid_alt"))],
            1,
        );
        let expanded = expand(&rule).unwrap();
        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[1].context, ExpandedContext::Before(vec!["e2".into()]));
        assert_eq!(expanded[1].substitutions, [("m2".into(), "m2.alt".into())]);
        assert!(expanded.iter().all(|e| e.rule_group_id.is_none()));
    }

    #[test]
    fn when_trailing_target_becomes_after() {
        let rule = ContextualRule::new(
            ContextType::When(vec![class("lead"), class("ctx"), class("mid")]),
            vec![pair(class("mid"), class("mid_alt"))],
            1,
        );
        let expanded = expand(&rule).unwrap();
        assert_eq!(expanded.len(), 2);
        assert_eq!(
            expanded[0].context,
            ExpandedContext::After(vec!["l1".into(), "c1".into()])
        );
    }

    #[test]
    fn when_class_temps_are_unique_per_combination() {
        let rule = ContextualRule::new(
            ContextType::When(vec![class("lead"), class("mid"), class("tail")]),
            vec![pair(class("mid"), class("mid_alt"))],
            4,
        );
        let expanded = expand(&rule).unwrap();
        assert_eq!(expanded.len(), 6);
        let temps: HashSet<&str> = expanded
            .iter()
            .filter(|e| e.is_cleanup())
            .map(|e| e.substitutions[0].0.as_str())
            .collect();
        assert_eq!(temps.len(), 2);
    }

    #[test]
    fn when_target_missing_from_pattern() {
        let rule = ContextualRule::new(
            ContextType::When(vec![glyph("a"), glyph("b")]),
            vec![pair(glyph("z"), glyph("z.alt"))],
            8,
        );
        let err = expand(&rule).unwrap_err();
        assert!(err.to_string().contains("does not occur"));
    }

    #[test]
    fn when_pattern_sizes_must_agree() {
        let rule = ContextualRule::new(
            ContextType::When(vec![glyph("a"), class("tgt")]),
            vec![pair(class("tgt"), class("repl"))],
            1,
        );
        let err = expand(&rule).unwrap_err();
        assert!(err.to_string().contains("(1 vs 3)"), "{err}");
    }

    #[test]
    fn when_substitution_must_match_pattern_size() {
        let rule = ContextualRule::new(
            ContextType::When(vec![class("lead"), class("mid")]),
            vec![pair(class("tgt"), class("repl"))],
            1,
        );
        let err = expand(&rule).unwrap_err();
        assert!(err.to_string().contains("(3 vs 2)"), "{err}");
    }

    #[test]
    fn when_multiple_substitutions_stay_when() {
        let rule = ContextualRule::new(
            ContextType::When(vec![glyph("a"), glyph("b"), glyph("c"), glyph("d")]),
            vec![pair(glyph("b"), glyph("b.alt")), pair(glyph("c"), glyph("c.alt"))],
            1,
        );
        let expanded = expand(&rule).unwrap();
        assert_eq!(expanded.len(), 1);
        assert!(expanded[0].needs_multi_pass());
        assert!(expanded[0].rule_group_id.is_none());
        assert_eq!(expanded[0].substitutions.len(), 2);
    }

    #[test]
    fn single_element_when_rejected() {
        let rule = ContextualRule::new(
            ContextType::When(vec![glyph("a")]),
            vec![pair(glyph("a"), glyph("b"))],
            1,
        );
        assert!(expand(&rule).is_err());
    }
}
