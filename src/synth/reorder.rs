use crate::atif::Document;
use crate::expand::expand_all_reorder;
use crate::types::{
    Action, ExpandedReorderRule, GenerateError, GeneratorConfig, GlyphClass, GlyphClassRegistry,
    ReorderRule, StateTable, Subtable, SubtableBody, START_STATE,
};

const MARK_FIRST: &str = "MarkFirst";
const REARRANGE: &str = "Rearrange";

/// Expand reorder rules and emit one rearrangement subtable per window.
///
/// # Errors
///
/// Returns [`GenerateError::InvalidRule`] for rules that do not expand or
/// whose permutation is not a supported verb.
pub fn generate_reorder(
    rules: &[ReorderRule],
    classes: &[GlyphClass],
    config: &GeneratorConfig,
) -> Result<String, GenerateError> {
    let registry = GlyphClassRegistry::from_classes(classes)?;
    let mut doc = Document::new(config);
    emit_reorder(&mut doc, rules, &registry)?;
    Ok(doc.render())
}

pub(crate) fn emit_reorder(
    doc: &mut Document,
    rules: &[ReorderRule],
    registry: &GlyphClassRegistry,
) -> Result<(), GenerateError> {
    for rule in expand_all_reorder(rules, registry)? {
        doc.push(rearrangement_subtable(&rule));
    }
    Ok(())
}

/// Mark the first glyph of the window, walk the rest, then rearrange.
fn rearrangement_subtable(rule: &ExpandedReorderRule) -> Subtable {
    let window = &rule.before;
    let len = window.len();
    let mut table = StateTable::new();

    // a glyph repeated in the window reuses the class of its first position
    let mut classes = Vec::with_capacity(len);
    for (k, glyph) in window.iter().enumerate() {
        let first = window.iter().position(|g| g == glyph).unwrap_or(k);
        let name = format!("Position{}", first + 1);
        if first == k {
            table.add_class(&name, [glyph.as_str()]);
        }
        classes.push(name);
    }

    let saw = |k: usize| format!("Saw{k}");
    let step = |k: usize| -> String {
        if k == 0 {
            MARK_FIRST.to_owned()
        } else if k + 1 == len {
            REARRANGE.to_owned()
        } else {
            format!("Advance{}", k + 1)
        }
    };

    for k in 1..len {
        table.state(&saw(k));
    }
    table.on(START_STATE, &classes[0], MARK_FIRST);
    for k in 1..len {
        let state = saw(k);
        table.on(&state, &classes[k], &step(k));
        table.on(&state, &classes[0], MARK_FIRST);
    }

    table.transition(MARK_FIRST, &saw(1), vec![Action::MarkFirst]);
    for k in 1..len.saturating_sub(1) {
        table.transition(&step(k), &saw(k + 1), vec![]);
    }
    table.transition(
        REARRANGE,
        START_STATE,
        vec![Action::MarkLast, Action::Rearrange(rule.pattern)],
    );

    Subtable::new(
        format!("rearrangement {rule}"),
        SubtableBody::Rearrangement(table),
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::types::{class, glyph, ReorderPattern};

    fn config() -> GeneratorConfig {
        GeneratorConfig::new("Reorder", 1)
    }

    #[test]
    fn swap_scenario() {
        let rule = ReorderRule {
            before: vec![glyph("A"), glyph("B")],
            after: vec![glyph("B"), glyph("A")],
            source_line: 1,
        };
        let text = generate_reorder(&[rule], &[], &config()).unwrap();
        assert!(text.contains("// Subtable 0: rearrangement A B => B A (Ax => xA)"));
        assert!(text.contains("class Position1 { A };"));
        assert!(text.contains("class Position2 { B };"));
        assert!(text.contains("rearrange (Ax => xA);"));
    }

    #[test]
    fn four_glyph_window_walks_every_position() {
        let rule = ExpandedReorderRule {
            before: ["a", "b", "c", "d"].map(String::from).to_vec(),
            after: ["c", "d", "a", "b"].map(String::from).to_vec(),
            pattern: ReorderPattern::ABxCDToCDxAB,
            source_line: 1,
        };
        let subtable = rearrangement_subtable(&rule);
        let table = subtable.body.state_table().unwrap();
        let states: Vec<&str> = table.states.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(states, [START_STATE, "Saw1", "Saw2", "Saw3"]);
        let names: Vec<&str> = table.transitions.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, [MARK_FIRST, "Advance2", "Advance3", REARRANGE]);
        assert_eq!(
            table.find_transition(REARRANGE).unwrap().actions,
            [
                Action::MarkLast,
                Action::Rearrange(ReorderPattern::ABxCDToCDxAB)
            ]
        );
    }

    #[test]
    fn repeated_glyph_shares_class() {
        let rule = ExpandedReorderRule {
            before: ["a", "b", "a"].map(String::from).to_vec(),
            after: ["b", "a", "a"].map(String::from).to_vec(),
            pattern: ReorderPattern::AxDToDxA,
            source_line: 1,
        };
        let subtable = rearrangement_subtable(&rule);
        let table = subtable.body.state_table().unwrap();
        assert_eq!(table.classes.len(), 2);
        let last = table.find_state("Saw2").unwrap();
        assert_eq!(last.entries[0], ("Position1".to_owned(), REARRANGE.to_owned()));
    }

    #[test]
    fn class_rules_emit_one_subtable_per_window() {
        let classes = [
            GlyphClass::new("cons", ["ka", "ga"]),
            GlyphClass::new("pre", ["i.pre", "e.pre"]),
        ];
        let rule = ReorderRule {
            before: vec![class("cons"), class("pre")],
            after: vec![class("pre"), class("cons")],
            source_line: 1,
        };
        let text = generate_reorder(&[rule], &classes, &config()).unwrap();
        assert!(text.contains("// Subtable 1: rearrangement ga e.pre => e.pre ga"));
    }

    #[test]
    fn unsupported_permutation_fails() {
        let rule = ReorderRule {
            before: vec![glyph("a"), glyph("b"), glyph("c")],
            after: vec![glyph("a"), glyph("c"), glyph("b")],
            source_line: 4,
        };
        let err = generate_reorder(&[rule], &[], &config()).unwrap_err();
        assert_eq!(err.line(), Some(4));
    }
}
