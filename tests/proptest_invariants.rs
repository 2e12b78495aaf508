
use std::collections::{BTreeSet, HashSet};

use ot2aat::{
    detect_pattern, expand_contextual, expand_reorder, ExpandedContext, GeneratorConfig,
    OverlapPartition, TempGlyphArena,
};
use proptest::prelude::*;
use strategies::{
    arb_adjacent_case, arb_between_case, arb_between_run, arb_glyphs, arb_mixed_file,
    arb_reorder_file, arb_supported_window, arb_when_case, reorder_rule,
};
use table_runner::contextual_tables;

fn config() -> GeneratorConfig {
    GeneratorConfig::new("Prop", 0)
}

/// Class member lists per subtable, read back from rendered text.
fn classes_per_subtable(text: &str) -> Vec<Vec<Vec<String>>> {
    text.split("// Subtable ")
        .skip(1)
        .map(|chunk| {
            chunk
                .lines()
                .filter_map(|line| {
                    let line = line.trim();
                    let rest = line.strip_prefix("class ")?;
                    let open = rest.find('{')?;
                    let close = rest.rfind('}')?;
                    Some(
                        rest[open + 1..close]
                            .split(',')
                            .map(|g| g.trim().to_owned())
                            .collect(),
                    )
                })
                .collect()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Invariant 1: Class sizes drive expansion
//
// A single-position context of c glyphs with t target glyphs expands to
// exactly c * t rules, and every rule pairs the i-th target with the i-th
// replacement.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn adjacent_expansion_size(case in arb_adjacent_case()) {
        let file = case.file();
        let registry = file.registry().unwrap();
        let expanded =
            expand_contextual(&file.contextual[0], &registry, &mut TempGlyphArena::default())
                .unwrap();
        prop_assert_eq!(expanded.len(), case.contexts.len() * case.targets.len());
        for rule in &expanded {
            prop_assert_eq!(rule.substitutions.len(), 1);
            let (target, replacement) = &rule.substitutions[0];
            prop_assert_eq!(replacement, &format!("{target}.alt"));
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant 2: Overlap partition is total and disjoint
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn partition_totality(targets in arb_glyphs(4), contexts in arb_glyphs(5)) {
        let partition = OverlapPartition::new(&targets, &contexts);
        let union: BTreeSet<String> = targets.iter().chain(&contexts).cloned().collect();
        prop_assert_eq!(partition.universe(), union);

        prop_assert!(partition.target_only.is_disjoint(&partition.context_only));
        prop_assert!(partition.target_only.is_disjoint(&partition.both));
        prop_assert!(partition.context_only.is_disjoint(&partition.both));

        let t: BTreeSet<String> = targets.iter().cloned().collect();
        let c: BTreeSet<String> = contexts.iter().cloned().collect();
        let both: BTreeSet<String> = t.intersection(&c).cloned().collect();
        prop_assert_eq!(&partition.both, &both);
        prop_assert_eq!(partition.has_overlap(), !both.is_empty());
    }

    #[test]
    fn single_glyph_subtables_have_disjoint_classes(case in arb_adjacent_case()) {
        let text = case.file().generate(&config()).unwrap();
        for classes in classes_per_subtable(&text) {
            let mut seen = HashSet::new();
            for members in classes {
                for glyph in members {
                    prop_assert!(seen.insert(glyph.clone()), "glyph {} in two classes", glyph);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant 2b: Between tables
//
// Classes cover exactly the side and target glyphs, never share a glyph,
// and the table rewrites a target only between a first and a second context.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn between_classes_partition_roles(case in arb_between_case()) {
        let text = case.file().generate(&config()).unwrap();
        let tables = contextual_tables(&text);
        prop_assert_eq!(tables.len(), 1);
        prop_assert_eq!(tables[0].description.as_str(), "between");

        let mut seen = HashSet::new();
        for members in tables[0].classes.values() {
            for glyph in members {
                prop_assert!(seen.insert(glyph.clone()), "glyph {} in two classes", glyph);
            }
        }
        let universe: HashSet<String> = case
            .first
            .iter()
            .chain(&case.second)
            .chain(&case.targets)
            .cloned()
            .collect();
        prop_assert_eq!(seen, universe);
    }

    #[test]
    fn between_rewrites_only_enclosed_targets(
        case in arb_between_case(),
        glyphs in arb_between_run(),
    ) {
        let text = case.file().generate(&config()).unwrap();
        let tables = contextual_tables(&text);
        prop_assert_eq!(tables[0].run(&glyphs), case.expected(&glyphs));
    }
}

// ---------------------------------------------------------------------------
// Invariant 3: Reorder closure
//
// Every supported permutation is recognized, every expanded window is a
// permutation of its input, and each window gets its own subtable.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn supported_windows_detected((before, after) in arb_supported_window()) {
        let first = detect_pattern(&before, &after, 1);
        prop_assert!(first.is_ok(), "rejected {:?} => {:?}", before, after);
        prop_assert_eq!(first.unwrap(), detect_pattern(&before, &after, 1).unwrap());
    }

    #[test]
    fn reorder_windows_are_permutations(file in arb_reorder_file()) {
        let registry = file.registry().unwrap();
        let expanded = expand_reorder(reorder_rule(&file), &registry).unwrap();
        for window in &expanded {
            let mut b = window.before.clone();
            let mut a = window.after.clone();
            b.sort();
            a.sort();
            prop_assert_eq!(b, a);
            prop_assert_eq!(
                window.pattern,
                detect_pattern(&window.before, &window.after, 1).unwrap()
            );
        }

        let text = file.generate(&config()).unwrap();
        prop_assert_eq!(text.matches("rearrangement {").count(), expanded.len());
    }
}

// ---------------------------------------------------------------------------
// Invariant 4: Decomposition completeness
//
// An interior `when` target yields, per combination, an after rule into a
// fresh temporary glyph, a before rule out of it, and a cleanup rule that
// restores the original target.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn interior_when_decomposes_completely(case in arb_when_case()) {
        let file = case.file();
        let registry = file.registry().unwrap();
        let mut arena = TempGlyphArena::default();
        let expanded = expand_contextual(&file.contextual[0], &registry, &mut arena).unwrap();

        prop_assert_eq!(expanded.len(), 3 * case.size());
        prop_assert_eq!(arena.len(), case.size());

        let mut temps = HashSet::new();
        for triple in expanded.chunks(3) {
            let (target, temp) = &triple[0].substitutions[0];
            prop_assert!(matches!(triple[0].context, ExpandedContext::After(_)));
            prop_assert!(matches!(triple[1].context, ExpandedContext::Before(_)));
            prop_assert_eq!(&triple[1].substitutions[0].0, temp);
            prop_assert_eq!(&triple[1].substitutions[0].1, &format!("{target}.alt"));
            prop_assert_eq!(&triple[2].context, &ExpandedContext::Cleanup(temp.clone()));
            prop_assert_eq!(&triple[2].substitutions[0].1, target);
            prop_assert!(temps.insert(temp.clone()), "temporary glyph {} reused", temp);

            let group = triple[0].rule_group_id.clone();
            prop_assert!(group.is_some());
            prop_assert!(triple.iter().all(|r| r.rule_group_id == group));
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant 5: Determinism and numbering
//
// Generating the same file twice yields identical text, and subtables are
// numbered contiguously from zero.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(150))]

    #[test]
    fn generation_is_deterministic(file in arb_mixed_file()) {
        let first = file.generate(&config()).unwrap();
        for _ in 0..3 {
            let again = file.generate(&config()).unwrap();
            prop_assert_eq!(&first, &again, "determinism violated on repeated generation");
        }
    }

    #[test]
    fn subtables_numbered_contiguously(file in arb_mixed_file()) {
        let text = file.generate(&config()).unwrap();
        let count = text.matches("// Subtable ").count();
        prop_assert!(count > 0);
        for n in 0..count {
            let banner = format!("// Subtable {n}: ");
            prop_assert!(text.contains(&banner), "missing {}", banner);
        }
    }
}
