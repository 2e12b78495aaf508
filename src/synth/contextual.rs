//! State tables for contextual substitution.
//!
//! Expanded rules are split into single-pass, multi-pass and cleanup rules
//! and emitted in a fixed order, so the subtable numbering depends only on
//! the input:
//!
//! 1. `after` groups, by context length, then (length 1 only) by glyph
//! 2. `before` groups, same grouping
//! 3. one `between` subtable for single-glyph sides, then one chain per
//!    longer side shape
//! 4. one single-pass `when` subtable
//! 5. one cleanup subtable per decomposition group, by group id
//! 6. a marking/substitution/cleanup triple per multi-pass rule
//! 7. one cleanup subtable for ungrouped cleanup rules

use std::collections::{BTreeMap, BTreeSet};

use crate::atif::Document;
use crate::expand::expand_all_contextual;
use crate::types::{
    Action, ContextualRule, ExpandedContext, ExpandedContextualRule, GenerateError,
    GeneratorConfig, GlyphClass, GlyphClassRegistry, Replacement, StateTable, Subtable,
    SubtableBody, TempGlyphArena, TempPurpose, START_STATE,
};

use super::first_wins;
use super::partition::OverlapPartition;

const CONTEXT: &str = "Context";
const TARGET: &str = "Target";
const BOTH: &str = "TrgtAndCntx";
const FIRST: &str = "First";
const SECOND: &str = "Second";
const FIRST_AND_SECOND: &str = "FirstAndSecond";
const TARGET_AND_FIRST: &str = "TrgtAndFirst";
const TARGET_AND_SECOND: &str = "TrgtAndSecond";
const TARGET_AND_BOTH: &str = "TrgtAndBoth";

const SAW_CONTEXT: &str = "SawContext";
const SAW_TARGET: &str = "SawTarget";
const SAW_FIRST: &str = "SawFirst";
const SAW_TARGET_FIRST: &str = "SawTargetFirst";

const MARK_TARGET: &str = "MarkTarget";
const MARK_TARGET_BOTH: &str = "MarkTargetBoth";
const MARK_TARGET_FIRST: &str = "MarkTargetFirst";
const DO_SUBSTITUTION: &str = "DoSubstitution";
const DO_SUBSTITUTION_BOTH: &str = "DoSubstitutionBoth";
const DO_SUBSTITUTION_FIRST: &str = "DoSubstitutionFirst";
const DO_SUBSTITUTION_BOTH_FIRST: &str = "DoSubstitutionBothFirst";

const SUBST: &str = "Subst";
const MARK_TEMPS: &str = "MarkTemps";

/// Expand and synthesize contextual rules into a complete document.
///
/// # Errors
///
/// Returns [`GenerateError::InvalidRule`] for rules that do not expand and
/// [`GenerateError::GenerationFailed`] when a subtable cannot be built.
pub fn generate_contextual(
    rules: &[ContextualRule],
    classes: &[GlyphClass],
    config: &GeneratorConfig,
) -> Result<String, GenerateError> {
    let registry = GlyphClassRegistry::from_classes(classes)?;
    let mut arena = TempGlyphArena::new(config.temp_base());
    let mut doc = Document::new(config);
    emit_contextual(&mut doc, rules, &registry, &mut arena)?;
    Ok(doc.render())
}

/// Synthesize a document from rules that are already glyph-level.
///
/// Multi-pass temporaries come from `arena`, so pass the arena used for
/// expansion to keep every temporary glyph distinct.
///
/// # Errors
///
/// Returns [`GenerateError::GenerationFailed`] when a subtable cannot be
/// built from the given rules.
pub fn synthesize_contextual(
    expanded: &[ExpandedContextualRule],
    config: &GeneratorConfig,
    arena: &mut TempGlyphArena,
) -> Result<String, GenerateError> {
    let mut doc = Document::new(config);
    synthesize(&mut doc, expanded, arena)?;
    Ok(doc.render())
}

pub(crate) fn emit_contextual(
    doc: &mut Document,
    rules: &[ContextualRule],
    registry: &GlyphClassRegistry,
    arena: &mut TempGlyphArena,
) -> Result<(), GenerateError> {
    let expanded = expand_all_contextual(rules, registry, arena)?;
    synthesize(doc, &expanded, arena)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    After,
    Before,
}

impl Side {
    fn name(self) -> &'static str {
        match self {
            Side::After => "after",
            Side::Before => "before",
        }
    }
}

type Group<'a> = Vec<&'a ExpandedContextualRule>;

fn synthesize(
    doc: &mut Document,
    expanded: &[ExpandedContextualRule],
    arena: &mut TempGlyphArena,
) -> Result<(), GenerateError> {
    let mut after: BTreeMap<usize, Group<'_>> = BTreeMap::new();
    let mut before: BTreeMap<usize, Group<'_>> = BTreeMap::new();
    let mut between: BTreeMap<(usize, usize), Group<'_>> = BTreeMap::new();
    let mut when = Vec::new();
    let mut multi_pass = Vec::new();
    let mut grouped_cleanup: BTreeMap<&str, Group<'_>> = BTreeMap::new();
    let mut residual_cleanup = Vec::new();

    for rule in expanded {
        match (&rule.context, rule.needs_multi_pass()) {
            (ExpandedContext::Cleanup(_), _) => match rule.rule_group_id.as_deref() {
                Some(id) => grouped_cleanup.entry(id).or_default().push(rule),
                None => residual_cleanup.push(rule),
            },
            (_, true) => multi_pass.push(rule),
            (ExpandedContext::After(p), false) => after.entry(p.len()).or_default().push(rule),
            (ExpandedContext::Before(p), false) => before.entry(p.len()).or_default().push(rule),
            (ExpandedContext::Between { first, second }, false) => between
                .entry((first.len(), second.len()))
                .or_default()
                .push(rule),
            (ExpandedContext::When(_), false) => when.push(rule),
        }
    }

    log::debug!(
        "synthesizing {} after, {} before, {} between, {} when, {} multi-pass, {} cleanup rules",
        after.values().map(Vec::len).sum::<usize>(),
        before.values().map(Vec::len).sum::<usize>(),
        between.values().map(Vec::len).sum::<usize>(),
        when.len(),
        multi_pass.len(),
        grouped_cleanup.values().map(Vec::len).sum::<usize>() + residual_cleanup.len()
    );

    emit_adjacent(doc, &after, Side::After)?;
    emit_adjacent(doc, &before, Side::Before)?;
    for (&shape, rules) in &between {
        if shape == (1, 1) {
            doc.push(between_subtable(rules));
        } else {
            doc.push(between_chain_subtable(shape, rules)?);
        }
    }
    if !when.is_empty() {
        doc.push(when_subtable(&when)?);
    }
    for (id, rules) in &grouped_cleanup {
        doc.push(cleanup_subtable(format!("cleanup {id}"), rules));
    }
    for (ordinal, rule) in multi_pass.iter().enumerate() {
        for subtable in multi_pass_triple(rule, ordinal, arena)? {
            doc.push(subtable);
        }
    }
    if !residual_cleanup.is_empty() {
        doc.push(cleanup_subtable("cleanup".to_owned(), &residual_cleanup));
    }
    Ok(())
}

fn pairs_of<'a>(rules: &[&'a ExpandedContextualRule]) -> Vec<(&'a str, &'a str)> {
    rules
        .iter()
        .copied()
        .flat_map(|r| r.substitutions.iter().map(|(t, s)| (t.as_str(), s.as_str())))
        .collect()
}

fn emit_adjacent(
    doc: &mut Document,
    groups: &BTreeMap<usize, Group<'_>>,
    side: Side,
) -> Result<(), GenerateError> {
    for (&len, rules) in groups {
        if len == 1 {
            let mut by_glyph: BTreeMap<&str, Group<'_>> = BTreeMap::new();
            for &rule in rules {
                if let Some([glyph]) = rule.pattern() {
                    by_glyph.entry(glyph.as_str()).or_default().push(rule);
                }
            }
            for (glyph, group) in &by_glyph {
                doc.push(single_glyph_subtable(side, glyph, group));
            }
        } else {
            doc.push(chain_subtable(side, rules)?);
        }
    }
    Ok(())
}

/// One context glyph next to any number of targets.
fn single_glyph_subtable(side: Side, glyph: &str, rules: &[&ExpandedContextualRule]) -> Subtable {
    let description = format!("{} {glyph}", side.name());
    let subst = first_wins(pairs_of(rules), &description);
    let targets: Vec<String> = subst.iter().map(|(t, _)| t.clone()).collect();
    let context = [glyph.to_owned()];
    let partition = OverlapPartition::new(&targets, &context);

    let mut table = StateTable::new();
    table.add_class(CONTEXT, &partition.context_only);
    table.add_class(TARGET, &partition.target_only);
    table.add_class(BOTH, &partition.both);

    match side {
        Side::After => {
            table.state(SAW_CONTEXT);
            table.on(START_STATE, CONTEXT, SAW_CONTEXT);
            table.on(START_STATE, BOTH, SAW_CONTEXT);
            table.on(SAW_CONTEXT, CONTEXT, SAW_CONTEXT);
            table.on(SAW_CONTEXT, TARGET, DO_SUBSTITUTION);
            table.on(SAW_CONTEXT, BOTH, DO_SUBSTITUTION_BOTH);

            table.transition(SAW_CONTEXT, SAW_CONTEXT, vec![]);
            table.transition(
                DO_SUBSTITUTION,
                START_STATE,
                vec![Action::SubstituteCurrent(SUBST.to_owned())],
            );
            if partition.has_overlap() {
                table.transition(
                    DO_SUBSTITUTION_BOTH,
                    SAW_CONTEXT,
                    vec![Action::SubstituteCurrent(SUBST.to_owned())],
                );
            }
        }
        Side::Before => {
            // the target is marked and only rewritten once the context shows up
            table.state(SAW_TARGET);
            table.on(START_STATE, TARGET, MARK_TARGET);
            table.on(START_STATE, BOTH, MARK_TARGET_BOTH);
            table.on(SAW_TARGET, TARGET, MARK_TARGET);
            table.on(SAW_TARGET, CONTEXT, DO_SUBSTITUTION);
            table.on(SAW_TARGET, BOTH, DO_SUBSTITUTION_BOTH);

            table.transition(MARK_TARGET, SAW_TARGET, vec![Action::MarkGlyph]);
            table.transition(
                DO_SUBSTITUTION,
                START_STATE,
                vec![Action::SubstituteMarked(SUBST.to_owned())],
            );
            if partition.has_overlap() {
                table.transition(MARK_TARGET_BOTH, SAW_TARGET, vec![Action::MarkGlyph]);
                table.transition(
                    DO_SUBSTITUTION_BOTH,
                    SAW_TARGET,
                    vec![
                        Action::SubstituteMarked(SUBST.to_owned()),
                        Action::MarkGlyph,
                    ],
                );
            }
        }
    }

    table.substitution(SUBST, subst);
    Subtable::new(description, SubtableBody::Contextual(table))
}

/// Contexts of two or more glyphs, matched position by position.
fn chain_subtable(side: Side, rules: &[&ExpandedContextualRule]) -> Result<Subtable, GenerateError> {
    let len = rules
        .first()
        .and_then(|r| r.pattern())
        .map_or(0, <[String]>::len);
    if len < 2 {
        return Err(GenerateError::failed(format!(
            "multi-position {} subtable needs at least 2 context glyphs, sampled rule has {len}",
            side.name()
        )));
    }

    let description = format!("{}, {len}-glyph context", side.name());
    let subst = first_wins(pairs_of(rules), &description);

    let mut table = StateTable::new();
    let contexts: Vec<String> = (1..=len).map(|i| format!("{CONTEXT}{i}")).collect();
    for (i, name) in contexts.iter().enumerate() {
        table.add_class(
            name,
            rules.iter().filter_map(|r| r.pattern()).filter_map(|p| p.get(i)),
        );
    }
    table.add_class(TARGET, subst.iter().map(|(t, _)| t));

    match side {
        Side::After => {
            let saw: Vec<String> = (1..=len).map(|i| format!("{SAW_CONTEXT}{i}")).collect();
            for state in &saw {
                table.state(state);
            }
            table.on(START_STATE, &contexts[0], &saw[0]);
            for i in 0..len {
                if i + 1 < len {
                    table.on(&saw[i], &contexts[i + 1], &saw[i + 1]);
                } else {
                    table.on(&saw[i], TARGET, DO_SUBSTITUTION);
                }
                table.on(&saw[i], &contexts[i], &saw[i]);
                table.on(&saw[i], &contexts[0], &saw[0]);
            }
            for state in &saw {
                table.transition(state, state, vec![]);
            }
            table.transition(
                DO_SUBSTITUTION,
                START_STATE,
                vec![Action::SubstituteCurrent(SUBST.to_owned())],
            );
        }
        Side::Before => {
            let saw: Vec<String> = (1..len).map(|i| format!("{SAW_CONTEXT}{i}")).collect();
            table.state(SAW_TARGET);
            for state in &saw {
                table.state(state);
            }
            table.on(START_STATE, TARGET, MARK_TARGET);

            // `waiting[i]` has matched the target and i context glyphs
            let waiting: Vec<&str> = std::iter::once(SAW_TARGET)
                .chain(saw.iter().map(String::as_str))
                .collect();
            for (i, state) in waiting.iter().enumerate() {
                let next = if i + 1 < len { saw[i].as_str() } else { DO_SUBSTITUTION };
                table.on(state, &contexts[i], next);
                if i > 0 {
                    table.on(state, &contexts[i - 1], state);
                }
                table.on(state, TARGET, MARK_TARGET);
            }

            table.transition(MARK_TARGET, SAW_TARGET, vec![Action::MarkGlyph]);
            for state in &saw {
                table.transition(state, state, vec![]);
            }
            table.transition(
                DO_SUBSTITUTION,
                START_STATE,
                vec![Action::SubstituteMarked(SUBST.to_owned())],
            );
        }
    }

    table.substitution(SUBST, subst);
    Ok(Subtable::new(description, SubtableBody::Contextual(table)))
}

/// `between` classes by role: (name, first context, second context, target).
const BETWEEN_CLASSES: [(&str, bool, bool, bool); 7] = [
    (FIRST, true, false, false),
    (SECOND, false, true, false),
    (FIRST_AND_SECOND, true, true, false),
    (TARGET, false, false, true),
    (TARGET_AND_FIRST, true, false, true),
    (TARGET_AND_SECOND, false, true, true),
    (TARGET_AND_BOTH, true, true, true),
];

/// `between` states: (name, last glyph was a first context, a target is marked).
const BETWEEN_STATES: [(&str, bool, bool); 4] = [
    (START_STATE, false, false),
    (SAW_FIRST, true, false),
    (SAW_TARGET, false, true),
    (SAW_TARGET_FIRST, true, true),
];

/// Transition and next state for one `between` step, or `None` for a plain
/// return to `Start`.
///
/// `commit` rewrites the marked target, `mark` marks the current glyph and
/// `first` records that the current glyph may open the next match.
fn between_step(commit: bool, mark: bool, first: bool) -> Option<(&'static str, &'static str)> {
    match (commit, mark, first) {
        (false, false, false) => None,
        (false, false, true) => Some((SAW_FIRST, SAW_FIRST)),
        (false, true, false) => Some((MARK_TARGET, SAW_TARGET)),
        (false, true, true) => Some((MARK_TARGET_FIRST, SAW_TARGET_FIRST)),
        (true, false, false) => Some((DO_SUBSTITUTION, START_STATE)),
        (true, false, true) => Some((DO_SUBSTITUTION_FIRST, SAW_FIRST)),
        (true, true, false) => Some((DO_SUBSTITUTION_BOTH, SAW_TARGET)),
        (true, true, true) => Some((DO_SUBSTITUTION_BOTH_FIRST, SAW_TARGET_FIRST)),
    }
}

/// All single-glyph `between` rules in one table.
///
/// Every glyph gets the class of its exact role set, so a glyph that is a
/// target and a first context never confirms a match the way a second
/// context does. A step commits the marked target when the current glyph
/// is a second context, and marks the current glyph when it is a target
/// that follows a first context.
fn between_subtable(rules: &[&ExpandedContextualRule]) -> Subtable {
    let description = "between".to_owned();
    let subst = first_wins(pairs_of(rules), &description);

    let mut first = BTreeSet::new();
    let mut second = BTreeSet::new();
    for rule in rules {
        if let ExpandedContext::Between { first: f, second: s } = &rule.context {
            first.extend(f.iter().cloned());
            second.extend(s.iter().cloned());
        }
    }
    let targets: Vec<String> = subst.iter().map(|(t, _)| t.clone()).collect();
    let partition = OverlapPartition::new(&targets, first.union(&second));

    let roles =
        |glyph: &String, target: bool| (first.contains(glyph), second.contains(glyph), target);
    let members: Vec<((bool, bool, bool), &String)> = partition
        .context_only
        .iter()
        .map(|g| (roles(g, false), g))
        .chain(partition.target_only.iter().map(|g| (roles(g, true), g)))
        .chain(partition.both.iter().map(|g| (roles(g, true), g)))
        .collect();

    let mut table = StateTable::new();
    for &(name, f, s, t) in &BETWEEN_CLASSES {
        table.add_class(
            name,
            members
                .iter()
                .filter(|(role, _)| *role == (f, s, t))
                .map(|(_, g)| g.as_str()),
        );
    }
    let classes: Vec<(&str, bool, bool, bool)> = BETWEEN_CLASSES
        .iter()
        .copied()
        .filter(|(name, ..)| table.has_class(name))
        .collect();
    let step = |saw_first: bool, marked: bool, (f, s, t): (bool, bool, bool)| {
        between_step(marked && s, saw_first && t, f)
    };

    let mut reachable = BTreeSet::from([START_STATE]);
    loop {
        let known = reachable.len();
        for &(state, saw_first, marked) in &BETWEEN_STATES {
            if reachable.contains(state) {
                reachable.extend(
                    classes
                        .iter()
                        .filter_map(|&(_, f, s, t)| step(saw_first, marked, (f, s, t)))
                        .map(|(_, next)| next),
                );
            }
        }
        if reachable.len() == known {
            break;
        }
    }

    for &(state, saw_first, marked) in &BETWEEN_STATES {
        if !reachable.contains(state) {
            continue;
        }
        table.state(state);
        for &(class, f, s, t) in &classes {
            let Some((transition, next)) = step(saw_first, marked, (f, s, t)) else {
                continue;
            };
            let mut actions = Vec::new();
            if marked && s {
                actions.push(Action::SubstituteMarked(SUBST.to_owned()));
            }
            if saw_first && t {
                actions.push(Action::MarkGlyph);
            }
            table.on(state, class, transition);
            table.transition(transition, next, actions);
        }
    }

    table.substitution(SUBST, subst);
    Subtable::new(description, SubtableBody::Contextual(table))
}

/// `between` rules whose sides span several glyphs, matched position by
/// position like the multi-glyph `after` and `before` chains.
///
/// Position classes must be disjoint, since a glyph shared by two positions
/// would need the overlap states of the single-glyph table at every step.
fn between_chain_subtable(
    (first_len, second_len): (usize, usize),
    rules: &[&ExpandedContextualRule],
) -> Result<Subtable, GenerateError> {
    let line = rules.first().map_or(0, |r| r.source_line);
    if first_len == 0 || second_len == 0 {
        return Err(GenerateError::failed(format!(
            "between rule at line {line} needs at least one glyph on each side"
        )));
    }

    let description = format!("between, {first_len}+{second_len}-glyph context");
    let subst = first_wins(pairs_of(rules), &description);

    let firsts: Vec<String> = (1..=first_len).map(|i| format!("{FIRST}{i}")).collect();
    let seconds: Vec<String> = (1..=second_len).map(|i| format!("{SECOND}{i}")).collect();
    let mut positions: Vec<(&str, BTreeSet<&str>)> = Vec::new();
    for (i, name) in firsts.iter().enumerate() {
        positions.push((name, BTreeSet::new()));
        for rule in rules {
            if let ExpandedContext::Between { first, .. } = &rule.context {
                positions[i].1.extend(first.get(i).map(String::as_str));
            }
        }
    }
    positions.push((TARGET, subst.iter().map(|(t, _)| t.as_str()).collect()));
    for (i, name) in seconds.iter().enumerate() {
        let mut glyphs = BTreeSet::new();
        for rule in rules {
            if let ExpandedContext::Between { second, .. } = &rule.context {
                glyphs.extend(second.get(i).map(String::as_str));
            }
        }
        positions.push((name.as_str(), glyphs));
    }

    let mut owner: BTreeMap<&str, &str> = BTreeMap::new();
    for (name, glyphs) in &positions {
        for glyph in glyphs {
            if let Some(other) = owner.insert(*glyph, *name) {
                return Err(GenerateError::failed(format!(
                    "between rule at line {line}: glyph '{glyph}' appears in both {other} \
                     and {name} of a multi-glyph between context"
                )));
            }
        }
    }

    let mut table = StateTable::new();
    for (name, glyphs) in &positions {
        table.add_class(name, glyphs.iter().copied());
    }

    // one state per matched prefix; the target state holds the mark
    let saw_firsts: Vec<String> = (1..=first_len).map(|i| format!("{SAW_FIRST}{i}")).collect();
    let saw_seconds: Vec<String> = (1..second_len).map(|i| format!("SawSecond{i}")).collect();
    let mut waiting: Vec<&str> = saw_firsts.iter().map(String::as_str).collect();
    waiting.push(SAW_TARGET);
    waiting.extend(saw_seconds.iter().map(String::as_str));
    for state in &waiting {
        table.state(state);
    }

    table.on(START_STATE, &firsts[0], &saw_firsts[0]);
    for (k, state) in waiting.iter().enumerate() {
        let (class, next) = if k + 1 < first_len {
            (firsts[k + 1].as_str(), saw_firsts[k + 1].as_str())
        } else if k + 1 == first_len {
            (TARGET, MARK_TARGET)
        } else {
            let j = k - first_len;
            let next = if j + 1 < second_len {
                saw_seconds[j].as_str()
            } else {
                DO_SUBSTITUTION
            };
            (seconds[j].as_str(), next)
        };
        table.on(state, class, next);
        table.on(state, &firsts[0], &saw_firsts[0]);
    }

    for state in saw_firsts.iter().chain(&saw_seconds) {
        table.transition(state, state, vec![]);
    }
    table.transition(MARK_TARGET, SAW_TARGET, vec![Action::MarkGlyph]);
    table.transition(
        DO_SUBSTITUTION,
        START_STATE,
        vec![Action::SubstituteMarked(SUBST.to_owned())],
    );

    table.substitution(SUBST, subst);
    Ok(Subtable::new(description, SubtableBody::Contextual(table)))
}

/// Pattern length and target position of a single-pass `when` rule.
fn when_shape(rule: &ExpandedContextualRule) -> Result<(usize, usize), GenerateError> {
    let line = rule.source_line;
    let pattern = rule.pattern().unwrap_or_default();
    if pattern.len() < 2 {
        return Err(GenerateError::failed(format!(
            "when rule at line {line} needs a pattern of at least 2 glyphs"
        )));
    }
    let target = rule
        .substitutions
        .first()
        .map(|(t, _)| t.as_str())
        .unwrap_or_default();
    let position = pattern.iter().position(|g| g == target).ok_or_else(|| {
        GenerateError::failed(format!(
            "when rule at line {line}: target '{target}' is not in its pattern"
        ))
    })?;
    Ok((pattern.len(), position))
}

fn position_class(k: usize) -> String {
    format!("Position{}", k + 1)
}

fn matched_state(k: usize) -> String {
    format!("Matched{k}")
}

/// Single-pass `when` rules sharing one pattern shape.
fn when_subtable(rules: &[&ExpandedContextualRule]) -> Result<Subtable, GenerateError> {
    let mut shape = None;
    for rule in rules {
        let current = when_shape(rule)?;
        match shape {
            None => shape = Some(current),
            Some(expected) if expected != current => {
                return Err(GenerateError::failed(format!(
                    "single-pass when rules must share pattern length and target position \
                     (line {} has {current:?}, expected {expected:?})",
                    rule.source_line
                )));
            }
            Some(_) => {}
        }
    }
    let Some((len, target)) = shape else {
        return Err(GenerateError::failed("empty when group"));
    };

    let description = format!("when, {len}-glyph pattern");
    let subst = first_wins(pairs_of(rules), &description);

    let mut table = StateTable::new();
    for k in 0..len {
        table.add_class(
            &position_class(k),
            rules.iter().filter_map(|r| r.pattern()).filter_map(|p| p.get(k)),
        );
    }

    let step = |k: usize| -> String {
        if k + 1 == len {
            DO_SUBSTITUTION.to_owned()
        } else if k == target {
            MARK_TARGET.to_owned()
        } else {
            matched_state(k + 1)
        }
    };

    for matched in 1..len {
        table.state(&matched_state(matched));
    }
    table.on(START_STATE, &position_class(0), &step(0));
    for matched in 1..len {
        let state = matched_state(matched);
        table.on(&state, &position_class(matched), &step(matched));
        table.on(&state, &position_class(0), &step(0));
    }

    for k in 0..len - 1 {
        let actions = if k == target {
            vec![Action::MarkGlyph]
        } else {
            vec![]
        };
        table.transition(&step(k), &matched_state(k + 1), actions);
    }
    let commit = if target + 1 == len {
        Action::SubstituteCurrent(SUBST.to_owned())
    } else {
        Action::SubstituteMarked(SUBST.to_owned())
    };
    table.transition(DO_SUBSTITUTION, START_STATE, vec![commit]);

    table.substitution(SUBST, subst);
    Ok(Subtable::new(description, SubtableBody::Contextual(table)))
}

fn cleanup_subtable(description: String, rules: &[&ExpandedContextualRule]) -> Subtable {
    let entries = first_wins(pairs_of(rules), &description)
        .into_iter()
        .map(|(temp, original)| (temp, Replacement::Glyph(original)))
        .collect();
    Subtable::new(description, SubtableBody::Noncontextual(entries))
}

/// Marking, substitution and cleanup subtables for one multi-pass rule.
///
/// The marking pass rewrites every target but the last to a temporary
/// glyph once the whole pattern matched up to it. The substitution pass
/// maps temporaries and the last target to their replacements, and the
/// cleanup pass deletes any temporary left over.
fn multi_pass_triple(
    rule: &ExpandedContextualRule,
    ordinal: usize,
    arena: &mut TempGlyphArena,
) -> Result<[Subtable; 3], GenerateError> {
    let line = rule.source_line;
    let ExpandedContext::When(pattern) = &rule.context else {
        return Err(GenerateError::failed(format!(
            "multi-pass rule at line {line} must use a when context, found {}",
            rule.context.kind()
        )));
    };
    let Some(((last_target, last_replacement), marked)) = rule.substitutions.split_last() else {
        return Err(GenerateError::failed(format!(
            "multi-pass rule at line {line} has no substitutions"
        )));
    };

    let mut temps = Vec::with_capacity(marked.len());
    let mut marked_positions = BTreeSet::new();
    for (slot, (target, replacement)) in marked.iter().enumerate() {
        let position = pattern
            .iter()
            .enumerate()
            .position(|(k, g)| g == target && !marked_positions.contains(&k))
            .ok_or_else(|| {
                GenerateError::failed(format!(
                    "multi-pass rule at line {line}: target '{target}' is not in its pattern"
                ))
            })?;
        marked_positions.insert(position);
        let temp = arena
            .allocate(TempPurpose::MultiPass, line, ordinal, slot)?
            .to_string();
        temps.push((target.as_str(), replacement.as_str(), temp));
    }

    // A: marking
    let mut table = StateTable::new();
    let mut classes = Vec::with_capacity(pattern.len());
    for (k, glyph) in pattern.iter().enumerate() {
        let first = pattern.iter().position(|g| g == glyph).unwrap_or(k);
        let name = position_class(first);
        if first == k {
            table.add_class(&name, [glyph.as_str()]);
        }
        classes.push(name);
    }
    let len = pattern.len();
    let step = |k: usize| -> String {
        if k + 1 == len {
            "Complete".to_owned()
        } else if marked_positions.contains(&k) {
            format!("MarkTemp{}", k + 1)
        } else {
            matched_state(k + 1)
        }
    };
    for matched in 1..len {
        table.state(&matched_state(matched));
    }
    table.on(START_STATE, &classes[0], &step(0));
    for matched in 1..len {
        let state = matched_state(matched);
        table.on(&state, &classes[matched], &step(matched));
        table.on(&state, &classes[0], &step(0));
    }
    for k in 0..len {
        let next = if k + 1 == len {
            START_STATE.to_owned()
        } else {
            matched_state(k + 1)
        };
        let actions = if marked_positions.contains(&k) {
            vec![Action::SubstituteCurrent(MARK_TEMPS.to_owned())]
        } else {
            vec![]
        };
        table.transition(&step(k), &next, actions);
    }
    let description = format!("multi-pass marking, line {line}");
    table.substitution(
        MARK_TEMPS,
        first_wins(
            temps.iter().map(|(target, _, temp)| (*target, temp.as_str())),
            &description,
        ),
    );
    let marking = Subtable::new(description, SubtableBody::Contextual(table));

    // B: final substitution
    let mut finals: Vec<(String, Replacement)> = temps
        .iter()
        .map(|(_, replacement, temp)| (temp.clone(), Replacement::Glyph((*replacement).to_owned())))
        .collect();
    finals.push((last_target.clone(), Replacement::Glyph(last_replacement.clone())));
    let substitution = Subtable::new(
        format!("multi-pass substitution, line {line}"),
        SubtableBody::Noncontextual(finals),
    );

    // C: cleanup
    let cleanup = Subtable::new(
        format!("multi-pass cleanup, line {line}"),
        SubtableBody::Noncontextual(
            temps
                .into_iter()
                .map(|(_, _, temp)| (temp, Replacement::Delete))
                .collect(),
        ),
    );

    Ok([marking, substitution, cleanup])
}
