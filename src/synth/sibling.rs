//! Noncontextual, ligature and insertion subtables.

use std::collections::HashSet;

use crate::atif::Document;
use crate::expand::{expand_ligature, expand_one_to_many, expand_simple};
use crate::types::{
    GenerateError, GeneratorConfig, GlyphClass, GlyphClassRegistry, LigatureRule, OneToManyRule,
    Replacement, SimpleRule, Subtable, SubtableBody,
};

use super::first_wins;

/// Emit all one-to-one substitutions as a single noncontextual subtable.
///
/// # Errors
///
/// Returns [`GenerateError::InvalidRule`] for undefined classes or sides
/// of different sizes.
pub fn generate_simple(
    rules: &[SimpleRule],
    classes: &[GlyphClass],
    config: &GeneratorConfig,
) -> Result<String, GenerateError> {
    let registry = GlyphClassRegistry::from_classes(classes)?;
    let mut doc = Document::new(config);
    emit_simple(&mut doc, rules, &registry)?;
    Ok(doc.render())
}

/// Emit all ligatures as a single ligature subtable.
///
/// # Errors
///
/// Returns [`GenerateError::InvalidRule`] for undefined classes or
/// class-valued positions of different sizes.
pub fn generate_ligature(
    rules: &[LigatureRule],
    classes: &[GlyphClass],
    config: &GeneratorConfig,
) -> Result<String, GenerateError> {
    let registry = GlyphClassRegistry::from_classes(classes)?;
    let mut doc = Document::new(config);
    emit_ligature(&mut doc, rules, &registry)?;
    Ok(doc.render())
}

/// Emit all one-to-many decompositions as a single insertion subtable.
///
/// # Errors
///
/// Returns [`GenerateError::InvalidRule`] for undefined classes or
/// class-valued positions of different sizes.
pub fn generate_one_to_many(
    rules: &[OneToManyRule],
    classes: &[GlyphClass],
    config: &GeneratorConfig,
) -> Result<String, GenerateError> {
    let registry = GlyphClassRegistry::from_classes(classes)?;
    let mut doc = Document::new(config);
    emit_one_to_many(&mut doc, rules, &registry)?;
    Ok(doc.render())
}

pub(crate) fn emit_simple(
    doc: &mut Document,
    rules: &[SimpleRule],
    registry: &GlyphClassRegistry,
) -> Result<(), GenerateError> {
    let mut pairs = Vec::new();
    for rule in rules {
        pairs.extend(expand_simple(rule, registry)?);
    }
    let entries = first_wins(
        pairs.iter().map(|(t, r)| (t.as_str(), r.as_str())),
        "simple substitutions",
    )
    .into_iter()
    .map(|(target, replacement)| (target, Replacement::Glyph(replacement)))
    .collect();
    doc.push(Subtable::new(
        "simple substitutions",
        SubtableBody::Noncontextual(entries),
    ));
    Ok(())
}

pub(crate) fn emit_ligature(
    doc: &mut Document,
    rules: &[LigatureRule],
    registry: &GlyphClassRegistry,
) -> Result<(), GenerateError> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for rule in rules {
        for (ligature, components) in expand_ligature(rule, registry)? {
            if seen.insert(components.clone()) {
                entries.push((ligature, components));
            } else {
                log::warn!(
                    "ligature {ligature}: components {} already form a ligature",
                    components.join(" + ")
                );
            }
        }
    }
    doc.push(Subtable::new("ligatures", SubtableBody::Ligature(entries)));
    Ok(())
}

pub(crate) fn emit_one_to_many(
    doc: &mut Document,
    rules: &[OneToManyRule],
    registry: &GlyphClassRegistry,
) -> Result<(), GenerateError> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for rule in rules {
        for (source, targets) in expand_one_to_many(rule, registry)? {
            if seen.insert(source.clone()) {
                entries.push((source, targets));
            } else {
                log::warn!("one-to-many: '{source}' already decomposes, dropping a later rule");
            }
        }
    }
    doc.push(Subtable::new("one-to-many", SubtableBody::Insertion(entries)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{class, glyph};

    fn config() -> GeneratorConfig {
        GeneratorConfig::new("Test", 0)
    }

    #[test]
    fn simple_first_occurrence_wins() {
        let rules = [
            SimpleRule {
                target: glyph("a"),
                replacement: glyph("a.alt"),
                source_line: 1,
            },
            SimpleRule {
                target: glyph("a"),
                replacement: glyph("a.other"),
                source_line: 2,
            },
        ];
        let text = generate_simple(&rules, &[], &config()).unwrap();
        assert!(text.contains("a => a.alt;"));
        assert!(!text.contains("a.other"));
    }

    #[test]
    fn ligature_text() {
        let rules = [LigatureRule {
            ligature: glyph("f_i"),
            components: vec![glyph("f"), glyph("i")],
            source_line: 1,
        }];
        let text = generate_ligature(&rules, &[], &config()).unwrap();
        assert!(text.contains("ligature {"));
        assert!(text.contains("f_i := f + i;"));
    }

    #[test]
    fn one_to_many_with_class() {
        let classes = [
            GlyphClass::new("lig", ["f_i", "f_l"]),
            GlyphClass::new("tail", ["i", "l"]),
        ];
        let rules = [OneToManyRule {
            source: class("lig"),
            targets: vec![glyph("f"), class("tail")],
            source_line: 1,
        }];
        let text = generate_one_to_many(&rules, &classes, &config()).unwrap();
        assert!(text.contains("insertion {"));
        assert!(text.contains("f_l > f l;"));
    }
}
