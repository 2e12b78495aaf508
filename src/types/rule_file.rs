use std::fmt;
use std::path::Path;

use super::class_registry::{GlyphClass, GlyphClassRegistry};
use super::config::GeneratorConfig;
use super::element::RuleElement;
use super::error::GenerateError;
use super::rule::{
    ContextType, ContextualRule, LigatureRule, OneToManyRule, ReorderRule, SimpleRule,
    SubstitutionPair,
};
use super::subtable::DELETED_GLYPH;
use super::temp_glyph::TempGlyphArena;
use crate::atif::Document;
use crate::error::Ot2AatError;

/// Longest glyph name accepted in a rule file, in bytes.
pub const MAX_GLYPH_NAME_LEN: usize = 63;

/// Builder for constructing a [`RuleFile`] in code.
///
/// Rules receive consecutive line numbers starting at 1, in the order they
/// are added, so diagnostics still point at a rule.
///
/// # Example
///
/// ```
/// use ot2aat::{class, glyph, pair, ContextType, GeneratorConfig, RuleFileBuilder};
///
/// let file = RuleFileBuilder::new()
///     .class("ctx", ["c1", "c2"])
///     .contextual(
///         ContextType::After(vec![class("ctx")]),
///         vec![pair(glyph("t"), glyph("t.alt"))],
///     )
///     .build();
/// let text = file.generate(&GeneratorConfig::new("Alternates", 1)).unwrap();
/// assert!(text.contains("// Subtable 1: after c2"));
/// ```
#[derive(Debug, Default)]
pub struct RuleFileBuilder {
    file: RuleFile,
    line: usize,
}

impl RuleFileBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_line(&mut self) -> usize {
        self.line += 1;
        self.line
    }

    /// Define a glyph class.
    #[must_use]
    pub fn class<I, S>(mut self, name: &str, glyphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file.classes.push(GlyphClass::new(name, glyphs));
        self
    }

    #[must_use]
    pub fn contextual(mut self, context: ContextType, substitutions: Vec<SubstitutionPair>) -> Self {
        let line = self.next_line();
        self.file
            .contextual
            .push(ContextualRule::new(context, substitutions, line));
        self
    }

    #[must_use]
    pub fn reorder(mut self, before: Vec<RuleElement>, after: Vec<RuleElement>) -> Self {
        let source_line = self.next_line();
        self.file.reorder.push(ReorderRule {
            before,
            after,
            source_line,
        });
        self
    }

    #[must_use]
    pub fn simple(mut self, target: RuleElement, replacement: RuleElement) -> Self {
        let source_line = self.next_line();
        self.file.simple.push(SimpleRule {
            target,
            replacement,
            source_line,
        });
        self
    }

    #[must_use]
    pub fn ligature(mut self, ligature: RuleElement, components: Vec<RuleElement>) -> Self {
        let source_line = self.next_line();
        self.file.ligature.push(LigatureRule {
            ligature,
            components,
            source_line,
        });
        self
    }

    #[must_use]
    pub fn one_to_many(mut self, source: RuleElement, targets: Vec<RuleElement>) -> Self {
        let source_line = self.next_line();
        self.file.one_to_many.push(OneToManyRule {
            source,
            targets,
            source_line,
        });
        self
    }

    #[must_use]
    pub fn build(self) -> RuleFile {
        self.file
    }
}

/// Everything one rule file defines: glyph classes plus a rule list per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFile {
    pub classes: Vec<GlyphClass>,
    pub contextual: Vec<ContextualRule>,
    pub reorder: Vec<ReorderRule>,
    pub simple: Vec<SimpleRule>,
    pub ligature: Vec<LigatureRule>,
    pub one_to_many: Vec<OneToManyRule>,
}

impl RuleFile {
    /// Parse rule-file text and check every glyph name.
    ///
    /// # Errors
    ///
    /// Returns [`Ot2AatError::Parse`] on syntax errors and
    /// [`Ot2AatError::InvalidGlyphName`] for unusable glyph names.
    pub fn from_source(input: &str) -> Result<Self, Ot2AatError> {
        let file = crate::parse::parse(input)?;
        file.validate_glyph_names()?;
        log::debug!("parsed {file}");
        Ok(file)
    }

    /// Read and parse a rule file.
    ///
    /// # Errors
    ///
    /// Returns [`Ot2AatError::FileNotFound`] if `path` does not exist, and
    /// otherwise the errors of [`from_source`](Self::from_source).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Ot2AatError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Ot2AatError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => Ot2AatError::Io(e),
        })?;
        Self::from_source(&input)
    }

    /// Check that every glyph name fits in [`MAX_GLYPH_NAME_LEN`] bytes and
    /// is not the reserved deletion glyph.
    ///
    /// # Errors
    ///
    /// Returns [`Ot2AatError::InvalidGlyphName`] for the first offending name.
    pub fn validate_glyph_names(&self) -> Result<(), Ot2AatError> {
        for class in &self.classes {
            for name in &class.glyphs {
                check_glyph_name(name, None)?;
            }
        }
        for (element, line) in self.elements() {
            if let RuleElement::Glyph(name) = element {
                check_glyph_name(name, Some(line))?;
            }
        }
        Ok(())
    }

    /// Every rule element with the line of the rule it belongs to.
    fn elements(&self) -> impl Iterator<Item = (&RuleElement, usize)> + '_ {
        let contextual = self.contextual.iter().flat_map(|rule| {
            let context: Vec<&RuleElement> = match &rule.context {
                ContextType::After(p) | ContextType::Before(p) | ContextType::When(p) => {
                    p.iter().collect()
                }
                ContextType::Between { first, second } => first.iter().chain(second).collect(),
            };
            context
                .into_iter()
                .chain(
                    rule.substitutions
                        .iter()
                        .flat_map(|p| [&p.target, &p.replacement]),
                )
                .map(move |e| (e, rule.source_line))
        });
        let reorder = self.reorder.iter().flat_map(|rule| {
            rule.before
                .iter()
                .chain(&rule.after)
                .map(move |e| (e, rule.source_line))
        });
        let simple = self.simple.iter().flat_map(|rule| {
            [&rule.target, &rule.replacement]
                .into_iter()
                .map(move |e| (e, rule.source_line))
        });
        let ligature = self.ligature.iter().flat_map(|rule| {
            std::iter::once(&rule.ligature)
                .chain(&rule.components)
                .map(move |e| (e, rule.source_line))
        });
        let one_to_many = self.one_to_many.iter().flat_map(|rule| {
            std::iter::once(&rule.source)
                .chain(&rule.targets)
                .map(move |e| (e, rule.source_line))
        });
        contextual
            .chain(reorder)
            .chain(simple)
            .chain(ligature)
            .chain(one_to_many)
    }

    /// Build the class registry for this file.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::InvalidRule`] for duplicate or empty classes.
    pub fn registry(&self) -> Result<GlyphClassRegistry, GenerateError> {
        GlyphClassRegistry::from_classes(&self.classes)
    }

    /// Total number of rules of all kinds.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.contextual.len()
            + self.reorder.len()
            + self.simple.len()
            + self.ligature.len()
            + self.one_to_many.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rule_count() == 0
    }

    /// Run every generator that has rules and render one document.
    ///
    /// Subtables are numbered continuously across generators, which run in
    /// the order simple, ligature, one-to-many, contextual, reorder.
    ///
    /// # Errors
    ///
    /// Returns the first [`GenerateError`] raised by any generator.
    pub fn generate(&self, config: &GeneratorConfig) -> Result<String, GenerateError> {
        let registry = self.registry()?;
        let mut arena = TempGlyphArena::new(config.temp_base());
        let mut doc = Document::new(config);

        if !self.simple.is_empty() {
            crate::synth::emit_simple(&mut doc, &self.simple, &registry)?;
        }
        if !self.ligature.is_empty() {
            crate::synth::emit_ligature(&mut doc, &self.ligature, &registry)?;
        }
        if !self.one_to_many.is_empty() {
            crate::synth::emit_one_to_many(&mut doc, &self.one_to_many, &registry)?;
        }
        if !self.contextual.is_empty() {
            crate::synth::emit_contextual(&mut doc, &self.contextual, &registry, &mut arena)?;
        }
        if !self.reorder.is_empty() {
            crate::synth::emit_reorder(&mut doc, &self.reorder, &registry)?;
        }

        log::debug!(
            "generated {} subtables for {config} ({} temporary glyphs)",
            doc.len(),
            arena.len()
        );
        Ok(doc.render())
    }
}

fn check_glyph_name(name: &str, line: Option<usize>) -> Result<(), Ot2AatError> {
    if name.len() > MAX_GLYPH_NAME_LEN || name == DELETED_GLYPH {
        return Err(Ot2AatError::InvalidGlyphName {
            name: name.to_owned(),
            line,
        });
    }
    Ok(())
}

impl fmt::Display for RuleFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleFile({} classes, {} contextual, {} reorder, {} simple, {} ligature, {} one-to-many)",
            self.classes.len(),
            self.contextual.len(),
            self.reorder.len(),
            self.simple.len(),
            self.ligature.len(),
            self.one_to_many.len(),
        )
    }
}
