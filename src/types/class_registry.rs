use std::collections::HashMap;

use super::element::RuleElement;
use super::error::GenerateError;

/// A named, ordered list of glyph names.
///
/// The order is significant: lock-step expansion pairs the i-th glyph of one
/// class with the i-th glyph of another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphClass {
    pub name: String,
    pub glyphs: Vec<String>,
}

impl GlyphClass {
    pub fn new<I, S>(name: &str, glyphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_owned(),
            glyphs: glyphs.into_iter().map(Into::into).collect(),
        }
    }
}

/// Maps class names to their glyph lists.
///
/// Built once per generation run. Names are write-once: registering a name a
/// second time fails, and there is no removal.
#[derive(Debug, Clone, Default)]
pub struct GlyphClassRegistry {
    classes: HashMap<String, GlyphClass>,
}

impl GlyphClassRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a class list, failing on the first duplicate.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::InvalidRule`] for a duplicate or empty class.
    pub fn from_classes(classes: &[GlyphClass]) -> Result<Self, GenerateError> {
        let mut registry = Self::new();
        for class in classes {
            registry.register(class.clone())?;
        }
        Ok(registry)
    }

    /// Register a class.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::InvalidRule`] if the name is already taken or
    /// the class has no glyphs.
    pub fn register(&mut self, class: GlyphClass) -> Result<(), GenerateError> {
        if self.classes.contains_key(&class.name) {
            return Err(GenerateError::duplicate_class(&class.name));
        }
        if class.glyphs.is_empty() {
            return Err(GenerateError::InvalidRule {
                line: None,
                message: format!("class '@{}' has no glyphs", class.name),
            });
        }
        self.classes.insert(class.name.clone(), class);
        Ok(())
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&GlyphClass> {
        self.classes.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Resolve an element to its concrete glyph list.
    ///
    /// A literal glyph resolves to itself; a class reference resolves to the
    /// class members in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::InvalidRule`] if the element names an
    /// undefined class.
    pub fn resolve(&self, element: &RuleElement, line: usize) -> Result<Vec<String>, GenerateError> {
        match element {
            RuleElement::Glyph(name) => Ok(vec![name.clone()]),
            RuleElement::Class(name) => self
                .lookup(name)
                .map(|class| class.glyphs.clone())
                .ok_or_else(|| GenerateError::undefined_class(name, line)),
        }
    }

    /// Resolve every element of a pattern, preserving position order.
    ///
    /// # Errors
    ///
    /// Fails on the first undefined class reference.
    pub fn resolve_all(
        &self,
        elements: &[RuleElement],
        line: usize,
    ) -> Result<Vec<Vec<String>>, GenerateError> {
        elements.iter().map(|e| self.resolve(e, line)).collect()
    }
}
