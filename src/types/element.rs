use std::fmt;

/// One position of a rule: either a literal glyph name or a reference to a
/// named glyph class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleElement {
    Glyph(String),
    Class(String),
}

impl RuleElement {
    #[must_use]
    pub fn is_class(&self) -> bool {
        matches!(self, RuleElement::Class(_))
    }

    /// The glyph or class name, without the `@` sigil.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            RuleElement::Glyph(name) | RuleElement::Class(name) => name,
        }
    }
}

impl fmt::Display for RuleElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleElement::Glyph(name) => write!(f, "{name}"),
            RuleElement::Class(name) => write!(f, "@{name}"),
        }
    }
}

/// A literal glyph element.
#[must_use]
pub fn glyph(name: &str) -> RuleElement {
    RuleElement::Glyph(name.to_owned())
}

/// A glyph class reference element. The name is given without `@`.
#[must_use]
pub fn class(name: &str) -> RuleElement {
    RuleElement::Class(name.to_owned())
}

pub(crate) fn join_elements(elements: &[RuleElement]) -> String {
    elements
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
