use std::fmt;

use super::element::{join_elements, RuleElement};

/// The trigger shape of a contextual rule, before class expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextType {
    /// The target follows the pattern.
    After(Vec<RuleElement>),
    /// The target precedes the pattern.
    Before(Vec<RuleElement>),
    /// The target sits between `first` and `second`.
    Between {
        first: Vec<RuleElement>,
        second: Vec<RuleElement>,
    },
    /// The pattern includes the targets themselves.
    When(Vec<RuleElement>),
}

impl ContextType {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ContextType::After(_) => "after",
            ContextType::Before(_) => "before",
            ContextType::Between { .. } => "between",
            ContextType::When(_) => "when",
        }
    }
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextType::After(p) | ContextType::Before(p) | ContextType::When(p) => {
                write!(f, "{} {}", self.kind(), join_elements(p))
            }
            ContextType::Between { first, second } => write!(
                f,
                "between {} and {}",
                join_elements(first),
                join_elements(second)
            ),
        }
    }
}

/// Suffix edit requested by a wildcard substitution.
///
/// Carried as data only; expansion and synthesis do not interpret it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WildcardType {
    AppendSuffix(String),
    RemoveSuffix(String),
}

/// One `target => replacement` pair of a contextual rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionPair {
    pub target: RuleElement,
    pub replacement: RuleElement,
    pub wildcard: Option<WildcardType>,
}

impl fmt::Display for SubstitutionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.target, self.replacement)
    }
}

/// Build a substitution pair without a wildcard directive.
#[must_use]
pub fn pair(target: RuleElement, replacement: RuleElement) -> SubstitutionPair {
    SubstitutionPair {
        target,
        replacement,
        wildcard: None,
    }
}

/// A source-level contextual substitution rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextualRule {
    pub context: ContextType,
    pub substitutions: Vec<SubstitutionPair>,
    pub source_line: usize,
}

impl ContextualRule {
    #[must_use]
    pub fn new(context: ContextType, substitutions: Vec<SubstitutionPair>, source_line: usize) -> Self {
        Self {
            context,
            substitutions,
            source_line,
        }
    }
}

impl fmt::Display for ContextualRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self.substitutions.iter().map(ToString::to_string).collect();
        write!(f, "{}: {}", self.context, pairs.join(", "))
    }
}

/// A source-level reordering rule: `before => after`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderRule {
    pub before: Vec<RuleElement>,
    pub after: Vec<RuleElement>,
    pub source_line: usize,
}

impl fmt::Display for ReorderRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} => {}",
            join_elements(&self.before),
            join_elements(&self.after)
        )
    }
}

/// A one-to-one substitution: `target -> replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleRule {
    pub target: RuleElement,
    pub replacement: RuleElement,
    pub source_line: usize,
}

/// A ligature: `ligature := c1 + c2 + ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LigatureRule {
    pub ligature: RuleElement,
    pub components: Vec<RuleElement>,
    pub source_line: usize,
}

/// A one-to-many decomposition: `source > t1 t2 ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneToManyRule {
    pub source: RuleElement,
    pub targets: Vec<RuleElement>,
    pub source_line: usize,
}
