use std::fmt;

use super::pattern::ReorderPattern;

/// A fully explicit context: every position is a concrete glyph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandedContext {
    After(Vec<String>),
    Before(Vec<String>),
    Between { first: Vec<String>, second: Vec<String> },
    When(Vec<String>),
    /// Rollback of a temporary glyph left behind by an incomplete match.
    Cleanup(String),
}

impl ExpandedContext {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ExpandedContext::After(_) => "after",
            ExpandedContext::Before(_) => "before",
            ExpandedContext::Between { .. } => "between",
            ExpandedContext::When(_) => "when",
            ExpandedContext::Cleanup(_) => "cleanup",
        }
    }
}

impl fmt::Display for ExpandedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpandedContext::After(p) | ExpandedContext::Before(p) | ExpandedContext::When(p) => {
                write!(f, "{} {}", self.kind(), p.join(" "))
            }
            ExpandedContext::Between { first, second } => {
                write!(f, "between {} and {}", first.join(" "), second.join(" "))
            }
            ExpandedContext::Cleanup(temp) => write!(f, "cleanup {temp}"),
        }
    }
}

/// A glyph-level contextual rule produced by expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedContextualRule {
    pub context: ExpandedContext,
    /// `(target, replacement)` pairs, in source order.
    pub substitutions: Vec<(String, String)>,
    pub source_line: usize,
    /// Shared by the rules a single `when` rule was decomposed into.
    pub rule_group_id: Option<String>,
}

impl ExpandedContextualRule {
    pub(crate) fn single(
        context: ExpandedContext,
        target: impl Into<String>,
        replacement: impl Into<String>,
        source_line: usize,
    ) -> Self {
        Self {
            context,
            substitutions: vec![(target.into(), replacement.into())],
            source_line,
            rule_group_id: None,
        }
    }

    #[must_use]
    pub(crate) fn in_group(mut self, group: &str) -> Self {
        self.rule_group_id = Some(group.to_owned());
        self
    }

    #[must_use]
    pub fn needs_multi_pass(&self) -> bool {
        self.substitutions.len() > 1
    }

    #[must_use]
    pub fn is_cleanup(&self) -> bool {
        matches!(self.context, ExpandedContext::Cleanup(_))
    }

    /// The context pattern for after/before/when rules.
    #[must_use]
    pub fn pattern(&self) -> Option<&[String]> {
        match &self.context {
            ExpandedContext::After(p) | ExpandedContext::Before(p) | ExpandedContext::When(p) => {
                Some(p)
            }
            ExpandedContext::Between { .. } | ExpandedContext::Cleanup(_) => None,
        }
    }
}

impl fmt::Display for ExpandedContextualRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .substitutions
            .iter()
            .map(|(t, r)| format!("{t} => {r}"))
            .collect();
        write!(f, "{}: {}", self.context, pairs.join(", "))
    }
}

/// A glyph-level reordering rule with its detected verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedReorderRule {
    pub before: Vec<String>,
    pub after: Vec<String>,
    pub pattern: ReorderPattern,
    pub source_line: usize,
}

impl fmt::Display for ExpandedReorderRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} => {} ({})",
            self.before.join(" "),
            self.after.join(" "),
            self.pattern
        )
    }
}
