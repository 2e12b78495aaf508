use thiserror::Error;

/// Errors raised while expanding rules or synthesizing subtables.
///
/// Every failure is deterministic for a given input: nothing here is worth
/// retrying, and no partial output is produced alongside an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("invalid rule{}: {message}", at_line(.line))]
    InvalidRule {
        line: Option<usize>,
        message: String,
    },

    #[error("generation failed: {message}")]
    GenerationFailed { message: String },
}

fn at_line(line: &Option<usize>) -> String {
    line.map(|l| format!(" at line {l}")).unwrap_or_default()
}

impl GenerateError {
    pub(crate) fn invalid(line: usize, message: impl Into<String>) -> Self {
        Self::InvalidRule {
            line: Some(line),
            message: message.into(),
        }
    }

    pub(crate) fn failed(message: impl Into<String>) -> Self {
        Self::GenerationFailed {
            message: message.into(),
        }
    }

    /// A glyph class name was registered twice.
    #[must_use]
    pub fn duplicate_class(name: &str) -> Self {
        Self::InvalidRule {
            line: None,
            message: format!("duplicate class '@{name}'"),
        }
    }

    /// A rule referenced a glyph class that was never defined.
    #[must_use]
    pub fn undefined_class(name: &str, line: usize) -> Self {
        Self::invalid(line, format!("undefined class '@{name}'"))
    }

    /// The source line this error refers to, if any.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::InvalidRule { line, .. } => *line,
            Self::GenerationFailed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_rule_with_line_message() {
        let err = GenerateError::invalid(12, "class size mismatch (2 vs 3)");
        assert_eq!(
            err.to_string(),
            "invalid rule at line 12: class size mismatch (2 vs 3)"
        );
        assert_eq!(err.line(), Some(12));
    }

    #[test]
    fn invalid_rule_without_line_message() {
        let err = GenerateError::duplicate_class("vowels");
        assert_eq!(err.to_string(), "invalid rule: duplicate class '@vowels'");
        assert_eq!(err.line(), None);
    }

    #[test]
    fn undefined_class_message() {
        let err = GenerateError::undefined_class("missing", 4);
        assert_eq!(
            err.to_string(),
            "invalid rule at line 4: undefined class '@missing'"
        );
    }

    #[test]
    fn generation_failed_message() {
        let err = GenerateError::failed("unrecognized context");
        assert_eq!(err.to_string(), "generation failed: unrecognized context");
        assert_eq!(err.line(), None);
    }
}
