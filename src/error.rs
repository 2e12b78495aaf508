use std::path::PathBuf;

use thiserror::Error;

use crate::parse::ParseError;
use crate::GenerateError;

/// Unified error type covering parsing, generation, and I/O.
///
/// Returned by convenience methods like
/// [`RuleFile::from_source()`](crate::RuleFile::from_source) and
/// [`RuleFile::from_file()`](crate::RuleFile::from_file).
#[derive(Debug, Error)]
pub enum Ot2AatError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error("rule file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("invalid glyph name '{name}'{}", at_line(.line))]
    InvalidGlyphName { name: String, line: Option<usize> },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn at_line(line: &Option<usize>) -> String {
    line.map(|l| format!(" at line {l}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_name_message() {
        let err = Ot2AatError::InvalidGlyphName {
            name: "DEL".into(),
            line: Some(3),
        };
        assert_eq!(err.to_string(), "invalid glyph name 'DEL' at line 3");
    }

    #[test]
    fn file_not_found_message() {
        let err = Ot2AatError::FileNotFound {
            path: PathBuf::from("rules/missing.aar"),
        };
        assert_eq!(err.to_string(), "rule file not found: rules/missing.aar");
    }

    #[test]
    fn generate_error_is_transparent() {
        let err: Ot2AatError = GenerateError::undefined_class("vowels", 2).into();
        assert_eq!(err.to_string(), "invalid rule at line 2: undefined class '@vowels'");
    }
}
