//! The rule-file language.
//!
//! A rule file is a sequence of `@class` definitions and rule blocks
//! (`@contextual`, `@reorder`, `@simple`, `@ligature`, `@one2many`).
//! `#` starts a comment that runs to the end of the line, and every rule
//! sits on a line of its own.

mod error;
mod grammar;

pub use error::ParseError;

use crate::types::RuleFile;

/// Parse rule-file text into a [`RuleFile`].
///
/// Glyph names are not validated here; use
/// [`RuleFile::from_source`] for the checked path.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not valid rule-file syntax.
pub fn parse(input: &str) -> Result<RuleFile, ParseError> {
    use winnow::Parser;
    grammar::rule_file
        .parse(input)
        .map_err(|e| ParseError::new(e.to_string()))
}
