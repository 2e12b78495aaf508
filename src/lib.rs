//! Compile OpenType-style substitution and reordering rules into AAT `morx`
//! state-table text.
//!
//! Rules are written in a small rule-file language (see [`parse`]) or built
//! in code with [`RuleFileBuilder`]. Generation expands glyph classes into
//! glyph-level rules, then synthesizes one subtable per automaton and renders
//! the result as ATIF text.

pub mod atif;
mod error;
pub mod expand;
pub mod parse;
pub mod synth;
mod types;

pub use atif::Document;
pub use error::Ot2AatError;
pub use expand::{
    expand_all_contextual, expand_all_reorder, expand_contextual, expand_ligature,
    expand_one_to_many, expand_reorder, expand_simple, MAX_REORDER_EXPANSION,
};
pub use parse::{parse, ParseError};
pub use synth::{
    generate_contextual, generate_ligature, generate_one_to_many, generate_reorder,
    generate_simple, synthesize_contextual, OverlapPartition,
};
pub use types::{
    class, detect_pattern, glyph, pair, permutation_signature, Action, ContextType,
    ContextualRule, ExpandedContext, ExpandedContextualRule, ExpandedReorderRule, GenerateError,
    GeneratorConfig, GlyphClass, GlyphClassRegistry, LigatureRule, OneToManyRule, ReorderPattern,
    ReorderRule, Replacement, RuleElement, RuleFile, RuleFileBuilder, SimpleRule, State,
    StateTable, SubstitutionPair, SubstitutionTable, Subtable, SubtableBody, TempGlyphArena,
    TempPurpose, Transition, WildcardType, DEFAULT_TEMP_GLYPH_BASE, DELETED_GLYPH,
    MAX_GLYPH_NAME_LEN, START_STATE,
};
