mod class_registry;
mod config;
mod element;
mod error;
mod expanded;
mod pattern;
mod rule;
mod rule_file;
mod subtable;
mod temp_glyph;

pub use class_registry::{GlyphClass, GlyphClassRegistry};
pub use config::GeneratorConfig;
pub(crate) use element::join_elements;
pub use element::{class, glyph, RuleElement};
pub use error::GenerateError;
pub use expanded::{ExpandedContext, ExpandedContextualRule, ExpandedReorderRule};
pub use pattern::{detect_pattern, permutation_signature, ReorderPattern};
pub use rule::{
    pair, ContextType, ContextualRule, LigatureRule, OneToManyRule, ReorderRule, SimpleRule,
    SubstitutionPair, WildcardType,
};
pub use rule_file::{RuleFile, RuleFileBuilder, MAX_GLYPH_NAME_LEN};
pub use subtable::{
    Action, Replacement, State, StateTable, SubstitutionTable, Subtable, SubtableBody,
    Transition, DELETED_GLYPH, START_STATE,
};
pub use temp_glyph::{TempGlyphArena, TempPurpose, DEFAULT_TEMP_GLYPH_BASE};
