//! Subtable synthesis: glyph-level rules to state tables and mappings.

mod contextual;
mod partition;
mod reorder;
mod sibling;

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

pub use contextual::{generate_contextual, synthesize_contextual};
pub use partition::OverlapPartition;
pub use reorder::generate_reorder;
pub use sibling::{generate_ligature, generate_one_to_many, generate_simple};

pub(crate) use contextual::emit_contextual;
pub(crate) use reorder::emit_reorder;
pub(crate) use sibling::{emit_ligature, emit_one_to_many, emit_simple};

/// Collapse `(target, replacement)` pairs into one mapping per target.
///
/// The first replacement for a target wins; a later, different replacement
/// is dropped with a warning. Entries come back sorted by target.
pub(crate) fn first_wins<'a, I>(pairs: I, table: &str) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut map: BTreeMap<&str, &str> = BTreeMap::new();
    for (target, replacement) in pairs {
        match map.entry(target) {
            Entry::Vacant(slot) => {
                slot.insert(replacement);
            }
            Entry::Occupied(kept) => {
                if *kept.get() != replacement {
                    log::warn!(
                        "{table}: '{target}' already maps to '{}', dropping '{replacement}'",
                        kept.get()
                    );
                }
            }
        }
    }
    map.into_iter()
        .map(|(t, r)| (t.to_owned(), r.to_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_replacement_wins() {
        let merged = first_wins([("b", "x"), ("a", "y"), ("b", "z")], "test");
        assert_eq!(
            merged,
            [("a".to_owned(), "y".to_owned()), ("b".to_owned(), "x".to_owned())]
        );
    }
}
