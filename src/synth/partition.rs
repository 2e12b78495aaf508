use std::collections::BTreeSet;

/// Target and context glyphs split into three disjoint classes.
///
/// A state table needs every glyph in exactly one class. When a glyph is
/// both a target and a context it goes to `both`, which gets its own class
/// and transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlapPartition {
    pub target_only: BTreeSet<String>,
    pub context_only: BTreeSet<String>,
    pub both: BTreeSet<String>,
}

impl OverlapPartition {
    pub fn new<'a, T, C>(targets: T, contexts: C) -> Self
    where
        T: IntoIterator<Item = &'a String>,
        C: IntoIterator<Item = &'a String>,
    {
        let targets: BTreeSet<String> = targets.into_iter().cloned().collect();
        let contexts: BTreeSet<String> = contexts.into_iter().cloned().collect();
        Self {
            target_only: targets.difference(&contexts).cloned().collect(),
            context_only: contexts.difference(&targets).cloned().collect(),
            both: targets.intersection(&contexts).cloned().collect(),
        }
    }

    #[must_use]
    pub fn has_overlap(&self) -> bool {
        !self.both.is_empty()
    }

    /// Every glyph the partition covers.
    #[must_use]
    pub fn universe(&self) -> BTreeSet<String> {
        self.target_only
            .iter()
            .chain(&self.context_only)
            .chain(&self.both)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn disjoint_inputs_have_no_overlap() {
        let p = OverlapPartition::new(&set(&["t1", "t2"]), &set(&["c"]));
        assert!(!p.has_overlap());
        assert_eq!(p.target_only.len(), 2);
        assert_eq!(p.context_only.len(), 1);
    }

    #[test]
    fn shared_glyph_goes_to_both() {
        let p = OverlapPartition::new(&set(&["y", "z"]), &set(&["x", "y"]));
        assert!(p.has_overlap());
        assert_eq!(p.target_only, ["z".to_owned()].into());
        assert_eq!(p.context_only, ["x".to_owned()].into());
        assert_eq!(p.both, ["y".to_owned()].into());
    }

    #[test]
    fn universe_is_union() {
        let p = OverlapPartition::new(&set(&["a", "b"]), &set(&["b", "c"]));
        assert_eq!(p.universe().len(), 3);
    }
}
