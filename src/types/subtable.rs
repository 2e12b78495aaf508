use std::collections::{BTreeMap, BTreeSet};

use super::pattern::ReorderPattern;

/// The name every state table starts in.
pub const START_STATE: &str = "Start";

/// Glyph written for a deletion.
pub const DELETED_GLYPH: &str = "DEL";

/// What a glyph maps to in a substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    Glyph(String),
    Delete,
}

impl Replacement {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Replacement::Glyph(name) => name,
            Replacement::Delete => DELETED_GLYPH,
        }
    }
}

/// One action performed by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    MarkGlyph,
    MarkFirst,
    MarkLast,
    SubstituteCurrent(String),
    SubstituteMarked(String),
    Rearrange(ReorderPattern),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub name: String,
    /// `(class, transition)` entries; a class appears at most once.
    pub entries: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub name: String,
    pub next_state: String,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionTable {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

/// A finite-state subtable: disjoint glyph classes driving a state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateTable {
    pub classes: BTreeMap<String, BTreeSet<String>>,
    pub states: Vec<State>,
    pub transitions: Vec<Transition>,
    pub substitutions: Vec<SubstitutionTable>,
}

impl StateTable {
    #[must_use]
    pub fn new() -> Self {
        let mut table = Self::default();
        table.state(START_STATE);
        table
    }

    /// Declare a class. Empty classes are skipped; returns whether the class
    /// exists afterwards.
    pub fn add_class<I, S>(&mut self, name: &str, glyphs: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members: BTreeSet<String> = glyphs.into_iter().map(Into::into).collect();
        if members.is_empty() {
            return self.has_class(name);
        }
        self.classes
            .entry(name.to_owned())
            .or_default()
            .extend(members);
        true
    }

    #[must_use]
    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Get or create a state, preserving creation order.
    pub fn state(&mut self, name: &str) -> &mut State {
        let idx = match self.states.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.states.push(State {
                    name: name.to_owned(),
                    entries: Vec::new(),
                });
                self.states.len() - 1
            }
        };
        &mut self.states[idx]
    }

    /// Route `class` in `state` to `transition`.
    ///
    /// No-op when the class was never declared or the state already routes
    /// it; the first entry for a class wins.
    pub fn on(&mut self, state: &str, class: &str, transition: &str) -> bool {
        if !self.has_class(class) {
            return false;
        }
        let state = self.state(state);
        if state.entries.iter().any(|(c, _)| c == class) {
            return false;
        }
        state.entries.push((class.to_owned(), transition.to_owned()));
        true
    }

    /// Define a transition; a later definition with the same name is ignored.
    pub fn transition(&mut self, name: &str, next_state: &str, actions: Vec<Action>) {
        if self.transitions.iter().any(|t| t.name == name) {
            return;
        }
        self.transitions.push(Transition {
            name: name.to_owned(),
            next_state: next_state.to_owned(),
            actions,
        });
    }

    pub fn substitution(&mut self, name: &str, entries: Vec<(String, String)>) {
        self.substitutions.push(SubstitutionTable {
            name: name.to_owned(),
            entries,
        });
    }

    /// Transitions referenced from a state entry.
    #[must_use]
    pub fn find_transition(&self, name: &str) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.name == name)
    }

    #[must_use]
    pub fn find_state(&self, name: &str) -> Option<&State> {
        self.states.iter().find(|s| s.name == name)
    }
}

/// The kind-specific body of a subtable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtableBody {
    Contextual(StateTable),
    Rearrangement(StateTable),
    Noncontextual(Vec<(String, Replacement)>),
    Ligature(Vec<(String, Vec<String>)>),
    Insertion(Vec<(String, Vec<String>)>),
}

impl SubtableBody {
    #[must_use]
    pub fn keyword(&self) -> &'static str {
        match self {
            SubtableBody::Contextual(_) => "contextual",
            SubtableBody::Rearrangement(_) => "rearrangement",
            SubtableBody::Noncontextual(_) => "noncontextual",
            SubtableBody::Ligature(_) => "ligature",
            SubtableBody::Insertion(_) => "insertion",
        }
    }

    #[must_use]
    pub fn state_table(&self) -> Option<&StateTable> {
        match self {
            SubtableBody::Contextual(t) | SubtableBody::Rearrangement(t) => Some(t),
            _ => None,
        }
    }
}

/// One emitted subtable together with the description shown in its banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtable {
    pub description: String,
    pub body: SubtableBody,
}

impl Subtable {
    pub fn new(description: impl Into<String>, body: SubtableBody) -> Self {
        Self {
            description: description.into(),
            body,
        }
    }
}
