//! ATIF-style text output.
//!
//! A [`Document`] accumulates subtables in emission order; the subtable
//! number is the position in that order. Rendering is a pure function of
//! the accumulated subtables, so identical input yields identical bytes.

use std::fmt::Write as _;

use crate::types::{Action, GeneratorConfig, StateTable, Subtable, SubtableBody};

const INDENT: &str = "    ";

/// Subtables collected for one feature/selector pair.
#[derive(Debug, Clone)]
pub struct Document {
    feature_name: String,
    selector: u16,
    subtables: Vec<Subtable>,
}

impl Document {
    #[must_use]
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            feature_name: config.feature_name().to_owned(),
            selector: config.selector(),
            subtables: Vec::new(),
        }
    }

    /// Append a subtable and return its number.
    pub fn push(&mut self, subtable: Subtable) -> usize {
        let number = self.subtables.len();
        log::debug!(
            "subtable {number}: {} ({})",
            subtable.body.keyword(),
            subtable.description
        );
        self.subtables.push(subtable);
        number
    }

    #[must_use]
    pub fn subtables(&self) -> &[Subtable] {
        &self.subtables
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subtables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subtables.is_empty()
    }

    /// Render the whole document.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "// ot2aat generated ATIF");
        let _ = writeln!(
            out,
            "// Feature: {}, selector {}",
            self.feature_name, self.selector
        );
        out.push('\n');
        let _ = writeln!(out, "feature ({}) {{", self.feature_name);
        let _ = writeln!(out, "{INDENT}selector ({}) {{", self.selector);
        for (number, subtable) in self.subtables.iter().enumerate() {
            out.push('\n');
            write_subtable(&mut out, number, subtable, 2);
        }
        let _ = writeln!(out, "{INDENT}}};");
        out.push_str("};\n");
        out
    }
}

fn pad(level: usize) -> String {
    INDENT.repeat(level)
}

fn write_subtable(out: &mut String, number: usize, subtable: &Subtable, level: usize) {
    let p = pad(level);
    let _ = writeln!(out, "{p}// Subtable {number}: {}", subtable.description);
    let _ = writeln!(out, "{p}{} {{", subtable.body.keyword());
    let inner = pad(level + 1);
    match &subtable.body {
        SubtableBody::Contextual(table) | SubtableBody::Rearrangement(table) => {
            write_state_table(out, table, level + 1);
        }
        SubtableBody::Noncontextual(mappings) => {
            for (glyph, replacement) in mappings {
                let _ = writeln!(out, "{inner}{glyph} => {};", replacement.as_str());
            }
        }
        SubtableBody::Ligature(ligatures) => {
            for (ligature, components) in ligatures {
                let _ = writeln!(out, "{inner}{ligature} := {};", components.join(" + "));
            }
        }
        SubtableBody::Insertion(insertions) => {
            for (source, targets) in insertions {
                let _ = writeln!(out, "{inner}{source} > {};", targets.join(" "));
            }
        }
    }
    let _ = writeln!(out, "{p}}};");
}

fn write_state_table(out: &mut String, table: &StateTable, level: usize) {
    let p = pad(level);
    let p2 = pad(level + 1);

    for (name, glyphs) in &table.classes {
        let members: Vec<&str> = glyphs.iter().map(String::as_str).collect();
        let _ = writeln!(out, "{p}class {name} {{ {} }};", members.join(", "));
    }

    out.push('\n');
    for state in &table.states {
        let _ = writeln!(out, "{p}state {} {{", state.name);
        for (class, transition) in &state.entries {
            let _ = writeln!(out, "{p2}{class}: {transition};");
        }
        let _ = writeln!(out, "{p}}};");
    }

    out.push('\n');
    for transition in &table.transitions {
        let _ = writeln!(out, "{p}transition {} {{", transition.name);
        let _ = writeln!(out, "{p2}change state to {};", transition.next_state);
        for action in &transition.actions {
            let _ = writeln!(out, "{p2}{};", action_text(action));
        }
        let _ = writeln!(out, "{p}}};");
    }

    for substitution in &table.substitutions {
        out.push('\n');
        let _ = writeln!(out, "{p}substitution {} {{", substitution.name);
        for (target, replacement) in &substitution.entries {
            let _ = writeln!(out, "{p2}{target} => {replacement};");
        }
        let _ = writeln!(out, "{p}}};");
    }
}

fn action_text(action: &Action) -> String {
    match action {
        Action::MarkGlyph => "mark glyph".to_owned(),
        Action::MarkFirst => "mark first".to_owned(),
        Action::MarkLast => "mark last".to_owned(),
        Action::SubstituteCurrent(table) => format!("substitute current with {table}"),
        Action::SubstituteMarked(table) => format!("substitute marked with {table}"),
        Action::Rearrange(pattern) => format!("rearrange ({pattern})"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::types::{Replacement, START_STATE};

    #[test]
    fn empty_document_wraps_feature_and_selector() {
        let doc = Document::new(&GeneratorConfig::new("Ligatures", 2));
        assert_eq!(
            doc.render(),
            "// ot2aat generated ATIF\n\
             // Feature: Ligatures, selector 2\n\
             \n\
             feature (Ligatures) {\n\
             \x20   selector (2) {\n\
             \x20   };\n\
             };\n"
        );
    }

    #[test]
    fn noncontextual_subtable_rendering() {
        let mut doc = Document::new(&GeneratorConfig::new("Test", 0));
        let number = doc.push(Subtable::new(
            "cleanup",
            SubtableBody::Noncontextual(vec![
                ("65000".into(), Replacement::Delete),
                ("a".into(), Replacement::Glyph("b".into())),
            ]),
        ));
        assert_eq!(number, 0);
        let text = doc.render();
        assert!(text.contains("        // Subtable 0: cleanup\n        noncontextual {\n"));
        assert!(text.contains("            65000 => DEL;\n"));
        assert!(text.contains("            a => b;\n"));
    }

    #[test]
    fn state_table_rendering() {
        let mut table = StateTable::new();
        table.add_class("Context", ["b", "a"]);
        table.on(START_STATE, "Context", "SawContext");
        table.transition("SawContext", "SawContext", vec![Action::MarkGlyph]);
        table.substitution("Subst", vec![("x".into(), "y".into())]);

        let mut out = String::new();
        write_state_table(&mut out, &table, 0);
        assert_eq!(
            out,
            "class Context { a, b };\n\
             \n\
             state Start {\n\
             \x20   Context: SawContext;\n\
             };\n\
             \n\
             transition SawContext {\n\
             \x20   change state to SawContext;\n\
             \x20   mark glyph;\n\
             };\n\
             \n\
             substitution Subst {\n\
             \x20   x => y;\n\
             };\n"
        );
    }

    #[test]
    fn numbering_follows_push_order() {
        let mut doc = Document::new(&GeneratorConfig::new("Test", 0));
        for i in 0..3 {
            let n = doc.push(Subtable::new(
                format!("table {i}"),
                SubtableBody::Noncontextual(vec![]),
            ));
            assert_eq!(n, i);
        }
        let text = doc.render();
        assert!(text.contains("// Subtable 2: table 2"));
        assert_eq!(doc.len(), 3);
    }
}
