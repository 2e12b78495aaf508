use ot2aat::{class, expand_reorder, glyph, ReorderRule, RuleFileBuilder};

fn main() {
    env_logger::init();

    let rules = RuleFileBuilder::new()
        .class("cons", ["ka", "kha", "ga"])
        .class("pre_base", ["i.matra", "e.matra", "ai.matra"])
        .reorder(
            vec![class("cons"), class("pre_base")],
            vec![class("pre_base"), class("cons")],
        )
        .reorder(
            vec![glyph("ra"), glyph("halant"), glyph("ka")],
            vec![glyph("ka"), glyph("ra"), glyph("halant")],
        )
        .build();

    let registry = rules.registry().expect("invalid classes");
    for rule in &rules.reorder {
        print_windows(rule, &registry);
    }
}

fn print_windows(rule: &ReorderRule, registry: &ot2aat::GlyphClassRegistry) {
    match expand_reorder(rule, registry) {
        Ok(windows) => {
            for window in windows {
                println!("{window}  [verb {}]", window.pattern.verb_number());
            }
        }
        Err(err) => eprintln!("{err}"),
    }
}
