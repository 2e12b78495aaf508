use ot2aat::{class, glyph, pair, ContextType, GeneratorConfig, RuleFileBuilder};

fn main() {
    env_logger::init();

    // Swash capitals after a word-initial marker, plus a plain small-cap mapping
    let rules = RuleFileBuilder::new()
        .class("caps", ["A", "B", "C"])
        .class("swash", ["A.swsh", "B.swsh", "C.swsh"])
        .contextual(
            ContextType::After(vec![glyph("space")]),
            vec![pair(class("caps"), class("swash"))],
        )
        .simple(glyph("a"), glyph("a.sc"))
        .build();

    println!("// {rules}");

    let config = GeneratorConfig::new("Swash", 1);
    let text = rules.generate(&config).expect("failed to generate subtables");
    print!("{text}");
}
