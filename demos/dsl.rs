use ot2aat::{GeneratorConfig, RuleFile};

fn main() {
    env_logger::init();

    let rules = RuleFile::from_file("demos/rules.aar").expect("failed to load rules");

    println!("// {rules}");

    let config = GeneratorConfig::new("Devanagari", 0);
    match rules.generate(&config) {
        Ok(text) => print!("{text}"),
        Err(err) => eprintln!("generation failed: {err}"),
    }
}
