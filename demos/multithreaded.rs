use std::sync::Arc;
use std::thread;

use ot2aat::{class, pair, ContextType, GeneratorConfig, RuleFileBuilder};

fn main() {
    let rules = Arc::new(
        RuleFileBuilder::new()
            .class("digits", ["zero", "one", "two"])
            .class("onum", ["zero.onum", "one.onum", "two.onum"])
            .class("lower", ["a", "b", "c"])
            .contextual(
                ContextType::After(vec![class("lower")]),
                vec![pair(class("digits"), class("onum"))],
            )
            .build(),
    );

    // One feature selector per thread, all sharing the same rules
    let handles: Vec<_> = (0..4_u16)
        .map(|selector| {
            let rules = Arc::clone(&rules);
            thread::spawn(move || {
                let config = GeneratorConfig::new("Number Case", selector);
                let result = rules.generate(&config).map(|text| text.lines().count());
                println!("Selector {selector}: {result:?} lines");
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
