use std::cell::Cell;

use winnow::ascii::{line_ending, till_line_ending};
use winnow::combinator::{alt, cut_err, eof, opt, peek, preceded, repeat, separated};
use winnow::error::{ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::take_while;

use crate::types::{
    class, glyph, pair, ContextType, ContextualRule, GlyphClass, LigatureRule, OneToManyRule,
    ReorderRule, RuleElement, RuleFile, SimpleRule, SubstitutionPair,
};

fn expected(what: &'static str) -> StrContext {
    StrContext::Expected(StrContextValue::Description(what))
}

/// Line numbers for positions in the source.
///
/// Rules are parsed front to back, so each lookup counts newlines from the
/// previous one instead of from the start of the file.
struct Lines<'s> {
    full: &'s str,
    /// Byte offset and line number of the last lookup.
    seen: Cell<(usize, usize)>,
}

impl<'s> Lines<'s> {
    fn new(full: &'s str) -> Self {
        Self {
            full,
            seen: Cell::new((0, 1)),
        }
    }

    /// 1-based line of the first character of `rest`.
    fn at(&self, rest: &str) -> usize {
        let offset = self.full.len() - rest.len();
        let (mut from, mut line) = self.seen.get();
        if offset < from {
            (from, line) = (0, 1);
        }
        line += self.full.as_bytes()[from..offset]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        self.seen.set((offset, line));
        line
    }
}

// -- Whitespace & comments --------------------------------------------------

/// Anything between rules: blank lines, indentation and `#` comments.
fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

/// Spacing inside a rule, which never crosses a line.
fn sp(input: &mut &str) -> ModalResult<()> {
    take_while(0.., (' ', '\t')).void().parse_next(input)
}

fn end_of_rule(input: &mut &str) -> ModalResult<()> {
    sp.parse_next(input)?;
    cut_err(alt((
        line_ending.void(),
        ('#', till_line_ending).void(),
        peek('}').void(),
        eof.void(),
    )))
    .context(expected("end of line"))
    .parse_next(input)
}

// -- Elements ---------------------------------------------------------------

fn glyph_name<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || c == '.' || c == '_'
    })
    .context(expected("glyph name"))
    .parse_next(input)
}

fn element(input: &mut &str) -> ModalResult<RuleElement> {
    alt((
        preceded('@', cut_err(glyph_name)).map(class),
        glyph_name.map(glyph),
    ))
    .parse_next(input)
}

fn pattern(input: &mut &str) -> ModalResult<Vec<RuleElement>> {
    repeat(1.., preceded(sp, element))
        .context(expected("pattern"))
        .parse_next(input)
}

/// The first half of a `between` context, which stops at `and`.
fn between_first(input: &mut &str) -> ModalResult<Vec<RuleElement>> {
    repeat(
        1..,
        preceded(
            sp,
            element.verify(|e: &RuleElement| !matches!(e, RuleElement::Glyph(name) if name == "and")),
        ),
    )
    .context(expected("pattern"))
    .parse_next(input)
}

fn substitution(input: &mut &str) -> ModalResult<SubstitutionPair> {
    let target = element.parse_next(input)?;
    (sp, cut_err("=>").context(expected("'=>'")), sp).parse_next(input)?;
    let replacement = cut_err(element)
        .context(expected("replacement"))
        .parse_next(input)?;
    Ok(pair(target, replacement))
}

// -- Rules ------------------------------------------------------------------

fn contextual_rule(input: &mut &str, lines: &Lines<'_>) -> ModalResult<ContextualRule> {
    let line = lines.at(input);
    let keyword = alt(("after", "before", "between", "when"))
        .context(expected("context keyword"))
        .parse_next(input)?;
    let context = match keyword {
        "after" => ContextType::After(cut_err(pattern).parse_next(input)?),
        "before" => ContextType::Before(cut_err(pattern).parse_next(input)?),
        "when" => ContextType::When(cut_err(pattern).parse_next(input)?),
        _ => {
            let first = cut_err(between_first).parse_next(input)?;
            (sp, cut_err("and").context(expected("'and'"))).parse_next(input)?;
            let second = cut_err(pattern).parse_next(input)?;
            ContextType::Between { first, second }
        }
    };
    (sp, cut_err(':').context(expected("':'")), sp).parse_next(input)?;
    let substitutions: Vec<SubstitutionPair> =
        cut_err(separated(1.., substitution, (sp, ',', sp))).parse_next(input)?;
    Ok(ContextualRule::new(context, substitutions, line))
}

fn reorder_rule(input: &mut &str, lines: &Lines<'_>) -> ModalResult<ReorderRule> {
    let source_line = lines.at(input);
    let before = pattern.parse_next(input)?;
    (sp, cut_err(alt(("=>", ">"))).context(expected("'=>'"))).parse_next(input)?;
    let after = cut_err(pattern).parse_next(input)?;
    Ok(ReorderRule {
        before,
        after,
        source_line,
    })
}

fn simple_rule(input: &mut &str, lines: &Lines<'_>) -> ModalResult<SimpleRule> {
    let source_line = lines.at(input);
    let target = element.parse_next(input)?;
    (sp, cut_err("->").context(expected("'->'")), sp).parse_next(input)?;
    let replacement = cut_err(element).parse_next(input)?;
    Ok(SimpleRule {
        target,
        replacement,
        source_line,
    })
}

fn ligature_rule(input: &mut &str, lines: &Lines<'_>) -> ModalResult<LigatureRule> {
    let source_line = lines.at(input);
    let ligature = element.parse_next(input)?;
    (sp, cut_err(":=").context(expected("':='")), sp).parse_next(input)?;
    let components: Vec<RuleElement> =
        cut_err(separated(1.., element, (sp, '+', sp))).parse_next(input)?;
    Ok(LigatureRule {
        ligature,
        components,
        source_line,
    })
}

fn one_to_many_rule(input: &mut &str, lines: &Lines<'_>) -> ModalResult<OneToManyRule> {
    let source_line = lines.at(input);
    let source = element.parse_next(input)?;
    (sp, cut_err('>').context(expected("'>'"))).parse_next(input)?;
    let targets = cut_err(pattern).parse_next(input)?;
    Ok(OneToManyRule {
        source,
        targets,
        source_line,
    })
}

// -- Directives -------------------------------------------------------------

fn class_def(input: &mut &str) -> ModalResult<GlyphClass> {
    take_while(1.., (' ', '\t')).parse_next(input)?;
    let name = cut_err(glyph_name).parse_next(input)?;
    (sp, cut_err('=').context(expected("'='")), sp).parse_next(input)?;
    let bracketed = opt('[').parse_next(input)?.is_some();
    let glyphs: Vec<&str> = cut_err(repeat(1.., preceded(sp, glyph_name))).parse_next(input)?;
    if bracketed {
        (sp, cut_err(']').context(expected("']'"))).parse_next(input)?;
    }
    Ok(GlyphClass::new(name, glyphs))
}

fn block<T, F>(input: &mut &str, lines: &Lines<'_>, mut rule: F) -> ModalResult<Vec<T>>
where
    F: FnMut(&mut &str, &Lines<'_>) -> ModalResult<T>,
{
    (sp, cut_err('{').context(expected("'{'"))).parse_next(input)?;
    let mut rules = Vec::new();
    loop {
        ws.parse_next(input)?;
        if opt('}').parse_next(input)?.is_some() {
            return Ok(rules);
        }
        rules.push(rule(input, lines).map_err(ErrMode::cut)?);
        end_of_rule.parse_next(input)?;
    }
}

fn directive(input: &mut &str, lines: &Lines<'_>, file: &mut RuleFile) -> ModalResult<()> {
    cut_err('@').context(expected("directive")).parse_next(input)?;
    let keyword = cut_err(alt((
        "class",
        "contextual",
        "reorder",
        "simple",
        "ligature",
        "one2many",
    )))
    .context(expected("directive name"))
    .parse_next(input)?;

    match keyword {
        "class" => {
            file.classes.push(class_def(input)?);
            end_of_rule.parse_next(input)?;
        }
        "contextual" => file.contextual.extend(block(input, lines, contextual_rule)?),
        "reorder" => file.reorder.extend(block(input, lines, reorder_rule)?),
        "simple" => file.simple.extend(block(input, lines, simple_rule)?),
        "ligature" => file.ligature.extend(block(input, lines, ligature_rule)?),
        _ => file.one_to_many.extend(block(input, lines, one_to_many_rule)?),
    }
    Ok(())
}

// -- Top-level parser -------------------------------------------------------

pub fn rule_file(input: &mut &str) -> ModalResult<RuleFile> {
    let lines = Lines::new(*input);
    let mut file = RuleFile::default();
    loop {
        ws.parse_next(input)?;
        if input.is_empty() {
            return Ok(file);
        }
        directive(input, &lines, &mut file)?;
    }
}
