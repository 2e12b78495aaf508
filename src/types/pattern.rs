use std::fmt;

use super::error::GenerateError;

/// The fixed AAT rearrangement verbs, plus `NoChange`.
///
/// Letters name marked glyphs, `x` stands for the unmarked run between the
/// first and last mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReorderPattern {
    NoChange,
    /// `Ax => xA`
    AxToXA,
    /// `xD => Dx`
    XDToDX,
    /// `AxD => DxA`
    AxDToDxA,
    /// `ABx => xAB`
    ABxToXAB,
    /// `ABx => xBA`
    ABxToXBA,
    /// `xCD => CDx`
    XCDToCDx,
    /// `xCD => DCx`
    XCDToDCx,
    /// `AxCD => CDxA`
    AxCDToCDxA,
    /// `AxCD => DCxA`
    AxCDToDCxA,
    /// `ABxD => DxAB`
    ABxDToDxAB,
    /// `ABxD => DxBA`
    ABxDToDxBA,
    /// `ABxCD => CDxAB`
    ABxCDToCDxAB,
    /// `ABxCD => CDxBA`
    ABxCDToCDxBA,
    /// `ABxCD => DCxAB`
    ABxCDToDCxAB,
    /// `ABxCD => DCxBA`
    ABxCDToDCxBA,
}

impl ReorderPattern {
    /// All sixteen values, in verb-number order.
    pub const ALL: [ReorderPattern; 16] = [
        ReorderPattern::NoChange,
        ReorderPattern::AxToXA,
        ReorderPattern::XDToDX,
        ReorderPattern::AxDToDxA,
        ReorderPattern::ABxToXAB,
        ReorderPattern::ABxToXBA,
        ReorderPattern::XCDToCDx,
        ReorderPattern::XCDToDCx,
        ReorderPattern::AxCDToCDxA,
        ReorderPattern::AxCDToDCxA,
        ReorderPattern::ABxDToDxAB,
        ReorderPattern::ABxDToDxBA,
        ReorderPattern::ABxCDToCDxAB,
        ReorderPattern::ABxCDToCDxBA,
        ReorderPattern::ABxCDToDCxAB,
        ReorderPattern::ABxCDToDCxBA,
    ];

    /// The AAT verb number (0 for `NoChange`, 1..=15 for the verbs).
    #[must_use]
    pub fn verb_number(self) -> u8 {
        match self {
            ReorderPattern::NoChange => 0,
            ReorderPattern::AxToXA => 1,
            ReorderPattern::XDToDX => 2,
            ReorderPattern::AxDToDxA => 3,
            ReorderPattern::ABxToXAB => 4,
            ReorderPattern::ABxToXBA => 5,
            ReorderPattern::XCDToCDx => 6,
            ReorderPattern::XCDToDCx => 7,
            ReorderPattern::AxCDToCDxA => 8,
            ReorderPattern::AxCDToDCxA => 9,
            ReorderPattern::ABxDToDxAB => 10,
            ReorderPattern::ABxDToDxBA => 11,
            ReorderPattern::ABxCDToCDxAB => 12,
            ReorderPattern::ABxCDToCDxBA => 13,
            ReorderPattern::ABxCDToDCxAB => 14,
            ReorderPattern::ABxCDToDCxBA => 15,
        }
    }

    /// The verb's textual form, e.g. `ABxCD => CDxAB`.
    #[must_use]
    pub fn notation(self) -> &'static str {
        match self {
            ReorderPattern::NoChange => "no change",
            ReorderPattern::AxToXA => "Ax => xA",
            ReorderPattern::XDToDX => "xD => Dx",
            ReorderPattern::AxDToDxA => "AxD => DxA",
            ReorderPattern::ABxToXAB => "ABx => xAB",
            ReorderPattern::ABxToXBA => "ABx => xBA",
            ReorderPattern::XCDToCDx => "xCD => CDx",
            ReorderPattern::XCDToDCx => "xCD => DCx",
            ReorderPattern::AxCDToCDxA => "AxCD => CDxA",
            ReorderPattern::AxCDToDCxA => "AxCD => DCxA",
            ReorderPattern::ABxDToDxAB => "ABxD => DxAB",
            ReorderPattern::ABxDToDxBA => "ABxD => DxBA",
            ReorderPattern::ABxCDToCDxAB => "ABxCD => CDxAB",
            ReorderPattern::ABxCDToCDxBA => "ABxCD => CDxBA",
            ReorderPattern::ABxCDToDCxAB => "ABxCD => DCxAB",
            ReorderPattern::ABxCDToDCxBA => "ABxCD => DCxBA",
        }
    }

    /// Look up a permutation signature in the fixed verb table.
    ///
    /// The signature has one digit per `before` position giving the index
    /// that glyph lands on in `after`.
    ///
    /// NOTE: the length-4 table accepts `0123` (the identity) and maps it to
    /// `ABxD => DxAB`. This entry is kept as-is pending review.
    #[must_use]
    pub fn from_signature(signature: &str) -> Option<Self> {
        let pattern = match signature {
            "10" => ReorderPattern::AxToXA,

            "120" => ReorderPattern::ABxToXAB,
            "201" => ReorderPattern::XCDToCDx,
            "210" => ReorderPattern::AxDToDxA,

            "2301" => ReorderPattern::ABxCDToCDxAB,
            "3201" => ReorderPattern::ABxCDToCDxBA,
            "0123" => ReorderPattern::ABxDToDxAB,
            "0132" => ReorderPattern::XCDToDCx,
            "2310" => ReorderPattern::ABxCDToDCxAB,
            "3210" => ReorderPattern::ABxCDToDCxBA,
            "3012" => ReorderPattern::AxToXA,
            "3021" => ReorderPattern::AxCDToDCxA,
            _ => return None,
        };
        Some(pattern)
    }
}

impl fmt::Display for ReorderPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.notation())
    }
}

/// Build the permutation signature of a before/after glyph window.
///
/// # Errors
///
/// Fails if a `before` glyph does not occur in `after`.
pub fn permutation_signature(
    before: &[String],
    after: &[String],
    line: usize,
) -> Result<String, GenerateError> {
    before
        .iter()
        .map(|glyph| {
            after
                .iter()
                .position(|g| g == glyph)
                .map(|idx| char::from(b'0' + idx as u8))
                .ok_or_else(|| {
                    GenerateError::invalid(
                        line,
                        format!("glyph '{glyph}' does not appear on the right-hand side"),
                    )
                })
        })
        .collect()
}

/// Classify a before/after window as one of the fixed rearrangement verbs.
///
/// Only windows of 2 to 4 glyphs are supported. The result depends only on
/// the positional permutation, not on the glyph names.
///
/// # Errors
///
/// Returns [`GenerateError::InvalidRule`] for a length mismatch, a length
/// outside 2..=4, or a signature outside the fixed table.
pub fn detect_pattern(
    before: &[String],
    after: &[String],
    line: usize,
) -> Result<ReorderPattern, GenerateError> {
    if before.len() != after.len() {
        return Err(GenerateError::invalid(
            line,
            format!(
                "reorder sides differ in length ({} vs {})",
                before.len(),
                after.len()
            ),
        ));
    }
    if !(2..=4).contains(&before.len()) {
        return Err(GenerateError::invalid(
            line,
            format!(
                "reorder patterns must have 2 to 4 glyphs, got {}",
                before.len()
            ),
        ));
    }

    let signature = permutation_signature(before, after, line)?;
    if let Some(pattern) = ReorderPattern::from_signature(&signature) {
        return Ok(pattern);
    }

    let message = match before.len() {
        2 if signature == "01" => "glyphs are already in order; nothing to rearrange".to_owned(),
        2 => format!("unsupported 2-glyph permutation '{signature}' (only 10 is supported)"),
        3 => format!(
            "unsupported 3-glyph permutation '{signature}' (supported: 120, 201, 210)"
        ),
        _ => format!(
            "unsupported 4-glyph permutation '{signature}' \
             (supported: 2301, 3201, 0123, 0132, 2310, 3210, 3012, 3021)"
        ),
    };
    Err(GenerateError::invalid(line, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyphs(names: &str) -> Vec<String> {
        names.split_whitespace().map(str::to_owned).collect()
    }

    #[test]
    fn swap_is_ax_to_xa() {
        let p = detect_pattern(&glyphs("A B"), &glyphs("B A"), 1).unwrap();
        assert_eq!(p, ReorderPattern::AxToXA);
        assert_eq!(p.to_string(), "Ax => xA");
    }

    #[test]
    fn already_ordered_pair_rejected() {
        let err = detect_pattern(&glyphs("A B"), &glyphs("A B"), 2).unwrap_err();
        assert!(err.to_string().contains("already in order"));
    }

    #[test]
    fn three_glyph_signatures() {
        let cases = [
            ("a b c", "c a b", ReorderPattern::ABxToXAB),
            ("a b c", "b c a", ReorderPattern::XCDToCDx),
            ("a b c", "c b a", ReorderPattern::AxDToDxA),
        ];
        for (before, after, expected) in cases {
            assert_eq!(
                detect_pattern(&glyphs(before), &glyphs(after), 1).unwrap(),
                expected,
                "{before} => {after}"
            );
        }
    }

    #[test]
    fn unsupported_three_glyph_signature() {
        // "021": a stays, b and c swap
        let err = detect_pattern(&glyphs("a b c"), &glyphs("a c b"), 9).unwrap_err();
        assert!(err.to_string().contains("'021'"));
        assert_eq!(err.line(), Some(9));
    }

    #[test]
    fn identity_four_glyph_signature_accepted() {
        let p = detect_pattern(&glyphs("a b c d"), &glyphs("a b c d"), 1).unwrap();
        assert_eq!(p, ReorderPattern::ABxDToDxAB);
    }

    #[test]
    fn unsupported_four_glyph_signature_names_table() {
        let err = detect_pattern(&glyphs("a b c d"), &glyphs("b a c d"), 1).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'1023'"));
        assert!(msg.contains("2301"));
    }

    #[test]
    fn lengths_outside_range_rejected() {
        assert!(detect_pattern(&glyphs("a"), &glyphs("a"), 1).is_err());
        assert!(detect_pattern(&glyphs("a b c d e"), &glyphs("e d c b a"), 1).is_err());
    }

    #[test]
    fn mismatched_sides_rejected() {
        let err = detect_pattern(&glyphs("a b"), &glyphs("b a c"), 1).unwrap_err();
        assert!(err.to_string().contains("2 vs 3"));
    }

    #[test]
    fn glyph_missing_from_after_rejected() {
        let err = detect_pattern(&glyphs("a b"), &glyphs("b z"), 1).unwrap_err();
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn signature_is_independent_of_names() {
        let p1 = detect_pattern(&glyphs("a b c d"), &glyphs("c d a b"), 1).unwrap();
        let p2 = detect_pattern(&glyphs("w x y z"), &glyphs("y z w x"), 1).unwrap();
        assert_eq!(p1, p2);
        assert_eq!(p1, ReorderPattern::ABxCDToCDxAB);
    }

    #[test]
    fn verb_numbers_cover_all_values() {
        let numbers: Vec<u8> = ReorderPattern::ALL.iter().map(|p| p.verb_number()).collect();
        assert_eq!(numbers, (0..16).collect::<Vec<u8>>());
    }
}
