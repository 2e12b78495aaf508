use std::fmt;

use super::temp_glyph::DEFAULT_TEMP_GLYPH_BASE;

/// Settings for one generation run.
///
/// # Example
///
/// ```
/// use ot2aat::GeneratorConfig;
///
/// let config = GeneratorConfig::new("Ligatures", 2).temp_glyph_base(64000);
/// assert_eq!(config.feature_name(), "Ligatures");
/// assert_eq!(config.selector(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    feature_name: String,
    selector: u16,
    temp_glyph_base: u16,
}

impl GeneratorConfig {
    #[must_use]
    pub fn new(feature_name: &str, selector: u16) -> Self {
        Self {
            feature_name: feature_name.to_owned(),
            selector,
            temp_glyph_base: DEFAULT_TEMP_GLYPH_BASE,
        }
    }

    /// First code handed out for temporary glyphs.
    #[must_use]
    pub fn temp_glyph_base(mut self, base: u16) -> Self {
        self.temp_glyph_base = base;
        self
    }

    #[must_use]
    pub fn feature_name(&self) -> &str {
        &self.feature_name
    }

    #[must_use]
    pub fn selector(&self) -> u16 {
        self.selector
    }

    #[must_use]
    pub fn temp_base(&self) -> u16 {
        self.temp_glyph_base
    }
}

impl fmt::Display for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, selector {}", self.feature_name, self.selector)
    }
}
