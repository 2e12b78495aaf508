use std::collections::BTreeMap;

use super::error::GenerateError;

/// The first private glyph code handed out when no base is configured.
pub const DEFAULT_TEMP_GLYPH_BASE: u16 = 65000;

/// Why a temporary glyph was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TempPurpose {
    /// Intermediate glyph of a decomposed mid-pattern `when` rule.
    Decomposed,
    /// Marker glyph of a multi-pass subtable triple.
    MultiPass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct TempKey {
    purpose: TempPurpose,
    line: usize,
    index: usize,
    slot: usize,
}

/// Hands out unique temporary glyph codes for one generation run.
///
/// Codes are allocated sequentially from the base. Requests are memoized by
/// `(purpose, line, index, slot)`, so asking twice for the same key returns
/// the same code while distinct keys never share one.
#[derive(Debug, Clone)]
pub struct TempGlyphArena {
    base: u16,
    next: u32,
    assigned: BTreeMap<TempKey, u16>,
}

impl Default for TempGlyphArena {
    fn default() -> Self {
        Self::new(DEFAULT_TEMP_GLYPH_BASE)
    }
}

impl TempGlyphArena {
    #[must_use]
    pub fn new(base: u16) -> Self {
        Self {
            base,
            next: u32::from(base),
            assigned: BTreeMap::new(),
        }
    }

    /// Return the code for this key, allocating a fresh one on first use.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::GenerationFailed`] once the 16-bit glyph
    /// space above the base is exhausted.
    pub fn allocate(
        &mut self,
        purpose: TempPurpose,
        line: usize,
        index: usize,
        slot: usize,
    ) -> Result<u16, GenerateError> {
        let key = TempKey {
            purpose,
            line,
            index,
            slot,
        };
        if let Some(&code) = self.assigned.get(&key) {
            return Ok(code);
        }
        let code = u16::try_from(self.next).map_err(|_| {
            GenerateError::failed(format!(
                "temporary glyph codes exhausted ({} allocated from base {})",
                self.assigned.len(),
                self.base
            ))
        })?;
        self.next += 1;
        self.assigned.insert(key, code);
        log::trace!("temporary glyph {code} for {purpose:?} line {line} index {index} slot {slot}");
        Ok(code)
    }

    /// Number of codes allocated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    #[must_use]
    pub fn base(&self) -> u16 {
        self.base
    }
}
