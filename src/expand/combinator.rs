//! The two ways class-valued positions combine.
//!
//! Context positions are independent environments and combine as a
//! cartesian product. Paired positions (reorder sides, `when` patterns and
//! their substitutions) advance together by index: lock-step.

/// Every way of picking one glyph per position.
///
/// The last position varies fastest. No positions yields one empty
/// combination.
pub(crate) fn cartesian_product(positions: &[Vec<String>]) -> Vec<Vec<String>> {
    positions.iter().fold(vec![Vec::new()], |acc, glyphs| {
        acc.iter()
            .flat_map(|prefix| {
                glyphs.iter().map(move |glyph| {
                    let mut combo = prefix.clone();
                    combo.push(glyph.clone());
                    combo
                })
            })
            .collect()
    })
}

/// The size shared by all lock-step lists.
///
/// On mismatch returns the indices of the first list and the first list
/// that disagrees with it.
pub(crate) fn lockstep_len<I>(sizes: I) -> Result<usize, (usize, usize)>
where
    I: IntoIterator<Item = usize>,
{
    let mut iter = sizes.into_iter().enumerate();
    let Some((_, first)) = iter.next() else {
        return Ok(0);
    };
    for (idx, size) in iter {
        if size != first {
            return Err((0, idx));
        }
    }
    Ok(first)
}

/// Like [`lockstep_len`], but single-glyph lists repeat to fit the others.
///
/// On mismatch returns the two disagreeing sizes.
pub(crate) fn broadcast_len<I>(sizes: I) -> Result<usize, (usize, usize)>
where
    I: IntoIterator<Item = usize>,
{
    let mut len = 1;
    for size in sizes {
        if size == 1 || size == len {
            continue;
        }
        if len == 1 {
            len = size;
        } else {
            return Err((len, size));
        }
    }
    Ok(len)
}

/// The `index`-th glyph of every position; single-glyph positions repeat.
pub(crate) fn column(positions: &[Vec<String>], index: usize) -> Vec<String> {
    positions
        .iter()
        .map(|glyphs| {
            if glyphs.len() == 1 {
                glyphs[0].clone()
            } else {
                glyphs[index].clone()
            }
        })
        .collect()
}
