//! Runtime character-to-color lookup.
//!
//! A color names an equivalence class of characters: every character of one
//! color takes exactly the same transitions in a given automaton, so the
//! runtime never works in characters, only in colors. The partitioning is the
//! front end's business; this module consumes it as a finished, immutable
//! artifact.

use std::ops::RangeInclusive;

/// A color is a small non-negative integer.
pub type Color = u16;

/// Sentinel for "no color at all"; terminates packed arc lists.
pub const COLORLESS: Color = Color::MAX;

/// The color of every character no class has claimed.
pub const WHITE: Color = 0;

/// Extent of the flat lookup table. Characters beyond it are WHITE.
const TABLE_LIMIT: usize = 0x1_0000;

/// Immutable, sharable color map: a fully populated table from characters to
/// colors. The obvious flat array, trading space for O(1) lookup.
#[derive(Debug, Clone)]
pub struct RuntimeColorMap {
    ncolors: Color,
    table: Box<[Color]>,
}

impl RuntimeColorMap {
    /// Construct from a finished table. `table` may be shorter than the full
    /// character domain; characters beyond it are WHITE.
    pub fn new(ncolors: Color, table: Vec<Color>) -> RuntimeColorMap {
        assert!(ncolors > WHITE, "WHITE must exist");
        assert!(table.len() <= TABLE_LIMIT);
        debug_assert!(table.iter().all(|&co| co < ncolors));
        RuntimeColorMap {
            ncolors,
            table: table.into_boxed_slice(),
        }
    }

    /// Construct from character classes. Every listed range gets the paired
    /// color; everything else stays WHITE. The color count is one past the
    /// largest color mentioned.
    pub fn from_classes(classes: &[(RangeInclusive<char>, Color)]) -> RuntimeColorMap {
        let mut table = vec![WHITE; TABLE_LIMIT];
        let mut max = WHITE;
        for (range, co) in classes {
            debug_assert_ne!(*co, COLORLESS);
            max = max.max(*co);
            for c in range.clone() {
                let idx = c as usize;
                if idx < TABLE_LIMIT {
                    table[idx] = *co;
                }
            }
        }
        RuntimeColorMap {
            ncolors: max + 1,
            table: table.into_boxed_slice(),
        }
    }

    /// The color of one character.
    #[inline]
    pub fn color_of(&self, c: char) -> Color {
        self.table.get(c as usize).copied().unwrap_or(WHITE)
    }

    /// Number of character colors. Boundary and constraint pseudo-colors sit
    /// above these and never appear in the table.
    #[inline]
    pub fn ncolors(&self) -> Color {
        self.ncolors
    }
}
