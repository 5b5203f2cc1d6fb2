//! The immutable, compacted runtime automaton.
//!
//! Compaction flattens an optimized graph into one contiguous arc table plus
//! a per-state index into it. Nothing here is mutable after construction; a
//! compact automaton may be shared by any number of concurrent matches.

use crate::colormap::{Color, COLORLESS};
use std::fmt;

/// Flag bit: constraint pseudo-colors appear in the arc table.
pub const HASLACONS: u8 = 0x01;

/// One packed arc: color in the high half, target state in the low half.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Carc(u64);

impl Carc {
    #[inline]
    pub fn pack(color: Color, target: u32) -> Carc {
        Carc((u64::from(color) << 32) | u64::from(target))
    }

    #[inline]
    pub fn color(self) -> Color {
        ((self.0 >> 32) & 0xffff) as Color
    }

    #[inline]
    pub fn target(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Debug for Carc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.color() == COLORLESS {
            write!(f, "Carc(-)")
        } else {
            write!(f, "Carc({} -> {})", self.color(), self.target())
        }
    }
}

/// A compacted automaton.
///
/// States are renumbered densely with the entry state first. Each state's
/// out-arcs are a contiguous run in `arcs` starting at `states[s]` and ending
/// at the first COLORLESS entry. Colors `0..ncolors` are character and
/// boundary colors; with HASLACONS set, colors `ncolors..` select lookahead
/// constraints by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cnfa {
    pub(crate) ncolors: Color,
    pub(crate) flags: u8,
    pub(crate) pre: u32,
    pub(crate) post: u32,
    pub(crate) bos: [Color; 2],
    pub(crate) eos: [Color; 2],
    pub(crate) states: Box<[u32]>,
    pub(crate) arcs: Box<[Carc]>,
    pub(crate) noprogress: Box<[bool]>,
}

impl Cnfa {
    /// Number of states.
    pub fn nstates(&self) -> usize {
        self.states.len()
    }

    /// Number of non-constraint colors, boundary pseudo-colors included.
    pub fn ncolors(&self) -> Color {
        self.ncolors
    }

    /// The entry state (always 0 by construction).
    pub fn entry(&self) -> u32 {
        self.pre
    }

    /// The accepting state.
    pub fn accept(&self) -> u32 {
        self.post
    }

    /// Begin-boundary colors by variant.
    pub fn bos(&self) -> [Color; 2] {
        self.bos
    }

    /// End-boundary colors by variant.
    pub fn eos(&self) -> [Color; 2] {
        self.eos
    }

    pub fn has_lacons(&self) -> bool {
        self.flags & HASLACONS != 0
    }

    /// Whether passing through `s` can never have consumed a character.
    pub fn is_noprogress(&self, s: u32) -> bool {
        self.noprogress[s as usize]
    }

    /// The packed out-arcs of one state, terminator excluded.
    pub fn arcs_of(&self, s: u32) -> impl Iterator<Item = Carc> + '_ {
        let first = self.states[s as usize] as usize;
        self.arcs[first..]
            .iter()
            .copied()
            .take_while(|ca| ca.color() != COLORLESS)
    }
}

impl fmt::Display for Cnfa {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "cnfa: {} states, {} colors, pre {}, post {}{}",
            self.nstates(),
            self.ncolors,
            self.pre,
            self.post,
            if self.has_lacons() { ", lacons" } else { "" }
        )?;
        for s in 0..self.nstates() as u32 {
            write!(f, "  {}{}:", s, if self.is_noprogress(s) { "!" } else { "" })?;
            for ca in self.arcs_of(s) {
                write!(f, " [{}]->{}", ca.color(), ca.target())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A compiled lookahead constraint: its sign and its own compact automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lacon {
    pub positive: bool,
    pub cnfa: Cnfa,
}
