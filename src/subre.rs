//! Subexpression tree nodes delivered by the front end.
//!
//! The tree mirrors the pattern's structure over the shared graph: each node
//! names the boundary states of its fragment. Compilation numbers the nodes
//! and attaches a compact automaton to every one, so that a capture-resolving
//! outer pass can re-match any subexpression in isolation.

use crate::cnfa::Cnfa;
use crate::graph::StateNo;

/// Operator of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubreOp {
    /// Alternation of the left child with the rest of the chain on the right.
    Alt,
    /// Concatenation with capture-relevant substructure in the children.
    Concat,
    /// A plain fragment with no interesting innards.
    Plain,
    /// A capturing group around the left child.
    Capture,
    /// A back reference.
    Backref,
}

/// One node of the subexpression tree.
///
/// The front end wires `begin` and `end` to the fragment's boundary states in
/// the shared graph; compilation fills `retry` and `cnfa`.
#[derive(Debug)]
pub struct Subre {
    pub op: SubreOp,
    pub flags: u8,
    /// Resume index assigned by pre-order numbering.
    pub retry: u32,
    pub begin: StateNo,
    pub end: StateNo,
    pub left: Option<Box<Subre>>,
    pub right: Option<Box<Subre>>,
    /// Compact automaton for this node's fragment, filled by compilation.
    pub cnfa: Option<Cnfa>,
}

impl Subre {
    /// Prefers the longest match.
    pub const LONGER: u8 = 0x01;
    /// Prefers the shortest match.
    pub const SHORTER: u8 = 0x02;
    /// Both preferences occur somewhere below.
    pub const MIXED: u8 = 0x04;
    /// Capturing parentheses somewhere below.
    pub const CAP: u8 = 0x08;
    /// A back reference somewhere below.
    pub const BACKR: u8 = 0x10;
    /// Reachable from the tree root.
    pub const INUSE: u8 = 0x20;

    pub fn new(op: SubreOp, flags: u8, begin: StateNo, end: StateNo) -> Subre {
        Subre {
            op,
            flags,
            retry: 0,
            begin,
            end,
            left: None,
            right: None,
            cnfa: None,
        }
    }

    pub fn prefers_shortest(&self) -> bool {
        self.flags & Subre::SHORTER != 0
    }

    pub fn in_use(&self) -> bool {
        self.flags & Subre::INUSE != 0
    }
}

/// A lookahead constraint as delivered by the front end: its sign plus the
/// constraint sub-pattern's boundary states in the shared graph.
#[derive(Debug, Clone, Copy)]
pub struct LaconSpec {
    pub positive: bool,
    pub begin: StateNo,
    pub end: StateNo,
}
