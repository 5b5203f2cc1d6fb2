//! Public interface: compiling a delivered parse graph into an immutable
//! pattern, and matching with it.

use crate::cnfa::{Cnfa, Lacon};
use crate::colormap::{Color, RuntimeColorMap};
use crate::dfa::Dfa;
use crate::error::CompileError;
use crate::graph::Nfa;
use crate::subre::{LaconSpec, Subre};
use crate::transform::{self, Transformer};
use log::debug;

/// Options fixed at compile time.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// The color the class builder assigned to the newline character, if any.
    pub newline: Option<Color>,
    /// Make line boundaries also fire around newline characters. Requires
    /// `newline`.
    pub newline_anchoring: bool,
}

/// Options chosen per match call.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    /// The scan window's first offset is not a line beginning.
    pub not_bol: bool,
    /// The end of the text is not a line end.
    pub not_eol: bool,
}

/// A successful shortest-preferred match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortestMatch {
    /// One past the last matched character.
    pub end: usize,
    /// Latest offset at which the scan had still made no progress: where the
    /// match really starts, even when it is zero-width.
    pub cold_start: usize,
}

/// The compiled, immutable form of a pattern. Freely sharable; every match
/// attempt builds its own transient scratch state.
#[derive(Debug)]
pub struct CompiledPattern {
    search: Cnfa,
    tree: Subre,
    lacons: Vec<Lacon>,
    cm: RuntimeColorMap,
    ntree: u32,
}

/// Compile a delivered parse graph.
///
/// The front end hands over the subexpression `tree` rooted over the whole
/// pattern, the shared `graph` it populated, and the pattern's lookahead
/// constraints in gate-index order. The graph is consumed: it doubles as the
/// workspace for search conversion.
pub fn compile(
    mut tree: Subre,
    mut graph: Nfa,
    lacons: Vec<LaconSpec>,
    cm: RuntimeColorMap,
    opts: &CompileOptions,
) -> Result<CompiledPattern, CompileError> {
    if opts.newline_anchoring && opts.newline.is_none() {
        return Err(CompileError::InvalidOptions(
            "newline anchoring requires a newline color",
        ));
    }

    let xf = Transformer {
        opts,
        nlacons: lacons.len() as u32,
    };

    let ntree = transform::number_tree(&mut tree, 1);
    transform::mark_in_use(&mut tree);
    debug!(
        "compile: {} tree nodes, {} lookahead constraints",
        ntree - 1,
        lacons.len()
    );

    // Children before parents; every in-use node gets its own automaton, the
    // root's covering the whole pattern.
    xf.compact_tree(&graph, &mut tree)?;

    let mut compiled_lacons = Vec::with_capacity(lacons.len());
    for gate in &lacons {
        compiled_lacons.push(Lacon {
            positive: gate.positive,
            cnfa: xf.compact_fragment(&graph, gate.begin, gate.end)?,
        });
    }

    // Every fragment has been copied out; the main graph can now be turned
    // into the search automaton in place.
    xf.optimize(&mut graph)?;
    xf.make_searchable(&mut graph);
    let search = xf.compact(&graph)?;

    Ok(CompiledPattern {
        search,
        tree,
        lacons: compiled_lacons,
        cm,
        ntree,
    })
}

impl CompiledPattern {
    /// Longest-preferred match over `text[start..stop]`: the greatest offset
    /// at which some match starting at or after `start` can end, or None.
    ///
    /// Offsets are in characters. Panics if the window is out of range.
    pub fn longest_match(
        &self,
        text: &[char],
        start: usize,
        stop: usize,
        opts: MatchOptions,
    ) -> Option<usize> {
        assert!(
            start <= stop && stop <= text.len(),
            "match window out of range"
        );
        Dfa::new(&self.search, &self.cm, &self.lacons, text, opts).longest(start, stop)
    }

    /// Shortest-preferred match whose end falls in `min..=max`, together with
    /// its cold start. Panics if the window is out of range.
    pub fn shortest_match(
        &self,
        text: &[char],
        start: usize,
        min: usize,
        max: usize,
        opts: MatchOptions,
    ) -> Option<ShortestMatch> {
        assert!(
            start <= min && min <= max && max <= text.len(),
            "match window out of range"
        );
        Dfa::new(&self.search, &self.cm, &self.lacons, text, opts).shortest(start, min, max)
    }

    /// The search automaton covering the whole pattern.
    pub fn search_cnfa(&self) -> &Cnfa {
        &self.search
    }

    /// The numbered subexpression tree, per-node automata attached.
    pub fn tree(&self) -> &Subre {
        &self.tree
    }

    /// Compiled lookahead constraints, in gate-index order.
    pub fn lacons(&self) -> &[Lacon] {
        &self.lacons
    }

    pub fn color_map(&self) -> &RuntimeColorMap {
        &self.cm
    }

    /// One past the highest retry index in the tree.
    pub fn ntree(&self) -> u32 {
        self.ntree
    }

    /// Whether the pattern as a whole prefers shortest matches.
    pub fn prefers_shortest(&self) -> bool {
        self.tree.prefers_shortest()
    }
}
