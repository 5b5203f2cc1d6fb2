#![allow(clippy::uninlined_format_args)]
#![allow(dead_code)]

//! Shared helpers standing in for the excluded front end: they wire trees and
//! graphs through the same interface a parser would, and wrap matching in
//! fluent assertions.

use tinct::transform::moveins;
use tinct::{
    compile, ArcKind, Color, CompileOptions, CompiledPattern, LaconSpec, MatchOptions, Nfa,
    RuntimeColorMap, ShortestMatch, StateNo, Subre, SubreOp,
};

/// The color word characters get in `word_colormap`.
pub const WORD: Color = 1;

/// Word characters (letters, digits, underscore) in one color; everything
/// else WHITE.
pub fn word_colormap() -> RuntimeColorMap {
    RuntimeColorMap::from_classes(&[
        ('0'..='9', WORD),
        ('A'..='Z', WORD),
        ('_'..='_', WORD),
        ('a'..='z', WORD),
    ])
}

/// Each distinct character of `alphabet` in its own color, 1-based in order.
pub fn literal_colormap(alphabet: &str) -> RuntimeColorMap {
    let classes: Vec<_> = alphabet
        .chars()
        .enumerate()
        .map(|(i, c)| (c..=c, (i + 1) as Color))
        .collect();
    RuntimeColorMap::from_classes(&classes)
}

pub fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

/// Builds a pattern the way a parser would: fragments wired into the shared
/// graph between `init` and `fin`, lookahead constraints registered in gate
/// order.
pub struct PatternBuilder {
    pub cm: RuntimeColorMap,
    pub nfa: Nfa,
    pub lacons: Vec<LaconSpec>,
}

impl PatternBuilder {
    pub fn new(cm: RuntimeColorMap) -> PatternBuilder {
        let nfa = Nfa::new(&cm);
        PatternBuilder {
            cm,
            nfa,
            lacons: Vec::new(),
        }
    }

    pub fn color(&self, c: char) -> Color {
        self.cm.color_of(c)
    }

    /// One plain arc for the color of `c`.
    pub fn plain(&mut self, from: StateNo, c: char, to: StateNo) {
        let co = self.color(c);
        self.nfa.new_arc(ArcKind::Plain(co), from, to);
    }

    /// A chain of plain arcs spelling `text`, through fresh states.
    pub fn literal(&mut self, from: StateNo, text: &str, to: StateNo) {
        let mut cur = from;
        let n = text.chars().count();
        for (i, c) in text.chars().enumerate() {
            let next = if i + 1 == n { to } else { self.nfa.new_state() };
            self.plain(cur, c, next);
            cur = next;
        }
    }

    /// One-or-more repetitions of one color between `from` and `to`.
    pub fn plus(&mut self, from: StateNo, co: Color, to: StateNo) {
        let s = self.nfa.new_state();
        self.nfa.new_arc(ArcKind::Plain(co), from, s);
        self.nfa.new_arc(ArcKind::Plain(co), s, s);
        self.nfa.new_empty_arc(s, to);
    }

    /// Zero-or-more repetitions of one color between `from` and `to`.
    pub fn star(&mut self, from: StateNo, co: Color, to: StateNo) {
        self.plus(from, co, to);
        self.nfa.new_empty_arc(from, to);
    }

    /// A begin boundary: the line variant, plus the text variant when
    /// `strict` (the `\A` form, immune to the not-bol option).
    pub fn anchor_begin(&mut self, from: StateNo, to: StateNo, strict: bool) {
        self.nfa.new_arc(ArcKind::Begin(1), from, to);
        if strict {
            self.nfa.new_arc(ArcKind::Begin(0), from, to);
        }
    }

    /// An end boundary, mirror of `anchor_begin`.
    pub fn anchor_end(&mut self, from: StateNo, to: StateNo, strict: bool) {
        self.nfa.new_arc(ArcKind::End(1), from, to);
        if strict {
            self.nfa.new_arc(ArcKind::End(0), from, to);
        }
    }

    /// Register a lookahead constraint over a detached fragment and return
    /// its gate index.
    pub fn lacon(&mut self, positive: bool, begin: StateNo, end: StateNo) -> u32 {
        let ix = self.lacons.len() as u32;
        self.lacons.push(LaconSpec {
            positive,
            begin,
            end,
        });
        ix
    }

    /// Gate an edge on a registered constraint.
    pub fn lacon_gate(&mut self, from: StateNo, ix: u32, to: StateNo) {
        self.nfa.new_arc(ArcKind::Lacon(ix), from, to);
    }

    /// A detached state pair to hold a constraint sub-pattern.
    pub fn fragment(&mut self) -> (StateNo, StateNo) {
        (self.nfa.new_state(), self.nfa.new_state())
    }

    /// Start a concatenation the way a parser does: everything built so far
    /// keeps `fin` as its right boundary, so rehang those arcs on a fresh
    /// state and continue from it.
    pub fn begin_concat(&mut self) -> StateNo {
        let fin = self.nfa.fin();
        let lp = self.nfa.new_state();
        moveins(&mut self.nfa, fin, lp);
        lp
    }

    /// A single leaf node covering the whole pattern.
    pub fn leaf_tree(&self) -> Subre {
        Subre::new(
            SubreOp::Plain,
            Subre::LONGER,
            self.nfa.init(),
            self.nfa.fin(),
        )
    }

    #[track_caller]
    pub fn compile(self) -> TestPattern {
        self.compile_with(&CompileOptions::default())
    }

    #[track_caller]
    pub fn compile_with(self, opts: &CompileOptions) -> TestPattern {
        let tree = self.leaf_tree();
        self.compile_tree(tree, opts)
    }

    #[track_caller]
    pub fn compile_tree(self, tree: Subre, opts: &CompileOptions) -> TestPattern {
        let p = compile(tree, self.nfa, self.lacons, self.cm, opts);
        assert!(p.is_ok(), "failed to compile: {}", p.unwrap_err());
        TestPattern { p: p.unwrap() }
    }
}

/// A compiled pattern with fluent match assertions.
pub struct TestPattern {
    pub p: CompiledPattern,
}

impl TestPattern {
    pub fn longest(&self, input: &str) -> Option<usize> {
        let text = chars(input);
        let len = text.len();
        self.p.longest_match(&text, 0, len, MatchOptions::default())
    }

    pub fn longest_in(&self, input: &str, start: usize, stop: usize) -> Option<usize> {
        let text = chars(input);
        self.p.longest_match(&text, start, stop, MatchOptions::default())
    }

    pub fn longest_opt(&self, input: &str, opts: MatchOptions) -> Option<usize> {
        let text = chars(input);
        let len = text.len();
        self.p.longest_match(&text, 0, len, opts)
    }

    pub fn shortest(&self, input: &str) -> Option<ShortestMatch> {
        let text = chars(input);
        let len = text.len();
        self.p.shortest_match(&text, 0, 0, len, MatchOptions::default())
    }

    pub fn shortest_in(&self, input: &str, min: usize, max: usize) -> Option<ShortestMatch> {
        let text = chars(input);
        self.p.shortest_match(&text, 0, min, max, MatchOptions::default())
    }

    #[track_caller]
    pub fn test_longest(&self, input: &str, end: usize) {
        assert_eq!(
            self.longest(input),
            Some(end),
            "longest match on {:?}",
            input
        );
    }

    #[track_caller]
    pub fn test_no_match(&self, input: &str) {
        assert_eq!(self.longest(input), None, "should not match {:?}", input);
    }

    #[track_caller]
    pub fn test_shortest(&self, input: &str, end: usize, cold_start: usize) {
        assert_eq!(
            self.shortest(input),
            Some(ShortestMatch { end, cold_start }),
            "shortest match on {:?}",
            input
        );
    }
}
