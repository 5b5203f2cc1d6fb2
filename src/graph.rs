//! The mutable NFA graph used during compilation.
//!
//! States live in an arena indexed by `StateNo`; arcs are (kind, from, to)
//! triples mirrored in per-state out- and in-lists. The graph never holds two
//! identical arcs: insertion is suppressed by a set lookup, and every arc
//! primitive in the transformer relies on that. All of this is compile-time
//! scaffolding; nothing here survives into the compact runtime form.

use crate::colormap::{Color, RuntimeColorMap};
use crate::error::CompileError;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::fmt;

/// Index of a state in its graph.
pub type StateNo = u32;

/// What an arc means. Plain arcs consume one character of the given color;
/// the rest are compile-time artifacts the optimizer resolves before
/// compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArcKind {
    /// No-op connector, eliminated by empty-arc removal.
    Empty,
    /// Consume one character of this color.
    Plain(Color),
    /// Begin-of-text (variant 0) or begin-of-line (variant 1) constraint.
    Begin(u8),
    /// End-of-text (variant 0) or end-of-line (variant 1) constraint.
    End(u8),
    /// Gate on a lookahead constraint, by index into the constraint list.
    Lacon(u32),
}

/// One arc of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arc {
    pub kind: ArcKind,
    pub from: StateNo,
    pub to: StateNo,
}

#[derive(Debug)]
struct StateData {
    outs: SmallVec<[Arc; 4]>,
    ins: SmallVec<[Arc; 4]>,
    alive: bool,
}

/// A graph under construction, over a fixed color space.
///
/// Every graph carries four scaffolding states. `pre` and `post` bracket the
/// pattern proper: `pre` reaches `init` over every character color plus both
/// begin-boundary constraints, and `fin` reaches `post` over every character
/// color plus both end-boundary constraints. The trailing rainbow means an
/// accepting position is observed while consuming the character after it; the
/// engine compensates when reporting.
#[derive(Debug)]
pub struct Nfa {
    states: Vec<StateData>,
    arcset: FxHashSet<Arc>,
    pre: StateNo,
    init: StateNo,
    fin: StateNo,
    post: StateNo,
    ncolors: Color,
    bos: [Color; 2],
    eos: [Color; 2],
}

impl Nfa {
    /// A fresh graph over `cm`'s color space, scaffolding in place. The front
    /// end builds the pattern between `init` and `fin`.
    pub fn new(cm: &RuntimeColorMap) -> Nfa {
        Nfa::with_ncolors(cm.ncolors())
    }

    /// A fresh graph over the same color space, for compacting one fragment
    /// in isolation.
    pub fn child(&self) -> Nfa {
        Nfa::with_ncolors(self.ncolors)
    }

    fn with_ncolors(ncolors: Color) -> Nfa {
        let mut nfa = Nfa {
            states: Vec::new(),
            arcset: FxHashSet::default(),
            pre: 0,
            init: 0,
            fin: 0,
            post: 0,
            ncolors,
            bos: [0; 2],
            eos: [0; 2],
        };
        nfa.assign_special_colors();
        nfa.pre = nfa.new_state();
        nfa.init = nfa.new_state();
        nfa.fin = nfa.new_state();
        nfa.post = nfa.new_state();
        nfa.scaffold();
        nfa
    }

    /// Bind the four boundary pseudo-colors just above the character colors.
    fn assign_special_colors(&mut self) {
        self.bos = [self.ncolors, self.ncolors + 1];
        self.eos = [self.ncolors + 2, self.ncolors + 3];
    }

    fn scaffold(&mut self) {
        let (pre, init, fin, post) = (self.pre, self.init, self.fin, self.post);
        self.rainbow(pre, init);
        self.new_arc(ArcKind::Begin(0), pre, init);
        self.new_arc(ArcKind::Begin(1), pre, init);
        self.rainbow(fin, post);
        self.new_arc(ArcKind::End(0), fin, post);
        self.new_arc(ArcKind::End(1), fin, post);
    }

    pub fn pre(&self) -> StateNo {
        self.pre
    }

    pub fn init(&self) -> StateNo {
        self.init
    }

    pub fn fin(&self) -> StateNo {
        self.fin
    }

    pub fn post(&self) -> StateNo {
        self.post
    }

    /// Number of character colors.
    pub fn ncolors(&self) -> Color {
        self.ncolors
    }

    /// Character colors plus the four boundary pseudo-colors.
    pub fn total_colors(&self) -> Color {
        self.eos[1] + 1
    }

    pub fn bos(&self) -> [Color; 2] {
        self.bos
    }

    pub fn eos(&self) -> [Color; 2] {
        self.eos
    }

    /// Allocate a fresh state.
    pub fn new_state(&mut self) -> StateNo {
        let no = self.states.len() as StateNo;
        self.states.push(StateData {
            outs: SmallVec::new(),
            ins: SmallVec::new(),
            alive: true,
        });
        no
    }

    /// Free a state and every arc touching it.
    pub fn drop_state(&mut self, s: StateNo) {
        debug_assert!(s != self.pre && s != self.post);
        for a in self.outs(s).to_vec() {
            self.free_arc(a);
        }
        for a in self.ins(s).to_vec() {
            self.free_arc(a);
        }
        self.states[s as usize].alive = false;
    }

    pub fn is_alive(&self, s: StateNo) -> bool {
        self.states[s as usize].alive
    }

    /// All state indexes ever allocated, dead ones included.
    pub fn state_ids(&self) -> std::ops::Range<StateNo> {
        0..self.states.len() as StateNo
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Add an arc, suppressing exact duplicates. Returns whether the arc is
    /// new.
    pub fn new_arc(&mut self, kind: ArcKind, from: StateNo, to: StateNo) -> bool {
        debug_assert!(self.is_alive(from) && self.is_alive(to));
        let arc = Arc { kind, from, to };
        if !self.arcset.insert(arc) {
            return false;
        }
        self.states[from as usize].outs.push(arc);
        self.states[to as usize].ins.push(arc);
        true
    }

    pub fn new_empty_arc(&mut self, from: StateNo, to: StateNo) -> bool {
        self.new_arc(ArcKind::Empty, from, to)
    }

    /// Remove an arc from both endpoint lists. Removing an absent arc is a
    /// no-op.
    pub fn free_arc(&mut self, arc: Arc) {
        if !self.arcset.remove(&arc) {
            return;
        }
        self.states[arc.from as usize].outs.retain(|a| *a != arc);
        self.states[arc.to as usize].ins.retain(|a| *a != arc);
    }

    /// Out-arcs of `s`, in insertion order.
    pub fn outs(&self, s: StateNo) -> &[Arc] {
        &self.states[s as usize].outs
    }

    /// In-arcs of `s`, in insertion order.
    pub fn ins(&self, s: StateNo) -> &[Arc] {
        &self.states[s as usize].ins
    }

    /// One plain arc per character color.
    pub fn rainbow(&mut self, from: StateNo, to: StateNo) {
        for co in 0..self.ncolors {
            self.new_arc(ArcKind::Plain(co), from, to);
        }
    }

    /// Duplicate the fragment between `entry` and `exit` of `src` into this
    /// graph, with `new_entry` and `new_exit` standing in for the boundaries.
    /// The fragment must not touch `src`'s scaffolding endpoints.
    pub fn dup_fragment(
        &mut self,
        src: &Nfa,
        entry: StateNo,
        exit: StateNo,
        new_entry: StateNo,
        new_exit: StateNo,
    ) -> Result<(), CompileError> {
        if entry == exit {
            self.new_empty_arc(new_entry, new_exit);
            return Ok(());
        }
        let mut map: Vec<Option<StateNo>> = vec![None; src.state_count()];
        map[entry as usize] = Some(new_entry);
        map[exit as usize] = Some(new_exit);
        let mut stack = vec![(entry, new_entry)];
        while let Some((s, d)) = stack.pop() {
            for a in src.outs(s).to_vec() {
                if a.to == src.pre() || a.to == src.post() {
                    return Err(CompileError::Structural(
                        "fragment escapes its boundary states",
                    ));
                }
                let to = if let Some(t) = map[a.to as usize] {
                    t
                } else {
                    let t = self.new_state();
                    map[a.to as usize] = Some(t);
                    stack.push((a.to, t));
                    t
                };
                self.new_arc(a.kind, d, to);
            }
        }
        Ok(())
    }
}

impl fmt::Display for ArcKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArcKind::Empty => write!(f, "eps"),
            ArcKind::Plain(co) => write!(f, "[{}]", co),
            ArcKind::Begin(v) => write!(f, "^{}", v),
            ArcKind::End(v) => write!(f, "${}", v),
            ArcKind::Lacon(ix) => write!(f, "la{}", ix),
        }
    }
}

impl fmt::Display for Nfa {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "nfa: pre {}, init {}, fin {}, post {}",
            self.pre, self.init, self.fin, self.post
        )?;
        for s in self.state_ids() {
            if !self.is_alive(s) {
                continue;
            }
            write!(f, "  {}:", s)?;
            for a in self.outs(s) {
                write!(f, " {}->{}", a.kind, a.to)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::RuntimeColorMap;

    fn two_color_nfa() -> Nfa {
        Nfa::new(&RuntimeColorMap::from_classes(&[('a'..='a', 1)]))
    }

    #[test]
    fn duplicate_arcs_are_suppressed() {
        let mut nfa = two_color_nfa();
        let (init, fin) = (nfa.init(), nfa.fin());
        assert!(nfa.new_arc(ArcKind::Plain(1), init, fin));
        assert!(!nfa.new_arc(ArcKind::Plain(1), init, fin));
        assert_eq!(nfa.outs(init).len(), 1);
        assert_eq!(nfa.ins(fin).len(), 1);
    }

    #[test]
    fn free_arc_clears_both_sides() {
        let mut nfa = two_color_nfa();
        let (init, fin) = (nfa.init(), nfa.fin());
        nfa.new_arc(ArcKind::Plain(1), init, fin);
        let arc = nfa.outs(init)[0];
        nfa.free_arc(arc);
        assert!(nfa.outs(init).is_empty());
        assert!(nfa.ins(fin).is_empty());
        // Freeing again is harmless.
        nfa.free_arc(arc);
    }

    #[test]
    fn scaffolding_brackets_the_fragment() {
        let nfa = two_color_nfa();
        // Rainbow plus two begin constraints at the front.
        assert_eq!(nfa.outs(nfa.pre()).len(), nfa.ncolors() as usize + 2);
        assert_eq!(nfa.ins(nfa.post()).len(), nfa.ncolors() as usize + 2);
        assert_eq!(nfa.total_colors(), nfa.ncolors() + 4);
    }

    #[test]
    fn dup_fragment_copies_loops() {
        let mut src = two_color_nfa();
        let (init, fin) = (src.init(), src.fin());
        let s = src.new_state();
        src.new_arc(ArcKind::Plain(1), init, s);
        src.new_arc(ArcKind::Plain(1), s, s);
        src.new_arc(ArcKind::Empty, s, fin);

        let mut dst = src.child();
        let (dinit, dfin) = (dst.init(), dst.fin());
        dst.dup_fragment(&src, init, fin, dinit, dfin).unwrap();
        let mid = dst.outs(dinit)[0].to;
        assert!(dst.outs(mid).contains(&Arc {
            kind: ArcKind::Plain(1),
            from: mid,
            to: mid
        }));
        assert!(dst.outs(mid).contains(&Arc {
            kind: ArcKind::Empty,
            from: mid,
            to: dfin
        }));
    }

    #[test]
    fn dup_fragment_rejects_escapes() {
        let mut src = two_color_nfa();
        let (init, post) = (src.init(), src.post());
        src.new_arc(ArcKind::Plain(1), init, post);
        let mut dst = src.child();
        let (dinit, dfin) = (dst.init(), dst.fin());
        let err = dst
            .dup_fragment(&src, init, src.fin(), dinit, dfin)
            .unwrap_err();
        assert!(matches!(err, CompileError::Structural(_)));
    }
}
