//! Compile-time graph transformation.
//!
//! Arc surgery primitives, tree bookkeeping, the automaton optimizer that
//! resolves every non-plain arc, search conversion, and compaction into the
//! immutable runtime form. The primitives are public because a front end
//! building graphs needs the same duplicate-preserving surgery the optimizer
//! uses.

use crate::api::CompileOptions;
use crate::cnfa::{Carc, Cnfa, HASLACONS};
use crate::colormap::{Color, COLORLESS};
use crate::error::CompileError;
use crate::graph::{Arc, ArcKind, Nfa, StateNo};
use crate::subre::Subre;
use log::debug;

/// Allocate a new arc patterned on `template`, preserving duplicate
/// suppression.
pub fn cparc(nfa: &mut Nfa, template: Arc, from: StateNo, to: StateNo) {
    nfa.new_arc(template.kind, from, to);
}

/// Move all in-arcs of `old` onto `new`. Rebuilding through `new_arc` keeps
/// duplicate suppression intact, which editing arcs in place would not.
pub fn moveins(nfa: &mut Nfa, old: StateNo, new: StateNo) {
    debug_assert_ne!(old, new);
    for a in nfa.ins(old).to_vec() {
        cparc(nfa, a, a.from, new);
        nfa.free_arc(a);
    }
    debug_assert!(nfa.ins(old).is_empty());
}

/// Copy all in-arcs of `old` onto `new`.
pub fn copyins(nfa: &mut Nfa, old: StateNo, new: StateNo) {
    debug_assert_ne!(old, new);
    for a in nfa.ins(old).to_vec() {
        cparc(nfa, a, a.from, new);
    }
}

/// Move all out-arcs of `old` onto `new`.
pub fn moveouts(nfa: &mut Nfa, old: StateNo, new: StateNo) {
    debug_assert_ne!(old, new);
    for a in nfa.outs(old).to_vec() {
        cparc(nfa, a, new, a.to);
        nfa.free_arc(a);
    }
    debug_assert!(nfa.outs(old).is_empty());
}

/// Copy all out-arcs of `old` onto `new`.
pub fn copyouts(nfa: &mut Nfa, old: StateNo, new: StateNo) {
    debug_assert_ne!(old, new);
    for a in nfa.outs(old).to_vec() {
        cparc(nfa, a, new, a.to);
    }
}

/// Clone the out-set of `old` onto the pair (`from`, `to`), rewriting each
/// arc's kind through `retag`.
pub fn cloneouts(
    nfa: &mut Nfa,
    old: StateNo,
    from: StateNo,
    to: StateNo,
    retag: impl Fn(ArcKind) -> ArcKind,
) {
    debug_assert_ne!(old, from);
    for a in nfa.outs(old).to_vec() {
        nfa.new_arc(retag(a.kind), from, to);
    }
}

/// Find an arc of the given kind leaving `s`, if any.
pub fn findarc(nfa: &Nfa, s: StateNo, kind: ArcKind) -> Option<Arc> {
    nfa.outs(s).iter().copied().find(|a| a.kind == kind)
}

/// Number tree nodes pre-order, assigning retry indexes from `base`. Returns
/// the next unused index.
pub fn number_tree(t: &mut Subre, base: u32) -> u32 {
    let mut next = base;
    t.retry = next;
    next += 1;
    if let Some(l) = t.left.as_deref_mut() {
        next = number_tree(l, next);
    }
    if let Some(r) = t.right.as_deref_mut() {
        next = number_tree(r, next);
    }
    next
}

/// Mark every node reachable from the root as in use. Anything the front end
/// allocated but left unreachable stays unmarked and gets no automaton.
pub fn mark_in_use(t: &mut Subre) {
    t.flags |= Subre::INUSE;
    if let Some(l) = t.left.as_deref_mut() {
        mark_in_use(l);
    }
    if let Some(r) = t.right.as_deref_mut() {
        mark_in_use(r);
    }
}

/// Compile-session context for the transformation passes.
pub(crate) struct Transformer<'a> {
    pub opts: &'a CompileOptions,
    pub nlacons: u32,
}

impl<'a> Transformer<'a> {
    /// The newline color, when newline anchoring is in effect.
    fn newline_anchor_color(&self) -> Option<Color> {
        if self.opts.newline_anchoring {
            self.opts.newline
        } else {
            None
        }
    }

    /// Optimize a graph in place: eliminate empty arcs, resolve boundary
    /// constraints into boundary-colored arcs at the scaffolding endpoints,
    /// and prune states that cannot take part in any match.
    pub fn optimize(&self, nfa: &mut Nfa) -> Result<(), CompileError> {
        self.fix_empties(nfa)?;
        self.pull_back(nfa)?;
        self.push_fwd(nfa)?;
        self.cleanup(nfa);
        Ok(())
    }

    /// Eliminate empty arcs: give each state the non-empty out-arcs of its
    /// entire empty-closure, then drop every empty arc at once.
    fn fix_empties(&self, nfa: &mut Nfa) -> Result<(), CompileError> {
        let post = nfa.post();
        for s in nfa.state_ids() {
            if !nfa.is_alive(s) {
                continue;
            }
            let mut seen = vec![false; nfa.state_count()];
            seen[s as usize] = true;
            let mut stack: Vec<StateNo> = nfa
                .outs(s)
                .iter()
                .filter(|a| a.kind == ArcKind::Empty)
                .map(|a| a.to)
                .collect();
            while let Some(t) = stack.pop() {
                if seen[t as usize] {
                    continue;
                }
                seen[t as usize] = true;
                if t == post {
                    return Err(CompileError::Structural(
                        "empty arc into the accepting boundary state",
                    ));
                }
                for a in nfa.outs(t).to_vec() {
                    if a.kind == ArcKind::Empty {
                        stack.push(a.to);
                    } else {
                        cparc(nfa, a, s, a.to);
                    }
                }
            }
        }
        for s in nfa.state_ids() {
            for a in nfa.outs(s).to_vec() {
                if a.kind == ArcKind::Empty {
                    nfa.free_arc(a);
                }
            }
        }
        Ok(())
    }

    /// Pull begin-boundary constraints back toward `pre`, then convert them
    /// into plain arcs on the begin boundary colors.
    ///
    /// A constraint arc away from `pre` is rerouted through its source's
    /// in-arcs: a matching constraint passes through, a newline (under
    /// newline anchoring, line variant only) passes through, anything else
    /// kills that path, since a position after any other consumed character
    /// cannot be a begin boundary.
    fn pull_back(&self, nfa: &mut Nfa) -> Result<(), CompileError> {
        let nl = self.newline_anchor_color();
        let cap = nfa.state_count() + 8;
        for _ in 0..cap {
            let mut progress = false;
            for s in nfa.state_ids() {
                if s == nfa.pre() || !nfa.is_alive(s) {
                    continue;
                }
                for a in nfa.outs(s).to_vec() {
                    let v = match a.kind {
                        ArcKind::Begin(v) => v,
                        _ => continue,
                    };
                    if a.to != s {
                        for b in nfa.ins(s).to_vec() {
                            if b.from == s {
                                continue;
                            }
                            match b.kind {
                                ArcKind::Begin(w) if w == v => {
                                    nfa.new_arc(ArcKind::Begin(v), b.from, a.to);
                                }
                                ArcKind::Plain(c) if v == 1 && Some(c) == nl => {
                                    nfa.new_arc(ArcKind::Plain(c), b.from, a.to);
                                }
                                ArcKind::Lacon(_) => {
                                    return Err(CompileError::Structural(
                                        "begin boundary behind a lookahead gate",
                                    ));
                                }
                                _ => {}
                            }
                        }
                    }
                    nfa.free_arc(a);
                    progress = true;
                }
            }
            if !progress {
                break;
            }
        }
        // At pre the constraint becomes an ordinary boundary-colored arc.
        let pre = nfa.pre();
        for a in nfa.outs(pre).to_vec() {
            if let ArcKind::Begin(v) = a.kind {
                let co = nfa.bos()[v as usize];
                nfa.new_arc(ArcKind::Plain(co), pre, a.to);
                if v == 1 {
                    if let Some(c) = nl {
                        nfa.new_arc(ArcKind::Plain(c), pre, a.to);
                    }
                }
                nfa.free_arc(a);
            }
        }
        Ok(())
    }

    /// Push end-boundary constraints forward toward `post`, mirror of
    /// `pull_back`.
    fn push_fwd(&self, nfa: &mut Nfa) -> Result<(), CompileError> {
        let nl = self.newline_anchor_color();
        let cap = nfa.state_count() + 8;
        for _ in 0..cap {
            let mut progress = false;
            for t in nfa.state_ids() {
                if t == nfa.post() || !nfa.is_alive(t) {
                    continue;
                }
                for a in nfa.ins(t).to_vec() {
                    let v = match a.kind {
                        ArcKind::End(v) => v,
                        _ => continue,
                    };
                    if a.from != t {
                        for c in nfa.outs(t).to_vec() {
                            if c.to == t {
                                continue;
                            }
                            match c.kind {
                                ArcKind::End(w) if w == v => {
                                    nfa.new_arc(ArcKind::End(v), a.from, c.to);
                                }
                                ArcKind::Plain(cc) if v == 1 && Some(cc) == nl => {
                                    nfa.new_arc(ArcKind::Plain(cc), a.from, c.to);
                                }
                                ArcKind::Lacon(_) => {
                                    return Err(CompileError::Structural(
                                        "end boundary before a lookahead gate",
                                    ));
                                }
                                _ => {}
                            }
                        }
                    }
                    nfa.free_arc(a);
                    progress = true;
                }
            }
            if !progress {
                break;
            }
        }
        let post = nfa.post();
        for a in nfa.ins(post).to_vec() {
            if let ArcKind::End(v) = a.kind {
                let co = nfa.eos()[v as usize];
                nfa.new_arc(ArcKind::Plain(co), a.from, post);
                if v == 1 {
                    if let Some(c) = nl {
                        nfa.new_arc(ArcKind::Plain(c), a.from, post);
                    }
                }
                nfa.free_arc(a);
            }
        }
        Ok(())
    }

    /// Drop states that are unreachable from `pre` or cannot reach `post`.
    /// The endpoints themselves always stay.
    fn cleanup(&self, nfa: &mut Nfa) {
        let n = nfa.state_count();
        let mut fwd = vec![false; n];
        let mut stack = vec![nfa.pre()];
        fwd[nfa.pre() as usize] = true;
        while let Some(s) = stack.pop() {
            for a in nfa.outs(s) {
                if !fwd[a.to as usize] {
                    fwd[a.to as usize] = true;
                    stack.push(a.to);
                }
            }
        }
        let mut bwd = vec![false; n];
        let mut stack = vec![nfa.post()];
        bwd[nfa.post() as usize] = true;
        while let Some(s) = stack.pop() {
            for a in nfa.ins(s) {
                if !bwd[a.from as usize] {
                    bwd[a.from as usize] = true;
                    stack.push(a.from);
                }
            }
        }
        for s in nfa.state_ids() {
            if s == nfa.pre() || s == nfa.post() || !nfa.is_alive(s) {
                continue;
            }
            if !(fwd[s as usize] && bwd[s as usize]) {
                nfa.drop_state(s);
            }
        }
    }

    /// Convert an optimized graph into a search graph.
    ///
    /// Unless the pattern is anchored, `pre` gets a self-loop over every
    /// character and begin-boundary color, an implicit unanchored prefix.
    /// Then every entry successor that can be re-entered after consuming
    /// characters is split into a progress and a no-progress twin, so that
    /// "no characters consumed yet" stays decidable per state.
    pub fn make_searchable(&self, nfa: &mut Nfa) {
        let pre = nfa.pre();
        let bos = nfa.bos();
        let anchored = nfa.outs(pre).iter().all(|a| {
            debug_assert!(matches!(a.kind, ArcKind::Plain(_)));
            matches!(a.kind, ArcKind::Plain(co) if co == bos[0] || co == bos[1])
        });
        if anchored {
            return;
        }
        nfa.rainbow(pre, pre);
        nfa.new_arc(ArcKind::Plain(bos[0]), pre, pre);
        nfa.new_arc(ArcKind::Plain(bos[1]), pre, pre);

        let mut to_split: Vec<StateNo> = Vec::new();
        for a in nfa.outs(pre) {
            let s = a.to;
            if to_split.contains(&s) {
                continue;
            }
            if nfa.ins(s).iter().any(|b| b.from != pre) {
                to_split.push(s);
            }
        }
        for &s in &to_split {
            let dup = nfa.new_state();
            copyouts(nfa, s, dup);
            // Snapshot after the copy so a copied self-loop is redirected too.
            for b in nfa.ins(s).to_vec() {
                if b.from != pre {
                    cparc(nfa, b, b.from, dup);
                    nfa.free_arc(b);
                }
            }
        }
        debug!("search conversion: {} entry splits", to_split.len());
    }

    /// Reduce an optimized graph to its immutable compact form. States are
    /// renumbered breadth-first from `pre` in arc insertion order, which
    /// makes the result a pure function of the input graph.
    pub fn compact(&self, nfa: &Nfa) -> Result<Cnfa, CompileError> {
        let total = nfa.total_colors();
        let mut map: Vec<Option<u32>> = vec![None; nfa.state_count()];
        let mut order: Vec<StateNo> = vec![nfa.pre()];
        map[nfa.pre() as usize] = Some(0);
        let mut i = 0;
        while i < order.len() {
            let s = order[i];
            i += 1;
            for a in nfa.outs(s) {
                if map[a.to as usize].is_none() {
                    map[a.to as usize] = Some(order.len() as u32);
                    order.push(a.to);
                }
            }
        }
        let post = match map[nfa.post() as usize] {
            Some(t) => t,
            None => {
                // The pattern can never match; keep a well-formed accept
                // state anyway.
                let t = order.len() as u32;
                map[nfa.post() as usize] = Some(t);
                order.push(nfa.post());
                t
            }
        };

        let mut states: Vec<u32> = Vec::with_capacity(order.len());
        let mut arcs: Vec<Carc> = Vec::new();
        let mut flags = 0u8;
        for &s in &order {
            states.push(arcs.len() as u32);
            for a in nfa.outs(s) {
                let target = match map[a.to as usize] {
                    Some(t) => t,
                    None => return Err(CompileError::Structural("arc into an unmapped state")),
                };
                let co = match a.kind {
                    ArcKind::Plain(co) => co,
                    ArcKind::Lacon(ix) => {
                        if ix >= self.nlacons {
                            return Err(CompileError::Structural(
                                "lookahead constraint index out of range",
                            ));
                        }
                        let co = u32::from(total) + ix;
                        if co >= u32::from(COLORLESS) {
                            return Err(CompileError::Structural("color space exhausted"));
                        }
                        flags |= HASLACONS;
                        co as Color
                    }
                    _ => {
                        return Err(CompileError::Structural(
                            "unresolved constraint arc at compaction",
                        ))
                    }
                };
                arcs.push(Carc::pack(co, target));
            }
            arcs.push(Carc::pack(COLORLESS, 0));
        }

        // Progress is impossible at pre and at its direct successors.
        let mut noprogress = vec![false; order.len()];
        noprogress[0] = true;
        for a in nfa.outs(nfa.pre()) {
            if let Some(t) = map[a.to as usize] {
                noprogress[t as usize] = true;
            }
        }

        Ok(Cnfa {
            ncolors: total,
            flags,
            pre: 0,
            post,
            bos: nfa.bos(),
            eos: nfa.eos(),
            states: states.into_boxed_slice(),
            arcs: arcs.into_boxed_slice(),
            noprogress: noprogress.into_boxed_slice(),
        })
    }

    /// Compact every in-use tree node's fragment, children before parents.
    pub fn compact_tree(&self, nfa: &Nfa, t: &mut Subre) -> Result<(), CompileError> {
        if let Some(l) = t.left.as_deref_mut() {
            self.compact_tree(nfa, l)?;
        }
        if let Some(r) = t.right.as_deref_mut() {
            self.compact_tree(nfa, r)?;
        }
        if !t.in_use() {
            return Ok(());
        }
        debug!("compacting tree node {}", t.retry);
        t.cnfa = Some(self.compact_fragment(nfa, t.begin, t.end)?);
        Ok(())
    }

    /// Duplicate one fragment into an isolated graph, optimize it there, and
    /// compact it. The source graph is left untouched.
    pub(crate) fn compact_fragment(
        &self,
        nfa: &Nfa,
        begin: StateNo,
        end: StateNo,
    ) -> Result<Cnfa, CompileError> {
        if !nfa.is_alive(begin) || !nfa.is_alive(end) {
            return Err(CompileError::Structural("fragment boundary state missing"));
        }
        let mut work = nfa.child();
        let (init, fin) = (work.init(), work.fin());
        work.dup_fragment(nfa, begin, end, init, fin)?;
        self.optimize(&mut work)?;
        self.compact(&work)
    }
}
