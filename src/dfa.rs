//! Lazy DFA engine: subset construction on demand over a compact automaton.
//!
//! One engine instance serves one match attempt. Deterministic state-sets
//! discovered during the scan are interned in a per-attempt arena and keyed
//! by their member bitset; nothing is shared or reused across attempts, so a
//! compiled pattern stays freely sharable. Lookahead constraints are resolved
//! by recursively running a fresh engine over the constraint's own automaton
//! at the current position.

use crate::api::{MatchOptions, ShortestMatch};
use crate::cnfa::{Cnfa, Lacon};
use crate::colormap::{Color, RuntimeColorMap};
use crate::util::DebugCheckIndex;
use bitvec::prelude::*;
use log::trace;
use rustc_hash::FxHashMap;

type SetId = u32;

const STARTER: u8 = 0x01;
const NOPROGRESS: u8 = 0x02;
const POSTSTATE: u8 = 0x04;

/// One node of the lazily built deterministic automaton.
#[derive(Debug)]
struct StateSet {
    /// Member states of the compact automaton.
    states: BitVec,
    flags: u8,
    /// Memoized successor per color.
    outs: Box<[Option<SetId>]>,
    /// Most recent scan offset at which this set was current.
    last_seen: Option<usize>,
}

impl StateSet {
    fn new(states: BitVec, flags: u8, ncolors: usize) -> StateSet {
        StateSet {
            states,
            flags,
            outs: vec![None; ncolors].into_boxed_slice(),
            last_seen: None,
        }
    }

    fn is_post(&self) -> bool {
        self.flags & POSTSTATE != 0
    }

    fn is_noprogress(&self) -> bool {
        self.flags & NOPROGRESS != 0
    }
}

/// The engine itself; owns the per-attempt state-set cache.
pub(crate) struct Dfa<'a> {
    cnfa: &'a Cnfa,
    cm: &'a RuntimeColorMap,
    lacons: &'a [Lacon],
    text: &'a [char],
    opts: MatchOptions,
    sets: Vec<StateSet>,
    cache: FxHashMap<BitVec, SetId>,
}

impl<'a> Dfa<'a> {
    pub fn new(
        cnfa: &'a Cnfa,
        cm: &'a RuntimeColorMap,
        lacons: &'a [Lacon],
        text: &'a [char],
        opts: MatchOptions,
    ) -> Dfa<'a> {
        Dfa {
            cnfa,
            cm,
            lacons,
            text,
            opts,
            sets: Vec::new(),
            cache: FxHashMap::default(),
        }
    }

    /// Fresh start set holding only the automaton's entry state.
    fn initialize(&mut self, start: usize) -> SetId {
        self.sets.clear();
        self.cache.clear();
        let mut members: BitVec = bitvec![0; self.cnfa.nstates()];
        members.set(self.cnfa.entry() as usize, true);
        let mut ss = StateSet::new(
            members.clone(),
            STARTER | NOPROGRESS,
            self.cnfa.ncolors() as usize,
        );
        ss.last_seen = Some(start);
        self.sets.push(ss);
        self.cache.insert(members, 0);
        0
    }

    /// The color that enters the scan at `start`: the preceding character's
    /// color, or a begin-boundary color at offset zero.
    fn startup_color(&self, start: usize) -> Color {
        if start == 0 {
            self.cnfa.bos()[if self.opts.not_bol { 0 } else { 1 }]
        } else {
            self.cm.color_of(*self.text.iat(start - 1))
        }
    }

    /// One transition: memoized successor if present, else subset
    /// construction. None means this scan path is exhausted.
    fn step(&mut self, css: SetId, co: Color, cp: usize) -> Option<SetId> {
        if let Some(ss) = *self.sets.iat(css as usize).outs.iat(co as usize) {
            return Some(ss);
        }
        self.miss(css, co, cp)
    }

    /// Build the successor of one (state-set, color) edge.
    fn miss(&mut self, css: SetId, co: Color, cp: usize) -> Option<SetId> {
        let mut work: BitVec = bitvec![0; self.cnfa.nstates()];
        let mut ispost = false;
        let mut noprogress = true;
        let mut gotstate = false;
        for i in self.sets.iat(css as usize).states.iter_ones() {
            for ca in self.cnfa.arcs_of(i as u32) {
                if ca.color() == co {
                    work.set(ca.target() as usize, true);
                    gotstate = true;
                    if ca.target() == self.cnfa.accept() {
                        ispost = true;
                    }
                    if !self.cnfa.is_noprogress(ca.target()) {
                        noprogress = false;
                    }
                }
            }
        }

        let mut sawlacons = false;
        if gotstate && self.cnfa.has_lacons() {
            // Transitive closure over constraint-gated arcs. Even a failed
            // evaluation taints the edge: it depends on the position.
            loop {
                let mut added = false;
                let members: Vec<usize> = work.iter_ones().collect();
                for i in members {
                    for ca in self.cnfa.arcs_of(i as u32) {
                        if ca.color() < self.cnfa.ncolors() {
                            continue;
                        }
                        sawlacons = true;
                        if work[ca.target() as usize] {
                            continue;
                        }
                        if !self.eval_lacon(cp, ca.color()) {
                            continue;
                        }
                        work.set(ca.target() as usize, true);
                        added = true;
                        if ca.target() == self.cnfa.accept() {
                            ispost = true;
                        }
                        if !self.cnfa.is_noprogress(ca.target()) {
                            noprogress = false;
                        }
                    }
                }
                if !added {
                    break;
                }
            }
        }
        if !gotstate {
            return None;
        }

        let ss = match self.cache.get(&work) {
            Some(&id) => id,
            None => {
                let mut flags = 0;
                if ispost {
                    flags |= POSTSTATE;
                }
                if noprogress {
                    flags |= NOPROGRESS;
                }
                let id = self.sets.len() as SetId;
                self.sets
                    .push(StateSet::new(work.clone(), flags, self.cnfa.ncolors() as usize));
                self.cache.insert(work, id);
                id
            }
        };
        trace!("miss: set {} over color {} -> set {}", css, co, ss);
        // A constraint-tainted edge is position-dependent; only edges built
        // from the automaton alone may be memoized.
        if !sawlacons {
            *self.sets.mat(css as usize).outs.mat(co as usize) = Some(ss);
        }
        Some(ss)
    }

    /// Evaluate the lookahead constraint behind pseudo-color `co` at offset
    /// `cp`, on a fresh engine over the constraint's own automaton.
    fn eval_lacon(&self, cp: usize, co: Color) -> bool {
        let lacon = self.lacons.iat((co - self.cnfa.ncolors()) as usize);
        let mut engine = Dfa::new(&lacon.cnfa, self.cm, self.lacons, self.text, self.opts);
        let end = engine.longest(cp, self.text.len());
        trace!("lacon at {}: matched {:?}", cp, end);
        if lacon.positive {
            end.is_some()
        } else {
            end.is_none()
        }
    }

    /// Longest-preferred matching over `text[start..stop]`: the greatest
    /// accepting offset reached along any explored path, which need not be
    /// the path the scan ended on.
    pub fn longest(&mut self, start: usize, stop: usize) -> Option<usize> {
        let len = self.text.len();
        debug_assert!(start <= stop && stop <= len);
        trace!("longest: start {} stop {}", start, stop);
        // Scan one character past the window: a match ending at `stop` is
        // observed while its follower is consumed.
        let realstop = if stop == len { stop } else { stop + 1 };

        let mut css = self.initialize(start);
        let mut cp = start;
        css = self.step(css, self.startup_color(start), cp)?;
        self.sets.mat(css as usize).last_seen = Some(cp);

        while cp < realstop {
            let co = self.cm.color_of(*self.text.iat(cp));
            match self.step(css, co, cp + 1) {
                Some(ss) => {
                    cp += 1;
                    self.sets.mat(ss as usize).last_seen = Some(cp);
                    css = ss;
                }
                None => break,
            }
        }

        if cp == len && stop == len {
            let co = self.cnfa.eos()[if self.opts.not_eol { 0 } else { 1 }];
            if let Some(ss) = self.step(css, co, cp) {
                if self.sets.iat(ss as usize).is_post() {
                    // Accepted exactly at the end boundary; no follower was
                    // consumed, so no shift applies.
                    return Some(cp);
                }
                self.sets.mat(ss as usize).last_seen = Some(cp);
            }
        }

        // Best accepting visit across every set this attempt discovered,
        // shifted back over the follower character.
        self.sets
            .iter()
            .filter(|ss| ss.is_post())
            .filter_map(|ss| ss.last_seen)
            .max()
            .map(|p| p - 1)
    }

    /// Shortest-preferred matching: stop at the first accepting offset in
    /// `min..=max`, and report the latest no-progress offset as the match's
    /// cold start.
    pub fn shortest(&mut self, start: usize, min: usize, max: usize) -> Option<ShortestMatch> {
        let len = self.text.len();
        debug_assert!(start <= min && min <= max && max <= len);
        trace!("shortest: start {} min {} max {}", start, min, max);
        let realmin = if min == len { min } else { min + 1 };
        let realmax = if max == len { max } else { max + 1 };

        let mut css = self.initialize(start);
        let mut cp = start;
        css = self.step(css, self.startup_color(start), cp)?;
        self.sets.mat(css as usize).last_seen = Some(cp);

        while cp < realmax {
            let co = self.cm.color_of(*self.text.iat(cp));
            match self.step(css, co, cp + 1) {
                Some(ss) => {
                    cp += 1;
                    self.sets.mat(ss as usize).last_seen = Some(cp);
                    css = ss;
                    if self.sets.iat(ss as usize).is_post() && cp >= realmin {
                        break;
                    }
                }
                None => return None,
            }
        }

        let cold_start = self.last_cold();
        let mut end = cp;
        if self.sets.iat(css as usize).is_post() && cp > min {
            // Acceptance was seen while consuming the follower.
            end = cp - 1;
        } else if cp == len && max == len {
            let co = self.cnfa.eos()[if self.opts.not_eol { 0 } else { 1 }];
            css = self.step(css, co, cp)?;
        }
        if !self.sets.iat(css as usize).is_post() {
            return None;
        }
        Some(ShortestMatch { end, cold_start })
    }

    /// Latest offset at which an explored set had made no progress: the true
    /// start of the match a scan found.
    fn last_cold(&self) -> usize {
        self.sets
            .iter()
            .filter(|ss| ss.is_noprogress())
            .filter_map(|ss| ss.last_seen)
            .max()
            .unwrap_or(0)
    }
}
