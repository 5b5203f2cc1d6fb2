/*!

# tinct - color-partitioned regular expression automata

This crate compiles extended-regular-expression parse graphs into immutable,
color-partitioned automata and runs matches with a lazily constructed
deterministic automaton.

A lexer and parser are deliberately absent. A front end delivers three things
through [`compile`]: a subexpression tree, a shared NFA graph it has populated
between the graph's `init` and `fin` states, and the pattern's lookahead
constraints. Characters never appear in the automata; the front end partitions
them into colors (equivalence classes) and matching works on colors alone.

# Example: compile and match a literal pattern

```rust
use tinct::{compile, ArcKind, CompileOptions, MatchOptions, Nfa, RuntimeColorMap, Subre, SubreOp};

// Colors: 'a' is 1, 'b' is 2, everything else WHITE.
let cm = RuntimeColorMap::from_classes(&[('a'..='a', 1), ('b'..='b', 2)]);

// The graph a front end would deliver for the pattern "ab".
let mut nfa = Nfa::new(&cm);
let mid = nfa.new_state();
nfa.new_arc(ArcKind::Plain(1), nfa.init(), mid);
nfa.new_arc(ArcKind::Plain(2), mid, nfa.fin());
let tree = Subre::new(SubreOp::Plain, Subre::LONGER, nfa.init(), nfa.fin());

let pattern = compile(tree, nfa, Vec::new(), cm, &CompileOptions::default()).unwrap();
let text: Vec<char> = "xxabyy".chars().collect();
assert_eq!(
    pattern.longest_match(&text, 0, text.len(), MatchOptions::default()),
    Some(4)
);
```

# Architecture

Compilation duplicates each tree fragment out of the shared graph, optimizes
it (empty-arc removal, boundary-constraint resolution, dead-state pruning),
and flattens it into a compact arc table; the main graph additionally gets an
implicit unanchored prefix so one automaton serves search. Matching runs a
lazy DFA over the compact form: deterministic state-sets are built by subset
construction on first use and cached for the rest of the attempt, with
lookahead constraints evaluated by recursive engines over their own automata.

*/

#![warn(clippy::all)]

pub use crate::api::{
    compile, CompileOptions, CompiledPattern, MatchOptions, ShortestMatch,
};
pub use crate::cnfa::{Carc, Cnfa, Lacon};
pub use crate::colormap::{Color, RuntimeColorMap, COLORLESS, WHITE};
pub use crate::error::CompileError;
pub use crate::graph::{Arc, ArcKind, Nfa, StateNo};
pub use crate::subre::{LaconSpec, Subre, SubreOp};

mod api;
mod cnfa;
mod colormap;
mod dfa;
mod error;
mod graph;
mod subre;
pub mod transform;
mod util;
