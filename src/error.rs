//! Compile-time error taxonomy.
//!
//! Matching itself never fails: "no match" is an ordinary result, and an
//! exhausted transition merely ends one scan path.

use thiserror::Error;

/// Errors surfaced while turning a delivered parse graph into compact
/// automata. Any of these aborts the whole compilation; no partial automaton
/// is ever returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CompileError {
    /// An internal inconsistency discovered during graph transformation or
    /// compaction.
    #[error("structural failure: {0}")]
    Structural(&'static str),

    /// An incompatible option combination, rejected before any graph work
    /// begins.
    #[error("invalid options: {0}")]
    InvalidOptions(&'static str),
}
