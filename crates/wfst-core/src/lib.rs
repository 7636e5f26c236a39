//! Core data model for weighted finite-state transducers.
//!
//! This crate holds everything the determinization and minimization engine
//! consumes but does not define itself: the multi-unit automaton table, weight
//! semiring arithmetic, the interning store for output-string residuals,
//! symbol tables, and the structural edits (reverse, trim, concatenation).
//!
//! # Architecture
//!
//! - [`automaton`] -- Units, states, transitions and the sorted adjacency index
//! - [`semiring`] -- Probability, log and tropical weight arithmetic
//! - [`strings`] -- Interned symbol strings with concatenation, prefix and difference
//! - [`symbols`] -- Symbol tables (id-to-name and name-to-id mapping)
//! - [`edit`] -- Final-state unification, reversal and trimming

pub mod automaton;
pub mod edit;
pub mod semiring;
pub mod strings;
pub mod symbols;

pub use automaton::{
    Adjacency, Automaton, StateId, Symbol, Transition, TransitionId, Unit, UnitId, Weight,
};
pub use semiring::{Semiring, WeightOps};
pub use strings::{StringId, StringStore};
pub use symbols::SymbolTable;

/// Error type for automaton edits and the algorithms built on them.
#[derive(Debug, thiserror::Error)]
pub enum FstError {
    #[error("unit {unit} does not exist (automaton has {count} units)")]
    BadUnitId { unit: UnitId, count: usize },
    #[error("state {state} does not exist (unit has {count} states)")]
    BadStateId { state: u32, count: usize },
    #[error("transition {transition} does not exist (unit has {count} transitions)")]
    BadTransitionId { transition: u32, count: usize },
    #[error("determinization exceeded the limit of {limit} states")]
    StateLimitExceeded { limit: usize },
}
