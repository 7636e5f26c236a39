//! Determinization and minimization of weighted finite-state transducers.
//!
//! Operates on the units of a [`wfst_core::Automaton`]. Determinization is a
//! weighted subset construction in which each destination state stands for a
//! set of residuals (source state, pending output, pending weight); equal
//! residual sets are merged into one state. Classical minimization runs the
//! reverse/determinize pair twice; lazy minimization contracts degree-1
//! chains in place.
//!
//! # Architecture
//!
//! - [`config`] -- Settings and reusable scratch buffers (explicit DFS stack)
//! - [`residual`] -- Residual table, auxiliary rows and the state-merge index
//! - [`determinize`] -- Worklist engine and the per-unit driver
//! - [`minimize`] -- Classical minimization and the minimization driver
//! - [`lazymin`] -- Degree-1 chain contraction

pub mod config;
pub mod determinize;
pub mod lazymin;
pub mod minimize;
pub mod residual;

pub use config::{DEFAULT_TOLERANCE, DetConfig, DetScratch, MinimizeConfig, MinimizeMode};
pub use determinize::{determinize, determinize_unit, determinize_with};
pub use lazymin::{LazyminStats, lazy_minimize};
pub use minimize::{minimize, minimize_unit, minimize_with};
pub use wfst_core::FstError;
