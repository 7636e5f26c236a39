// Algorithm settings and reusable traversal buffers.
//
// Settings are plain `Copy` values. The epsilon-closure walk keeps its explicit
// DFS stack and candidate table in `DetScratch`, so buffers survive across
// units and across both determinization passes of a minimization.

use wfst_core::{StateId, StringId, Weight};

use crate::residual::AuxRow;

/// Default relative tolerance for weight equality.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Determinization settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetConfig {
    /// Relative tolerance used when residual weights are compared.
    pub tolerance: f64,
    /// Upper bound on destination states, `None` for no bound.
    pub max_states: Option<usize>,
}

impl Default for DetConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_states: None,
        }
    }
}

impl DetConfig {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_states(mut self, max_states: usize) -> Self {
        self.max_states = Some(max_states);
        self
    }
}

/// Which minimization algorithm [`crate::minimize_with`] runs per unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MinimizeMode {
    /// Reverse, determinize, reverse, determinize.
    #[default]
    Classical,
    /// In-place contraction of degree-1 chains.
    Lazy,
}

/// Minimization settings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MinimizeConfig {
    pub mode: MinimizeMode,
    /// Settings for the determinization passes of classical minimization.
    /// The lazy mode uses only `det.tolerance`.
    pub det: DetConfig,
}

impl MinimizeConfig {
    pub fn classical() -> Self {
        Self::default()
    }

    pub fn lazy() -> Self {
        Self {
            mode: MinimizeMode::Lazy,
            ..Self::default()
        }
    }
}

/// One level of the epsilon-closure walk.
#[derive(Debug, Clone, Copy)]
pub struct WalkFrame {
    /// Source state whose outgoing transitions are being enumerated.
    pub state: StateId,
    /// Output accumulated on the way to `state`.
    pub string: StringId,
    /// Weight accumulated on the way to `state`.
    pub weight: Weight,
    /// Position in `state`'s outgoing transition list.
    pub next: usize,
}

/// Scratch buffers for determinization.
///
/// Holds the auxiliary transition-candidate table, the explicit DFS stack of
/// the epsilon-closure walk and the set of source states on the current walk
/// chain. Call [`DetScratch::reset`] before each unit.
#[derive(Debug, Default)]
pub struct DetScratch {
    /// Transition candidates of the destination state being expanded.
    pub aux: Vec<AuxRow>,
    /// DFS stack of the epsilon-closure walk.
    pub walk_stack: Vec<WalkFrame>,
    /// `on_path[s]` is set while source state `s` is on the walk stack.
    pub on_path: Vec<bool>,
}

impl DetScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all buffers and size the on-path set for `num_states` source states.
    pub fn reset(&mut self, num_states: usize) {
        self.aux.clear();
        self.walk_stack.clear();
        self.on_path.clear();
        self.on_path.resize(num_states, false);
    }
}
