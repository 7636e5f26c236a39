// Residual bookkeeping for determinization.
//
// Every destination state owns a slice of residuals: the source states it
// stands for, together with the output and weight still owed on each. States
// are appended one at a time and only the newest state can gain residuals or
// be discarded, so the table is a single append-only row vector with per-state
// start offsets.

use std::cmp::Ordering;

use hashbrown::HashMap;
use wfst_core::{StateId, StringId, Symbol, Weight, WeightOps};

/// Pending obligation of a destination state towards one source state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Residual {
    pub source: StateId,
    /// Output not yet emitted.
    pub string: StringId,
    /// Weight not yet emitted.
    pub weight: Weight,
}

/// Grouping key of an auxiliary row.
///
/// Final-residual rows carry a per-table sequence number so each one forms a
/// group of its own; they sort before every input group. Among input groups,
/// epsilon sorts before real symbols, which sort ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    FinalResidual(u32),
    Input(Option<Symbol>),
}

impl GroupKey {
    /// Input label of the destination transition created for this group.
    #[inline]
    pub fn input(self) -> Option<Symbol> {
        match self {
            GroupKey::FinalResidual(_) => None,
            GroupKey::Input(symbol) => symbol,
        }
    }
}

/// Transition candidate gathered while expanding one destination state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuxRow {
    /// Source state reached.
    pub target: StateId,
    pub key: GroupKey,
    /// Output accumulated from the residual through the walk.
    pub string: StringId,
    /// Weight accumulated from the residual through the walk.
    pub weight: Weight,
    /// Row stands for output owed at a final source state.
    pub final_residual: bool,
}

/// Residual rows of all destination states.
#[derive(Debug, Clone, Default)]
pub struct ResidualTable {
    starts: Vec<u32>,
    rows: Vec<Residual>,
}

impl ResidualTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn num_states(&self) -> usize {
        self.starts.len()
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Open an empty residual slice for a newly added destination state.
    pub fn push_state(&mut self) {
        self.starts.push(self.rows.len() as u32);
    }

    /// Drop the newest state and its residuals.
    pub fn pop_state(&mut self) {
        let Some(start) = self.starts.pop() else {
            panic!("residual table has no state to pop");
        };
        self.rows.truncate(start as usize);
    }

    /// Append a residual to the newest state.
    pub fn push(&mut self, residual: Residual) {
        assert!(!self.starts.is_empty(), "residual pushed before any state");
        self.rows.push(residual);
    }

    /// Append a residual to the newest state, or fold its weight into an
    /// existing residual of that state with the same source and string.
    pub fn add(&mut self, residual: Residual, ops: &WeightOps) {
        let Some(&start) = self.starts.last() else {
            panic!("residual added before any state");
        };
        let newest = &mut self.rows[start as usize..];
        match newest
            .iter_mut()
            .find(|r| r.source == residual.source && r.string == residual.string)
        {
            Some(existing) => existing.weight = ops.add(existing.weight, residual.weight),
            None => self.rows.push(residual),
        }
    }

    /// Residuals of `state`.
    pub fn of(&self, state: StateId) -> &[Residual] {
        let s = state.index();
        assert!(s < self.num_states(), "no residuals recorded for state {state}");
        let start = self.starts[s] as usize;
        let end = self
            .starts
            .get(s + 1)
            .map_or(self.rows.len(), |&e| e as usize);
        &self.rows[start..end]
    }
}

/// Finds an earlier destination state with the same residual set.
///
/// States are bucketed by the sorted multiset of `(source, string)` pairs;
/// inside a bucket, weights are matched under the semiring's tolerance.
#[derive(Debug, Default)]
pub struct StateIndex {
    buckets: HashMap<Box<[(StateId, StringId)]>, Vec<StateId>>,
    key: Vec<(StateId, StringId)>,
    lhs: Vec<Residual>,
    rhs: Vec<Residual>,
}

impl StateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `state` as a merge candidate for states created later.
    pub fn insert(&mut self, table: &ResidualTable, state: StateId) {
        self.load_key(table.of(state));
        match self.buckets.get_mut(self.key.as_slice()) {
            Some(states) => states.push(state),
            None => {
                self.buckets
                    .insert(self.key.clone().into_boxed_slice(), vec![state]);
            }
        }
    }

    /// The earliest registered state whose residuals equal those of `state`.
    pub fn find(
        &mut self,
        table: &ResidualTable,
        state: StateId,
        ops: &WeightOps,
    ) -> Option<StateId> {
        let residuals = table.of(state);
        self.load_key(residuals);
        let candidates = self.buckets.get(self.key.as_slice())?;

        self.lhs.clear();
        self.lhs.extend_from_slice(residuals);
        self.lhs.sort_by(cmp_residual);

        for &candidate in candidates {
            self.rhs.clear();
            self.rhs.extend_from_slice(table.of(candidate));
            self.rhs.sort_by(cmp_residual);
            let same = self
                .lhs
                .iter()
                .zip(&self.rhs)
                .all(|(a, b)| ops.equal(a.weight, b.weight));
            if same {
                return Some(candidate);
            }
        }
        None
    }

    fn load_key(&mut self, residuals: &[Residual]) {
        self.key.clear();
        self.key.extend(residuals.iter().map(|r| (r.source, r.string)));
        self.key.sort_unstable();
    }
}

fn cmp_residual(a: &Residual, b: &Residual) -> Ordering {
    a.source
        .cmp(&b.source)
        .then(a.string.cmp(&b.string))
        .then(a.weight.total_cmp(&b.weight))
}
