// Weighted subset construction over residual sets.
//
// Each destination state stands for a list of residuals. Expanding a state
// walks the epsilon closure of every residual's source state, groups the
// reachable transitions by input symbol and emits one destination path per
// group, carrying the longest common output prefix and the summed weight.
// Whatever a row owes beyond that becomes a residual of the path's end state.

use tracing::{debug, trace, warn};
use wfst_core::{
    Adjacency, Automaton, FstError, StateId, StringId, StringStore, Symbol, TransitionId, Unit,
    UnitId, Weight, WeightOps,
};

use crate::config::{DetConfig, DetScratch, WalkFrame};
use crate::residual::{AuxRow, GroupKey, Residual, ResidualTable, StateIndex};

/// Determinize one unit or every unit of `src` into `dst` with default settings.
///
/// `dst` is replaced: it receives one determinized unit per selected source
/// unit, in order, plus the semiring and both symbol tables of `src`.
pub fn determinize(
    dst: &mut Automaton,
    src: &Automaton,
    unit: Option<UnitId>,
) -> Result<(), FstError> {
    determinize_with(dst, src, unit, &DetConfig::default())
}

/// [`determinize`] with explicit settings.
pub fn determinize_with(
    dst: &mut Automaton,
    src: &Automaton,
    unit: Option<UnitId>,
    config: &DetConfig,
) -> Result<(), FstError> {
    if let Some(u) = unit {
        src.check_unit(u)?;
    }
    let ops = src.weight_ops(config.tolerance);
    let mut scratch = DetScratch::new();
    let mut out = src.empty_like();

    for u in selected_units(src, unit) {
        let source = &src.units()[u];
        if source.num_transitions() == 0 {
            warn!(unit = u, "determinize: unit has no transitions");
        }
        let result = Determinizer::new(source, ops, config).run(&mut scratch)?;
        debug!(
            unit = u,
            states = result.num_states(),
            transitions = result.num_transitions(),
            "determinized unit"
        );
        out.push_unit(result);
    }

    *dst = out;
    Ok(())
}

/// Determinize a single unit of `src`.
pub fn determinize_unit(
    src: &Automaton,
    unit: UnitId,
    config: &DetConfig,
) -> Result<Unit, FstError> {
    let source = src.unit(unit)?;
    let ops = src.weight_ops(config.tolerance);
    let mut scratch = DetScratch::new();
    Determinizer::new(source, ops, config).run(&mut scratch)
}

pub(crate) fn selected_units(src: &Automaton, unit: Option<UnitId>) -> std::ops::Range<UnitId> {
    match unit {
        Some(u) => u..u + 1,
        None => 0..src.num_units(),
    }
}

/// Determinization state for one source unit.
pub(crate) struct Determinizer<'a> {
    src: &'a Unit,
    out: Adjacency,
    ops: WeightOps,
    max_states: Option<usize>,
    strings: StringStore,
    residuals: ResidualTable,
    index: StateIndex,
    dst: Unit,
    merged: usize,
}

impl<'a> Determinizer<'a> {
    pub(crate) fn new(src: &'a Unit, ops: WeightOps, config: &DetConfig) -> Self {
        Self {
            src,
            out: src.out_index(),
            ops,
            max_states: config.max_states,
            strings: StringStore::new(),
            residuals: ResidualTable::new(),
            index: StateIndex::new(),
            dst: Unit::new(),
            merged: 0,
        }
    }

    /// Run the worklist to completion and return the destination unit.
    pub(crate) fn run(mut self, scratch: &mut DetScratch) -> Result<Unit, FstError> {
        self.build(scratch)?;
        Ok(self.dst)
    }

    fn build(&mut self, scratch: &mut DetScratch) -> Result<(), FstError> {
        if self.src.is_empty() {
            return Ok(());
        }
        scratch.reset(self.src.num_states());

        let start = self.add_state(self.src.is_final(StateId::START))?;
        self.residuals.push(Residual {
            source: StateId::START,
            string: StringId::EMPTY,
            weight: self.ops.one(),
        });
        self.index.insert(&self.residuals, start);

        // New states are appended while the loop runs.
        let mut next = 0;
        while next < self.dst.num_states() {
            let state = StateId::from_index(next);
            next += 1;
            self.expand(state, scratch)?;
        }

        trace!(
            states = self.dst.num_states(),
            merged = self.merged,
            strings = self.strings.len(),
            "worklist drained"
        );
        Ok(())
    }

    /// Gather the transition candidates of `state` and emit one path per group.
    fn expand(&mut self, state: StateId, scratch: &mut DetScratch) -> Result<(), FstError> {
        let count = self.residuals.of(state).len();
        if count == 0 {
            trace!(state = state.0, "intermediate state, skipping");
            return Ok(());
        }

        scratch.aux.clear();
        let mut is_final = false;
        for i in 0..count {
            let residual = self.residuals.of(state)[i];
            is_final |= self.load_candidates(residual, scratch);
        }

        if scratch.aux.is_empty() {
            if !is_final {
                trace!(state = state.0, "broken path, making state final");
                is_final = true;
            }
        } else {
            scratch.aux.sort_by_key(|row| row.key);
            let rows = std::mem::take(&mut scratch.aux);
            for group in rows.chunk_by(|a, b| a.key == b.key) {
                self.emit_group(state, group)?;
            }
            scratch.aux = rows;
        }

        if is_final {
            self.dst.set_final(state, true);
        }
        Ok(())
    }

    /// Add the rows contributed by one residual.
    ///
    /// Returns `true` if the residual is a trivial final one: its source state
    /// is final and nothing is owed.
    ///
    /// A final source state that still owes output or weight gets a
    /// final-residual row instead of a walk. The state that row leads to holds
    /// the trivial residual of the same source and walks it from there, so the
    /// continuation is not counted twice.
    fn load_candidates(&mut self, residual: Residual, scratch: &mut DetScratch) -> bool {
        if self.src.is_final(residual.source) {
            if residual.string.is_empty() && self.ops.is_one(residual.weight) {
                self.walk(residual, scratch);
                return true;
            }
            let seq = scratch.aux.len() as u32;
            trace!(source = residual.source.0, "final residual");
            scratch.aux.push(AuxRow {
                target: residual.source,
                key: GroupKey::FinalResidual(seq),
                string: residual.string,
                weight: residual.weight,
                final_residual: true,
            });
            return false;
        }
        self.walk(residual, scratch);
        false
    }

    /// Depth-first walk through the epsilon closure of `residual.source`.
    ///
    /// A row is emitted for every reachable transition with a real input
    /// symbol or a final terminal state; the walk only continues through
    /// epsilon transitions into non-final states. An epsilon transition back
    /// into a state on the current chain is cut.
    fn walk(&mut self, residual: Residual, scratch: &mut DetScratch) {
        scratch.on_path[residual.source.index()] = true;
        scratch.walk_stack.push(WalkFrame {
            state: residual.source,
            string: residual.string,
            weight: residual.weight,
            next: 0,
        });

        while let Some(frame) = scratch.walk_stack.last_mut() {
            let edges = self.out.of(frame.state);
            if frame.next == edges.len() {
                let done = frame.state;
                scratch.walk_stack.pop();
                scratch.on_path[done.index()] = false;
                continue;
            }
            let t = self.src.transition(edges[frame.next]);
            frame.next += 1;
            let (prefix, weight) = (frame.string, frame.weight);

            let output = self.strings.symbol(t.output);
            let string = self.strings.mult(prefix, output);
            let weight = self.ops.multiply(weight, t.weight);

            if t.input.is_some() || self.src.is_final(t.to) {
                scratch.aux.push(AuxRow {
                    target: t.to,
                    key: GroupKey::Input(t.input),
                    string,
                    weight,
                    final_residual: false,
                });
            } else if scratch.on_path[t.to.index()] {
                trace!(from = t.from.0, to = t.to.0, "epsilon cycle cut");
            } else {
                scratch.on_path[t.to.index()] = true;
                scratch.walk_stack.push(WalkFrame {
                    state: t.to,
                    string,
                    weight,
                    next: 0,
                });
            }
        }
    }

    /// Emit the destination path for one group of rows with equal key.
    fn emit_group(&mut self, from: StateId, group: &[AuxRow]) -> Result<(), FstError> {
        let first = &group[0];
        let mut sum_string = first.string;
        let mut sum_weight = first.weight;
        for row in &group[1..] {
            sum_string = self.strings.add(sum_string, row.string);
            sum_weight = self.ops.add(sum_weight, row.weight);
        }

        let last = self.add_path(from, first.key.input(), sum_string, sum_weight)?;
        let end = self.dst.transition(last).to;
        // A zero sum already carries the whole weight of every row.
        let zero_sum = self.ops.equal(sum_weight, self.ops.zero());

        for row in group {
            let string = self.strings.dif(row.string, sum_string);
            let weight = if row.final_residual || zero_sum {
                self.ops.one()
            } else {
                self.ops.divide(row.weight, sum_weight)
            };
            self.residuals.add(
                Residual {
                    source: row.target,
                    string,
                    weight,
                },
                &self.ops,
            );
        }

        match self.index.find(&self.residuals, end, &self.ops) {
            Some(existing) => {
                trace!(state = end.0, existing = existing.0, "state identified");
                self.dst.transition_mut(last).to = existing;
                self.dst.pop_state();
                self.residuals.pop_state();
                self.merged += 1;
            }
            None => self.index.insert(&self.residuals, end),
        }
        Ok(())
    }

    /// Append a chain of `max(1, len(output))` transitions starting at `from`.
    ///
    /// The first transition carries `input` and `weight`; later ones carry
    /// epsilon and `one`. Transition `i` outputs symbol `i` of `output`.
    /// Returns the id of the last transition.
    fn add_path(
        &mut self,
        from: StateId,
        input: Option<Symbol>,
        output: StringId,
        weight: Weight,
    ) -> Result<TransitionId, FstError> {
        let len = self.strings.string_len(output).max(1);
        let mut at = from;
        let mut last = TransitionId(0);
        for i in 0..len {
            let next = self.add_state(false)?;
            let (label, w) = if i == 0 {
                (input, weight)
            } else {
                (None, self.ops.one())
            };
            last = self
                .dst
                .add_arc(at, next, label, self.strings.get_at(output, i), w)?;
            at = next;
        }
        Ok(last)
    }

    fn add_state(&mut self, is_final: bool) -> Result<StateId, FstError> {
        if let Some(limit) = self.max_states {
            if self.dst.num_states() >= limit {
                return Err(FstError::StateLimitExceeded { limit });
            }
        }
        self.residuals.push_state();
        Ok(self.dst.add_state(is_final))
    }
}
