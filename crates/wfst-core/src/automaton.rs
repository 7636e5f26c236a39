// Automaton table: units, states, transitions and adjacency.
//
// States and transitions are plain indices into per-unit vectors. All field
// access goes through `Transition` values, never through byte offsets.

use std::fmt;

use crate::FstError;
use crate::semiring::{Semiring, WeightOps};
use crate::symbols::SymbolTable;

/// Symbol index. Epsilon is expressed as `None` in an `Option<Symbol>` label.
pub type Symbol = u32;

/// Transition weight, interpreted by the automaton's [`Semiring`].
pub type Weight = f64;

/// Index of a unit within an [`Automaton`].
pub type UnitId = usize;

/// Handle of a state within one unit. State 0 is the start state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(pub u32);

impl StateId {
    /// The start state of every non-empty unit.
    pub const START: StateId = StateId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "state index {index} overflows u32");
        StateId(index as u32)
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle of a transition within one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransitionId(pub u32);

impl TransitionId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "transition index {index} overflows u32");
        TransitionId(index as u32)
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One transition row.
///
/// `phoneme` and `stack` are side-channel labels carried along by the
/// automaton. They are opaque to determinization, but lazy minimization
/// treats them like the input and output labels when it merges chains.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
    pub input: Option<Symbol>,
    pub output: Option<Symbol>,
    pub weight: Weight,
    pub phoneme: Option<Symbol>,
    pub stack: Option<Symbol>,
}

impl Transition {
    /// Create an epsilon transition carrying only a weight.
    pub fn new(from: StateId, to: StateId, weight: Weight) -> Self {
        Self {
            from,
            to,
            input: None,
            output: None,
            weight,
            phoneme: None,
            stack: None,
        }
    }

    /// `true` if the transition consumes no input symbol.
    #[inline]
    pub fn is_epsilon(&self) -> bool {
        self.input.is_none()
    }
}

/// An independently addressable sub-automaton.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unit {
    pub(crate) finals: Vec<bool>,
    pub(crate) transitions: Vec<Transition>,
}

impl Unit {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn num_states(&self) -> usize {
        self.finals.len()
    }

    #[inline]
    pub fn num_transitions(&self) -> usize {
        self.transitions.len()
    }

    /// A unit without states. Such a unit has no start state either.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.finals.is_empty()
    }

    /// The start state, if the unit has any states.
    pub fn start(&self) -> Option<StateId> {
        (!self.is_empty()).then_some(StateId::START)
    }

    /// Append one state and return its id.
    pub fn add_state(&mut self, is_final: bool) -> StateId {
        self.finals.push(is_final);
        StateId::from_index(self.finals.len() - 1)
    }

    /// Append `count` states and return the id of the first one.
    pub fn add_states(&mut self, count: usize, is_final: bool) -> StateId {
        let first = StateId::from_index(self.finals.len());
        self.finals.resize(self.finals.len() + count, is_final);
        first
    }

    /// Remove the most recently added state.
    ///
    /// The caller must make sure no transition still refers to it.
    pub fn pop_state(&mut self) {
        self.finals.pop();
    }

    #[inline]
    pub fn is_final(&self, state: StateId) -> bool {
        self.finals[state.index()]
    }

    #[inline]
    pub fn set_final(&mut self, state: StateId, is_final: bool) {
        self.finals[state.index()] = is_final;
    }

    pub fn finals(&self) -> &[bool] {
        &self.finals
    }

    pub fn final_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.finals
            .iter()
            .enumerate()
            .filter(|(_, f)| **f)
            .map(|(i, _)| StateId::from_index(i))
    }

    pub fn check_state(&self, state: StateId) -> Result<(), FstError> {
        if state.index() < self.num_states() {
            Ok(())
        } else {
            Err(FstError::BadStateId {
                state: state.0,
                count: self.num_states(),
            })
        }
    }

    /// Append an epsilon transition with the given weight.
    pub fn add_transition(
        &mut self,
        from: StateId,
        to: StateId,
        weight: Weight,
    ) -> Result<TransitionId, FstError> {
        self.check_state(from)?;
        self.check_state(to)?;
        self.transitions.push(Transition::new(from, to, weight));
        Ok(TransitionId::from_index(self.transitions.len() - 1))
    }

    /// Append a labeled transition.
    pub fn add_arc(
        &mut self,
        from: StateId,
        to: StateId,
        input: Option<Symbol>,
        output: Option<Symbol>,
        weight: Weight,
    ) -> Result<TransitionId, FstError> {
        let id = self.add_transition(from, to, weight)?;
        let t = &mut self.transitions[id.index()];
        t.input = input;
        t.output = output;
        Ok(id)
    }

    pub fn check_transition(&self, id: TransitionId) -> Result<(), FstError> {
        if id.index() < self.num_transitions() {
            Ok(())
        } else {
            Err(FstError::BadTransitionId {
                transition: id.0,
                count: self.num_transitions(),
            })
        }
    }

    #[inline]
    pub fn transition(&self, id: TransitionId) -> &Transition {
        &self.transitions[id.index()]
    }

    #[inline]
    pub fn transition_mut(&mut self, id: TransitionId) -> &mut Transition {
        &mut self.transitions[id.index()]
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Transitions grouped by initial state, in increasing state order.
    pub fn out_index(&self) -> Adjacency {
        Adjacency::outgoing(self)
    }

    /// Transitions grouped by terminal state, in increasing state order.
    pub fn in_index(&self) -> Adjacency {
        Adjacency::incoming(self)
    }
}

/// Transition ids grouped per state (CSR layout).
///
/// Within one state the transitions keep their table order, so iteration is
/// "all transitions from state S, sorted by initial state" with a stable
/// tie-break.
#[derive(Debug, Clone)]
pub struct Adjacency {
    offsets: Vec<u32>,
    order: Vec<TransitionId>,
}

impl Adjacency {
    pub fn outgoing(unit: &Unit) -> Self {
        Self::build(unit, |t| t.from)
    }

    pub fn incoming(unit: &Unit) -> Self {
        Self::build(unit, |t| t.to)
    }

    fn build(unit: &Unit, key: impl Fn(&Transition) -> StateId) -> Self {
        let n = unit.num_states();
        let mut offsets = vec![0u32; n + 1];
        for t in &unit.transitions {
            offsets[key(t).index() + 1] += 1;
        }
        for i in 0..n {
            offsets[i + 1] += offsets[i];
        }
        let mut cursor = offsets.clone();
        let mut order = vec![TransitionId(0); unit.transitions.len()];
        for (i, t) in unit.transitions.iter().enumerate() {
            let slot = &mut cursor[key(t).index()];
            order[*slot as usize] = TransitionId::from_index(i);
            *slot += 1;
        }
        Self { offsets, order }
    }

    /// Transitions attached to `state`.
    #[inline]
    pub fn of(&self, state: StateId) -> &[TransitionId] {
        let s = state.index();
        &self.order[self.offsets[s] as usize..self.offsets[s + 1] as usize]
    }
}

/// A container of units sharing one semiring and one pair of symbol tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Automaton {
    units: Vec<Unit>,
    /// Weight semiring; `None` for an unweighted automaton.
    pub semiring: Option<Semiring>,
    pub input_symbols: SymbolTable,
    pub output_symbols: SymbolTable,
}

impl Automaton {
    pub fn new(semiring: Option<Semiring>) -> Self {
        Self {
            semiring,
            ..Self::default()
        }
    }

    /// Weight arithmetic for this automaton's semiring.
    pub fn weight_ops(&self, tolerance: f64) -> WeightOps {
        WeightOps::new(self.semiring, tolerance)
    }

    pub fn num_units(&self) -> usize {
        self.units.len()
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Append an empty unit.
    pub fn add_unit(&mut self) -> UnitId {
        self.push_unit(Unit::new())
    }

    pub fn push_unit(&mut self, unit: Unit) -> UnitId {
        self.units.push(unit);
        self.units.len() - 1
    }

    pub fn check_unit(&self, unit: UnitId) -> Result<(), FstError> {
        if unit < self.units.len() {
            Ok(())
        } else {
            Err(FstError::BadUnitId {
                unit,
                count: self.units.len(),
            })
        }
    }

    pub fn unit(&self, unit: UnitId) -> Result<&Unit, FstError> {
        self.check_unit(unit)?;
        Ok(&self.units[unit])
    }

    pub fn unit_mut(&mut self, unit: UnitId) -> Result<&mut Unit, FstError> {
        self.check_unit(unit)?;
        Ok(&mut self.units[unit])
    }

    /// Drop all units, keeping semiring and symbol tables.
    pub fn clear_units(&mut self) {
        self.units.clear();
    }

    /// Append every unit of `other` after the units of `self`.
    pub fn concatenate(&mut self, other: &Automaton) {
        self.units.extend(other.units.iter().cloned());
    }

    /// A single-unit automaton holding a copy of `unit`.
    pub fn copy_unit(&self, unit: UnitId) -> Result<Automaton, FstError> {
        let copy = self.unit(unit)?.clone();
        let mut out = self.empty_like();
        out.units.push(copy);
        Ok(out)
    }

    /// An automaton without units sharing this one's semiring and symbol tables.
    pub fn empty_like(&self) -> Automaton {
        Automaton {
            units: Vec::new(),
            semiring: self.semiring,
            input_symbols: self.input_symbols.clone(),
            output_symbols: self.output_symbols.clone(),
        }
    }
}
