//! Shared helpers for the integration tests: builders, weighted-language
//! enumeration and a small deterministic random automaton generator.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};

use wfst_core::edit::trim;
use wfst_core::{Automaton, Semiring, StateId, Symbol, Unit, Weight, WeightOps};

pub type Arc = (u32, u32, Option<Symbol>, Option<Symbol>, Weight);

/// Accepted (input, output) pairs with their combined weight.
pub type Language = BTreeMap<(Vec<Symbol>, Vec<Symbol>), Weight>;

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn unit_from(states: usize, finals: &[u32], arcs: &[Arc]) -> Unit {
    let mut u = Unit::new();
    u.add_states(states, false);
    for &f in finals {
        u.set_final(StateId(f), true);
    }
    for &(from, to, input, output, weight) in arcs {
        u.add_arc(StateId(from), StateId(to), input, output, weight)
            .unwrap();
    }
    u
}

pub fn automaton_from(semiring: Option<Semiring>, units: Vec<Unit>) -> Automaton {
    let mut a = Automaton::new(semiring);
    for u in units {
        a.push_unit(u);
    }
    a
}

pub fn tropical() -> WeightOps {
    WeightOps::new(Some(Semiring::Tropical), 1e-6)
}

// ---------------------------------------------------------------------------
// Weighted language
// ---------------------------------------------------------------------------

/// Enumerate every accepting path of at most `max_arcs` transitions.
///
/// Path weights are multiplied along the path; paths with the same label
/// sequences are combined with the semiring addition.
pub fn language(unit: &Unit, ops: &WeightOps, max_arcs: usize) -> Language {
    let mut lang = Language::new();
    if unit.is_empty() {
        return lang;
    }
    let out = unit.out_index();
    let mut stack = vec![(StateId::START, Vec::new(), Vec::new(), ops.one(), 0usize)];
    while let Some((state, input, output, weight, depth)) = stack.pop() {
        if unit.is_final(state) {
            let key = (input.clone(), output.clone());
            let combined = match lang.get(&key) {
                Some(&w) => ops.add(w, weight),
                None => weight,
            };
            lang.insert(key, combined);
        }
        if depth == max_arcs {
            continue;
        }
        for &tid in out.of(state) {
            let t = unit.transition(tid);
            let mut i = input.clone();
            let mut o = output.clone();
            i.extend(t.input);
            o.extend(t.output);
            stack.push((t.to, i, o, ops.multiply(weight, t.weight), depth + 1));
        }
    }
    lang
}

/// Like [`language`], keeping only entries whose input is at most `max_input` long.
pub fn language_upto(unit: &Unit, ops: &WeightOps, max_input: usize, max_arcs: usize) -> Language {
    language(unit, ops, max_arcs)
        .into_iter()
        .filter(|((input, _), _)| input.len() <= max_input)
        .collect()
}

pub fn assert_same_language(expected: &Language, actual: &Language) {
    let lhs: Vec<_> = expected.keys().collect();
    let rhs: Vec<_> = actual.keys().collect();
    assert_eq!(lhs, rhs, "accepted label sequences differ");
    for (key, &w) in expected {
        let v = actual[key];
        assert!(
            (w - v).abs() < 1e-9,
            "weight mismatch for {key:?}: expected {w}, got {v}"
        );
    }
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

/// `true` if no state has two outgoing transitions with the same real input.
pub fn is_deterministic(unit: &Unit) -> bool {
    let out = unit.out_index();
    (0..unit.num_states()).all(|s| {
        let mut inputs: Vec<Symbol> = out
            .of(StateId::from_index(s))
            .iter()
            .filter_map(|&tid| unit.transition(tid).input)
            .collect();
        let n = inputs.len();
        inputs.sort_unstable();
        inputs.dedup();
        inputs.len() == n
    })
}

/// Canonical form of an epsilon-free deterministic unit: states renumbered in
/// breadth-first order following transitions sorted by label.
pub fn canonical(unit: &Unit) -> (Vec<bool>, Vec<(u32, u32, Option<Symbol>, Option<Symbol>)>) {
    if unit.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let out = unit.out_index();
    let mut order = vec![u32::MAX; unit.num_states()];
    let mut finals = Vec::new();
    let mut arcs = Vec::new();
    let mut queue = VecDeque::from([StateId::START]);
    order[0] = 0;
    let mut next = 1;
    while let Some(s) = queue.pop_front() {
        finals.push(unit.is_final(s));
        let mut edges: Vec<_> = out.of(s).iter().map(|&tid| unit.transition(tid)).collect();
        edges.sort_by_key(|t| (t.input, t.output));
        for t in edges {
            if order[t.to.index()] == u32::MAX {
                order[t.to.index()] = next;
                next += 1;
                queue.push_back(t.to);
            }
            arcs.push((order[s.index()], order[t.to.index()], t.input, t.output));
        }
    }
    (finals, arcs)
}

// ---------------------------------------------------------------------------
// Random automata
// ---------------------------------------------------------------------------

/// 64-bit linear congruential generator (Knuth's MMIX constants).
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Lcg(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(1))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }

    /// Uniform in `0..n`.
    pub fn below(&mut self, n: u32) -> u32 {
        self.next_u32() % n
    }

    /// `true` with probability `percent / 100`.
    pub fn chance(&mut self, percent: u32) -> bool {
        self.below(100) < percent
    }
}

/// Shape of the automata produced by [`random_acyclic`].
#[derive(Clone, Copy)]
pub struct Shape {
    pub max_states: u32,
    pub alphabet: u32,
    /// Percentage of transitions with epsilon input.
    pub epsilon_input: u32,
    /// Percentage of transitions carrying an output symbol.
    pub output: u32,
    pub weighted: bool,
    pub final_start: bool,
}

impl Default for Shape {
    fn default() -> Self {
        Shape {
            max_states: 7,
            alphabet: 4,
            epsilon_input: 20,
            output: 50,
            weighted: true,
            final_start: true,
        }
    }
}

/// A trimmed acyclic unit.
///
/// Transitions only lead to higher-numbered states and a backbone chain
/// `0 -> 1 -> ... -> n-1` ends in a final state, so every state lies on an
/// accepting path. Weights are multiples of 0.25, which keeps tropical sums
/// and differences exact.
pub fn random_acyclic(rng: &mut Lcg, shape: Shape) -> Unit {
    let n = 2 + rng.below(shape.max_states - 1);
    let mut u = Unit::new();
    u.add_states(n as usize, false);
    u.set_final(StateId(n - 1), true);
    for s in 1..n - 1 {
        if rng.chance(30) {
            u.set_final(StateId(s), true);
        }
    }
    if shape.final_start && rng.chance(15) {
        u.set_final(StateId::START, true);
    }

    for from in 0..n - 1 {
        let extra = rng.below(3);
        for k in 0..=extra {
            let to = if k == 0 {
                from + 1
            } else {
                from + 1 + rng.below(n - from - 1)
            };
            let input = if rng.chance(shape.epsilon_input) {
                None
            } else {
                Some(rng.below(shape.alphabet))
            };
            let output = if rng.chance(shape.output) {
                Some(10 + rng.below(shape.alphabet))
            } else {
                None
            };
            let weight = if shape.weighted {
                rng.below(9) as f64 * 0.25
            } else {
                0.0
            };
            u.add_arc(StateId(from), StateId(to), input, output, weight)
                .unwrap();
        }
    }
    trim(&mut u);
    u
}
