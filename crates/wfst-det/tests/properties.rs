//! Property tests over randomly generated trimmed acyclic automata.
//!
//! Each property runs over a few hundred seeded automata; a failing seed is
//! reported in the assertion message so it can be replayed directly.

mod common;

use common::{
    Lcg, Shape, assert_same_language, automaton_from, canonical, is_deterministic, language,
    random_acyclic, tropical,
};
use wfst_core::{Semiring, StateId, TransitionId, Unit, WeightOps};
use wfst_det::{DetConfig, determinize_unit, lazy_minimize, minimize_unit};

const SEEDS: u64 = 300;
const MAX_ARCS: usize = 64;

fn det(unit: &Unit) -> Unit {
    det_in(Semiring::Tropical, unit)
}

fn det_in(semiring: Semiring, unit: &Unit) -> Unit {
    let a = automaton_from(Some(semiring), vec![unit.clone()]);
    determinize_unit(&a, 0, &DetConfig::default()).unwrap()
}

/// Generated weights mapped into `[1/3, 1]`, so path probabilities stay well
/// above the comparison tolerance.
fn as_probabilities(unit: &mut Unit) {
    for i in 0..unit.num_transitions() {
        let t = unit.transition_mut(TransitionId::from_index(i));
        t.weight = 1.0 / (1.0 + t.weight);
    }
}

fn min(unit: &Unit) -> Unit {
    let a = automaton_from(Some(Semiring::Tropical), vec![unit.clone()]);
    minimize_unit(&a, 0, &DetConfig::default()).unwrap()
}

fn acceptor_shape() -> Shape {
    Shape {
        epsilon_input: 0,
        output: 0,
        weighted: false,
        final_start: false,
        ..Shape::default()
    }
}

// ---------------------------------------------------------------------------
// Determinization
// ---------------------------------------------------------------------------

#[test]
fn determinized_units_are_deterministic() {
    for seed in 0..SEEDS {
        let src = random_acyclic(&mut Lcg::new(seed), Shape::default());
        let d = det(&src);
        assert!(is_deterministic(&d), "seed {seed}: duplicate input label");
    }
}

#[test]
fn determinization_preserves_the_weighted_language() {
    for semiring in [Semiring::Tropical, Semiring::Log, Semiring::Probability] {
        let ops = WeightOps::new(Some(semiring), 1e-6);
        for seed in 0..SEEDS {
            let mut src = random_acyclic(&mut Lcg::new(seed), Shape::default());
            if semiring == Semiring::Probability {
                as_probabilities(&mut src);
            }
            let d = det_in(semiring, &src);
            let expected = language(&src, &ops, MAX_ARCS);
            let actual = language(&d, &ops, MAX_ARCS);
            assert!(!expected.is_empty(), "seed {seed}: generator produced no path");
            assert_same_language(&expected, &actual);
        }
    }
}

#[test]
fn determinizing_twice_changes_nothing() {
    for seed in 0..SEEDS {
        let src = random_acyclic(&mut Lcg::new(seed), acceptor_shape());
        let once = det(&src);
        let twice = det(&once);
        assert_eq!(once.num_states(), twice.num_states(), "seed {seed}");
        assert_eq!(canonical(&once), canonical(&twice), "seed {seed}");
    }
}

// ---------------------------------------------------------------------------
// Classical minimization
// ---------------------------------------------------------------------------

#[test]
fn minimization_preserves_the_weighted_language() {
    let ops = tropical();
    for seed in 0..SEEDS {
        let src = random_acyclic(&mut Lcg::new(seed), Shape::default());
        let m = min(&src);
        assert!(is_deterministic(&m), "seed {seed}: duplicate input label");
        assert_same_language(&language(&src, &ops, MAX_ARCS), &language(&m, &ops, MAX_ARCS));
    }
}

#[test]
fn minimized_acceptors_are_no_larger_than_determinized() {
    for seed in 0..SEEDS {
        let src = random_acyclic(&mut Lcg::new(seed), acceptor_shape());
        let d = det(&src);
        let m = min(&src);
        assert!(m.num_states() <= d.num_states(), "seed {seed}");
    }
}

#[test]
fn minimizing_a_minimal_acceptor_keeps_its_size() {
    for seed in 0..SEEDS {
        let src = random_acyclic(&mut Lcg::new(seed), acceptor_shape());
        let once = min(&src);
        let twice = min(&once);
        assert_eq!(once.num_states(), twice.num_states(), "seed {seed}");
        assert_eq!(once.num_transitions(), twice.num_transitions(), "seed {seed}");
    }
}

// ---------------------------------------------------------------------------
// Lazy minimization
// ---------------------------------------------------------------------------

#[test]
fn lazy_minimization_is_safe() {
    let ops = tropical();
    let shape = Shape {
        epsilon_input: 35,
        ..Shape::default()
    };
    for seed in 0..SEEDS {
        let src = random_acyclic(&mut Lcg::new(seed), shape);
        let mut lazy = src.clone();
        let stats = lazy_minimize(&mut lazy, &ops);

        assert!(lazy.num_states() <= src.num_states(), "seed {seed}");
        assert!(lazy.num_transitions() <= src.num_transitions(), "seed {seed}");
        assert_eq!(
            lazy.num_transitions() + stats.contractions,
            src.num_transitions(),
            "seed {seed}: each contraction removes exactly one transition"
        );
        assert_eq!(
            lazy.is_final(StateId::START),
            src.is_final(StateId::START),
            "seed {seed}"
        );
        assert_eq!(
            lazy.final_states().count(),
            src.final_states().count(),
            "seed {seed}"
        );
        assert_same_language(&language(&src, &ops, MAX_ARCS), &language(&lazy, &ops, MAX_ARCS));
    }
}
