// Build a small non-deterministic transducer, determinize and minimize it,
// and print the arcs of every stage with their symbol names.
use wfst_core::{Automaton, Semiring, StateId, Unit};
use wfst_det::{determinize, minimize};

fn print_unit(title: &str, automaton: &Automaton) {
    let unit = &automaton.units()[0];
    println!(
        "\n{title}: {} states, {} transitions",
        unit.num_states(),
        unit.num_transitions()
    );
    for t in unit.transitions() {
        println!(
            "  {:>2} -> {:<2} {:>5}:{:<5} / {}",
            t.from.0,
            t.to.0,
            automaton.input_symbols.label(t.input),
            automaton.output_symbols.label(t.output),
            t.weight
        );
    }
    let finals: Vec<String> = unit.final_states().map(|s| s.to_string()).collect();
    println!("  final: {}", finals.join(" "));
}

fn main() {
    let mut src = Automaton::new(Some(Semiring::Tropical));
    let [a, b, c] = ["a", "b", "c"].map(|n| src.input_symbols.intern(n));
    let [x, y] = ["x", "y"].map(|n| src.output_symbols.intern(n));

    // a b -> x (1.0) | a c -> y (0.5) | a b -> x (2.0) via an epsilon detour
    let mut unit = Unit::new();
    unit.add_state(false);
    unit.add_states(5, false);
    unit.set_final(StateId(3), true);
    let arcs = [
        (0, 1, Some(a), None, 0.5),
        (1, 3, Some(b), Some(x), 0.5),
        (0, 2, Some(a), None, 0.25),
        (2, 3, Some(c), Some(y), 0.25),
        (0, 4, None, None, 1.0),
        (4, 5, Some(a), Some(x), 0.5),
        (5, 3, Some(b), None, 0.5),
    ];
    for (from, to, input, output, weight) in arcs {
        unit.add_arc(StateId(from), StateId(to), input, output, weight)
            .expect("states exist");
    }
    src.push_unit(unit);
    print_unit("source", &src);

    let mut det = Automaton::default();
    determinize(&mut det, &src, None).expect("determinize");
    print_unit("determinized", &det);

    let mut min = Automaton::default();
    minimize(&mut min, &src, None, false).expect("minimize");
    print_unit("minimized", &min);

    let mut lazy = Automaton::default();
    minimize(&mut lazy, &src, None, true).expect("lazy minimize");
    print_unit("lazy minimized", &lazy);
}
