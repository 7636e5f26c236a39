// Structural edits on a single unit: final-state unification, reversal, trimming.

use tracing::trace;

use crate::automaton::{StateId, Transition, Unit};
use crate::semiring::WeightOps;

/// Give the unit a single final state reachable through the old ones.
///
/// A new final state is appended. Every old final state that has outgoing
/// transitions gets an epsilon transition (weight `one`) to it and stops being
/// final. Every old final state without outgoing transitions has its incoming
/// transitions redirected to the new state. The unit is trimmed afterwards.
pub fn unify_finals(unit: &mut Unit, ops: &WeightOps) {
    if unit.is_empty() {
        return;
    }
    let old_count = unit.num_states();
    let unified = unit.add_state(true);
    trace!(state = unified.0, "unify_finals: new final state");

    let mut has_outgoing = vec![false; old_count];
    for t in &unit.transitions {
        has_outgoing[t.from.index()] = true;
    }

    let mut redirect = vec![false; old_count];
    for s in 0..old_count {
        if !unit.finals[s] {
            continue;
        }
        if has_outgoing[s] {
            unit.transitions
                .push(Transition::new(StateId::from_index(s), unified, ops.one()));
            unit.finals[s] = false;
        } else {
            redirect[s] = true;
        }
    }

    for t in &mut unit.transitions {
        if t.to.index() < old_count && redirect[t.to.index()] {
            t.to = unified;
        }
    }

    trim(unit);
}

/// Reverse the direction of every transition.
///
/// The unit first gets a single final state `f` (see [`unify_finals`]); then
/// the indices 0 and `f` are exchanged in every transition and each
/// transition's endpoints are swapped. Final flags are not touched, so the old
/// start state, now at index `f`, is the final state of the result.
pub fn reverse(unit: &mut Unit, ops: &WeightOps) {
    if unit.is_empty() {
        return;
    }
    unify_finals(unit, ops);

    let f = unit.final_states().next().unwrap_or(StateId::START);
    let swap = |s: StateId| {
        if s == StateId::START {
            f
        } else if s == f {
            StateId::START
        } else {
            s
        }
    };
    for t in &mut unit.transitions {
        let from = swap(t.from);
        let to = swap(t.to);
        t.from = to;
        t.to = from;
    }
}

/// Mark states that are accessible from state 0 and co-accessible to a final state.
pub fn connected_states(unit: &Unit) -> Vec<bool> {
    let n = unit.num_states();
    if n == 0 {
        return Vec::new();
    }
    let out = unit.out_index();
    let inc = unit.in_index();

    let mut accessible = vec![false; n];
    let mut stack = vec![StateId::START];
    accessible[0] = true;
    while let Some(s) = stack.pop() {
        for &tid in out.of(s) {
            let to = unit.transition(tid).to;
            if !accessible[to.index()] {
                accessible[to.index()] = true;
                stack.push(to);
            }
        }
    }

    let mut coaccessible = vec![false; n];
    for s in unit.final_states() {
        coaccessible[s.index()] = true;
        stack.push(s);
    }
    while let Some(s) = stack.pop() {
        for &tid in inc.of(s) {
            let from = unit.transition(tid).from;
            if !coaccessible[from.index()] {
                coaccessible[from.index()] = true;
                stack.push(from);
            }
        }
    }

    accessible
        .iter()
        .zip(&coaccessible)
        .map(|(a, c)| *a && *c)
        .collect()
}

/// Remove every state except state 0 that is not both accessible and
/// co-accessible, together with the transitions touching it.
///
/// Surviving states are renumbered in their original order. Returns the
/// number of removed states.
pub fn trim(unit: &mut Unit) -> usize {
    let n = unit.num_states();
    if n == 0 {
        return 0;
    }
    let mut keep = connected_states(unit);
    keep[0] = true;

    let mut remap = vec![u32::MAX; n];
    let mut next = 0u32;
    for (s, &k) in keep.iter().enumerate() {
        if k {
            remap[s] = next;
            next += 1;
        }
    }
    let removed = n - next as usize;
    if removed == 0 {
        return 0;
    }

    unit.transitions
        .retain(|t| keep[t.from.index()] && keep[t.to.index()]);
    for t in &mut unit.transitions {
        t.from = StateId(remap[t.from.index()]);
        t.to = StateId(remap[t.to.index()]);
    }
    let mut i = 0;
    unit.finals.retain(|_| {
        let k = keep[i];
        i += 1;
        k
    });

    trace!(removed, remaining = next, "trim");
    removed
}
