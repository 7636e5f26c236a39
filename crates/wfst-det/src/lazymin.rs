// Lazy minimization: in-place contraction of degree-1 chains.
//
// A non-protected state with a single incoming transition is folded into its
// predecessor, and one with a single outgoing transition into its successor,
// as long as the labels of the two transitions being joined never both carry
// a value in the same field. The bypassed state and transition are left
// dangling and removed by a final trim.

use tracing::trace;
use wfst_core::edit::trim;
use wfst_core::{StateId, Symbol, Transition, TransitionId, Unit, WeightOps};

/// Counters reported by [`lazy_minimize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LazyminStats {
    /// Number of states bypassed.
    pub contractions: usize,
    /// Number of states removed by the final trim.
    pub removed_states: usize,
}

type EdgeId = u32;

#[derive(Debug, Clone, Copy, Default)]
struct Node {
    out_head: Option<EdgeId>,
    in_head: Option<EdgeId>,
    out_degree: u32,
    in_degree: u32,
    /// Start and final states are never contracted.
    protected: bool,
    queued: bool,
}

/// One edge per transition; `from`/`to` follow the bookkeeping, which can
/// differ from the transition table for detached edges.
#[derive(Debug, Clone, Copy)]
struct Edge {
    transition: TransitionId,
    from: u32,
    to: u32,
    next_out: Option<EdgeId>,
    prev_out: Option<EdgeId>,
    next_in: Option<EdgeId>,
    prev_in: Option<EdgeId>,
}

/// Doubly linked adjacency over a unit's current transitions.
struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Graph {
    fn build(unit: &Unit) -> Self {
        let mut graph = Graph {
            nodes: vec![Node::default(); unit.num_states()],
            edges: Vec::with_capacity(unit.num_transitions()),
        };
        for (i, t) in unit.transitions().iter().enumerate() {
            let e = i as EdgeId;
            graph.edges.push(Edge {
                transition: TransitionId::from_index(i),
                from: t.from.0,
                to: t.to.0,
                next_out: None,
                prev_out: None,
                next_in: None,
                prev_in: None,
            });
            graph.link_out(t.from.0, e);
            graph.link_in(t.to.0, e);
        }
        graph
    }

    fn link_out(&mut self, node: u32, e: EdgeId) {
        let head = self.nodes[node as usize].out_head;
        if let Some(h) = head {
            self.edges[h as usize].prev_out = Some(e);
        }
        let edge = &mut self.edges[e as usize];
        edge.from = node;
        edge.next_out = head;
        edge.prev_out = None;
        let n = &mut self.nodes[node as usize];
        n.out_head = Some(e);
        n.out_degree += 1;
    }

    fn link_in(&mut self, node: u32, e: EdgeId) {
        let head = self.nodes[node as usize].in_head;
        if let Some(h) = head {
            self.edges[h as usize].prev_in = Some(e);
        }
        let edge = &mut self.edges[e as usize];
        edge.to = node;
        edge.next_in = head;
        edge.prev_in = None;
        let n = &mut self.nodes[node as usize];
        n.in_head = Some(e);
        n.in_degree += 1;
    }

    fn unlink_out(&mut self, e: EdgeId) {
        let Edge {
            from,
            next_out,
            prev_out,
            ..
        } = self.edges[e as usize];
        match prev_out {
            Some(p) => self.edges[p as usize].next_out = next_out,
            None => self.nodes[from as usize].out_head = next_out,
        }
        if let Some(n) = next_out {
            self.edges[n as usize].prev_out = prev_out;
        }
        self.nodes[from as usize].out_degree -= 1;
    }

    fn unlink_in(&mut self, e: EdgeId) {
        let Edge {
            to,
            next_in,
            prev_in,
            ..
        } = self.edges[e as usize];
        match prev_in {
            Some(p) => self.edges[p as usize].next_in = next_in,
            None => self.nodes[to as usize].in_head = next_in,
        }
        if let Some(n) = next_in {
            self.edges[n as usize].prev_in = prev_in;
        }
        self.nodes[to as usize].in_degree -= 1;
    }

    fn out_edges(&self, node: u32) -> Vec<EdgeId> {
        let mut list = Vec::with_capacity(self.nodes[node as usize].out_degree as usize);
        let mut cur = self.nodes[node as usize].out_head;
        while let Some(e) = cur {
            list.push(e);
            cur = self.edges[e as usize].next_out;
        }
        list
    }

    fn in_edges(&self, node: u32) -> Vec<EdgeId> {
        let mut list = Vec::with_capacity(self.nodes[node as usize].in_degree as usize);
        let mut cur = self.nodes[node as usize].in_head;
        while let Some(e) = cur {
            list.push(e);
            cur = self.edges[e as usize].next_in;
        }
        list
    }
}

/// Side-channel and main labels in a fixed order: input, output, phoneme, stack.
///
/// Stack symbol 0 is the default stack value and counts as unset.
fn labels(t: &Transition) -> [Option<Symbol>; 4] {
    [t.input, t.output, t.phoneme, t.stack.filter(|&s| s != 0)]
}

/// Copy every label `via` carries onto `target`, and multiply in its weight.
fn absorb(target: &mut Transition, via: &Transition, ops: &WeightOps) {
    let [input, output, phoneme, stack] = labels(via);
    if input.is_some() {
        target.input = input;
    }
    if output.is_some() {
        target.output = output;
    }
    if phoneme.is_some() {
        target.phoneme = phoneme;
    }
    if stack.is_some() {
        target.stack = stack;
    }
    target.weight = ops.multiply(target.weight, via.weight);
}

/// `true` if no label field is set both on `via` and on any of `others`.
fn labels_movable(unit: &Unit, graph: &Graph, via: &Transition, others: &[EdgeId]) -> bool {
    let carried = labels(via);
    others.iter().all(|&e| {
        let other = labels(unit.transition(graph.edges[e as usize].transition));
        carried
            .iter()
            .zip(other.iter())
            .all(|(a, b)| a.is_none() || b.is_none())
    })
}

/// Contract degree-1 chains of `unit` in place, then trim it.
///
/// The start state and final states are never bypassed, so they keep their
/// flags; the weighted language is unchanged. The result never has more
/// states or transitions than the input.
pub fn lazy_minimize(unit: &mut Unit, ops: &WeightOps) -> LazyminStats {
    let mut stats = LazyminStats::default();
    if unit.is_empty() {
        return stats;
    }

    let mut graph = Graph::build(unit);
    let mut queue: Vec<u32> = Vec::new();
    for s in 0..unit.num_states() {
        let node = &mut graph.nodes[s];
        if s == 0 || unit.finals()[s] {
            node.protected = true;
        } else if node.in_degree == 1 || node.out_degree == 1 {
            node.queued = true;
            queue.push(s as u32);
        }
    }

    while let Some(s) = queue.pop() {
        graph.nodes[s as usize].queued = false;
        let node = graph.nodes[s as usize];

        if node.in_degree == 1 {
            let Some(t) = node.in_head else { continue };
            let pred = graph.edges[t as usize].from;
            if pred == s {
                continue;
            }
            let via = unit.transition(graph.edges[t as usize].transition).clone();
            let moved = graph.out_edges(s);
            if !labels_movable(unit, &graph, &via, &moved) {
                continue;
            }
            for e in moved {
                let tid = graph.edges[e as usize].transition;
                let target = unit.transition_mut(tid);
                absorb(target, &via, ops);
                target.from = StateId(pred);
                graph.unlink_out(e);
                graph.link_out(pred, e);
            }
            graph.unlink_out(t);
            graph.unlink_in(t);
            stats.contractions += 1;
            trace!(state = s, into = pred, "contracted single-input state");

            let p = &mut graph.nodes[pred as usize];
            if !p.queued && p.out_degree == 1 && !p.protected {
                p.queued = true;
                queue.push(pred);
            }
        } else if node.out_degree == 1 {
            let Some(t) = node.out_head else { continue };
            let succ = graph.edges[t as usize].to;
            if succ == s {
                continue;
            }
            let via = unit.transition(graph.edges[t as usize].transition).clone();
            let moved = graph.in_edges(s);
            if !labels_movable(unit, &graph, &via, &moved) {
                continue;
            }
            for e in moved {
                let tid = graph.edges[e as usize].transition;
                let target = unit.transition_mut(tid);
                absorb(target, &via, ops);
                target.to = StateId(succ);
                graph.unlink_in(e);
                graph.link_in(succ, e);
            }
            graph.unlink_out(t);
            graph.unlink_in(t);
            stats.contractions += 1;
            trace!(state = s, into = succ, "contracted single-output state");

            let n = &mut graph.nodes[succ as usize];
            if !n.queued && n.in_degree == 1 && !n.protected {
                n.queued = true;
                queue.push(succ);
            }
        }
    }

    stats.removed_states = trim(unit);
    stats
}
