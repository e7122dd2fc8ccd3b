// One-time analysis of the cavern, done before the branch-and-bound search:
// - dead ends that can't hold anything worth the walk are closed, so the
//   search never branches into them;
// - each vertex gets a weight blending its own gold with half the gold next
//   to it, used to try the most promising branches first.

use log::debug;
use std::thread;

use crate::graph::{Gold, Graph, VertexId};

pub struct Heuristics {
    closed: Vec<bool>,
    weights: Vec<Gold>,
}

impl Heuristics {
    /// Runs both passes, in parallel.
    pub fn analyze(graph: &Graph, origin: VertexId, exit: VertexId) -> Self {
        let (closed, weights) = thread::scope(|scope| {
            let closed = scope.spawn(|| dead_end_closure(graph, origin, exit));
            let weights = gold_weights(graph);
            let closed = closed.join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
            (closed, weights)
        });
        let heuristics = Heuristics { closed, weights };
        debug!("Heuristics: {} of {} vertices closed as dead ends",
               heuristics.closed_count(), graph.len());
        heuristics
    }

    #[inline]
    pub fn is_closed(&self, v: VertexId) -> bool {
        self.closed[v]
    }

    #[inline]
    pub fn weight(&self, v: VertexId) -> Gold {
        self.weights[v]
    }

    pub fn closed_count(&self) -> usize {
        self.closed.iter().filter(|&&closed| closed).count()
    }
}

/// Closes gold-less vertices with at most one open neighbor, until no more
/// can be closed. Closing a vertex can turn its neighbors into dead ends, so
/// whole gold-less corridors ending nowhere get closed. 'origin' and 'exit'
/// always stay open.
pub fn dead_end_closure(graph: &Graph, origin: VertexId, exit: VertexId) -> Vec<bool> {
    let mut closed = vec![false; graph.len()];
    let mut pending: Vec<VertexId> = graph.vertices().collect();
    while let Some(v) = pending.pop() {
        if closed[v] || v == origin || v == exit || graph.gold(v) > 0 {
            continue;
        }
        let open_neighbors = graph.neighbors(v).filter(|&n| !closed[n]).count();
        if open_neighbors <= 1 {
            closed[v] = true;
            pending.extend(graph.neighbors(v).filter(|&n| !closed[n]));
        }
    }
    closed
}

/// weight(v) = gold(v) + (sum of the neighbors' gold) / 2
pub fn gold_weights(graph: &Graph) -> Vec<Gold> {
    graph.vertices().map(|v| {
        let around: u64 = graph.neighbors(v).map(|n| graph.gold(n) as u64).sum();
        let weight = graph.gold(v) as u64 + around / 2;
        weight.min(Gold::MAX as u64) as Gold
    }).collect()
}
