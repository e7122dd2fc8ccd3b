use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::graph::{Graph, Length, VertexId};
use crate::route::Route;

#[derive(Error, Debug)]
pub enum Error {
    /// The cavern guarantees a way out; not finding one means the input is bad.
    #[error("Exit {exit} can't be reached from {start}")]
    UnreachableExit { start: u64, exit: u64 },
    #[error("Unknown vertex id {0}")]
    UnknownVertex(u64),
    #[error("Invalid cavern ({0})")]
    InvalidCavern(String),
}

/// Time left before the cavern collapses. Only ever goes down, possibly while
/// a search is running, so it must be read again for every decision.
pub trait Budget: Send + Sync {
    fn time_remaining(&self) -> Length;
}

// A budget that never moves.
impl Budget for Length {
    fn time_remaining(&self) -> Length {
        *self
    }
}

/// Budget shared with whoever walks the cavern: each step spends from it.
#[derive(Debug)]
pub struct SharedBudget(AtomicU32);

impl SharedBudget {
    pub fn new(time_remaining: Length) -> Self {
        SharedBudget(AtomicU32::new(time_remaining))
    }

    /// Spends 'length' units (saturating at zero). Returns what is left.
    pub fn spend(&self, length: Length) -> Length {
        let previous = self.0.fetch_update(Ordering::SeqCst, Ordering::SeqCst,
                                           |left| Some(left.saturating_sub(length)))
            .unwrap_or_else(|left| left);
        previous.saturating_sub(length)
    }
}

impl Budget for SharedBudget {
    fn time_remaining(&self) -> Length {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct EscapeProblem {
    pub graph: Arc<Graph>,
    pub start: VertexId,
    pub exit: VertexId,
    pub budget: Arc<dyn Budget>,
}

impl EscapeProblem {
    pub fn new(graph: Arc<Graph>, start: VertexId, exit: VertexId,
               budget: Arc<dyn Budget>) -> Self {
        EscapeProblem { graph, start, exit, budget }
    }

    #[inline]
    pub fn time_remaining(&self) -> Length {
        self.budget.time_remaining()
    }

    pub fn unreachable(&self) -> Error {
        Error::UnreachableExit {
            start: self.graph.external_id(self.start),
            exit: self.graph.external_id(self.exit),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Solution {
    pub route: Route,
    // Complete routes offered as a best solution, and how many were taken.
    pub routes_evaluated: usize,
    pub routes_accepted: usize,
}
