use log::debug;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::escape::Budget;
use crate::graph::Gold;
use crate::route::Route;

/// Best complete route found so far, shared by all workers.
///
/// The route itself is behind a mutex; its gold is mirrored in an atomic so
/// workers can skip hopeless candidates without locking. Only 'propose'
/// decides what gets installed.
#[derive(Debug)]
pub struct BestRoute {
    route: Mutex<Route>,
    gold: AtomicU32,
    proposed: AtomicUsize,
    accepted: AtomicUsize,
}

impl BestRoute {
    pub fn new(route: Route) -> Self {
        BestRoute {
            gold: AtomicU32::new(route.gold()),
            route: Mutex::new(route),
            proposed: AtomicUsize::new(0),
            accepted: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Route> {
        self.route.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Gold of the current best. May be stale by the time it's used.
    #[inline]
    pub fn gold(&self) -> Gold {
        self.gold.load(Ordering::Relaxed)
    }

    /// Installs 'candidate' if it dominates the current best (more gold, or
    /// as much gold for less time) and still fits the budget as it is right
    /// now. Returns whether it was installed.
    pub fn propose<B: Budget + ?Sized>(&self, candidate: Route, budget: &B) -> bool {
        self.proposed.fetch_add(1, Ordering::Relaxed);
        let mut best = self.lock();
        if !candidate.dominates(&best) {
            return false;
        }
        // Read under the lock: the budget may have shrunk since the
        // candidate was built.
        let time_remaining = budget.time_remaining();
        if candidate.length() > time_remaining {
            return false;
        }
        debug!("New best route: gold {} length {} ({} vertices), {} time left",
               candidate.gold(), candidate.length(), candidate.vertices().len(),
               time_remaining);
        self.gold.store(candidate.gold(), Ordering::Relaxed);
        *best = candidate;
        self.accepted.fetch_add(1, Ordering::Relaxed);
        true
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Route {
        self.lock().clone()
    }

    pub fn into_route(self) -> Route {
        self.route.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn proposed(&self) -> usize {
        self.proposed.load(Ordering::Relaxed)
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use crate::escape::SharedBudget;
    use crate::graph::{Graph, GraphBuilder, Length, Pos};
    use super::*;

    // Vertices 0..8, gold equal to the id.
    fn graph() -> Graph {
        let mut builder = GraphBuilder::new();
        for id in 0..8 {
            builder.vertex(id, Pos { row: 0, column: id as i32 }, id as Gold).unwrap();
        }
        builder.build()
    }

    fn route(graph: &Graph, to: usize, length: Length) -> Route {
        Route::new(graph, 0).with_step(graph, to, length)
    }

    #[test]
    fn test_only_dominating_routes_are_installed() {
        let graph = graph();
        let best = BestRoute::new(route(&graph, 3, 5));
        let budget: Length = 100;
        assert!(!best.propose(route(&graph, 2, 1), &budget), "less gold");
        assert!(!best.propose(route(&graph, 3, 5), &budget), "no better");
        assert!(!best.propose(route(&graph, 3, 6), &budget), "longer");
        assert!(best.propose(route(&graph, 3, 4), &budget), "shorter");
        assert!(best.propose(route(&graph, 4, 50), &budget), "more gold");
        assert_eq!(best.gold(), 4);
        assert_eq!(best.proposed(), 5);
        assert_eq!(best.accepted(), 2);
        assert_eq!(best.snapshot().length(), 50);
    }

    #[test]
    fn test_budget_is_checked_at_commit() {
        let graph = graph();
        let best = BestRoute::new(Route::new(&graph, 0));
        let budget = SharedBudget::new(10);
        let candidate = route(&graph, 5, 8);
        budget.spend(3);
        assert!(!best.propose(candidate, &budget));
        assert!(best.propose(route(&graph, 5, 7), &budget));
        assert_eq!(best.into_route().length(), 7);
    }

    #[test]
    fn test_concurrent_proposals_keep_the_best() {
        let graph = Arc::new(graph());
        let best = Arc::new(BestRoute::new(Route::new(&graph, 0)));
        let handles: Vec<_> = (0..4).map(|i| {
            let graph = graph.clone();
            let best = best.clone();
            thread::spawn(move || {
                let budget: Length = 1_000;
                for to in 1..8 {
                    for length in (1..40).rev() {
                        best.propose(route(&graph, to, length + i), &budget);
                    }
                }
            })
        }).collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let winner = best.snapshot();
        assert_eq!(winner.gold(), 7);
        assert_eq!(winner.length(), 1);
        assert_eq!(best.proposed(), 4 * 7 * 39);
    }
}
