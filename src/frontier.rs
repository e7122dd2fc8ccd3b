use priority_queue::PriorityQueue;
use std::cmp::Ordering;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::graph::{Gold, Length, VertexId};
use crate::route::Route;

/// Order of partial routes in the frontier. Greater is explored first: more
/// gold, then shorter, then the lowest current vertex id.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Rank {
    gold: Gold,
    length: Length,
    vertex: VertexId,
}

impl Rank {
    pub fn of(route: &Route) -> Self {
        Rank { gold: route.gold(), length: route.length(), vertex: route.current() }
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.gold.cmp(&other.gold)
            .then_with(|| other.length.cmp(&self.length))
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub enum Acquired {
    Route(Route),
    // Nothing queued right now, but a worker holding a route may add more.
    Empty,
    // Nothing queued and nobody can add more: the search is over.
    Exhausted,
}

struct Queue {
    routes: PriorityQueue<Route, Rank>,
    // Routes handed out with 'acquire' and not released yet.
    held: usize,
}

/// Partial routes waiting to be extended, shared by all workers.
///
/// Every operation takes the lock exactly once, so a pop can't race with
/// another pop or a push.
pub struct Frontier {
    queue: Mutex<Queue>,
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontier {
    pub fn new() -> Self {
        Frontier {
            queue: Mutex::new(Queue { routes: PriorityQueue::new(), held: 0 }),
        }
    }

    // A worker panicking never leaves the queue half-updated, so a poisoned
    // lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a route. Returns false (and drops it) if an equivalent route
    /// is already queued. Equivalence only looks at gold, length and current
    /// vertex, so the dropped route may have visited other vertices than the
    /// queued one.
    pub fn push(&self, route: Route) -> bool {
        let rank = Rank::of(&route);
        let mut queue = self.lock();
        if queue.routes.get_priority(&route).is_some() {
            return false;
        }
        queue.routes.push(route, rank);
        true
    }

    /// Removes and returns the best queued route.
    #[cfg(test)]
    pub fn pop_best(&self) -> Option<Route> {
        self.lock().routes.pop().map(|(route, _)| route)
    }

    /// Like 'pop_best', but tracks the route as held until 'release' is
    /// called, to tell a momentarily empty frontier from an exhausted one.
    pub fn acquire(&self) -> Acquired {
        let mut queue = self.lock();
        match queue.routes.pop() {
            Some((route, _)) => {
                queue.held += 1;
                Acquired::Route(route)
            },
            None if queue.held == 0 => Acquired::Exhausted,
            None => Acquired::Empty,
        }
    }

    /// Done with a route handed out by 'acquire'. Push its branches first.
    pub fn release(&self) {
        let mut queue = self.lock();
        queue.held = queue.held.saturating_sub(1);
    }

    pub fn len(&self) -> usize {
        self.lock().routes.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
