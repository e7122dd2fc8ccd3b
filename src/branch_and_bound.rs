// Anytime branch-and-bound search for a gold-maximizing escape route.
// See https://en.wikipedia.org/wiki/Branch_and_bound
//
// A pool of workers shares a frontier of partial routes, ordered by gold then
// length. A worker takes the best partial route and follows one branch of it
// depth-first (the most promising neighbor), pushing the other branches to
// the frontier for anyone to pick up. Every partial route is also completed
// with the shortest way to the exit and offered as a best solution, so the
// best route improves steadily until the deadline.
//
// Branches are cut when:
// - they already used up the time budget;
// - the straight-line distance to the exit, scaled by an average edge
//   length, says the exit is out of reach;
// - they step into a closed dead end (see heuristics.rs);
// - they walk back onto a vertex seen since gold was last collected.

use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

use crate::best_route::BestRoute;
use crate::escape::{EscapeProblem, Error, Solution};
use crate::frontier::{Acquired, Frontier};
use crate::graph::{Edge, Graph, Length};
use crate::heuristics::Heuristics;
use crate::pathfinding::{ExitTree, Pathfinder};
use crate::route::Route;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Wall-clock time allotted to the optimization, in milliseconds.
    pub deadline_ms: u64,

    /// Estimated length of the way out per unit of straight-line distance.
    /// Branches whose length plus this estimate exceeds the budget are cut.
    pub average_edge_length: f64,

    /// Number of worker threads. Defaults to the available parallelism.
    pub workers: Option<usize>,

    /// Sleep between attempts when the frontier is empty, in milliseconds.
    pub idle_backoff_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            deadline_ms: 10_000,
            average_edge_length: 8.0,
            workers: None,
            idle_backoff_ms: 1,
        }
    }
}

impl SearchConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn worker_count(&self) -> usize {
        self.workers
            .unwrap_or_else(|| thread::available_parallelism().map_or(1, |n| n.get()))
            .max(1)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WorkerStats {
    pub expanded: usize,
    pub pruned_by_budget: usize,
    pub pruned_by_distance: usize,
    pub branches_pushed: usize,
    pub proposed: usize,
    pub faults: usize,
}

impl WorkerStats {
    fn merge(&mut self, other: &WorkerStats) {
        self.expanded += other.expanded;
        self.pruned_by_budget += other.pruned_by_budget;
        self.pruned_by_distance += other.pruned_by_distance;
        self.branches_pushed += other.branches_pushed;
        self.proposed += other.proposed;
        self.faults += other.faults;
    }
}

/// Everything the workers share. Only 'frontier' and 'best' change during
/// the search.
struct Search<'a> {
    problem: &'a EscapeProblem,
    heuristics: Heuristics,
    exit_tree: ExitTree,
    frontier: Frontier,
    best: BestRoute,
    config: &'a SearchConfig,
    deadline: Instant,
}

/// Runs the whole search: the shortest escape first (also the fallback),
/// then branch-and-bound until the configured deadline.
pub fn branch_and_bound(problem: &EscapeProblem, config: &SearchConfig) -> Result<Solution, Error> {
    let graph = problem.graph.as_ref();
    let (fallback, exit_tree, heuristics) = thread::scope(|scope| {
        let heuristics = scope.spawn(
            || Heuristics::analyze(graph, problem.start, problem.exit));
        let fallback = Pathfinder::new().shortest_route(graph, problem.start, problem.exit);
        let exit_tree = ExitTree::new(graph, problem.exit);
        let heuristics = heuristics.join()
            .unwrap_or_else(|payload| panic::resume_unwind(payload));
        (fallback, exit_tree, heuristics)
    });
    let fallback = fallback.ok_or_else(|| problem.unreachable())?;

    let time_remaining = problem.time_remaining();
    if fallback.length() > time_remaining {
        warn!("[B&B] Shortest escape takes {} but only {} is left",
              fallback.length(), time_remaining);
    }
    info!("[B&B] Shortest escape: gold {} length {}, budget {}",
          fallback.gold(), fallback.length(), time_remaining);

    let search = Search {
        problem,
        heuristics,
        exit_tree,
        frontier: Frontier::new(),
        best: BestRoute::new(fallback.clone()),
        config,
        deadline: Instant::now() + config.deadline(),
    };
    search.frontier.push(Route::new(graph, problem.start));

    let workers = config.worker_count();
    let start = Instant::now();
    let stats = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers).map(|id| {
            let search = &search;
            scope.spawn(move || Worker::new(id, search).run())
        }).collect();
        let mut total = WorkerStats::default();
        for handle in handles {
            match handle.join() {
                Ok(stats) => total.merge(&stats),
                Err(_) => warn!("[B&B] A worker died, its statistics are lost"),
            }
        }
        total
    });
    info!("[B&B] {} workers expanded {} routes in {:?}: {} cut by budget, {} by distance",
          workers, stats.expanded, start.elapsed(), stats.pruned_by_budget,
          stats.pruned_by_distance);
    debug!("[B&B] {} branches queued, {} left unexplored, {} routes proposed, {} faults",
           stats.branches_pushed, search.frontier.len(), stats.proposed, stats.faults);

    let routes_evaluated = search.best.proposed();
    let routes_accepted = search.best.accepted();
    let mut route = search.best.into_route();
    // The budget may have shrunk since the best route was accepted.
    let time_remaining = problem.time_remaining();
    if route.length() > time_remaining {
        warn!("[B&B] Best escape takes {} but only {} is left, falling back to the shortest",
              route.length(), time_remaining);
        route = fallback;
    }
    info!("[B&B] Best escape: gold {} length {} ({}/{} complete routes accepted)",
          route.gold(), route.length(), routes_accepted, routes_evaluated);
    Ok(Solution { route, routes_evaluated, routes_accepted })
}

impl<'a> Search<'a> {
    #[inline]
    fn graph(&self) -> &'a Graph {
        self.problem.graph.as_ref()
    }

    #[inline]
    fn out_of_time(&self) -> bool {
        Instant::now() >= self.deadline
    }

    // Whether the exit may still be reachable in time, estimating the way out
    // from the straight-line distance.
    fn in_range(&self, route: &Route, time_remaining: Length) -> bool {
        let estimate = self.graph().distance(route.current(), self.problem.exit)
            * self.config.average_edge_length;
        route.length() as f64 + estimate <= time_remaining as f64
    }

    fn propose(&self, route: Route, stats: &mut WorkerStats) -> bool {
        stats.proposed += 1;
        self.best.propose(route, self.problem.budget.as_ref())
    }

    // Turns back now: the route, then the shortest way out. Offered as best
    // solution when it fits and doesn't lose gold against the current best.
    fn consider_going_home(&self, route: &Route, time_remaining: Length,
                           stats: &mut WorkerStats) -> bool {
        let completed = match self.exit_tree.complete(self.graph(), route) {
            Some(completed) => completed,
            None => return false,
        };
        if completed.length() > time_remaining || completed.gold() < self.best.gold() {
            return false;
        }
        self.propose(completed, stats)
    }

    // Neighbors worth branching to, most promising first. Steps onto the exit
    // are completed routes: they are proposed here and not branched on.
    fn branch_options(&self, route: &Route, time_remaining: Length,
                      stats: &mut WorkerStats) -> Vec<Edge> {
        let graph = self.graph();
        let exit = self.problem.exit;
        let heuristics = &self.heuristics;
        let mut options = Vec::new();
        let edges = graph.exits(route.current()).iter()
            .filter(|edge| !heuristics.is_closed(edge.to))
            .filter(|edge| route.length().saturating_add(edge.length) <= time_remaining)
            .sorted_by(|a, b| {
                heuristics.weight(b.to).cmp(&heuristics.weight(a.to))
                    .then_with(|| a.length.cmp(&b.length))
                    .then_with(|| graph.distance(a.to, exit)
                               .total_cmp(&graph.distance(b.to, exit)))
                    .then_with(|| a.to.cmp(&b.to))
            });
        for edge in edges {
            if edge.to == exit {
                self.propose(route.with_step(graph, edge.to, edge.length), stats);
            } else if !route.visited_since_last_gain(edge.to) {
                options.push(*edge);
            }
        }
        options
    }
}

struct Worker<'s, 'a> {
    id: usize,
    search: &'s Search<'a>,
    stats: WorkerStats,
}

impl<'s, 'a> Worker<'s, 'a> {
    fn new(id: usize, search: &'s Search<'a>) -> Self {
        Worker { id, search, stats: WorkerStats::default() }
    }

    fn run(mut self) -> WorkerStats {
        let search = self.search;
        let mut continuation: Option<Route> = None;
        while !search.out_of_time() {
            let route = match continuation.take() {
                Some(route) => route,
                None => match search.frontier.acquire() {
                    Acquired::Route(route) => route,
                    Acquired::Empty => {
                        self.idle();
                        continue;
                    },
                    Acquired::Exhausted => break,
                },
            };
            // A fault only loses the branch at hand.
            continuation = match panic::catch_unwind(AssertUnwindSafe(|| self.expand(route))) {
                Ok(next) => next,
                Err(_) => {
                    warn!("[B&B] Worker {} dropped a branch after a fault", self.id);
                    self.stats.faults += 1;
                    None
                },
            };
            if continuation.is_none() {
                search.frontier.release();
            }
        }
        if continuation.is_some() {
            search.frontier.release();
        }
        debug!("[B&B] Worker {} done: {:?}", self.id, self.stats);
        self.stats
    }

    fn idle(&self) {
        let now = Instant::now();
        if now < self.search.deadline {
            let backoff = Duration::from_millis(self.search.config.idle_backoff_ms);
            thread::sleep(backoff.min(self.search.deadline - now));
        }
    }

    // One step of the search on 'route'. Returns the branch to continue with,
    // if any.
    fn expand(&mut self, mut route: Route) -> Option<Route> {
        let search = self.search;
        let graph = search.graph();
        self.stats.expanded += 1;

        let time_remaining = search.problem.time_remaining();
        if route.length() >= time_remaining {
            self.stats.pruned_by_budget += 1;
            return None;
        }
        if !search.in_range(&route, time_remaining) {
            self.stats.pruned_by_distance += 1;
            return None;
        }

        search.consider_going_home(&route, time_remaining, &mut self.stats);

        let options = search.branch_options(&route, time_remaining, &mut self.stats);
        let (first, others) = options.split_first()?;
        for edge in others {
            if search.frontier.push(route.with_step(graph, edge.to, edge.length)) {
                self.stats.branches_pushed += 1;
            }
        }
        route.push(graph, first.to, first.length);
        Some(route)
    }
}
