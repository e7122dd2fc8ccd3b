// Different solver implementations to plan an escape route out of a cavern.
// Every solver returns a route from the start to the exit; the shortest escape
// is the baseline the others have to beat.

use log::{info, warn};
use std::time::Instant;

use crate::branch_and_bound::{branch_and_bound, SearchConfig};
use crate::escape::{EscapeProblem, Error, Solution};
use crate::pathfinding::Pathfinder;

pub trait Solver {
    // Name to display for this solver.
    fn name(&self) -> &str;

    // Implementation of the solver.
    fn do_solve(&mut self, problem: &EscapeProblem) -> Result<Solution, Error>;

    // Wrapper to do_solve, to log timing and gold information.
    fn solve(&mut self, problem: &EscapeProblem) -> Result<Solution, Error> {
        let start = Instant::now();
        let solution = self.do_solve(problem);
        info!("Solver {} took {:?}", self.name(), start.elapsed());
        match &solution {
            Ok(solution) => {
                let route = &solution.route;
                info!("Solver {} would get us {} gold, in {} time over {} steps",
                      self.name(), route.gold(), route.length(),
                      route.vertices().len().saturating_sub(1));
                let time_remaining = problem.time_remaining();
                if route.length() > time_remaining {
                    warn!("Solver {} route takes {} but only {} is left",
                          self.name(), route.length(), time_remaining);
                }
            },
            Err(err) => warn!("Solver {} did NOT find a solution: {}", self.name(), err),
        };
        solution
    }
}

// Straight to the exit on a shortest route, picking up whatever gold lies on
// the way. This is also the fallback of every other solver.
pub struct ShortestEscapeSolver {}

// Anytime multi-threaded branch-and-bound. Starts from the shortest escape and
// keeps improving on it until its deadline. See branch_and_bound.rs.
pub struct BranchAndBoundSolver {
    config: SearchConfig,
}

impl Solver for ShortestEscapeSolver {
    fn name(&self) -> &str {
        "shortest-escape"
    }

    fn do_solve(&mut self, problem: &EscapeProblem) -> Result<Solution, Error> {
        let route = Pathfinder::new()
            .shortest_route(&problem.graph, problem.start, problem.exit)
            .ok_or_else(|| problem.unreachable())?;
        Ok(Solution { route, routes_evaluated: 1, routes_accepted: 1 })
    }
}

impl BranchAndBoundSolver {
    pub fn new(config: SearchConfig) -> Self {
        BranchAndBoundSolver { config }
    }
}

impl Default for BranchAndBoundSolver {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl Solver for BranchAndBoundSolver {
    fn name(&self) -> &str {
        "branch-and-bound"
    }

    fn do_solve(&mut self, problem: &EscapeProblem) -> Result<Solution, Error> {
        branch_and_bound(problem, &self.config)
    }
}
