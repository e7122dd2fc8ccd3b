pub mod best_route;
pub mod branch_and_bound;
pub mod cavern_generator;
pub mod cavern_interface;
pub mod escape;
pub mod frontier;
pub mod graph;
pub mod heuristics;
pub mod pathfinding;
pub mod route;
pub mod solvers;
