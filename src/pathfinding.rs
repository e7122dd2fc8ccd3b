use log::debug;
use priority_queue::PriorityQueue;
use rustc_hash::FxHashMap;
use std::cmp::Reverse;

use crate::graph::{Graph, Length, VertexId};
use crate::route::Route;

// Straight-line distance, truncated. Admissible as long as no edge is
// shorter than the distance between its ends.
fn heuristic(graph: &Graph, from: VertexId, goal: VertexId) -> Length {
    graph.distance(from, goal) as Length
}

#[derive(Debug, Copy, Clone)]
pub struct SearchNode {
    pub parent: Option<VertexId>,
    pub g: Length,
    pub h: Length,
    pub open: bool,
}

impl SearchNode {
    #[inline]
    pub fn f(&self) -> Length {
        self.g.saturating_add(self.h)
    }
}

type SearchNodes = FxHashMap<VertexId, SearchNode>;

pub struct Pathfinder {
    nodes: SearchNodes,
}

impl Default for Pathfinder {
    fn default() -> Self {
        Self::new()
    }
}

impl Pathfinder {
    pub fn new() -> Self {
        Pathfinder { nodes: SearchNodes::default() }
    }

    fn reconstruct_route(&self, graph: &Graph, goal: VertexId) -> Option<Route> {
        let mut steps = Vec::new();
        let mut current = goal;
        let mut node = self.nodes.get(&current)?;
        while let Some(parent) = node.parent {
            let parent_node = self.nodes.get(&parent)?;
            steps.push((current, node.g - parent_node.g));
            current = parent;
            node = parent_node;
        }
        let mut route = Route::new(graph, current);
        for &(v, length) in steps.iter().rev() {
            route.push(graph, v, length);
        }
        Some(route)
    }

    // A* from 'start', stopping as soon as 'goal' is popped. Returns whether
    // the goal was reached.
    fn a_star_search(&mut self, graph: &Graph, start: VertexId, goal: VertexId) -> bool {
        self.nodes.clear();

        let mut frontier: PriorityQueue<VertexId, Reverse<Length>> = PriorityQueue::new();
        let start_node = SearchNode {
            parent: None, g: 0, h: heuristic(graph, start, goal), open: true
        };
        frontier.push(start, Reverse(start_node.f()));
        self.nodes.insert(start, start_node);

        while let Some((current, _)) = frontier.pop() {
            if current == goal {
                return true;
            }
            let cost = match self.nodes.get_mut(&current) {
                Some(node) => {
                    node.open = false;
                    node.g
                },
                None => continue,
            };

            for edge in graph.exits(current) {
                let new_cost = cost.saturating_add(edge.length);
                match self.nodes.get_mut(&edge.to) {
                    None => {
                        let node = SearchNode {
                            parent: Some(current),
                            g: new_cost,
                            h: heuristic(graph, edge.to, goal),
                            open: true,
                        };
                        frontier.push(edge.to, Reverse(node.f()));
                        self.nodes.insert(edge.to, node);
                    },
                    Some(node) if node.open && new_cost < node.g => {
                        node.parent = Some(current);
                        node.g = new_cost;
                        frontier.push(edge.to, Reverse(node.f()));
                    },
                    Some(_) => (),
                }
            }
        }
        false
    }

    /// Minimum-length route from 'start' to 'goal', if there is one.
    pub fn shortest_route(
        &mut self, graph: &Graph, start: VertexId, goal: VertexId
        ) -> Option<Route> {
        if self.a_star_search(graph, start, goal) {
            let route = self.reconstruct_route(graph, goal);
            if let Some(route) = &route {
                debug!("[A*] {} -> {}: length {} through {} vertices ({} expanded)",
                       start, goal, route.length(), route.vertices().len(),
                       self.nodes.len());
            }
            route
        } else {
            None
        }
    }
}

/// Shortest-path tree rooted at the exit: for every vertex, the distance to
/// the exit and the first step of a shortest way there.
pub struct ExitTree {
    distances: Vec<Option<Length>>,
    // next[v] is the (vertex, edge length) to move to from 'v'.
    next: Vec<Option<(VertexId, Length)>>,
}

impl ExitTree {
    // Dijkstra backwards from the exit, over incoming edges.
    pub fn new(graph: &Graph, exit: VertexId) -> Self {
        let mut distances = vec![None; graph.len()];
        let mut next = vec![None; graph.len()];
        let mut frontier: PriorityQueue<VertexId, Reverse<Length>> = PriorityQueue::new();
        distances[exit] = Some(0);
        frontier.push(exit, Reverse(0));

        while let Some((current, Reverse(cost))) = frontier.pop() {
            for edge in graph.entrances(current) {
                let from = edge.to;
                let new_cost = cost.saturating_add(edge.length);
                let better = match distances[from] {
                    Some(old_cost) => new_cost < old_cost,
                    None => true,
                };
                if better && from != exit {
                    distances[from] = Some(new_cost);
                    next[from] = Some((current, edge.length));
                    frontier.push(from, Reverse(new_cost));
                }
            }
        }
        ExitTree { distances, next }
    }

    #[inline]
    pub fn distance(&self, from: VertexId) -> Option<Length> {
        self.distances[from]
    }

    /// Steps of the shortest way from 'from' to the exit, 'from' excluded.
    pub fn suffix(&self, from: VertexId) -> impl Iterator<Item=(VertexId, Length)> + '_ {
        let mut current = from;
        std::iter::from_fn(move || {
            let step = self.next[current]?;
            current = step.0;
            Some(step)
        })
    }

    /// 'route' followed by the shortest way from its current vertex to the
    /// exit. None if the exit can't be reached from there.
    pub fn complete(&self, graph: &Graph, route: &Route) -> Option<Route> {
        self.distance(route.current())?;
        let mut completed = route.clone();
        for (v, length) in self.suffix(route.current()) {
            completed.push(graph, v, length);
        }
        Some(completed)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use crate::graph::{GraphBuilder, Pos};
    use super::*;

    // 3x3 grid of unit edges, with a long shortcut from corner to corner.
    fn grid() -> Graph {
        let mut builder = GraphBuilder::new();
        for row in 0..3 {
            for column in 0..3 {
                let id = (row * 3 + column) as u64;
                builder.vertex(id, Pos { row, column }, id as u32).unwrap();
            }
        }
        for v in 0..9 {
            if v % 3 < 2 {
                builder.undirected_edge(v, v + 1, 1).unwrap();
            }
            if v < 6 {
                builder.undirected_edge(v, v + 3, 1).unwrap();
            }
        }
        builder.edge(0, 8, 10).unwrap();
        builder.build()
    }

    #[test]
    fn test_shortest_route_on_grid() {
        let graph = grid();
        let route = Pathfinder::new().shortest_route(&graph, 0, 8).unwrap();
        assert_eq!(route.length(), 4);
        assert_eq!(route.origin(), 0);
        assert_eq!(route.current(), 8);
        assert_eq!(route.vertices().len(), 5);
    }

    #[test]
    fn test_start_is_goal() {
        let graph = grid();
        let route = Pathfinder::new().shortest_route(&graph, 4, 4).unwrap();
        assert_eq!(route.vertices(), &[4]);
        assert_eq!(route.length(), 0);
        assert_eq!(route.gold(), 4);
    }

    #[test]
    fn test_unreachable_goal() {
        let mut builder = GraphBuilder::new();
        builder.vertex(0, Pos { row: 0, column: 0 }, 0).unwrap();
        builder.vertex(1, Pos { row: 0, column: 1 }, 0).unwrap();
        builder.edge(1, 0, 1).unwrap();
        let graph = builder.build();
        let mut pathfinder = Pathfinder::new();
        assert!(pathfinder.shortest_route(&graph, 0, 1).is_none());
        assert_eq!(pathfinder.shortest_route(&graph, 1, 0).map(|route| route.length()), Some(1));
    }

    #[test]
    fn test_exit_tree_suffix() {
        let graph = grid();
        let tree = ExitTree::new(&graph, 8);
        assert_eq!(tree.distance(0), Some(4));
        assert_eq!(tree.distance(8), Some(0));
        assert_eq!(tree.suffix(8).count(), 0);
        let steps: Vec<(VertexId, Length)> = tree.suffix(0).collect();
        assert_eq!(steps.len(), 4);
        assert_eq!(steps.last(), Some(&(8, 1)));

        let route = Route::new(&graph, 4).with_step(&graph, 1, 1);
        let completed = tree.complete(&graph, &route).unwrap();
        assert_eq!(completed.current(), 8);
        assert_eq!(completed.length(), 1 + 3);
    }

    // Floyd-Warshall reference distance.
    fn brute_force_distance(graph: &Graph, start: VertexId, goal: VertexId) -> Option<Length> {
        let n = graph.len();
        let mut dist = vec![vec![None; n]; n];
        for v in graph.vertices() {
            dist[v][v] = Some(0u64);
            for edge in graph.exits(v) {
                let length = edge.length as u64;
                if dist[v][edge.to].map_or(true, |d| length < d) {
                    dist[v][edge.to] = Some(length);
                }
            }
        }
        for k in 0..n {
            for i in 0..n {
                for j in 0..n {
                    if let (Some(a), Some(b)) = (dist[i][k], dist[k][j]) {
                        if dist[i][j].map_or(true, |d| a + b < d) {
                            dist[i][j] = Some(a + b);
                        }
                    }
                }
            }
        }
        dist[start][goal].map(|d| d as Length)
    }

    // Random small graph whose edges are never shorter than the straight
    // line between their ends.
    fn random_graph(
        positions: &[(i32, i32)], edges: &[(usize, usize, Length)]
        ) -> Graph {
        let mut builder = GraphBuilder::new();
        for (id, &(row, column)) in positions.iter().enumerate() {
            builder.vertex(id as u64, Pos { row, column }, 0).unwrap();
        }
        let n = positions.len();
        for &(a, b, extra) in edges {
            let (a, b) = (a % n, b % n);
            let pa = Pos { row: positions[a].0, column: positions[a].1 };
            let pb = Pos { row: positions[b].0, column: positions[b].1 };
            let length = crate::graph::euclidean_distance(&pa, &pb).ceil() as Length + extra;
            builder.edge(a, b, length).unwrap();
        }
        builder.build()
    }

    proptest! {
        #[test]
        fn test_matches_brute_force(
            positions in prop::collection::vec((0i32..6, 0i32..6), 2..8),
            edges in prop::collection::vec((0usize..8, 0usize..8, 0u32..4), 0..20),
        ) {
            let graph = random_graph(&positions, &edges);
            let goal = graph.len() - 1;
            let expected = brute_force_distance(&graph, 0, goal);
            let route = Pathfinder::new().shortest_route(&graph, 0, goal);
            prop_assert_eq!(route.as_ref().map(Route::length), expected);
            prop_assert_eq!(ExitTree::new(&graph, goal).distance(0), expected);
            if let Some(route) = route {
                let mut length = 0;
                for pair in route.vertices().windows(2) {
                    let edge = graph.exits(pair[0]).iter()
                        .filter(|edge| edge.to == pair[1])
                        .map(|edge| edge.length)
                        .min();
                    prop_assert!(edge.is_some());
                    length += edge.unwrap();
                }
                prop_assert_eq!(length, route.length());
            }
        }
    }
}
