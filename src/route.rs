use std::hash::{Hash, Hasher};

use crate::graph::{Gold, Graph, Length, VertexId};

/// An ordered walk through the cavern, with the gold it collects and the
/// time it takes.
///
/// Gold of a vertex is collected on its first visit only. Routes compare
/// equal when they have the same gold, the same length and end on the same
/// vertex, regardless of how they got there.
#[derive(Clone, Debug)]
pub struct Route {
    vertices: Vec<VertexId>,
    length: Length,
    gold: Gold,
    // Mask of visited vertices, one bit per vertex id.
    seen: Vec<u64>,
    // Index in 'vertices' of the last step that collected gold.
    last_gain: usize,
}

impl Route {
    pub fn new(graph: &Graph, origin: VertexId) -> Self {
        let mut route = Route {
            vertices: Vec::new(),
            length: 0,
            gold: 0,
            seen: vec![0; (graph.len() + 63) / 64],
            last_gain: 0,
        };
        route.visit(graph, origin);
        route
    }

    fn visit(&mut self, graph: &Graph, v: VertexId) {
        self.vertices.push(v);
        let (word, bit) = (v / 64, 1u64 << (v % 64));
        if self.seen[word] & bit == 0 {
            self.seen[word] |= bit;
            let gold = graph.gold(v);
            if gold > 0 {
                self.gold = self.gold.saturating_add(gold);
                self.last_gain = self.vertices.len() - 1;
            }
        }
    }

    /// Moves the route to 'to', through an edge of the given length.
    pub fn push(&mut self, graph: &Graph, to: VertexId, length: Length) {
        self.length = self.length.saturating_add(length);
        self.visit(graph, to);
    }

    /// Copy of this route, extended by one step.
    pub fn with_step(&self, graph: &Graph, to: VertexId, length: Length) -> Route {
        let mut route = self.clone();
        route.push(graph, to, length);
        route
    }

    #[inline]
    pub fn origin(&self) -> VertexId {
        self.vertices[0]
    }

    #[inline]
    pub fn current(&self) -> VertexId {
        self.vertices[self.vertices.len() - 1]
    }

    #[inline]
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    #[inline]
    pub fn length(&self) -> Length {
        self.length
    }

    #[inline]
    pub fn gold(&self) -> Gold {
        self.gold
    }

    #[inline]
    pub fn has_visited(&self, v: VertexId) -> bool {
        self.seen[v / 64] & (1u64 << (v % 64)) != 0
    }

    // Whether 'v' was already walked through since gold was last collected.
    // Stepping there again cannot lead anywhere new.
    pub fn visited_since_last_gain(&self, v: VertexId) -> bool {
        self.has_visited(v) && self.vertices[self.last_gain..].contains(&v)
    }

    /// Strictly more gold, or as much gold in strictly less time.
    pub fn dominates(&self, other: &Route) -> bool {
        self.gold > other.gold || (self.gold == other.gold && self.length < other.length)
    }

    pub fn external_ids(&self, graph: &Graph) -> Vec<u64> {
        self.vertices.iter().map(|&v| graph.external_id(v)).collect()
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.gold == other.gold && self.length == other.length
            && self.current() == other.current()
    }
}

impl Eq for Route {}

impl Hash for Route {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.gold.hash(state);
        self.length.hash(state);
        self.current().hash(state);
    }
}
