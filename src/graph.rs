use itertools::Itertools;
use log::debug;
use rustc_hash::FxHashMap;

use crate::escape::Error;

// Dense index of a vertex in a `Graph`. External (cavern) ids are mapped to
// these once, at construction.
pub type VertexId = usize;
pub type Length = u32;
pub type Gold = u32;

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub struct Pos {
    pub row: i32,
    pub column: i32,
}

pub fn euclidean_distance(a: &Pos, b: &Pos) -> f64 {
    let rows = (a.row - b.row) as f64;
    let columns = (a.column - b.column) as f64;
    (rows * rows + columns * columns).sqrt()
}

#[derive(Debug, Clone)]
pub struct Vertex {
    /// Stable id given by the cavern description.
    pub id: u64,
    pub pos: Pos,
    pub gold: Gold,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Edge {
    pub to: VertexId,
    pub length: Length,
}

/// Read-only cavern graph. Edges are directed; undirected connections are
/// stored as two opposite edges.
#[derive(Debug, Clone)]
pub struct Graph {
    vertices: Vec<Vertex>,
    // exits[from]
    exits: Vec<Vec<Edge>>,
    // entrances[to], where `Edge::to` is the vertex the edge comes from.
    entrances: Vec<Vec<Edge>>,
    ids: FxHashMap<u64, VertexId>,
}

impl Graph {
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> impl Iterator<Item=VertexId> {
        0..self.vertices.len()
    }

    #[inline]
    pub fn gold(&self, v: VertexId) -> Gold {
        self.vertices[v].gold
    }

    #[inline]
    pub fn pos(&self, v: VertexId) -> &Pos {
        &self.vertices[v].pos
    }

    #[inline]
    pub fn exits(&self, v: VertexId) -> &[Edge] {
        &self.exits[v]
    }

    #[inline]
    pub fn entrances(&self, v: VertexId) -> &[Edge] {
        &self.entrances[v]
    }

    // Distinct vertices connected to 'v' in either direction, without 'v'.
    pub fn neighbors(&self, v: VertexId) -> impl Iterator<Item=VertexId> + '_ {
        self.exits[v].iter().chain(self.entrances[v].iter())
            .map(|edge| edge.to)
            .filter(move |&other| other != v)
            .unique()
    }

    // Straight-line distance between two vertices.
    #[inline]
    pub fn distance(&self, a: VertexId, b: VertexId) -> f64 {
        euclidean_distance(self.pos(a), self.pos(b))
    }

    pub fn vertex_id(&self, id: u64) -> Result<VertexId, Error> {
        self.ids.get(&id).copied().ok_or(Error::UnknownVertex(id))
    }

    #[inline]
    pub fn external_id(&self, v: VertexId) -> u64 {
        self.vertices[v].id
    }

    pub fn num_edges(&self) -> usize {
        self.exits.iter().map(Vec::len).sum()
    }
}

#[derive(Default)]
pub struct GraphBuilder {
    vertices: Vec<Vertex>,
    exits: Vec<Vec<Edge>>,
    entrances: Vec<Vec<Edge>>,
    ids: FxHashMap<u64, VertexId>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        GraphBuilder::default()
    }

    pub fn vertex(&mut self, id: u64, pos: Pos, gold: Gold) -> Result<VertexId, Error> {
        if self.ids.contains_key(&id) {
            return Err(Error::InvalidCavern(format!("duplicate vertex id {id}")));
        }
        let v = self.vertices.len();
        self.vertices.push(Vertex { id, pos, gold });
        self.exits.push(Vec::new());
        self.entrances.push(Vec::new());
        self.ids.insert(id, v);
        Ok(v)
    }

    /// Dense id of a vertex added so far.
    pub fn vertex_id(&self, id: u64) -> Result<VertexId, Error> {
        self.ids.get(&id).copied().ok_or(Error::UnknownVertex(id))
    }

    pub fn edge(&mut self, from: VertexId, to: VertexId, length: Length) -> Result<(), Error> {
        for v in [from, to] {
            if v >= self.vertices.len() {
                return Err(Error::InvalidCavern(format!("edge to missing vertex #{v}")));
            }
        }
        self.exits[from].push(Edge { to, length });
        self.entrances[to].push(Edge { to: from, length });
        Ok(())
    }

    pub fn undirected_edge(&mut self, a: VertexId, b: VertexId, length: Length) -> Result<(), Error> {
        self.edge(a, b, length)?;
        self.edge(b, a, length)
    }

    pub fn build(self) -> Graph {
        let graph = Graph {
            vertices: self.vertices,
            exits: self.exits,
            entrances: self.entrances,
            ids: self.ids,
        };
        debug!("Graph created: {} vertices, {} edges", graph.len(), graph.num_edges());
        graph
    }
}
