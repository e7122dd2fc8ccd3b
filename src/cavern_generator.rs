// Random grid caverns, to try solvers on something bigger than hand-written
// tests. Passages are carved as a random spanning tree of the grid (so every
// tile can reach the exit), then a few extra passages open loops.

use log::debug;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::cavern_interface::{Cavern, EdgeDescription, NodeDescription};
use crate::escape::Error;
use crate::graph::{Gold, Length};
use crate::pathfinding::ExitTree;

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct GeneratorParams {
    pub rows: i32,
    pub columns: i32,

    /// Chance for a tile to hold gold.
    pub gold_probability: f64,

    /// Gold on a tile holding some, drawn from 1..=max_gold.
    pub max_gold: Gold,

    /// Chance for each pair of adjacent tiles not connected by the spanning
    /// tree to get a passage anyway.
    pub loop_probability: f64,

    /// Passages are 1 + up to this much long.
    pub max_extra_length: Length,

    /// Time budget, as a multiple of the shortest escape.
    pub time_factor: f64,

    /// Seed to use for randomness.
    pub seed: u64,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        GeneratorParams {
            rows: 24,
            columns: 24,
            gold_probability: 0.15,
            max_gold: 10,
            loop_probability: 0.1,
            max_extra_length: 3,
            time_factor: 2.0,
            seed: 42,
        }
    }
}

/// Generates a cavern starting in the top-left corner, with the exit in the
/// bottom-right one.
pub fn generate(params: &GeneratorParams) -> Result<Cavern, Error> {
    if params.rows <= 0 || params.columns <= 0 {
        return Err(Error::InvalidCavern(
            format!("can't generate a {}x{} cavern", params.rows, params.columns)));
    }
    for probability in [params.gold_probability, params.loop_probability] {
        if !(0.0..=1.0).contains(&probability) {
            return Err(Error::InvalidCavern(format!("bad probability {probability}")));
        }
    }
    let mut rng = SmallRng::seed_from_u64(params.seed);
    let (rows, columns) = (params.rows, params.columns);
    let id = |row: i32, column: i32| (row * columns + column) as u64;
    let start = id(0, 0);
    let exit = id(rows - 1, columns - 1);

    let nodes: Vec<NodeDescription> = (0..rows)
        .flat_map(|row| (0..columns).map(move |column| (row, column)))
        .map(|(row, column)| {
            let tile = id(row, column);
            let has_gold = tile != start && tile != exit
                && rng.gen_bool(params.gold_probability);
            let gold = if has_gold { rng.gen_range(1..=params.max_gold.max(1)) } else { 0 };
            NodeDescription { id: tile, row, column, gold }
        })
        .collect();

    // Randomized depth-first carving.
    let mut carved = vec![false; nodes.len()];
    let mut connected = rustc_hash::FxHashSet::default();
    let mut edges = Vec::new();
    let mut stack = vec![(0, 0)];
    carved[0] = true;
    while let Some(&(row, column)) = stack.last() {
        let mut next: Vec<(i32, i32)> = [(-1, 0), (1, 0), (0, -1), (0, 1)].iter()
            .map(|(dr, dc)| (row + dr, column + dc))
            .filter(|&(r, c)| r >= 0 && r < rows && c >= 0 && c < columns)
            .filter(|&(r, c)| !carved[id(r, c) as usize])
            .collect();
        next.shuffle(&mut rng);
        match next.first() {
            Some(&(r, c)) => {
                carved[id(r, c) as usize] = true;
                let length = 1 + rng.gen_range(0..=params.max_extra_length);
                edges.push(EdgeDescription { from: id(row, column), to: id(r, c), length });
                connected.insert((id(row, column).min(id(r, c)), id(row, column).max(id(r, c))));
                stack.push((r, c));
            },
            None => {
                stack.pop();
            },
        }
    }

    // Loops.
    for row in 0..rows {
        for column in 0..columns {
            for (r, c) in [(row + 1, column), (row, column + 1)] {
                if r >= rows || c >= columns || connected.contains(&(id(row, column), id(r, c))) {
                    continue;
                }
                if rng.gen_bool(params.loop_probability) {
                    let length = 1 + rng.gen_range(0..=params.max_extra_length);
                    edges.push(EdgeDescription { from: id(row, column), to: id(r, c), length });
                }
            }
        }
    }

    let mut cavern = Cavern { nodes, edges, start, exit, time_remaining: 0, directed: false };
    let graph = cavern.to_graph()?;
    let shortest = ExitTree::new(&graph, graph.vertex_id(exit)?)
        .distance(graph.vertex_id(start)?)
        .ok_or(Error::UnreachableExit { start, exit })?;
    cavern.time_remaining = (shortest as f64 * params.time_factor).ceil() as Length;
    debug!("Generated {}x{} cavern: {} passages, shortest escape {}, {} time",
           rows, columns, cavern.edges.len(), shortest, cavern.time_remaining);
    Ok(cavern)
}
