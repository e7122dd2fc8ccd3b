use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::escape::{Budget, EscapeProblem, Error, Solution};
use crate::graph::{Gold, Graph, GraphBuilder, Length, Pos};

#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy)]
pub struct NodeDescription {
    pub id: u64,
    pub row: i32,
    pub column: i32,
    #[serde(default)]
    pub gold: Gold,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy)]
pub struct EdgeDescription {
    pub from: u64,
    pub to: u64,
    pub length: Length,
}

/// A cavern as exchanged in JSON files. Ids are the caller's own.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Cavern {
    pub nodes: Vec<NodeDescription>,
    pub edges: Vec<EdgeDescription>,
    pub start: u64,
    pub exit: u64,
    pub time_remaining: Length,
    /// Edges go both ways unless this is set.
    #[serde(default)]
    pub directed: bool,
}

impl Cavern {
    pub fn to_graph(&self) -> Result<Graph, Error> {
        let mut builder = GraphBuilder::new();
        for node in &self.nodes {
            builder.vertex(node.id, Pos { row: node.row, column: node.column }, node.gold)?;
        }
        for edge in &self.edges {
            let from = builder.vertex_id(edge.from)?;
            let to = builder.vertex_id(edge.to)?;
            if self.directed {
                builder.edge(from, to, edge.length)?;
            } else {
                builder.undirected_edge(from, to, edge.length)?;
            }
        }
        Ok(builder.build())
    }

    /// The escape problem with a fixed budget of 'time_remaining'.
    pub fn to_problem(&self) -> Result<EscapeProblem, Error> {
        self.to_problem_with_budget(Arc::new(self.time_remaining))
    }

    /// The escape problem, with time kept by 'budget' (which may keep going
    /// down while solving).
    pub fn to_problem_with_budget(&self, budget: Arc<dyn Budget>) -> Result<EscapeProblem, Error> {
        let graph = self.to_graph()?;
        if graph.is_empty() {
            return Err(Error::InvalidCavern("no nodes".to_string()));
        }
        let start = graph.vertex_id(self.start)?;
        let exit = graph.vertex_id(self.exit)?;
        Ok(EscapeProblem::new(Arc::new(graph), start, exit, budget))
    }
}

/// What we print once solved.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EscapePlan {
    pub solver: String,
    pub route: Vec<u64>,
    pub gold: Gold,
    pub length: Length,
    pub time_remaining: Length,
    pub routes_evaluated: usize,
    pub routes_accepted: usize,
}

impl EscapePlan {
    pub fn new(solver: &str, problem: &EscapeProblem, solution: &Solution) -> Self {
        EscapePlan {
            solver: solver.to_string(),
            route: solution.route.external_ids(&problem.graph),
            gold: solution.route.gold(),
            length: solution.route.length(),
            time_remaining: problem.time_remaining(),
            routes_evaluated: solution.routes_evaluated,
            routes_accepted: solution.routes_accepted,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use crate::route::Route;
    use super::*;

    fn cavern_json() -> serde_json::Value {
        json!({
            "nodes": [
                {"id": 10, "row": 0, "column": 0},
                {"id": 20, "row": 0, "column": 1, "gold": 3},
                {"id": 30, "row": 1, "column": 1},
            ],
            "edges": [
                {"from": 10, "to": 20, "length": 2},
                {"from": 20, "to": 30, "length": 1},
            ],
            "start": 10,
            "exit": 30,
            "timeRemaining": 12,
        })
    }

    #[test]
    fn test_parse_cavern() {
        let cavern: Cavern = serde_json::from_value(cavern_json()).unwrap();
        assert!(!cavern.directed);
        assert_eq!(cavern.nodes[0].gold, 0);
        let problem = cavern.to_problem().unwrap();
        assert_eq!(problem.graph.len(), 3);
        assert_eq!(problem.graph.num_edges(), 4);
        assert_eq!(problem.graph.external_id(problem.start), 10);
        assert_eq!(problem.graph.external_id(problem.exit), 30);
        assert_eq!(problem.time_remaining(), 12);
        assert_eq!(problem.graph.gold(1), 3);
    }

    #[test]
    fn test_directed_cavern() {
        let mut value = cavern_json();
        value["directed"] = json!(true);
        let cavern: Cavern = serde_json::from_value(value).unwrap();
        let graph = cavern.to_graph().unwrap();
        assert_eq!(graph.num_edges(), 2);
        assert!(graph.exits(2).is_empty());
    }

    #[test]
    fn test_unknown_ids_are_rejected() {
        let mut cavern: Cavern = serde_json::from_value(cavern_json()).unwrap();
        cavern.exit = 99;
        assert!(matches!(cavern.to_problem(), Err(Error::UnknownVertex(99))));
        cavern.exit = 30;
        cavern.edges.push(EdgeDescription { from: 10, to: 42, length: 1 });
        assert!(matches!(cavern.to_graph(), Err(Error::UnknownVertex(42))));
    }

    #[test]
    fn test_empty_cavern_is_rejected() {
        let mut cavern: Cavern = serde_json::from_value(cavern_json()).unwrap();
        cavern.nodes.clear();
        cavern.edges.clear();
        assert!(matches!(cavern.to_problem(), Err(Error::InvalidCavern(_))));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut cavern: Cavern = serde_json::from_value(cavern_json()).unwrap();
        cavern.nodes.push(NodeDescription { id: 20, row: 5, column: 5, gold: 0 });
        assert!(matches!(cavern.to_graph(), Err(Error::InvalidCavern(_))));
    }

    #[test]
    fn test_plan_uses_external_ids() {
        let cavern: Cavern = serde_json::from_value(cavern_json()).unwrap();
        let problem = cavern.to_problem().unwrap();
        let route = Route::new(&problem.graph, 0)
            .with_step(&problem.graph, 1, 2)
            .with_step(&problem.graph, 2, 1);
        let solution = Solution { route, routes_evaluated: 3, routes_accepted: 1 };
        let plan = EscapePlan::new("test", &problem, &solution);
        assert_eq!(plan.route, vec![10, 20, 30]);
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["gold"], json!(3));
        assert_eq!(value["routesEvaluated"], json!(3));
        assert_eq!(value["timeRemaining"], json!(12));
    }
}
