use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use cavern_escape::branch_and_bound::SearchConfig;
use cavern_escape::cavern_generator::{generate, GeneratorParams};
use cavern_escape::escape::EscapeProblem;
use cavern_escape::heuristics::Heuristics;
use cavern_escape::pathfinding::{ExitTree, Pathfinder};
use cavern_escape::solvers::{BranchAndBoundSolver, ShortestEscapeSolver, Solver};

fn make_problem() -> Arc<EscapeProblem> {
    let params = GeneratorParams { rows: 32, columns: 32, ..GeneratorParams::default() };
    let cavern = generate(&params).expect("Couldn't generate cavern");
    Arc::new(cavern.to_problem().expect("Couldn't build escape problem"))
}

fn bench_preprocessing(c: &mut Criterion) {
    let problem = make_problem();
    let graph = problem.graph.as_ref();
    let mut group = c.benchmark_group("preprocessing");
    group.bench_function("A* shortest route", |b| b.iter(|| {
        Pathfinder::new().shortest_route(graph, problem.start, problem.exit)
    }));
    group.bench_function("exit tree", |b| b.iter(|| {
        ExitTree::new(graph, problem.exit)
    }));
    group.bench_function("heuristics", |b| b.iter(|| {
        Heuristics::analyze(graph, problem.start, problem.exit)
    }));
    group.finish();
}

fn bench_solvers(c: &mut Criterion) {
    let problem = make_problem();
    let config = SearchConfig { deadline_ms: 20, ..SearchConfig::default() };
    let mut group = c.benchmark_group("solvers");
    group.bench_function("shortest escape", |b| b.iter(|| {
        ShortestEscapeSolver {}.do_solve(&problem)
    }));
    group.bench_function("branch-and-bound, 20ms", |b| b.iter(|| {
        BranchAndBoundSolver::new(config.clone()).do_solve(&problem)
    }));
    group.finish();
}

criterion_group!{
    name = benches;
    // Limit sample size given the fixed search deadline. Results will be noisy.
    config = Criterion::default().sample_size(20);
    targets = bench_preprocessing, bench_solvers,
}
criterion_main!(benches);
