use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::{error, info};
use serde_json::Value;
use std::process::ExitCode;
use thiserror::Error;

use cavern_escape::branch_and_bound::SearchConfig;
use cavern_escape::cavern_interface::{Cavern, EscapePlan};
use cavern_escape::escape;
use cavern_escape::solvers::{BranchAndBoundSolver, ShortestEscapeSolver, Solver};

#[derive(ValueEnum, Clone)]
enum SolverName {
    /// Shortest route to the exit, ignoring gold.
    Shortest,
    /// Multi-threaded branch-and-bound, improving on the shortest route
    /// until the deadline.
    BranchAndBound,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Cavern JSON file to escape from.
    cavern_file: String,

    /// Solver implementation to use to find a solution.
    #[arg(short, long, value_enum, default_value_t = SolverName::BranchAndBound)]
    solver: SolverName,

    /// When using branch-and-bound, search config JSON file to use.
    #[arg(long)]
    config_file: Option<String>,

    /// Overrides the search deadline, in milliseconds.
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Overrides the average edge length used to cut far away branches.
    #[arg(long)]
    average_edge_length: Option<f64>,

    /// Overrides the number of worker threads.
    #[arg(long)]
    workers: Option<usize>,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("Failed reading the input file")]
    ReadError(#[from] std::io::Error),
    #[error("Failed parsing the input file")]
    ParseError(#[from] serde_json::Error),
    #[error("Failed solving the cavern: {0}")]
    SolveError(#[from] escape::Error),
}

fn read_json<T: serde::de::DeserializeOwned>(filename: &str) -> Result<T, CliError> {
    let data = std::fs::read_to_string(filename)?;
    let parsed: Value = serde_json::from_str(&data)?;
    Ok(serde_json::from_value(parsed)?)
}

fn search_config(cli: &Cli) -> Result<SearchConfig, CliError> {
    let mut config = match &cli.config_file {
        Some(filename) => {
            info!("[B&B] Loading search config from {filename}");
            read_json(filename)?
        },
        None => SearchConfig::default(),
    };
    if let Some(deadline_ms) = cli.deadline_ms {
        config.deadline_ms = deadline_ms;
    }
    if let Some(average_edge_length) = cli.average_edge_length {
        config.average_edge_length = average_edge_length;
    }
    if cli.workers.is_some() {
        config.workers = cli.workers;
    }
    Ok(config)
}

fn new_solver(cli: &Cli) -> Result<Box<dyn Solver>, CliError> {
    Ok(match cli.solver {
        SolverName::Shortest => Box::new(ShortestEscapeSolver {}),
        SolverName::BranchAndBound => {
            let config = search_config(cli)?;
            info!("[B&B] {:?}", config);
            Box::new(BranchAndBoundSolver::new(config))
        },
    })
}

fn run(cli: &Cli) -> Result<EscapePlan, CliError> {
    let cavern: Cavern = read_json(&cli.cavern_file)?;
    let problem = cavern.to_problem()?;
    info!("Cavern {}: {} vertices, {} edges, {} time to escape",
          cli.cavern_file, problem.graph.len(), problem.graph.num_edges(),
          problem.time_remaining());
    let mut solver = new_solver(cli)?;
    let solution = solver.solve(&problem)?;
    Ok(EscapePlan::new(solver.name(), &problem, &solution))
}

fn main() -> ExitCode {
    // Load .env file
    dotenvy::dotenv().ok();
    // Init logger with default value of info
    // This can be overriden with RUST_LOG env var
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let plan = run(&cli).and_then(|plan| Ok(serde_json::to_string_pretty(&plan)?));
    match plan {
        Ok(plan) => {
            println!("{plan}");
            ExitCode::SUCCESS
        },
        Err(err) => {
            error!("Error while escaping {}:", cli.cavern_file);
            error!("  {}", err);
            ExitCode::FAILURE
        },
    }
}
