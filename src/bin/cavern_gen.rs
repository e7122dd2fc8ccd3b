// Binary that writes a random cavern as JSON to stdout, to feed to the
// application binary (or to keep as a test case).

use clap::Parser;
use env_logger::Env;
use log::error;
use std::process::ExitCode;

use cavern_escape::cavern_generator::{generate, GeneratorParams};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Generator params JSON file to use. Flags below override it.
    #[arg(long)]
    params_file: Option<String>,

    #[arg(long)]
    rows: Option<i32>,

    #[arg(long)]
    columns: Option<i32>,

    /// Time budget as a multiple of the shortest escape.
    #[arg(long)]
    time_factor: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,
}

fn params(cli: &Cli) -> Result<GeneratorParams, Box<dyn std::error::Error>> {
    let mut params: GeneratorParams = match &cli.params_file {
        Some(filename) => serde_json::from_str(&std::fs::read_to_string(filename)?)?,
        None => GeneratorParams::default(),
    };
    params.rows = cli.rows.unwrap_or(params.rows);
    params.columns = cli.columns.unwrap_or(params.columns);
    params.time_factor = cli.time_factor.unwrap_or(params.time_factor);
    params.seed = cli.seed.unwrap_or(params.seed);
    Ok(params)
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cavern = params(&cli)
        .and_then(|params| Ok(generate(&params)?))
        .and_then(|cavern| Ok(serde_json::to_string(&cavern)?));
    match cavern {
        Ok(cavern) => {
            println!("{cavern}");
            ExitCode::SUCCESS
        },
        Err(err) => {
            error!("Failed generating a cavern: {}", err);
            ExitCode::FAILURE
        },
    }
}
