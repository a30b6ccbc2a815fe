//! Floorplan Solver CLI
//!
//! Usage:
//!   floorplan-solver [OPTIONS] [FILE]
//!
//! Reads a room graph (TOML) from FILE or stdin and writes the solved
//! layout as JSON to stdout. Logs go to stderr; set RUST_LOG or pass -v.

use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use floorplan_solver::graph::LayoutGraph;
use floorplan_solver::layout::lint;
use floorplan_solver::{
    ConfigError, LayoutOptimizer, PlacementStrategy, ShapeLibrary, SolveError, SolverConfig,
    VariationGenerator,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// Breadth-first from the anchor room
    Bfs,
    /// Force-directed embedding
    Spring,
}

impl From<Strategy> for PlacementStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Bfs => PlacementStrategy::BreadthFirst,
            Strategy::Spring => PlacementStrategy::Spring,
        }
    }
}

#[derive(Parser)]
#[command(name = "floorplan-solver")]
#[command(about = "Turn room adjacency graphs into polygonal floor plans")]
struct Cli {
    /// Graph file in TOML (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Solver configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Generate this many seeded variations instead of a single layout
    #[arg(short = 'n', long)]
    variations: Option<usize>,

    /// Seed for variations
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Initial placement strategy (overrides the config file)
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// Iteration budget (overrides the config file)
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Single-line JSON output
    #[arg(long)]
    compact: bool,

    /// Print lint warnings for the solved layout(s) to stderr
    #[arg(long)]
    lint: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<String, SolveError> {
    let mut config = match &cli.config {
        Some(path) => SolverConfig::from_file(path)?,
        None => SolverConfig::default(),
    };
    if let Some(strategy) = cli.strategy {
        config = config.with_placement(strategy.into());
    }
    if let Some(max_iterations) = cli.max_iterations {
        config = config.with_max_iterations(max_iterations);
    }

    let library = ShapeLibrary::new();
    let graph = match &cli.input {
        Some(path) => LayoutGraph::from_file(path, &library)?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(ConfigError::from)?;
            LayoutGraph::from_toml_str(&buffer, &library)?
        }
    };

    let optimizer = LayoutOptimizer::new(config.clone()).with_library(library);
    let layouts = match cli.variations {
        Some(count) => VariationGenerator::new(optimizer).generate_parallel(&graph, count, cli.seed)?,
        None => vec![optimizer.optimize(&graph)?],
    };

    if cli.lint {
        for (i, layout) in layouts.iter().enumerate() {
            for warning in lint::check(layout, &config) {
                eprintln!("lint (layout {}): {}", i, warning);
            }
        }
    }

    let json = match (cli.variations, cli.compact) {
        (None, true) => serde_json::to_string(&layouts[0])?,
        (None, false) => serde_json::to_string_pretty(&layouts[0])?,
        (Some(_), true) => serde_json::to_string(&layouts)?,
        (Some(_), false) => serde_json::to_string_pretty(&layouts)?,
    };
    Ok(json)
}
