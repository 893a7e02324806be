use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use geoadj::export::{
    write_annotated_graph, write_classification_report, write_clustering_scatter,
    write_degree_histogram, write_degree_table, write_geoid_csv,
};
use geoadj::metrics::{degree_sequence, mean_clustering};
use geoadj::predicates::list_nodes;
use geoadj::{
    classify_graph, import_graph_from_path, run_batch, AdjacencyGraph, AnalysisConfig,
    BatchPlan, DataLayout, Geography, NodeProperty, OutputLayout, State,
};

#[derive(Parser)]
#[command(
    name = "geoadj",
    version,
    about = "Structural statistics and neighbourhood classes for redistricting adjacency graphs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// TOML settings file; flags below override its values
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    #[arg(long, global = true, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    /// Comma-separated abbreviations, names or FIPS codes (default: all)
    #[arg(long, global = true, value_delimiter = ',')]
    states: Vec<String>,
    /// Comma-separated geographies (default: all)
    #[arg(long, global = true, value_delimiter = ',')]
    geographies: Vec<Geography>,
    /// Process a single graph file instead of the data directory
    #[arg(long, global = true, value_name = "FILE")]
    graph: Option<PathBuf>,
    /// State of the `--graph` file
    #[arg(long, global = true)]
    state: Option<String>,
    /// Geography of the `--graph` file
    #[arg(long, global = true)]
    geography: Option<Geography>,
}

#[derive(Subcommand, Clone)]
enum Command {
    /// Degree histogram chart
    Histogram,
    /// Clustering-by-degree scatter chart
    Scatter,
    /// GEOIDs of nodes with a structural property
    Csv {
        #[arg(long)]
        property: NodeProperty,
    },
    /// GEOID and degree of nodes with a structural property
    Table {
        #[arg(long)]
        property: NodeProperty,
    },
    /// Label nodes with the isomorphism class of their neighbourhood ball
    Classify {
        /// Only classify balls with exactly this many nodes
        #[arg(long, conflicts_with = "any_size")]
        ball_size: Option<usize>,
        /// Classify balls of every size
        #[arg(long)]
        any_size: bool,
        #[arg(long)]
        radius: Option<usize>,
    },
    /// Log basic structural statistics
    Stats,
}

fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

fn load_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_path(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Command::Classify {
        ball_size,
        any_size,
        radius,
    } = &cli.command
    {
        if *any_size {
            config.classifier.ball_size = None;
        } else if let Some(size) = ball_size {
            config.classifier.ball_size = Some(*size);
        }
        if let Some(radius) = radius {
            config.classifier.radius = *radius;
        }
    }
    config.validate()?;
    Ok(config)
}

fn run_command(
    command: &Command,
    graph: &mut AdjacencyGraph,
    config: &AnalysisConfig,
    output: &OutputLayout,
) -> Result<()> {
    match command {
        Command::Histogram => {
            write_degree_histogram(graph, output, &config.chart)?;
        }
        Command::Scatter => {
            write_clustering_scatter(graph, output, &config.chart)?;
        }
        Command::Csv { property } => {
            write_geoid_csv(graph, *property, output)?;
        }
        Command::Table { property } => {
            write_degree_table(graph, *property, output)?;
        }
        Command::Classify { .. } => {
            let summary = classify_graph(graph, &config.classifier)?;
            write_classification_report(graph, &summary, output)?;
            write_annotated_graph(graph, output)?;
        }
        Command::Stats => log_stats(graph),
    }
    Ok(())
}

fn log_stats(graph: &AdjacencyGraph) {
    let degrees = degree_sequence(graph);
    let mean_degree = if degrees.is_empty() {
        0.0
    } else {
        degrees.iter().sum::<usize>() as f64 / degrees.len() as f64
    };
    info!(
        "nodes {}, edges {}, mean degree {:.3}, max degree {}, mean clustering {:.4}",
        graph.node_count(),
        graph.edge_count(),
        mean_degree,
        degrees.iter().max().copied().unwrap_or(0),
        mean_clustering(graph)
    );
    for property in NodeProperty::ALL {
        info!("{} nodes: {}", property, list_nodes(graph, property).len());
    }
}

fn run_single(
    cli: &Cli,
    config: &AnalysisConfig,
    output: &OutputLayout,
    path: &Path,
) -> Result<()> {
    let (Some(state), Some(geography)) = (&cli.state, cli.geography) else {
        anyhow::bail!("--graph requires --state and --geography");
    };
    let state = State::lookup(state)?;
    let mut graph = import_graph_from_path(&config.loader(), path, geography, state)?;
    info!(
        "{} {}: {} nodes, {} edges",
        state.abbr,
        geography,
        graph.node_count(),
        graph.edge_count()
    );
    run_command(&cli.command, &mut graph, config, output)
        .with_context(|| format!("process graph {:?}", path))
}

fn run_all(cli: &Cli, config: &AnalysisConfig, output: &OutputLayout) -> Result<()> {
    let states: Vec<&'static State> = if cli.states.is_empty() {
        State::all().iter().collect()
    } else {
        cli.states
            .iter()
            .map(|key| State::lookup(key))
            .collect::<Result<_, _>>()?
    };
    let geographies = if cli.geographies.is_empty() {
        Geography::ALL.to_vec()
    } else {
        cli.geographies.clone()
    };

    let plan = BatchPlan::new(DataLayout::new(&config.data_dir), states, geographies);
    let report = run_batch(plan, &config.loader(), |graph| {
        run_command(&cli.command, graph, config, output)
    });

    if report.attempted() == 0 {
        warn!("No graphs found under {:?}", config.data_dir);
    } else if report.processed.is_empty() {
        anyhow::bail!("All {} graphs failed", report.failed.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let output = OutputLayout::new(&config.output_dir);

    match &cli.graph {
        Some(path) => run_single(&cli, &config, &output, path),
        None => run_all(&cli, &config, &output),
    }
}
