//! Sluice CLI - column-level lineage for SQL pipelines
//!
//! Usage:
//!   sluice lineage <pipeline.json> [--asset <name>] [--output json|plain] [--fail-on-issues] [--no-cache]
//!   sluice schema <pipeline.json> [--asset <name>]
//!   sluice deps <pipeline.json> <asset> [--full]
//!   sluice impact <pipeline.json> <asset.column>
//!
//! Examples:
//!   sluice lineage pipeline.json --asset mart.orders --output plain
//!   sluice deps pipeline.json mart.orders --full
//!   sluice impact resolved.json raw.orders.amount

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sluice::cache::{AnalysisCache, CachedAnalyzer};
use sluice::config::Settings;
use sluice::graph::{AssetGraph, ColumnLineageGraph, ColumnRef};
use sluice::lineage::{
    project_all, project_upstreams_of, LineageAnalyzer, LineageExtractor, LineageIssue,
};
use sluice::pipeline::Pipeline;
use sluice::worker::{WorkerAnalyzer, WorkerClient, WorkerError};
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;

#[derive(Parser)]
#[command(name = "sluice")]
#[command(about = "Sluice - column-level lineage for SQL data pipelines")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve column lineage and print the enriched pipeline
    Lineage {
        /// Path to the pipeline JSON file
        file: PathBuf,

        /// Only resolve this asset and its upstreams
        #[arg(short, long)]
        asset: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "json")]
        output: OutputFormat,

        /// Exit with failure when any asset could not be resolved
        #[arg(long)]
        fail_on_issues: bool,

        /// Bypass the analysis cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Print the schema hint the analyzer would receive
    Schema {
        /// Path to the pipeline JSON file
        file: PathBuf,

        /// Restrict to this asset's upstreams
        #[arg(short, long)]
        asset: Option<String>,
    },

    /// Show upstream and downstream assets
    Deps {
        /// Path to the pipeline JSON file
        file: PathBuf,

        /// Asset name
        asset: String,

        /// Include transitive dependencies
        #[arg(long)]
        full: bool,
    },

    /// List downstream columns affected by a change to a column
    Impact {
        /// Path to a resolved pipeline JSON file
        file: PathBuf,

        /// Column as asset.column
        column: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Enriched pipeline and issues as JSON
    Json,
    /// Columns and their sources, one asset per block
    Plain,
}

#[derive(Serialize)]
struct LineageOutput<'a> {
    pipeline: &'a Pipeline,
    issues: &'a [LineageIssue],
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = sluice::logging::init(&settings.logging) {
        eprintln!("{}", e);
    }

    match cli.command {
        Commands::Lineage {
            file,
            asset,
            output,
            fail_on_issues,
            no_cache,
        } => cmd_lineage(&settings, file, asset, output, fail_on_issues, no_cache).await,
        Commands::Schema { file, asset } => cmd_schema(file, asset),
        Commands::Deps { file, asset, full } => cmd_deps(file, asset, full),
        Commands::Impact { file, column } => cmd_impact(file, column),
    }
}

fn load_pipeline(file: &PathBuf) -> Option<Pipeline> {
    match Pipeline::from_file(file) {
        Ok(p) => Some(p),
        Err(e) => {
            eprintln!("Error loading pipeline '{}': {}", file.display(), e);
            None
        }
    }
}

async fn build_analyzer(
    settings: &Settings,
    no_cache: bool,
) -> Result<Box<dyn LineageAnalyzer>, String> {
    let path = settings
        .analyzer_path()
        .map_err(|e| e.to_string())?
        .ok_or_else(|| WorkerError::NotConfigured.to_string())?;

    let client =
        WorkerClient::spawn_with_timeout(&path, &settings.analyzer.args, settings.analyzer.timeout())
            .await
            .map_err(|e| e.to_string())?;
    let analyzer =
        WorkerAnalyzer::with_client(client).with_max_query_length(settings.analyzer.max_query_length);

    if no_cache || !settings.cache.enabled {
        return Ok(Box::new(analyzer));
    }

    let cache = match settings.cache_path().map_err(|e| e.to_string())? {
        Some(path) => AnalysisCache::open_at(&path),
        None => AnalysisCache::open(),
    };
    match cache {
        Ok(cache) => Ok(Box::new(CachedAnalyzer::new(analyzer, cache))),
        Err(e) => {
            warn!(error = %e, "analysis cache unavailable, continuing without it");
            Ok(Box::new(analyzer))
        }
    }
}

async fn cmd_lineage(
    settings: &Settings,
    file: PathBuf,
    asset: Option<String>,
    output: OutputFormat,
    fail_on_issues: bool,
    no_cache: bool,
) -> ExitCode {
    let Some(mut pipeline) = load_pipeline(&file) else {
        return ExitCode::FAILURE;
    };

    if let Some(name) = &asset {
        if pipeline.find_asset(name).is_none() {
            eprintln!("Asset '{}' not found in pipeline", name);
            return ExitCode::FAILURE;
        }
    }

    let analyzer = match build_analyzer(settings, no_cache).await {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error starting analyzer: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let extractor = LineageExtractor::new(analyzer).with_renderer(settings.render.renderer());
    let report = match &asset {
        Some(name) => {
            extractor
                .column_lineage(&mut pipeline, name, &mut HashSet::new())
                .await
        }
        None => extractor.resolve_pipeline(&mut pipeline).await,
    };

    pipeline.wipe_sql();
    match output {
        OutputFormat::Json => {
            let out = LineageOutput {
                pipeline: &pipeline,
                issues: report.issues(),
            };
            match serde_json::to_string_pretty(&out) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error serializing output: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        OutputFormat::Plain => {
            print_plain(&pipeline);
            if !report.is_empty() {
                eprint!("{}", report);
            }
        }
    }

    if fail_on_issues && !report.is_empty() {
        eprintln!("{} asset(s) failed lineage resolution", report.len());
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn print_plain(pipeline: &Pipeline) {
    for asset in pipeline.assets() {
        println!("{} ({})", asset.name(), asset.asset_type);
        for column in &asset.columns {
            let sources = column
                .upstreams
                .iter()
                .map(|u| format!("{}.{}", u.table, u.column))
                .collect::<Vec<_>>()
                .join(", ");
            if sources.is_empty() {
                println!("  {} {}", column.name, column.data_type);
            } else {
                println!("  {} {} <- {}", column.name, column.data_type, sources);
            }
        }
        println!();
    }
}

fn cmd_schema(file: PathBuf, asset: Option<String>) -> ExitCode {
    let Some(pipeline) = load_pipeline(&file) else {
        return ExitCode::FAILURE;
    };

    let schema = match &asset {
        Some(name) => match pipeline.find_asset(name) {
            Some(a) => project_upstreams_of(&pipeline, a),
            None => {
                eprintln!("Asset '{}' not found in pipeline", name);
                return ExitCode::FAILURE;
            }
        },
        None => project_all(&pipeline),
    };

    match serde_json::to_string_pretty(&schema) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing schema: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_deps(file: PathBuf, asset: String, full: bool) -> ExitCode {
    let Some(pipeline) = load_pipeline(&file) else {
        return ExitCode::FAILURE;
    };

    let graph = AssetGraph::from_pipeline(&pipeline);
    if !graph.contains(&asset) {
        eprintln!("Asset '{}' not found in pipeline", asset);
        return ExitCode::FAILURE;
    }
    if let Err(cycles) = graph.validate_no_cycles() {
        eprint!("Warning: {}", cycles);
    }

    let (upstream, downstream) = if full {
        (graph.all_upstream(&asset), graph.all_downstream(&asset))
    } else {
        (graph.direct_upstream(&asset), graph.direct_downstream(&asset))
    };

    println!("Upstream ({}):", upstream.len());
    for name in &upstream {
        println!("  {}", name);
    }
    println!("Downstream ({}):", downstream.len());
    for name in &downstream {
        println!("  {}", name);
    }
    ExitCode::SUCCESS
}

fn cmd_impact(file: PathBuf, column: String) -> ExitCode {
    let Some(col) = ColumnRef::parse(&column) else {
        eprintln!("Invalid column '{}': expected asset.column", column);
        return ExitCode::FAILURE;
    };
    let Some(pipeline) = load_pipeline(&file) else {
        return ExitCode::FAILURE;
    };

    let graph = ColumnLineageGraph::from_pipeline(&pipeline);
    let mut affected: Vec<ColumnRef> = graph.impact_analysis(&col).into_iter().collect();
    affected.sort();

    if affected.is_empty() {
        println!("No downstream columns depend on {}", col);
    } else {
        println!("Columns affected by a change to {} ({}):", col, affected.len());
        for c in &affected {
            println!("  {}", c);
        }
    }
    ExitCode::SUCCESS
}
