//! BDD Context - command line
//!
//! Builds the context map of a Java codebase and reports which BDD feature
//! files a change set makes stale.

use anyhow::{Context, Result};
use bdd_context::graph::{ContextMap, ContextMapDiff};
use bdd_context::impact::ChangeSet;
use bdd_context::{Config, ImpactEngine};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bdd-context")]
#[command(about = "Context model builder and change-impact engine for BDD artifacts")]
struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, global = true, env = "BDD_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the source root and write the context map
    Scan {
        /// Source root (overrides config)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Context map output path (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Parse files in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Compute the artifacts affected by a set of changed files
    Impact {
        /// Changed repository-relative paths
        paths: Vec<String>,

        /// Read changes from `git diff --name-status` output ("-" for stdin)
        #[arg(long)]
        name_status: Option<PathBuf>,

        /// Source root (overrides config)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Context map to start from (overrides config)
        #[arg(long)]
        context_map: Option<PathBuf>,

        /// Ignore any existing context map and scan the source root
        #[arg(long)]
        rebuild: bool,

        /// Write the refreshed context map back
        #[arg(long)]
        save: bool,
    },

    /// Compare two context maps
    Diff {
        /// Previous context map
        old: PathBuf,
        /// Current context map
        new: PathBuf,
    },
}

#[derive(Serialize)]
struct ScanOutput {
    parsed: usize,
    failed: usize,
    skipped: usize,
    classes: usize,
    endpoints: usize,
    context_map: PathBuf,
}

#[derive(Serialize)]
struct DiffOutput {
    #[serde(flatten)]
    diff: ContextMapDiff,
    #[serde(flatten)]
    plan: bdd_context::impact::ArtifactPlan,
}

fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = Config::from_yaml_and_env(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan {
            root,
            output,
            parallel,
        } => run_scan(config, root, output, parallel),
        Commands::Impact {
            paths,
            name_status,
            root,
            context_map,
            rebuild,
            save,
        } => {
            let mut config = config;
            if let Some(root) = root {
                config.source_root = root;
            }
            if let Some(path) = context_map {
                config.context_map = path;
            }
            let changes = read_changes(paths, name_status.as_deref())?;
            run_impact(config, &changes, rebuild, save)
        }
        Commands::Diff { old, new } => run_diff(config, &old, &new),
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,bdd_context=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries results, logs go to stderr
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn run_scan(
    mut config: Config,
    root: Option<PathBuf>,
    output: Option<PathBuf>,
    parallel: bool,
) -> Result<()> {
    if let Some(root) = root {
        config.source_root = root;
    }
    if let Some(output) = output {
        config.context_map = output;
    }
    config.parallel |= parallel;

    let mut engine = ImpactEngine::from_config(&config);
    let summary = engine
        .build()
        .with_context(|| format!("Failed to scan {}", config.source_root.display()))?;
    engine.save_context_map(&config.context_map)?;

    let graph = engine.builder().graph();
    print_json(&ScanOutput {
        parsed: summary.parsed,
        failed: summary.failed,
        skipped: summary.skipped,
        classes: graph.types().count(),
        endpoints: graph.endpoints().count(),
        context_map: config.context_map.clone(),
    })
}

fn read_changes(paths: Vec<String>, name_status: Option<&Path>) -> Result<ChangeSet> {
    let mut changes: ChangeSet = paths.into_iter().collect();

    if let Some(source) = name_status {
        let text = if source == Path::new("-") {
            std::io::read_to_string(std::io::stdin()).context("Failed to read name-status from stdin")?
        } else {
            std::fs::read_to_string(source)
                .with_context(|| format!("Failed to read {}", source.display()))?
        };
        for path in ChangeSet::from_name_status(&text).iter() {
            changes.push(path);
        }
    }

    tracing::info!("Change set: {} paths", changes.len());
    Ok(changes)
}

fn run_impact(config: Config, changes: &ChangeSet, rebuild: bool, save: bool) -> Result<()> {
    let mut engine = ImpactEngine::from_config(&config);

    if !rebuild && config.context_map.is_file() {
        engine.load_context_map(&config.context_map)?;
    } else {
        engine
            .build()
            .with_context(|| format!("Failed to scan {}", config.source_root.display()))?;
    }

    let report = engine.analyze(changes)?;

    if save {
        engine.save_context_map(&config.context_map)?;
    }

    print_json(&report)
}

fn run_diff(config: Config, old: &Path, new: &Path) -> Result<()> {
    let old_map = ContextMap::load(old)?;
    let new_map = ContextMap::load(new)?;

    let diff = ContextMapDiff::between(&old_map, &new_map);
    let plan = ImpactEngine::from_config(&config)
        .selector()
        .plan_for_diff(&diff);

    print_json(&DiffOutput { diff, plan })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
