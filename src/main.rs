//! Task dependency graph service.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use task_deps::api::{ApiState, start_server};
use task_deps::cli::{Cli, Command};
use task_deps::config::{Config, ConfigLoader, ConfigPaths};
use task_deps::db::Database;
use task_deps::graph::DependencyGraph;
use task_deps::logging;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_target(), cli.verbose)?;

    let mut paths = ConfigPaths::discover();
    if let Some(ref config_path) = cli.config {
        paths = paths.with_explicit_file(config_path);
    }
    let mut loader = ConfigLoader::load_with(paths, |key| std::env::var(key).ok())?;
    if let Some(path) = loader.config_path() {
        info!("Using config {}", path.display());
    }
    debug!(tiers = ?loader.applied_tiers(), "configuration loaded");

    cli.apply_overrides(loader.config_mut());
    let config = loader.into_config();
    config.validate()?;

    let graph = open_graph(&config)?;

    match cli.command {
        Some(Command::Check) => run_check(&graph).await,
        Some(Command::Serve) | None => run_server(&config, graph).await,
    }
}

fn open_graph(config: &Config) -> Result<Arc<DependencyGraph>> {
    config.ensure_db_dir()?;
    let db = Arc::new(Database::open(&config.server.db_path)?);
    info!("Opened database {}", config.server.db_path.display());

    let graph = DependencyGraph::new(db.clone(), db)
        .with_config(config.dependencies.clone())
        .with_external_edges(config.gantt.external_edges);
    Ok(Arc::new(graph))
}

async fn run_server(config: &Config, graph: Arc<DependencyGraph>) -> Result<()> {
    let handle = start_server(
        ApiState::new(graph),
        &config.bind_addr(),
        Duration::from_millis(config.server.request_timeout_ms),
    )
    .await?;

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C, shutting down");
    handle.shutdown().await;
    Ok(())
}

async fn run_check(graph: &DependencyGraph) -> Result<()> {
    let report = graph.audit().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.cycle.is_some() {
        std::process::exit(1);
    }
    Ok(())
}
