//! Chunkwise — compare chunking strategies for retrieval-augmented extraction.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod args;
mod commands;
mod output;

use args::{Cli, Command};
use chunkwise_core::ChunkwiseConfig;

fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()));
        if let Some(dir) = exe_dir {
            let parent_data = dir.join("../data");
            if parent_data.exists() {
                return parent_data;
            }
        }
        PathBuf::from("data")
    })
}

fn load_config(cli: &Cli) -> anyhow::Result<ChunkwiseConfig> {
    let data_dir = resolve_data_dir(cli.data_dir.clone());
    info!("Data directory: {}", data_dir.display());
    let mut config = match &cli.config {
        Some(path) => ChunkwiseConfig::load(path, &data_dir)?,
        None => ChunkwiseConfig::from_env(&data_dir)?,
    };
    if let Some(k) = cli.top_k {
        config.retrieval.top_k = k;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Command::Compare(args) => commands::compare(&config, args),
        Command::Build(args) => commands::build(&config, args),
        Command::Query(args) => commands::query(&config, args),
        Command::Evaluate(args) => commands::evaluate(&config, args),
    }
}
