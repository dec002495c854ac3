//! assetpull — config-driven sync of external binary assets.
//!
//! Reads a JSON catalog of assets (name, destination, provider type, URL),
//! downloads each through its provider — Mega via the megatools CLI, or
//! direct HTTP — into a private staging directory, then unpacks archives
//! or moves plain files into the project tree. Records are processed one
//! at a time; a failure only ever skips its own record.

#![warn(clippy::all)]

mod cli;
mod config;
mod progress;
mod provider;
mod shutdown;
mod store;
mod sync;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Command;
use provider::{HttpProvider, MegaProvider, ProviderRegistry};
use sync::SyncPipeline;

/// The stock provider set: Mega first, then HTTP.
fn default_registry(megatools_path: Option<PathBuf>) -> anyhow::Result<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    registry.register(Box::new(MegaProvider::new(megatools_path)));
    registry.register(Box::new(HttpProvider::new()?));
    Ok(registry)
}

/// Run the sync command.
async fn run_sync(args: cli::SyncArgs) -> anyhow::Result<()> {
    let config = config::SyncConfig::from_cli(args);
    tracing::debug!(?config, "Resolved configuration");

    let records = store::load_records(&config.config_dir).await?;
    if records.is_empty() {
        println!("No assets in config. Nothing to do.");
        return Ok(());
    }
    let selected = store::select_records(records, &config.assets)?;

    tracing::info!(
        root = %config.root_dir.display(),
        assets = selected.len(),
        "Starting assetpull sync"
    );

    let registry = default_registry(config.megatools_path.clone())?;
    let pipeline = SyncPipeline::new(&config.root_dir, &config.temp_dir, registry);
    let shutdown_token = shutdown::install_signal_handler();

    let sink = |line: &str| println!("{line}");
    let report = pipeline.run(&selected, &sink, shutdown_token).await;

    tracing::info!(
        succeeded = report.succeeded(),
        skipped = report.skipped(),
        "Sync pass complete"
    );
    if report.skipped() > 0 {
        anyhow::bail!("{} of {} assets skipped", report.skipped(), report.len());
    }
    Ok(())
}

/// Run the list command.
async fn run_list(args: cli::ListArgs) -> anyhow::Result<()> {
    let config_dir = config::expand_tilde(&args.config_folder);
    let records = store::load_records(&config_dir).await?;
    let registry = default_registry(None)?;

    println!("Providers: {}", registry.available_tags().join(", "));
    println!();
    if records.is_empty() {
        println!("No assets configured.");
        return Ok(());
    }
    println!("Assets ({}):", records.len());
    for record in &records {
        println!("  {} [{}]", record.name, record.kind);
        println!("    → {}", record.location);
        println!("    {}", record.url);
    }
    Ok(())
}

/// Run the add command.
async fn run_add(args: cli::AddArgs) -> anyhow::Result<()> {
    let config_dir = config::expand_tilde(&args.config_folder);
    let mut records = store::load_records(&config_dir).await?;

    if records.iter().any(|r| r.name == args.name) {
        tracing::warn!(
            "Asset '{}' already exists; both records will share one staging directory name",
            args.name
        );
    }
    let registry = default_registry(None)?;
    if registry.resolve(&args.kind).is_none() {
        tracing::warn!(
            "Provider type '{}' is not registered (available: {}); the asset will be \
             skipped during sync",
            args.kind,
            registry.available_tags().join(", ")
        );
    }

    records.push(store::AssetRecord {
        name: args.name.clone(),
        location: args.location,
        kind: args.kind,
        url: args.url,
    });
    store::save_records(&config_dir, &records).await?;
    println!("Added '{}' ({} assets configured)", args.name, records.len());
    Ok(())
}

/// Run the remove command.
async fn run_remove(args: cli::RemoveArgs) -> anyhow::Result<()> {
    let config_dir = config::expand_tilde(&args.config_folder);
    let mut records = store::load_records(&config_dir).await?;
    let before = records.len();
    records.retain(|r| r.name != args.name);
    if records.len() == before {
        anyhow::bail!("Asset '{}' not found in the catalog", args.name);
    }
    store::save_records(&config_dir, &records).await?;
    println!("Removed '{}' ({} assets remain)", args.name, records.len());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let filter = match cli.log_level {
        cli::LogLevel::Debug => "debug",
        cli::LogLevel::Info => "info",
        cli::LogLevel::Warn => "warn",
        cli::LogLevel::Error => "error",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match cli.command {
        Command::Sync(args) => run_sync(args).await,
        Command::List(args) => run_list(args).await,
        Command::Add(args) => run_add(args).await,
        Command::Remove(args) => run_remove(args).await,
    }
}
