use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Parser, Debug)]
#[command(name = "assetpull", version, about = "Sync external binary assets into a project tree")]
pub struct Cli {
    /// Diagnostic log level (RUST_LOG overrides this)
    #[arg(long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download and place every configured asset (or a named subset)
    Sync(SyncArgs),
    /// Show the configured assets and the registered provider types
    List(ListArgs),
    /// Add an asset record to the catalog
    Add(AddArgs),
    /// Remove an asset record from the catalog
    Remove(RemoveArgs),
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Project root the assets are materialized into
    #[arg(long)]
    pub root_folder: String,

    /// Config directory holding Database.json (staging goes in <config>/Temp)
    #[arg(long)]
    pub config_folder: String,

    /// Sync only the named asset; repeat for several
    #[arg(long = "asset")]
    pub assets: Vec<String>,

    /// Path to the megatools binary, overriding the bundled default
    #[arg(long, env = "ASSETPULL_MEGATOOLS")]
    pub megatools_path: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Config directory holding Database.json
    #[arg(long)]
    pub config_folder: String,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Config directory holding Database.json
    #[arg(long)]
    pub config_folder: String,

    /// Unique asset name; also names the staging directory
    #[arg(long)]
    pub name: String,

    /// Destination directory, relative to the project root
    #[arg(long)]
    pub location: String,

    /// Provider type, e.g. "Mega" or "HTTP"
    #[arg(long = "type")]
    pub kind: String,

    /// Source URL
    #[arg(long)]
    pub url: String,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Config directory holding Database.json
    #[arg(long)]
    pub config_folder: String,

    /// Name of the record to delete
    #[arg(long)]
    pub name: String,
}
