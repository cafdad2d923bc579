use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "tickforge",
    about = "Intraday quote ETL and modeling pipeline",
    version
)]
pub struct Cli {
    /// Path to the TOML configuration file (default: ./tickforge.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch, persist, clean, and model one symbol end to end.
    Run(RunArgs),
    /// Rebuild the silver table from persisted raw rows.
    Resilver(ResilverArgs),
    /// Fit models against existing silver rows without fetching.
    Model(ModelArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Stock symbol; prompts interactively when omitted.
    #[arg(long)]
    pub symbol: Option<String>,

    /// Intraday interval: 1min, 5min, 15min, 30min, or 60min.
    #[arg(long, default_value = "5min")]
    pub interval: String,

    /// Override the configured loader batch size.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Write the cleaned rows to a CSV file after loading.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ResilverArgs {
    /// Override the configured loader batch size.
    #[arg(long)]
    pub batch_size: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ModelArgs {
    /// Stock symbol; prompts interactively when omitted.
    #[arg(long)]
    pub symbol: Option<String>,
}
