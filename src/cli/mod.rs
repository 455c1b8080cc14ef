//! CLI interface for depth-mirror
//!
//! Provides subcommands for:
//! - `run`: Mirror the order book until interrupted
//! - `snapshot`: Fetch one snapshot and print the resulting book
//! - `order`: Submit a signed limit order
//! - `config`: Show the effective configuration

mod order;
mod run;
mod snapshot;

pub use order::OrderArgs;
pub use run::RunArgs;
pub use snapshot::SnapshotArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "depth-mirror")]
#[command(about = "Local order book mirror with signed order submission")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mirror the order book until interrupted
    Run(RunArgs),
    /// Fetch one snapshot and print the book
    Snapshot(SnapshotArgs),
    /// Submit a signed limit order
    Order(OrderArgs),
    /// Show configuration
    Config,
}
