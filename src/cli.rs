use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Find what references an asset, from a persisted reverse-dependency index
#[derive(Parser, Debug)]
#[command(name = "asset-ref-index")]
#[command(version)]
#[command(about = "Find what references an asset, from a persisted reverse-dependency index", long_about = None)]
pub struct Args {
    /// Path to the TOML asset manifest
    #[arg(short, long, global = true, default_value = "assets.toml")]
    pub manifest: PathBuf,

    /// Path to a config file (defaults to refindex.config.yml next to the manifest)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the index snapshot (overrides the config file)
    #[arg(short, long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Log level filter, e.g. "info" or "asset_ref_index=debug" (RUST_LOG wins)
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Rebuild the whole index from the manifest
    Rebuild,
    /// Empty the index; the next query rebuilds it
    Clear,
    /// Show what an asset depends on and what references it
    Show {
        /// Asset id, e.g. Assets/Prefabs/Door.prefab
        id: String,
    },
    /// List assets that no build includes
    Unused,
    /// Check the stored index for asymmetric edges
    Verify,
    /// Print index statistics
    Stats,
}

impl Command {
    /// Whether the command can run without an asset manifest
    pub fn works_offline(&self) -> bool {
        matches!(self, Command::Clear | Command::Verify | Command::Stats)
    }
}
