use clap::{Parser, Subcommand};
use std::path::PathBuf;

use boxart::reference::Source;

#[derive(Parser)]
#[command(name = "boxart")]
#[command(author, version, about = "Cover art resolution and caching for retro game libraries")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a cover image URL for a game
    Resolve {
        /// Game title to resolve
        #[arg(long)]
        title: String,

        /// Platform identifier (e.g. "snes")
        #[arg(long)]
        platform: String,

        /// Pre-encoded image reference stored with the game record
        #[arg(long)]
        reference: Option<String>,

        /// Preferred provider source
        #[arg(long)]
        source: Option<Source>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify a reference string for provenance badging
    Classify {
        /// Reference string to classify
        reference: String,
    },

    /// Inspect or clear the cover cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show entry counts and hit/miss counters
    Stats,
    /// Drop every cached entry from both tiers
    Clear,
}
