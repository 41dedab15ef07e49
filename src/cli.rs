//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "booth-catalog",
    version,
    about = "Match purchased Booth asset files to their item pages"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the JSON config file.
    #[arg(long, value_name = "PATH", default_value = "config.json", global = true)]
    pub config: PathBuf,

    /// Log debug output (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import purchase-history HTML pages into the learned mappings.
    Import {
        #[arg(value_name = "HTML", required = true)]
        files: Vec<PathBuf>,
    },

    /// Find the item page for one or more asset files.
    Match {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Fetch thumbnails and learn mappings for trusted matches.
        #[arg(long)]
        apply: bool,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Remember that a file belongs to an item page.
    Learn {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Remove one learned mapping.
    Forget {
        #[arg(value_name = "KEY")]
        key: String,
    },

    /// Remove every learned mapping.
    Reset,

    /// Print every learned mapping.
    List,
}
