//! Command-line interface.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sambahayan - household relationship suggestion engine.
#[derive(Parser, Debug)]
#[command(name = "sambahayan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "sambahayan.toml")]
    pub config: PathBuf,

    /// Verbose mode.
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode.
    #[arg(short, long)]
    pub quiet: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initializes configuration and databases in a directory.
    Init {
        /// Target directory (default: current directory).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Starts the suggestion API server.
    Serve {
        /// Listen port, overrides the configured one.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Prints learning statistics.
    Stats,

    /// Prints the version.
    Version,
}
