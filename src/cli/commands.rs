//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Work request gateway for the project tracker
#[derive(Parser, Debug)]
#[command(name = "tracker-gateway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Port to listen on (overrides config and LISTEN_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory to publish under /public (repeatable)
        #[arg(long = "public-dir")]
        public_dirs: Vec<PathBuf>,
    },

    /// Print every project visible to the tracker token, one JSON item per line
    Projects {
        /// Stop after this many items
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the stories of the configured project, one JSON item per line
    Stories {
        /// Stop after this many items
        #[arg(long)]
        limit: Option<usize>,
    },
}
