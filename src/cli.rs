use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hubbio")]
#[command(author, version, about = "Stream resolution and aggregation cache")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the persisted documents (overrides the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Start {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Resolve streams for one content id and print them as JSON
    Resolve {
        /// Content type, e.g. movie or series
        #[arg(required = true)]
        kind: String,

        /// Content id, e.g. tt0111161 or tt0903747:1:1
        #[arg(required = true)]
        id: String,
    },

    /// Validate configuration file
    Validate,

    /// Display version information
    Version,
}
