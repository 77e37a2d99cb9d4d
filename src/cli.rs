use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cinebot")]
#[command(author, version, about = "Movie lookup chat bot")]
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
    /// Look up a movie by title or IMDb id
    Search {
        /// Title, optionally with a year such as "Dune (2021)"
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Print the merged record as JSON instead of the chat reply
        #[arg(long)]
        json: bool,
    },

    /// Recognize a movie from a poster image or video clip
    Identify {
        /// Image or video file
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Show which external services are configured
    Status,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,

    /// Read messages from stdin and print replies, one per line
    Chat,
}
