use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lightframe")]
#[command(author, version, about = "Headless runner for portfolio media pages")]
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
    /// Split a lightbox caption into title and meta line
    Caption {
        /// Caption body text
        #[arg(required = true)]
        body: String,

        /// Explicit title field, if the slide has one
        #[arg(long, default_value = "")]
        title: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Open a project page and play its video through
    Play {
        /// Projects data file
        #[arg(required = true)]
        projects: PathBuf,

        /// Project id, as it would appear in the page URL
        #[arg(long)]
        id: String,

        /// Duration reported by the simulated video, in seconds
        #[arg(long, default_value = "90")]
        duration: f64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Open a gallery page and walk its lightbox
    Gallery {
        /// Gallery photo list, or a cat profile with --cat
        #[arg(required = true)]
        file: PathBuf,

        /// Treat the file as a cat profile named after its file stem
        #[arg(long)]
        cat: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
