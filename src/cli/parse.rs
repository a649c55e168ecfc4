//! CLI parse: clap types for certmerge. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// certmerge CLI - reconcile duplicate certified-card records across two collections
#[derive(Parser)]
#[command(name = "certmerge")]
#[command(about = "Detect, preview, merge and resolve duplicate certified-card records")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, global = true, default_value = "false", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config/config.toml into the workspace
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Load documents from a JSON file into a collection
    Import {
        /// Target collection ("primary", "secondary" or a literal name)
        #[arg(long)]
        collection: String,
        /// JSON file: an object keyed by cert number, or an array of documents
        #[arg(long)]
        file: PathBuf,
    },
    /// List the normalized records of a collection
    List {
        /// Collection ("primary", "secondary" or a literal name)
        #[arg(long, default_value = "primary")]
        collection: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show duplicate pairs and their field conflicts
    Conflicts {
        /// Only show pairs whose fields differ
        #[arg(long)]
        diverging_only: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Preview a bulk merge without writing
    Preview {
        /// Source collection
        #[arg(long, default_value = "secondary")]
        from: String,
        /// Destination collection
        #[arg(long, default_value = "primary")]
        to: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Move every record of the source collection into the destination
    Merge {
        /// Source collection
        #[arg(long, default_value = "secondary")]
        from: String,
        /// Destination collection
        #[arg(long, default_value = "primary")]
        to: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Resolve one duplicate pair
    Resolve {
        /// Certification number of the pair
        cert_number: String,
        /// keep-primary, keep-secondary or merge-to-primary
        action: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show recorded merge runs
    History {
        /// Show the event log of one run
        #[arg(long)]
        run: Option<String>,
        /// Maximum number of runs to list
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
