//! CLI help and command-name contract for logging and routing.

use crate::cli::parse::Commands;

/// Command name string used in log fields (e.g. "merge", "resolve").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init { .. } => "init",
        Commands::Import { .. } => "import",
        Commands::List { .. } => "list",
        Commands::Conflicts { .. } => "conflicts",
        Commands::Preview { .. } => "preview",
        Commands::Merge { .. } => "merge",
        Commands::Resolve { .. } => "resolve",
        Commands::History { .. } => "history",
    }
}

/// Whether the command writes to the document store.
pub fn is_mutating(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Import { .. } | Commands::Merge { .. } | Commands::Resolve { .. }
    )
}
