//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{command_name, is_mutating};
pub use output::{exit_code, map_error};
pub use parse::{Cli, Commands};
pub use presentation::{
    format_conflicts_json, format_conflicts_text, format_events_text, format_history_json,
    format_import_summary, format_init_summary, format_merge_result_text, format_preview_text,
    format_records_json, format_records_text, format_resolution_text, format_runs_text,
    format_section_heading, to_pretty_json,
};
pub use route::{init_workspace_config, RunContext};
