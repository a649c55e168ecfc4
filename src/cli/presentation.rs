//! CLI presentation: text and json formatters per command family.

mod history;
mod init;
mod merge;
mod records;
mod shared;

pub use history::{format_events_text, format_history_json, format_runs_text};
pub use init::format_init_summary;
pub use merge::{
    format_conflicts_json, format_conflicts_text, format_import_summary, format_merge_result_text,
    format_preview_text, format_resolution_text,
};
pub use records::{format_records_json, format_records_text};
pub use shared::{format_section_heading, to_pretty_json};
