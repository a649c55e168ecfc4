//! Merge history presentation.

use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::json;

use super::shared::{format_millis, format_section_heading, to_pretty_json};
use crate::journal::{JournalEvent, RunRecord};

pub fn format_runs_text(runs: &[RunRecord]) -> String {
    if runs.is_empty() {
        return "No merge runs recorded.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Run", "Started", "From → To", "Status", "Moved", "Overwritten", "Errors"]);
    for run in runs {
        table.add_row(vec![
            run.run_id.clone(),
            format_millis(Some(run.started_at_ms)),
            format!("{} → {}", run.source, run.dest),
            run.status.as_str().to_string(),
            run.uniques_moved.to_string(),
            run.duplicates_overwritten.to_string(),
            run.error_count.to_string(),
        ]);
    }
    format!("{}\n\n{}", format_section_heading("Merge runs"), table)
}

pub fn format_events_text(run: &RunRecord, events: &[JournalEvent]) -> String {
    let mut out = format!(
        "{}\n\n",
        format_section_heading(&format!("Run {} ({})", run.run_id, run.status.as_str()))
    );
    out.push_str(&format!("Started: {}\n", format_millis(Some(run.started_at_ms))));
    out.push_str(&format!("Ended:   {}\n", format_millis(run.ended_at_ms)));
    if let Some(ref error) = run.error {
        out.push_str(&format!("Error:   {}\n", error));
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Seq", "Time", "Event", "Detail"]);
    for event in events {
        let detail = match (event.data.get("cert_number"), event.data.get("error")) {
            (Some(cert), Some(err)) => format!("{} {}", value_text(cert), value_text(err)),
            (Some(cert), None) => value_text(cert),
            _ => event
                .data
                .get("status")
                .map(value_text)
                .unwrap_or_default(),
        };
        table.add_row(vec![
            event.seq.to_string(),
            event.ts.clone(),
            event.event_type.clone(),
            detail,
        ]);
    }
    out.push_str(&format!("\n{}", table));
    out
}

pub fn format_history_json(runs: &[RunRecord], events: Option<&[JournalEvent]>) -> String {
    match events {
        Some(events) => to_pretty_json(&json!({ "run": runs.first(), "events": events })),
        None => to_pretty_json(&json!({ "runs": runs, "total": runs.len() })),
    }
}

fn value_text(value: &serde_json::Value) -> String {
    value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}
