//! Conflict, preview, merge and resolution presentation.

use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;

use super::shared::{format_section_heading, to_pretty_json};
use crate::reconcile::{DuplicatePair, MergePreview, MergeResult, ResolutionOutcome};
use crate::types::{CollectionId, CollectionPair};

pub fn format_conflicts_text(pairs: &[DuplicatePair], collections: &CollectionPair) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Duplicate records"));
    if pairs.is_empty() {
        out.push_str(&format!(
            "No certification number appears in both {} and {}.",
            collections.primary, collections.secondary
        ));
        return out;
    }

    let divergent = pairs.iter().filter(|p| p.is_divergent()).count();
    for pair in pairs {
        if pair.conflicts.is_empty() {
            out.push_str(&format!("{}  {}\n", pair.cert_number.bold(), "identical".green()));
            continue;
        }
        out.push_str(&format!(
            "{}  {}\n",
            pair.cert_number.bold(),
            format!("{} field(s) differ", pair.conflicts.len()).yellow()
        ));
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec![
            "Field".to_string(),
            collections.primary.to_string(),
            collections.secondary.to_string(),
        ]);
        for diff in &pair.conflicts {
            table.add_row(vec![
                diff.field.to_string(),
                diff.value_in_a.to_string(),
                diff.value_in_b.to_string(),
            ]);
        }
        out.push_str(&format!("{}\n", table));
    }
    out.push_str(&format!(
        "\nTotal: {} duplicate(s), {} with differing fields",
        pairs.len(),
        divergent
    ));
    out
}

pub fn format_conflicts_json(pairs: &[DuplicatePair], collections: &CollectionPair) -> String {
    to_pretty_json(&json!({
        "primary": collections.primary,
        "secondary": collections.secondary,
        "duplicates": pairs,
        "total": pairs.len(),
    }))
}

pub fn format_preview_text(preview: &MergePreview) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["", "Records"]);
    table.add_row(vec![
        format!("In {}", preview.source_collection),
        preview.total_in_source.to_string(),
    ]);
    table.add_row(vec![
        format!("In {}", preview.dest_collection),
        preview.total_in_dest.to_string(),
    ]);
    table.add_row(vec!["Unique (will move)".to_string(), preview.unique_to_move.len().to_string()]);
    table.add_row(vec![
        "Duplicates (will overwrite)".to_string(),
        preview.duplicates_to_overwrite.len().to_string(),
    ]);
    table.add_row(vec![
        format!("Final {}", preview.dest_collection),
        preview.projected_final_count.to_string(),
    ]);
    format!(
        "{}\n\n{}",
        format_section_heading(&format!(
            "Merge preview: {} → {}",
            preview.source_collection, preview.dest_collection
        )),
        table
    )
}

pub fn format_merge_result_text(
    result: &MergeResult,
    source: &CollectionId,
    dest: &CollectionId,
    run_id: Option<&str>,
) -> String {
    let status = if result.cancelled {
        "cancelled".yellow().to_string()
    } else if result.success {
        "completed".green().to_string()
    } else {
        "completed with errors".red().to_string()
    };
    let mut out = format!("Merge {} → {}: {}\n", source, dest, status);
    if let Some(run_id) = run_id {
        out.push_str(&format!("Run: {}\n", run_id));
    }
    out.push_str(&format!("  Processed:              {}\n", result.total_processed));
    out.push_str(&format!("  Unique records moved:   {}\n", result.uniques_moved));
    out.push_str(&format!("  Duplicates overwritten: {}\n", result.duplicates_overwritten));
    out.push_str(&format!("  Errors:                 {}", result.errors.len()));
    if !result.errors.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Cert", "Error"]);
        for error in &result.errors {
            table.add_row(vec![error.cert_number.clone(), error.error_message.clone()]);
        }
        out.push_str(&format!("\n\n{}\n\nRe-run the merge to retry failed records.", table));
    }
    out
}

pub fn format_resolution_text(outcome: &ResolutionOutcome) -> String {
    format!(
        "Resolved {} with {}: pair is now {}",
        outcome.cert_number.bold(),
        outcome.action,
        format!("{:?}", outcome.state).to_lowercase().green()
    )
}

pub fn format_import_summary(collection: &CollectionId, count: usize) -> String {
    format!("Imported {} document(s) into {}", count, collection)
}
