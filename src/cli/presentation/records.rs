//! Record listing presentation.

use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::json;

use super::shared::{format_section_heading, to_pretty_json};
use crate::types::{CollectionId, Record};

pub fn format_records_text(collection: &CollectionId, records: &[Record]) -> String {
    let heading = format_section_heading(&format!("Collection {}", collection));
    if records.is_empty() {
        return format!("{}\n\nNo records.", heading);
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Cert", "Card", "Brand", "Grade", "Population", "Last updated"]);
    for record in records {
        table.add_row(vec![
            record.cert_number.clone(),
            record.card_name.clone(),
            record.brand.clone(),
            record.grade.clone(),
            record.total_population.to_string(),
            record
                .last_updated
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    format!("{}\n\n{}\n\nTotal: {} record(s)", heading, table, records.len())
}

pub fn format_records_json(collection: &CollectionId, records: &[Record]) -> String {
    to_pretty_json(&json!({
        "collection": collection,
        "records": records,
        "total": records.len(),
    }))
}
