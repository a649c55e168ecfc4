//! Init command presentation.

use std::path::Path;

pub fn format_init_summary(config_path: &Path, overwritten: bool) -> String {
    let mut output = String::from("Initializing certmerge configuration...\n\n");
    if overwritten {
        output.push_str(&format!("  ✓ {} (overwritten)\n", config_path.display()));
    } else {
        output.push_str(&format!("  ✓ {}\n", config_path.display()));
    }
    output.push_str("\nEdit [store] to point at your collections, then run 'certmerge conflicts'.");
    output
}
