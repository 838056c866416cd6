// src/output.rs
// =============================================================================
// Saves collected emails to a CSV file.
//
// Format:
//   Email
//   alice@example.com
//   bob@example.com
//
// The file is always overwritten, and the header row is written even when
// there is nothing to save.
// =============================================================================

use std::collections::BTreeSet;
use std::path::Path;

pub const DEFAULT_OUTPUT: &str = "collected_emails.csv";

// Writes one email per row, in the set's (sorted) order
pub fn save_emails(path: &Path, emails: &BTreeSet<String>) -> csv::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(["Email"])?;
    for email in emails {
        writer.write_record([email])?;
    }

    writer.flush()?;
    Ok(())
}
