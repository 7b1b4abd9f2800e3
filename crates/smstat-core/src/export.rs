//! Export of statistics rows to CSV and JSON files

use anyhow::{Context, Result};
use smstat_types::StatsRow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Export statistics rows to CSV
///
/// CSV columns: Label, Count, Total Fee
/// The fee column is empty for count-only rows. Rows keep the order they
/// were computed in.
///
/// # Errors
/// Returns error if file creation or write operations fail
///
/// # Examples
///
/// ```no_run
/// use smstat_core::export::export_stats_to_csv;
/// use smstat_core::StatsRow;
/// use std::path::Path;
///
/// let rows = vec![StatsRow::count("alice", 3)];
/// export_stats_to_csv(&rows, Path::new("senders.csv")).unwrap();
/// ```
pub fn export_stats_to_csv(rows: &[StatsRow], path: &Path) -> Result<()> {
    create_parent_dir(path)?;

    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    let mut writer = BufWriter::new(file);

    writeln!(writer, "Label,Count,Total Fee").context("Failed to write CSV header")?;

    for row in rows {
        let fee = row.total_fee.map(|fee| fee.to_string()).unwrap_or_default();
        writeln!(writer, "{},{},{}", csv_field(&row.label), row.count, fee)
            .with_context(|| format!("Failed to write row for {}", row.label))?;
    }

    writer.flush().context("Failed to flush CSV writer")?;

    Ok(())
}

/// Export statistics rows to pretty-printed JSON
pub fn export_stats_to_json(rows: &[StatsRow], path: &Path) -> Result<()> {
    create_parent_dir(path)?;

    let json = serde_json::to_string_pretty(rows).context("Failed to serialize stats to JSON")?;

    std::fs::write(path, json)
        .with_context(|| format!("Failed to write JSON file: {}", path.display()))?;

    Ok(())
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

/// Quote a field when it contains a separator, quote or newline
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
