//! Raw snapshot export.

use orderbook_core::{Error, Result, SnapshotKey};
use orderbook_ingestion::Table;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A snapshot rendered back to CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotExport {
    /// Suggested download name.
    pub file_name: String,
    /// CSV bytes.
    pub data: Vec<u8>,
}

/// Write the rows of one snapshot as CSV.
///
/// The output has the source header and the selected records exactly as read,
/// both sides and unrecognized sides included.
pub fn export_snapshot(table: &Table, key: &SnapshotKey) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record(table.headers())?;
    let mut written = 0usize;
    for row in table.rows_for(key) {
        if let Some(record) = table.raw(row.row) {
            writer.write_record(record)?;
            written += 1;
        }
    }
    debug!("Exported {} rows of snapshot {} from {:?}", written, key, table.path());

    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}

/// Download name for a snapshot of `item`.
pub fn export_file_name(item: &str, key: &SnapshotKey) -> String {
    format!("{}_orderbook_{}.csv", item, key.label().replace(':', "-"))
}
