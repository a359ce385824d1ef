//! Order-book file discovery.
//!
//! Lists the `*.csv` files of a directory and keeps those whose header carries
//! the order-book columns.

use orderbook_core::{config::CatalogConfig, Error, Result, REQUIRED_COLUMNS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A CSV file classified as a per-item order book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookFile {
    /// Location of the file.
    pub path: PathBuf,
    /// File name, including the `.csv` suffix.
    pub file_name: String,
    /// File name with the `.csv` suffix stripped.
    pub item_name: String,
    /// Header columns seen when the file was classified.
    pub columns: Vec<String>,
}

impl OrderBookFile {
    fn new(path: PathBuf, file_name: String, columns: Vec<String>) -> Self {
        let item_name = item_name(&file_name).to_string();
        Self {
            path,
            file_name,
            item_name,
            columns,
        }
    }

    /// Whether the header seen at classification time has `column`.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Item name of a file: the name with the `.csv` suffix stripped.
pub fn item_name(file_name: &str) -> &str {
    file_name.strip_suffix(".csv").unwrap_or(file_name)
}

/// Catalog of order-book files.
pub struct CsvCatalog {
    /// File names never treated as order books.
    denylist: HashSet<String>,
    /// Data rows read when sniffing a header.
    sniff_rows: usize,
}

impl CsvCatalog {
    /// Create a catalog with an explicit denylist.
    pub fn new<I, S>(denylist: I, sniff_rows: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            denylist: denylist.into_iter().map(Into::into).collect(),
            sniff_rows,
        }
    }

    /// Create a catalog from configuration.
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(config.denylist.iter().cloned(), config.sniff_rows)
    }

    /// Whether `file_name` is on the denylist.
    pub fn is_denied(&self, file_name: &str) -> bool {
        self.denylist.contains(file_name)
    }

    /// Discover order-book files in `directory`, sorted by file name.
    ///
    /// Files that cannot be read or parsed are skipped. Only a directory that
    /// cannot be listed is an error.
    pub fn discover(&self, directory: &Path) -> Result<Vec<OrderBookFile>> {
        let entries = fs::read_dir(directory)
            .map_err(|e| Error::unavailable(directory, e))?;

        let mut candidates = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry in {:?}: {}", directory, e);
                    continue;
                }
            };

            let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_csv_name(&file_name) {
                continue;
            }
            if self.is_denied(&file_name) {
                debug!("Skipping denylisted file {}", file_name);
                continue;
            }
            candidates.push((file_name, entry.path()));
        }

        candidates.sort_by(|a, b| a.0.cmp(&b.0));

        let mut files = Vec::with_capacity(candidates.len());
        for (file_name, path) in candidates {
            match self.classify(&path) {
                Ok(Some(columns)) => files.push(OrderBookFile::new(path, file_name, columns)),
                Ok(None) => debug!("{} is not an order book", file_name),
                Err(e) => debug!("Skipping {}: {}", file_name, e),
            }
        }

        info!(
            "Discovered {} order-book files in {:?}",
            files.len(),
            directory
        );

        Ok(files)
    }

    /// Sniff the header of one file.
    ///
    /// Returns the header columns when they include every required column,
    /// `None` when they do not, and an error when the prefix is not CSV.
    pub fn classify(&self, path: &Path) -> Result<Option<Vec<String>>> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)?;

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        // A malformed prefix disqualifies the file like a malformed header does.
        // Short rows are padded with missing values; rows wider than the header are malformed.
        for (idx, record) in reader.records().take(self.sniff_rows).enumerate() {
            let record = record?;
            if record.len() > columns.len() {
                return Err(Error::data(format!(
                    "{}: row {} has {} fields, header has {}",
                    path.display(),
                    idx + 1,
                    record.len(),
                    columns.len()
                )));
            }
        }

        if has_required_columns(&columns) {
            Ok(Some(columns))
        } else {
            Ok(None)
        }
    }
}

/// Whether `columns` is a superset of the order-book columns.
pub fn has_required_columns<S: AsRef<str>>(columns: &[S]) -> bool {
    missing_columns(columns).is_empty()
}

/// Required columns absent from `columns`.
pub fn missing_columns<S: AsRef<str>>(columns: &[S]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !columns.iter().any(|c| c.as_ref() == **required))
        .map(|required| required.to_string())
        .collect()
}

/// `*.csv` glob semantics: case-sensitive suffix, hidden files excluded.
fn is_csv_name(file_name: &str) -> bool {
    file_name.ends_with(".csv") && !file_name.starts_with('.')
}
