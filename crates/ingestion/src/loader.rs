//! Full loads of order-book files into typed tables.

use crate::catalog::{missing_columns, OrderBookFile};
use orderbook_core::{
    parse::{parse_price, parse_quantity, parse_timestamp},
    Error, OrderRow, Result, Side, SnapshotColumn, SnapshotKey, PRICE_COLUMN, QUANTITY_COLUMN,
    SIDE_COLUMN,
};
use csv::StringRecord;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Header positions of the columns the loader reads.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    side: usize,
    price: usize,
    quantity: usize,
    snapshot: Option<(SnapshotColumn, usize)>,
}

impl ColumnMap {
    fn from_headers(path: &Path, headers: &StringRecord) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h == name);

        let (Some(side), Some(price), Some(quantity)) = (
            position(SIDE_COLUMN),
            position(PRICE_COLUMN),
            position(QUANTITY_COLUMN),
        ) else {
            let columns: Vec<&str> = headers.iter().collect();
            return Err(Error::MissingColumns {
                path: path.to_path_buf(),
                missing: missing_columns(&columns),
            });
        };

        let snapshot = [SnapshotColumn::Timestamp, SnapshotColumn::CreatedAt]
            .into_iter()
            .find_map(|column| position(column.name()).map(|idx| (column, idx)));

        Ok(Self {
            side,
            price,
            quantity,
            snapshot,
        })
    }

    fn parse_row(&self, row: usize, record: &StringRecord) -> OrderRow {
        let field = |idx: usize| record.get(idx).unwrap_or("");

        OrderRow {
            row,
            snapshot: self
                .snapshot
                .and_then(|(_, idx)| parse_timestamp(field(idx))),
            side: Side::parse(field(self.side)),
            price: parse_price(field(self.price)),
            quantity: parse_quantity(field(self.quantity)),
        }
    }
}

/// A fully loaded order-book file.
///
/// Keeps the raw records next to the typed rows so a snapshot can be exported
/// exactly as the collector wrote it.
#[derive(Debug, Clone)]
pub struct Table {
    path: PathBuf,
    headers: StringRecord,
    records: Vec<StringRecord>,
    rows: Vec<OrderRow>,
    snapshot_column: Option<SnapshotColumn>,
}

impl Table {
    /// Source path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header row of the source.
    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Raw record of a row.
    pub fn raw(&self, row: usize) -> Option<&StringRecord> {
        self.records.get(row)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the file has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column the snapshot keys come from, if any.
    pub fn snapshot_column(&self) -> Option<SnapshotColumn> {
        self.snapshot_column
    }

    /// Rows whose key cell did not parse. Always 0 without a key column.
    pub fn unparsed_snapshots(&self) -> usize {
        if self.snapshot_column.is_none() {
            return 0;
        }
        self.rows.iter().filter(|r| r.snapshot.is_none()).count()
    }

    /// Distinct snapshot keys, newest first.
    ///
    /// A file without a key column is a single [`SnapshotKey::WholeFile`]
    /// snapshot, even when it has no rows.
    pub fn available_snapshots(&self) -> Vec<SnapshotKey> {
        if self.snapshot_column.is_none() {
            return vec![SnapshotKey::WholeFile];
        }

        let keys: BTreeSet<_> = self.rows.iter().filter_map(|r| r.snapshot).collect();
        keys.into_iter().rev().map(SnapshotKey::At).collect()
    }

    /// Rows of one snapshot in source order, all sides included.
    pub fn rows_for<'a>(&'a self, key: &'a SnapshotKey) -> impl Iterator<Item = &'a OrderRow> + 'a {
        let keyed = self.snapshot_column.is_some();
        self.rows.iter().filter(move |row| match key {
            // Without a key column every row is in the one implicit snapshot.
            SnapshotKey::WholeFile => !keyed,
            SnapshotKey::At(_) => keyed && row.in_snapshot(key),
        })
    }
}

/// Loader for order-book files.
pub struct OrderBookLoader;

impl OrderBookLoader {
    /// Load a discovered file in full.
    pub fn load(file: &OrderBookFile) -> Result<Table> {
        Self::load_path(&file.path)
    }

    /// Load the file at `path` in full.
    ///
    /// The file is re-read from scratch: it may have grown or been rewritten
    /// since it was classified.
    pub fn load_path(path: &Path) -> Result<Table> {
        let file = File::open(path).map_err(|e| {
            warn!("Cannot open {:?}: {}", path, e);
            Error::unavailable(path, e)
        })?;
        Self::read(path, file)
    }

    /// Load a table from any reader; `path` only labels the result.
    pub fn read<R: Read>(path: &Path, reader: R) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| Error::unavailable(path, e))?
            .clone();
        let columns = ColumnMap::from_headers(path, &headers)?;

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| {
                warn!("Read of {:?} failed after {} rows: {}", path, records.len(), e);
                Error::unavailable(path, e)
            })?;
            records.push(record);
        }

        let rows: Vec<OrderRow> = records
            .iter()
            .enumerate()
            .map(|(idx, record)| columns.parse_row(idx, record))
            .collect();

        let table = Table {
            path: path.to_path_buf(),
            headers,
            records,
            rows,
            snapshot_column: columns.snapshot.map(|(column, _)| column),
        };

        debug!(
            "Loaded {} rows from {:?} ({} without snapshot key, {} without price)",
            table.len(),
            path,
            table.unparsed_snapshots(),
            table.rows.iter().filter(|r| r.price.is_none()).count()
        );
        if table.is_empty() {
            debug!("{:?} has a header but no rows", path);
        }

        Ok(table)
    }
}
