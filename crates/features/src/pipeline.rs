//! Render pipeline.
//!
//! Turns a user selection into everything the depth view displays. Each call
//! is a full catalog → load → split → depth pass; nothing is recomputed
//! behind the caller's back.

use crate::depth::DepthCurves;
use crate::export::{export_file_name, export_snapshot, SnapshotExport};
use crate::splitter::split;
use orderbook_core::{
    BookEntry, BookSummary, Config, DepthPoint, Error, Result, SnapshotColumn, SnapshotKey,
};
use orderbook_ingestion::{DepthSource, OrderBookFile, Table};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// What the user picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Directory to scan; the configured data directory when `None`.
    pub directory: Option<PathBuf>,
    /// File name of the item; the first listed file when `None`.
    pub file: Option<String>,
    /// Snapshot; the newest when `None`.
    pub snapshot: Option<SnapshotKey>,
}

impl Selection {
    /// Select a file by name.
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            file: Some(name.into()),
            ..Self::default()
        }
    }

    /// Pick a snapshot.
    pub fn at(mut self, snapshot: SnapshotKey) -> Self {
        self.snapshot = Some(snapshot);
        self
    }
}

/// Everything the depth view shows for one selection.
#[derive(Debug, Clone, Serialize)]
pub struct RenderModel {
    /// Directory that was scanned.
    pub directory: PathBuf,
    /// Order-book files available for selection.
    pub files: Vec<OrderBookFile>,
    /// State of the selected item.
    pub view: ItemView,
}

impl RenderModel {
    /// The reconstructed book, when there is one.
    pub fn book(&self) -> Option<&BookView> {
        match &self.view {
            ItemView::Book(book) => Some(book),
            _ => None,
        }
    }
}

/// State of the selected item.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ItemView {
    /// No order-book file could be found.
    NoSources { reason: String },
    /// The selected file could not be read; other files may still be.
    Unavailable { file: OrderBookFile, reason: String },
    /// The book of the selected snapshot.
    Book(Box<BookView>),
}

/// Book of one snapshot of one file.
#[derive(Debug, Clone, Serialize)]
pub struct BookView {
    /// Selected file.
    pub file: OrderBookFile,
    /// Column the snapshot keys were read from; `None` for a single-snapshot file.
    pub snapshot_column: Option<SnapshotColumn>,
    /// Snapshots of the file, newest first.
    pub snapshots: Vec<SnapshotKey>,
    /// Selected snapshot; `None` when the file has none.
    pub snapshot: Option<SnapshotKey>,
    /// Rows in the file.
    pub row_count: usize,
    /// Rows whose snapshot key did not parse.
    pub unparsed_snapshots: usize,
    /// Bids, highest first.
    pub bids: Vec<BookEntry>,
    /// Asks, lowest first.
    pub asks: Vec<BookEntry>,
    /// Cumulative bid depth.
    pub bid_depth: Vec<DepthPoint>,
    /// Cumulative ask depth.
    pub ask_depth: Vec<DepthPoint>,
    /// Top-of-book summary.
    pub summary: BookSummary,
    /// Download name of the snapshot export; `None` when there is no snapshot to export.
    pub export_file_name: Option<String>,
}

impl BookView {
    /// Build the view of `table` at the wanted snapshot, or the newest one.
    pub fn build(
        file: OrderBookFile,
        table: &Table,
        wanted: Option<&SnapshotKey>,
        aggregate_price_levels: bool,
    ) -> Self {
        let snapshots = table.available_snapshots();
        let snapshot = resolve_snapshot(&snapshots, wanted);

        let sides = snapshot
            .as_ref()
            .map(|key| split(table, key))
            .unwrap_or_default();
        let curves = DepthCurves::build(&sides, aggregate_price_levels);
        let summary = sides.summary();
        let export_name = snapshot
            .as_ref()
            .map(|key| export_file_name(&file.item_name, key));

        Self {
            snapshot_column: table.snapshot_column(),
            snapshots,
            snapshot,
            row_count: table.len(),
            unparsed_snapshots: table.unparsed_snapshots(),
            bids: sides.bids,
            asks: sides.asks,
            bid_depth: curves.bids,
            ask_depth: curves.asks,
            summary,
            export_file_name: export_name,
            file,
        }
    }
}

fn resolve_file<'a>(files: &'a [OrderBookFile], wanted: Option<&str>) -> Option<&'a OrderBookFile> {
    if let Some(name) = wanted {
        if let Some(file) = files.iter().find(|f| f.file_name == name) {
            return Some(file);
        }
        warn!("{} is not an order-book file here, using the first listed", name);
    }
    files.first()
}

fn resolve_snapshot(snapshots: &[SnapshotKey], wanted: Option<&SnapshotKey>) -> Option<SnapshotKey> {
    if let Some(key) = wanted {
        if snapshots.contains(key) {
            return Some(*key);
        }
        warn!("Snapshot {} not available, using the newest", key);
    }
    snapshots.first().copied()
}

fn directory_of(source: &DepthSource, selection: &Selection) -> PathBuf {
    selection
        .directory
        .clone()
        .unwrap_or_else(|| source.data_dir().to_path_buf())
}

/// Build the render model of a selection.
pub fn render(source: &mut DepthSource, selection: &Selection) -> RenderModel {
    let directory = directory_of(source, selection);

    let files = match source.discover(&directory) {
        Ok(files) => files,
        Err(e) => {
            warn!("Cannot scan {:?}: {}", directory, e);
            return RenderModel {
                directory,
                files: Vec::new(),
                view: ItemView::NoSources {
                    reason: e.to_string(),
                },
            };
        }
    };

    let Some(file) = resolve_file(&files, selection.file.as_deref()).cloned() else {
        return RenderModel {
            directory,
            files,
            view: ItemView::NoSources {
                reason: "no order-book files found".to_string(),
            },
        };
    };

    let view = match source.load(&file) {
        Ok(table) => ItemView::Book(Box::new(BookView::build(
            file,
            &table,
            selection.snapshot.as_ref(),
            source.config().depth.aggregate_price_levels,
        ))),
        Err(e) => ItemView::Unavailable {
            file,
            reason: e.to_string(),
        },
    };

    RenderModel {
        directory,
        files,
        view,
    }
}

/// Build the render model without any caching.
pub fn render_uncached(config: &Config, selection: &Selection) -> RenderModel {
    let mut config = config.clone();
    config.cache.enabled = false;
    render(&mut DepthSource::new(config), selection)
}

/// Export the selected snapshot as CSV.
pub fn export_selection(source: &mut DepthSource, selection: &Selection) -> Result<SnapshotExport> {
    let directory = directory_of(source, selection);
    let files = source.discover(&directory)?;
    let file = resolve_file(&files, selection.file.as_deref())
        .ok_or_else(|| Error::data(format!("no order-book files in {}", directory.display())))?;

    let table: Arc<Table> = source.load(file)?;
    let snapshots = table.available_snapshots();
    let key = resolve_snapshot(&snapshots, selection.snapshot.as_ref())
        .ok_or_else(|| Error::data(format!("{} has no snapshots", file.file_name)))?;

    Ok(SnapshotExport {
        file_name: export_file_name(&file.item_name, &key),
        data: export_snapshot(&table, &key)?,
    })
}
