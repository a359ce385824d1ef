//! Order-book reconstruction for the depth terminal.
//!
//! This crate handles:
//! - Splitting a snapshot into bid and ask sides, best price first
//! - Cumulative depth curves per side
//! - Raw snapshot export
//! - The render pipeline consumed by the presentation layer

pub mod depth;
pub mod export;
pub mod pipeline;
pub mod splitter;

pub use depth::{aggregate_levels, build_depth, DepthCurves};
pub use export::{export_file_name, export_snapshot, SnapshotExport};
pub use pipeline::{export_selection, render, render_uncached, BookView, ItemView, RenderModel, Selection};
pub use splitter::{split, BookSides};
