//! Core data types for the order-book depth terminal.

use crate::parse::parse_timestamp;
use chrono::NaiveDateTime;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Timestamp in milliseconds since Unix epoch (UTC).
pub type TimestampMs = i64;

/// Price type with ordering support.
pub type Price = OrderedFloat<f64>;

/// Size/quantity type.
pub type Size = f64;

/// Column holding the side of an order-book row.
pub const SIDE_COLUMN: &str = "side";
/// Column holding the price of an order-book row.
pub const PRICE_COLUMN: &str = "price_vnd";
/// Column holding the quantity of an order-book row.
pub const QUANTITY_COLUMN: &str = "quantity";
/// Columns a file must carry to be treated as an order book.
pub const REQUIRED_COLUMNS: [&str; 3] = [SIDE_COLUMN, PRICE_COLUMN, QUANTITY_COLUMN];

/// Book side of an order-book row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Resting buy order.
    Bid,
    /// Resting sell order.
    Ask,
}

impl Side {
    /// Parse the literal side value. Matching is case-sensitive.
    pub fn parse(raw: &str) -> Option<Side> {
        match raw {
            "bid" => Some(Side::Bid),
            "ask" => Some(Side::Ask),
            _ => None,
        }
    }
}

/// Column the snapshot keys of a table were read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotColumn {
    /// The `timestamp` column.
    Timestamp,
    /// The `created_at` column, used when `timestamp` is absent.
    CreatedAt,
}

impl SnapshotColumn {
    /// Header name of the column.
    pub fn name(self) -> &'static str {
        match self {
            SnapshotColumn::Timestamp => "timestamp",
            SnapshotColumn::CreatedAt => "created_at",
        }
    }
}

/// Key selecting one snapshot of an order-book file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SnapshotKey {
    /// Rows captured at one instant.
    At(NaiveDateTime),
    /// Every row of a file without a key column.
    WholeFile,
}

impl SnapshotKey {
    /// Label used for selection lists and export names.
    pub fn label(&self) -> String {
        match self {
            SnapshotKey::At(ts) => ts.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            SnapshotKey::WholeFile => "all".to_string(),
        }
    }

    /// Parse a label produced by [`SnapshotKey::label`].
    ///
    /// Any timestamp layout understood by the loader is accepted.
    pub fn parse_label(label: &str) -> Option<SnapshotKey> {
        if label.trim() == "all" {
            return Some(SnapshotKey::WholeFile);
        }
        parse_timestamp(label).map(SnapshotKey::At)
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for SnapshotKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for SnapshotKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        SnapshotKey::parse_label(&label)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid snapshot key: {label}")))
    }
}

/// One observation of an order-book file.
///
/// Fields that failed to parse are `None`; the row is kept for export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderRow {
    /// Position of the row in the source file (0-based, header excluded).
    pub row: usize,
    /// Capture time, when the file has a key column and the cell parsed.
    pub snapshot: Option<NaiveDateTime>,
    /// Side, when the cell is exactly `bid` or `ask`.
    pub side: Option<Side>,
    /// Price.
    pub price: Option<Price>,
    /// Quantity.
    pub quantity: Option<Size>,
}

impl OrderRow {
    /// Whether the row belongs to the snapshot selected by `key`.
    #[inline]
    pub fn in_snapshot(&self, key: &SnapshotKey) -> bool {
        match key {
            SnapshotKey::At(ts) => self.snapshot.as_ref() == Some(ts),
            SnapshotKey::WholeFile => true,
        }
    }
}

/// A priced row placed on one side of a book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookEntry {
    /// Source row index.
    pub row: usize,
    /// Price.
    pub price: Price,
    /// Quantity, missing when the cell did not parse.
    pub quantity: Option<Size>,
}

/// One step of a depth curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthPoint {
    /// Price of the step.
    pub price: f64,
    /// Quantity available at this price or better.
    pub cum_qty: Size,
}

/// Top-of-book view of one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookSummary {
    /// Highest bid.
    pub best_bid: Option<f64>,
    /// Lowest ask.
    pub best_ask: Option<f64>,
    /// Best ask minus best bid.
    pub spread: Option<f64>,
    /// Midpoint of best bid and best ask.
    pub mid: Option<f64>,
    /// Total bid quantity.
    pub bid_qty: Size,
    /// Total ask quantity.
    pub ask_qty: Size,
    /// Number of bid entries.
    pub bid_levels: usize,
    /// Number of ask entries.
    pub ask_levels: usize,
    /// Quantity imbalance: (bid_qty - ask_qty) / (bid_qty + ask_qty), 0 when both are empty.
    pub imbalance: f64,
}

impl BookSummary {
    /// Summarize sides sorted best price first.
    pub fn from_sides(bids: &[BookEntry], asks: &[BookEntry]) -> Self {
        let best_bid = bids.first().map(|e| e.price.0);
        let best_ask = asks.first().map(|e| e.price.0);
        let (spread, mid) = match (best_bid, best_ask) {
            (Some(bid), Some(ask)) => (Some(ask - bid), Some((bid + ask) / 2.0)),
            _ => (None, None),
        };
        let total = |side: &[BookEntry]| side.iter().filter_map(|e| e.quantity).sum::<Size>();
        let bid_qty = total(bids);
        let ask_qty = total(asks);

        Self {
            best_bid,
            best_ask,
            spread,
            mid,
            bid_qty,
            ask_qty,
            bid_levels: bids.len(),
            ask_levels: asks.len(),
            imbalance: imbalance(bid_qty, ask_qty),
        }
    }
}

#[inline]
fn imbalance(bid_qty: Size, ask_qty: Size) -> f64 {
    let total = bid_qty + ask_qty;
    if total > 0.0 {
        (bid_qty - ask_qty) / total
    } else {
        0.0
    }
}
