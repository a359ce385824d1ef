//! Snapshot splitting into bid and ask sides.

use orderbook_core::{BookEntry, BookSummary, Side, SnapshotKey};
use orderbook_ingestion::Table;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::debug;

/// Bid and ask entries of one snapshot, best price first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookSides {
    /// Bids, highest price first.
    pub bids: Vec<BookEntry>,
    /// Asks, lowest price first.
    pub asks: Vec<BookEntry>,
}

impl BookSides {
    /// Whether both sides are empty.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Top-of-book summary.
    pub fn summary(&self) -> BookSummary {
        BookSummary::from_sides(&self.bids, &self.asks)
    }
}

/// Split the rows of one snapshot by side.
///
/// Rows whose side is not exactly `bid` or `ask`, and rows without a price,
/// are left out. Equal prices keep their source order.
pub fn split(table: &Table, key: &SnapshotKey) -> BookSides {
    let mut sides = BookSides::default();
    let mut unpriced = 0usize;

    for row in table.rows_for(key) {
        let Some(side) = row.side else {
            continue;
        };
        let Some(price) = row.price else {
            unpriced += 1;
            continue;
        };

        let entry = BookEntry {
            row: row.row,
            price,
            quantity: row.quantity,
        };
        match side {
            Side::Bid => sides.bids.push(entry),
            Side::Ask => sides.asks.push(entry),
        }
    }

    // slice::sort_by_key is stable
    sides.bids.sort_by_key(|e| Reverse(e.price));
    sides.asks.sort_by_key(|e| e.price);

    if unpriced > 0 {
        debug!("{} rows of snapshot {} have no price", unpriced, key);
    }
    if sides.is_empty() {
        debug!("Snapshot {} has no bid or ask rows", key);
    }

    sides
}
