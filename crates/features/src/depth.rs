//! Cumulative depth curves.
//!
//! A curve walks one side from the best price outward and accumulates
//! quantity, so cumulative quantity never decreases along it.

use crate::splitter::BookSides;
use orderbook_core::{BookEntry, DepthPoint, Size};
use serde::{Deserialize, Serialize};

/// Depth curve of a side sorted best price first.
///
/// Emits one step per entry; same-price entries stay separate steps. Entries
/// without a quantity add no step.
pub fn build_depth(side: &[BookEntry]) -> Vec<DepthPoint> {
    let mut cum_qty: Size = 0.0;
    side.iter()
        .filter_map(|entry| {
            let qty = entry.quantity?;
            cum_qty += qty;
            Some(DepthPoint {
                price: entry.price.0,
                cum_qty,
            })
        })
        .collect()
}

/// Merge consecutive same-price entries of a sorted side into one level.
///
/// The merged level keeps the row of its first entry. Its quantity is the sum
/// of the known quantities, or missing when none is known.
pub fn aggregate_levels(side: &[BookEntry]) -> Vec<BookEntry> {
    let mut levels: Vec<BookEntry> = Vec::with_capacity(side.len());

    for entry in side {
        if let Some(level) = levels.last_mut().filter(|l| l.price == entry.price) {
            level.quantity = match (level.quantity, entry.quantity) {
                (Some(a), Some(b)) => Some(a + b),
                (a, b) => a.or(b),
            };
        } else {
            levels.push(*entry);
        }
    }

    levels
}

/// Depth curves of both sides of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepthCurves {
    /// Bid curve, from the highest bid down.
    pub bids: Vec<DepthPoint>,
    /// Ask curve, from the lowest ask up.
    pub asks: Vec<DepthPoint>,
}

impl DepthCurves {
    /// Build both curves, optionally merging same-price entries first.
    pub fn build(sides: &BookSides, aggregate_price_levels: bool) -> Self {
        if aggregate_price_levels {
            Self {
                bids: build_depth(&aggregate_levels(&sides.bids)),
                asks: build_depth(&aggregate_levels(&sides.asks)),
            }
        } else {
            Self {
                bids: build_depth(&sides.bids),
                asks: build_depth(&sides.asks),
            }
        }
    }
}
