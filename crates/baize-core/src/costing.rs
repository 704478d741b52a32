//! # Weighted-Average Costing
//!
//! Moving-average-cost (MAC) arithmetic for stock valuation.
//!
//! ## The Blend
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  On every stock increase, the on-hand average re-blends:                │
//! │                                                                         │
//! │              old_qty × old_avg  +  added_qty × batch_price              │
//! │   new_avg =  ─────────────────────────────────────────────              │
//! │                          old_qty + added_qty                            │
//! │                                                                         │
//! │  Decreases never touch the average: units leave at the current          │
//! │  average, which becomes the cost-of-goods-sold basis for that sale.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! When the resulting quantity is not positive the previous average is kept
//! unchanged. That guard exists so the formula cannot divide by zero while
//! stock is reconciling out of a negative position; blending semantics are
//! undefined there. Kept for compatibility with existing ledgers - flagged
//! in DESIGN.md as a candidate for product-owner review, not silently
//! changed here.

use chrono::{DateTime, Utc};

use crate::types::StockLevel;

/// Re-blended average cost after receiving `added_qty` units at
/// `unit_import_price`.
///
/// Returns `current_avg` unchanged when `current_qty + added_qty <= 0`.
/// Must not panic for any input, including an already-negative
/// `current_qty` (a tolerated oversold state).
pub fn blend_average_cost(
    current_qty: i64,
    current_avg: f64,
    added_qty: i64,
    unit_import_price: f64,
) -> f64 {
    let resulting_qty = current_qty + added_qty;
    if resulting_qty <= 0 {
        return current_avg;
    }
    (current_qty as f64 * current_avg + added_qty as f64 * unit_import_price)
        / resulting_qty as f64
}

impl StockLevel {
    /// Pure state transition for a stock increase: re-blends the average,
    /// bumps the quantity and stamps `last_restock_at`. The persistence
    /// layer writes exactly what this computes.
    pub fn apply_increase(&mut self, quantity: i64, unit_import_price: f64, now: DateTime<Utc>) {
        self.average_cost =
            blend_average_cost(self.quantity, self.average_cost, quantity, unit_import_price);
        self.quantity += quantity;
        self.last_restock_at = Some(now);
        self.updated_at = now;
    }

    /// Pure state transition for a stock decrease. The average cost is
    /// untouched: units are consumed at the current average.
    pub fn apply_decrease(&mut self, quantity: i64, now: DateTime<Utc>) {
        self.quantity -= quantity;
        self.updated_at = now;
    }

    /// Whether the current quantity covers a requested decrease.
    #[inline]
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.quantity >= quantity
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
