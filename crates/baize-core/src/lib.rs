//! # baize-core: Pure Business Logic for Baize
//!
//! This crate is the **heart** of Baize, a billiards-club management core.
//! It contains the two subsystems with real algorithmic content as pure
//! functions with zero I/O dependencies: time-based tariff resolution and
//! weighted-average stock costing.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Baize Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        Surrounding club application (not in this workspace)     │   │
//! │  │     admin panel ── REST API ── payment webhooks ── notifications │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ in-process calls                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  baize-db (persistence layer)                   │   │
//! │  │    rate-window catalog ── stock engine ── session lifecycle     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ baize-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  tariff   │  │  costing  │  │ validation│  │   │
//! │  │   │RateWindow │  │ resolver  │  │ MAC math  │  │   rules   │  │   │
//! │  │   │ StockLevel│  │           │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (RateWindow, TableSession, StockLevel, etc.)
//! - [`tariff`] - Minute-by-minute tariff resolution across rate windows
//! - [`costing`] - Weighted-average (MAC) cost arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **No Clock**: Every timestamp is a parameter; callers inject "now"
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod costing;
pub mod error;
pub mod tariff;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use baize_core::RateWindow` instead of
// `use baize_core::types::RateWindow`

pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tenant ID for v0.1 (single-tenant runtime with multi-tenant schema)
///
/// v0.1 runs a single club, but the database schema includes tenant_id so
/// more clubs can be onboarded without a schema change. Callers always pass
/// tenant ids explicitly; there is no ambient tenant state.
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum quantity of a single item on one order line
///
/// Guards against typo-sized orders (1000 instead of 10). Applies to the
/// order-item flow only; the stock engine itself accepts any positive
/// quantity so purchase imports are not capped.
pub const MAX_ORDER_ITEM_QUANTITY: i64 = 999;
