//! # Repository Module
//!
//! Database repository implementations for Baize.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller (order workflow / admin layer)                                  │
//! │       │                                                                 │
//! │       │  db.inventory().decrease_stock(tenant, item, qty, ...)          │
//! │       ▼                                                                 │
//! │  InventoryRepository                                                    │
//! │  ├── per-item lock ── read ── compute (baize-core) ── write ── ledger  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`rate_window::RateWindowRepository`] - Pricing rule catalog
//! - [`inventory::InventoryRepository`] - Stock valuation engine
//! - [`session::SessionRepository`] - Table session lifecycle
//! - [`order_item::OrderItemRepository`] - Service orders against sessions

pub mod inventory;
pub mod order_item;
pub mod rate_window;
pub mod session;
