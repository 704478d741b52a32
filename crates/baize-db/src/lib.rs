//! # baize-db: Database Layer for Baize
//!
//! This crate provides database access for the Baize billiards-club core.
//! It uses SQLite for local storage with sqlx for async operations, and
//! owns the two stateful subsystems: the stock valuation engine and the
//! session lifecycle.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Baize Data Flow                                │
//! │                                                                         │
//! │  Surrounding application (REST API, admin panel, webhooks)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     baize-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ RateWindow    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Inventory     │    │ 001_init.sql │  │   │
//! │  │   │ Clock         │    │ Session       │    │              │  │   │
//! │  │   │ ItemLocks     │    │ OrderItems    │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                               │   │
//! │  │                                ▼                               │   │
//! │  │                     baize-core (pure logic)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`clock`] - Injectable time source (fixed clocks for tests)
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (rate windows, inventory,
//!   sessions, order items)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use baize_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/baize.db")).await?;
//!
//! // Restock 24 bottles at 1.10 each
//! let level = db
//!     .inventory()
//!     .increase_stock(tenant, "cola-330", 24, 1.10, None, MovementKind::Import, None, None)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::inventory::InventoryRepository;
pub use repository::order_item::OrderItemRepository;
pub use repository::rate_window::{NewRateWindow, RateWindowRepository};
pub use repository::session::SessionRepository;
