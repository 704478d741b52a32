//! # Error Types
//!
//! Domain-specific error types for baize-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  baize-core errors (this file)                                         │
//! │  ├── CoreError        - Session/domain rule violations                 │
//! │  └── ValidationError  - Input validation + stock business rules        │
//! │                                                                         │
//! │  baize-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller (operator UI)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The tariff resolver raises nothing: a minute no window covers falls back
//! to the session's frozen rate, then to zero.
//!
//! `ValidationError` messages are user-facing; "insufficient stock" and
//! "quantity must be positive" bubble verbatim to the operator UI.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Session is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Trying to close an already-closed session
    /// - Trying to order items against a closed session
    /// - Trying to request end twice
    #[error("Session {session_id} is {current_status}, cannot perform operation")]
    InvalidSessionStatus {
        session_id: String,
        current_status: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation and stock business-rule errors.
///
/// Always raised *before* any mutation; safe to surface directly to the
/// operator as a 4xx-equivalent message.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID, non-finite rate).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Not enough stock on hand to satisfy a decrease.
    ///
    /// ## When This Occurs
    /// - Ordering more than the current quantity of an item
    /// - Two concurrent orders racing for the last units (the second sees
    ///   the post-decrement quantity and fails here)
    #[error("insufficient stock for {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        available: i64,
        requested: i64,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
